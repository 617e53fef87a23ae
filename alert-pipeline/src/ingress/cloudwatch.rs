use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use common::error::AppError;
use common::model::{Alert, Severity};

use super::{short_digest, AlertSource};

/// Alarm state-change timestamp format used by CloudWatch notifications,
/// e.g. `2024-05-04T10:00:00.000+0000`.
const STATE_CHANGE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// CloudWatch alarm notifications, bare or wrapped in an SNS envelope.
pub struct CloudWatchAlarmSource;

#[derive(Debug, Deserialize)]
struct SnsEnvelope {
    #[serde(rename = "MessageId")]
    message_id: Option<String>,
    #[serde(rename = "Message")]
    message: String,
    #[serde(rename = "Timestamp")]
    timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlarmPayload {
    #[serde(rename = "AlarmName")]
    alarm_name: String,
    #[serde(rename = "AlarmDescription")]
    alarm_description: Option<String>,
    #[serde(rename = "AlarmArn")]
    alarm_arn: Option<String>,
    #[serde(rename = "AWSAccountId")]
    account_id: Option<String>,
    #[serde(rename = "Region")]
    region: Option<String>,
    #[serde(rename = "NewStateValue")]
    new_state_value: Option<String>,
    #[serde(rename = "NewStateReason")]
    new_state_reason: Option<String>,
    #[serde(rename = "StateChangeTime")]
    state_change_time: Option<String>,
    #[serde(rename = "Trigger")]
    trigger: Option<Trigger>,
}

#[derive(Debug, Deserialize)]
struct Trigger {
    #[serde(rename = "MetricName")]
    metric_name: Option<String>,
    #[serde(rename = "Namespace")]
    namespace: Option<String>,
    #[serde(rename = "Dimensions", default)]
    dimensions: Vec<Dimension>,
}

#[derive(Debug, Deserialize)]
struct Dimension {
    #[serde(alias = "Name")]
    name: String,
    #[serde(alias = "Value")]
    value: String,
}

impl AlertSource for CloudWatchAlarmSource {
    fn source_type(&self) -> &'static str {
        "cloudwatch"
    }

    fn can_handle(&self, raw: &str) -> bool {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) else {
            return false;
        };

        if value.get("AlarmName").is_some() {
            return true;
        }

        // SNS envelope whose inner message is an alarm notification.
        value
            .get("Message")
            .and_then(|m| m.as_str())
            .is_some_and(|message| message.contains("AlarmName"))
    }

    fn parse_alert(&self, raw: &str) -> Result<Option<Alert>, AppError> {
        let (payload, message_id, envelope_timestamp) = unwrap_envelope(raw)?;

        let state = payload.new_state_value.as_deref().unwrap_or_default();
        let severity = match state {
            "ALARM" => Severity::Critical,
            "INSUFFICIENT_DATA" => Severity::Warning,
            // Recovery transitions carry no troubleshooting work.
            "OK" => {
                debug!(alarm = %payload.alarm_name, "Skipping OK-state alarm notification");
                return Ok(None);
            }
            _ => Severity::Info,
        };

        let alarm_arn = payload.alarm_arn.clone().unwrap_or_default();
        let message_id = message_id.unwrap_or_default();
        let id = format!("cw-{}", short_digest(&format!("{message_id}:{alarm_arn}")));

        let timestamp = payload
            .state_change_time
            .as_deref()
            .or(envelope_timestamp.as_deref())
            .map(parse_permissive_timestamp)
            .unwrap_or_else(Utc::now);

        let mut dimensions = HashMap::new();
        let mut labels = HashMap::new();

        if let Some(trigger) = &payload.trigger {
            for dimension in &trigger.dimensions {
                dimensions.insert(dimension.name.clone(), dimension.value.clone());
            }
            if let Some(metric) = &trigger.metric_name {
                labels.insert("metricName".to_string(), metric.clone());
            }
            if let Some(namespace) = &trigger.namespace {
                labels.insert("namespace".to_string(), namespace.clone());
            }
        }
        if let Some(region) = &payload.region {
            labels.insert("region".to_string(), region.clone());
        }
        if let Some(account) = &payload.account_id {
            labels.insert("accountId".to_string(), account.clone());
        }

        let message = payload
            .new_state_reason
            .clone()
            .or(payload.alarm_description.clone())
            .unwrap_or_default();

        Ok(Some(Alert {
            id,
            title: payload.alarm_name,
            message,
            severity,
            source_service: self.source_type().to_string(),
            dimensions,
            labels,
            timestamp,
            raw_payload: raw.to_string(),
        }))
    }
}

/// Unwrap an SNS envelope when present; otherwise treat the payload as a
/// bare alarm notification.
fn unwrap_envelope(raw: &str) -> Result<(AlarmPayload, Option<String>, Option<String>), AppError> {
    if let Ok(envelope) = serde_json::from_str::<SnsEnvelope>(raw) {
        if envelope.message.contains("AlarmName") {
            let payload: AlarmPayload =
                serde_json::from_str(&envelope.message).map_err(|e| {
                    AppError::Parse(format!("Invalid alarm payload in SNS message: {e}"))
                })?;
            return Ok((payload, envelope.message_id, envelope.timestamp));
        }
    }

    let payload: AlarmPayload = serde_json::from_str(raw)
        .map_err(|e| AppError::Parse(format!("Invalid CloudWatch alarm payload: {e}")))?;
    Ok((payload, None, None))
}

/// Strict ISO instant first, the alarm notification format second, current
/// time as a last resort.
fn parse_permissive_timestamp(value: &str) -> DateTime<Utc> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return parsed.with_timezone(&Utc);
    }

    if let Ok(parsed) = DateTime::parse_from_str(value, STATE_CHANGE_FORMAT) {
        return parsed.with_timezone(&Utc);
    }

    if let Ok(parsed) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.and_utc();
    }

    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alarm_json(state: &str) -> String {
        serde_json::json!({
            "AlarmName": "high-memory-usage",
            "AlarmDescription": "Memory above 90%",
            "AlarmArn": "arn:aws:cloudwatch:eu-west-1:123456789012:alarm:high-memory-usage",
            "AWSAccountId": "123456789012",
            "Region": "eu-west-1",
            "NewStateValue": state,
            "NewStateReason": "Threshold crossed: 92.1 > 90",
            "StateChangeTime": "2024-05-04T10:00:00.000+0000",
            "Trigger": {
                "MetricName": "MemoryUtilization",
                "Namespace": "CWAgent",
                "Dimensions": [{"name": "InstanceId", "value": "i-1"}]
            }
        })
        .to_string()
    }

    fn sns_wrapped(state: &str) -> String {
        serde_json::json!({
            "Type": "Notification",
            "MessageId": "msg-123",
            "TopicArn": "arn:aws:sns:eu-west-1:123456789012:alerts",
            "Message": alarm_json(state),
            "Timestamp": "2024-05-04T10:00:01.000Z"
        })
        .to_string()
    }

    #[test]
    fn claims_bare_and_enveloped_alarms() {
        let source = CloudWatchAlarmSource;
        assert!(source.can_handle(&alarm_json("ALARM")));
        assert!(source.can_handle(&sns_wrapped("ALARM")));
        assert!(!source.can_handle("{\"dedupeKey\": \"x\"}"));
        assert!(!source.can_handle("not json"));
    }

    #[test]
    fn alarm_state_maps_to_critical() {
        let source = CloudWatchAlarmSource;
        let alert = source
            .parse_alert(&alarm_json("ALARM"))
            .expect("parse")
            .expect("alert present");

        assert_eq!(alert.severity, Severity::Critical);
        assert_eq!(alert.title, "high-memory-usage");
        assert_eq!(alert.dimensions.get("InstanceId").map(String::as_str), Some("i-1"));
        assert_eq!(alert.labels.get("metricName").map(String::as_str), Some("MemoryUtilization"));
        assert!(alert.id.starts_with("cw-"));
        assert_eq!(alert.timestamp.to_rfc3339(), "2024-05-04T10:00:00+00:00");
        assert!(!alert.raw_payload.is_empty());
    }

    #[test]
    fn insufficient_data_maps_to_warning_and_unknown_to_info() {
        let source = CloudWatchAlarmSource;

        let warning = source
            .parse_alert(&alarm_json("INSUFFICIENT_DATA"))
            .expect("parse")
            .expect("alert");
        assert_eq!(warning.severity, Severity::Warning);

        let info = source
            .parse_alert(&alarm_json("SOMETHING_NEW"))
            .expect("parse")
            .expect("alert");
        assert_eq!(info.severity, Severity::Info);
    }

    #[test]
    fn ok_state_is_skipped_not_an_error() {
        let source = CloudWatchAlarmSource;
        let parsed = source.parse_alert(&alarm_json("OK")).expect("parse");
        assert!(parsed.is_none());

        let parsed = source.parse_alert(&sns_wrapped("OK")).expect("parse");
        assert!(parsed.is_none());
    }

    #[test]
    fn alert_id_is_deterministic_for_same_message_and_alarm() {
        let source = CloudWatchAlarmSource;
        let first = source
            .parse_alert(&sns_wrapped("ALARM"))
            .expect("parse")
            .expect("alert");
        let second = source
            .parse_alert(&sns_wrapped("ALARM"))
            .expect("parse")
            .expect("alert");

        assert_eq!(first.id, second.id);
        assert_eq!(first.id.len(), "cw-".len() + 16);
    }

    #[test]
    fn unparseable_claimed_payload_is_a_parse_error() {
        let source = CloudWatchAlarmSource;
        let raw = "{\"AlarmName\": 42}";
        assert!(source.can_handle(raw));
        assert!(matches!(
            source.parse_alert(raw),
            Err(AppError::Parse(_))
        ));
    }

    #[test]
    fn bad_timestamp_falls_back_to_now() {
        let before = Utc::now();
        let parsed = parse_permissive_timestamp("not a timestamp");
        assert!(parsed >= before);
    }
}
