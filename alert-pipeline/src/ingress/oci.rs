use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use common::error::AppError;
use common::model::{Alert, Severity};

use super::{short_digest, AlertSource};

/// OCI Monitoring alarm messages as delivered through a notification topic.
pub struct OciAlarmSource;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OciAlarmMessage {
    #[serde(alias = "dedupekey")]
    dedupe_key: Option<String>,
    title: Option<String>,
    body: Option<String>,
    severity: Option<String>,
    timestamp_epoch_millis: Option<i64>,
    #[serde(default)]
    alarm_meta_data: Vec<OciAlarmMetaData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OciAlarmMetaData {
    id: Option<String>,
    status: Option<String>,
    severity: Option<String>,
    namespace: Option<String>,
    #[serde(default)]
    dimensions: Vec<HashMap<String, String>>,
}

impl AlertSource for OciAlarmSource {
    fn source_type(&self) -> &'static str {
        "oci-monitoring"
    }

    fn can_handle(&self, raw: &str) -> bool {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) else {
            return false;
        };

        value.get("dedupeKey").is_some()
            || value.get("dedupekey").is_some()
            || value.get("alarmMetaData").is_some()
    }

    fn parse_alert(&self, raw: &str) -> Result<Option<Alert>, AppError> {
        let message: OciAlarmMessage = serde_json::from_str(raw)
            .map_err(|e| AppError::Parse(format!("Invalid OCI alarm message: {e}")))?;

        let meta = message.alarm_meta_data.first();

        // A transition back to OK means the alarm cleared.
        let status = meta.and_then(|m| m.status.as_deref()).unwrap_or("FIRING");
        if status.eq_ignore_ascii_case("OK") {
            debug!("Skipping OCI alarm in OK state");
            return Ok(None);
        }

        let severity_label = message
            .severity
            .as_deref()
            .or_else(|| meta.and_then(|m| m.severity.as_deref()))
            .unwrap_or_default();
        let severity = match severity_label.to_ascii_uppercase().as_str() {
            "CRITICAL" | "ERROR" => Severity::Critical,
            "WARNING" => Severity::Warning,
            _ => Severity::Info,
        };

        let alarm_ocid = meta.and_then(|m| m.id.clone()).unwrap_or_default();
        let identity = message
            .dedupe_key
            .clone()
            .filter(|key| !key.is_empty())
            .unwrap_or_else(|| alarm_ocid.clone());
        let id = format!("oci-{}", short_digest(&identity));

        let timestamp = message
            .timestamp_epoch_millis
            .and_then(DateTime::from_timestamp_millis)
            .unwrap_or_else(Utc::now);

        let mut dimensions = HashMap::new();
        if let Some(meta) = meta {
            for dimension_set in &meta.dimensions {
                for (key, value) in dimension_set {
                    dimensions.insert(key.clone(), value.clone());
                }
            }
        }

        let mut labels = HashMap::new();
        if let Some(namespace) = meta.and_then(|m| m.namespace.clone()) {
            labels.insert("namespace".to_string(), namespace);
        }
        if !alarm_ocid.is_empty() {
            labels.insert("alarmId".to_string(), alarm_ocid);
        }

        Ok(Some(Alert {
            id,
            title: message.title.unwrap_or_else(|| "OCI alarm".to_string()),
            message: message.body.unwrap_or_default(),
            severity,
            source_service: self.source_type().to_string(),
            dimensions,
            labels,
            timestamp,
            raw_payload: raw.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oci_json(status: &str, severity: &str) -> String {
        serde_json::json!({
            "dedupeKey": "dedupe-123",
            "title": "High CPU on app tier",
            "body": "CPU above 95% for 5 minutes",
            "severity": severity,
            "timestampEpochMillis": 1714816800000i64,
            "alarmMetaData": [{
                "id": "ocid1.alarm.oc1..example",
                "status": status,
                "severity": severity,
                "namespace": "oci_computeagent",
                "dimensions": [{"resourceId": "ocid1.instance.oc1..example"}]
            }]
        })
        .to_string()
    }

    #[test]
    fn claims_oci_alarm_payloads_only() {
        let source = OciAlarmSource;
        assert!(source.can_handle(&oci_json("FIRING", "CRITICAL")));
        assert!(!source.can_handle("{\"AlarmName\": \"x\"}"));
        assert!(!source.can_handle("plain text"));
    }

    #[test]
    fn firing_critical_alarm_is_parsed() {
        let source = OciAlarmSource;
        let alert = source
            .parse_alert(&oci_json("FIRING", "CRITICAL"))
            .expect("parse")
            .expect("alert");

        assert_eq!(alert.severity, Severity::Critical);
        assert!(alert.id.starts_with("oci-"));
        assert_eq!(
            alert.dimensions.get("resourceId").map(String::as_str),
            Some("ocid1.instance.oc1..example")
        );
        assert_eq!(
            alert.labels.get("namespace").map(String::as_str),
            Some("oci_computeagent")
        );
        assert_eq!(alert.timestamp.timestamp_millis(), 1714816800000);
    }

    #[test]
    fn ok_status_is_skipped() {
        let source = OciAlarmSource;
        let parsed = source
            .parse_alert(&oci_json("OK", "CRITICAL"))
            .expect("parse");
        assert!(parsed.is_none());
    }

    #[test]
    fn severity_defaults_to_info_for_unknown_labels() {
        let source = OciAlarmSource;
        let alert = source
            .parse_alert(&oci_json("FIRING", "NOTICE"))
            .expect("parse")
            .expect("alert");
        assert_eq!(alert.severity, Severity::Info);

        let warning = source
            .parse_alert(&oci_json("FIRING", "WARNING"))
            .expect("parse")
            .expect("alert");
        assert_eq!(warning.severity, Severity::Warning);
    }

    #[test]
    fn dedupe_key_drives_the_alert_id() {
        let source = OciAlarmSource;
        let first = source
            .parse_alert(&oci_json("FIRING", "CRITICAL"))
            .expect("parse")
            .expect("alert");
        let second = source
            .parse_alert(&oci_json("FIRING", "CRITICAL"))
            .expect("parse")
            .expect("alert");

        assert_eq!(first.id, second.id);
    }
}
