use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use common::error::AppError;
use common::model::{Alert, Checklist, DeliveryResult};
use common::utils::config::WebhookConfig;

use crate::destination::{filter_admits, Destination, RetryPolicy};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// How much of an error body is worth keeping in the delivery result.
const ERROR_BODY_LIMIT: usize = 512;

/// Posts the checklist JSON to a configured HTTP endpoint.
pub struct WebhookDestination {
    config: WebhookConfig,
    client: reqwest::Client,
}

impl WebhookDestination {
    pub fn new(config: WebhookConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl Destination for WebhookDestination {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn destination_type(&self) -> &str {
        &self.config.webhook_type
    }

    async fn send(&self, checklist: &Checklist) -> Result<DeliveryResult, AppError> {
        let mut request = self.client.post(&self.config.url).json(checklist);
        for (key, value) in &self.config.headers {
            request = request.header(key, value);
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();
                debug!(
                    destination = %self.config.name,
                    status = status.as_u16(),
                    "Webhook delivery attempt finished"
                );

                if status.is_success() {
                    Ok(DeliveryResult::success(
                        &self.config.name,
                        &self.config.webhook_type,
                        Some(status.as_u16()),
                    ))
                } else {
                    let body = response.text().await.unwrap_or_default();
                    let snippet: String = body.chars().take(ERROR_BODY_LIMIT).collect();
                    Ok(DeliveryResult::failure(
                        &self.config.name,
                        &self.config.webhook_type,
                        Some(status.as_u16()),
                        format!("HTTP {status}: {snippet}"),
                    ))
                }
            }
            // Connection and timeout failures have no status; the retry
            // classification treats them as retryable.
            Err(err) => Ok(DeliveryResult::failure(
                &self.config.name,
                &self.config.webhook_type,
                None,
                format!("Request failed: {err}"),
            )),
        }
    }

    fn should_send(&self, _checklist: &Checklist, alert: &Alert) -> bool {
        self.config.enabled && filter_admits(&self.config.filter, alert)
    }

    fn config(&self) -> serde_json::Value {
        json!({
            "name": self.config.name,
            "type": self.config.webhook_type,
            "url": self.config.url,
            "enabled": self.config.enabled,
            // Header values may carry credentials; expose the keys only.
            "headers": self.config.headers.keys().collect::<Vec<_>>(),
            "filter": {
                "severities": self.config.filter.severities,
                "requiredLabels": self.config.filter.required_labels,
            },
            "retryCount": self.config.retry_count,
            "retryDelayMs": self.config.retry_delay_ms,
        })
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.config.retry_count, self.config.retry_delay_ms)
    }
}
