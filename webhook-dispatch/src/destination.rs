use std::time::Duration;

use async_trait::async_trait;

use common::error::AppError;
use common::model::{Alert, Checklist, DeliveryResult};
use common::utils::config::WebhookFilterConfig;

/// Per-destination retry schedule: `max_attempts = retry_count + 1`, delay
/// doubling from `initial_delay` after each failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(retry_count: u32, initial_delay_ms: u64) -> Self {
        Self {
            max_attempts: retry_count + 1,
            initial_delay: Duration::from_millis(initial_delay_ms),
        }
    }
}

/// One downstream channel that can receive a rendered checklist.
///
/// Destinations are leaves: they hold no reference back to the dispatcher.
#[async_trait]
pub trait Destination: Send + Sync {
    fn name(&self) -> &str;

    fn destination_type(&self) -> &str;

    /// One delivery attempt. Transport-level failures should be folded into
    /// a failure `DeliveryResult` so the retry classification can see the
    /// status code (or its absence); `Err` is reserved for unexpected
    /// internal errors and is treated as a non-status failure.
    async fn send(&self, checklist: &Checklist) -> Result<DeliveryResult, AppError>;

    /// Whether this destination wants the checklist for the given alert.
    fn should_send(&self, checklist: &Checklist, alert: &Alert) -> bool;

    /// Redacted configuration for the management API.
    fn config(&self) -> serde_json::Value;

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
    }
}

/// Shared filter semantics: the severity set must be empty or contain the
/// alert's severity, and every required label must be present with an equal
/// value.
pub fn filter_admits(filter: &WebhookFilterConfig, alert: &Alert) -> bool {
    let severity_ok =
        filter.severities.is_empty() || filter.severities.contains(&alert.severity);

    let labels_ok = filter
        .required_labels
        .iter()
        .all(|(key, value)| alert.labels.get(key) == Some(value));

    severity_ok && labels_ok
}
