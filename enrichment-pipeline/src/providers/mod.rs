pub mod local;

use async_trait::async_trait;
use chrono::Duration;

use common::error::AppError;
use common::model::{LogEvent, MetricSample, ResourceMetadata};

pub use local::{LocalLogsProvider, LocalMetadataProvider, LocalMetricsProvider};

/// Resolves compute-instance metadata for a resource id.
#[async_trait]
pub trait ComputeMetadataProvider: Send + Sync {
    fn provider_type(&self) -> &'static str;

    /// `None` when the provider cannot resolve the resource.
    async fn get_instance(&self, resource_id: &str)
        -> Result<Option<ResourceMetadata>, AppError>;
}

/// Fetches recent metric samples for a resource.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    fn provider_type(&self) -> &'static str;

    async fn fetch_metrics(
        &self,
        resource_id: &str,
        lookback: Duration,
    ) -> Result<Vec<MetricSample>, AppError>;
}

/// Fetches recent log events for a resource.
#[async_trait]
pub trait LogsProvider: Send + Sync {
    fn provider_type(&self) -> &'static str;

    async fn fetch_logs(
        &self,
        resource_id: &str,
        lookback: Duration,
        query: Option<&str>,
    ) -> Result<Vec<LogEvent>, AppError>;
}
