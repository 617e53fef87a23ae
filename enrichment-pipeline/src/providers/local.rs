use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::warn;

use common::error::AppError;
use common::model::{LogEvent, MetricSample, ResourceMetadata};
use common::storage::store::StorageManager;

use super::{ComputeMetadataProvider, LogsProvider, MetricsProvider};

/// Providers for the `local` cloud mode, serving enrichment data from the
/// object store instead of a cloud control plane:
///
/// - metadata from `inventory/<resource_id>.json`
/// - metrics from `metrics/<resource_id>.json` (array of samples)
/// - logs from `logs/<resource_id>.jsonl` (one JSON event per line)
///
/// A missing object means "nothing known", never an error.
pub struct LocalMetadataProvider {
    storage: StorageManager,
}

impl LocalMetadataProvider {
    pub fn new(storage: StorageManager) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl ComputeMetadataProvider for LocalMetadataProvider {
    fn provider_type(&self) -> &'static str {
        "local"
    }

    async fn get_instance(
        &self,
        resource_id: &str,
    ) -> Result<Option<ResourceMetadata>, AppError> {
        let location = format!("inventory/{resource_id}.json");
        if !self.storage.exists(&location).await? {
            return Ok(None);
        }

        let bytes = self.storage.get(&location).await?;
        let metadata: ResourceMetadata = serde_json::from_slice(&bytes)?;
        Ok(Some(metadata))
    }
}

pub struct LocalMetricsProvider {
    storage: StorageManager,
}

impl LocalMetricsProvider {
    pub fn new(storage: StorageManager) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl MetricsProvider for LocalMetricsProvider {
    fn provider_type(&self) -> &'static str {
        "local"
    }

    async fn fetch_metrics(
        &self,
        resource_id: &str,
        lookback: Duration,
    ) -> Result<Vec<MetricSample>, AppError> {
        let location = format!("metrics/{resource_id}.json");
        if !self.storage.exists(&location).await? {
            return Ok(Vec::new());
        }

        let bytes = self.storage.get(&location).await?;
        let samples: Vec<MetricSample> = serde_json::from_slice(&bytes)?;

        let cutoff = Utc::now() - lookback;
        Ok(samples
            .into_iter()
            .filter(|sample| sample.timestamp >= cutoff)
            .collect())
    }
}

pub struct LocalLogsProvider {
    storage: StorageManager,
}

impl LocalLogsProvider {
    pub fn new(storage: StorageManager) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl LogsProvider for LocalLogsProvider {
    fn provider_type(&self) -> &'static str {
        "local"
    }

    async fn fetch_logs(
        &self,
        resource_id: &str,
        lookback: Duration,
        query: Option<&str>,
    ) -> Result<Vec<LogEvent>, AppError> {
        let location = format!("logs/{resource_id}.jsonl");
        if !self.storage.exists(&location).await? {
            return Ok(Vec::new());
        }

        let bytes = self.storage.get(&location).await?;
        let text = String::from_utf8_lossy(&bytes);

        let cutoff = Utc::now() - lookback;
        let mut events = Vec::new();

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LogEvent>(line) {
                Ok(event) => {
                    if event.timestamp < cutoff {
                        continue;
                    }
                    if let Some(needle) = query {
                        if !event.message.contains(needle) {
                            continue;
                        }
                    }
                    events.push(event);
                }
                Err(err) => {
                    warn!(%resource_id, error = %err, "Skipping unparseable log line");
                }
            }
        }

        Ok(events)
    }
}
