use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use tracing::{instrument, warn};

use common::model::{Alert, EnrichedContext, MetricSeries};

use crate::providers::{ComputeMetadataProvider, LogsProvider, MetricsProvider};

/// Dimension keys probed for the resource id, in priority order.
const RESOURCE_ID_KEYS: [&str; 4] = ["resourceId", "instanceId", "InstanceId", "resource_id"];

const DEFAULT_LOOKBACK_MINUTES: i64 = 15;

/// Fans out to the metadata, metrics and logs providers in parallel and
/// assembles whatever succeeded into an `EnrichedContext`.
///
/// Enrichment never fails: each provider has an independent failure envelope
/// and a failing provider only blanks its own slice of the context.
pub struct Enricher {
    metadata: Arc<dyn ComputeMetadataProvider>,
    metrics: Arc<dyn MetricsProvider>,
    logs: Arc<dyn LogsProvider>,
    lookback: Duration,
}

impl Enricher {
    pub fn new(
        metadata: Arc<dyn ComputeMetadataProvider>,
        metrics: Arc<dyn MetricsProvider>,
        logs: Arc<dyn LogsProvider>,
    ) -> Self {
        Self {
            metadata,
            metrics,
            logs,
            lookback: Duration::minutes(DEFAULT_LOOKBACK_MINUTES),
        }
    }

    pub fn with_lookback_minutes(mut self, minutes: i64) -> Self {
        self.lookback = Duration::minutes(minutes);
        self
    }

    /// The resource id the providers should be queried with. Falls back to
    /// the alert id when no known dimension key is present.
    pub fn resolve_resource_id(alert: &Alert) -> String {
        for key in RESOURCE_ID_KEYS {
            if let Some(value) = alert.dimensions.get(key) {
                return value.clone();
            }
        }

        warn!(
            alert_id = %alert.id,
            "No resource id dimension found; using the alert id as a synthetic resource id"
        );
        alert.id.clone()
    }

    #[instrument(skip_all, fields(alert_id = %alert.id))]
    pub async fn enrich(&self, alert: Alert) -> EnrichedContext {
        let resource_id = Self::resolve_resource_id(&alert);

        let (resource, samples, logs) = tokio::join!(
            async {
                match self.metadata.get_instance(&resource_id).await {
                    Ok(resource) => resource,
                    Err(err) => {
                        warn!(%resource_id, error = %err, "Metadata provider failed");
                        None
                    }
                }
            },
            async {
                match self.metrics.fetch_metrics(&resource_id, self.lookback).await {
                    Ok(samples) => samples,
                    Err(err) => {
                        warn!(%resource_id, error = %err, "Metrics provider failed");
                        Vec::new()
                    }
                }
            },
            async {
                match self.logs.fetch_logs(&resource_id, self.lookback, None).await {
                    Ok(logs) => logs,
                    Err(err) => {
                        warn!(%resource_id, error = %err, "Logs provider failed");
                        Vec::new()
                    }
                }
            },
        );

        EnrichedContext {
            alert,
            resource,
            metrics: MetricSeries::group(samples),
            logs,
            extras: HashMap::new(),
        }
    }
}
