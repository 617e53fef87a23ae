use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Alert, LogEvent, MetricSeries, ResourceMetadata};

/// An alert augmented with whatever live infrastructure state the
/// enrichment providers could supply.
///
/// The alert itself is always present; every other field may be empty when
/// the corresponding provider failed or had nothing to report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedContext {
    pub alert: Alert,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceMetadata>,
    #[serde(default)]
    pub metrics: Vec<MetricSeries>,
    #[serde(default)]
    pub logs: Vec<LogEvent>,
    #[serde(default)]
    pub extras: HashMap<String, String>,
}

impl EnrichedContext {
    /// A context carrying nothing beyond the alert itself.
    pub fn bare(alert: Alert) -> Self {
        Self {
            alert,
            resource: None,
            metrics: Vec::new(),
            logs: Vec::new(),
            extras: HashMap::new(),
        }
    }
}
