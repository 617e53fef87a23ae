use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert severity as understood by the rest of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical representation of one incident signal from a monitoring source.
///
/// Produced once by a source adapter and never mutated afterwards. The raw
/// payload is retained verbatim for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub source_service: String,
    #[serde(default)]
    pub dimensions: HashMap<String, String>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub raw_payload: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_serializes_screaming() {
        assert_eq!(
            serde_json::to_string(&Severity::Critical).expect("serialize"),
            "\"CRITICAL\""
        );
        assert_eq!(
            serde_json::from_str::<Severity>("\"WARNING\"").expect("deserialize"),
            Severity::Warning
        );
    }

    #[test]
    fn unknown_severity_is_rejected() {
        assert!(serde_json::from_str::<Severity>("\"FATAL\"").is_err());
    }
}
