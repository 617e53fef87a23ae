pub mod cloudwatch;
pub mod oci;

use std::sync::Arc;

use tracing::debug;

use common::error::AppError;
use common::model::Alert;

pub use cloudwatch::CloudWatchAlarmSource;
pub use oci::OciAlarmSource;

/// A monitoring source adapter. Adapters are side-effect free siblings; the
/// registry picks exactly one per payload.
pub trait AlertSource: Send + Sync {
    fn source_type(&self) -> &'static str;

    /// Cheap structural check: does this payload belong to this source?
    fn can_handle(&self, raw: &str) -> bool;

    /// Parse the payload. `Ok(None)` signals an event that should be
    /// skipped (e.g. a recovery transition), not an error.
    fn parse_alert(&self, raw: &str) -> Result<Option<Alert>, AppError>;
}

/// Routes a raw payload to the first registered adapter that claims it.
/// Registration order is significant and there is no fallthrough: the
/// claiming adapter owns the payload.
pub struct AlertParserRegistry {
    sources: Vec<Arc<dyn AlertSource>>,
}

impl AlertParserRegistry {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Registry preloaded with the built-in adapters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(CloudWatchAlarmSource));
        registry.register(Arc::new(OciAlarmSource));
        registry
    }

    pub fn register(&mut self, source: Arc<dyn AlertSource>) {
        self.sources.push(source);
    }

    pub fn parse(&self, raw: &str) -> Result<Option<Alert>, AppError> {
        for source in &self.sources {
            if source.can_handle(raw) {
                debug!(source = source.source_type(), "Adapter claimed alert payload");
                return source.parse_alert(raw);
            }
        }

        Err(AppError::Parse(
            "No registered alert source recognizes this payload".into(),
        ))
    }
}

impl Default for AlertParserRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Short deterministic hex digest used for alert ids.
pub(crate) fn short_digest(input: &str) -> String {
    use sha2::{Digest, Sha256};

    let digest = Sha256::digest(input.as_bytes());
    let mut id = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        id.push_str(&format!("{byte:02x}"));
    }
    id
}
