pub mod enricher;
pub mod providers;

pub use enricher::Enricher;
pub use providers::{ComputeMetadataProvider, LogsProvider, MetricsProvider};
