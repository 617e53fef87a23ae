pub mod alert;
pub mod checklist;
pub mod chunk;
pub mod context;
pub mod delivery;
pub mod resource;
pub mod telemetry;

pub use alert::{Alert, Severity};
pub use checklist::{Checklist, ChecklistStep, StepPriority};
pub use chunk::{RetrievedChunk, RunbookChunk, ScoredChunk};
pub use context::EnrichedContext;
pub use delivery::DeliveryResult;
pub use resource::ResourceMetadata;
pub use telemetry::{LogEvent, MetricSample, MetricSeries};
