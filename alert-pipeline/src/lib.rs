pub mod ingress;
pub mod orchestrator;

pub use ingress::{AlertParserRegistry, AlertSource};
pub use orchestrator::AlertPipeline;
