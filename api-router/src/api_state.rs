use std::sync::Arc;

use tokio_util::task::TaskTracker;

use alert_pipeline::{AlertParserRegistry, AlertPipeline};
use common::utils::config::AppConfig;
use ingestion_pipeline::IngestionPipeline;
use webhook_dispatch::Dispatcher;

/// Shared state behind the API routes.
///
/// The task tracker owns every fire-and-forget job (dispatch fan-outs,
/// runbook syncs) so shutdown can drain them.
#[derive(Clone)]
pub struct ApiState {
    pub registry: Arc<AlertParserRegistry>,
    pub pipeline: Arc<AlertPipeline>,
    pub dispatcher: Arc<Dispatcher>,
    pub ingestion: Arc<IngestionPipeline>,
    pub config: AppConfig,
    pub tracker: TaskTracker,
}

impl ApiState {
    pub fn new(
        registry: Arc<AlertParserRegistry>,
        pipeline: Arc<AlertPipeline>,
        dispatcher: Arc<Dispatcher>,
        ingestion: Arc<IngestionPipeline>,
        config: AppConfig,
    ) -> Self {
        Self {
            registry,
            pipeline,
            dispatcher,
            ingestion,
            config,
            tracker: TaskTracker::new(),
        }
    }
}
