use tracing::{info, instrument};

use checklist_generation::ChecklistGenerator;
use common::error::AppError;
use common::model::{Alert, Checklist};
use enrichment_pipeline::Enricher;
use retrieval_pipeline::Retriever;

/// Glue for the request path: enrich, retrieve, generate.
///
/// Dispatching is deliberately not part of this pipeline; the HTTP layer
/// hands the finished checklist to the dispatcher after responding.
/// Cancelling the caller's future cancels every stage in flight.
pub struct AlertPipeline {
    enricher: Enricher,
    retriever: Retriever,
    generator: ChecklistGenerator,
}

impl AlertPipeline {
    pub fn new(enricher: Enricher, retriever: Retriever, generator: ChecklistGenerator) -> Self {
        Self {
            enricher,
            retriever,
            generator,
        }
    }

    #[instrument(skip_all, fields(alert_id = %alert.id, top_k))]
    pub async fn process_alert(&self, alert: Alert, top_k: usize) -> Result<Checklist, AppError> {
        let context = self.enricher.enrich(alert).await;
        let chunks = self.retriever.retrieve(&context, top_k).await?;
        let checklist = self.generator.generate(&context, &chunks).await?;

        info!(
            alert_id = %checklist.alert_id,
            steps = checklist.steps.len(),
            runbooks = checklist.source_runbooks.len(),
            "Checklist generated"
        );

        Ok(checklist)
    }
}
