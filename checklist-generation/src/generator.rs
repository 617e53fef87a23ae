use std::sync::Arc;

use chrono::Utc;
use tracing::{instrument, warn};

use common::error::AppError;
use common::model::{Checklist, EnrichedContext, RetrievedChunk};
use common::utils::llm::TextModel;

use crate::parser::{markdown_fallback, parse_structured, renumber};
use crate::prompt::{build_user_prompt, SYSTEM_PROMPT};

/// Produces a checklist from an enriched context and the retrieved chunks.
///
/// LLM transport errors propagate to the caller; a response that merely
/// fails to parse as JSON degrades to the markdown fallback instead.
pub struct ChecklistGenerator {
    llm: Arc<dyn TextModel>,
}

impl ChecklistGenerator {
    pub fn new(llm: Arc<dyn TextModel>) -> Self {
        Self { llm }
    }

    #[instrument(skip_all, fields(alert_id = %ctx.alert.id, chunks = chunks.len()))]
    pub async fn generate(
        &self,
        ctx: &EnrichedContext,
        chunks: &[RetrievedChunk],
    ) -> Result<Checklist, AppError> {
        let user_prompt = build_user_prompt(ctx, chunks);
        let response = self.llm.generate(SYSTEM_PROMPT, &user_prompt).await?;

        let (summary, mut steps) = match parse_structured(&response) {
            Some(parsed) => parsed,
            None => {
                warn!(
                    alert_id = %ctx.alert.id,
                    "LLM response was not valid checklist JSON; using markdown fallback"
                );
                markdown_fallback(&response)
            }
        };

        renumber(&mut steps);

        Ok(Checklist {
            alert_id: ctx.alert.id.clone(),
            summary,
            steps,
            source_runbooks: distinct_runbooks(chunks),
            generated_at: Utc::now(),
            llm_provider_used: self.llm.provider_id(),
        })
    }
}

/// Distinct runbook paths in first-appearance order.
fn distinct_runbooks(chunks: &[RetrievedChunk]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for retrieved in chunks {
        if !seen.contains(&retrieved.chunk.runbook_path) {
            seen.push(retrieved.chunk.runbook_path.clone());
        }
    }
    seen
}
