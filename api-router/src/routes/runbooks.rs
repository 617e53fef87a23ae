use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::api_state::ApiState;

/// `POST /api/v1/runbooks/sync`: trigger a full corpus re-ingestion in the
/// background and return immediately.
pub async fn sync_runbooks(State(state): State<ApiState>) -> impl IntoResponse {
    let request_id = Uuid::new_v4();
    let ingestion = state.ingestion.clone();

    state.tracker.spawn(async move {
        match ingestion.ingest_all().await {
            Ok(report) => info!(
                %request_id,
                ingested = report.ingested,
                failed = report.failed,
                "Runbook sync completed"
            ),
            Err(err) => error!(%request_id, error = %err, "Runbook sync failed"),
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "STARTED",
            "requestId": request_id,
        })),
    )
}
