use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use common::error::AppError;

use crate::{api_state::ApiState, error::ApiError};

/// Retrieval depth when the caller does not ask for one.
const DEFAULT_TOP_K: usize = 5;

#[derive(Debug, Deserialize)]
pub struct AlertQuery {
    #[serde(rename = "topK")]
    top_k: Option<usize>,
}

/// `POST /api/v1/alerts`: raw alert payload in, checklist out.
///
/// The checklist is returned first; dispatching to destinations happens on
/// the task tracker after the response, so slow webhooks never hold the
/// caller hostage.
pub async fn submit_alert(
    State(state): State<ApiState>,
    Query(query): Query<AlertQuery>,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    let parsed = state.registry.parse(&body).map_err(ApiError::from)?;

    let Some(alert) = parsed else {
        info!("Alert payload was a skippable transition; nothing to do");
        return Ok((StatusCode::OK, Json(json!({ "status": "SKIPPED" }))).into_response());
    };

    let top_k = query.top_k.unwrap_or(DEFAULT_TOP_K);
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    let checklist = tokio::time::timeout(
        timeout,
        state.pipeline.process_alert(alert.clone(), top_k),
    )
    .await
    .map_err(|_| ApiError::from(AppError::Cancelled))??;

    // Fire-and-forget fan-out, bounded by process shutdown via the tracker.
    let dispatcher = state.dispatcher.clone();
    let dispatched = checklist.clone();
    state.tracker.spawn(async move {
        dispatcher.dispatch(&dispatched, &alert).await;
    });

    Ok((StatusCode::OK, Json(checklist)).into_response())
}
