use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tracing::info;

use common::utils::config::WebhookConfig;
use webhook_dispatch::WebhookDestination;

use crate::{api_state::ApiState, error::ApiError};

/// `GET /api/v1/webhooks`: redacted configuration of every destination.
pub async fn list_webhooks(State(state): State<ApiState>) -> impl IntoResponse {
    let destinations = state.dispatcher.destination_configs().await;
    Json(json!({ "destinations": destinations }))
}

/// `POST /api/v1/webhooks`: register a webhook destination at runtime.
pub async fn create_webhook(
    State(state): State<ApiState>,
    Json(config): Json<WebhookConfig>,
) -> Result<impl IntoResponse, ApiError> {
    if config.name.trim().is_empty() {
        return Err(ApiError::Validation(
            "Webhook destination requires a name".to_string(),
        ));
    }
    if !config.url.starts_with("http://") && !config.url.starts_with("https://") {
        return Err(ApiError::Validation(format!(
            "Webhook url must be http(s), got: {}",
            config.url
        )));
    }

    let name = config.name.clone();
    let destination = WebhookDestination::new(config).map_err(ApiError::from)?;
    state.dispatcher.register(Arc::new(destination)).await;

    info!(%name, "Webhook destination registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "CREATED", "name": name })),
    ))
}
