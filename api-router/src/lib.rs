use axum::routing::{get, post};
use axum::Router;

use api_state::ApiState;
use routes::{
    alerts::submit_alert,
    health::health,
    runbooks::sync_runbooks,
    webhooks::{create_webhook, list_webhooks},
};

pub mod api_state;
pub mod error;
mod routes;

/// Router for API functionality, version 1.
pub fn api_routes_v1(state: ApiState) -> Router {
    Router::new()
        .route("/alerts", post(submit_alert))
        .route("/runbooks/sync", post(sync_runbooks))
        .route("/webhooks", get(list_webhooks).post(create_webhook))
        .with_state(state)
}

/// Unversioned probe endpoint for load balancers and orchestrators.
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health))
}
