use axum::Json;
use chrono::Utc;
use serde_json::json;

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "UP",
        "timestamp": Utc::now(),
    }))
}
