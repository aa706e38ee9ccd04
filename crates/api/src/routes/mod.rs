use axum::{Json, Router, routing::get};

pub mod audit;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/audit-logs", get(audit::query_audit_logs))
        .route(
            "/audit-logs/:entity_type/:entity_id",
            get(audit::entity_history),
        )
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
