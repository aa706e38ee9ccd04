//! Audit trail endpoints.

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
};

use bizgrid_auth::AccessContext;
use bizgrid_core::EntityKind;

use crate::app::AppState;
use crate::dto::{AuditLogPage, AuditLogParams};
use crate::errors::{audit_error_to_response, json_error};

/// `GET /audit-logs` — filtered page of the global log.
///
/// Requires the audit permission. A non-admin caller's `company_id` filter
/// is overridden to their own tenant inside the recorder.
pub async fn query_audit_logs(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<AccessContext>,
    Query(params): Query<AuditLogParams>,
) -> axum::response::Response {
    let query = match params.into_query() {
        Ok(query) => query,
        Err(response) => return response,
    };

    let (limit, offset) = (query.effective_limit(), query.effective_offset());
    match state.recorder.query_log(&ctx, &query).await {
        Ok((entries, total)) => Json(AuditLogPage {
            entries,
            total,
            limit,
            offset,
        })
        .into_response(),
        Err(e) => audit_error_to_response(e),
    }
}

/// `GET /audit-logs/{entity_type}/{entity_id}` — one entity's history,
/// newest first.
///
/// Gated by the entity's own view permission; a foreign tenant's entity
/// yields an empty list.
pub async fn entity_history(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<AccessContext>,
    Path((entity_type, entity_id)): Path<(String, String)>,
) -> axum::response::Response {
    let entity_type: EntityKind = match entity_type.parse() {
        Ok(kind) => kind,
        Err(e) => {
            return json_error(StatusCode::BAD_REQUEST, "invalid_entity_type", e.to_string());
        }
    };

    match state
        .recorder
        .get_history(&ctx, entity_type, &entity_id)
        .await
    {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => audit_error_to_response(e),
    }
}
