//! Consistent JSON error responses.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use bizgrid_audit::AuditError;
use bizgrid_auth::AccessError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Map a typed authorization error to a transport response.
///
/// Cross-tenant reads never reach this point (they come back as empty
/// results), so there is no "forbidden because wrong tenant" case to leak.
pub fn access_error_to_response(err: AccessError) -> axum::response::Response {
    match err {
        AccessError::Forbidden(_) | AccessError::ForbiddenAny(_) => {
            json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string())
        }
        AccessError::MissingTenantId => {
            json_error(StatusCode::BAD_REQUEST, "missing_tenant", err.to_string())
        }
        AccessError::ActorDeactivated => {
            json_error(StatusCode::FORBIDDEN, "account_deactivated", err.to_string())
        }
        // Data-integrity problem, not a client error.
        AccessError::InvalidActorState => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "invalid_actor_state",
            err.to_string(),
        ),
    }
}

pub fn audit_error_to_response(err: AuditError) -> axum::response::Response {
    match err {
        AuditError::Access(e) => access_error_to_response(e),
        AuditError::Backend(_) | AuditError::Serialization(_) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "storage_error",
            err.to_string(),
        ),
    }
}
