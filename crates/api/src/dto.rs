//! Request/response DTOs and JSON mapping helpers.

use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bizgrid_audit::{AuditAction, AuditLogEntry, AuditQuery};
use bizgrid_core::{EntityKind, TenantId, UserId};

use crate::errors::json_error;

/// Query parameters for `GET /audit-logs`.
///
/// `entity_type` and `action` arrive as their wire strings (`"product"`,
/// `"CREATE"`); an unknown value is a 400, not an empty result.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AuditLogParams {
    pub company_id: Option<Uuid>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub user_id: Option<Uuid>,
    pub action: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl AuditLogParams {
    pub fn into_query(self) -> Result<AuditQuery, Response> {
        let entity_type = self
            .entity_type
            .as_deref()
            .map(|raw| {
                raw.parse::<EntityKind>()
                    .map_err(|e| json_error(StatusCode::BAD_REQUEST, "invalid_entity_type", e.to_string()))
            })
            .transpose()?;
        let action = self
            .action
            .as_deref()
            .map(|raw| {
                raw.parse::<AuditAction>()
                    .map_err(|e| json_error(StatusCode::BAD_REQUEST, "invalid_action", e.to_string()))
            })
            .transpose()?;

        Ok(AuditQuery {
            company_id: self.company_id.map(TenantId::from_uuid),
            entity_type,
            entity_id: self.entity_id,
            user_id: self.user_id.map(UserId::from_uuid),
            action,
            start_date: self.start_date,
            end_date: self.end_date,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

/// One page of the audit log.
#[derive(Debug, Serialize)]
pub struct AuditLogPage {
    pub entries: Vec<AuditLogEntry>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}
