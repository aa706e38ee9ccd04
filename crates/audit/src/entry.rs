//! Audit log entry model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bizgrid_auth::Role;
use bizgrid_core::{AuditLogId, EntityKind, TenantId, UserId};

/// A field snapshot: entity fields as a JSON object.
pub type Snapshot = serde_json::Map<String, serde_json::Value>;

/// What happened to the entity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
        }
    }
}

impl core::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for AuditAction {
    type Err = bizgrid_core::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(AuditAction::Create),
            "UPDATE" => Ok(AuditAction::Update),
            "DELETE" => Ok(AuditAction::Delete),
            other => Err(bizgrid_core::DomainError::validation(format!(
                "unknown audit action: {other}"
            ))),
        }
    }
}

/// One field's old/new pair inside an update delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub old: serde_json::Value,
    pub new: serde_json::Value,
}

/// Append-only record of a single mutation.
///
/// Tracks WHO did WHAT to WHICH entity and WHEN. The actor fields are
/// captured by value, not by reference, so the entry still renders after the
/// actor account is deactivated or renamed. Entries are created exactly once
/// per mutation and never updated or deleted by any code path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: AuditLogId,
    pub timestamp: DateTime<Utc>,

    // Actor (who)
    pub user_id: UserId,
    pub username: String,
    pub user_role: Role,

    // Tenancy (where); null only for actions on non-tenant data
    pub company_id: Option<TenantId>,
    pub company_name: Option<String>,

    // Operation (what)
    pub action: AuditAction,
    pub entity_type: EntityKind,
    pub entity_id: String,

    // Redacted snapshots; `old_values` is null for CREATE,
    // `new_values` is null for DELETE
    pub old_values: Option<Snapshot>,
    pub new_values: Option<Snapshot>,
    /// Computed field delta, present only for UPDATE. Keyed by field name,
    /// so output is independent of map iteration order.
    pub changes: Option<BTreeMap<String, FieldChange>>,

    pub description: Option<String>,
}
