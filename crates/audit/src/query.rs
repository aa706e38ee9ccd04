//! Audit log query filters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bizgrid_core::{EntityKind, TenantId, UserId};

use crate::entry::AuditAction;

/// Default page size for audit log listings.
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// Filters for the global audit log screen.
///
/// All filters are optional and combined with AND. `company_id` only has an
/// effect for system administrators; non-admin callers are silently
/// constrained to their own tenant whatever they pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditQuery {
    pub company_id: Option<TenantId>,
    pub entity_type: Option<EntityKind>,
    pub entity_id: Option<String>,
    pub user_id: Option<UserId>,
    pub action: Option<AuditAction>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl AuditQuery {
    /// Effective page size: defaults to [`DEFAULT_PAGE_SIZE`], capped at the
    /// server-side maximum.
    pub fn effective_limit(&self) -> u64 {
        bizgrid_tenancy::repository::page_limit(self.limit.unwrap_or(DEFAULT_PAGE_SIZE))
    }

    pub fn effective_offset(&self) -> u64 {
        self.offset.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_caps() {
        let query = AuditQuery::default();
        assert_eq!(query.effective_limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(query.effective_offset(), 0);

        let query = AuditQuery {
            limit: Some(5000),
            offset: Some(10),
            ..AuditQuery::default()
        };
        assert_eq!(query.effective_limit(), bizgrid_tenancy::MAX_PAGE_SIZE);
        assert_eq!(query.effective_offset(), 10);
    }
}
