//! Storage abstraction for the audit log.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use bizgrid_auth::AccessError;
use bizgrid_core::EntityKind;
use bizgrid_tenancy::{StoreError, TenantFilter};

use crate::entry::AuditLogEntry;
use crate::query::AuditQuery;

/// Audit subsystem error.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The caller is not allowed to read or record this entry.
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("audit storage backend error: {0}")]
    Backend(String),

    #[error("audit entry serialization failed: {0}")]
    Serialization(String),
}

/// Record-store failures surface unchanged when a mutation and its entry are
/// written as one unit.
impl From<StoreError> for AuditError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Backend(msg) => AuditError::Backend(msg),
            StoreError::Serialization(msg) => AuditError::Serialization(msg),
        }
    }
}

/// Append-only audit log store.
///
/// Entries are written once and never updated or deleted; the trait exposes
/// no mutation beyond [`append`](AuditStore::append). Reads take a
/// [`TenantFilter`] like every other scoped data access: an entry for another
/// tenant's entity is invisible, not an error.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Persist a new entry.
    async fn append(&self, entry: &AuditLogEntry) -> Result<(), AuditError>;

    /// All entries for one entity, newest first.
    async fn entity_history(
        &self,
        filter: &TenantFilter,
        entity_type: EntityKind,
        entity_id: &str,
    ) -> Result<Vec<AuditLogEntry>, AuditError>;

    /// Filtered page of the log, newest first, plus the total match count
    /// before pagination.
    async fn query(
        &self,
        filter: &TenantFilter,
        query: &AuditQuery,
    ) -> Result<(Vec<AuditLogEntry>, u64), AuditError>;
}

#[async_trait]
impl<S> AuditStore for Arc<S>
where
    S: AuditStore + ?Sized,
{
    async fn append(&self, entry: &AuditLogEntry) -> Result<(), AuditError> {
        (**self).append(entry).await
    }

    async fn entity_history(
        &self,
        filter: &TenantFilter,
        entity_type: EntityKind,
        entity_id: &str,
    ) -> Result<Vec<AuditLogEntry>, AuditError> {
        (**self).entity_history(filter, entity_type, entity_id).await
    }

    async fn query(
        &self,
        filter: &TenantFilter,
        query: &AuditQuery,
    ) -> Result<(Vec<AuditLogEntry>, u64), AuditError> {
        (**self).query(filter, query).await
    }
}
