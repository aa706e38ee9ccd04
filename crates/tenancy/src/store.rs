//! Storage abstraction for tenant-owned records.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::entity::TenantOwned;
use crate::filter::TenantFilter;

/// Store operation error.
///
/// Infrastructure failures only; authorization/tenancy decisions never show
/// up here (a cross-tenant read is simply an empty result).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("record serialization failed: {0}")]
    Serialization(String),
}

/// Tenant-scoped record store.
///
/// Every read takes a [`TenantFilter`]; there is no unfiltered entry point.
/// Implementations must apply the filter before returning rows, so a record
/// belonging to another tenant behaves exactly like a record that does not
/// exist.
#[async_trait]
pub trait ScopedStore<E: TenantOwned>: Send + Sync {
    /// List records visible under `filter`, ordered by id, paginated.
    async fn list(
        &self,
        filter: &TenantFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<E>, StoreError>;

    /// Fetch by id. Returns `None` both when the row does not exist and when
    /// it belongs to a tenant outside `filter` (anti-enumeration).
    async fn get(&self, filter: &TenantFilter, id: Uuid) -> Result<Option<E>, StoreError>;

    /// Count records visible under `filter`.
    async fn count(&self, filter: &TenantFilter) -> Result<u64, StoreError>;

    /// Insert or replace a record under its own tenant.
    async fn upsert(&self, record: &E) -> Result<(), StoreError>;

    /// Delete by id within `filter`. Returns whether a row was removed.
    async fn remove(&self, filter: &TenantFilter, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
impl<E, S> ScopedStore<E> for Arc<S>
where
    E: TenantOwned + 'static,
    S: ScopedStore<E> + ?Sized,
{
    async fn list(
        &self,
        filter: &TenantFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<E>, StoreError> {
        (**self).list(filter, offset, limit).await
    }

    async fn get(&self, filter: &TenantFilter, id: Uuid) -> Result<Option<E>, StoreError> {
        (**self).get(filter, id).await
    }

    async fn count(&self, filter: &TenantFilter) -> Result<u64, StoreError> {
        (**self).count(filter).await
    }

    async fn upsert(&self, record: &E) -> Result<(), StoreError> {
        (**self).upsert(record).await
    }

    async fn remove(&self, filter: &TenantFilter, id: Uuid) -> Result<bool, StoreError> {
        (**self).remove(filter, id).await
    }
}
