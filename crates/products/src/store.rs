//! Product store: the scoped base plus the SKU lookup.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::Row;
use tracing::instrument;
use uuid::Uuid;

use bizgrid_tenancy::{InMemoryScopedStore, PgScopedStore, ScopedStore, StoreError, TenantFilter, TenantOwned};

use crate::product::ProductRecord;

/// Store for product records. The SKU lookup threads the caller's
/// [`TenantFilter`] like every other read; SKUs are only unique per tenant,
/// so an unfiltered lookup would be wrong as well as unsafe.
#[async_trait]
pub trait ProductStore: ScopedStore<ProductRecord> {
    async fn find_by_sku(
        &self,
        filter: &TenantFilter,
        sku: &str,
    ) -> Result<Option<ProductRecord>, StoreError>;
}

#[async_trait]
impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    async fn find_by_sku(
        &self,
        filter: &TenantFilter,
        sku: &str,
    ) -> Result<Option<ProductRecord>, StoreError> {
        (**self).find_by_sku(filter, sku).await
    }
}

#[async_trait]
impl ProductStore for InMemoryScopedStore<ProductRecord> {
    async fn find_by_sku(
        &self,
        filter: &TenantFilter,
        sku: &str,
    ) -> Result<Option<ProductRecord>, StoreError> {
        let visible = self.list(filter, 0, u64::MAX).await?;
        Ok(visible.into_iter().find(|p| p.sku == sku))
    }
}

/// Postgres product store.
pub type PgProductStore = PgScopedStore<ProductRecord>;

#[async_trait]
impl ProductStore for PgProductStore {
    #[instrument(skip(self), fields(tenant = ?filter.tenant(), sku = %sku), err)]
    async fn find_by_sku(
        &self,
        filter: &TenantFilter,
        sku: &str,
    ) -> Result<Option<ProductRecord>, StoreError> {
        let tenant_param: Option<Uuid> = filter.tenant().map(|t| *t.as_uuid());

        let row = sqlx::query(
            r#"
            SELECT payload
            FROM records
            WHERE entity_type = $1
                AND payload->>'sku' = $2
                AND ($3::uuid IS NULL OR tenant_id = $3)
            LIMIT 1
            "#,
        )
        .bind(ProductRecord::KIND.as_str())
        .bind(sku)
        .bind(tenant_param)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| StoreError::Backend(format!("find_product_by_sku: {e}")))?;

        match row {
            Some(row) => {
                let payload: serde_json::Value = row
                    .try_get("payload")
                    .map_err(|e| StoreError::Backend(format!("read_payload: {e}")))?;
                let product = serde_json::from_value(payload)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(product))
            }
            None => Ok(None),
        }
    }
}
