//! Product catalog operations, permission-gated and audited.

use chrono::Utc;
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use bizgrid_audit::{AuditError, UnitOfWork, prepare_create, prepare_delete, prepare_update};
use bizgrid_auth::{AccessContext, AccessError, Permission};
use bizgrid_core::DomainError;
use bizgrid_tenancy::{ScopedRepository, StoreError, TenantOwned};

use crate::product::{NewProduct, ProductRecord, ProductUpdate};
use crate::store::ProductStore;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Audit(#[from] AuditError),

    /// Covers both a missing id and a foreign tenant's id.
    #[error("product not found")]
    NotFound,

    #[error("sku already in use: {0}")]
    DuplicateSku(String),
}

/// Product catalog service. Every mutation commits together with its audit
/// entry through the unit of work; a failed audit write fails (and undoes)
/// the operation.
pub struct ProductService<S, W> {
    repo: ScopedRepository<ProductRecord, S>,
    writes: W,
}

impl<S, W> ProductService<S, W>
where
    S: ProductStore,
    W: UnitOfWork<ProductRecord>,
{
    pub fn new(store: S, writes: W) -> Self {
        Self {
            repo: ScopedRepository::new(store),
            writes,
        }
    }

    #[instrument(skip_all, err)]
    pub async fn create_product(
        &self,
        ctx: &AccessContext,
        input: NewProduct,
    ) -> Result<ProductRecord, ProductError> {
        ctx.require_permission(Permission::CreateProducts)?;
        input.validate()?;
        let tenant_id = ctx.resolve_create_tenant_id(input.tenant_id)?;

        let filter = ScopedRepository::<ProductRecord, S>::filter_for(ctx);
        if let Some(existing) = self.repo.store().find_by_sku(&filter, &input.sku).await? {
            if existing.tenant_id == tenant_id {
                return Err(ProductError::DuplicateSku(input.sku));
            }
        }

        let product = ProductRecord {
            id: Uuid::now_v7(),
            tenant_id,
            sku: input.sku,
            name: input.name,
            price_cents: input.price_cents,
            active: true,
            created_at: Utc::now(),
        };

        let entry = prepare_create(
            ctx,
            Some(tenant_id),
            ProductRecord::KIND,
            &product.id.to_string(),
            &product.snapshot(),
            None,
        );
        self.writes
            .upsert_with_entry(&filter, None, &product, &entry)
            .await?;
        Ok(product)
    }

    #[instrument(skip_all, fields(product_id = %id), err)]
    pub async fn update_product(
        &self,
        ctx: &AccessContext,
        id: Uuid,
        update: ProductUpdate,
    ) -> Result<ProductRecord, ProductError> {
        ctx.require_permission(Permission::EditProducts)?;

        let existing = self
            .repo
            .get_by_id_for_tenant(ctx, id)
            .await?
            .ok_or(ProductError::NotFound)?;
        let updated = update.apply(&existing)?;

        let entry = prepare_update(
            ctx,
            Some(updated.tenant_id),
            ProductRecord::KIND,
            &id.to_string(),
            &existing.snapshot(),
            &updated.snapshot(),
            None,
        );
        let filter = ScopedRepository::<ProductRecord, S>::filter_for(ctx);
        self.writes
            .upsert_with_entry(&filter, Some(&existing), &updated, &entry)
            .await?;
        Ok(updated)
    }

    #[instrument(skip_all, fields(product_id = %id), err)]
    pub async fn delete_product(&self, ctx: &AccessContext, id: Uuid) -> Result<(), ProductError> {
        ctx.require_permission(Permission::DeleteProducts)?;

        let existing = self
            .repo
            .get_by_id_for_tenant(ctx, id)
            .await?
            .ok_or(ProductError::NotFound)?;

        let entry = prepare_delete(
            ctx,
            Some(existing.tenant_id),
            ProductRecord::KIND,
            &id.to_string(),
            &existing.snapshot(),
            None,
        );
        let filter = ScopedRepository::<ProductRecord, S>::filter_for(ctx);
        if !self
            .writes
            .remove_with_entry(&filter, &existing, &entry)
            .await?
        {
            return Err(ProductError::NotFound);
        }
        Ok(())
    }

    pub async fn get_product(
        &self,
        ctx: &AccessContext,
        id: Uuid,
    ) -> Result<Option<ProductRecord>, ProductError> {
        ctx.require_permission(Permission::ViewProducts)?;
        Ok(self.repo.get_by_id_for_tenant(ctx, id).await?)
    }

    pub async fn list_products(
        &self,
        ctx: &AccessContext,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<ProductRecord>, ProductError> {
        ctx.require_permission(Permission::ViewProducts)?;
        Ok(self.repo.list_for_tenant(ctx, offset, limit).await?)
    }

    pub async fn find_by_sku(
        &self,
        ctx: &AccessContext,
        sku: &str,
    ) -> Result<Option<ProductRecord>, ProductError> {
        ctx.require_permission(Permission::ViewProducts)?;
        let filter = ScopedRepository::<ProductRecord, S>::filter_for(ctx);
        Ok(self.repo.store().find_by_sku(&filter, sku).await?)
    }
}
