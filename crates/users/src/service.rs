//! User provisioning and maintenance, permission-gated and audited.

use chrono::Utc;
use thiserror::Error;
use tracing::instrument;

use bizgrid_audit::{AuditError, UnitOfWork, prepare_create, prepare_delete, prepare_update};
use bizgrid_auth::{AccessContext, AccessError, Permission};
use bizgrid_core::{DomainError, UserId};
use bizgrid_tenancy::{ScopedRepository, StoreError, TenantOwned};

use crate::store::UserStore;
use crate::user::{NewUser, UserRecord, UserUpdate};

#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Audit(#[from] AuditError),

    /// Covers both a missing id and a foreign tenant's id.
    #[error("user not found")]
    NotFound,
}

/// User account operations.
///
/// Every mutation commits together with its audit entry through the unit of
/// work; a failed audit write fails (and undoes) the operation. Only the
/// system administrator provisions or deletes accounts (company admins may
/// view and edit).
pub struct UserService<S, W> {
    repo: ScopedRepository<UserRecord, S>,
    writes: W,
}

impl<S, W> UserService<S, W>
where
    S: UserStore,
    W: UnitOfWork<UserRecord>,
{
    pub fn new(store: S, writes: W) -> Self {
        Self {
            repo: ScopedRepository::new(store),
            writes,
        }
    }

    #[instrument(skip_all, err)]
    pub async fn create_user(
        &self,
        ctx: &AccessContext,
        input: NewUser,
    ) -> Result<UserRecord, UserError> {
        ctx.require_permission(Permission::CreateUsers)?;
        input.validate()?;
        let tenant_id = ctx.resolve_create_tenant_id(input.tenant_id)?;

        let user = UserRecord {
            id: UserId::new(),
            tenant_id,
            phone: input.phone,
            display_name: input.display_name,
            role: input.role,
            password_hash: input.password_hash,
            active: true,
            created_at: Utc::now(),
        };

        let entry = prepare_create(
            ctx,
            Some(tenant_id),
            UserRecord::KIND,
            &user.id.to_string(),
            &user.snapshot(),
            None,
        );
        let filter = ScopedRepository::<UserRecord, S>::filter_for(ctx);
        self.writes
            .upsert_with_entry(&filter, None, &user, &entry)
            .await?;
        Ok(user)
    }

    #[instrument(skip_all, fields(user_id = %id), err)]
    pub async fn update_user(
        &self,
        ctx: &AccessContext,
        id: UserId,
        update: UserUpdate,
    ) -> Result<UserRecord, UserError> {
        ctx.require_permission(Permission::EditUsers)?;

        let existing = self
            .repo
            .get_by_id_for_tenant(ctx, *id.as_uuid())
            .await?
            .ok_or(UserError::NotFound)?;
        let updated = update.apply(&existing)?;

        let entry = prepare_update(
            ctx,
            Some(updated.tenant_id),
            UserRecord::KIND,
            &id.to_string(),
            &existing.snapshot(),
            &updated.snapshot(),
            None,
        );
        let filter = ScopedRepository::<UserRecord, S>::filter_for(ctx);
        self.writes
            .upsert_with_entry(&filter, Some(&existing), &updated, &entry)
            .await?;
        Ok(updated)
    }

    /// Soft-delete: the account is deactivated, never removed, so its
    /// display name keeps resolving in old audit entries.
    #[instrument(skip_all, fields(user_id = %id), err)]
    pub async fn deactivate_user(
        &self,
        ctx: &AccessContext,
        id: UserId,
    ) -> Result<(), UserError> {
        ctx.require_permission(Permission::DeleteUsers)?;

        let existing = self
            .repo
            .get_by_id_for_tenant(ctx, *id.as_uuid())
            .await?
            .ok_or(UserError::NotFound)?;

        let mut deactivated = existing.clone();
        deactivated.active = false;

        let entry = prepare_delete(
            ctx,
            Some(existing.tenant_id),
            UserRecord::KIND,
            &id.to_string(),
            &existing.snapshot(),
            Some("account deactivated".to_string()),
        );
        let filter = ScopedRepository::<UserRecord, S>::filter_for(ctx);
        self.writes
            .upsert_with_entry(&filter, Some(&existing), &deactivated, &entry)
            .await?;
        Ok(())
    }

    pub async fn get_user(
        &self,
        ctx: &AccessContext,
        id: UserId,
    ) -> Result<Option<UserRecord>, UserError> {
        ctx.require_permission(Permission::ViewUsers)?;
        Ok(self.repo.get_by_id_for_tenant(ctx, *id.as_uuid()).await?)
    }

    pub async fn list_users(
        &self,
        ctx: &AccessContext,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<UserRecord>, UserError> {
        ctx.require_permission(Permission::ViewUsers)?;
        Ok(self.repo.list_for_tenant(ctx, offset, limit).await?)
    }

    pub async fn find_by_phone(
        &self,
        ctx: &AccessContext,
        phone: &str,
    ) -> Result<Option<UserRecord>, UserError> {
        ctx.require_permission(Permission::ViewUsers)?;
        let filter = ScopedRepository::<UserRecord, S>::filter_for(ctx);
        Ok(self.repo.store().find_by_phone(&filter, phone).await?)
    }
}
