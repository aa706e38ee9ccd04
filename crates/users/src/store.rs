//! User store: the scoped base plus the phone lookup.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::Row;
use tracing::instrument;
use uuid::Uuid;

use bizgrid_tenancy::{InMemoryScopedStore, PgScopedStore, ScopedStore, StoreError, TenantFilter, TenantOwned};

use crate::user::UserRecord;

/// Store for user records.
///
/// `find_by_phone` is the entity-specific query: like every other read it
/// takes the caller's [`TenantFilter`], so a phone number registered in a
/// foreign tenant resolves to `None`.
#[async_trait]
pub trait UserStore: ScopedStore<UserRecord> {
    async fn find_by_phone(
        &self,
        filter: &TenantFilter,
        phone: &str,
    ) -> Result<Option<UserRecord>, StoreError>;
}

#[async_trait]
impl<S> UserStore for Arc<S>
where
    S: UserStore + ?Sized,
{
    async fn find_by_phone(
        &self,
        filter: &TenantFilter,
        phone: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        (**self).find_by_phone(filter, phone).await
    }
}

#[async_trait]
impl UserStore for InMemoryScopedStore<UserRecord> {
    async fn find_by_phone(
        &self,
        filter: &TenantFilter,
        phone: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let visible = self.list(filter, 0, u64::MAX).await?;
        Ok(visible.into_iter().find(|u| u.phone == phone))
    }
}

/// Postgres user store.
pub type PgUserStore = PgScopedStore<UserRecord>;

#[async_trait]
impl UserStore for PgUserStore {
    #[instrument(skip(self, phone), fields(tenant = ?filter.tenant()), err)]
    async fn find_by_phone(
        &self,
        filter: &TenantFilter,
        phone: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let tenant_param: Option<Uuid> = filter.tenant().map(|t| *t.as_uuid());

        let row = sqlx::query(
            r#"
            SELECT payload
            FROM records
            WHERE entity_type = $1
                AND payload->>'phone' = $2
                AND ($3::uuid IS NULL OR tenant_id = $3)
            LIMIT 1
            "#,
        )
        .bind(UserRecord::KIND.as_str())
        .bind(phone)
        .bind(tenant_param)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| StoreError::Backend(format!("find_user_by_phone: {e}")))?;

        match row {
            Some(row) => {
                let payload: serde_json::Value = row
                    .try_get("payload")
                    .map_err(|e| StoreError::Backend(format!("read_payload: {e}")))?;
                let user = serde_json::from_value(payload)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }
}
