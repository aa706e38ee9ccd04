//! Generic repository base enforcing tenant scoping on every read.

use uuid::Uuid;

use bizgrid_auth::AccessContext;

use crate::entity::TenantOwned;
use crate::filter::TenantFilter;
use crate::store::{ScopedStore, StoreError};

/// Server-side cap on page size, regardless of the caller-requested limit.
pub const MAX_PAGE_SIZE: u64 = 1000;

/// Clamp a caller-requested page size to the server-side cap.
pub fn page_limit(requested: u64) -> u64 {
    requested.min(MAX_PAGE_SIZE)
}

/// Repository base for a tenant-owned record type.
///
/// All standard access goes through these methods, which derive the filter
/// from the caller's [`AccessContext`]. Entity-specific query methods on
/// concrete repositories must do the same: take the context, build the
/// filter with [`Self::filter_for`], and pass it to the store.
#[derive(Debug, Clone)]
pub struct ScopedRepository<E, S> {
    store: S,
    _marker: std::marker::PhantomData<fn() -> E>,
}

impl<E, S> ScopedRepository<E, S>
where
    E: TenantOwned,
    S: ScopedStore<E>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            _marker: std::marker::PhantomData,
        }
    }

    /// The underlying store, for entity-specific query methods.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Build the filter for a request context.
    pub fn filter_for(ctx: &AccessContext) -> TenantFilter {
        TenantFilter::from(ctx)
    }

    /// List records visible to the caller, paginated.
    ///
    /// Non-admin contexts are restricted to their own tenant; system admins
    /// see rows across all tenants.
    pub async fn list_for_tenant(
        &self,
        ctx: &AccessContext,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<E>, StoreError> {
        let filter = Self::filter_for(ctx);
        self.store.list(&filter, offset, page_limit(limit)).await
    }

    /// Fetch by id with the tenant check applied.
    ///
    /// Returns `None` both for a missing row and for a row owned by another
    /// tenant, so response shapes cannot be used to enumerate foreign ids.
    pub async fn get_by_id_for_tenant(
        &self,
        ctx: &AccessContext,
        id: Uuid,
    ) -> Result<Option<E>, StoreError> {
        let filter = Self::filter_for(ctx);
        self.store.get(&filter, id).await
    }

    /// Count records visible to the caller.
    pub async fn count_for_tenant(&self, ctx: &AccessContext) -> Result<u64, StoreError> {
        let filter = Self::filter_for(ctx);
        self.store.count(&filter).await
    }

    /// Persist a record under its own tenant.
    pub async fn save(&self, record: &E) -> Result<(), StoreError> {
        self.store.upsert(record).await
    }

    /// Delete by id within the caller's scope. Returns whether a row was
    /// removed; a cross-tenant id removes nothing.
    pub async fn delete_for_tenant(
        &self,
        ctx: &AccessContext,
        id: Uuid,
    ) -> Result<bool, StoreError> {
        let filter = Self::filter_for(ctx);
        self.store.remove(&filter, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde::{Deserialize, Serialize};

    use bizgrid_auth::{Actor, Role, RolePolicy};
    use bizgrid_core::{EntityKind, TenantId, UserId};

    use crate::memory::InMemoryScopedStore;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Widget {
        id: Uuid,
        tenant_id: TenantId,
        name: String,
    }

    impl TenantOwned for Widget {
        const KIND: EntityKind = EntityKind::Product;

        fn id(&self) -> Uuid {
            self.id
        }

        fn tenant_id(&self) -> TenantId {
            self.tenant_id
        }
    }

    fn widget(tenant_id: TenantId, name: &str) -> Widget {
        Widget {
            id: Uuid::now_v7(),
            tenant_id,
            name: name.to_string(),
        }
    }

    fn ctx(actor: &Actor) -> AccessContext {
        AccessContext::for_actor(Arc::new(RolePolicy::builtin()), actor).unwrap()
    }

    fn member_ctx(tenant: TenantId) -> AccessContext {
        ctx(&Actor::new(
            UserId::new(),
            Some(tenant),
            "+15550004",
            Role::CompanyAdmin,
        ))
    }

    fn admin_ctx() -> AccessContext {
        ctx(&Actor::new(UserId::new(), None, "root", Role::SystemAdmin))
    }

    async fn seeded_repo(
        t1: TenantId,
        t2: TenantId,
    ) -> ScopedRepository<Widget, Arc<InMemoryScopedStore<Widget>>> {
        let repo = ScopedRepository::new(Arc::new(InMemoryScopedStore::new()));
        repo.save(&widget(t1, "anvil")).await.unwrap();
        repo.save(&widget(t1, "hammer")).await.unwrap();
        repo.save(&widget(t2, "crowbar")).await.unwrap();
        repo
    }

    #[tokio::test]
    async fn non_admin_only_sees_its_own_tenant() {
        let (t1, t2) = (TenantId::new(), TenantId::new());
        let repo = seeded_repo(t1, t2).await;

        let rows = repo.list_for_tenant(&member_ctx(t1), 0, 100).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|w| w.tenant_id == t1));

        assert_eq!(repo.count_for_tenant(&member_ctx(t1)).await.unwrap(), 2);
        assert_eq!(repo.count_for_tenant(&member_ctx(t2)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn admin_sees_rows_across_all_tenants() {
        let (t1, t2) = (TenantId::new(), TenantId::new());
        let repo = seeded_repo(t1, t2).await;

        let rows = repo.list_for_tenant(&admin_ctx(), 0, 100).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(repo.count_for_tenant(&admin_ctx()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn cross_tenant_get_returns_none_not_an_error() {
        let (t1, t2) = (TenantId::new(), TenantId::new());
        let repo = seeded_repo(t1, t2).await;

        let foreign = repo.list_for_tenant(&member_ctx(t2), 0, 10).await.unwrap();
        let foreign_id = foreign[0].id;

        let result = repo
            .get_by_id_for_tenant(&member_ctx(t1), foreign_id)
            .await
            .unwrap();
        assert_eq!(result, None);

        // Same id resolves fine for its owner.
        let owned = repo
            .get_by_id_for_tenant(&member_ctx(t2), foreign_id)
            .await
            .unwrap();
        assert!(owned.is_some());
    }

    #[tokio::test]
    async fn missing_id_and_foreign_id_are_indistinguishable() {
        let (t1, t2) = (TenantId::new(), TenantId::new());
        let repo = seeded_repo(t1, t2).await;
        let ctx = member_ctx(t1);

        let missing = repo.get_by_id_for_tenant(&ctx, Uuid::now_v7()).await.unwrap();
        let foreign_id = repo.list_for_tenant(&member_ctx(t2), 0, 1).await.unwrap()[0].id;
        let foreign = repo.get_by_id_for_tenant(&ctx, foreign_id).await.unwrap();

        assert_eq!(missing, foreign);
    }

    #[tokio::test]
    async fn cross_tenant_delete_removes_nothing() {
        let (t1, t2) = (TenantId::new(), TenantId::new());
        let repo = seeded_repo(t1, t2).await;

        let foreign_id = repo.list_for_tenant(&member_ctx(t2), 0, 1).await.unwrap()[0].id;
        assert!(!repo.delete_for_tenant(&member_ctx(t1), foreign_id).await.unwrap());
        assert!(repo.delete_for_tenant(&member_ctx(t2), foreign_id).await.unwrap());
    }

    #[tokio::test]
    async fn listing_paginates_in_id_order() {
        let tenant = TenantId::new();
        let repo = ScopedRepository::new(Arc::new(InMemoryScopedStore::new()));
        for i in 0..5 {
            repo.save(&widget(tenant, &format!("w{i}"))).await.unwrap();
        }

        let ctx = member_ctx(tenant);
        let first = repo.list_for_tenant(&ctx, 0, 2).await.unwrap();
        let second = repo.list_for_tenant(&ctx, 2, 2).await.unwrap();
        let third = repo.list_for_tenant(&ctx, 4, 2).await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert_eq!(third.len(), 1);
        let mut ids: Vec<Uuid> = first
            .iter()
            .chain(&second)
            .chain(&third)
            .map(|w| w.id)
            .collect();
        let sorted = {
            let mut s = ids.clone();
            s.sort();
            s
        };
        assert_eq!(ids, sorted);
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn page_limit_is_capped_server_side() {
        assert_eq!(page_limit(10), 10);
        assert_eq!(page_limit(MAX_PAGE_SIZE), MAX_PAGE_SIZE);
        assert_eq!(page_limit(u64::MAX), MAX_PAGE_SIZE);
    }
}
