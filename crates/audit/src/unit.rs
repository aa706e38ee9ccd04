//! Mutation-plus-audit writes as a single unit.
//!
//! A business mutation must never become durable without its audit entry,
//! and a rejected mutation must leave no entry behind. Services route every
//! write through a [`UnitOfWork`] instead of calling the record store and the
//! audit store separately.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;
use tracing::error;

use bizgrid_tenancy::{PgScopedStore, ScopedStore, TenantFilter, TenantOwned};

use crate::entry::AuditLogEntry;
use crate::postgres::PgAuditStore;
use crate::store::{AuditError, AuditStore};

/// A record write and its audit entry, committed together: after the call
/// either both are durable or neither is.
#[async_trait]
pub trait UnitOfWork<E: TenantOwned>: Send + Sync {
    /// Persist `record` together with `entry`.
    ///
    /// `previous` is the record's prior state; a non-transactional
    /// implementation restores it when the entry cannot be written (`None`
    /// for a create, which is undone by removal instead).
    async fn upsert_with_entry(
        &self,
        filter: &TenantFilter,
        previous: Option<&E>,
        record: &E,
        entry: &AuditLogEntry,
    ) -> Result<(), AuditError>;

    /// Remove `record` together with writing `entry`. Returns `false` (and
    /// appends nothing) when `filter` matches no row.
    async fn remove_with_entry(
        &self,
        filter: &TenantFilter,
        record: &E,
        entry: &AuditLogEntry,
    ) -> Result<bool, AuditError>;
}

#[async_trait]
impl<E, U> UnitOfWork<E> for Arc<U>
where
    E: TenantOwned,
    U: UnitOfWork<E> + ?Sized,
{
    async fn upsert_with_entry(
        &self,
        filter: &TenantFilter,
        previous: Option<&E>,
        record: &E,
        entry: &AuditLogEntry,
    ) -> Result<(), AuditError> {
        (**self)
            .upsert_with_entry(filter, previous, record, entry)
            .await
    }

    async fn remove_with_entry(
        &self,
        filter: &TenantFilter,
        record: &E,
        entry: &AuditLogEntry,
    ) -> Result<bool, AuditError> {
        (**self).remove_with_entry(filter, record, entry).await
    }
}

/// Postgres unit of work. Records and audit entries live in the same
/// database, so both statements run in one `sqlx` transaction.
#[derive(Debug, Clone)]
pub struct PgUnitOfWork {
    pool: PgPool,
}

impl PgUnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn tx_err(operation: &str, err: sqlx::Error) -> AuditError {
    AuditError::Backend(format!("{operation}: {err}"))
}

#[async_trait]
impl<E> UnitOfWork<E> for PgUnitOfWork
where
    E: TenantOwned + Serialize,
{
    async fn upsert_with_entry(
        &self,
        _filter: &TenantFilter,
        _previous: Option<&E>,
        record: &E,
        entry: &AuditLogEntry,
    ) -> Result<(), AuditError> {
        let mut tx = self.pool.begin().await.map_err(|e| tx_err("begin", e))?;
        PgScopedStore::<E>::upsert_in_tx(&mut tx, record).await?;
        PgAuditStore::append_in_tx(&mut tx, entry).await?;
        tx.commit().await.map_err(|e| tx_err("commit", e))
    }

    async fn remove_with_entry(
        &self,
        filter: &TenantFilter,
        record: &E,
        entry: &AuditLogEntry,
    ) -> Result<bool, AuditError> {
        let mut tx = self.pool.begin().await.map_err(|e| tx_err("begin", e))?;
        if !PgScopedStore::<E>::remove_in_tx(&mut tx, filter, record.id()).await? {
            tx.rollback().await.map_err(|e| tx_err("rollback", e))?;
            return Ok(false);
        }
        PgAuditStore::append_in_tx(&mut tx, entry).await?;
        tx.commit().await.map_err(|e| tx_err("commit", e))?;
        Ok(true)
    }
}

/// Unit of work for store pairs without a shared transaction (the in-memory
/// backends): the record write is applied first and undone when the entry
/// cannot be appended. The two writes are not isolated from concurrent
/// readers, so this is for tests and development, not production data.
#[derive(Debug, Clone)]
pub struct CompensatingUnitOfWork<S, A> {
    store: S,
    audit: A,
}

impl<S, A> CompensatingUnitOfWork<S, A> {
    pub fn new(store: S, audit: A) -> Self {
        Self { store, audit }
    }
}

#[async_trait]
impl<E, S, A> UnitOfWork<E> for CompensatingUnitOfWork<S, A>
where
    E: TenantOwned,
    S: ScopedStore<E>,
    A: AuditStore,
{
    async fn upsert_with_entry(
        &self,
        filter: &TenantFilter,
        previous: Option<&E>,
        record: &E,
        entry: &AuditLogEntry,
    ) -> Result<(), AuditError> {
        self.store.upsert(record).await?;
        if let Err(err) = self.audit.append(entry).await {
            let undo = match previous {
                Some(prev) => self.store.upsert(prev).await,
                None => self.store.remove(filter, record.id()).await.map(|_| ()),
            };
            if let Err(undo_err) = undo {
                error!(%err, %undo_err, "mutation could not be undone after a failed audit append");
            }
            return Err(err);
        }
        Ok(())
    }

    async fn remove_with_entry(
        &self,
        filter: &TenantFilter,
        record: &E,
        entry: &AuditLogEntry,
    ) -> Result<bool, AuditError> {
        if !self.store.remove(filter, record.id()).await? {
            return Ok(false);
        }
        if let Err(err) = self.audit.append(entry).await {
            if let Err(undo_err) = self.store.upsert(record).await {
                error!(%err, %undo_err, "record could not be restored after a failed audit append");
            }
            return Err(err);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;
    use uuid::Uuid;

    use bizgrid_auth::{AccessContext, Actor, Role, RolePolicy};
    use bizgrid_core::{EntityKind, TenantId, UserId};
    use bizgrid_tenancy::InMemoryScopedStore;

    use crate::entry::Snapshot;
    use crate::memory::InMemoryAuditStore;
    use crate::query::AuditQuery;
    use crate::recorder::{prepare_create, prepare_delete, prepare_update};

    #[derive(Debug, Clone, PartialEq)]
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

    /// Audit store whose appends always fail; reads see an empty log.
    #[derive(Debug, Default)]
    struct FailingAuditStore;

    #[async_trait]
    impl AuditStore for FailingAuditStore {
        async fn append(&self, _entry: &AuditLogEntry) -> Result<(), AuditError> {
            Err(AuditError::Backend("append rejected".to_string()))
        }

        async fn entity_history(
            &self,
            _filter: &TenantFilter,
            _entity_type: EntityKind,
            _entity_id: &str,
        ) -> Result<Vec<AuditLogEntry>, AuditError> {
            Ok(Vec::new())
        }

        async fn query(
            &self,
            _filter: &TenantFilter,
            _query: &AuditQuery,
        ) -> Result<(Vec<AuditLogEntry>, u64), AuditError> {
            Ok((Vec::new(), 0))
        }
    }

    fn member_ctx(tenant: TenantId) -> AccessContext {
        let actor = Actor::new(UserId::new(), Some(tenant), "+15550040", Role::CompanyAdmin);
        AccessContext::for_actor(Arc::new(RolePolicy::builtin()), &actor).unwrap()
    }

    fn widget(tenant: TenantId, name: &str) -> Widget {
        Widget {
            id: Uuid::now_v7(),
            tenant_id: tenant,
            name: name.to_string(),
        }
    }

    fn snapshot(value: serde_json::Value) -> Snapshot {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn happy_path_persists_record_and_entry() {
        let tenant = TenantId::new();
        let ctx = member_ctx(tenant);
        let filter = TenantFilter::from(&ctx);

        let store = Arc::new(InMemoryScopedStore::new());
        let audit = Arc::new(InMemoryAuditStore::new());
        let unit = CompensatingUnitOfWork::new(store.clone(), audit.clone());

        let record = widget(tenant, "anvil");
        let entry = prepare_create(
            &ctx,
            Some(tenant),
            EntityKind::Product,
            &record.id.to_string(),
            &snapshot(json!({"name": "anvil"})),
            None,
        );
        unit.upsert_with_entry(&filter, None, &record, &entry)
            .await
            .unwrap();

        assert!(store.get(&filter, record.id).await.unwrap().is_some());
        let history = audit
            .entity_history(&filter, EntityKind::Product, &record.id.to_string())
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn failed_append_undoes_a_create() {
        let tenant = TenantId::new();
        let ctx = member_ctx(tenant);
        let filter = TenantFilter::from(&ctx);

        let store = Arc::new(InMemoryScopedStore::new());
        let unit = CompensatingUnitOfWork::new(store.clone(), FailingAuditStore);

        let record = widget(tenant, "anvil");
        let entry = prepare_create(
            &ctx,
            Some(tenant),
            EntityKind::Product,
            &record.id.to_string(),
            &snapshot(json!({"name": "anvil"})),
            None,
        );
        let err = unit
            .upsert_with_entry(&filter, None, &record, &entry)
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::Backend(_)));

        // The record must not survive without its entry.
        assert!(store.get(&filter, record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_append_restores_the_previous_version() {
        let tenant = TenantId::new();
        let ctx = member_ctx(tenant);
        let filter = TenantFilter::from(&ctx);

        let store = Arc::new(InMemoryScopedStore::new());
        let previous = widget(tenant, "anvil");
        store.upsert(&previous).await.unwrap();

        let unit = CompensatingUnitOfWork::new(store.clone(), FailingAuditStore);

        let mut updated = previous.clone();
        updated.name = "anvil mk2".to_string();
        let entry = prepare_update(
            &ctx,
            Some(tenant),
            EntityKind::Product,
            &updated.id.to_string(),
            &snapshot(json!({"name": "anvil"})),
            &snapshot(json!({"name": "anvil mk2"})),
            None,
        );
        unit.upsert_with_entry(&filter, Some(&previous), &updated, &entry)
            .await
            .unwrap_err();

        let kept = store.get(&filter, previous.id).await.unwrap().unwrap();
        assert_eq!(kept, previous);
    }

    #[tokio::test]
    async fn failed_append_restores_a_removed_record() {
        let tenant = TenantId::new();
        let ctx = member_ctx(tenant);
        let filter = TenantFilter::from(&ctx);

        let store = Arc::new(InMemoryScopedStore::new());
        let record = widget(tenant, "anvil");
        store.upsert(&record).await.unwrap();

        let unit = CompensatingUnitOfWork::new(store.clone(), FailingAuditStore);

        let entry = prepare_delete(
            &ctx,
            Some(tenant),
            EntityKind::Product,
            &record.id.to_string(),
            &snapshot(json!({"name": "anvil"})),
            None,
        );
        unit.remove_with_entry(&filter, &record, &entry)
            .await
            .unwrap_err();

        assert!(store.get(&filter, record.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn remove_of_a_missing_row_appends_nothing() {
        let tenant = TenantId::new();
        let ctx = member_ctx(tenant);
        let filter = TenantFilter::from(&ctx);

        let store: Arc<InMemoryScopedStore<Widget>> = Arc::new(InMemoryScopedStore::new());
        let audit = Arc::new(InMemoryAuditStore::new());
        let unit = CompensatingUnitOfWork::new(store, audit.clone());

        let record = widget(tenant, "anvil");
        let entry = prepare_delete(
            &ctx,
            Some(tenant),
            EntityKind::Product,
            &record.id.to_string(),
            &snapshot(json!({"name": "anvil"})),
            None,
        );
        let removed = unit.remove_with_entry(&filter, &record, &entry).await.unwrap();
        assert!(!removed);

        let (_, total) = audit.query(&filter, &AuditQuery::default()).await.unwrap();
        assert_eq!(total, 0);
    }
}
