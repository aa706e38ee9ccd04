//! Postgres-backed scoped store.
//!
//! Records are persisted as JSONB payloads in a single `records` table keyed
//! by `(entity_type, id)`, with `tenant_id` as a first-class indexed column.
//! Every query includes the tenant predicate derived from the
//! [`TenantFilter`]; there is no code path that reads the table without it.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE records (
//!     entity_type TEXT        NOT NULL,
//!     id          UUID        NOT NULL,
//!     tenant_id   UUID        NOT NULL,
//!     payload     JSONB       NOT NULL,
//!     updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     PRIMARY KEY (entity_type, id)
//! );
//! CREATE INDEX ix_records_tenant ON records (entity_type, tenant_id, id);
//! ```

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use crate::entity::TenantOwned;
use crate::filter::TenantFilter;
use crate::store::{ScopedStore, StoreError};

/// Postgres store for one tenant-owned record type.
///
/// Thread-safe: clones share the underlying sqlx pool.
#[derive(Debug, Clone)]
pub struct PgScopedStore<E> {
    pool: PgPool,
    _marker: PhantomData<fn() -> E>,
}

impl<E> PgScopedStore<E> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }

    /// The underlying pool, for entity-specific queries. Custom SQL must
    /// still include the tenant predicate from the caller's filter.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl<E> PgScopedStore<E>
where
    E: TenantOwned + Serialize,
{
    /// Upsert inside a caller-owned transaction.
    ///
    /// Business logic that must persist a record and its audit entry as one
    /// unit runs both statements in the same transaction through this method.
    pub async fn upsert_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        record: &E,
    ) -> Result<(), StoreError> {
        upsert_record(&mut **tx, record).await
    }

    /// Remove inside a caller-owned transaction. Returns whether a row was
    /// removed; the tenant predicate from `filter` applies as everywhere else.
    pub async fn remove_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        filter: &TenantFilter,
        id: Uuid,
    ) -> Result<bool, StoreError> {
        remove_record::<_, E>(&mut **tx, filter, id).await
    }
}

async fn upsert_record<'e, X, E>(executor: X, record: &E) -> Result<(), StoreError>
where
    X: sqlx::Executor<'e, Database = Postgres>,
    E: TenantOwned + Serialize,
{
    let payload =
        serde_json::to_value(record).map_err(|e| StoreError::Serialization(e.to_string()))?;

    sqlx::query(
        r#"
        INSERT INTO records (entity_type, id, tenant_id, payload)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (entity_type, id)
        DO UPDATE SET
            payload = EXCLUDED.payload,
            updated_at = NOW()
        WHERE records.tenant_id = EXCLUDED.tenant_id
        "#,
    )
    .bind(E::KIND.as_str())
    .bind(record.id())
    .bind(record.tenant_id().as_uuid())
    .bind(&payload)
    .execute(executor)
    .await
    .map_err(|e| map_sqlx_error("upsert_record", e))?;

    Ok(())
}

async fn remove_record<'e, X, E>(
    executor: X,
    filter: &TenantFilter,
    id: Uuid,
) -> Result<bool, StoreError>
where
    X: sqlx::Executor<'e, Database = Postgres>,
    E: TenantOwned,
{
    let tenant_param: Option<Uuid> = filter.tenant().map(|t| *t.as_uuid());

    let result = sqlx::query(
        r#"
        DELETE FROM records
        WHERE entity_type = $1
            AND id = $2
            AND ($3::uuid IS NULL OR tenant_id = $3)
        "#,
    )
    .bind(E::KIND.as_str())
    .bind(id)
    .bind(tenant_param)
    .execute(executor)
    .await
    .map_err(|e| map_sqlx_error("remove_record", e))?;

    Ok(result.rows_affected() > 0)
}

fn decode<E: DeserializeOwned>(payload: serde_json::Value) -> Result<E, StoreError> {
    serde_json::from_value(payload).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    StoreError::Backend(format!("{operation}: {err}"))
}

#[async_trait]
impl<E> ScopedStore<E> for PgScopedStore<E>
where
    E: TenantOwned + Serialize + DeserializeOwned + 'static,
{
    #[instrument(skip(self), fields(entity_type = E::KIND.as_str(), tenant = ?filter.tenant()), err)]
    async fn list(
        &self,
        filter: &TenantFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<E>, StoreError> {
        let tenant_param: Option<Uuid> = filter.tenant().map(|t| *t.as_uuid());

        let rows = sqlx::query(
            r#"
            SELECT payload
            FROM records
            WHERE entity_type = $1
                AND ($2::uuid IS NULL OR tenant_id = $2)
            ORDER BY id ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(E::KIND.as_str())
        .bind(tenant_param)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_records", e))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let payload: serde_json::Value = row
                .try_get("payload")
                .map_err(|e| map_sqlx_error("read_payload", e))?;
            records.push(decode(payload)?);
        }
        Ok(records)
    }

    #[instrument(skip(self), fields(entity_type = E::KIND.as_str(), tenant = ?filter.tenant(), id = %id), err)]
    async fn get(&self, filter: &TenantFilter, id: Uuid) -> Result<Option<E>, StoreError> {
        let tenant_param: Option<Uuid> = filter.tenant().map(|t| *t.as_uuid());

        let row = sqlx::query(
            r#"
            SELECT payload
            FROM records
            WHERE entity_type = $1
                AND id = $2
                AND ($3::uuid IS NULL OR tenant_id = $3)
            "#,
        )
        .bind(E::KIND.as_str())
        .bind(id)
        .bind(tenant_param)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_record", e))?;

        match row {
            Some(row) => {
                let payload: serde_json::Value = row
                    .try_get("payload")
                    .map_err(|e| map_sqlx_error("read_payload", e))?;
                Ok(Some(decode(payload)?))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(entity_type = E::KIND.as_str(), tenant = ?filter.tenant()), err)]
    async fn count(&self, filter: &TenantFilter) -> Result<u64, StoreError> {
        let tenant_param: Option<Uuid> = filter.tenant().map(|t| *t.as_uuid());

        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total
            FROM records
            WHERE entity_type = $1
                AND ($2::uuid IS NULL OR tenant_id = $2)
            "#,
        )
        .bind(E::KIND.as_str())
        .bind(tenant_param)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("count_records", e))?;

        let total: i64 = row
            .try_get("total")
            .map_err(|e| map_sqlx_error("read_count", e))?;
        Ok(total as u64)
    }

    #[instrument(skip(self, record), fields(entity_type = E::KIND.as_str(), id = %record.id()), err)]
    async fn upsert(&self, record: &E) -> Result<(), StoreError> {
        upsert_record(&self.pool, record).await
    }

    #[instrument(skip(self), fields(entity_type = E::KIND.as_str(), tenant = ?filter.tenant(), id = %id), err)]
    async fn remove(&self, filter: &TenantFilter, id: Uuid) -> Result<bool, StoreError> {
        remove_record::<_, E>(&self.pool, filter, id).await
    }
}
