//! Postgres-backed audit store.
//!
//! Entries are written inside the same transaction as the business mutation
//! they describe (see [`PgAuditStore::append_in_tx`]), so a committed change
//! always has its log entry and a rolled-back change never does.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE audit_logs (
//!     id           UUID        PRIMARY KEY,
//!     created_at   TIMESTAMPTZ NOT NULL,
//!     user_id      UUID        NOT NULL,
//!     username     TEXT        NOT NULL,
//!     user_role    TEXT        NOT NULL,
//!     company_id   UUID,
//!     company_name TEXT,
//!     action       TEXT        NOT NULL,
//!     entity_type  TEXT        NOT NULL,
//!     entity_id    TEXT        NOT NULL,
//!     old_values   JSONB,
//!     new_values   JSONB,
//!     changes      JSONB,
//!     description  TEXT
//! );
//! CREATE INDEX ix_audit_entity ON audit_logs (entity_type, entity_id, created_at DESC);
//! CREATE INDEX ix_audit_company ON audit_logs (company_id, created_at DESC);
//! ```
//!
//! There is intentionally no UPDATE or DELETE statement in this module.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use bizgrid_core::{AuditLogId, EntityKind, TenantId, UserId};
use bizgrid_tenancy::TenantFilter;

use crate::entry::{AuditAction, AuditLogEntry, Snapshot};
use crate::query::AuditQuery;
use crate::store::{AuditError, AuditStore};

/// Postgres audit log store. Clones share the underlying sqlx pool.
#[derive(Debug, Clone)]
pub struct PgAuditStore {
    pool: PgPool,
}

impl PgAuditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append an entry inside a caller-owned transaction.
    ///
    /// Business logic that mutates a record and logs the mutation runs both
    /// statements in one transaction through this method; the entry becomes
    /// visible exactly when the mutation commits.
    pub async fn append_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        entry: &AuditLogEntry,
    ) -> Result<(), AuditError> {
        insert_entry(&mut **tx, entry).await
    }
}

const INSERT_SQL: &str = r#"
    INSERT INTO audit_logs (
        id, created_at, user_id, username, user_role,
        company_id, company_name, action, entity_type, entity_id,
        old_values, new_values, changes, description
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
"#;

async fn insert_entry<'e, E>(executor: E, entry: &AuditLogEntry) -> Result<(), AuditError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let changes = entry
        .changes
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| AuditError::Serialization(e.to_string()))?;

    sqlx::query(INSERT_SQL)
        .bind(entry.id.as_uuid())
        .bind(entry.timestamp)
        .bind(entry.user_id.as_uuid())
        .bind(&entry.username)
        .bind(entry.user_role.as_str())
        .bind(entry.company_id.map(|t| *t.as_uuid()))
        .bind(&entry.company_name)
        .bind(entry.action.as_str())
        .bind(entry.entity_type.as_str())
        .bind(&entry.entity_id)
        .bind(entry.old_values.clone().map(serde_json::Value::Object))
        .bind(entry.new_values.clone().map(serde_json::Value::Object))
        .bind(changes)
        .bind(&entry.description)
        .execute(executor)
        .await
        .map_err(|e| map_sqlx_error("append_audit_entry", e))?;

    Ok(())
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> AuditError {
    AuditError::Backend(format!("{operation}: {err}"))
}

fn decode_snapshot(value: Option<serde_json::Value>) -> Result<Option<Snapshot>, AuditError> {
    match value {
        Some(serde_json::Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(AuditError::Serialization(format!(
            "snapshot column is not a JSON object: {other}"
        ))),
        None => Ok(None),
    }
}

fn decode_row(row: &PgRow) -> Result<AuditLogEntry, AuditError> {
    let read = |e: sqlx::Error| map_sqlx_error("read_audit_row", e);
    let parse = |e: bizgrid_core::DomainError| AuditError::Serialization(e.to_string());

    let id: Uuid = row.try_get("id").map_err(read)?;
    let timestamp: DateTime<Utc> = row.try_get("created_at").map_err(read)?;
    let user_id: Uuid = row.try_get("user_id").map_err(read)?;
    let username: String = row.try_get("username").map_err(read)?;
    let user_role: String = row.try_get("user_role").map_err(read)?;
    let company_id: Option<Uuid> = row.try_get("company_id").map_err(read)?;
    let company_name: Option<String> = row.try_get("company_name").map_err(read)?;
    let action: String = row.try_get("action").map_err(read)?;
    let entity_type: String = row.try_get("entity_type").map_err(read)?;
    let entity_id: String = row.try_get("entity_id").map_err(read)?;
    let old_values: Option<serde_json::Value> = row.try_get("old_values").map_err(read)?;
    let new_values: Option<serde_json::Value> = row.try_get("new_values").map_err(read)?;
    let changes: Option<serde_json::Value> = row.try_get("changes").map_err(read)?;
    let description: Option<String> = row.try_get("description").map_err(read)?;

    Ok(AuditLogEntry {
        id: AuditLogId::from_uuid(id),
        timestamp,
        user_id: UserId::from_uuid(user_id),
        username,
        user_role: user_role.parse().map_err(parse)?,
        company_id: company_id.map(TenantId::from_uuid),
        company_name,
        action: action.parse().map_err(parse)?,
        entity_type: entity_type.parse().map_err(parse)?,
        entity_id,
        old_values: decode_snapshot(old_values)?,
        new_values: decode_snapshot(new_values)?,
        changes: changes
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| AuditError::Serialization(e.to_string()))?,
        description,
    })
}

#[async_trait]
impl AuditStore for PgAuditStore {
    #[instrument(
        skip(self, entry),
        fields(action = entry.action.as_str(), entity_type = entry.entity_type.as_str()),
        err
    )]
    async fn append(&self, entry: &AuditLogEntry) -> Result<(), AuditError> {
        insert_entry(&self.pool, entry).await
    }

    #[instrument(
        skip(self),
        fields(entity_type = entity_type.as_str(), tenant = ?filter.tenant()),
        err
    )]
    async fn entity_history(
        &self,
        filter: &TenantFilter,
        entity_type: EntityKind,
        entity_id: &str,
    ) -> Result<Vec<AuditLogEntry>, AuditError> {
        let tenant_param: Option<Uuid> = filter.tenant().map(|t| *t.as_uuid());

        let rows = sqlx::query(
            r#"
            SELECT *
            FROM audit_logs
            WHERE entity_type = $1
                AND entity_id = $2
                AND ($3::uuid IS NULL OR company_id = $3)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(entity_type.as_str())
        .bind(entity_id)
        .bind(tenant_param)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("entity_history", e))?;

        rows.iter().map(decode_row).collect()
    }

    #[instrument(skip(self, query), fields(tenant = ?filter.tenant()), err)]
    async fn query(
        &self,
        filter: &TenantFilter,
        query: &AuditQuery,
    ) -> Result<(Vec<AuditLogEntry>, u64), AuditError> {
        let tenant_param: Option<Uuid> = filter.tenant().map(|t| *t.as_uuid());
        let company_param: Option<Uuid> = query.company_id.map(|t| *t.as_uuid());
        let entity_type_param = query.entity_type.map(|k| k.as_str());
        let user_param: Option<Uuid> = query.user_id.map(|u| *u.as_uuid());
        let action_param = query.action.map(|a| a.as_str());

        const WHERE_SQL: &str = r#"
            WHERE ($1::uuid IS NULL OR company_id = $1)
                AND ($2::uuid IS NULL OR company_id = $2)
                AND ($3::text IS NULL OR entity_type = $3)
                AND ($4::text IS NULL OR entity_id = $4)
                AND ($5::uuid IS NULL OR user_id = $5)
                AND ($6::text IS NULL OR action = $6)
                AND ($7::timestamptz IS NULL OR created_at >= $7)
                AND ($8::timestamptz IS NULL OR created_at <= $8)
        "#;

        let count_row = sqlx::query(&format!(
            "SELECT COUNT(*) AS total FROM audit_logs {WHERE_SQL}"
        ))
        .bind(tenant_param)
        .bind(company_param)
        .bind(entity_type_param)
        .bind(&query.entity_id)
        .bind(user_param)
        .bind(action_param)
        .bind(query.start_date)
        .bind(query.end_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("count_audit_entries", e))?;

        let total: i64 = count_row
            .try_get("total")
            .map_err(|e| map_sqlx_error("read_count", e))?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT * FROM audit_logs {WHERE_SQL}
            ORDER BY created_at DESC, id DESC
            LIMIT $9 OFFSET $10
            "#
        ))
        .bind(tenant_param)
        .bind(company_param)
        .bind(entity_type_param)
        .bind(&query.entity_id)
        .bind(user_param)
        .bind(action_param)
        .bind(query.start_date)
        .bind(query.end_date)
        .bind(query.effective_limit() as i64)
        .bind(query.effective_offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("query_audit_entries", e))?;

        let entries = rows
            .iter()
            .map(decode_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((entries, total as u64))
    }
}
