//! The audit recorder: builds, redacts and persists log entries.

use chrono::Utc;
use serde_json::Value;
use tracing::instrument;

use bizgrid_auth::{AccessContext, Permission};
use bizgrid_core::{AuditLogId, EntityKind, TenantId};
use bizgrid_tenancy::TenantFilter;

use crate::delta::compute_changes;
use crate::entry::{AuditAction, AuditLogEntry, Snapshot};
use crate::query::AuditQuery;
use crate::redact::{REDACTION_MARKER, is_sensitive_field, redact_snapshot};
use crate::store::{AuditError, AuditStore};

/// Records mutations and serves history reads.
///
/// Writes are not permission-gated here: the business operation already
/// passed its own guard before mutating, and a mutation must never succeed
/// audit-less. Reads are gated: history needs the entity's view permission,
/// the global log needs the audit permission.
#[derive(Debug, Clone)]
pub struct AuditRecorder<S> {
    store: S,
}

impl<S: AuditStore> AuditRecorder<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Record an entity creation.
    #[instrument(skip_all, fields(entity_type = entity_type.as_str(), entity_id = %entity_id), err)]
    pub async fn record_create(
        &self,
        ctx: &AccessContext,
        tenant_id: Option<TenantId>,
        entity_type: EntityKind,
        entity_id: &str,
        new_values: &Snapshot,
        description: Option<String>,
    ) -> Result<AuditLogEntry, AuditError> {
        let entry = prepare_create(ctx, tenant_id, entity_type, entity_id, new_values, description);
        self.store.append(&entry).await?;
        Ok(entry)
    }

    /// Record an entity update.
    #[instrument(skip_all, fields(entity_type = entity_type.as_str(), entity_id = %entity_id), err)]
    pub async fn record_update(
        &self,
        ctx: &AccessContext,
        tenant_id: Option<TenantId>,
        entity_type: EntityKind,
        entity_id: &str,
        old_values: &Snapshot,
        new_values: &Snapshot,
        description: Option<String>,
    ) -> Result<AuditLogEntry, AuditError> {
        let entry = prepare_update(
            ctx,
            tenant_id,
            entity_type,
            entity_id,
            old_values,
            new_values,
            description,
        );
        self.store.append(&entry).await?;
        Ok(entry)
    }

    /// Record an entity deletion.
    #[instrument(skip_all, fields(entity_type = entity_type.as_str(), entity_id = %entity_id), err)]
    pub async fn record_delete(
        &self,
        ctx: &AccessContext,
        tenant_id: Option<TenantId>,
        entity_type: EntityKind,
        entity_id: &str,
        old_values: &Snapshot,
        description: Option<String>,
    ) -> Result<AuditLogEntry, AuditError> {
        let entry = prepare_delete(ctx, tenant_id, entity_type, entity_id, old_values, description);
        self.store.append(&entry).await?;
        Ok(entry)
    }

    /// History for one entity, newest first.
    ///
    /// Requires the view permission for the entity type, not the global
    /// audit permission: a user allowed to see a product may see who changed
    /// it. Scoped to the caller's tenant; a foreign entity's history is an
    /// empty list, not an error.
    #[instrument(skip_all, fields(entity_type = entity_type.as_str(), entity_id = %entity_id), err)]
    pub async fn get_history(
        &self,
        ctx: &AccessContext,
        entity_type: EntityKind,
        entity_id: &str,
    ) -> Result<Vec<AuditLogEntry>, AuditError> {
        ctx.require_permission(Permission::view_for(entity_type))?;
        let filter = TenantFilter::from(ctx);
        self.store.entity_history(&filter, entity_type, entity_id).await
    }

    /// Filtered page of the global log, newest first, with total count.
    ///
    /// Non-admin callers are silently constrained to their own tenant: their
    /// `company_id` filter value is discarded and the tenant scope comes
    /// from the context instead.
    #[instrument(skip_all, err)]
    pub async fn query_log(
        &self,
        ctx: &AccessContext,
        query: &AuditQuery,
    ) -> Result<(Vec<AuditLogEntry>, u64), AuditError> {
        ctx.require_permission(Permission::ViewAuditLogs)?;

        let filter = TenantFilter::from(ctx);
        let mut query = query.clone();
        if ctx.should_filter() {
            query.company_id = None;
        }
        self.store.query(&filter, &query).await
    }
}

/// Build a CREATE entry without persisting it.
///
/// `tenant_id` is the created entity's tenant, which for a system admin
/// differs from the (absent) context tenant.
pub fn prepare_create(
    ctx: &AccessContext,
    tenant_id: Option<TenantId>,
    entity_type: EntityKind,
    entity_id: &str,
    new_values: &Snapshot,
    description: Option<String>,
) -> AuditLogEntry {
    let mut entry = base_entry(ctx, tenant_id, entity_type, entity_id, description);
    entry.action = AuditAction::Create;
    entry.new_values = Some(redact_snapshot(new_values));
    entry
}

/// Build an UPDATE entry without persisting it.
///
/// The field delta is computed on the raw snapshots first, then sensitive
/// fields have both sides replaced with the marker. Redacting before the
/// diff would make a password change invisible (marker == marker), which
/// is exactly the kind of change the log must show.
pub fn prepare_update(
    ctx: &AccessContext,
    tenant_id: Option<TenantId>,
    entity_type: EntityKind,
    entity_id: &str,
    old_values: &Snapshot,
    new_values: &Snapshot,
    description: Option<String>,
) -> AuditLogEntry {
    let mut changes = compute_changes(old_values, new_values);
    for (field, change) in changes.iter_mut() {
        if is_sensitive_field(field) {
            change.old = Value::String(REDACTION_MARKER.to_string());
            change.new = Value::String(REDACTION_MARKER.to_string());
        }
    }

    let mut entry = base_entry(ctx, tenant_id, entity_type, entity_id, description);
    entry.action = AuditAction::Update;
    entry.old_values = Some(redact_snapshot(old_values));
    entry.new_values = Some(redact_snapshot(new_values));
    entry.changes = Some(changes);
    entry
}

/// Build a DELETE entry without persisting it.
pub fn prepare_delete(
    ctx: &AccessContext,
    tenant_id: Option<TenantId>,
    entity_type: EntityKind,
    entity_id: &str,
    old_values: &Snapshot,
    description: Option<String>,
) -> AuditLogEntry {
    let mut entry = base_entry(ctx, tenant_id, entity_type, entity_id, description);
    entry.action = AuditAction::Delete;
    entry.old_values = Some(redact_snapshot(old_values));
    entry
}

fn base_entry(
    ctx: &AccessContext,
    tenant_id: Option<TenantId>,
    entity_type: EntityKind,
    entity_id: &str,
    description: Option<String>,
) -> AuditLogEntry {
    AuditLogEntry {
        id: AuditLogId::new(),
        timestamp: Utc::now(),
        user_id: ctx.user_id(),
        username: ctx.display_name().to_string(),
        user_role: ctx.role(),
        company_id: tenant_id,
        company_name: ctx.tenant_name().map(str::to_string),
        action: AuditAction::Create,
        entity_type,
        entity_id: entity_id.to_string(),
        old_values: None,
        new_values: None,
        changes: None,
        description,
    }
}
