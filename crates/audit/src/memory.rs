//! In-memory audit store for tests/dev.

use std::sync::RwLock;

use async_trait::async_trait;

use bizgrid_core::EntityKind;
use bizgrid_tenancy::TenantFilter;

use crate::entry::AuditLogEntry;
use crate::query::AuditQuery;
use crate::store::{AuditError, AuditStore};

/// Append-only in-memory log.
///
/// Entries are kept in insertion order and reversed on read, so results come
/// back newest first like the Postgres store.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// An entry for a tenant-less action (a system admin touching global data)
/// is visible only under the unrestricted scope.
fn visible(filter: &TenantFilter, entry: &AuditLogEntry) -> bool {
    match filter.tenant() {
        None => true,
        Some(tenant) => entry.company_id == Some(tenant),
    }
}

fn matches_query(query: &AuditQuery, entry: &AuditLogEntry) -> bool {
    if let Some(company_id) = query.company_id {
        if entry.company_id != Some(company_id) {
            return false;
        }
    }
    if let Some(entity_type) = query.entity_type {
        if entry.entity_type != entity_type {
            return false;
        }
    }
    if let Some(entity_id) = &query.entity_id {
        if &entry.entity_id != entity_id {
            return false;
        }
    }
    if let Some(user_id) = query.user_id {
        if entry.user_id != user_id {
            return false;
        }
    }
    if let Some(action) = query.action {
        if entry.action != action {
            return false;
        }
    }
    if let Some(start) = query.start_date {
        if entry.timestamp < start {
            return false;
        }
    }
    if let Some(end) = query.end_date {
        if entry.timestamp > end {
            return false;
        }
    }
    true
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn append(&self, entry: &AuditLogEntry) -> Result<(), AuditError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AuditError::Backend("audit lock poisoned".to_string()))?;
        entries.push(entry.clone());
        Ok(())
    }

    async fn entity_history(
        &self,
        filter: &TenantFilter,
        entity_type: EntityKind,
        entity_id: &str,
    ) -> Result<Vec<AuditLogEntry>, AuditError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AuditError::Backend("audit lock poisoned".to_string()))?;

        Ok(entries
            .iter()
            .rev()
            .filter(|e| {
                e.entity_type == entity_type && e.entity_id == entity_id && visible(filter, e)
            })
            .cloned()
            .collect())
    }

    async fn query(
        &self,
        filter: &TenantFilter,
        query: &AuditQuery,
    ) -> Result<(Vec<AuditLogEntry>, u64), AuditError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AuditError::Backend("audit lock poisoned".to_string()))?;

        let matching: Vec<&AuditLogEntry> = entries
            .iter()
            .rev()
            .filter(|e| visible(filter, e) && matches_query(query, e))
            .collect();
        let total = matching.len() as u64;

        let page = matching
            .into_iter()
            .skip(query.effective_offset() as usize)
            .take(query.effective_limit() as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }
}
