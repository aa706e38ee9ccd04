//! In-memory scoped store for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use bizgrid_core::TenantId;

use crate::entity::TenantOwned;
use crate::filter::TenantFilter;
use crate::store::{ScopedStore, StoreError};

/// In-memory tenant-isolated record store.
///
/// Keys records by `(tenant_id, id)` so tenant filtering is structural, not
/// an afterthought. Listing is ordered by record id (UUIDv7, so effectively
/// insertion-time ordered) for stable pagination.
#[derive(Debug)]
pub struct InMemoryScopedStore<E> {
    inner: RwLock<HashMap<(TenantId, Uuid), E>>,
}

impl<E> InMemoryScopedStore<E> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<E> Default for InMemoryScopedStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E> ScopedStore<E> for InMemoryScopedStore<E>
where
    E: TenantOwned + Clone + 'static,
{
    async fn list(
        &self,
        filter: &TenantFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<E>, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;

        let mut visible: Vec<E> = map
            .iter()
            .filter(|((tenant, _), _)| filter.matches(*tenant))
            .map(|(_, record)| record.clone())
            .collect();
        visible.sort_by_key(|r| r.id());

        Ok(visible
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn get(&self, filter: &TenantFilter, id: Uuid) -> Result<Option<E>, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;

        Ok(map
            .iter()
            .find(|((tenant, record_id), _)| *record_id == id && filter.matches(*tenant))
            .map(|(_, record)| record.clone()))
    }

    async fn count(&self, filter: &TenantFilter) -> Result<u64, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;

        Ok(map
            .keys()
            .filter(|(tenant, _)| filter.matches(*tenant))
            .count() as u64)
    }

    async fn upsert(&self, record: &E) -> Result<(), StoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;

        map.insert((record.tenant_id(), record.id()), record.clone());
        Ok(())
    }

    async fn remove(&self, filter: &TenantFilter, id: Uuid) -> Result<bool, StoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;

        let key = map
            .keys()
            .find(|(tenant, record_id)| *record_id == id && filter.matches(*tenant))
            .copied();

        Ok(match key {
            Some(key) => map.remove(&key).is_some(),
            None => false,
        })
    }
}
