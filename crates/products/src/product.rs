//! The product record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bizgrid_audit::Snapshot;
use bizgrid_core::{DomainError, EntityKind, TenantId};
use bizgrid_tenancy::TenantOwned;

/// A catalog product, owned by exactly one tenant. The SKU is unique per
/// tenant, not globally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub sku: String,
    pub name: String,
    /// Unit price in the tenant's minor currency unit.
    pub price_cents: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl ProductRecord {
    /// Field snapshot for audit entries.
    pub fn snapshot(&self) -> Snapshot {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => Snapshot::new(),
        }
    }
}

impl TenantOwned for ProductRecord {
    const KIND: EntityKind = EntityKind::Product;

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Input for adding a product to the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub price_cents: i64,
    /// Target tenant; required for system admins, ignored otherwise.
    pub tenant_id: Option<TenantId>,
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.sku.trim().is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if self.price_cents < 0 {
            return Err(DomainError::validation("price cannot be negative"));
        }
        Ok(())
    }
}

/// Partial update; `None` keeps the existing value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price_cents: Option<i64>,
    pub active: Option<bool>,
}

impl ProductUpdate {
    pub fn apply(&self, product: &ProductRecord) -> Result<ProductRecord, DomainError> {
        let mut updated = product.clone();
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("name cannot be empty"));
            }
            updated.name = name.clone();
        }
        if let Some(price) = self.price_cents {
            if price < 0 {
                return Err(DomainError::validation("price cannot be negative"));
            }
            updated.price_cents = price;
        }
        if let Some(active) = self.active {
            updated.active = active;
        }
        Ok(updated)
    }
}
