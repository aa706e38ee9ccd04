//! Marker trait for records owned by a tenant.

use uuid::Uuid;

use bizgrid_core::{EntityKind, TenantId};

/// A business record carrying a tenant foreign key.
///
/// Invariant: `tenant_id` must reference an existing tenant; rows are never
/// visible to a non-admin context whose tenant differs.
pub trait TenantOwned: Send + Sync {
    /// The entity type this record is audited and stored under.
    const KIND: EntityKind;

    fn id(&self) -> Uuid;

    fn tenant_id(&self) -> TenantId;
}
