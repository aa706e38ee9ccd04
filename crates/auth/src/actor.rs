//! The authenticated identity performing an operation.

use serde::{Deserialize, Serialize};

use bizgrid_core::{TenantId, UserId};

use crate::roles::Role;

/// A resolved, authenticated actor.
///
/// Supplied by the authentication layer; this crate trusts the identity
/// without re-verifying credentials. `tenant_id` is `None` only for the
/// system-admin role. Actors are soft-deactivated rather than deleted so
/// audit history can still resolve their display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub tenant_id: Option<TenantId>,
    /// Tenant display name, cached by value into audit entries.
    pub tenant_name: Option<String>,
    /// Actor display name cached into audit entries (the login phone number
    /// in the original deployment).
    pub display_name: String,
    pub role: Role,
    pub active: bool,
}

impl Actor {
    pub fn new(
        id: UserId,
        tenant_id: Option<TenantId>,
        display_name: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id,
            tenant_id,
            tenant_name: None,
            display_name: display_name.into(),
            role,
            active: true,
        }
    }

    pub fn with_tenant_name(mut self, name: impl Into<String>) -> Self {
        self.tenant_name = Some(name.into());
        self
    }
}
