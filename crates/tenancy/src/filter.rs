//! The tenant filter predicate.

use bizgrid_auth::AccessContext;
use bizgrid_core::TenantId;

/// Query scope derived from an [`AccessContext`].
///
/// Fields are private and there is no public constructor besides
/// `From<&AccessContext>`: code cannot fabricate an unscoped filter, and a
/// custom repository method cannot forget to apply one because every store
/// operation demands it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantFilter {
    scope: Scope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// System administrator: no tenant restriction.
    All,
    /// Restricted to a single tenant.
    Tenant(TenantId),
}

impl TenantFilter {
    /// The tenant this filter restricts to, or `None` for an unrestricted
    /// (system-admin) scope.
    pub fn tenant(&self) -> Option<TenantId> {
        match self.scope {
            Scope::All => None,
            Scope::Tenant(id) => Some(id),
        }
    }

    /// Whether a row owned by `tenant_id` is visible under this filter.
    pub fn matches(&self, tenant_id: TenantId) -> bool {
        match self.scope {
            Scope::All => true,
            Scope::Tenant(own) => own == tenant_id,
        }
    }
}

impl From<&AccessContext> for TenantFilter {
    fn from(ctx: &AccessContext) -> Self {
        let scope = match ctx.tenant_id() {
            Some(id) => Scope::Tenant(id),
            // Only valid contexts exist, and only system admins lack a tenant.
            None => Scope::All,
        };
        Self { scope }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use bizgrid_auth::{Actor, Role, RolePolicy};
    use bizgrid_core::UserId;

    fn ctx_for(actor: &Actor) -> AccessContext {
        AccessContext::for_actor(Arc::new(RolePolicy::builtin()), actor).unwrap()
    }

    #[test]
    fn non_admin_filter_matches_only_its_tenant() {
        let tenant = TenantId::new();
        let actor = Actor::new(UserId::new(), Some(tenant), "+15550003", Role::Viewer);
        let filter = TenantFilter::from(&ctx_for(&actor));

        assert_eq!(filter.tenant(), Some(tenant));
        assert!(filter.matches(tenant));
        assert!(!filter.matches(TenantId::new()));
    }

    #[test]
    fn admin_filter_matches_every_tenant() {
        let actor = Actor::new(UserId::new(), None, "root", Role::SystemAdmin);
        let filter = TenantFilter::from(&ctx_for(&actor));

        assert_eq!(filter.tenant(), None);
        assert!(filter.matches(TenantId::new()));
    }
}
