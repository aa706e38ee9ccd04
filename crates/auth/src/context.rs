//! Per-request authorization state derived from an [`Actor`].

use std::sync::Arc;

use tracing::warn;

use bizgrid_core::{TenantId, UserId};

use crate::actor::Actor;
use crate::error::AccessError;
use crate::permissions::Permission;
use crate::policy::RolePolicy;
use crate::roles::Role;

/// Ephemeral, per-request access context.
///
/// Constructed once per inbound operation from the authenticated actor and
/// discarded at request end. Never persisted. All decision logic is pure —
/// the context queries the injected [`RolePolicy`] and its own captured
/// actor snapshot, nothing else.
///
/// Invariant: `is_system_admin() == true` implies `tenant_id() == None`
/// implies `should_filter() == false`; a non-admin context always carries a
/// tenant id.
#[derive(Debug, Clone)]
pub struct AccessContext {
    user_id: UserId,
    display_name: String,
    role: Role,
    tenant_id: Option<TenantId>,
    tenant_name: Option<String>,
    policy: Arc<RolePolicy>,
}

impl AccessContext {
    /// Derive a context from an actor.
    ///
    /// Fails when the actor is deactivated, or when a non-admin actor has no
    /// tenant (an invalid state that must be rejected, not silently allowed
    /// through).
    pub fn for_actor(policy: Arc<RolePolicy>, actor: &Actor) -> Result<Self, AccessError> {
        if !actor.active {
            return Err(AccessError::ActorDeactivated);
        }

        let tenant_id = if actor.role.is_system_admin() {
            // System admins act across tenants; any residual tenant binding
            // on the account is not a scope.
            None
        } else {
            match actor.tenant_id {
                Some(id) => Some(id),
                None => {
                    warn!(user_id = %actor.id, role = %actor.role, "non-admin actor has no tenant");
                    return Err(AccessError::InvalidActorState);
                }
            }
        };

        Ok(Self {
            user_id: actor.id,
            display_name: actor.display_name.clone(),
            role: actor.role,
            tenant_id,
            tenant_name: actor.tenant_name.clone(),
            policy,
        })
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Display name captured at construction, for audit snapshots.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    /// Tenant display name captured at construction, for audit snapshots.
    pub fn tenant_name(&self) -> Option<&str> {
        self.tenant_name.as_deref()
    }

    pub fn is_system_admin(&self) -> bool {
        self.role.is_system_admin()
    }

    /// Whether queries must be restricted to the actor's own tenant.
    pub fn should_filter(&self) -> bool {
        !self.is_system_admin()
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.policy.has(self.role, permission)
    }

    pub fn has_any(&self, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.has_permission(*p))
    }

    pub fn has_all(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.has_permission(*p))
    }

    /// Require a single capability, failing closed.
    pub fn require_permission(&self, permission: Permission) -> Result<(), AccessError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(AccessError::Forbidden(permission))
        }
    }

    /// Require at least one of several capabilities (OR logic).
    pub fn require_any(&self, permissions: &[Permission]) -> Result<(), AccessError> {
        if self.has_any(permissions) {
            Ok(())
        } else {
            let names: Vec<&str> = permissions.iter().map(|p| p.as_str()).collect();
            Err(AccessError::ForbiddenAny(names.join(", ")))
        }
    }

    /// Require all of several capabilities (AND logic).
    pub fn require_all(&self, permissions: &[Permission]) -> Result<(), AccessError> {
        match permissions.iter().find(|p| !self.has_permission(**p)) {
            None => Ok(()),
            Some(missing) => Err(AccessError::Forbidden(*missing)),
        }
    }

    /// Whether the actor may touch data belonging to `target`.
    ///
    /// System admins may access any tenant, including none at all.
    pub fn can_access_tenant(&self, target: Option<TenantId>) -> bool {
        if self.is_system_admin() {
            return true;
        }
        target == self.tenant_id
    }

    /// Resolve the tenant a new record must belong to.
    ///
    /// System admins must name a tenant explicitly. Everyone else gets their
    /// own tenant; a caller-supplied value is ignored so a non-admin cannot
    /// plant records in another tenant.
    pub fn resolve_create_tenant_id(
        &self,
        explicit: Option<TenantId>,
    ) -> Result<TenantId, AccessError> {
        match self.tenant_id {
            Some(own) => Ok(own),
            None => explicit.ok_or(AccessError::MissingTenantId),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizgrid_core::{TenantId, UserId};

    fn policy() -> Arc<RolePolicy> {
        Arc::new(RolePolicy::builtin())
    }

    fn company_admin(tenant: TenantId) -> Actor {
        Actor::new(UserId::new(), Some(tenant), "+15550001", Role::CompanyAdmin)
    }

    fn system_admin() -> Actor {
        Actor::new(UserId::new(), None, "root", Role::SystemAdmin)
    }

    #[test]
    fn derives_scope_from_company_admin() {
        let tenant = TenantId::new();
        let ctx = AccessContext::for_actor(policy(), &company_admin(tenant)).unwrap();

        assert_eq!(ctx.tenant_id(), Some(tenant));
        assert!(!ctx.is_system_admin());
        assert!(ctx.should_filter());
    }

    #[test]
    fn derives_scope_from_system_admin() {
        let ctx = AccessContext::for_actor(policy(), &system_admin()).unwrap();

        assert_eq!(ctx.tenant_id(), None);
        assert!(ctx.is_system_admin());
        assert!(!ctx.should_filter());
    }

    #[test]
    fn system_admin_with_residual_tenant_is_unscoped() {
        let mut actor = system_admin();
        actor.tenant_id = Some(TenantId::new());
        let ctx = AccessContext::for_actor(policy(), &actor).unwrap();

        assert_eq!(ctx.tenant_id(), None);
        assert!(!ctx.should_filter());
    }

    #[test]
    fn rejects_non_admin_without_tenant() {
        let actor = Actor::new(UserId::new(), None, "+15550002", Role::Accountant);
        let err = AccessContext::for_actor(policy(), &actor).unwrap_err();
        assert_eq!(err, AccessError::InvalidActorState);
    }

    #[test]
    fn rejects_deactivated_actor() {
        let mut actor = company_admin(TenantId::new());
        actor.active = false;
        let err = AccessContext::for_actor(policy(), &actor).unwrap_err();
        assert_eq!(err, AccessError::ActorDeactivated);
    }

    #[test]
    fn re_derivation_is_idempotent() {
        let actor = company_admin(TenantId::new());
        let a = AccessContext::for_actor(policy(), &actor).unwrap();
        let b = AccessContext::for_actor(policy(), &actor).unwrap();

        assert_eq!(a.tenant_id(), b.tenant_id());
        assert_eq!(a.is_system_admin(), b.is_system_admin());
        assert_eq!(a.should_filter(), b.should_filter());
    }

    #[test]
    fn permission_checks_delegate_to_policy() {
        let ctx = AccessContext::for_actor(policy(), &company_admin(TenantId::new())).unwrap();

        assert!(ctx.has_permission(Permission::CreateProducts));
        assert!(!ctx.has_permission(Permission::CreateUsers));
        assert!(ctx.has_any(&[Permission::CreateUsers, Permission::ViewProducts]));
        assert!(!ctx.has_all(&[Permission::CreateUsers, Permission::ViewProducts]));
    }

    #[test]
    fn require_permission_names_the_missing_capability() {
        let ctx = AccessContext::for_actor(policy(), &company_admin(TenantId::new())).unwrap();

        assert!(ctx.require_permission(Permission::ViewProducts).is_ok());
        let err = ctx.require_permission(Permission::CreateCompanies).unwrap_err();
        assert_eq!(err, AccessError::Forbidden(Permission::CreateCompanies));
    }

    #[test]
    fn require_all_reports_first_missing() {
        let ctx = AccessContext::for_actor(policy(), &company_admin(TenantId::new())).unwrap();
        let err = ctx
            .require_all(&[Permission::ViewProducts, Permission::DeleteUsers])
            .unwrap_err();
        assert_eq!(err, AccessError::Forbidden(Permission::DeleteUsers));
    }

    #[test]
    fn tenant_access_is_exact_for_non_admin() {
        let tenant = TenantId::new();
        let ctx = AccessContext::for_actor(policy(), &company_admin(tenant)).unwrap();

        assert!(ctx.can_access_tenant(Some(tenant)));
        assert!(!ctx.can_access_tenant(Some(TenantId::new())));
        assert!(!ctx.can_access_tenant(None));
    }

    #[test]
    fn tenant_access_is_unrestricted_for_admin() {
        let ctx = AccessContext::for_actor(policy(), &system_admin()).unwrap();

        assert!(ctx.can_access_tenant(Some(TenantId::new())));
        assert!(ctx.can_access_tenant(None));
    }

    #[test]
    fn create_tenant_resolution_ignores_caller_supplied_tenant_for_non_admin() {
        let own = TenantId::new();
        let other = TenantId::new();
        let ctx = AccessContext::for_actor(policy(), &company_admin(own)).unwrap();

        assert_eq!(ctx.resolve_create_tenant_id(Some(other)).unwrap(), own);
        assert_eq!(ctx.resolve_create_tenant_id(None).unwrap(), own);
    }

    #[test]
    fn create_tenant_resolution_requires_explicit_tenant_for_admin() {
        let ctx = AccessContext::for_actor(policy(), &system_admin()).unwrap();
        let target = TenantId::new();

        assert_eq!(ctx.resolve_create_tenant_id(Some(target)).unwrap(), target);
        assert_eq!(
            ctx.resolve_create_tenant_id(None).unwrap_err(),
            AccessError::MissingTenantId
        );
    }
}
