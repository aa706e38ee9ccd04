//! Role-to-permission mappings (single source of truth).
//!
//! No other component may hard-code role-to-permission logic. The table is
//! built once at startup, immutable afterwards, and injected (`Arc`) into
//! every consumer — safe for unsynchronized concurrent reads.

use std::collections::{HashMap, HashSet};

use crate::permissions::{Permission, groups};
use crate::roles::Role;

/// Immutable role → permission-set table.
#[derive(Debug)]
pub struct RolePolicy {
    grants: HashMap<Role, HashSet<Permission>>,
    empty: HashSet<Permission>,
}

impl RolePolicy {
    /// Build the built-in policy.
    ///
    /// - `system_admin` maps to the full permission universe.
    /// - Every other role composes the named groups in
    ///   [`groups`](crate::permissions::groups) plus role-specific extras.
    pub fn builtin() -> Self {
        let mut grants: HashMap<Role, HashSet<Permission>> = HashMap::new();

        grants.insert(Role::SystemAdmin, Permission::ALL.into_iter().collect());

        // Company admin: full in-company management, but user accounts are
        // provisioned by the system administrator (view/edit only).
        grants.insert(
            Role::CompanyAdmin,
            compose(&[
                &[Permission::ViewUsers, Permission::EditUsers],
                groups::FULL_PRODUCT_MANAGEMENT,
                groups::FULL_INVOICE_MANAGEMENT,
                groups::FULL_PURCHASE_MANAGEMENT,
                groups::FULL_WAREHOUSE,
                groups::ACCOUNTING,
                &[Permission::ViewAuditLogs],
            ]),
        );

        grants.insert(
            Role::Accountant,
            compose(&[
                groups::USER_READ,
                &[Permission::ViewProducts],
                groups::INVOICE_ENTRY,
                groups::PURCHASE_ENTRY,
                groups::WAREHOUSE_READ,
                groups::ACCOUNTING,
            ]),
        );

        grants.insert(
            Role::SalesManager,
            compose(&[
                groups::USER_READ,
                groups::PRODUCT_ENTRY,
                groups::FULL_INVOICE_MANAGEMENT,
                groups::WAREHOUSE_READ,
                &[Permission::ViewReports],
            ]),
        );

        grants.insert(
            Role::WarehouseKeeper,
            compose(&[
                groups::PRODUCT_ENTRY,
                &[Permission::ViewPurchases],
                groups::FULL_WAREHOUSE,
                &[Permission::ViewReports],
            ]),
        );

        grants.insert(
            Role::Salesperson,
            compose(&[
                &[Permission::ViewProducts],
                &[Permission::ViewInvoices, Permission::CreateInvoices],
                groups::WAREHOUSE_READ,
            ]),
        );

        grants.insert(
            Role::Viewer,
            compose(&[&[
                Permission::ViewUsers,
                Permission::ViewProducts,
                Permission::ViewInvoices,
                Permission::ViewPurchases,
                Permission::ViewWarehouse,
                Permission::ViewReports,
            ]]),
        );

        Self {
            grants,
            empty: HashSet::new(),
        }
    }

    /// Permissions granted to a role. Pure and total.
    pub fn permissions_for(&self, role: Role) -> &HashSet<Permission> {
        self.grants.get(&role).unwrap_or(&self.empty)
    }

    /// Permissions granted to a role named by string.
    ///
    /// Unknown role names yield the empty set rather than an error (fail
    /// closed).
    pub fn permissions_for_name(&self, role: &str) -> &HashSet<Permission> {
        match role.parse::<Role>() {
            Ok(role) => self.permissions_for(role),
            Err(_) => &self.empty,
        }
    }

    pub fn has(&self, role: Role, permission: Permission) -> bool {
        self.permissions_for(role).contains(&permission)
    }
}

fn compose(parts: &[&[Permission]]) -> HashSet<Permission> {
    parts.iter().flat_map(|g| g.iter().copied()).collect()
}
