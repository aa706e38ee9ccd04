//! Role identifiers used for RBAC.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use bizgrid_core::DomainError;

/// A named role, mapped deterministically to one permission set by
/// [`RolePolicy`](crate::RolePolicy).
///
/// Roles are a closed enum: a role that is not in this list does not exist,
/// and string forms only appear at serialization boundaries. A role's
/// permission set is fixed at build time; there are no per-user overrides.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Cross-tenant administrator; the only role with a null tenant.
    SystemAdmin,
    CompanyAdmin,
    Accountant,
    SalesManager,
    WarehouseKeeper,
    Salesperson,
    Viewer,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::SystemAdmin,
        Role::CompanyAdmin,
        Role::Accountant,
        Role::SalesManager,
        Role::WarehouseKeeper,
        Role::Salesperson,
        Role::Viewer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SystemAdmin => "system_admin",
            Role::CompanyAdmin => "company_admin",
            Role::Accountant => "accountant",
            Role::SalesManager => "sales_manager",
            Role::WarehouseKeeper => "warehouse_keeper",
            Role::Salesperson => "salesperson",
            Role::Viewer => "viewer",
        }
    }

    pub fn is_system_admin(&self) -> bool {
        matches!(self, Role::SystemAdmin)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown role: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_round_trip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn only_system_admin_is_system_admin() {
        for role in Role::ALL {
            assert_eq!(role.is_system_admin(), role == Role::SystemAdmin);
        }
    }
}
