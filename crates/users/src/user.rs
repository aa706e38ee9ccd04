//! The user account record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bizgrid_audit::Snapshot;
use bizgrid_auth::Role;
use bizgrid_core::{DomainError, EntityKind, TenantId, UserId};
use bizgrid_tenancy::TenantOwned;

/// A user account, owned by exactly one tenant.
///
/// The phone number is the login identity. Accounts are soft-deactivated
/// (`active = false`) rather than deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub tenant_id: TenantId,
    pub phone: String,
    pub display_name: String,
    pub role: Role,
    pub password_hash: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Field snapshot for audit entries. Sensitive fields stay raw here;
    /// the recorder redacts before anything is persisted.
    pub fn snapshot(&self) -> Snapshot {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            // A struct with named fields always serializes to an object.
            _ => Snapshot::new(),
        }
    }
}

impl TenantOwned for UserRecord {
    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> Uuid {
        *self.id.as_uuid()
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Input for provisioning an account.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub phone: String,
    pub display_name: String,
    pub role: Role,
    pub password_hash: String,
    /// Target tenant; required for system admins, ignored for everyone else
    /// (a non-admin always provisions into their own tenant).
    pub tenant_id: Option<TenantId>,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.phone.trim().is_empty() {
            return Err(DomainError::validation("phone cannot be empty"));
        }
        if self.display_name.trim().is_empty() {
            return Err(DomainError::validation("display name cannot be empty"));
        }
        if self.role.is_system_admin() {
            // System admins are not tenant accounts.
            return Err(DomainError::validation(
                "cannot provision a system administrator as a tenant user",
            ));
        }
        Ok(())
    }
}

/// Partial update; `None` keeps the existing value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub display_name: Option<String>,
    pub role: Option<Role>,
    pub password_hash: Option<String>,
    pub active: Option<bool>,
}

impl UserUpdate {
    /// Apply onto an existing record, returning the updated copy.
    pub fn apply(&self, user: &UserRecord) -> Result<UserRecord, DomainError> {
        let mut updated = user.clone();
        if let Some(name) = &self.display_name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("display name cannot be empty"));
            }
            updated.display_name = name.clone();
        }
        if let Some(role) = self.role {
            if role.is_system_admin() {
                return Err(DomainError::validation(
                    "cannot promote a tenant user to system administrator",
                ));
            }
            updated.role = role;
        }
        if let Some(hash) = &self.password_hash {
            updated.password_hash = hash.clone();
        }
        if let Some(active) = self.active {
            updated.active = active;
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(tenant: TenantId) -> UserRecord {
        UserRecord {
            id: UserId::new(),
            tenant_id: tenant,
            phone: "+15550001".to_string(),
            display_name: "Ada".to_string(),
            role: Role::Accountant,
            password_hash: "digest".to_string(),
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn snapshot_is_a_json_object_of_fields() {
        let user = user(TenantId::new());
        let snap = user.snapshot();
        assert_eq!(snap["phone"], json!("+15550001"));
        assert_eq!(snap["role"], json!("accountant"));
        assert_eq!(snap["password_hash"], json!("digest"));
    }

    #[test]
    fn new_user_rejects_system_admin_role() {
        let input = NewUser {
            phone: "+15550002".to_string(),
            display_name: "Eve".to_string(),
            role: Role::SystemAdmin,
            password_hash: "digest".to_string(),
            tenant_id: None,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn update_keeps_unset_fields() {
        let user = user(TenantId::new());
        let update = UserUpdate {
            display_name: Some("Ada L".to_string()),
            ..UserUpdate::default()
        };

        let updated = update.apply(&user).unwrap();
        assert_eq!(updated.display_name, "Ada L");
        assert_eq!(updated.role, user.role);
        assert_eq!(updated.password_hash, user.password_hash);
        assert!(updated.active);
    }

    #[test]
    fn update_rejects_promotion_to_system_admin() {
        let user = user(TenantId::new());
        let update = UserUpdate {
            role: Some(Role::SystemAdmin),
            ..UserUpdate::default()
        };
        assert!(update.apply(&user).is_err());
    }
}
