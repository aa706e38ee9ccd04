//! Closed enumeration of auditable entity types.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The kind of business record an operation touches.
///
/// A closed enum so that audit entries, route parameters and permission
/// mappings all agree on the same set of entity types. New kinds are a
/// compile-time change, not a data migration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Company,
    Product,
    Invoice,
    Purchase,
}

impl EntityKind {
    /// Stable wire/storage name (matches the serde representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Company => "company",
            EntityKind::Product => "product",
            EntityKind::Invoice => "invoice",
            EntityKind::Purchase => "purchase",
        }
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(EntityKind::User),
            "company" => Ok(EntityKind::Company),
            "product" => Ok(EntityKind::Product),
            "invoice" => Ok(EntityKind::Invoice),
            "purchase" => Ok(EntityKind::Purchase),
            other => Err(DomainError::validation(format!(
                "unknown entity type: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for kind in [
            EntityKind::User,
            EntityKind::Company,
            EntityKind::Product,
            EntityKind::Invoice,
            EntityKind::Purchase,
        ] {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
    }

    #[test]
    fn rejects_unknown_entity_type() {
        let err = "warehouse_rack".parse::<EntityKind>().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
