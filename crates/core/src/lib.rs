//! `bizgrid-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity_kind;
pub mod error;
pub mod id;

pub use entity_kind::EntityKind;
pub use error::{DomainError, DomainResult};
pub use id::{AuditLogId, TenantId, UserId};
