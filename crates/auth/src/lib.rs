//! `bizgrid-auth` — pure authorization boundary (zero-trust).
//!
//! This crate is intentionally decoupled from HTTP and storage. It holds the
//! permission catalog, the role-permission policy and the per-request
//! [`AccessContext`] that every data-access and audit operation consumes.

pub mod actor;
pub mod context;
pub mod error;
pub mod permissions;
pub mod policy;
pub mod roles;

pub use actor::Actor;
pub use context::AccessContext;
pub use error::AccessError;
pub use permissions::{Permission, groups};
pub use policy::RolePolicy;
pub use roles::Role;
