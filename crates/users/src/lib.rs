//! `bizgrid-users` — user accounts as tenant-scoped records.
//!
//! Accounts are provisioned per tenant and soft-deactivated rather than
//! deleted, so audit history keeps resolving their display name. All access
//! goes through the scoped repository base; the phone lookup shows the
//! pattern for entity-specific queries (thread the caller's filter, always).

pub mod service;
pub mod store;
pub mod user;

pub use service::{UserError, UserService};
pub use store::{PgUserStore, UserStore};
pub use user::{NewUser, UserRecord, UserUpdate};
