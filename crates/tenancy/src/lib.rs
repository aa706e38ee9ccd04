//! `bizgrid-tenancy` — tenant-scoped data access.
//!
//! Every read of a tenant-owned record goes through this crate. The filter
//! predicate is structurally required: the store API takes a
//! [`TenantFilter`], and a `TenantFilter` can only be obtained from an
//! [`AccessContext`](bizgrid_auth::AccessContext) — a query that forgets
//! tenant scoping does not compile.

pub mod entity;
pub mod filter;
pub mod memory;
pub mod postgres;
pub mod repository;
pub mod store;

pub use entity::TenantOwned;
pub use filter::TenantFilter;
pub use memory::InMemoryScopedStore;
pub use postgres::PgScopedStore;
pub use repository::{MAX_PAGE_SIZE, ScopedRepository};
pub use store::{ScopedStore, StoreError};
