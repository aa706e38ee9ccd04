//! `bizgrid-audit` — tamper-evident history for every tracked mutation.
//!
//! On create/update/delete, business logic builds a log entry from the actor
//! context plus before/after field snapshots (sensitive fields redacted, the
//! field delta computed), then commits it together with the mutation through
//! a [`UnitOfWork`] — neither the change nor the entry becomes durable
//! without the other. History reads go through the [`AuditRecorder`] behind
//! the same tenant filter as all other scoped data access.

pub mod delta;
pub mod entry;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod recorder;
pub mod redact;
pub mod store;
pub mod unit;

pub use delta::compute_changes;
pub use entry::{AuditAction, AuditLogEntry, FieldChange, Snapshot};
pub use memory::InMemoryAuditStore;
pub use postgres::PgAuditStore;
pub use query::AuditQuery;
pub use recorder::{AuditRecorder, prepare_create, prepare_delete, prepare_update};
pub use redact::{REDACTION_MARKER, is_sensitive_field, redact_snapshot};
pub use store::{AuditError, AuditStore};
pub use unit::{CompensatingUnitOfWork, PgUnitOfWork, UnitOfWork};
