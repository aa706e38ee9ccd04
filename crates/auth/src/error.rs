//! Typed authorization errors.
//!
//! Raised at the point of detection and translated to transport responses
//! only at the outermost boundary. Internal logic never swallows these.

use thiserror::Error;

use crate::permissions::Permission;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The actor lacks a required capability.
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(Permission),

    /// The actor lacks all of several acceptable capabilities.
    #[error("forbidden: requires one of {0}")]
    ForbiddenAny(String),

    /// A system administrator must name a tenant explicitly when creating
    /// tenant-scoped data.
    #[error("a tenant id must be specified for this operation")]
    MissingTenantId,

    /// A non-admin actor with no tenant is a data-integrity violation; the
    /// operation must abort rather than guess a tenant.
    #[error("actor has no tenant and is not a system administrator")]
    InvalidActorState,

    /// The actor has been soft-deactivated.
    #[error("actor is deactivated")]
    ActorDeactivated,
}
