//! Router + service wiring.

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use bizgrid_audit::{AuditRecorder, AuditStore};
use bizgrid_auth::RolePolicy;

use crate::middleware;
use crate::routes;

/// Shared per-process services. The policy is built once and read-only; the
/// recorder shares the audit store handle.
#[derive(Clone)]
pub struct AppState {
    pub policy: Arc<RolePolicy>,
    pub recorder: Arc<AuditRecorder<Arc<dyn AuditStore>>>,
}

impl AppState {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self {
            policy: Arc::new(RolePolicy::builtin()),
            recorder: Arc::new(AuditRecorder::new(store)),
        }
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(store: Arc<dyn AuditStore>) -> Router {
    let state = AppState::new(store);

    // Protected routes: require a resolved actor context.
    let protected = routes::router().layer(
        ServiceBuilder::new()
            .layer(Extension(state.clone()))
            .layer(axum::middleware::from_fn_with_state(
                state,
                middleware::actor_middleware,
            )),
    );

    Router::new()
        .route("/health", get(routes::health))
        .merge(protected)
}
