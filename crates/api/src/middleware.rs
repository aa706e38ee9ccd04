//! Actor resolution from trusted identity headers.
//!
//! Authentication happens upstream (gateway / auth service); it forwards the
//! resolved identity in headers this service trusts. Per request we rebuild
//! the ephemeral `AccessContext` and stash it in request extensions.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use bizgrid_auth::{AccessContext, AccessError, Actor, Role};
use bizgrid_core::{TenantId, UserId};

use crate::app::AppState;
use crate::errors::{access_error_to_response, json_error};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const USER_ACTIVE_HEADER: &str = "x-user-active";
pub const COMPANY_ID_HEADER: &str = "x-company-id";
pub const COMPANY_NAME_HEADER: &str = "x-company-name";

pub async fn actor_middleware(
    State(state): State<AppState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let actor = match resolve_actor(req.headers()) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    let ctx = match AccessContext::for_actor(state.policy.clone(), &actor) {
        Ok(ctx) => ctx,
        Err(err @ AccessError::InvalidActorState) => {
            tracing::error!(user_id = %actor.id, "rejecting actor with invalid tenant state");
            return access_error_to_response(err);
        }
        Err(err) => return access_error_to_response(err),
    };

    req.extensions_mut().insert(ctx);
    next.run(req).await
}

fn resolve_actor(headers: &HeaderMap) -> Result<Actor, Response> {
    let id: UserId = required(headers, USER_ID_HEADER)?
        .parse()
        .map_err(|_| unauthorized("invalid user id"))?;

    let role: Role = required(headers, USER_ROLE_HEADER)?
        .parse()
        .map_err(|_| unauthorized("unknown role"))?;

    let tenant_id = match optional(headers, COMPANY_ID_HEADER)? {
        Some(raw) => Some(
            raw.parse::<TenantId>()
                .map_err(|_| unauthorized("invalid company id"))?,
        ),
        None => None,
    };

    let display_name = optional(headers, USER_NAME_HEADER)?
        .map(str::to_string)
        .unwrap_or_else(|| id.to_string());

    let mut actor = Actor::new(id, tenant_id, display_name, role);
    if let Some(name) = optional(headers, COMPANY_NAME_HEADER)? {
        actor = actor.with_tenant_name(name);
    }
    if let Some(active) = optional(headers, USER_ACTIVE_HEADER)? {
        actor.active = active == "true";
    }
    Ok(actor)
}

fn required<'h>(headers: &'h HeaderMap, name: &'static str) -> Result<&'h str, Response> {
    optional(headers, name)?.ok_or_else(|| unauthorized(format!("missing {name} header")))
}

fn optional<'h>(headers: &'h HeaderMap, name: &'static str) -> Result<Option<&'h str>, Response> {
    match headers.get(name) {
        Some(value) => value
            .to_str()
            .map(Some)
            .map_err(|_| unauthorized(format!("malformed {name} header"))),
        None => Ok(None),
    }
}

fn unauthorized(message: impl Into<String>) -> Response {
    json_error(StatusCode::UNAUTHORIZED, "unauthorized", message)
}
