//! `bizgrid-api` — HTTP surface for the audit trail.
//!
//! Authentication itself lives in front of this service; requests arrive
//! with trusted identity headers, resolved into an `AccessContext` per
//! request by the middleware. Layout:
//! - `app.rs`: router + service wiring
//! - `middleware.rs`: actor resolution from trusted headers
//! - `routes/`: HTTP handlers
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

pub mod app;
pub mod dto;
pub mod errors;
pub mod middleware;
pub mod routes;
