//! Black-box tests for the audit endpoints, driven through the router.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use bizgrid_api::app::build_app;
use bizgrid_audit::{AuditRecorder, AuditStore, InMemoryAuditStore, Snapshot};
use bizgrid_auth::{AccessContext, Actor, Role, RolePolicy};
use bizgrid_core::{EntityKind, TenantId, UserId};

struct Fixture {
    app: Router,
    tenant_one: TenantId,
    tenant_two: TenantId,
    product_id: String,
}

fn ctx(actor: &Actor) -> AccessContext {
    AccessContext::for_actor(Arc::new(RolePolicy::builtin()), actor).unwrap()
}

fn snapshot(value: serde_json::Value) -> Snapshot {
    value.as_object().unwrap().clone()
}

/// Seed one product CREATE per tenant, then build the app on the same store.
async fn fixture() -> Fixture {
    let store: Arc<dyn AuditStore> = Arc::new(InMemoryAuditStore::new());
    let recorder = AuditRecorder::new(store.clone());

    let tenant_one = TenantId::new();
    let tenant_two = TenantId::new();
    let product_id = uuid::Uuid::now_v7().to_string();

    let ctx_one = ctx(&Actor::new(
        UserId::new(),
        Some(tenant_one),
        "+15550040",
        Role::CompanyAdmin,
    ));
    recorder
        .record_create(
            &ctx_one,
            Some(tenant_one),
            EntityKind::Product,
            &product_id,
            &snapshot(serde_json::json!({"name": "anvil"})),
            None,
        )
        .await
        .unwrap();

    let ctx_two = ctx(&Actor::new(
        UserId::new(),
        Some(tenant_two),
        "+15550041",
        Role::CompanyAdmin,
    ));
    recorder
        .record_create(
            &ctx_two,
            Some(tenant_two),
            EntityKind::Product,
            &uuid::Uuid::now_v7().to_string(),
            &snapshot(serde_json::json!({"name": "crowbar"})),
            None,
        )
        .await
        .unwrap();

    Fixture {
        app: build_app(store),
        tenant_one,
        tenant_two,
        product_id,
    }
}

fn request(uri: &str, role: Role, tenant: Option<TenantId>) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .header("x-user-id", UserId::new().to_string())
        .header("x-user-name", "+15550042")
        .header("x-user-role", role.as_str());
    if let Some(tenant) = tenant {
        builder = builder.header("x-company-id", tenant.to_string());
    }
    builder.body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_needs_no_identity() {
    let fixture = fixture().await;
    let response = fixture
        .app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_reject_missing_identity() {
    let fixture = fixture().await;
    let response = fixture
        .app
        .oneshot(
            Request::builder()
                .uri("/audit-logs")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn query_log_is_constrained_to_the_callers_tenant() {
    let fixture = fixture().await;

    // Asking for the other tenant's entries is silently overridden.
    let uri = format!("/audit-logs?company_id={}", fixture.tenant_two);
    let response = fixture
        .app
        .oneshot(request(&uri, Role::CompanyAdmin, Some(fixture.tenant_one)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(
        body["entries"][0]["company_id"],
        serde_json::json!(fixture.tenant_one)
    );
    assert_eq!(body["limit"], 100);
    assert_eq!(body["offset"], 0);
}

#[tokio::test]
async fn query_log_requires_the_audit_permission() {
    let fixture = fixture().await;
    let response = fixture
        .app
        .oneshot(request(
            "/audit-logs",
            Role::Salesperson,
            Some(fixture.tenant_one),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn system_admin_sees_every_tenant() {
    let fixture = fixture().await;
    let response = fixture
        .app
        .oneshot(request("/audit-logs", Role::SystemAdmin, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn entity_history_is_tenant_scoped() {
    let fixture = fixture().await;
    let uri = format!("/audit-logs/product/{}", fixture.product_id);

    // The owner tenant sees the entry; a viewer role is enough.
    let response = fixture
        .app
        .clone()
        .oneshot(request(&uri, Role::Viewer, Some(fixture.tenant_one)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["action"], "CREATE");

    // The other tenant gets an empty list, not an error.
    let response = fixture
        .app
        .oneshot(request(&uri, Role::Viewer, Some(fixture.tenant_two)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_entity_type_is_a_bad_request() {
    let fixture = fixture().await;
    let response = fixture
        .app
        .oneshot(request(
            "/audit-logs/widget/abc",
            Role::Viewer,
            Some(fixture.tenant_one),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_query_action_is_a_bad_request() {
    let fixture = fixture().await;
    let response = fixture
        .app
        .oneshot(request(
            "/audit-logs?action=TOUCH",
            Role::CompanyAdmin,
            Some(fixture.tenant_one),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deactivated_actors_are_rejected() {
    let fixture = fixture().await;
    let request = Request::builder()
        .uri("/audit-logs")
        .header("x-user-id", UserId::new().to_string())
        .header("x-user-role", Role::CompanyAdmin.as_str())
        .header("x-company-id", fixture.tenant_one.to_string())
        .header("x-user-active", "false")
        .body(Body::empty())
        .unwrap();

    let response = fixture.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
