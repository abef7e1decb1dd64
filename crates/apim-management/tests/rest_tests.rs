//! Management REST API Tests
//!
//! Requests go through the nested router with the caller layer, as served.

use apim_config::ManagementConfig;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use utoipa_axum::router::OpenApiRouter;

use apim_management::shared::middleware::{CallerDefaults, CallerLayer};
use apim_management::{apis_router, ApisState, DomainServices, InMemoryRepositories};

fn app() -> Router {
    let repos = InMemoryRepositories::new();
    let services = DomainServices::new(&repos.as_repositories(), ManagementConfig::default());
    let (router, _) = OpenApiRouter::new()
        .nest(
            "/management/environments/{envId}/apis",
            apis_router(ApisState::new(&services)),
        )
        .split_for_parts();
    router.layer(CallerLayer::new(CallerDefaults {
        organization_id: "org-1".to_string(),
    }))
}

fn crd() -> Value {
    json!({
        "crossId": "orders",
        "name": "Orders",
        "version": "1.0",
        "definition": {
            "definitionVersion": "V4",
            "listeners": [{ "type": "http", "paths": [{ "path": "/orders" }] }]
        },
        "plans": {
            "gold": { "name": "Gold", "status": "PUBLISHED", "security": { "type": "KEY_LESS" } }
        }
    })
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-principal-id", "admin");
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_import_crd_then_get() {
    let app = app();
    let (status, body) = send(&app, "PUT", "/management/environments/env-1/apis/_import/crd", Some(crd())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "STARTED");
    assert_eq!(body["organizationId"], "org-1");

    let api_id = body["id"].as_str().unwrap().to_string();
    let (status, body) = send(&app, "GET", &format!("/management/environments/env-1/apis/{api_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["crossId"], "orders");
    assert_eq!(body["definitionVersion"], "V4");
}

#[tokio::test]
async fn test_api_of_other_environment_is_not_found() {
    let app = app();
    let (_, body) = send(&app, "PUT", "/management/environments/env-1/apis/_import/crd", Some(crd())).await;
    let api_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "GET", &format!("/management/environments/env-2/apis/{api_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "API_NOT_FOUND");
}

#[tokio::test]
async fn test_missing_principal_is_unauthorized() {
    let app = app();
    let request = Request::builder()
        .method("GET")
        .uri("/management/environments/env-1/apis/any")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_crd_is_bad_request() {
    let app = app();
    let mut invalid = crd();
    invalid["definition"]["listeners"][0]["paths"][0]["path"] = json!("no-slash");

    let (status, body) = send(&app, "PUT", "/management/environments/env-1/apis/_import/crd", Some(invalid)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_API");
    assert!(body["details"]["errors"].is_array());
}

#[tokio::test]
async fn test_export_then_import_in_other_environment() {
    let app = app();
    let (_, body) = send(&app, "PUT", "/management/environments/env-1/apis/_import/crd", Some(crd())).await;
    let api_id = body["id"].as_str().unwrap().to_string();

    let (status, exported) = send(
        &app,
        "GET",
        &format!("/management/environments/env-1/apis/{api_id}/_export/definition"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(exported["plans"].as_array().unwrap().len(), 1);

    let (status, imported) = send(
        &app,
        "POST",
        "/management/environments/env-2/apis/_import/definition",
        Some(exported),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(imported["apiId"], json!(api_id));
    assert_eq!(imported["crossId"], "orders");
}

#[tokio::test]
async fn test_migrate_dry_run_reports_state() {
    let app = app();
    let (_, body) = send(&app, "PUT", "/management/environments/env-1/apis/_import/crd", Some(crd())).await;
    let api_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/management/environments/env-1/apis/{api_id}/_migrate?mode=DRY_RUN"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "IMPOSSIBLE");
}
