//! HTTP API tests

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use smartspace::app::options::AppOptions;
use smartspace::app::state::AppState;
use smartspace::server::serve::router;
use smartspace::storage::settings::StorageBackend;

use crate::support::FakeProvider;

fn app() -> (Router, AppState) {
    let mut options = AppOptions::default();
    options.storage.backend = StorageBackend::Memory;
    let state = AppState::with_provider(&options, FakeProvider::accepting()).unwrap();
    (router(Arc::new(state.server_state())), state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(body) => {
            request = request.header("content-type", "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn signed_in_app() -> (Router, AppState) {
    let (app, state) = app();
    let (status, _) = send(
        &app,
        "POST",
        "/session/sign-in",
        Some(json!({ "email": "ana@example.com", "password": "secreto" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    (app, state)
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _) = app();

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_protected_routes_need_a_session() {
    let (app, _) = app();

    let (status, body) = send(&app, "GET", "/devices", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], 401);

    let (status, _) = send(&app, "GET", "/session", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sign_in_validation_errors_list_fields() {
    let (app, _) = app();

    let (status, body) = send(
        &app,
        "POST",
        "/session/sign-in",
        Some(json!({ "email": "ana", "password": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"]["fields"].to_string().contains("email"));
}

#[tokio::test]
async fn test_device_lifecycle() {
    let (app, _) = signed_in_app().await;

    let (status, devices) = send(&app, "GET", "/devices", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(devices.as_array().unwrap().len(), 3);

    let (status, device) = send(
        &app,
        "POST",
        "/devices",
        Some(json!({
            "name": "Lámpara",
            "type": "light",
            "brand": "IKEA",
            "location": "Dormitorio"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(device["status"], "online");

    let uri = format!("/devices/{}/toggle", device["id"]);
    let (status, toggled) = send(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["status"], "offline");

    let uri = format!("/devices/{}", device["id"]);
    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_device_is_not_found() {
    let (app, _) = signed_in_app().await;

    let (status, body) = send(&app, "POST", "/devices/999/toggle", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Device 999 not found");
}

#[tokio::test]
async fn test_invalid_routine_is_rejected() {
    let (app, _) = signed_in_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/routines",
        Some(json!({ "name": "T", "schedule": "25:99" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields = body["error"]["fields"].to_string();
    assert!(fields.contains("name"));
    assert!(fields.contains("schedule"));

    let (_, routines) = send(&app, "GET", "/routines", None).await;
    assert_eq!(routines.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_profile_switch_changes_collections() {
    let (app, state) = signed_in_app().await;

    let (status, profile) = send(
        &app,
        "PUT",
        "/profile",
        Some(json!({ "profile": "oficina" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["profile"], "oficina");

    let (_, devices) = send(&app, "GET", "/devices", None).await;
    assert_eq!(devices[0]["name"], "Control de Acceso");
    assert_eq!(state.store.active_profile().as_str(), "oficina");
}

#[tokio::test]
async fn test_sign_out_locks_the_api() {
    let (app, _) = signed_in_app().await;

    let (status, _) = send(&app, "POST", "/session/sign-out", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", "/routines", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_notices_are_drained() {
    let (app, _) = signed_in_app().await;
    send(&app, "POST", "/routines/reset", None).await;

    let (_, notices) = send(&app, "GET", "/notices", None).await;
    assert!(!notices.as_array().unwrap().is_empty());

    let (_, notices) = send(&app, "GET", "/notices", None).await;
    assert!(notices.as_array().unwrap().is_empty());
}
