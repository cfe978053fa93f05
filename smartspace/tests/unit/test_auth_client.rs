//! Identity HTTP client tests

use std::time::Duration;

use serde_json::json;
use tokio_test::assert_ok;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use smartspace::errors::SmartSpaceError;
use smartspace::session::{AuthClient, IdentityProvider};

use crate::support::session;

fn client(server: &MockServer) -> AuthClient {
    AuthClient::with_timeout(&server.uri(), "anon-key", Duration::from_secs(5)).unwrap()
}

fn session_body() -> serde_json::Value {
    json!({
        "access_token": "access-ana",
        "refresh_token": "refresh-ana",
        "token_type": "bearer",
        "expires_in": 3600,
        "user": { "id": "ana", "email": "ana@example.com" }
    })
}

#[tokio::test]
async fn test_sign_in_with_password() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", "anon-key"))
        .and(body_json(json!({ "email": "ana@example.com", "password": "secreto" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body()))
        .expect(1)
        .mount(&server)
        .await;

    let session = client(&server)
        .sign_in_with_password("ana@example.com", "secreto")
        .await
        .unwrap();

    assert_eq!(session.user.id, "ana");
    assert!(session.expires_at.is_some());
    assert!(!session.is_expired());
}

#[tokio::test]
async fn test_bad_credentials_carry_service_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .sign_in_with_password("ana@example.com", "mal")
        .await
        .unwrap_err();

    match err {
        SmartSpaceError::AuthError(message) => {
            assert!(message.contains("Invalid login credentials"))
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_sign_up_without_tokens_awaits_confirmation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "ana",
            "email": "ana@example.com",
            "user_metadata": { "name": "Ana" }
        })))
        .mount(&server)
        .await;

    let session = client(&server)
        .sign_up("ana@example.com", "secreto", json!({ "name": "Ana" }))
        .await
        .unwrap();
    assert!(session.is_none());
}

#[tokio::test]
async fn test_rejected_token_means_no_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer access-ana"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let user = client(&server)
        .get_user(&session("ana", 3600))
        .await
        .unwrap();
    assert!(user.is_none());
}

#[tokio::test]
async fn test_get_user_returns_identity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "ana",
            "email": "ana@example.com",
            "user_metadata": { "name": "Ana" }
        })))
        .mount(&server)
        .await;

    let user = client(&server)
        .get_user(&session("ana", 3600))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.display_name(), Some("Ana"));
}

#[tokio::test]
async fn test_refresh_sends_refresh_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(body_json(json!({ "refresh_token": "refresh-ana" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body()))
        .expect(1)
        .mount(&server)
        .await;

    let refreshed = client(&server)
        .refresh_session(&session("ana", -10))
        .await
        .unwrap();
    assert!(!refreshed.is_expired());
}

#[tokio::test]
async fn test_sign_out_and_recover() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/recover"))
        .and(body_json(json!({ "email": "ana@example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    assert_ok!(client.sign_out(&session("ana", 3600)).await);
    assert_ok!(client.reset_password_for_email("ana@example.com").await);
}
