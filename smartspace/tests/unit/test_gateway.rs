//! Session gateway tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use smartspace::errors::SmartSpaceError;
use smartspace::models::{SessionEvent, SessionEventKind};
use smartspace::notify::{NoticeBuffer, NoticeLevel};
use smartspace::session::{SessionGateway, SignInForm, SignUpForm};
use smartspace::storage::ProfileStore;

use crate::support::{gateway_fixture, session, FakeProvider, RecordingNavigator};

fn sign_in_form() -> SignInForm {
    SignInForm {
        email: "ana@example.com".to_string(),
        password: "secreto".to_string(),
    }
}

fn signed_in(gateway: &SessionGateway, expires_in: i64) {
    gateway.handle_provider_event(SessionEvent::new(
        SessionEventKind::SignedIn,
        Some(session("ana", expires_in)),
    ));
}

#[tokio::test]
async fn test_check_without_session_redirects() {
    let fx = gateway_fixture();

    assert!(!fx.gateway.check_auth().await);
    assert_eq!(fx.navigator.redirects(), 1);
}

#[tokio::test]
async fn test_sign_in_then_check_passes() {
    let fx = gateway_fixture();

    let session = fx.gateway.sign_in(sign_in_form()).await.unwrap();
    assert_eq!(session.user.id, "ana");
    assert!(fx.gateway.check_auth().await);
    assert_eq!(fx.navigator.redirects(), 0);
}

#[tokio::test]
async fn test_invalid_form_never_reaches_provider() {
    let fx = gateway_fixture();
    fx.provider.set_unavailable(true);

    let form = SignInForm {
        email: "not-an-email".to_string(),
        password: String::new(),
    };
    let err = fx.gateway.sign_in(form).await.unwrap_err();
    assert!(matches!(err, SmartSpaceError::Validation(_)));
    assert!(fx.notices.notices().is_empty());
}

#[tokio::test]
async fn test_wrong_password_notifies() {
    let fx = gateway_fixture();
    let form = SignInForm {
        password: "otra".to_string(),
        ..sign_in_form()
    };

    assert!(fx.gateway.sign_in(form).await.is_err());
    assert!(fx.gateway.current_session().is_none());
    assert_eq!(fx.notices.notices()[0].level, NoticeLevel::Error);
}

#[tokio::test]
async fn test_sign_up_awaiting_confirmation_has_no_session() {
    let fx = gateway_fixture();
    let form = SignUpForm {
        name: "Ana".to_string(),
        email: "confirm@example.com".to_string(),
        password: "secreto".to_string(),
        confirm_password: "secreto".to_string(),
    };

    assert!(fx.gateway.sign_up(form).await.unwrap().is_none());
    assert!(fx.gateway.current_session().is_none());
    assert_eq!(fx.notices.notices()[0].level, NoticeLevel::Success);
}

#[tokio::test]
async fn test_signed_out_event_redirects_and_notifies_subscribers() {
    let fx = gateway_fixture();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let _subscription = fx
        .gateway
        .on_session_changed(move |event| sink.lock().unwrap().push(event.kind));

    signed_in(&fx.gateway, 3600);
    fx.gateway.handle_provider_event(SessionEvent::signed_out());

    assert_eq!(
        *seen.lock().unwrap(),
        vec![SessionEventKind::SignedIn, SessionEventKind::SignedOut]
    );
    assert!(fx.gateway.current_session().is_none());
    assert_eq!(fx.navigator.redirects(), 1);
}

#[tokio::test]
async fn test_dropped_subscription_is_not_called() {
    let fx = gateway_fixture();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let subscription = fx.gateway.on_session_changed(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(fx.gateway.subscriber_count(), 1);

    drop(subscription);
    signed_in(&fx.gateway, 3600);

    assert_eq!(fx.gateway.subscriber_count(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_rejected_token_signs_out_once() {
    let fx = gateway_fixture();
    signed_in(&fx.gateway, 3600);
    *fx.provider.accept_token.lock().unwrap() = false;

    assert!(!fx.gateway.check_auth().await);
    assert!(fx.gateway.current_session().is_none());
    assert_eq!(fx.navigator.redirects(), 1);
}

#[tokio::test]
async fn test_expired_session_is_refreshed_on_check() {
    let fx = gateway_fixture();
    signed_in(&fx.gateway, -10);

    assert!(fx.gateway.check_auth().await);
    assert_eq!(fx.provider.refresh_calls.load(Ordering::SeqCst), 1);
    assert!(!fx.gateway.current_session().unwrap().is_expired());
}

#[tokio::test]
async fn test_cancelled_check_leaves_state_alone() {
    let fx = gateway_fixture();
    signed_in(&fx.gateway, 3600);
    *fx.provider.accept_token.lock().unwrap() = false;
    fx.provider.set_latency(Duration::from_millis(100));

    let gateway = fx.gateway.clone();
    let check = tokio::spawn(async move { gateway.check_auth().await });
    tokio::time::sleep(Duration::from_millis(20)).await;
    fx.gateway.cancel_pending_checks();

    assert!(!check.await.unwrap());
    assert!(fx.gateway.current_session().is_some());
    assert_eq!(fx.navigator.redirects(), 0);
}

#[tokio::test]
async fn test_overlapping_checks_both_see_rejection() {
    let fx = gateway_fixture();
    signed_in(&fx.gateway, 3600);
    *fx.provider.accept_token.lock().unwrap() = false;
    fx.provider.set_latency(Duration::from_millis(100));

    let gateway = fx.gateway.clone();
    let first = tokio::spawn(async move { gateway.check_auth().await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    let gateway = fx.gateway.clone();
    let second = tokio::spawn(async move { gateway.check_auth().await });

    assert!(!first.await.unwrap());
    assert!(!second.await.unwrap());
    assert!(fx.gateway.current_session().is_none());
    assert_eq!(fx.navigator.redirects(), 1);
}

#[tokio::test]
async fn test_overlapping_checks_both_pass() {
    let fx = gateway_fixture();
    signed_in(&fx.gateway, 3600);
    fx.provider.set_latency(Duration::from_millis(50));

    let gateway = fx.gateway.clone();
    let first = tokio::spawn(async move { gateway.check_auth().await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    let gateway = fx.gateway.clone();
    let second = tokio::spawn(async move { gateway.check_auth().await });

    assert!(first.await.unwrap());
    assert!(second.await.unwrap());
    assert_eq!(fx.navigator.redirects(), 0);
}

#[tokio::test]
async fn test_late_lookup_does_not_restore_signed_out_session() {
    let fx = gateway_fixture();
    signed_in(&fx.gateway, 3600);
    fx.provider.set_latency(Duration::from_millis(100));

    let gateway = fx.gateway.clone();
    let lookup = tokio::spawn(async move { gateway.get_session().await });
    tokio::time::sleep(Duration::from_millis(20)).await;
    fx.gateway.handle_provider_event(SessionEvent::signed_out());

    assert!(lookup.await.unwrap().is_none());
    assert!(fx.gateway.current_session().is_none());
    assert!(fx.notices.notices().is_empty());
}

#[tokio::test]
async fn test_late_refresh_does_not_restore_signed_out_session() {
    let store = ProfileStore::in_memory();
    let provider = FakeProvider::accepting();
    provider.set_latency(Duration::from_millis(100));
    let gateway = Arc::new(
        SessionGateway::new(
            provider.clone(),
            Arc::new(RecordingNavigator::default()),
            Arc::new(NoticeBuffer::default()),
            Duration::from_secs(5),
        )
        .with_store(store.clone()),
    );
    signed_in(&gateway, 60);

    let refreshing = gateway.clone();
    let refresh = tokio::spawn(async move { refreshing.refresh().await });
    tokio::time::sleep(Duration::from_millis(20)).await;
    gateway.handle_provider_event(SessionEvent::signed_out());

    assert!(refresh.await.unwrap().is_err());
    assert_eq!(provider.refresh_calls.load(Ordering::SeqCst), 1);
    assert!(gateway.current_session().is_none());
    assert!(store.load_session().is_none());
}

#[tokio::test]
async fn test_sign_out_failure_keeps_session() {
    let fx = gateway_fixture();
    signed_in(&fx.gateway, 3600);
    fx.provider.set_unavailable(true);

    assert!(fx.gateway.sign_out().await.is_err());
    assert!(fx.gateway.current_session().is_some());
    assert_eq!(fx.navigator.redirects(), 0);
    assert_eq!(fx.notices.notices()[0].title, "Error");
}

#[tokio::test]
async fn test_sign_out_clears_session() {
    let fx = gateway_fixture();
    signed_in(&fx.gateway, 3600);

    fx.gateway.sign_out().await.unwrap();
    assert_eq!(fx.provider.sign_out_calls.load(Ordering::SeqCst), 1);
    assert!(fx.gateway.current_session().is_none());
    assert_eq!(fx.navigator.redirects(), 1);
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let provider = FakeProvider::accepting();
    provider.set_latency(Duration::from_millis(200));
    let navigator = Arc::new(RecordingNavigator::default());
    let notices = Arc::new(NoticeBuffer::default());
    let gateway = SessionGateway::new(
        provider,
        navigator.clone(),
        notices.clone(),
        Duration::from_millis(20),
    );
    signed_in(&gateway, 3600);

    assert!(gateway.get_session().await.is_none());
    assert!(gateway.current_session().is_some());
    assert_eq!(notices.notices()[0].level, NoticeLevel::Error);
    assert_eq!(navigator.redirects(), 0);
}

#[tokio::test]
async fn test_session_persists_in_store() {
    let store = ProfileStore::in_memory();
    let build = || {
        SessionGateway::new(
            FakeProvider::accepting(),
            Arc::new(RecordingNavigator::default()),
            Arc::new(NoticeBuffer::default()),
            Duration::from_secs(5),
        )
        .with_store(store.clone())
    };

    let first = build();
    first.sign_in(sign_in_form()).await.unwrap();
    assert_eq!(build().current_session().unwrap().user.id, "ana");

    first.sign_out().await.unwrap();
    assert!(build().current_session().is_none());
    assert!(store.load_session().is_none());
}
