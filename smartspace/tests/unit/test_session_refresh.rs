//! Session refresh worker tests

use std::sync::atomic::Ordering;
use std::time::Duration;

use smartspace::models::{SessionEvent, SessionEventKind};
use smartspace::workers::session_refresh::{run, Options};

use crate::support::{gateway_fixture, session};

fn options() -> Options {
    Options {
        check_interval: Duration::from_millis(5),
        refresh_threshold: Duration::from_secs(300),
    }
}

async fn run_briefly(fx: &crate::support::GatewayFixture) {
    run(
        &options(),
        fx.gateway.as_ref(),
        tokio::time::sleep,
        Box::pin(tokio::time::sleep(Duration::from_millis(60))),
    )
    .await;
}

#[tokio::test]
async fn test_session_near_expiry_is_refreshed_once() {
    let fx = gateway_fixture();
    fx.gateway.handle_provider_event(SessionEvent::new(
        SessionEventKind::SignedIn,
        Some(session("ana", 60)),
    ));

    run_briefly(&fx).await;

    assert_eq!(fx.provider.refresh_calls.load(Ordering::SeqCst), 1);
    assert!(!fx
        .gateway
        .current_session()
        .unwrap()
        .expires_within(300));
}

#[tokio::test]
async fn test_fresh_session_is_left_alone() {
    let fx = gateway_fixture();
    fx.gateway.handle_provider_event(SessionEvent::new(
        SessionEventKind::SignedIn,
        Some(session("ana", 3600)),
    ));

    run_briefly(&fx).await;
    assert_eq!(fx.provider.refresh_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_no_session_is_not_refreshed() {
    let fx = gateway_fixture();

    run_briefly(&fx).await;
    assert_eq!(fx.provider.refresh_calls.load(Ordering::SeqCst), 0);
    assert_eq!(fx.navigator.redirects(), 0);
}
