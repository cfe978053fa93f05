//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::SmartSpaceError;
use crate::server::handlers::{
    create_device_handler, create_routine_handler, delete_device_handler, delete_routine_handler,
    factory_reset_routines_handler, forgot_password_handler, get_device_handler,
    get_routine_handler, health_handler, list_devices_handler, list_routines_handler,
    notices_handler, profile_handler, replace_routine_handler, require_session,
    reset_routines_handler, session_handler, set_profile_handler, sign_in_handler,
    sign_out_handler, sign_up_handler, toggle_device_handler, toggle_routine_handler,
    update_device_handler, update_routine_handler, version_handler,
};
use crate::server::state::ServerState;

/// Build the API router
pub fn router(state: Arc<ServerState>) -> Router {
    let protected = Router::new()
        // Profile
        .route("/profile", get(profile_handler).put(set_profile_handler))
        // Devices
        .route(
            "/devices",
            get(list_devices_handler).post(create_device_handler),
        )
        .route(
            "/devices/{id}",
            get(get_device_handler)
                .patch(update_device_handler)
                .delete(delete_device_handler),
        )
        .route("/devices/{id}/toggle", post(toggle_device_handler))
        // Routines
        .route(
            "/routines",
            get(list_routines_handler).post(create_routine_handler),
        )
        .route("/routines/reset", post(reset_routines_handler))
        .route("/routines/factory-reset", post(factory_reset_routines_handler))
        .route(
            "/routines/{id}",
            get(get_routine_handler)
                .put(replace_routine_handler)
                .patch(update_routine_handler)
                .delete(delete_routine_handler),
        )
        .route("/routines/{id}/toggle", post(toggle_routine_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        // Health and version
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        // Session
        .route("/session", get(session_handler))
        .route("/session/sign-in", post(sign_in_handler))
        .route("/session/sign-up", post(sign_up_handler))
        .route("/session/forgot-password", post(forgot_password_handler))
        .route("/session/sign-out", post(sign_out_handler))
        .route("/notices", get(notices_handler))
        .merge(protected)
        // State and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // the dashboard UI is served from another origin
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), SmartSpaceError>>, SmartSpaceError> {
    let app = router(state);

    let addr = format!("{}:{}", options.host, options.port);
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| SmartSpaceError::ServerError(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| SmartSpaceError::ServerError(e.to_string()))
    });

    Ok(handle)
}
