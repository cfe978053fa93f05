//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error};

use crate::app::dashboard::Dashboard;
use crate::errors::{SmartSpaceError, ValidationErrors};
use crate::models::{
    Device, DeviceId, DevicePatch, DeviceStatus, NewDevice, ProfileId, Routine, RoutineDraft,
    RoutineId, RoutinePatch, Session,
};
use crate::notify::Notice;
use crate::server::state::ServerState;
use crate::session::{ForgotPasswordForm, SignInForm, SignUpForm};
use crate::utils::version_info;

// ================================= ERRORS ====================================== //

/// Error returned by handlers
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    NotFound(String),
    Core(SmartSpaceError),
}

impl From<SmartSpaceError> for ApiError {
    fn from(err: SmartSpaceError) -> Self {
        ApiError::Core(err)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Core(SmartSpaceError::Validation(errors))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, fields) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Authentication required".to_string(),
                None,
            ),
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what), None),
            ApiError::Core(SmartSpaceError::Validation(errors)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Validation failed".to_string(),
                Some(errors),
            ),
            ApiError::Core(SmartSpaceError::NotFound(what)) => {
                (StatusCode::NOT_FOUND, format!("{} not found", what), None)
            }
            ApiError::Core(e @ SmartSpaceError::AuthError(_)) => {
                (StatusCode::UNAUTHORIZED, e.to_string(), None)
            }
            ApiError::Core(e @ SmartSpaceError::Timeout(_)) => {
                (StatusCode::GATEWAY_TIMEOUT, e.to_string(), None)
            }
            ApiError::Core(e @ SmartSpaceError::HttpError(_)) => {
                error!("Identity provider unreachable: {}", e);
                (StatusCode::BAD_GATEWAY, e.to_string(), None)
            }
            ApiError::Core(e) => {
                error!("Request failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let mut error = json!({
            "code": status.as_u16(),
            "message": message,
        });
        if let Some(fields) = fields {
            error["fields"] = json!(fields);
        }
        (status, Json(json!({ "error": error }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ================================ MIDDLEWARE =================================== //

/// Reject requests unless the gateway confirms a valid session
pub async fn require_session(
    State(state): State<Arc<ServerState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.gateway.check_auth().await {
        debug!("Rejecting unauthenticated {} {}", request.method(), request.uri());
        return ApiError::Unauthorized.into_response();
    }
    next.run(request).await
}

// ============================== HEALTH / VERSION ================================ //

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "smartspace".to_string(),
        version: version.version,
    })
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    Json(version_info())
}

// ================================= SESSION ===================================== //

/// Session summary; tokens never leave the process
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub expires_at: Option<String>,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            user_id: session.user.id.clone(),
            email: session.user.email.clone(),
            name: session.user.display_name().map(str::to_string),
            expires_at: session.expires_at().map(|at| at.to_rfc3339()),
        }
    }
}

pub async fn session_handler(
    State(state): State<Arc<ServerState>>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state.gateway.current_session().ok_or(ApiError::Unauthorized)?;
    Ok(Json(SessionResponse::from(&session)))
}

pub async fn sign_in_handler(
    State(state): State<Arc<ServerState>>,
    Json(form): Json<SignInForm>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state.gateway.sign_in(form).await?;
    Ok(Json(SessionResponse::from(&session)))
}

#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    /// The account must be confirmed by email before signing in
    pub confirmation_required: bool,
    pub session: Option<SessionResponse>,
}

pub async fn sign_up_handler(
    State(state): State<Arc<ServerState>>,
    Json(form): Json<SignUpForm>,
) -> ApiResult<(StatusCode, Json<SignUpResponse>)> {
    let session = state.gateway.sign_up(form).await?;
    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            confirmation_required: session.is_none(),
            session: session.as_ref().map(SessionResponse::from),
        }),
    ))
}

pub async fn forgot_password_handler(
    State(state): State<Arc<ServerState>>,
    Json(form): Json<ForgotPasswordForm>,
) -> ApiResult<StatusCode> {
    state.gateway.reset_password(form).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn sign_out_handler(State(state): State<Arc<ServerState>>) -> ApiResult<StatusCode> {
    state.gateway.sign_out().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Drain pending notices
pub async fn notices_handler(State(state): State<Arc<ServerState>>) -> Json<Vec<Notice>> {
    Json(state.notices.drain())
}

// ================================= PROFILE ===================================== //

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: ProfileId,
    pub display_name: String,
    pub profiles: Vec<ProfileId>,
}

impl From<&Dashboard> for ProfileResponse {
    fn from(dashboard: &Dashboard) -> Self {
        Self {
            profile: dashboard.profile().clone(),
            display_name: dashboard.profile().display_name(),
            profiles: dashboard.profiles(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub profile: ProfileId,
}

pub async fn profile_handler(State(state): State<Arc<ServerState>>) -> Json<ProfileResponse> {
    let dashboard = state.dashboard.lock().await;
    Json(ProfileResponse::from(&*dashboard))
}

pub async fn set_profile_handler(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<ProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let profile = ProfileId::new(request.profile.as_str().trim());
    if profile.as_str().is_empty() {
        let mut errors = ValidationErrors::new();
        errors.add("profile", "Profile is required");
        return Err(errors.into());
    }

    let mut dashboard = state.dashboard.lock().await;
    dashboard.switch_profile(profile)?;
    Ok(Json(ProfileResponse::from(&*dashboard)))
}

// ================================= DEVICES ===================================== //

pub async fn list_devices_handler(State(state): State<Arc<ServerState>>) -> Json<Vec<Device>> {
    let dashboard = state.dashboard.lock().await;
    Json(dashboard.devices().devices().to_vec())
}

pub async fn get_device_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<DeviceId>,
) -> ApiResult<Json<Device>> {
    let dashboard = state.dashboard.lock().await;
    let device = dashboard
        .devices()
        .device(id)
        .cloned()
        .ok_or_else(|| device_not_found(id))?;
    Ok(Json(device))
}

pub async fn create_device_handler(
    State(state): State<Arc<ServerState>>,
    Json(new): Json<NewDevice>,
) -> ApiResult<(StatusCode, Json<Device>)> {
    new.validate()?;
    let mut dashboard = state.dashboard.lock().await;
    let device = dashboard.devices_mut().add_device(new)?;
    Ok((StatusCode::CREATED, Json(device)))
}

pub async fn update_device_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<DeviceId>,
    Json(patch): Json<DevicePatch>,
) -> ApiResult<Json<Device>> {
    let mut dashboard = state.dashboard.lock().await;
    if !dashboard.devices_mut().update_device(id, patch)? {
        return Err(device_not_found(id));
    }
    let device = dashboard
        .devices()
        .device(id)
        .cloned()
        .ok_or_else(|| device_not_found(id))?;
    Ok(Json(device))
}

pub async fn delete_device_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<DeviceId>,
) -> ApiResult<StatusCode> {
    let mut dashboard = state.dashboard.lock().await;
    if !dashboard.devices_mut().remove_device(id)? {
        return Err(device_not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct DeviceStatusResponse {
    pub id: DeviceId,
    pub status: DeviceStatus,
}

pub async fn toggle_device_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<DeviceId>,
) -> ApiResult<Json<DeviceStatusResponse>> {
    let mut dashboard = state.dashboard.lock().await;
    let status = dashboard
        .devices_mut()
        .toggle_device_status(id)?
        .ok_or_else(|| device_not_found(id))?;
    Ok(Json(DeviceStatusResponse { id, status }))
}

fn device_not_found(id: DeviceId) -> ApiError {
    ApiError::NotFound(format!("Device {}", id))
}

// ================================= ROUTINES ==================================== //

pub async fn list_routines_handler(State(state): State<Arc<ServerState>>) -> Json<Vec<Routine>> {
    let dashboard = state.dashboard.lock().await;
    Json(dashboard.routines().routines().to_vec())
}

pub async fn get_routine_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<RoutineId>,
) -> ApiResult<Json<Routine>> {
    let dashboard = state.dashboard.lock().await;
    let routine = dashboard
        .routines()
        .routine(id)
        .cloned()
        .ok_or_else(|| routine_not_found(id))?;
    Ok(Json(routine))
}

/// Create a routine from form input
pub async fn create_routine_handler(
    State(state): State<Arc<ServerState>>,
    Json(draft): Json<RoutineDraft>,
) -> ApiResult<(StatusCode, Json<Routine>)> {
    let mut dashboard = state.dashboard.lock().await;
    let routine = dashboard.routines_mut().add_validated(draft)?;
    Ok((StatusCode::CREATED, Json(routine)))
}

/// Replace the editable fields of a routine from form input
pub async fn replace_routine_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<RoutineId>,
    Json(draft): Json<RoutineDraft>,
) -> ApiResult<Json<Routine>> {
    let mut dashboard = state.dashboard.lock().await;
    if !dashboard.routines_mut().update_validated(id, draft)? {
        return Err(routine_not_found(id));
    }
    current_routine(&dashboard, id)
}

pub async fn update_routine_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<RoutineId>,
    Json(patch): Json<RoutinePatch>,
) -> ApiResult<Json<Routine>> {
    let mut dashboard = state.dashboard.lock().await;
    if !dashboard.routines_mut().update_routine(id, patch)? {
        return Err(routine_not_found(id));
    }
    current_routine(&dashboard, id)
}

pub async fn delete_routine_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<RoutineId>,
) -> ApiResult<StatusCode> {
    let mut dashboard = state.dashboard.lock().await;
    if !dashboard.routines_mut().remove_routine(id)? {
        return Err(routine_not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct RoutineActiveResponse {
    pub id: RoutineId,
    pub active: bool,
}

pub async fn toggle_routine_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<RoutineId>,
) -> ApiResult<Json<RoutineActiveResponse>> {
    let mut dashboard = state.dashboard.lock().await;
    let active = dashboard
        .routines_mut()
        .toggle_routine(id)?
        .ok_or_else(|| routine_not_found(id))?;
    Ok(Json(RoutineActiveResponse { id, active }))
}

/// Return to the routines as last loaded
pub async fn reset_routines_handler(
    State(state): State<Arc<ServerState>>,
) -> ApiResult<Json<Vec<Routine>>> {
    let mut dashboard = state.dashboard.lock().await;
    dashboard.routines_mut().reset_routines()?;
    Ok(Json(dashboard.routines().routines().to_vec()))
}

/// Return to the built-in routines of the profile
pub async fn factory_reset_routines_handler(
    State(state): State<Arc<ServerState>>,
) -> ApiResult<Json<Vec<Routine>>> {
    let mut dashboard = state.dashboard.lock().await;
    dashboard.routines_mut().restore_factory_defaults()?;
    Ok(Json(dashboard.routines().routines().to_vec()))
}

fn current_routine(dashboard: &Dashboard, id: RoutineId) -> ApiResult<Json<Routine>> {
    dashboard
        .routines()
        .routine(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| routine_not_found(id))
}

fn routine_not_found(id: RoutineId) -> ApiError {
    ApiError::NotFound(format!("Routine {}", id))
}
