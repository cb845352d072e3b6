//! Sign-in, sign-up and session endpoints

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::AppError;
use super::middleware::CurrentUser;
use crate::app::AppState;
use crate::auth::service::{CodeDispatch, SessionGrant, SignupRequest};
use crate::store::users::{ProfileUpdate, User};

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

pub async fn login_handler(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionGrant>, AppError> {
    Ok(Json(state.auth.login(&req.email, &req.password)?))
}

#[derive(Deserialize)]
pub struct SendCodeRequest {
    email: String,
}

pub async fn send_code_handler(
    State(state): State<AppState>,
    Json(req): Json<SendCodeRequest>,
) -> Result<Json<CodeDispatch>, AppError> {
    Ok(Json(state.auth.send_verification_code(&req.email).await?))
}

#[derive(Deserialize)]
pub struct CodeLoginRequest {
    email: String,
    code: String,
}

pub async fn login_code_handler(
    State(state): State<AppState>,
    Json(req): Json<CodeLoginRequest>,
) -> Result<Json<SessionGrant>, AppError> {
    Ok(Json(
        state.auth.login_with_email_code(&req.email, &req.code)?,
    ))
}

pub async fn signup_handler(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SessionGrant>), AppError> {
    let grant = state.auth.signup(req)?;
    Ok((StatusCode::CREATED, Json(grant)))
}

pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> StatusCode {
    state.auth.logout(&current.claims);
    StatusCode::NO_CONTENT
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    user: User,
    redirect: &'static str,
    expires_at: DateTime<Utc>,
}

pub async fn session_handler(Extension(current): Extension<CurrentUser>) -> Json<SessionResponse> {
    Json(SessionResponse {
        redirect: current.user.role.landing_path(),
        expires_at: current.claims.expires_at(),
        user: current.user,
    })
}

pub async fn update_profile_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.auth.update_profile(current.user.id, update)?))
}
