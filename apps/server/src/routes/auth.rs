//! Login, logout, session and password endpoints.

use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use stockroom_core::validation::validate_new_password;

use crate::auth::{
    clear_cookie, hash_password, set_cookie, verify_password, Session, CSRF_COOKIE, SESSION_COOKIE,
};
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub username: String,
    pub expires_at: DateTime<Utc>,
    /// Echo in the `x-csrf-token` header on mutations.
    pub csrf_token: String,
}

fn append_cookie(response: &mut Response, cookie: String) -> ApiResult<()> {
    let value = HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::Internal(format!("Invalid cookie header: {}", e)))?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}

fn cleared_cookies_response() -> ApiResult<Response> {
    let mut response = StatusCode::NO_CONTENT.into_response();
    append_cookie(&mut response, clear_cookie(SESSION_COOKIE))?;
    append_cookie(&mut response, clear_cookie(CSRF_COOKIE))?;
    Ok(response)
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<Response> {
    let users = state.db.users();
    let admin = users.admin().await?;

    let valid = admin
        .password_hash
        .as_deref()
        .is_some_and(|hash| verify_password(&payload.password, hash));
    if !valid {
        warn!(username = %admin.username, "Rejected login");
        return Err(ApiError::Unauthorized("Invalid password".to_string()));
    }

    let sid = uuid::Uuid::new_v4().to_string();
    let (token, expires_at) = state.sessions.issue(&admin.username, &sid)?;
    users.set_session(&sid, expires_at).await?;

    let csrf_token = uuid::Uuid::new_v4().simple().to_string();
    let max_age = state.sessions.lifetime_secs();

    info!(username = %admin.username, "Admin logged in");

    let mut response = Json(LoginResponse {
        username: admin.username,
        expires_at,
        csrf_token: csrf_token.clone(),
    })
    .into_response();
    append_cookie(
        &mut response,
        set_cookie(SESSION_COOKIE, &token, max_age, true, state.secure_cookies),
    )?;
    append_cookie(
        &mut response,
        set_cookie(CSRF_COOKIE, &csrf_token, max_age, false, state.secure_cookies),
    )?;

    Ok(response)
}

/// POST /auth/logout
pub async fn logout(State(state): State<AppState>, Extension(session): Extension<Session>) -> ApiResult<Response> {
    state.db.users().clear_session().await?;
    info!(username = %session.username, "Admin logged out");
    cleared_cookies_response()
}

/// GET /auth/session
pub async fn session(Extension(session): Extension<Session>) -> Json<Session> {
    Json(session)
}

/// PUT /auth/password - ends the current session
pub async fn change_password(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> ApiResult<Response> {
    validate_new_password(&payload.new_password)?;

    let users = state.db.users();
    let admin = users.admin().await?;
    let valid = admin
        .password_hash
        .as_deref()
        .is_some_and(|hash| verify_password(&payload.current_password, hash));
    if !valid {
        warn!(username = %session.username, "Password change with wrong current password");
        return Err(ApiError::Unauthorized("Current password is incorrect".to_string()));
    }

    let hash = hash_password(&payload.new_password)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))?;
    users.set_password_hash(&hash).await?;

    info!(username = %session.username, "Admin password changed");
    cleared_cookies_response()
}
