//! # Session Authentication
//!
//! Single admin account, one live session at a time.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /auth/login {password}                                            │
//! │     │  argon2 verify against users.password_hash                        │
//! │     ▼                                                                   │
//! │  new sid ──► users.session_id / session_expires_at                      │
//! │     │                                                                   │
//! │     ├──► Set-Cookie: stockroom_session=<HS256 JWT {sub,sid,typ,iat,exp}>│
//! │     │                (HttpOnly)                                         │
//! │     └──► Set-Cookie: stockroom_csrf=<random>  (readable by the page)    │
//! │                                                                         │
//! │  Every other request                                                    │
//! │     │  JWT valid? sid == users.session_id? not expired?  else 401       │
//! │     │  POST/PUT/PATCH/DELETE: x-csrf-token == csrf cookie?  else 403    │
//! │     ▼                                                                   │
//! │  handler (Session in request extensions)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, Method};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "stockroom_session";
pub const CSRF_COOKIE: &str = "stockroom_csrf";
pub const CSRF_HEADER: &str = "x-csrf-token";

const SESSION_TYPE: &str = "session";

// =============================================================================
// Passwords
// =============================================================================

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    use argon2::password_hash::rand_core::OsRng;
    use argon2::password_hash::SaltString;
    use argon2::{Argon2, PasswordHasher};

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// `false` for a wrong password and for an unparseable hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

// =============================================================================
// Session Tokens
// =============================================================================

/// Session token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Username
    pub sub: String,
    /// Session id, must match `users.session_id`
    pub sid: String,
    /// Always "session"
    pub typ: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and checks session tokens.
pub struct SessionManager {
    secret: String,
    lifetime_secs: i64,
}

impl SessionManager {
    pub fn new(secret: String, lifetime_secs: i64) -> Self {
        SessionManager {
            secret,
            lifetime_secs,
        }
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    /// Returns the token and its expiry.
    pub fn issue(&self, username: &str, sid: &str) -> ApiResult<(String, DateTime<Utc>)> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = SessionClaims {
            sub: username.to_string(),
            sid: sid.to_string(),
            typ: SESSION_TYPE.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("Failed to sign session: {}", e)))?;

        let expires_at = Utc.timestamp_opt(claims.exp, 0).single().unwrap_or(exp);
        Ok((token, expires_at))
    }

    pub fn validate(&self, token: &str) -> ApiResult<SessionClaims> {
        let data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| {
            debug!("Session token rejected: {e}");
            ApiError::unauthorized()
        })?;

        if data.claims.typ != SESSION_TYPE {
            return Err(ApiError::unauthorized());
        }

        Ok(data.claims)
    }
}

// =============================================================================
// Cookies
// =============================================================================

/// Value of cookie `name` from the request's `Cookie` headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value. `http_only` is off for the CSRF cookie so the page
/// can echo it back in the header.
pub fn set_cookie(name: &str, value: &str, max_age_secs: i64, http_only: bool, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; SameSite=Strict",
        name, value, max_age_secs
    );
    if http_only {
        cookie.push_str("; HttpOnly");
    }
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_cookie(name: &str) -> String {
    format!("{}=; Path=/; Max-Age=0; SameSite=Strict", name)
}

// =============================================================================
// Middleware
// =============================================================================

/// Authenticated session, inserted into request extensions by
/// [`require_session`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub username: String,
    #[serde(skip)]
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
}

fn is_mutating(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH | Method::DELETE)
}

/// Rejects requests without a live session (401) and mutations without a
/// matching CSRF token (403).
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = cookie_value(request.headers(), SESSION_COOKIE).ok_or_else(ApiError::unauthorized)?;
    let claims = state.sessions.validate(&token)?;

    let admin = state.db.users().admin().await?;
    if !admin.session_is_live(&claims.sid, Utc::now()) {
        debug!("Session revoked or expired");
        return Err(ApiError::unauthorized());
    }

    if is_mutating(request.method()) {
        let cookie = cookie_value(request.headers(), CSRF_COOKIE);
        let header = request
            .headers()
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok());

        match (cookie.as_deref(), header) {
            (Some(expected), Some(got)) if !expected.is_empty() && expected == got => {}
            _ => return Err(ApiError::Forbidden("Missing or invalid CSRF token".to_string())),
        }
    }

    let session = Session {
        username: claims.sub,
        session_id: claims.sid,
        expires_at: admin.session_expires_at.unwrap_or_default(),
    };
    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}
