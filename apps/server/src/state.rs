//! Shared application state.

use std::sync::Arc;

use stockroom_db::Database;

use crate::auth::SessionManager;
use crate::config::ServerConfig;
use crate::rate_limit::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: Arc<SessionManager>,
    pub rate_limiter: RateLimiter,
    /// Whether cookies carry `Secure`.
    pub secure_cookies: bool,
    /// Whether `X-Forwarded-For` names the client.
    pub trust_proxy: bool,
}

impl AppState {
    pub fn new(db: Database, config: &ServerConfig) -> Self {
        AppState {
            db,
            sessions: Arc::new(SessionManager::new(
                config.auth.session_secret.clone(),
                config.auth.session_ttl_secs,
            )),
            rate_limiter: RateLimiter::new(),
            secure_cookies: config.auth.secure_cookies,
            trust_proxy: config.server.trust_proxy,
        }
    }
}
