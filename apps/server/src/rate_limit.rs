//! Fixed-window rate limiting for the login route.

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

/// Login attempts allowed per client per window.
pub const LOGIN_MAX_ATTEMPTS: u32 = 5;
pub const LOGIN_WINDOW_SECS: u64 = 60;

struct IpEntry {
    count: u32,
    window_start: Instant,
}

#[derive(Clone, Default)]
pub struct RateLimiter {
    /// route name -> (IP -> entry)
    inner: Arc<Mutex<HashMap<&'static str, HashMap<String, IpEntry>>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Ok` if allowed, otherwise the seconds until the window resets.
    pub async fn check(&self, route: &'static str, ip: &str, max_requests: u32, window_secs: u64) -> Result<(), u64> {
        let mut map = self.inner.lock().await;
        let route_map = map.entry(route).or_default();
        let now = Instant::now();

        let entry = route_map.entry(ip.to_owned()).or_insert_with(|| IpEntry {
            count: 0,
            window_start: now,
        });

        let elapsed = now.duration_since(entry.window_start).as_secs();
        if elapsed >= window_secs {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        if entry.count <= max_requests {
            Ok(())
        } else {
            let elapsed = now.duration_since(entry.window_start).as_secs();
            Err(window_secs.saturating_sub(elapsed).max(1))
        }
    }

    /// Drops entries whose window started more than 5 minutes ago.
    pub async fn cleanup(&self) {
        let mut map = self.inner.lock().await;
        let cutoff = Duration::from_secs(300);
        let now = Instant::now();

        for route_map in map.values_mut() {
            route_map.retain(|_, entry| now.duration_since(entry.window_start) < cutoff);
        }

        map.retain(|_, route_map| !route_map.is_empty());
    }
}

/// Client IP: the peer address, or the first `X-Forwarded-For` entry when
/// the server sits behind a trusted proxy.
fn client_ip(request: &Request, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(first) = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
        {
            let ip = first.trim();
            if !ip.is_empty() {
                return ip.to_owned();
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

/// 5 login attempts per minute per client.
pub async fn login_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ip = client_ip(&request, state.trust_proxy);
    if let Err(retry_after_secs) = state
        .rate_limiter
        .check("login", &ip, LOGIN_MAX_ATTEMPTS, LOGIN_WINDOW_SECS)
        .await
    {
        warn!(ip = %ip, "Login rate limit exceeded");
        return Err(ApiError::RateLimited { retry_after_secs });
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sixth_attempt_is_limited() {
        let limiter = RateLimiter::new();
        for _ in 0..5 {
            assert!(limiter.check("login", "10.0.0.1", 5, 60).await.is_ok());
        }
        let retry = limiter.check("login", "10.0.0.1", 5, 60).await.unwrap_err();
        assert!((1..=60).contains(&retry));

        // Other clients have their own window.
        assert!(limiter.check("login", "10.0.0.2", 5, 60).await.is_ok());
    }

    fn login_from(peer: &str, forwarded_for: &str) -> Request {
        let mut request = Request::builder()
            .uri("/auth/login")
            .header("x-forwarded-for", forwarded_for)
            .body(axum::body::Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo::<SocketAddr>(peer.parse().unwrap()));
        request
    }

    #[test]
    fn test_forwarded_for_ignored_unless_trusted() {
        let request = login_from("192.0.2.7:51000", "10.9.9.9, 192.0.2.7");
        assert_eq!(client_ip(&request, false), "192.0.2.7");
        assert_eq!(client_ip(&request, true), "10.9.9.9");

        let request = login_from("192.0.2.7:51000", " ");
        assert_eq!(client_ip(&request, true), "192.0.2.7");
    }

    #[tokio::test]
    async fn test_cleanup_keeps_recent_entries() {
        let limiter = RateLimiter::new();
        limiter.check("login", "10.0.0.1", 5, 60).await.unwrap();
        limiter.cleanup().await;
        assert_eq!(limiter.inner.lock().await["login"].len(), 1);
    }
}
