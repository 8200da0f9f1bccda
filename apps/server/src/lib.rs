//! # Stockroom Server
//!
//! JSON API for the store back office: catalog, orders, bills, analytics
//! and settings behind a single admin login.
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TraceLayer ─► CorsLayer ─► Router                                      │
//! │                               │                                         │
//! │                               ├── /health                 (public)      │
//! │                               ├── /auth/login  ─► login_rate_limit      │
//! │                               └── everything else ─► require_session    │
//! │                                                          │              │
//! │                                                          ▼              │
//! │                                   handler ─► stockroom-db services      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod rate_limit;
pub mod routes;
pub mod state;

use axum::http::{header, HeaderName, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Full application: routes plus tracing and CORS layers.
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(auth::CSRF_HEADER)]);

    routes::create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
