//! HTTP routes.
//!
//! `/health` and `/auth/login` are public; everything else sits behind
//! [`crate::auth::require_session`].

pub mod analytics;
pub mod auth;
pub mod bills;
pub mod categories;
pub mod health;
pub mod items;
pub mod orders;
pub mod settings;

use axum::routing::{get, post, put};
use axum::{middleware, Router};

use crate::auth::require_session;
use crate::rate_limit::login_rate_limit;
use crate::state::AppState;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    let login = Router::new()
        .route("/auth/login", post(auth::login))
        .route_layer(middleware::from_fn_with_state(state.clone(), login_rate_limit));

    let protected = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/session", get(auth::session))
        .route("/auth/password", put(auth::change_password))
        .route("/items", get(items::list).post(items::create))
        .route("/items/{id}", get(items::get).put(items::update).delete(items::delete))
        .route(
            "/items/{id}/categories",
            get(items::categories).put(items::set_categories),
        )
        .route("/categories", get(categories::list).post(categories::create))
        .route("/categories/{id}", put(categories::update).delete(categories::delete))
        .route("/orders", get(orders::list).post(orders::create))
        .route("/orders/{id}", get(orders::get).put(orders::update).delete(orders::delete))
        .route("/bills", get(bills::list).post(bills::create))
        .route("/bills/{id}", get(bills::get))
        .route("/bills/{id}/receipt", get(bills::receipt))
        .route("/analytics/daily-sales", get(analytics::daily_sales))
        .route("/analytics/metrics", get(analytics::metrics))
        .route("/settings", get(settings::get).put(settings::update))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(login)
        .merge(protected)
        .with_state(state)
}
