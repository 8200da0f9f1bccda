//! # API Errors
//!
//! Every handler returns `Result<_, ApiError>`. The response is always
//! `{"error": "<message>", "code": "<CODE>"}`.
//!
//! ## Status Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Validation / bad JSON / bad query      400  VALIDATION_ERROR           │
//! │  InvalidStatus                          400  INVALID_STATUS             │
//! │  InvalidTransition                      400  INVALID_TRANSITION         │
//! │  *NotFound                              404  NOT_FOUND                  │
//! │  DuplicateBill / ItemInUse / Duplicate… 409  CONFLICT                   │
//! │  InsufficientStock                      409  INSUFFICIENT_STOCK         │
//! │  no or stale session                    401  UNAUTHORIZED               │
//! │  CSRF token missing or wrong            403  FORBIDDEN                  │
//! │  login rate limit                       429  RATE_LIMITED + Retry-After │
//! │  anything else                          500  INTERNAL (logged)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use stockroom_core::{CoreError, ValidationError};
use stockroom_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Db(#[from] DbError),

    /// Malformed request body or query string.
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Too many requests, try again later")]
    RateLimited { retry_after_secs: u64 },

    #[error("{0}")]
    Internal(String),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Db(DbError::Domain(err))
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Db(DbError::Domain(CoreError::Validation(err)))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    code: &'a str,
}

impl ApiError {
    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Authentication required".to_string())
    }

    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Db(DbError::Domain(err)) => match err {
                CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                CoreError::InvalidStatus(_) => (StatusCode::BAD_REQUEST, "INVALID_STATUS"),
                CoreError::InvalidTransition { .. } => (StatusCode::BAD_REQUEST, "INVALID_TRANSITION"),
                CoreError::ItemNotFound(_)
                | CoreError::OrderNotFound(_)
                | CoreError::BillNotFound(_)
                | CoreError::CategoryNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                CoreError::DuplicateBill { .. }
                | CoreError::ItemInUse { .. }
                | CoreError::DuplicateCategory { .. } => (StatusCode::CONFLICT, "CONFLICT"),
                CoreError::InsufficientStock { .. } => (StatusCode::CONFLICT, "INSUFFICIENT_STOCK"),
            },
            ApiError::Db(DbError::NotFound { .. }) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Db(DbError::UniqueViolation { .. })
            | ApiError::Db(DbError::ForeignKeyViolation { .. }) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Db(_) | ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::RateLimited { .. } => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let mut response = (status, Json(ErrorBody { error: message, code })).into_response();

        if let ApiError::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::OrderStatus;

    #[test]
    fn test_domain_mapping() {
        let cases: Vec<(ApiError, StatusCode, &str)> = vec![
            (
                ValidationError::Required { field: "name".into() }.into(),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (
                CoreError::InvalidTransition {
                    order_id: "o".into(),
                    from: OrderStatus::Cancelled,
                    to: OrderStatus::Completed,
                }
                .into(),
                StatusCode::BAD_REQUEST,
                "INVALID_TRANSITION",
            ),
            (CoreError::OrderNotFound("o".into()).into(), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (
                CoreError::DuplicateBill { order_id: "o".into() }.into(),
                StatusCode::CONFLICT,
                "CONFLICT",
            ),
            (
                CoreError::InsufficientStock {
                    item_id: "i".into(),
                    item_name: "Widget".into(),
                    available: 1,
                    requested: 2,
                }
                .into(),
                StatusCode::CONFLICT,
                "INSUFFICIENT_STOCK",
            ),
            (
                ApiError::Db(DbError::QueryFailed("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
            ),
        ];

        for (err, status, code) in cases {
            assert_eq!(err.status_and_code(), (status, code), "{err}");
        }
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = ApiError::RateLimited { retry_after_secs: 42 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }

    #[test]
    fn test_internal_message_is_hidden() {
        let response = ApiError::Internal("secret detail".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
