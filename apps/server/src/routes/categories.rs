//! Category API Handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use stockroom_core::{Category, CategoryInput};

use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

/// GET /categories
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.db.categories().list().await?))
}

/// POST /categories
pub async fn create(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CategoryInput>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let category = state.db.categories().create(&payload).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /categories/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<CategoryInput>,
) -> ApiResult<Json<Category>> {
    Ok(Json(state.db.categories().update(&id, &payload).await?))
}

/// DELETE /categories/{id} - linked items stay, only the links go
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.categories().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
