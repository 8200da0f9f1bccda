//! Item API Handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use stockroom_core::{Category, Item, ItemInput};
use stockroom_db::ItemFilter;

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ItemQuery {
    pub category: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCategoriesRequest {
    pub category_ids: Vec<String>,
}

/// GET /items
pub async fn list(State(state): State<AppState>, ApiQuery(query): ApiQuery<ItemQuery>) -> ApiResult<Json<Vec<Item>>> {
    let filter = ItemFilter {
        category_id: query.category.filter(|c| !c.is_empty()),
        query: query.q,
    };
    Ok(Json(state.db.items().list(&filter).await?))
}

/// POST /items
pub async fn create(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ItemInput>,
) -> ApiResult<(StatusCode, Json<Item>)> {
    let item = state.db.items().create(&payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /items/{id}
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Item>> {
    Ok(Json(state.db.items().get(&id).await?))
}

/// PUT /items/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<ItemInput>,
) -> ApiResult<Json<Item>> {
    Ok(Json(state.db.items().update(&id, &payload).await?))
}

/// DELETE /items/{id} - refused while order lines reference the item
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.items().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /items/{id}/categories
pub async fn categories(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Vec<Category>>> {
    state.db.items().get(&id).await?;
    Ok(Json(state.db.items().categories_for(&id).await?))
}

/// PUT /items/{id}/categories
pub async fn set_categories(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<SetCategoriesRequest>,
) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(
        state.db.items().set_categories(&id, &payload.category_ids).await?,
    ))
}
