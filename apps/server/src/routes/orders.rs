//! Order API Handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use stockroom_core::order::NewOrder;
use stockroom_core::Order;

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub status: String,
    #[serde(default)]
    pub payment_method: Option<String>,
}

/// GET /orders
pub async fn list(State(state): State<AppState>, ApiQuery(query): ApiQuery<OrderQuery>) -> ApiResult<Json<Vec<Order>>> {
    let orders = state
        .db
        .order_engine()
        .list_orders(query.status.as_deref().filter(|s| !s.is_empty()), query.limit)
        .await?;
    Ok(Json(orders))
}

/// POST /orders
pub async fn create(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewOrder>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let order = state.db.order_engine().create_order(&payload).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders/{id}
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Order>> {
    Ok(Json(state.db.order_engine().get_order(&id).await?))
}

/// PUT /orders/{id} - status change (COMPLETED bills, CANCELLED restocks)
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateOrderRequest>,
) -> ApiResult<Json<Order>> {
    let order = state
        .db
        .order_engine()
        .update_status(&id, &payload.status, payload.payment_method.as_deref())
        .await?;
    Ok(Json(order))
}

/// DELETE /orders/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.order_engine().delete_order(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
