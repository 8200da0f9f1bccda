//! Bill API Handlers

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use stockroom_core::Bill;
use stockroom_db::CreateBill;

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct BillQuery {
    pub limit: Option<i64>,
}

/// GET /bills
pub async fn list(State(state): State<AppState>, ApiQuery(query): ApiQuery<BillQuery>) -> ApiResult<Json<Vec<Bill>>> {
    Ok(Json(state.db.billing().list_bills(query.limit).await?))
}

/// POST /bills
pub async fn create(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateBill>,
) -> ApiResult<(StatusCode, Json<Bill>)> {
    let bill = state.db.billing().create_bill(&payload).await?;
    Ok((StatusCode::CREATED, Json(bill)))
}

/// GET /bills/{id}
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Bill>> {
    Ok(Json(state.db.billing().get_bill(&id).await?))
}

/// GET /bills/{id}/receipt - raw ESC/POS bytes
pub async fn receipt(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<impl IntoResponse> {
    let bytes = state.db.billing().receipt(&id).await?;
    let disposition = format!("attachment; filename=\"receipt-{}.bin\"", id);

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
