//! Store settings handlers

use axum::extract::State;
use axum::Json;

use stockroom_core::StoreSettings;

use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

/// GET /settings
pub async fn get(State(state): State<AppState>) -> ApiResult<Json<StoreSettings>> {
    Ok(Json(state.db.settings().get().await?))
}

/// PUT /settings - new tax rate applies to bills issued afterwards
pub async fn update(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<StoreSettings>,
) -> ApiResult<Json<StoreSettings>> {
    Ok(Json(state.db.settings().update(&payload).await?))
}
