//! Analytics API Handlers

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use stockroom_core::analytics::{DailySales, DateRange, SalesMetrics};

use crate::error::ApiResult;
use crate::extract::ApiQuery;
use crate::state::AppState;

/// `?startDate=2024-03-01&endDate=2024-03-07` (dates or RFC 3339)
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl RangeQuery {
    fn range(&self) -> ApiResult<DateRange> {
        Ok(DateRange::parse(
            self.start_date.as_deref(),
            self.end_date.as_deref(),
        )?)
    }
}

/// GET /analytics/daily-sales
pub async fn daily_sales(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> ApiResult<Json<Vec<DailySales>>> {
    let range = query.range()?;
    Ok(Json(state.db.analytics().daily_sales(&range).await?))
}

/// GET /analytics/metrics
pub async fn metrics(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> ApiResult<Json<SalesMetrics>> {
    let range = query.range()?;
    Ok(Json(state.db.analytics().metrics(&range).await?))
}
