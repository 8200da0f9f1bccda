//! # Analytics Service
//!
//! Loads order lines for a window and hands them to the aggregation in
//! `stockroom_core::analytics`. Metrics read the preceding window as well,
//! for the trend percentages.

use tracing::debug;

use stockroom_core::analytics::{self, DailySales, DateRange, SalesMetrics};

use crate::error::DbResult;
use crate::pool::Database;

#[derive(Debug, Clone)]
pub struct AnalyticsService {
    db: Database,
}

impl AnalyticsService {
    pub fn new(db: Database) -> Self {
        AnalyticsService { db }
    }

    /// One zero-filled entry per day in `range`.
    pub async fn daily_sales(&self, range: &DateRange) -> DbResult<Vec<DailySales>> {
        range.validate()?;
        if range.is_empty() {
            return Ok(Vec::new());
        }

        let lines = self.db.orders().sales_lines(range.start, range.end).await?;
        debug!(days = range.period_days(), lines = lines.len(), "Computing daily sales");

        Ok(analytics::daily_sales(&lines, range))
    }

    pub async fn metrics(&self, range: &DateRange) -> DbResult<SalesMetrics> {
        range.validate()?;
        if range.is_empty() {
            return Ok(analytics::metrics(&[], range));
        }

        let previous = range.previous();
        let lines = self.db.orders().sales_lines(previous.start, range.end).await?;
        debug!(days = range.period_days(), lines = lines.len(), "Computing sales metrics");

        Ok(analytics::metrics(&lines, range))
    }
}
