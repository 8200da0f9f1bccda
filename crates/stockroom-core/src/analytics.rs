//! # Analytics Aggregation
//!
//! Daily sales buckets and period metrics computed from order lines.
//!
//! ## Data Source
//! Orders are the single source of truth: revenue is the sum of line
//! extensions, bucketed by the order's creation date (UTC). Cancelled orders
//! never count. The database layer hands this module flat [`SalesLine`] rows
//! and everything else is pure.
//!
//! ## Windows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   previous window                     current window                    │
//! │   [start - periodDays, start - 1ms]   [start, end]                      │
//! │ ──────────────┬───────────────────────┬───────────────────────────►     │
//! │               │◄──── periodDays ─────►│◄──── ceil((end-start)/1d) ─►    │
//! │                                                                         │
//! │   trend = (current - previous) / previous × 100                        │
//! │   previous = 0, current > 0  →  100%                                   │
//! │   previous = 0, current = 0  →  0%                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::OrderStatus;
use crate::{MAX_RANGE_DAYS, TOP_SELLING_LIMIT};

pub const MILLIS_PER_DAY: i64 = 86_400_000;

// =============================================================================
// Date Range
// =============================================================================

/// Inclusive UTC time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        DateRange { start, end }
    }

    /// Parses `startDate`/`endDate` query parameters.
    ///
    /// Accepts `YYYY-MM-DD` (start of day for the start bound, last
    /// millisecond of the day for the end bound) or RFC 3339 timestamps.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, ValidationError> {
        let start = parse_bound("startDate", start, false)?;
        let end = parse_bound("endDate", end, true)?;
        let range = DateRange { start, end };
        range.validate()?;
        Ok(range)
    }

    /// Rejects windows longer than [`MAX_RANGE_DAYS`]. Empty ranges pass.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.period_days() > MAX_RANGE_DAYS {
            return Err(ValidationError::OutOfRange {
                field: "endDate".to_string(),
                min: 0,
                max: MAX_RANGE_DAYS,
            });
        }
        Ok(())
    }

    /// True when start is after end. Such a range yields no data.
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }

    /// `ceil((end - start) / 1 day)`, zero for empty or instantaneous ranges.
    pub fn period_days(&self) -> i64 {
        let ms = (self.end - self.start).num_milliseconds();
        if ms <= 0 {
            return 0;
        }
        (ms + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
    }

    /// The equal-length window immediately before this one.
    pub fn previous(&self) -> DateRange {
        DateRange {
            start: self.start - Duration::days(self.period_days()),
            end: self.start - Duration::milliseconds(1),
        }
    }

    /// Every calendar day touched by the range, ascending.
    pub fn days(&self) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        if self.is_empty() {
            return days;
        }

        let last = self.end.date_naive();
        let mut day = self.start.date_naive();
        while day <= last {
            days.push(day);
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        days
    }
}

fn parse_bound(field: &str, raw: Option<&str>, end_of_day: bool) -> Result<DateTime<Utc>, ValidationError> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    let invalid = || ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "expected YYYY-MM-DD or an RFC 3339 timestamp".to_string(),
    };

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;
    let naive = if end_of_day {
        date.and_hms_milli_opt(23, 59, 59, 999)
    } else {
        date.and_hms_milli_opt(0, 0, 0, 0)
    }
    .ok_or_else(invalid)?;

    Ok(Utc.from_utc_datetime(&naive))
}

// =============================================================================
// Inputs and Outputs
// =============================================================================

/// One order line joined with its order, as read from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesLine {
    pub order_id: String,
    pub status: OrderStatus,
    pub ordered_at: DateTime<Utc>,
    pub item_id: String,
    pub item_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl SalesLine {
    fn counts(&self) -> bool {
        self.status != OrderStatus::Cancelled
    }

    fn extension(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DailySales {
    /// `YYYY-MM-DD`
    pub date: String,
    pub total_sales: Money,
    pub order_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TopSellingItem {
    pub item_id: String,
    pub name: String,
    pub quantity: i64,
    pub revenue: Money,
}

/// Percentage change against the previous window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Trends {
    pub orders: f64,
    pub sales: f64,
    pub average_order_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesMetrics {
    pub total_orders: i64,
    pub total_sales: Money,
    /// Integer-cent average, zero when there are no orders.
    pub average_order_value: Money,
    pub top_selling_items: Vec<TopSellingItem>,
    pub trends: Trends,
    pub period_days: i64,
}

// =============================================================================
// Aggregation
// =============================================================================

/// One entry per day of `range`, zero-filled, ascending.
pub fn daily_sales(lines: &[SalesLine], range: &DateRange) -> Vec<DailySales> {
    let mut buckets: BTreeMap<NaiveDate, (Money, BTreeSet<&str>)> = BTreeMap::new();

    for line in lines.iter().filter(|l| l.counts() && range.contains(l.ordered_at)) {
        let bucket = buckets.entry(line.ordered_at.date_naive()).or_default();
        bucket.0 += line.extension();
        bucket.1.insert(line.order_id.as_str());
    }

    range
        .days()
        .into_iter()
        .map(|day| {
            let (total_sales, orders) = buckets.remove(&day).unwrap_or_default();
            DailySales {
                date: day.format("%Y-%m-%d").to_string(),
                total_sales,
                order_count: orders.len() as i64,
            }
        })
        .collect()
}

/// Totals, average, top sellers and trends for `range`.
///
/// `lines` must cover both `range` and `range.previous()`.
pub fn metrics(lines: &[SalesLine], range: &DateRange) -> SalesMetrics {
    if range.is_empty() {
        return SalesMetrics {
            total_orders: 0,
            total_sales: Money::zero(),
            average_order_value: Money::zero(),
            top_selling_items: Vec::new(),
            trends: Trends::default(),
            period_days: 0,
        };
    }

    let current = WindowTotals::collect(lines, range);
    let previous = WindowTotals::collect(lines, &range.previous());

    SalesMetrics {
        total_orders: current.orders,
        total_sales: current.sales,
        average_order_value: current.average(),
        top_selling_items: top_selling_items(lines, range, TOP_SELLING_LIMIT),
        trends: Trends {
            orders: trend(current.orders, previous.orders),
            sales: trend(current.sales.cents(), previous.sales.cents()),
            average_order_value: trend(current.average().cents(), previous.average().cents()),
        },
        period_days: range.period_days(),
    }
}

/// Percentage change rounded to two decimals.
///
/// A zero baseline yields 100% when there is current activity and 0% when
/// there is none.
pub fn trend(current: i64, previous: i64) -> f64 {
    if previous == 0 {
        return if current > 0 { 100.0 } else { 0.0 };
    }
    let pct = (current - previous) as f64 / previous as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

/// Top items by quantity sold. Ties go to revenue, then name, then id.
pub fn top_selling_items(lines: &[SalesLine], range: &DateRange, limit: usize) -> Vec<TopSellingItem> {
    // item_id -> (name, latest order time, quantity, revenue)
    let mut per_item: HashMap<&str, (&str, DateTime<Utc>, i64, Money)> = HashMap::new();

    for line in lines.iter().filter(|l| l.counts() && range.contains(l.ordered_at)) {
        let entry = per_item
            .entry(line.item_id.as_str())
            .or_insert((line.item_name.as_str(), line.ordered_at, 0, Money::zero()));
        if line.ordered_at > entry.1 {
            entry.0 = line.item_name.as_str();
            entry.1 = line.ordered_at;
        }
        entry.2 += line.quantity;
        entry.3 += line.extension();
    }

    let mut items: Vec<TopSellingItem> = per_item
        .into_iter()
        .map(|(item_id, (name, _, quantity, revenue))| TopSellingItem {
            item_id: item_id.to_string(),
            name: name.to_string(),
            quantity,
            revenue,
        })
        .collect();

    items.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then(b.revenue.cmp(&a.revenue))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
    items.truncate(limit);
    items
}

struct WindowTotals {
    orders: i64,
    sales: Money,
}

impl WindowTotals {
    fn collect(lines: &[SalesLine], range: &DateRange) -> Self {
        let mut orders = BTreeSet::new();
        let mut sales = Money::zero();

        if !range.is_empty() {
            for line in lines.iter().filter(|l| l.counts() && range.contains(l.ordered_at)) {
                orders.insert(line.order_id.as_str());
                sales += line.extension();
            }
        }

        WindowTotals {
            orders: orders.len() as i64,
            sales,
        }
    }

    fn average(&self) -> Money {
        self.sales.average_over(self.orders)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
