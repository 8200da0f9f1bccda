//! # Domain Types
//!
//! Core records shared by the database layer and the HTTP API.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Item       │   │      Order      │   │      Bill       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  items[]        │──►│  order_id (1:1) │       │
//! │  │  price_cents    │   │  status         │   │  total_cents    │       │
//! │  │  quantity       │   │  customer_name  │   │  tax_cents      │       │
//! │  └────────┬────────┘   └─────────────────┘   └─────────────────┘       │
//! │           │ M:N                                                        │
//! │  ┌────────┴────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │   │   OrderStatus   │   │  StoreSettings  │       │
//! │  │  name (unique)  │   │  PENDING        │   │  tax_rate_bps   │       │
//! │  │  color          │   │  COMPLETED      │   │  receipt_width  │       │
//! │  └─────────────────┘   │  CANCELLED      │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! Records serialize camelCase (`priceCents`, `customerName`). Status values
//! serialize SCREAMING_SNAKE (`"PENDING"`) and are stored lowercase in SQLite.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::{Money, TaxRate};

// =============================================================================
// Item
// =============================================================================

/// A sellable catalog item with stock on hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Item {
    pub id: String,
    pub name: String,

    /// Current catalog price. Orders snapshot it per line.
    pub price_cents: i64,

    /// Stock on hand, never negative.
    pub quantity: i64,

    /// Optional shipping/scale weight.
    pub weight_grams: Option<i64>,

    /// Kept equal to `quantity > 0` whenever orders move stock.
    pub in_stock: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Item {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    pub fn can_supply(&self, quantity: i64) -> bool {
        self.quantity >= quantity
    }
}

/// Fields accepted when creating or replacing an item.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ItemInput {
    pub name: String,
    pub price_cents: i64,
    pub quantity: i64,
    #[serde(default)]
    pub weight_grams: Option<i64>,
    /// Defaults to `quantity > 0` when omitted.
    #[serde(default)]
    pub in_stock: Option<bool>,
}

impl ItemInput {
    pub fn resolved_in_stock(&self) -> bool {
        self.in_stock.unwrap_or(self.quantity > 0)
    }
}

// =============================================================================
// Category
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    pub id: String,
    /// Unique, case-sensitive.
    pub name: String,
    /// `#RRGGBB`
    pub color: String,
    pub sort_order: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CategoryInput {
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub sort_order: i64,
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle state of an order.
///
/// ```text
///              ┌──────────► COMPLETED (bill issued)
///   PENDING ───┤
///              └──────────► CANCELLED (stock restored)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Storage representation (matches the sqlx lowercase mapping).
    pub const fn as_db_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Wire representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive parse of `PENDING | COMPLETED | CANCELLED`.
impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(OrderStatus::Pending),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            _ => Err(CoreError::InvalidStatus(s.to_string())),
        }
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// One order line. Name and price are frozen at order time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub item_id: String,
    pub name_snapshot: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// Zero-based line position within the order.
    pub position: i64,
}

impl OrderItem {
    /// Line extension (quantity × captured unit price).
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Bill
// =============================================================================

/// Billing record, at most one per order and immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Bill {
    pub id: String,
    pub order_id: String,
    pub total_cents: i64,
    pub tax_cents: i64,
    /// Rate used for `tax_cents`, kept for audit.
    pub tax_rate_bps: u32,
    pub payment_method: String,
    pub is_paid: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Bill {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    /// Amount due including tax.
    #[inline]
    pub fn grand_total(&self) -> Money {
        self.total() + self.tax()
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

// =============================================================================
// Order
// =============================================================================

/// A customer order with its lines and (once completed) its bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub customer_name: String,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub bill: Option<Bill>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Σ line extensions over captured prices.
    pub fn total(&self) -> Money {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|line| line.quantity).sum()
    }
}

// =============================================================================
// Store Settings
// =============================================================================

/// Singleton store configuration edited from the admin screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StoreSettings {
    pub store_name: String,
    /// Applied to every bill issued after the change.
    pub tax_rate_bps: u32,
    pub currency_symbol: String,
    /// Characters per printed receipt line (32 for 58mm, 48 for 80mm).
    pub receipt_width: i64,
}

impl StoreSettings {
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    pub fn format_money(&self, amount: Money) -> String {
        amount.format_with(&self.currency_symbol)
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            store_name: "Stockroom".to_string(),
            tax_rate_bps: 0,
            currency_symbol: "$".to_string(),
            receipt_width: 48,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i64, unit_price_cents: i64) -> OrderItem {
        OrderItem {
            id: "l".into(),
            order_id: "o".into(),
            item_id: "i".into(),
            name_snapshot: "Widget".into(),
            quantity,
            unit_price_cents,
            position: 0,
        }
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!("completed".parse::<OrderStatus>().unwrap(), OrderStatus::Completed);
        assert_eq!("Cancelled".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
        assert_eq!(" PENDING ".parse::<OrderStatus>().unwrap(), OrderStatus::Pending);
    }

    #[test]
    fn test_status_parse_rejects_unknown() {
        let err = "SHIPPED".parse::<OrderStatus>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidStatus(s) if s == "SHIPPED"));
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&OrderStatus::Pending).unwrap(), "\"PENDING\"");
        assert_eq!(OrderStatus::Cancelled.as_db_str(), "cancelled");
        assert!(OrderStatus::Completed.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
    }

    #[test]
    fn test_order_total_uses_captured_prices() {
        let now = Utc::now();
        let order = Order {
            id: "o".into(),
            customer_name: "Ada".into(),
            status: OrderStatus::Pending,
            items: vec![line(3, 100), line(2, 250)],
            bill: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(order.total().cents(), 800);
        assert_eq!(order.total_quantity(), 5);
    }

    #[test]
    fn test_item_input_in_stock_default() {
        let input = ItemInput {
            name: "Widget".into(),
            price_cents: 100,
            quantity: 0,
            weight_grams: None,
            in_stock: None,
        };
        assert!(!input.resolved_in_stock());
    }

    #[test]
    fn test_item_serializes_camel_case() {
        let now = Utc::now();
        let item = Item {
            id: "i".into(),
            name: "Widget".into(),
            price_cents: 100,
            quantity: 10,
            weight_grams: Some(250),
            in_stock: true,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["priceCents"], 100);
        assert_eq!(json["weightGrams"], 250);
        assert_eq!(json["inStock"], true);
    }
}
