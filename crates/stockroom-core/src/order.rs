//! # Order Rules
//!
//! Pure pieces of the order engine: request validation, the status machine,
//! per-item quantity aggregation and line pricing. The database crate runs
//! these inside a single transaction.
//!
//! ## Status Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   from \ to     PENDING        COMPLETED          CANCELLED             │
//! │   ─────────     ───────        ─────────          ─────────             │
//! │   PENDING       rejected       bill issued        stock restored        │
//! │   COMPLETED     rejected       rejected           rejected              │
//! │   CANCELLED     rejected       rejected           rejected              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{Item, OrderStatus};
use crate::validation::{validate_customer_name, validate_price_cents, validate_quantity};
use crate::MAX_ORDER_LINES;

// =============================================================================
// Requests
// =============================================================================

/// One requested order line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderLineRequest {
    pub item_id: String,
    pub quantity: i64,
    /// Overrides the catalog price for this line when present.
    #[serde(default, alias = "price")]
    pub unit_price_cents: Option<i64>,
}

/// Body of a create-order request.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewOrder {
    pub customer_name: String,
    pub items: Vec<OrderLineRequest>,
}

impl NewOrder {
    /// Validates everything that can be checked without storage.
    pub fn validate(&self) -> CoreResult<()> {
        validate_customer_name(&self.customer_name)?;

        if self.items.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            }
            .into());
        }

        if self.items.len() > MAX_ORDER_LINES {
            return Err(ValidationError::OutOfRange {
                field: "items".to_string(),
                min: 1,
                max: MAX_ORDER_LINES as i64,
            }
            .into());
        }

        for line in &self.items {
            if line.item_id.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: "itemId".to_string(),
                }
                .into());
            }
            validate_quantity(line.quantity)?;
            if let Some(price) = line.unit_price_cents {
                validate_price_cents(price)?;
            }
        }

        Ok(())
    }

    /// Summed quantity per item, in first-seen order.
    ///
    /// Two lines of 4 against stock 6 must fail, so stock is reserved per
    /// item rather than per line.
    pub fn quantities_by_item(&self) -> Vec<(String, i64)> {
        let mut totals: Vec<(String, i64)> = Vec::new();
        for line in &self.items {
            match totals.iter_mut().find(|(id, _)| *id == line.item_id) {
                Some((_, qty)) => *qty += line.quantity,
                None => totals.push((line.item_id.clone(), line.quantity)),
            }
        }
        totals
    }
}

// =============================================================================
// Status Machine
// =============================================================================

/// Checks that an order may move from `from` to `to`.
///
/// Only PENDING → COMPLETED and PENDING → CANCELLED are allowed.
pub fn check_transition(order_id: &str, from: OrderStatus, to: OrderStatus) -> CoreResult<()> {
    match (from, to) {
        (OrderStatus::Pending, OrderStatus::Completed)
        | (OrderStatus::Pending, OrderStatus::Cancelled) => Ok(()),
        _ => Err(CoreError::InvalidTransition {
            order_id: order_id.to_string(),
            from,
            to,
        }),
    }
}

// =============================================================================
// Line Pricing
// =============================================================================

/// A requested line resolved against the catalog, ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub item_id: String,
    pub name_snapshot: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

/// Snapshots the item's name and price (or the request override).
pub fn price_line(request: &OrderLineRequest, item: &Item) -> PricedLine {
    PricedLine {
        item_id: item.id.clone(),
        name_snapshot: item.name.clone(),
        quantity: request.quantity,
        unit_price_cents: request.unit_price_cents.unwrap_or(item.price_cents),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn request(item_id: &str, quantity: i64) -> OrderLineRequest {
        OrderLineRequest {
            item_id: item_id.to_string(),
            quantity,
            unit_price_cents: None,
        }
    }

    fn item(id: &str, price_cents: i64) -> Item {
        let now = Utc::now();
        Item {
            id: id.to_string(),
            name: format!("Item {}", id),
            price_cents,
            quantity: 10,
            weight_grams: None,
            in_stock: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_pending_moves_to_either_terminal_state() {
        assert!(check_transition("o", OrderStatus::Pending, OrderStatus::Completed).is_ok());
        assert!(check_transition("o", OrderStatus::Pending, OrderStatus::Cancelled).is_ok());
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        for from in [OrderStatus::Completed, OrderStatus::Cancelled] {
            for to in [OrderStatus::Pending, OrderStatus::Completed, OrderStatus::Cancelled] {
                let err = check_transition("o", from, to).unwrap_err();
                assert!(matches!(err, CoreError::InvalidTransition { .. }));
            }
        }
    }

    #[test]
    fn test_no_transition_into_pending() {
        assert!(check_transition("o", OrderStatus::Pending, OrderStatus::Pending).is_err());
    }

    #[test]
    fn test_validate_rejects_empty_order() {
        let order = NewOrder {
            customer_name: "Ada".into(),
            items: vec![],
        };
        assert!(matches!(order.validate(), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_missing_customer() {
        let order = NewOrder {
            customer_name: " ".into(),
            items: vec![request("a", 1)],
        };
        assert!(matches!(order.validate(), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_bad_quantity_and_price() {
        let order = NewOrder {
            customer_name: "Ada".into(),
            items: vec![request("a", 0)],
        };
        assert!(order.validate().is_err());

        let mut line = request("a", 1);
        line.unit_price_cents = Some(-1);
        let order = NewOrder {
            customer_name: "Ada".into(),
            items: vec![line],
        };
        assert!(order.validate().is_err());
    }

    #[test]
    fn test_quantities_are_summed_per_item() {
        let order = NewOrder {
            customer_name: "Ada".into(),
            items: vec![request("a", 4), request("b", 1), request("a", 4)],
        };
        assert_eq!(
            order.quantities_by_item(),
            vec![("a".to_string(), 8), ("b".to_string(), 1)]
        );
    }

    #[test]
    fn test_price_line_snapshots_catalog_price() {
        let priced = price_line(&request("a", 3), &item("a", 100));
        assert_eq!(priced.unit_price_cents, 100);
        assert_eq!(priced.name_snapshot, "Item a");
    }

    #[test]
    fn test_price_line_honours_override() {
        let mut line = request("a", 3);
        line.unit_price_cents = Some(75);
        assert_eq!(price_line(&line, &item("a", 100)).unit_price_cents, 75);
    }

    #[test]
    fn test_request_accepts_price_alias() {
        let line: OrderLineRequest =
            serde_json::from_str(r#"{"itemId":"a","quantity":2,"price":150}"#).unwrap();
        assert_eq!(line.unit_price_cents, Some(150));
    }
}
