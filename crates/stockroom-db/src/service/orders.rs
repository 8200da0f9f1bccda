//! # Order Engine
//!
//! Order lifecycle: creation reserves stock, completion issues the bill,
//! cancellation gives the stock back.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  create_order ──► PENDING ──┬── COMPLETED   bill written (settings tax) │
//! │   stock -= qty              │                                           │
//! │                             └── CANCELLED   stock += qty per line       │
//! │                                                                         │
//! │  COMPLETED and CANCELLED are terminal. Any other request is             │
//! │  InvalidTransition and changes nothing.                                 │
//! │                                                                         │
//! │  delete_order removes order, lines and bill. Stock stays as it is.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{debug, info};

use stockroom_core::order::{price_line, NewOrder};
use stockroom_core::{CoreError, Order, OrderStatus};

use super::billing::issue_bill;
use crate::error::DbResult;
use crate::pool::Database;
use crate::repository::now;
use crate::repository::order::fetch_order_status;

/// Runs order mutations, one transaction each.
#[derive(Debug, Clone)]
pub struct OrderEngine {
    db: Database,
}

impl OrderEngine {
    pub fn new(db: Database) -> Self {
        OrderEngine { db }
    }

    /// Creates a PENDING order and reserves its stock.
    ///
    /// Quantities are summed per item before reserving, so two lines of 4
    /// against a stock of 6 fail. Any failure leaves every item untouched.
    pub async fn create_order(&self, request: &NewOrder) -> DbResult<Order> {
        request.validate()?;

        let at = now();
        let mut tx = self.db.begin().await?;

        for (item_id, quantity) in request.quantities_by_item() {
            if tx.reserve_stock(&item_id, quantity, at).await? {
                continue;
            }

            let err = match tx.item(&item_id).await? {
                None => CoreError::ItemNotFound(item_id),
                Some(item) => CoreError::InsufficientStock {
                    item_id,
                    item_name: item.name,
                    available: item.quantity,
                    requested: quantity,
                },
            };
            debug!(error = %err, "Order rejected");
            return Err(err.into());
        }

        let mut lines = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let item = tx
                .item(&line.item_id)
                .await?
                .ok_or_else(|| CoreError::ItemNotFound(line.item_id.clone()))?;
            lines.push(price_line(line, &item));
        }

        let order = tx.insert_order(request.customer_name.trim(), &lines, at).await?;
        tx.commit().await?;

        info!(
            order_id = %order.id,
            lines = order.items.len(),
            total = %order.total(),
            "Order created"
        );

        Ok(order)
    }

    /// Moves a PENDING order to COMPLETED or CANCELLED.
    ///
    /// `status` is matched case-insensitively. Completing writes the bill at
    /// the current settings tax rate with `payment_method` (default cash).
    pub async fn update_status(
        &self,
        order_id: &str,
        status: &str,
        payment_method: Option<&str>,
    ) -> DbResult<Order> {
        let target: OrderStatus = status.parse()?;

        if target == OrderStatus::Pending {
            let mut conn = self.db.pool().acquire().await?;
            let from = fetch_order_status(&mut conn, order_id)
                .await?
                .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
            return Err(CoreError::InvalidTransition {
                order_id: order_id.to_string(),
                from,
                to: target,
            }
            .into());
        }

        let at = now();
        let mut tx = self.db.begin().await?;

        if !tx.transition_status(order_id, target, at).await? {
            let from = tx
                .order_status(order_id)
                .await?
                .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
            return Err(CoreError::InvalidTransition {
                order_id: order_id.to_string(),
                from,
                to: target,
            }
            .into());
        }

        let order = tx
            .order(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

        match target {
            OrderStatus::Completed => {
                let rate = tx.settings().await?.tax_rate();
                let bill = issue_bill(&mut tx, &order, None, rate, payment_method).await?;
                info!(
                    order_id = %order_id,
                    bill_id = %bill.id,
                    total = %bill.total(),
                    tax = %bill.tax(),
                    "Order completed"
                );
            }
            OrderStatus::Cancelled => {
                for line in &order.items {
                    tx.restore_stock(&line.item_id, line.quantity, at).await?;
                }
                info!(order_id = %order_id, units = order.total_quantity(), "Order cancelled, stock restored");
            }
            OrderStatus::Pending => {}
        }

        let order = tx
            .order(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
        tx.commit().await?;

        Ok(order)
    }

    /// Removes an order with its lines and bill. Stock is not restored.
    pub async fn delete_order(&self, order_id: &str) -> DbResult<()> {
        let mut tx = self.db.begin().await?;

        if !tx.delete_order(order_id).await? {
            return Err(CoreError::OrderNotFound(order_id.to_string()).into());
        }

        tx.commit().await?;
        info!(order_id = %order_id, "Order deleted");
        Ok(())
    }

    pub async fn get_order(&self, order_id: &str) -> DbResult<Order> {
        self.db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()).into())
    }

    /// Newest first. `status` uses the same parsing as `update_status`.
    pub async fn list_orders(&self, status: Option<&str>, limit: Option<i64>) -> DbResult<Vec<Order>> {
        let status = match status {
            Some(s) => Some(s.parse::<OrderStatus>()?),
            None => None,
        };
        self.db.orders().list(status, limit).await
    }
}
