//! # Store Transactions
//!
//! [`StoreTx`] wraps one SQLite transaction and exposes the row operations
//! that multi-step mutations are built from.
//!
//! ## Write-First Ordering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN (deferred)                                                       │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  guarded UPDATE  ── takes the write lock up front                       │
//! │     │              (reserve_stock / transition_status / delete_order)   │
//! │     │                                                                   │
//! │     ├── 0 rows → read to explain why → Err  (drop = ROLLBACK)           │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  dependent reads + inserts (lines, bill, stock restore)                 │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Starting with a write means two concurrent transactions never both hold
//! a read lock and then race to upgrade it, which SQLite answers with
//! `SQLITE_BUSY` instead of waiting.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use stockroom_core::billing::BillDraft;
use stockroom_core::order::PricedLine;
use stockroom_core::{Bill, CoreError, Item, Order, OrderItem, OrderStatus, StoreSettings};

use crate::error::{DbError, DbResult};
use crate::repository::{bill, item, new_id, order, settings, ts};

/// An open transaction. Dropping it without [`StoreTx::commit`] rolls back.
pub struct StoreTx {
    tx: Transaction<'static, Sqlite>,
}

impl StoreTx {
    pub(crate) async fn begin(pool: &SqlitePool) -> DbResult<Self> {
        let tx = pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(StoreTx { tx })
    }

    pub async fn commit(self) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }

    pub async fn rollback(self) -> DbResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }

    // =========================================================================
    // Items
    // =========================================================================

    pub async fn item(&mut self, id: &str) -> DbResult<Option<Item>> {
        item::fetch_item(&mut self.tx, id).await
    }

    /// Decrements stock if at least `quantity` is on hand.
    pub async fn reserve_stock(&mut self, item_id: &str, quantity: i64, at: DateTime<Utc>) -> DbResult<bool> {
        item::reserve_stock(&mut self.tx, item_id, quantity, at).await
    }

    pub async fn restore_stock(&mut self, item_id: &str, quantity: i64, at: DateTime<Utc>) -> DbResult<bool> {
        item::restore_stock(&mut self.tx, item_id, quantity, at).await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    pub async fn order(&mut self, id: &str) -> DbResult<Option<Order>> {
        order::fetch_order(&mut self.tx, id).await
    }

    pub async fn order_status(&mut self, id: &str) -> DbResult<Option<OrderStatus>> {
        order::fetch_order_status(&mut self.tx, id).await
    }

    /// Inserts a PENDING order and its lines, positions in request order.
    pub async fn insert_order(
        &mut self,
        customer_name: &str,
        lines: &[PricedLine],
        at: DateTime<Utc>,
    ) -> DbResult<Order> {
        let order_id = new_id();
        debug!(order_id = %order_id, lines = lines.len(), "Inserting order");

        sqlx::query(
            "INSERT INTO orders (id, customer_name, status, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
        )
        .bind(&order_id)
        .bind(customer_name)
        .bind(OrderStatus::Pending)
        .bind(ts(at))
        .execute(&mut *self.tx)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for (position, line) in lines.iter().enumerate() {
            let row = OrderItem {
                id: new_id(),
                order_id: order_id.clone(),
                item_id: line.item_id.clone(),
                name_snapshot: line.name_snapshot.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                position: position as i64,
            };

            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, item_id, name_snapshot, quantity, unit_price_cents, position)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&row.id)
            .bind(&row.order_id)
            .bind(&row.item_id)
            .bind(&row.name_snapshot)
            .bind(row.quantity)
            .bind(row.unit_price_cents)
            .bind(row.position)
            .execute(&mut *self.tx)
            .await?;

            items.push(row);
        }

        Ok(Order {
            id: order_id,
            customer_name: customer_name.to_string(),
            status: OrderStatus::Pending,
            items,
            bill: None,
            created_at: at,
            updated_at: at,
        })
    }

    /// Moves a PENDING order to `to`. Returns `false` if the order is
    /// missing or no longer PENDING.
    pub async fn transition_status(&mut self, order_id: &str, to: OrderStatus, at: DateTime<Utc>) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1 AND status = ?4",
        )
        .bind(order_id)
        .bind(to)
        .bind(ts(at))
        .bind(OrderStatus::Pending)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Deletes an order; lines and bill go with it.
    pub async fn delete_order(&mut self, order_id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(order_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Bills
    // =========================================================================

    pub async fn bill_for_order(&mut self, order_id: &str) -> DbResult<Option<Bill>> {
        bill::fetch_bill_for_order(&mut self.tx, order_id).await
    }

    /// Writes the order's bill. A second bill for the same order is
    /// `DuplicateBill`.
    pub async fn insert_bill(&mut self, order_id: &str, draft: &BillDraft, at: DateTime<Utc>) -> DbResult<Bill> {
        let bill = Bill {
            id: new_id(),
            order_id: order_id.to_string(),
            total_cents: draft.total.cents(),
            tax_cents: draft.tax.cents(),
            tax_rate_bps: draft.rate.bps(),
            payment_method: draft.payment_method.clone(),
            is_paid: true,
            created_at: at,
        };

        sqlx::query(
            r#"
            INSERT INTO bills (id, order_id, total_cents, tax_cents, tax_rate_bps, payment_method, is_paid, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&bill.id)
        .bind(&bill.order_id)
        .bind(bill.total_cents)
        .bind(bill.tax_cents)
        .bind(bill.tax_rate_bps)
        .bind(&bill.payment_method)
        .bind(bill.is_paid)
        .bind(ts(bill.created_at))
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            let err = DbError::from(e);
            if err.is_unique_violation() {
                CoreError::DuplicateBill {
                    order_id: order_id.to_string(),
                }
                .into()
            } else {
                err
            }
        })?;

        Ok(bill)
    }

    // =========================================================================
    // Settings
    // =========================================================================

    pub async fn settings(&mut self) -> DbResult<StoreSettings> {
        settings::fetch_settings(&mut self.tx).await
    }
}
