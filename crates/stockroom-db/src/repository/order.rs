//! # Order Repository
//!
//! Read side of orders: full orders with lines and bill, recent-order
//! listings, and the flat line rows analytics aggregates over.
//!
//! Mutations go through [`crate::tx::StoreTx`] so stock, status and bill
//! always change together.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use stockroom_core::analytics::SalesLine;
use stockroom_core::{Order, OrderItem, OrderStatus};

use super::bill::fetch_bill_for_order;
use super::ts;
use crate::error::DbResult;

/// Listing cap when the caller gives none.
pub const DEFAULT_ORDER_LIMIT: i64 = 50;

#[derive(Debug, FromRow)]
struct OrderRow {
    id: String,
    customer_name: String,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct SalesLineRow {
    order_id: String,
    status: OrderStatus,
    ordered_at: DateTime<Utc>,
    item_id: String,
    item_name: String,
    quantity: i64,
    unit_price_cents: i64,
}

impl From<SalesLineRow> for SalesLine {
    fn from(row: SalesLineRow) -> Self {
        SalesLine {
            order_id: row.order_id,
            status: row.status,
            ordered_at: row.ordered_at,
            item_id: row.item_id,
            item_name: row.item_name,
            quantity: row.quantity,
            unit_price_cents: row.unit_price_cents,
        }
    }
}

// =============================================================================
// Row-level functions (shared with StoreTx)
// =============================================================================

pub(crate) async fn fetch_order_lines(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<OrderItem>> {
    let lines = sqlx::query_as::<_, OrderItem>(
        r#"
        SELECT id, order_id, item_id, name_snapshot, quantity, unit_price_cents, position
        FROM order_items
        WHERE order_id = ?1
        ORDER BY position
        "#,
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(lines)
}

async fn assemble(conn: &mut SqliteConnection, row: OrderRow) -> DbResult<Order> {
    let items = fetch_order_lines(&mut *conn, &row.id).await?;
    let bill = fetch_bill_for_order(&mut *conn, &row.id).await?;

    Ok(Order {
        id: row.id,
        customer_name: row.customer_name,
        status: row.status,
        items,
        bill,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Loads an order with its lines (by position) and bill.
pub(crate) async fn fetch_order(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(
        "SELECT id, customer_name, status, created_at, updated_at FROM orders WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(Some(assemble(conn, row).await?)),
        None => Ok(None),
    }
}

/// Current status only, without loading lines.
pub(crate) async fn fetch_order_status(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<OrderStatus>> {
    let status = sqlx::query_scalar::<_, OrderStatus>("SELECT status FROM orders WHERE id = ?1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(status)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for reading orders.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        fetch_order(&mut conn, id).await
    }

    /// Newest first, optionally restricted to one status.
    pub async fn list(&self, status: Option<OrderStatus>, limit: Option<i64>) -> DbResult<Vec<Order>> {
        let limit = limit.unwrap_or(DEFAULT_ORDER_LIMIT).clamp(1, 500);
        debug!(status = ?status, limit, "Listing orders");

        let mut conn = self.pool.acquire().await?;

        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, customer_name, status, created_at, updated_at
            FROM orders
            WHERE (?1 IS NULL OR status = ?1)
            ORDER BY created_at DESC, id
            LIMIT ?2
            "#,
        )
        .bind(status)
        .bind(limit)
        .fetch_all(&mut *conn)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            orders.push(assemble(&mut conn, row).await?);
        }
        Ok(orders)
    }

    /// Every line of every non-cancelled order created in `[from, to]`.
    pub async fn sales_lines(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<Vec<SalesLine>> {
        let rows = sqlx::query_as::<_, SalesLineRow>(
            r#"
            SELECT o.id AS order_id,
                   o.status AS status,
                   o.created_at AS ordered_at,
                   oi.item_id AS item_id,
                   oi.name_snapshot AS item_name,
                   oi.quantity AS quantity,
                   oi.unit_price_cents AS unit_price_cents
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE o.created_at >= ?1
              AND o.created_at <= ?2
              AND o.status != 'cancelled'
            ORDER BY o.created_at, oi.position
            "#,
        )
        .bind(ts(from))
        .bind(ts(to))
        .fetch_all(&self.pool)
        .await?;

        debug!(rows = rows.len(), "Loaded sales lines");

        Ok(rows.into_iter().map(SalesLine::from).collect())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
