//! # Bill Repository
//!
//! Bills are written once, inside the transaction that completes their
//! order (see [`crate::tx::StoreTx::insert_bill`]), and only read here.

use sqlx::{SqliteConnection, SqlitePool};

use stockroom_core::{Bill, CoreError};

use crate::error::DbResult;

pub(crate) const BILL_COLUMNS: &str =
    "id, order_id, total_cents, tax_cents, tax_rate_bps, payment_method, is_paid, created_at";

pub(crate) async fn fetch_bill(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Bill>> {
    let sql = format!("SELECT {} FROM bills WHERE id = ?1", BILL_COLUMNS);
    let bill = sqlx::query_as::<_, Bill>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(bill)
}

pub(crate) async fn fetch_bill_for_order(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Option<Bill>> {
    let sql = format!("SELECT {} FROM bills WHERE order_id = ?1", BILL_COLUMNS);
    let bill = sqlx::query_as::<_, Bill>(&sql)
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(bill)
}

/// Repository for reading bills.
#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: SqlitePool,
}

impl BillRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BillRepository { pool }
    }

    pub async fn get(&self, id: &str) -> DbResult<Bill> {
        let mut conn = self.pool.acquire().await?;
        fetch_bill(&mut conn, id)
            .await?
            .ok_or_else(|| CoreError::BillNotFound(id.to_string()).into())
    }

    pub async fn for_order(&self, order_id: &str) -> DbResult<Option<Bill>> {
        let mut conn = self.pool.acquire().await?;
        fetch_bill_for_order(&mut conn, order_id).await
    }

    /// Newest first.
    pub async fn list(&self, limit: i64) -> DbResult<Vec<Bill>> {
        let sql = format!(
            "SELECT {} FROM bills ORDER BY created_at DESC, id LIMIT ?1",
            BILL_COLUMNS
        );
        let bills = sqlx::query_as::<_, Bill>(&sql)
            .bind(limit.clamp(1, 500))
            .fetch_all(&self.pool)
            .await?;
        Ok(bills)
    }
}
