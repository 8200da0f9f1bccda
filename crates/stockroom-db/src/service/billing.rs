//! # Billing Service
//!
//! Issues the single bill an order gets, looks bills up and renders
//! receipts.

use serde::Deserialize;
use tracing::info;

use stockroom_core::billing::BillDraft;
use stockroom_core::receipt::render_receipt;
use stockroom_core::{Bill, CoreError, Money, Order, OrderStatus, TaxRate};

use crate::error::DbResult;
use crate::pool::Database;
use crate::repository::now;
use crate::tx::StoreTx;

/// Body of a direct bill request.
///
/// Missing `totalCents` means the order's line total; missing
/// `taxRateBps` means the current settings rate.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBill {
    pub order_id: String,
    #[serde(default, alias = "totalAmount")]
    pub total_cents: Option<i64>,
    #[serde(default)]
    pub tax_rate_bps: Option<u32>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

/// Writes the bill for `order` inside `tx`.
pub(crate) async fn issue_bill(
    tx: &mut StoreTx,
    order: &Order,
    total: Option<Money>,
    rate: TaxRate,
    payment_method: Option<&str>,
) -> DbResult<Bill> {
    let draft = match total {
        Some(total) => BillDraft::new(total, rate, payment_method)?,
        None => BillDraft::for_lines(&order.items, rate, payment_method)?,
    };
    tx.insert_bill(&order.id, &draft, now()).await
}

#[derive(Debug, Clone)]
pub struct BillingService {
    db: Database,
}

impl BillingService {
    pub fn new(db: Database) -> Self {
        BillingService { db }
    }

    /// Bills an order directly.
    ///
    /// A PENDING order is completed in the same transaction. A COMPLETED
    /// order without a bill gets one. A CANCELLED order, or one that is
    /// already billed, is rejected.
    pub async fn create_bill(&self, request: &CreateBill) -> DbResult<Bill> {
        let order_id = request.order_id.trim();
        if order_id.is_empty() {
            return Err(stockroom_core::ValidationError::Required {
                field: "orderId".to_string(),
            }
            .into());
        }

        let at = now();
        let mut tx = self.db.begin().await?;

        if !tx.transition_status(order_id, OrderStatus::Completed, at).await? {
            match tx.order_status(order_id).await? {
                None => return Err(CoreError::OrderNotFound(order_id.to_string()).into()),
                Some(OrderStatus::Completed) => {
                    if tx.bill_for_order(order_id).await?.is_some() {
                        return Err(CoreError::DuplicateBill {
                            order_id: order_id.to_string(),
                        }
                        .into());
                    }
                }
                Some(from) => {
                    return Err(CoreError::InvalidTransition {
                        order_id: order_id.to_string(),
                        from,
                        to: OrderStatus::Completed,
                    }
                    .into())
                }
            }
        }

        let order = tx
            .order(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

        let rate = match request.tax_rate_bps {
            Some(bps) => TaxRate::from_bps(bps),
            None => tx.settings().await?.tax_rate(),
        };
        let total = request.total_cents.map(Money::from_cents);

        let bill = issue_bill(&mut tx, &order, total, rate, request.payment_method.as_deref()).await?;
        tx.commit().await?;

        info!(
            order_id = %order_id,
            bill_id = %bill.id,
            total = %bill.total(),
            tax = %bill.tax(),
            "Bill issued"
        );

        Ok(bill)
    }

    pub async fn get_bill(&self, bill_id: &str) -> DbResult<Bill> {
        self.db.bills().get(bill_id).await
    }

    pub async fn list_bills(&self, limit: Option<i64>) -> DbResult<Vec<Bill>> {
        self.db.bills().list(limit.unwrap_or(50)).await
    }

    /// ESC/POS bytes for a bill, laid out with the current settings.
    pub async fn receipt(&self, bill_id: &str) -> DbResult<Vec<u8>> {
        let bill = self.db.bills().get(bill_id).await?;
        let order = self
            .db
            .orders()
            .get_by_id(&bill.order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(bill.order_id.clone()))?;
        let settings = self.db.settings().get().await?;

        Ok(render_receipt(&settings, &order, &bill))
    }
}
