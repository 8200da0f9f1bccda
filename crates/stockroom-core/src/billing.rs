//! # Billing
//!
//! Totals and tax for a bill. A bill is computed once, from the prices
//! captured on the order lines, and never recomputed afterwards.
//!
//! ```text
//! order lines ──► compute_total ──► total_cents
//!                                       │
//! settings.tax_rate_bps ──► compute_tax ┴──► tax_cents (half-up, per bill)
//! ```

use crate::error::{CoreResult, ValidationError};
use crate::money::{Money, TaxRate};
use crate::types::OrderItem;
use crate::validation::{
    validate_bill_total, validate_payment_method, validate_tax_rate_bps, ValidationResult,
};
use crate::{DEFAULT_PAYMENT_METHOD, MAX_BILL_TOTAL_CENTS};

/// Σ quantity × unit price over the captured lines.
///
/// Overflow is a validation error rather than a wrapped total.
pub fn compute_total(lines: &[OrderItem]) -> ValidationResult<Money> {
    lines.iter().try_fold(Money::zero(), |total, line| {
        Money::from_cents(line.unit_price_cents)
            .checked_mul_quantity(line.quantity)
            .and_then(|extension| total.checked_add(extension))
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "totalAmount".to_string(),
                min: 0,
                max: MAX_BILL_TOTAL_CENTS,
            })
    })
}

/// Tax on a bill total, rounded half-up to the cent.
#[inline]
pub fn compute_tax(total: Money, rate: TaxRate) -> Money {
    total.calculate_tax(rate)
}

/// Validated bill contents, ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillDraft {
    pub total: Money,
    pub tax: Money,
    pub rate: TaxRate,
    pub payment_method: String,
}

impl BillDraft {
    /// Builds a draft from a total and a rate.
    ///
    /// A missing or blank payment method falls back to `"cash"`.
    pub fn new(total: Money, rate: TaxRate, payment_method: Option<&str>) -> CoreResult<Self> {
        validate_bill_total(total.cents())?;
        validate_tax_rate_bps(rate.bps())?;

        let payment_method = match payment_method.map(str::trim) {
            Some(method) if !method.is_empty() => {
                validate_payment_method(method)?;
                method.to_string()
            }
            _ => DEFAULT_PAYMENT_METHOD.to_string(),
        };

        Ok(BillDraft {
            total,
            tax: compute_tax(total, rate),
            rate,
            payment_method,
        })
    }

    /// Draft for an order's captured lines.
    pub fn for_lines(lines: &[OrderItem], rate: TaxRate, payment_method: Option<&str>) -> CoreResult<Self> {
        BillDraft::new(compute_total(lines)?, rate, payment_method)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
