//! # Validation Module
//!
//! Input validation for Stockroom. Every mutating operation validates its
//! input here before opening a transaction.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractors (serde)                                      │
//! │  ├── Malformed JSON, wrong types                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Required fields, lengths, ranges, formats                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  ├── CHECK (quantity >= 0), UNIQUE (bills.order_id)                    │
//! │  └── Foreign keys (order_items.item_id RESTRICT)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::{CategoryInput, ItemInput, StoreSettings};
use crate::{MAX_BILL_TOTAL_CENTS, MAX_ITEM_QUANTITY, MAX_PRICE_CENTS, MAX_STOCK_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn require_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Customer name: required, at most 200 characters.
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    require_text("customerName", name, 200)
}

/// Item name: required, at most 200 characters.
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    require_text("name", name, 200)
}

pub fn validate_category_name(name: &str) -> ValidationResult<()> {
    require_text("name", name, 100)
}

/// Payment method is free-form but must be present.
pub fn validate_payment_method(method: &str) -> ValidationResult<()> {
    require_text("paymentMethod", method, 50)
}

/// Color in `#RRGGBB` form.
pub fn validate_color(color: &str) -> ValidationResult<()> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "color".to_string(),
            reason: "must be #RRGGBB".to_string(),
        });
    }

    Ok(())
}

/// Search text: optional, at most 100 characters. Returns the trimmed query.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "q".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Order line quantity: 1..=999.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Stock on hand: 0..=1,000,000,000.
pub fn validate_stock(qty: i64) -> ValidationResult<()> {
    if !(0..=MAX_STOCK_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_STOCK_QUANTITY,
        });
    }
    Ok(())
}

/// Prices may be zero (free items) but never negative or above
/// [`MAX_PRICE_CENTS`].
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Bill totals, direct or computed from lines.
pub fn validate_bill_total(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_BILL_TOTAL_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "totalAmount".to_string(),
            min: 0,
            max: MAX_BILL_TOTAL_CENTS,
        });
    }

    Ok(())
}

/// Tax rate: 0..=10000 bps (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "taxRateBps".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

pub fn validate_receipt_width(width: i64) -> ValidationResult<()> {
    if !(24..=64).contains(&width) {
        return Err(ValidationError::OutOfRange {
            field: "receiptWidth".to_string(),
            min: 24,
            max: 64,
        });
    }
    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

pub fn validate_item_input(input: &ItemInput) -> ValidationResult<()> {
    validate_item_name(&input.name)?;
    validate_price_cents(input.price_cents)?;
    validate_stock(input.quantity)?;

    if let Some(weight) = input.weight_grams {
        if weight < 0 {
            return Err(ValidationError::OutOfRange {
                field: "weightGrams".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
    }

    Ok(())
}

pub fn validate_category_input(input: &CategoryInput) -> ValidationResult<()> {
    validate_category_name(&input.name)?;
    validate_color(&input.color)
}

pub fn validate_settings(settings: &StoreSettings) -> ValidationResult<()> {
    require_text("storeName", &settings.store_name, 100)?;
    require_text("currencySymbol", &settings.currency_symbol, 5)?;
    validate_tax_rate_bps(settings.tax_rate_bps)?;
    validate_receipt_width(settings.receipt_width)
}

/// New passwords: at least 8 characters.
pub fn validate_new_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < 8 {
        return Err(ValidationError::TooShort {
            field: "newPassword".to_string(),
            min: 8,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
