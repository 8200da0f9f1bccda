//! # Error Types
//!
//! Domain-specific error types for stockroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockroom-db errors (separate crate)                                  │
//! │  └── DbError          - Storage failures, wraps CoreError              │
//! │                                                                         │
//! │  server errors (apps/server)                                           │
//! │  └── ApiError         - HTTP status + JSON body                        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the order engine, billing and catalog.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Item does not exist.
    ///
    /// ## When This Occurs
    /// - An order line references an unknown item id
    /// - Catalog lookups by id
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Bill not found: {0}")]
    BillNotFound(String),

    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    /// Requested quantity exceeds stock on hand.
    ///
    /// ## User Workflow
    /// ```text
    /// POST /orders { itemId: A, quantity: 5 }
    ///      │
    ///      ▼
    /// guarded decrement: quantity >= 5 ?  (available = 3)
    ///      │
    ///      ▼
    /// InsufficientStock { item_id: A, available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// transaction dropped, no stock moved
    /// ```
    #[error("Insufficient stock for {item_name} ({item_id}): available {available}, requested {requested}")]
    InsufficientStock {
        item_id: String,
        item_name: String,
        available: i64,
        requested: i64,
    },

    /// Status change not permitted from the order's current status.
    ///
    /// ## When This Occurs
    /// - Completing or cancelling an order that is already terminal
    /// - Requesting a move back to PENDING
    /// - Billing a cancelled order
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Status string is not one of PENDING, COMPLETED, CANCELLED.
    #[error("Invalid order status: '{0}'")]
    InvalidStatus(String),

    /// The order already has its bill.
    #[error("Order {order_id} already has a bill")]
    DuplicateBill { order_id: String },

    /// Item is referenced by order lines and cannot be removed.
    #[error("Item {item_id} is referenced by existing orders")]
    ItemInUse { item_id: String },

    #[error("Category '{name}' already exists")]
    DuplicateCategory { name: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// True for every "entity does not exist" variant.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::ItemNotFound(_)
                | CoreError::OrderNotFound(_)
                | CoreError::BillNotFound(_)
                | CoreError::CategoryNotFound(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before any state is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. bad date, bad color).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            item_id: "item-1".to_string(),
            item_name: "Widget".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Widget (item-1): available 3, requested 5"
        );
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = CoreError::InvalidTransition {
            order_id: "o-1".to_string(),
            from: OrderStatus::Cancelled,
            to: OrderStatus::Completed,
        };
        assert_eq!(err.to_string(), "Order o-1 cannot move from CANCELLED to COMPLETED");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let err: CoreError = ValidationError::Required {
            field: "customerName".to_string(),
        }
        .into();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(err.to_string(), "Validation error: customerName is required");
    }

    #[test]
    fn test_is_not_found() {
        assert!(CoreError::OrderNotFound("x".into()).is_not_found());
        assert!(!CoreError::InvalidStatus("x".into()).is_not_found());
    }
}
