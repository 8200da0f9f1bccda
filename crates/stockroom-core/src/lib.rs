//! # stockroom-core: Pure Business Logic for Stockroom
//!
//! Everything here is deterministic and free of I/O. The database crate
//! drives these functions inside its transactions; the HTTP server never
//! calls into SQL directly.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  apps/server (axum HTTP API)                    │   │
//! │  │   /orders  /bills  /items  /analytics  /auth  /settings         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              stockroom-db (services + repositories)             │   │
//! │  │        OrderEngine, BillingService, AnalyticsService            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ stockroom-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌───────────┐ ┌─────────┐ │   │
//! │  │  │  money  │ │  order  │ │ billing │ │ analytics │ │ receipt │ │   │
//! │  │  │ TaxRate │ │ status  │ │ totals  │ │ daily/    │ │ ESC/POS │ │   │
//! │  │  │ cents   │ │ rules   │ │ tax     │ │ trends    │ │ bytes   │ │   │
//! │  │  └─────────┘ └─────────┘ └─────────┘ └───────────┘ └─────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Item, Order, Bill, Category, settings)
//! - [`money`] - Integer-cent money and basis-point tax rates
//! - [`order`] - Order status machine and line pricing
//! - [`billing`] - Bill totals and tax
//! - [`analytics`] - Daily sales buckets, metrics and trends
//! - [`receipt`] - ESC/POS receipt rendering
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::billing::compute_tax;
//! use stockroom_core::money::{Money, TaxRate};
//!
//! let total = Money::from_cents(300);
//! let tax = compute_tax(total, TaxRate::from_bps(825));
//!
//! // 300 × 8.25% = 24.75 → 25 cents (half-up)
//! assert_eq!(tax.cents(), 25);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod analytics;
pub mod billing;
pub mod error;
pub mod money;
pub mod order;
pub mod receipt;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, TaxRate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single order line.
///
/// ## Business Reason
/// Catches typos like 1000 instead of 10 before stock is reserved.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum number of lines in a single order.
pub const MAX_ORDER_LINES: usize = 100;

/// Highest accepted unit price ($100,000,000.00).
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000;

/// Highest stock on hand for one item.
pub const MAX_STOCK_QUANTITY: i64 = 1_000_000_000;

/// Largest bill total a valid order can produce.
///
/// Tax is at most 100%, so `total + tax` stays far below `i64::MAX`.
pub const MAX_BILL_TOTAL_CENTS: i64 = MAX_PRICE_CENTS * MAX_ITEM_QUANTITY * MAX_ORDER_LINES as i64;

/// Longest analytics window, in days (about ten years).
pub const MAX_RANGE_DAYS: i64 = 3660;

/// Number of entries returned in `topSellingItems`.
pub const TOP_SELLING_LIMIT: usize = 5;

/// Payment method recorded when a bill is issued without one.
pub const DEFAULT_PAYMENT_METHOD: &str = "cash";
