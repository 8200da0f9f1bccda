//! # stockroom-db: Database Layer for Stockroom
//!
//! SQLite storage for the catalog, orders, bills, settings and the admin
//! account, plus the services that change several of them at once.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Stockroom Data Flow                               │
//! │                                                                         │
//! │  HTTP handler (POST /orders)                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  stockroom-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌───────────────┐    │   │
//! │  │   │   Services    │   │    StoreTx    │   │ Repositories  │    │   │
//! │  │   │ OrderEngine   │──►│ reserve_stock │   │ items, orders │    │   │
//! │  │   │ Billing       │   │ insert_bill   │   │ bills, users  │    │   │
//! │  │   │ Analytics     │   │ commit        │   │ settings      │    │   │
//! │  │   └───────────────┘   └───────┬───────┘   └───────┬───────┘    │   │
//! │  │                               └─────────┬─────────┘            │   │
//! │  │                                         ▼                      │   │
//! │  │                       Database (pool.rs) + migrations          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (WAL)                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Per-table reads and single-row writes
//! - [`tx`] - Transaction wrapper for multi-step mutations
//! - [`service`] - Order engine, billing and analytics
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockroom_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("stockroom.db")).await?;
//!
//! let order = db.order_engine().create_order(&new_order).await?;
//! let order = db.order_engine().update_status(&order.id, "completed", None).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;
pub mod tx;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use tx::StoreTx;

pub use repository::bill::BillRepository;
pub use repository::category::CategoryRepository;
pub use repository::item::{ItemFilter, ItemRepository};
pub use repository::order::OrderRepository;
pub use repository::settings::SettingsRepository;
pub use repository::user::{AdminUser, UserRepository};

pub use service::analytics::AnalyticsService;
pub use service::billing::{BillingService, CreateBill};
pub use service::orders::OrderEngine;
