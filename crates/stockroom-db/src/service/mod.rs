//! # Services
//!
//! Multi-step operations over [`crate::tx::StoreTx`]. Each public method
//! runs in exactly one transaction and either commits everything it did or
//! nothing.
//!
//! - [`orders::OrderEngine`] - create, status changes, delete
//! - [`billing::BillingService`] - bill issue, lookup, receipts
//! - [`analytics::AnalyticsService`] - daily sales and period metrics

pub mod analytics;
pub mod billing;
pub mod orders;
