//! # Repository Module
//!
//! Database repository implementations for Stockroom.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Route handler / service                                               │
//! │       │                                                                 │
//! │       │  db.items().get("…")            db.begin() → StoreTx            │
//! │       ▼                                      │                          │
//! │  ItemRepository (pool)                       │ (one transaction)        │
//! │       │                                      │                          │
//! │       └──────────┬───────────────────────────┘                          │
//! │                  ▼                                                      │
//! │  row-level fns: fetch_item(conn, id), fetch_order(conn, id), …          │
//! │                  │                                                      │
//! │                  ▼                                                      │
//! │  SQLite                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Row-level functions take `&mut SqliteConnection`, so the same SQL serves
//! a pooled connection and an open transaction.
//!
//! ## Available Repositories
//!
//! - [`item::ItemRepository`] - Catalog items and their categories
//! - [`category::CategoryRepository`] - Categories
//! - [`order::OrderRepository`] - Order reads and analytics rows
//! - [`bill::BillRepository`] - Bill reads
//! - [`settings::SettingsRepository`] - Store settings singleton
//! - [`user::UserRepository`] - Admin credentials and session

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

pub mod bill;
pub mod category;
pub mod item;
pub mod order;
pub mod settings;
pub mod user;

/// Current time at the precision stored in the database.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Fixed-width timestamp text (`2024-03-01T09:14:00.000Z`), sortable as a string.
pub(crate) fn ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_text_is_fixed_width() {
        let a = Utc.with_ymd_and_hms(2024, 3, 1, 9, 14, 0).unwrap();
        assert_eq!(ts(a), "2024-03-01T09:14:00.000Z");
        assert_eq!(ts(now()).len(), 24);
    }
}
