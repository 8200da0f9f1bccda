//! # Item Repository
//!
//! Catalog items and stock on hand.
//!
//! ## Stock Movement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create order     reserve_stock   quantity -= n   WHERE quantity >= n   │
//! │  cancel order     restore_stock   quantity += n                         │
//! │  complete order   (no change)                                           │
//! │  delete order     (no change)                                           │
//! │                                                                         │
//! │  in_stock is rewritten as quantity > 0 by both statements.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use stockroom_core::validation::{validate_item_input, validate_search_query};
use stockroom_core::{Category, CoreError, Item, ItemInput};

use super::category::{fetch_category, CATEGORY_COLUMNS};
use super::{new_id, now, ts};
use crate::error::{DbError, DbResult};

pub(crate) const ITEM_COLUMNS: &str =
    "id, name, price_cents, quantity, weight_grams, in_stock, created_at, updated_at";

// =============================================================================
// Row-level functions (shared with StoreTx)
// =============================================================================

pub(crate) async fn fetch_item(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Item>> {
    let sql = format!("SELECT {} FROM items WHERE id = ?1", ITEM_COLUMNS);
    let item = sqlx::query_as::<_, Item>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(item)
}

/// Guarded decrement. Returns `false` when the item is missing or short.
pub(crate) async fn reserve_stock(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
    at: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE items
        SET quantity = quantity - ?2,
            in_stock = (quantity - ?2) > 0,
            updated_at = ?3
        WHERE id = ?1 AND quantity >= ?2
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(ts(at))
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub(crate) async fn restore_stock(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
    at: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE items
        SET quantity = quantity + ?2,
            in_stock = (quantity + ?2) > 0,
            updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(ts(at))
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

// =============================================================================
// Repository
// =============================================================================

/// Optional filters for [`ItemRepository::list`].
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub category_id: Option<String>,
    pub query: Option<String>,
}

/// Repository for catalog items.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Lists items by name, optionally within a category and/or matching a
    /// name fragment (case-insensitive for ASCII).
    pub async fn list(&self, filter: &ItemFilter) -> DbResult<Vec<Item>> {
        let pattern = match filter.query.as_deref() {
            Some(q) => {
                let q = validate_search_query(q)?;
                if q.is_empty() {
                    None
                } else {
                    Some(format!("%{}%", escape_like(&q)))
                }
            }
            None => None,
        };

        debug!(category = ?filter.category_id, pattern = ?pattern, "Listing items");

        let sql = format!(
            r#"
            SELECT {} FROM items i
            WHERE (?1 IS NULL OR EXISTS (
                    SELECT 1 FROM item_categories ic
                    WHERE ic.item_id = i.id AND ic.category_id = ?1))
              AND (?2 IS NULL OR i.name LIKE ?2 ESCAPE '\')
            ORDER BY i.name COLLATE NOCASE, i.id
            "#,
            ITEM_COLUMNS
        );

        let items = sqlx::query_as::<_, Item>(&sql)
            .bind(filter.category_id.as_deref())
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Item>> {
        let mut conn = self.pool.acquire().await?;
        fetch_item(&mut conn, id).await
    }

    /// Like `get_by_id`, but a missing item is `ItemNotFound`.
    pub async fn get(&self, id: &str) -> DbResult<Item> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ItemNotFound(id.to_string()).into())
    }

    pub async fn create(&self, input: &ItemInput) -> DbResult<Item> {
        validate_item_input(input)?;

        let created = now();
        let item = Item {
            id: new_id(),
            name: input.name.trim().to_string(),
            price_cents: input.price_cents,
            quantity: input.quantity,
            weight_grams: input.weight_grams,
            in_stock: input.resolved_in_stock(),
            created_at: created,
            updated_at: created,
        };

        debug!(id = %item.id, name = %item.name, "Creating item");

        sqlx::query(
            r#"
            INSERT INTO items (id, name, price_cents, quantity, weight_grams, in_stock, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(item.price_cents)
        .bind(item.quantity)
        .bind(item.weight_grams)
        .bind(item.in_stock)
        .bind(ts(item.created_at))
        .bind(ts(item.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    /// Replaces an item's editable fields. Existing order lines keep their
    /// captured name and price.
    pub async fn update(&self, id: &str, input: &ItemInput) -> DbResult<Item> {
        validate_item_input(input)?;

        debug!(id = %id, "Updating item");

        let result = sqlx::query(
            r#"
            UPDATE items
            SET name = ?2, price_cents = ?3, quantity = ?4, weight_grams = ?5,
                in_stock = ?6, updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(input.price_cents)
        .bind(input.quantity)
        .bind(input.weight_grams)
        .bind(input.resolved_in_stock())
        .bind(ts(now()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ItemNotFound(id.to_string()).into());
        }

        self.get(id).await
    }

    /// Deletes an item. Items referenced by any order line are kept.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting item");

        let result = sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DbError::from)
            .map_err(|e| {
                if e.is_foreign_key_violation() {
                    CoreError::ItemInUse {
                        item_id: id.to_string(),
                    }
                    .into()
                } else {
                    e
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ItemNotFound(id.to_string()).into());
        }

        Ok(())
    }

    /// Categories linked to an item, in display order.
    pub async fn categories_for(&self, item_id: &str) -> DbResult<Vec<Category>> {
        let sql = format!(
            r#"
            SELECT {} FROM categories c
            JOIN item_categories ic ON ic.category_id = c.id
            WHERE ic.item_id = ?1
            ORDER BY c.sort_order, c.name
            "#,
            qualified(CATEGORY_COLUMNS, "c")
        );

        let categories = sqlx::query_as::<_, Category>(&sql)
            .bind(item_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(categories)
    }

    /// Replaces the item's category links in one transaction.
    pub async fn set_categories(&self, item_id: &str, category_ids: &[String]) -> DbResult<Vec<Category>> {
        debug!(item_id = %item_id, count = category_ids.len(), "Setting item categories");

        let mut tx = self.pool.begin().await?;

        if fetch_item(&mut tx, item_id).await?.is_none() {
            return Err(CoreError::ItemNotFound(item_id.to_string()).into());
        }

        for category_id in category_ids {
            if fetch_category(&mut tx, category_id).await?.is_none() {
                return Err(CoreError::CategoryNotFound(category_id.clone()).into());
            }
        }

        sqlx::query("DELETE FROM item_categories WHERE item_id = ?1")
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        for category_id in category_ids {
            sqlx::query("INSERT OR IGNORE INTO item_categories (item_id, category_id) VALUES (?1, ?2)")
                .bind(item_id)
                .bind(category_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        self.categories_for(item_id).await
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Escapes LIKE wildcards so a search for "50%" matches literally.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Prefixes every column in a comma-separated list with `alias.`.
pub(crate) fn qualified(columns: &str, alias: &str) -> String {
    columns
        .split(',')
        .map(|c| format!("{}.{}", alias, c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use stockroom_core::CategoryInput;

    fn input(name: &str, quantity: i64) -> ItemInput {
        ItemInput {
            name: name.to_string(),
            price_cents: 100,
            quantity,
            weight_grams: None,
            in_stock: None,
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = db().await;
        let item = db.items().create(&input("  Widget ", 10)).await.unwrap();

        let loaded = db.items().get(&item.id).await.unwrap();
        assert_eq!(loaded, item);
        assert_eq!(loaded.name, "Widget");
        assert!(loaded.in_stock);
    }

    #[tokio::test]
    async fn test_get_missing_is_item_not_found() {
        let db = db().await;
        let err = db.items().get("nope").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ItemNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_filters_by_name_and_category() {
        let db = db().await;
        let widget = db.items().create(&input("Widget", 1)).await.unwrap();
        db.items().create(&input("Gadget", 1)).await.unwrap();
        db.items().create(&input("50% Off Sticker", 1)).await.unwrap();

        let found = db
            .items()
            .list(&ItemFilter {
                query: Some("widg".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let literal = db
            .items()
            .list(&ItemFilter {
                query: Some("50%".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(literal.len(), 1);

        let category = db
            .categories()
            .create(&CategoryInput {
                name: "Tools".into(),
                color: "#336699".into(),
                sort_order: 0,
            })
            .await
            .unwrap();
        db.items()
            .set_categories(&widget.id, &[category.id.clone()])
            .await
            .unwrap();

        let in_category = db
            .items()
            .list(&ItemFilter {
                category_id: Some(category.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(in_category, vec![db.items().get(&widget.id).await.unwrap()]);
    }

    #[tokio::test]
    async fn test_set_categories_rejects_unknown_category() {
        let db = db().await;
        let item = db.items().create(&input("Widget", 1)).await.unwrap();

        let err = db
            .items()
            .set_categories(&item.id, &["missing".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::CategoryNotFound(_))));
    }

    #[tokio::test]
    async fn test_reserve_stock_is_guarded() {
        let db = db().await;
        let item = db.items().create(&input("Widget", 3)).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        assert!(!reserve_stock(&mut conn, &item.id, 4, now()).await.unwrap());
        assert!(reserve_stock(&mut conn, &item.id, 3, now()).await.unwrap());

        let drained = fetch_item(&mut conn, &item.id).await.unwrap().unwrap();
        assert_eq!(drained.quantity, 0);
        assert!(!drained.in_stock);

        assert!(restore_stock(&mut conn, &item.id, 2, now()).await.unwrap());
        let restored = fetch_item(&mut conn, &item.id).await.unwrap().unwrap();
        assert_eq!(restored.quantity, 2);
        assert!(restored.in_stock);
    }

    #[tokio::test]
    async fn test_delete_unreferenced_item() {
        let db = db().await;
        let item = db.items().create(&input("Widget", 1)).await.unwrap();

        db.items().delete(&item.id).await.unwrap();
        assert!(db.items().get_by_id(&item.id).await.unwrap().is_none());

        let err = db.items().delete(&item.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ItemNotFound(_))));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
