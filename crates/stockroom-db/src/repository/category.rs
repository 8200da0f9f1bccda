//! # Category Repository
//!
//! Display groupings for catalog items. Deleting a category unlinks its
//! items; the items themselves are untouched.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use stockroom_core::validation::validate_category_input;
use stockroom_core::{Category, CategoryInput, CoreError};

use super::{new_id, now, ts};
use crate::error::{DbError, DbResult};

pub(crate) const CATEGORY_COLUMNS: &str = "id, name, color, sort_order, created_at";

pub(crate) async fn fetch_category(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Category>> {
    let sql = format!("SELECT {} FROM categories WHERE id = ?1", CATEGORY_COLUMNS);
    let category = sqlx::query_as::<_, Category>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(category)
}

/// Maps a UNIQUE violation on `categories.name` to `DuplicateCategory`.
fn duplicate_name(name: &str) -> impl FnOnce(sqlx::Error) -> DbError + '_ {
    move |err| {
        let err = DbError::from(err);
        if err.is_unique_violation() {
            CoreError::DuplicateCategory {
                name: name.to_string(),
            }
            .into()
        } else {
            err
        }
    }
}

/// Repository for categories.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// All categories by `sort_order`, then name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let sql = format!(
            "SELECT {} FROM categories ORDER BY sort_order, name",
            CATEGORY_COLUMNS
        );
        let categories = sqlx::query_as::<_, Category>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    pub async fn get(&self, id: &str) -> DbResult<Category> {
        let mut conn = self.pool.acquire().await?;
        fetch_category(&mut conn, id)
            .await?
            .ok_or_else(|| CoreError::CategoryNotFound(id.to_string()).into())
    }

    pub async fn create(&self, input: &CategoryInput) -> DbResult<Category> {
        validate_category_input(input)?;

        let category = Category {
            id: new_id(),
            name: input.name.trim().to_string(),
            color: input.color.clone(),
            sort_order: input.sort_order,
            created_at: now(),
        };

        debug!(id = %category.id, name = %category.name, "Creating category");

        sqlx::query(
            "INSERT INTO categories (id, name, color, sort_order, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.color)
        .bind(category.sort_order)
        .bind(ts(category.created_at))
        .execute(&self.pool)
        .await
        .map_err(duplicate_name(&category.name))?;

        Ok(category)
    }

    pub async fn update(&self, id: &str, input: &CategoryInput) -> DbResult<Category> {
        validate_category_input(input)?;

        let name = input.name.trim();
        debug!(id = %id, name = %name, "Updating category");

        let result = sqlx::query(
            "UPDATE categories SET name = ?2, color = ?3, sort_order = ?4 WHERE id = ?1",
        )
        .bind(id)
        .bind(name)
        .bind(&input.color)
        .bind(input.sort_order)
        .execute(&self.pool)
        .await
        .map_err(duplicate_name(name))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::CategoryNotFound(id.to_string()).into());
        }

        self.get(id).await
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting category");

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::CategoryNotFound(id.to_string()).into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn input(name: &str, sort_order: i64) -> CategoryInput {
        CategoryInput {
            name: name.to_string(),
            color: "#aa3300".to_string(),
            sort_order,
        }
    }

    #[tokio::test]
    async fn test_list_is_ordered() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.categories();

        repo.create(&input("Snacks", 2)).await.unwrap();
        repo.create(&input("Drinks", 1)).await.unwrap();
        repo.create(&input("Bakery", 2)).await.unwrap();

        let names: Vec<_> = repo.list().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Drinks", "Bakery", "Snacks"]);
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.categories();

        repo.create(&input("Drinks", 0)).await.unwrap();
        let other = repo.create(&input("Snacks", 0)).await.unwrap();

        let err = repo.create(&input("Drinks", 0)).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::DuplicateCategory { .. })));

        let err = repo.update(&other.id, &input("Drinks", 0)).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::DuplicateCategory { .. })));
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.categories();

        let err = repo.update("missing", &input("X", 0)).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::CategoryNotFound(_))));

        let err = repo.delete("missing").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::CategoryNotFound(_))));
    }
}
