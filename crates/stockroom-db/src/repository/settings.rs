//! # Settings Repository
//!
//! The `settings` table holds exactly one row (`id = 1`), seeded by the
//! initial migration.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use stockroom_core::validation::validate_settings;
use stockroom_core::StoreSettings;

use crate::error::{DbError, DbResult};

pub(crate) async fn fetch_settings(conn: &mut SqliteConnection) -> DbResult<StoreSettings> {
    sqlx::query_as::<_, StoreSettings>(
        "SELECT store_name, tax_rate_bps, currency_symbol, receipt_width FROM settings WHERE id = 1",
    )
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| DbError::not_found("Settings", "1"))
}

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    pub async fn get(&self) -> DbResult<StoreSettings> {
        let mut conn = self.pool.acquire().await?;
        fetch_settings(&mut conn).await
    }

    /// Replaces the settings. A new tax rate only affects bills issued later.
    pub async fn update(&self, settings: &StoreSettings) -> DbResult<StoreSettings> {
        validate_settings(settings)?;

        info!(
            store_name = %settings.store_name,
            tax_rate_bps = settings.tax_rate_bps,
            "Updating store settings"
        );

        sqlx::query(
            r#"
            UPDATE settings
            SET store_name = ?1, tax_rate_bps = ?2, currency_symbol = ?3, receipt_width = ?4
            WHERE id = 1
            "#,
        )
        .bind(settings.store_name.trim())
        .bind(settings.tax_rate_bps)
        .bind(&settings.currency_symbol)
        .bind(settings.receipt_width)
        .execute(&self.pool)
        .await?;

        self.get().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use stockroom_core::CoreError;

    #[tokio::test]
    async fn test_defaults_then_update() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert_eq!(db.settings().get().await.unwrap(), StoreSettings::default());

        let updated = db
            .settings()
            .update(&StoreSettings {
                store_name: "Corner Shop".into(),
                tax_rate_bps: 825,
                currency_symbol: "€".into(),
                receipt_width: 32,
            })
            .await
            .unwrap();

        assert_eq!(updated.tax_rate_bps, 825);
        assert_eq!(updated.store_name, "Corner Shop");
    }

    #[tokio::test]
    async fn test_rejects_out_of_range_rate() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .settings()
            .update(&StoreSettings {
                tax_rate_bps: 10_001,
                ..StoreSettings::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }
}
