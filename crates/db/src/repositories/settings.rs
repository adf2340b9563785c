use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use tracing::warn;

use boa_core::{SettingKey, SettingsError, SettingsStore};

use super::RepositoryError;
use crate::DbPool;

/// Preferences persisted in the `setting` table, one row per key.
pub struct SqlSettingsStore {
    pool: DbPool,
}

impl SqlSettingsStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<(String, String), RepositoryError> {
    let key: String = row.try_get("key").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let value: String = row.try_get("value").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    Ok((key, value))
}

#[async_trait]
impl SettingsStore for SqlSettingsStore {
    async fn get(&self, key: SettingKey) -> Result<Option<String>, SettingsError> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM setting WHERE key = ?")
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(value)
    }

    async fn put(&self, key: SettingKey, value: &str) -> Result<(), SettingsError> {
        sqlx::query(
            "INSERT INTO setting (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key.as_str())
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;
        Ok(())
    }

    async fn remove(&self, key: SettingKey) -> Result<(), SettingsError> {
        sqlx::query("DELETE FROM setting WHERE key = ?")
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<(SettingKey, String)>, SettingsError> {
        let rows = sqlx::query("SELECT key, value FROM setting")
            .fetch_all(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            let (raw_key, value) = row_to_entry(row)?;
            match raw_key.parse::<SettingKey>() {
                Ok(key) => entries.push((key, value)),
                Err(_) => warn!(
                    event_name = "boa.settings.unknown_key",
                    key = %raw_key,
                    "skipping setting row with unknown key"
                ),
            }
        }
        entries.sort_by_key(|(key, _)| *key);
        Ok(entries)
    }
}
