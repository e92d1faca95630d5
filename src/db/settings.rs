use crate::db::models::Setting;
use crate::db::sqlite::SqlitePool;
use crate::error::CmsError;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::types::Json;

#[derive(Clone)]
pub struct SettingsStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone)]
pub struct SettingWrite {
    pub key: String,
    pub value: Value,
    pub is_public: bool,
}

impl SettingsStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Setting>, CmsError> {
        let rows = sqlx::query_as::<_, Setting>("SELECT * FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Public settings folded into one JSON object.
    pub async fn public_map(&self) -> Result<Map<String, Value>, CmsError> {
        let rows = sqlx::query_as::<_, Setting>(
            "SELECT * FROM settings WHERE is_public = 1 ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|s| (s.key, s.value.0)).collect())
    }

    pub async fn get_value(&self, key: &str) -> Result<Option<Value>, CmsError> {
        let row: Option<(Json<Value>,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(v,)| v.0))
    }

    /// Upsert a batch in one transaction.
    pub async fn upsert_many(&self, items: Vec<SettingWrite>) -> Result<(), CmsError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        for item in items {
            sqlx::query(
                r#"INSERT INTO settings (key, value, is_public, updated_at)
                   VALUES (?, ?, ?, ?)
                   ON CONFLICT(key) DO UPDATE SET
                       value = excluded.value,
                       is_public = excluded.is_public,
                       updated_at = excluded.updated_at"#,
            )
            .bind(item.key)
            .bind(Json(item.value))
            .bind(item.is_public)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<bool, CmsError> {
        let res = sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::testing::temp_pool;
    use serde_json::json;

    #[tokio::test]
    async fn only_public_settings_are_exposed() {
        let settings = SettingsStore::new(temp_pool().await);
        settings
            .upsert_many(vec![
                SettingWrite {
                    key: "site_name".into(),
                    value: json!("Shieldline"),
                    is_public: true,
                },
                SettingWrite {
                    key: "crm_webhook".into(),
                    value: json!({"url": "https://crm.internal"}),
                    is_public: false,
                },
            ])
            .await
            .unwrap();
        let public = settings.public_map().await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public["site_name"], json!("Shieldline"));

        settings
            .upsert_many(vec![SettingWrite {
                key: "site_name".into(),
                value: json!("Shieldline Security"),
                is_public: true,
            }])
            .await
            .unwrap();
        assert_eq!(
            settings.get_value("site_name").await.unwrap(),
            Some(json!("Shieldline Security"))
        );
        assert_eq!(settings.list().await.unwrap().len(), 2);
    }
}
