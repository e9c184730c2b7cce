use async_trait::async_trait;

use crate::application::repos::{RepoError, SettingsRepo};

use super::{PostgresRepositories, map_sqlx_error};

#[async_trait]
impl SettingsRepo for PostgresRepositories {
    async fn get_setting(&self, name: &str) -> Result<Option<String>, RepoError> {
        sqlx::query_scalar::<_, String>("SELECT content FROM console_settings WHERE name = $1")
            .bind(name)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn save_setting(&self, name: &str, content: &str) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO console_settings (name, content)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET content = EXCLUDED.content
            "#,
        )
        .bind(name)
        .bind(content)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}
