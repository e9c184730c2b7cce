use async_trait::async_trait;

use crate::{
    application::repos::{CacheRepo, RepoError},
    domain::entities::CacheEntryRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CacheEntryRow {
    name: String,
    payload: String,
}

impl From<CacheEntryRow> for CacheEntryRecord {
    fn from(row: CacheEntryRow) -> Self {
        Self {
            name: row.name,
            payload: row.payload,
        }
    }
}

#[async_trait]
impl CacheRepo for PostgresRepositories {
    async fn load_entry(&self, name: &str) -> Result<Option<CacheEntryRecord>, RepoError> {
        let row = sqlx::query_as::<_, CacheEntryRow>(
            r#"
            SELECT name, payload
            FROM content_cache
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(CacheEntryRecord::from))
    }

    async fn upsert_entry(&self, entry: CacheEntryRecord) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO content_cache (name, payload, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (name) DO UPDATE SET
                payload = EXCLUDED.payload,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&entry.name)
        .bind(&entry.payload)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn delete_entry(&self, name: &str) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM content_cache WHERE name = $1")
            .bind(name)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_entry_names(&self) -> Result<Vec<String>, RepoError> {
        sqlx::query_scalar::<_, String>("SELECT name FROM content_cache ORDER BY name")
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn purge_except(&self, keep: &str) -> Result<u64, RepoError> {
        let result = sqlx::query("DELETE FROM content_cache WHERE name <> $1")
            .bind(keep)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
