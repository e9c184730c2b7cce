use async_trait::async_trait;

use crate::{
    application::repos::{PostIndexRepo, RepoError},
    domain::{entities::PostIndexRecord, types::PostStatus},
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct PostIndexRow {
    title: String,
    path: String,
    status: i16,
    front_matter: String,
    date: f64,
    filename: String,
}

impl TryFrom<PostIndexRow> for PostIndexRecord {
    type Error = RepoError;

    fn try_from(row: PostIndexRow) -> Result<Self, Self::Error> {
        let status = PostStatus::try_from(row.status).map_err(|err| RepoError::Integrity {
            message: err.to_string(),
        })?;
        Ok(Self {
            title: row.title,
            path: row.path,
            status,
            front_matter: row.front_matter,
            date: row.date,
            filename: row.filename,
        })
    }
}

#[async_trait]
impl PostIndexRepo for PostgresRepositories {
    async fn upsert_by_path(&self, record: PostIndexRecord) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO post_index (path, title, status, front_matter, date, filename)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (path) DO UPDATE SET
                title = EXCLUDED.title,
                status = EXCLUDED.status,
                front_matter = EXCLUDED.front_matter,
                date = EXCLUDED.date,
                filename = EXCLUDED.filename
            "#,
        )
        .bind(&record.path)
        .bind(&record.title)
        .bind(record.status.as_i16())
        .bind(&record.front_matter)
        .bind(record.date)
        .bind(&record.filename)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_by_path(&self, path: &str) -> Result<Option<PostIndexRecord>, RepoError> {
        let row = sqlx::query_as::<_, PostIndexRow>(
            r#"
            SELECT title, path, status, front_matter, date, filename
            FROM post_index
            WHERE path = $1
            "#,
        )
        .bind(path)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(PostIndexRecord::try_from).transpose()
    }

    async fn exists_by_path(&self, path: &str) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM post_index WHERE path = $1)")
            .bind(path)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn delete_by_path(&self, path: &str) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM post_index WHERE path = $1")
            .bind(path)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> Result<u64, RepoError> {
        let result = sqlx::query("DELETE FROM post_index")
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
