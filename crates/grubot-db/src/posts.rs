use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};
use grubot_models::Post;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: i64,
    pub owner: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            owner: row.owner,
            text: row.text,
            created_at: row.created_at,
        }
    }
}

pub async fn create_post(pool: &DbPool, owner: &str, text: &str) -> Result<PostRow, DbError> {
    tracing::debug!(owner, "creating post");
    let row = sqlx::query_as::<_, PostRow>(
        "INSERT INTO posts (owner, text) VALUES (?1, ?2)
         RETURNING id, owner, text, created_at",
    )
    .bind(owner)
    .bind(text)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn get_post(pool: &DbPool, id: i64) -> Result<Option<PostRow>, DbError> {
    let row = sqlx::query_as::<_, PostRow>(
        "SELECT id, owner, text, created_at FROM posts WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Oldest first.
pub async fn get_all_posts(pool: &DbPool) -> Result<Vec<PostRow>, DbError> {
    let rows = sqlx::query_as::<_, PostRow>(
        "SELECT id, owner, text, created_at FROM posts ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn delete_post(pool: &DbPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM posts WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
