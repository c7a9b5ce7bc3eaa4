//! Pinned channel posts.

use grubot_db::DbPool;
use grubot_models::Post;

use crate::error::CoreError;

pub async fn add_post(pool: &DbPool, owner: &str, text: &str) -> Result<Post, CoreError> {
    Ok(grubot_db::posts::create_post(pool, owner, text).await?.into())
}

pub async fn remove_post(pool: &DbPool, id: i64) -> Result<(), CoreError> {
    grubot_db::posts::delete_post(pool, id).await?;
    tracing::info!(post_id = id, "post deleted");
    Ok(())
}

pub async fn get_post(pool: &DbPool, id: i64) -> Result<Option<Post>, CoreError> {
    Ok(grubot_db::posts::get_post(pool, id).await?.map(Post::from))
}

/// In insertion order.
pub async fn list_posts(pool: &DbPool) -> Result<Vec<Post>, CoreError> {
    let rows = grubot_db::posts::get_all_posts(pool).await?;
    Ok(rows.into_iter().map(Post::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn remove_missing_post_is_not_found() {
        let pool = grubot_db::memory_pool().await.unwrap();
        let post = add_post(&pool, "Ada", "hi").await.unwrap();
        assert_eq!(get_post(&pool, post.id).await.unwrap().unwrap().text, "hi");
        remove_post(&pool, post.id).await.unwrap();
        assert!(matches!(
            remove_post(&pool, post.id).await,
            Err(CoreError::NotFound)
        ));
        assert!(list_posts(&pool).await.unwrap().is_empty());
    }
}
