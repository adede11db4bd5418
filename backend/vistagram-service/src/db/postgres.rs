use super::{bookmark_repo, like_repo, post_repo, share_repo, user_repo, NewPost, NewUser, SocialStore};
use crate::error::Result;
use crate::models::{LikeOutcome, PostView, User};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// [`SocialStore`] backed by PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SocialStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        Ok(user_repo::create_user(&self.pool, &user).await?)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(user_repo::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(user_repo::find_by_email(&self.pool, email).await?)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(user_repo::find_by_username(&self.pool, username).await?)
    }

    async fn user_exists(&self, username: &str, email: &str) -> Result<bool> {
        Ok(user_repo::exists(&self.pool, username, email).await?)
    }

    async fn create_post(&self, post: NewPost) -> Result<PostView> {
        Ok(post_repo::create_post(&self.pool, &post).await?)
    }

    async fn list_posts(
        &self,
        offset: i64,
        limit: i64,
        viewer: Option<Uuid>,
    ) -> Result<Vec<PostView>> {
        Ok(post_repo::list_posts(&self.pool, offset, limit, viewer).await?)
    }

    async fn count_posts(&self) -> Result<i64> {
        Ok(post_repo::count_posts(&self.pool).await?)
    }

    async fn find_post(&self, id: Uuid, viewer: Option<Uuid>) -> Result<Option<PostView>> {
        Ok(post_repo::find_post(&self.pool, id, viewer).await?)
    }

    async fn toggle_like(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<LikeOutcome>> {
        like_repo::toggle_like(&self.pool, user_id, post_id).await
    }

    async fn record_share(
        &self,
        post_id: Uuid,
        ip_address: Option<String>,
    ) -> Result<Option<i64>> {
        Ok(share_repo::record_share(&self.pool, post_id, ip_address.as_deref()).await?)
    }

    async fn count_posts_by_user(&self, user_id: Uuid) -> Result<i64> {
        Ok(post_repo::count_posts_by_user(&self.pool, user_id).await?)
    }

    async fn count_likes_received(&self, user_id: Uuid) -> Result<i64> {
        Ok(like_repo::count_likes_received(&self.pool, user_id).await?)
    }

    async fn toggle_bookmark(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<bool>> {
        bookmark_repo::toggle_bookmark(&self.pool, user_id, post_id).await
    }

    async fn list_bookmarked_posts(
        &self,
        user_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<PostView>> {
        Ok(bookmark_repo::list_bookmarked_posts(&self.pool, user_id, offset, limit).await?)
    }

    async fn count_bookmarks(&self, user_id: Uuid) -> Result<i64> {
        Ok(bookmark_repo::count_bookmarks(&self.pool, user_id).await?)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
