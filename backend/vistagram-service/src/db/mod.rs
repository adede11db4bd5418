//! Persistence layer.
//!
//! [`SocialStore`] is the seam between services and storage. [`PgStore`] is the
//! production implementation; [`MemoryStore`] keeps the same invariants in
//! process memory for tests and local runs.

pub mod bookmark_repo;
pub mod like_repo;
pub mod memory;
pub mod post_repo;
pub mod postgres;
pub mod share_repo;
pub mod user_repo;

use crate::error::Result;
use crate::models::{LikeOutcome, PostView, User};
use async_trait::async_trait;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: Uuid,
    pub caption: String,
    pub location: Option<String>,
    pub image_url: String,
    pub image_public_id: String,
}

#[async_trait]
pub trait SocialStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;
    /// Whether either the username or the email is already registered
    async fn user_exists(&self, username: &str, email: &str) -> Result<bool>;

    async fn create_post(&self, post: NewPost) -> Result<PostView>;
    /// Newest first; `is_liked` reflects `viewer` when present
    async fn list_posts(&self, offset: i64, limit: i64, viewer: Option<Uuid>)
        -> Result<Vec<PostView>>;
    async fn count_posts(&self) -> Result<i64>;
    async fn find_post(&self, id: Uuid, viewer: Option<Uuid>) -> Result<Option<PostView>>;

    /// Flip the caller's like and adjust the counter in one atomic step.
    /// `None` when the post does not exist.
    async fn toggle_like(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<LikeOutcome>>;
    /// Record a share and return the new share count. `None` when the post does not exist.
    async fn record_share(&self, post_id: Uuid, ip_address: Option<String>)
        -> Result<Option<i64>>;

    async fn count_posts_by_user(&self, user_id: Uuid) -> Result<i64>;
    /// Like rows referencing any of the user's posts
    async fn count_likes_received(&self, user_id: Uuid) -> Result<i64>;

    /// `Some(true)` when the bookmark now exists, `None` when the post does not exist.
    async fn toggle_bookmark(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<bool>>;
    /// Most recently bookmarked first
    async fn list_bookmarked_posts(&self, user_id: Uuid, offset: i64, limit: i64)
        -> Result<Vec<PostView>>;
    async fn count_bookmarks(&self, user_id: Uuid) -> Result<i64>;

    async fn ping(&self) -> Result<()>;
}
