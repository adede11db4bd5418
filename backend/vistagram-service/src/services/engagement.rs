use crate::db::SocialStore;
use crate::error::{AppError, Result, ResultExt};
use crate::models::{BookmarkResponse, FeedResponse, LikeResponse, ShareResponse};
use crate::pagination::PageRequest;
use std::sync::Arc;
use uuid::Uuid;

/// Likes, shares and bookmarks
pub struct EngagementService {
    store: Arc<dyn SocialStore>,
    client_url: String,
}

impl EngagementService {
    pub fn new(store: Arc<dyn SocialStore>, client_url: impl Into<String>) -> Self {
        Self {
            store,
            client_url: client_url.into(),
        }
    }

    pub async fn toggle_like(&self, user_id: Uuid, post_id: Uuid) -> Result<LikeResponse> {
        let outcome = self
            .store
            .toggle_like(user_id, post_id)
            .await
            .context("Failed to toggle like")?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        tracing::debug!(%user_id, %post_id, liked = outcome.liked, likes_count = outcome.likes_count, "like toggled");

        Ok(LikeResponse {
            message: if outcome.liked { "Post liked" } else { "Post unliked" }.to_string(),
            is_liked: outcome.liked,
            likes_count: outcome.likes_count,
        })
    }

    pub async fn share(&self, post_id: Uuid, ip_address: Option<String>) -> Result<ShareResponse> {
        let shares_count = self
            .store
            .record_share(post_id, ip_address)
            .await
            .context("Failed to share post")?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        Ok(ShareResponse {
            message: "Post shared successfully".to_string(),
            share_url: self.share_url(post_id),
            shares_count,
        })
    }

    pub fn share_url(&self, post_id: Uuid) -> String {
        crate::config::share_url(&self.client_url, post_id)
    }

    pub async fn toggle_bookmark(&self, user_id: Uuid, post_id: Uuid) -> Result<BookmarkResponse> {
        let bookmarked = self
            .store
            .toggle_bookmark(user_id, post_id)
            .await
            .context("Failed to toggle bookmark")?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        Ok(BookmarkResponse {
            message: if bookmarked { "Post bookmarked" } else { "Bookmark removed" }.to_string(),
            is_bookmarked: bookmarked,
        })
    }

    pub async fn bookmarks(&self, user_id: Uuid, page: PageRequest) -> Result<FeedResponse> {
        let posts = self
            .store
            .list_bookmarked_posts(user_id, page.offset(), page.limit)
            .await
            .context("Failed to fetch bookmarks")?;
        let total = self
            .store
            .count_bookmarks(user_id)
            .await
            .context("Failed to fetch bookmarks")?;

        Ok(FeedResponse {
            posts,
            pagination: page.pagination(total),
        })
    }
}
