use crate::db::SocialStore;
use crate::error::{AppError, Result, ResultExt};
use crate::models::{ProfileResponse, UserResponse};
use std::sync::Arc;

/// No follow relation exists yet; profiles always report zero followers.
const FOLLOWERS_PLACEHOLDER: i64 = 0;

pub struct ProfileService {
    store: Arc<dyn SocialStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn SocialStore>) -> Self {
        Self { store }
    }

    pub async fn get_profile(&self, username: &str) -> Result<ProfileResponse> {
        let user = self
            .store
            .find_user_by_username(username)
            .await
            .context("Failed to fetch user profile")?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let posts_count = self
            .store
            .count_posts_by_user(user.id)
            .await
            .context("Failed to fetch user profile")?;
        let total_likes = self
            .store
            .count_likes_received(user.id)
            .await
            .context("Failed to fetch user profile")?;

        Ok(ProfileResponse {
            user: UserResponse::from(&user),
            posts_count,
            total_likes,
            followers_count: FOLLOWERS_PLACEHOLDER,
        })
    }
}
