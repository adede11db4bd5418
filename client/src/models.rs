use crate::error::ClientError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostAuthor {
    pub id: Uuid,
    pub username: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub caption: String,
    pub location: Option<String>,
    pub image_url: String,
    pub image_public_id: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
    pub shares_count: i64,
    pub is_liked: bool,
    pub user: PostAuthor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPage {
    pub posts: Vec<Post>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct MeResponse {
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct PostEnvelope {
    pub post: Post,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub message: String,
    pub is_liked: bool,
    pub likes_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub message: String,
    pub share_url: String,
    pub shares_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkResponse {
    pub message: String,
    pub is_bookmarked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user: User,
    pub posts_count: i64,
    pub total_likes: i64,
    pub followers_count: i64,
}

pub const MAX_CAPTION_CHARS: usize = 500;
pub const MAX_LOCATION_CHARS: usize = 100;
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Image and fields for a new post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub image: Vec<u8>,
    pub filename: String,
    /// e.g. `image/jpeg`
    pub content_type: String,
    pub caption: String,
    pub location: Option<String>,
}

impl NewPost {
    /// Check the form before it is sent.
    ///
    /// The caption and location length limits exist only here; the server
    /// re-checks the image and a blank caption.
    pub fn validate(&self) -> Result<(), ClientError> {
        fn invalid(message: &str) -> Result<(), ClientError> {
            Err(ClientError::Validation(message.to_string()))
        }

        if self.image.is_empty() {
            return invalid("Please select an image");
        }
        let essence = self
            .content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !ALLOWED_IMAGE_TYPES.contains(&essence.as_str()) {
            return invalid("Only image files (JPG, PNG, WEBP) are allowed");
        }
        if self.image.len() > MAX_IMAGE_BYTES {
            return invalid("File size must be less than 5MB");
        }

        let caption = self.caption.trim();
        if caption.is_empty() {
            return invalid("Please add a caption for your post");
        }
        if caption.chars().count() > MAX_CAPTION_CHARS {
            return invalid("Caption must be at most 500 characters");
        }
        if let Some(location) = &self.location {
            if location.trim().chars().count() > MAX_LOCATION_CHARS {
                return invalid("Location must be at most 100 characters");
            }
        }
        Ok(())
    }
}
