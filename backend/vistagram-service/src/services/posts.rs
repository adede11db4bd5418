use crate::db::{NewPost, SocialStore};
use crate::error::{AppError, Result, ResultExt};
use crate::models::{FeedResponse, PostView};
use crate::pagination::PageRequest;
use crate::storage::{ImageStore, ImageUpload};
use std::sync::Arc;
use uuid::Uuid;

/// Fields collected from a create-post form, not yet validated
#[derive(Debug, Default)]
pub struct PostDraft {
    pub image: Option<ImageUpload>,
    pub caption: Option<String>,
    pub location: Option<String>,
}

pub struct PostService {
    store: Arc<dyn SocialStore>,
    images: Arc<dyn ImageStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn SocialStore>, images: Arc<dyn ImageStore>) -> Self {
        Self { store, images }
    }

    /// Upload the image, then persist the post.
    ///
    /// If persisting fails the uploaded image is deleted again. That cleanup is
    /// best-effort: a failed delete is logged and the original error returned.
    pub async fn create_post(&self, user_id: Uuid, draft: PostDraft) -> Result<PostView> {
        let image = draft
            .image
            .ok_or_else(|| AppError::Validation("Image is required".to_string()))?;

        let caption = draft
            .caption
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::Validation("Caption is required".to_string()))?
            .to_string();

        let location = draft
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from);

        let stored = self
            .images
            .upload(&image)
            .await
            .context("Failed to create post")?;

        let created = self
            .store
            .create_post(NewPost {
                user_id,
                caption,
                location,
                image_url: stored.url.clone(),
                image_public_id: stored.public_id.clone(),
            })
            .await;

        match created {
            Ok(post) => {
                tracing::info!(post_id = %post.id, %user_id, "post created");
                Ok(post)
            }
            Err(err) => {
                tracing::warn!(%user_id, public_id = %stored.public_id, error = %err, "post insert failed, removing uploaded image");
                if let Err(cleanup_err) = self.images.delete(&stored.public_id).await {
                    tracing::error!(
                        public_id = %stored.public_id,
                        error = %cleanup_err,
                        "failed to delete orphaned image"
                    );
                }
                Err(err).context("Failed to create post")
            }
        }
    }

    pub async fn feed(&self, page: PageRequest, viewer: Option<Uuid>) -> Result<FeedResponse> {
        let posts = self
            .store
            .list_posts(page.offset(), page.limit, viewer)
            .await
            .context("Failed to fetch posts")?;
        let total = self.store.count_posts().await.context("Failed to fetch posts")?;

        Ok(FeedResponse {
            posts,
            pagination: page.pagination(total),
        })
    }

    pub async fn get_post(&self, post_id: Uuid, viewer: Option<Uuid>) -> Result<PostView> {
        self.store
            .find_post(post_id, viewer)
            .await
            .context("Failed to fetch post")?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
    }
}
