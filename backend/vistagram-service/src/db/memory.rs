use super::{NewPost, NewUser, SocialStore};
use crate::error::{AppError, Result};
use crate::models::{Bookmark, Like, LikeOutcome, Post, PostView, PublicUser, Share, User};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    /// Insertion order; newest last
    posts: Vec<Post>,
    likes: Vec<Like>,
    shares: Vec<Share>,
    /// Insertion order; newest last
    bookmarks: Vec<Bookmark>,
}

impl Inner {
    fn post_mut(&mut self, id: Uuid) -> Option<&mut Post> {
        self.posts.iter_mut().find(|p| p.id == id)
    }

    fn view(&self, post: &Post, viewer: Option<Uuid>) -> Result<PostView> {
        let author = self
            .users
            .iter()
            .find(|u| u.id == post.user_id)
            .ok_or_else(|| AppError::Internal(format!("post {} has no author", post.id)))?;

        let is_liked = viewer.is_some_and(|viewer| {
            self.likes
                .iter()
                .any(|l| l.user_id == viewer && l.post_id == post.id)
        });

        Ok(PostView::new(
            post.clone(),
            PublicUser {
                id: author.id,
                username: author.username.clone(),
                avatar: author.avatar.clone(),
            },
            is_liked,
        ))
    }
}

/// In-process [`SocialStore`].
///
/// One mutex guards every table, so each operation is atomic the way a
/// single database transaction is.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))
    }

    /// Number of like rows referencing `post_id`
    pub fn like_rows(&self, post_id: Uuid) -> usize {
        self.lock()
            .map(|inner| inner.likes.iter().filter(|l| l.post_id == post_id).count())
            .unwrap_or_default()
    }

    /// Number of share rows referencing `post_id`
    pub fn share_rows(&self, post_id: Uuid) -> usize {
        self.lock()
            .map(|inner| inner.shares.iter().filter(|s| s.post_id == post_id).count())
            .unwrap_or_default()
    }
}

impl MemoryStore {
    /// Recorded IP of each share of `post_id`, oldest first
    pub fn share_ips(&self, post_id: Uuid) -> Vec<Option<String>> {
        self.lock()
            .map(|inner| {
                inner
                    .shares
                    .iter()
                    .filter(|s| s.post_id == post_id)
                    .map(|s| s.ip_address.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn window<T: Clone>(items: impl Iterator<Item = T>, offset: i64, limit: i64) -> Vec<T> {
    items
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl SocialStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut inner = self.lock()?;
        if inner
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(AppError::Conflict(
                "User with this email or username already exists".to_string(),
            ));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            avatar: None,
            created_at: Utc::now(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.lock()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.lock()?.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .lock()?
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn user_exists(&self, username: &str, email: &str) -> Result<bool> {
        Ok(self
            .lock()?
            .users
            .iter()
            .any(|u| u.username == username || u.email == email))
    }

    async fn create_post(&self, post: NewPost) -> Result<PostView> {
        let mut inner = self.lock()?;
        if !inner.users.iter().any(|u| u.id == post.user_id) {
            return Err(AppError::Database(format!(
                "posts.user_id references unknown user {}",
                post.user_id
            )));
        }

        let post = Post {
            id: Uuid::new_v4(),
            caption: post.caption,
            location: post.location,
            image_url: post.image_url,
            image_public_id: post.image_public_id,
            user_id: post.user_id,
            created_at: Utc::now(),
            likes_count: 0,
            shares_count: 0,
        };
        inner.posts.push(post.clone());
        inner.view(&post, None)
    }

    async fn list_posts(
        &self,
        offset: i64,
        limit: i64,
        viewer: Option<Uuid>,
    ) -> Result<Vec<PostView>> {
        let inner = self.lock()?;
        window(inner.posts.iter().rev(), offset, limit)
            .into_iter()
            .map(|post| inner.view(post, viewer))
            .collect()
    }

    async fn count_posts(&self) -> Result<i64> {
        Ok(self.lock()?.posts.len() as i64)
    }

    async fn find_post(&self, id: Uuid, viewer: Option<Uuid>) -> Result<Option<PostView>> {
        let inner = self.lock()?;
        inner
            .posts
            .iter()
            .find(|p| p.id == id)
            .map(|post| inner.view(post, viewer))
            .transpose()
    }

    async fn toggle_like(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<LikeOutcome>> {
        let mut inner = self.lock()?;
        if inner.post_mut(post_id).is_none() {
            return Ok(None);
        }

        let existing = inner
            .likes
            .iter()
            .position(|l| l.user_id == user_id && l.post_id == post_id);

        let (liked, delta) = match existing {
            Some(index) => {
                inner.likes.swap_remove(index);
                (false, -1)
            }
            None => {
                inner.likes.push(Like {
                    id: Uuid::new_v4(),
                    user_id,
                    post_id,
                    created_at: Utc::now(),
                });
                (true, 1)
            }
        };

        let post = inner
            .post_mut(post_id)
            .ok_or_else(|| AppError::Internal(format!("post {post_id} vanished")))?;
        post.likes_count += delta;

        Ok(Some(LikeOutcome {
            liked,
            likes_count: post.likes_count,
        }))
    }

    async fn record_share(
        &self,
        post_id: Uuid,
        ip_address: Option<String>,
    ) -> Result<Option<i64>> {
        let mut inner = self.lock()?;
        let Some(post) = inner.post_mut(post_id) else {
            return Ok(None);
        };
        post.shares_count += 1;
        let shares_count = post.shares_count;

        inner.shares.push(Share {
            id: Uuid::new_v4(),
            post_id,
            ip_address,
            created_at: Utc::now(),
        });
        Ok(Some(shares_count))
    }

    async fn count_posts_by_user(&self, user_id: Uuid) -> Result<i64> {
        Ok(self
            .lock()?
            .posts
            .iter()
            .filter(|p| p.user_id == user_id)
            .count() as i64)
    }

    async fn count_likes_received(&self, user_id: Uuid) -> Result<i64> {
        let inner = self.lock()?;
        Ok(inner
            .likes
            .iter()
            .filter(|l| {
                inner
                    .posts
                    .iter()
                    .any(|p| p.id == l.post_id && p.user_id == user_id)
            })
            .count() as i64)
    }

    async fn toggle_bookmark(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<bool>> {
        let mut inner = self.lock()?;
        if inner.post_mut(post_id).is_none() {
            return Ok(None);
        }

        match inner
            .bookmarks
            .iter()
            .position(|b| b.user_id == user_id && b.post_id == post_id)
        {
            Some(index) => {
                inner.bookmarks.remove(index);
                Ok(Some(false))
            }
            None => {
                inner.bookmarks.push(Bookmark {
                    user_id,
                    post_id,
                    created_at: Utc::now(),
                });
                Ok(Some(true))
            }
        }
    }

    async fn list_bookmarked_posts(
        &self,
        user_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<PostView>> {
        let inner = self.lock()?;
        let marked = inner
            .bookmarks
            .iter()
            .rev()
            .filter(|b| b.user_id == user_id);

        window(marked, offset, limit)
            .into_iter()
            .filter_map(|b| inner.posts.iter().find(|p| p.id == b.post_id))
            .map(|post| inner.view(post, Some(user_id)))
            .collect()
    }

    async fn count_bookmarks(&self, user_id: Uuid) -> Result<i64> {
        Ok(self
            .lock()?
            .bookmarks
            .iter()
            .filter(|b| b.user_id == user_id)
            .count() as i64)
    }

    async fn ping(&self) -> Result<()> {
        self.lock().map(|_| ())
    }
}
