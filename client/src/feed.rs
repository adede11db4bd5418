//! Client feed state.
//!
//! [`FeedState`] is the synchronous core: paging, de-duplication, stale
//! response detection and optimistic likes. [`Feed`] drives it against a
//! [`FeedApi`], never holding the state lock across a request.

use crate::api::FeedApi;
use crate::error::{ClientError, Result};
use crate::models::{FeedPage, LikeResponse, Post};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

pub const PAGE_SIZE: i64 = 10;

/// Issued when a page load starts; the response is applied only if no
/// refresh happened in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    pub page: i64,
}

/// Like state before an optimistic flip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LikeSnapshot {
    is_liked: bool,
    likes_count: i64,
}

#[derive(Debug, Default)]
pub struct FeedState {
    posts: Vec<Post>,
    page: i64,
    has_more: bool,
    generation: u64,
    pending_likes: HashMap<Uuid, LikeSnapshot>,
}

impl FeedState {
    pub fn new() -> Self {
        Self {
            has_more: true,
            ..Self::default()
        }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn post(&self, post_id: Uuid) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == post_id)
    }

    /// Last page applied; 0 before the first load
    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_like_pending(&self, post_id: Uuid) -> bool {
        self.pending_likes.contains_key(&post_id)
    }

    /// Start loading page 1. Invalidates every ticket issued before.
    pub fn begin_refresh(&mut self) -> LoadTicket {
        self.generation += 1;
        LoadTicket {
            generation: self.generation,
            page: 1,
        }
    }

    /// Start loading the page after the last one applied, if there is one.
    pub fn begin_next_page(&self) -> Option<LoadTicket> {
        if !self.has_more {
            return None;
        }
        Some(LoadTicket {
            generation: self.generation,
            page: self.page + 1,
        })
    }

    /// Apply a fetched page. Returns `false` when the ticket is stale and the
    /// page was dropped.
    pub fn apply_page(&mut self, ticket: LoadTicket, page: FeedPage) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(page = ticket.page, "dropping superseded feed response");
            return false;
        }

        if ticket.page <= 1 {
            self.posts.clear();
            self.pending_likes.clear();
        }

        let mut known: HashSet<Uuid> = self.posts.iter().map(|p| p.id).collect();
        for post in page.posts {
            if known.insert(post.id) {
                self.posts.push(post);
            }
        }

        self.page = ticket.page;
        self.has_more = page.pagination.has_more;
        true
    }

    /// Flip the like locally and mark it pending.
    pub fn begin_like(&mut self, post_id: Uuid) -> Result<()> {
        if self.pending_likes.contains_key(&post_id) {
            return Err(ClientError::LikePending(post_id));
        }
        let post = self
            .posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or(ClientError::UnknownPost(post_id))?;

        let snapshot = LikeSnapshot {
            is_liked: post.is_liked,
            likes_count: post.likes_count,
        };
        post.is_liked = !post.is_liked;
        post.likes_count = if post.is_liked {
            post.likes_count + 1
        } else {
            (post.likes_count - 1).max(0)
        };

        self.pending_likes.insert(post_id, snapshot);
        Ok(())
    }

    /// Replace the optimistic guess with the server's values.
    pub fn confirm_like(&mut self, post_id: Uuid, response: &LikeResponse) {
        self.pending_likes.remove(&post_id);
        if let Some(post) = self.posts.iter_mut().find(|p| p.id == post_id) {
            post.is_liked = response.is_liked;
            post.likes_count = response.likes_count;
        }
    }

    /// Restore the values from before the optimistic flip.
    pub fn revert_like(&mut self, post_id: Uuid) {
        let Some(snapshot) = self.pending_likes.remove(&post_id) else {
            return;
        };
        if let Some(post) = self.posts.iter_mut().find(|p| p.id == post_id) {
            post.is_liked = snapshot.is_liked;
            post.likes_count = snapshot.likes_count;
        }
    }
}

pub struct Feed<A> {
    api: A,
    state: Mutex<FeedState>,
}

impl<A: FeedApi> Feed<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: Mutex::new(FeedState::new()),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn state(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `f` against the current state.
    pub fn with_state<R>(&self, f: impl FnOnce(&FeedState) -> R) -> R {
        f(&self.state())
    }

    pub fn posts(&self) -> Vec<Post> {
        self.state().posts().to_vec()
    }

    /// Reload page 1, replacing the list. Returns whether the response was applied.
    pub async fn refresh(&self) -> Result<bool> {
        let ticket = self.state().begin_refresh();
        self.load(ticket).await
    }

    /// Append the next page. `Ok(false)` when there is nothing more or the
    /// response was superseded by a refresh.
    pub async fn load_more(&self) -> Result<bool> {
        let Some(ticket) = self.state().begin_next_page() else {
            return Ok(false);
        };
        self.load(ticket).await
    }

    async fn load(&self, ticket: LoadTicket) -> Result<bool> {
        let page = self.api.fetch_page(ticket.page, PAGE_SIZE).await?;
        Ok(self.state().apply_page(ticket, page))
    }

    /// Optimistically toggle the like, then reconcile with the server.
    ///
    /// On failure the previous like state is restored and the error returned.
    pub async fn toggle_like(&self, post_id: Uuid) -> Result<LikeResponse> {
        self.state().begin_like(post_id)?;

        match self.api.toggle_like(post_id).await {
            Ok(response) => {
                self.state().confirm_like(post_id, &response);
                Ok(response)
            }
            Err(e) => {
                tracing::warn!(%post_id, error = %e, "like failed, reverting");
                self.state().revert_like(post_id);
                Err(e)
            }
        }
    }
}
