//! Typed client for the `/api` REST surface.

use crate::error::{ClientError, Result};
use crate::models::{
    AuthResponse, BookmarkResponse, FeedPage, LikeResponse, MeResponse, NewPost, Post,
    PostEnvelope, Profile, ShareResponse, User,
};
use crate::session::Session;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

/// What the feed needs from the server; lets feed state run against a fake.
#[async_trait]
pub trait FeedApi: Send + Sync {
    async fn fetch_page(&self, page: i64, limit: i64) -> Result<FeedPage>;
    async fn toggle_like(&self, post_id: Uuid) -> Result<LikeResponse>;
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Option<Session>,
}

impl ApiClient {
    /// `base_url` is the server origin, e.g. `http://localhost:5000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: None,
        }
    }

    /// Attach a session; its token is sent on every request and login or
    /// register responses are saved into it.
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.as_ref().and_then(Session::token) {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.authorized(builder).send().await?;
        decode(response).await
    }

    fn remember(&self, auth: &AuthResponse) -> Result<()> {
        if let Some(session) = &self.session {
            session.save(auth)?;
        }
        Ok(())
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<AuthResponse> {
        let auth: AuthResponse = self
            .send(self.http.post(self.url("/auth/register")).json(&json!({
                "username": username,
                "email": email,
                "password": password,
            })))
            .await?;
        self.remember(&auth)?;
        Ok(auth)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let auth: AuthResponse = self
            .send(self.http.post(self.url("/auth/login")).json(&json!({
                "email": email,
                "password": password,
            })))
            .await?;
        self.remember(&auth)?;
        Ok(auth)
    }

    pub async fn me(&self) -> Result<User> {
        let me: MeResponse = self.send(self.http.get(self.url("/auth/me"))).await?;
        Ok(me.user)
    }

    /// Upload a post. The form is validated first and nothing is sent if it fails.
    pub async fn create_post(&self, post: NewPost) -> Result<Post> {
        post.validate()?;

        let caption = post.caption.trim().to_string();
        let location = post
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from);

        let image = Part::bytes(post.image)
            .file_name(post.filename)
            .mime_str(&post.content_type)?;
        let mut form = Form::new().part("image", image).text("caption", caption);
        if let Some(location) = location {
            form = form.text("location", location);
        }

        let created: PostEnvelope = self
            .send(self.http.post(self.url("/posts")).multipart(form))
            .await?;
        Ok(created.post)
    }

    pub async fn list_posts(&self, page: i64, limit: i64) -> Result<FeedPage> {
        self.send(
            self.http
                .get(self.url("/posts"))
                .query(&[("page", page), ("limit", limit)]),
        )
        .await
    }

    pub async fn get_post(&self, post_id: Uuid) -> Result<Post> {
        let found: PostEnvelope = self
            .send(self.http.get(self.url(&format!("/posts/{post_id}"))))
            .await?;
        Ok(found.post)
    }

    pub async fn toggle_like(&self, post_id: Uuid) -> Result<LikeResponse> {
        self.send(self.http.post(self.url(&format!("/posts/{post_id}/like"))))
            .await
    }

    pub async fn share_post(&self, post_id: Uuid) -> Result<ShareResponse> {
        self.send(self.http.post(self.url(&format!("/posts/{post_id}/share"))))
            .await
    }

    pub async fn get_profile(&self, username: &str) -> Result<Profile> {
        self.send(self.http.get(self.url(&format!("/users/{username}"))))
            .await
    }

    pub async fn toggle_bookmark(&self, post_id: Uuid) -> Result<BookmarkResponse> {
        self.send(self.http.post(self.url(&format!("/posts/{post_id}/bookmark"))))
            .await
    }

    pub async fn list_bookmarks(&self, page: i64, limit: i64) -> Result<FeedPage> {
        self.send(
            self.http
                .get(self.url("/bookmarks"))
                .query(&[("page", page), ("limit", limit)]),
        )
        .await
    }
}

#[async_trait]
impl FeedApi for ApiClient {
    async fn fetch_page(&self, page: i64, limit: i64) -> Result<FeedPage> {
        self.list_posts(page, limit).await
    }

    async fn toggle_like(&self, post_id: Uuid) -> Result<LikeResponse> {
        ApiClient::toggle_like(self, post_id).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await.unwrap_or_default();
    Err(api_error(status.as_u16(), &body))
}

/// Build the error for a non-2xx response, preferring the server's `error` field.
fn api_error(status: u16, body: &str) -> ClientError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or_else(|| body.trim().to_string());

    tracing::debug!(status, %message, "API request failed");
    ClientError::Api { status, message }
}
