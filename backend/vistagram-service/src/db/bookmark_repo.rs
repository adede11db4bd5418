use crate::db::post_repo::PostRow;
use crate::error::{AppError, Result};
use crate::models::{Bookmark, PostView};
use sqlx::PgPool;
use uuid::Uuid;

const MAX_TOGGLE_ATTEMPTS: u32 = 3;

/// Flip the bookmark for (user, post).
///
/// Returns `Some(true)` if now bookmarked, `Some(false)` if removed, `None` if
/// the post is missing. An insert that loses to a concurrent toggle is rolled
/// back and retried, so every call alternates the state.
pub async fn toggle_bookmark(
    pool: &PgPool,
    user_id: Uuid,
    post_id: Uuid,
) -> Result<Option<bool>> {
    for attempt in 1..=MAX_TOGGLE_ATTEMPTS {
        let mut tx = pool.begin().await?;

        let post_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
                .bind(post_id)
                .fetch_one(&mut *tx)
                .await?;
        if !post_exists {
            tx.rollback().await?;
            return Ok(None);
        }

        let removed = sqlx::query("DELETE FROM bookmarks WHERE user_id = $1 AND post_id = $2")
            .bind(user_id)
            .bind(post_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if removed {
            tx.commit().await?;
            return Ok(Some(false));
        }

        let inserted: Option<Bookmark> = sqlx::query_as(
            r#"
            INSERT INTO bookmarks (user_id, post_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, post_id) DO NOTHING
            RETURNING user_id, post_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?;

        if inserted.is_some() {
            tx.commit().await?;
            return Ok(Some(true));
        }

        // A concurrent toggle committed a bookmark after our delete saw nothing.
        tx.rollback().await?;
        tracing::debug!(%user_id, %post_id, attempt, "bookmark toggle raced, retrying");
    }

    Err(AppError::Internal(format!(
        "bookmark toggle for post {post_id} did not settle after {MAX_TOGGLE_ATTEMPTS} attempts"
    )))
}

pub async fn list_bookmarked_posts(
    pool: &PgPool,
    user_id: Uuid,
    offset: i64,
    limit: i64,
) -> std::result::Result<Vec<PostView>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PostRow>(
        r#"
        SELECT p.id, p.caption, p.location, p.image_url, p.image_public_id, p.user_id,
               p.created_at, p.likes_count, p.shares_count,
               u.username AS author_username, u.avatar AS author_avatar,
               EXISTS (
                   SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = $1
               ) AS is_liked
        FROM bookmarks b
        JOIN posts p ON p.id = b.post_id
        JOIN users u ON u.id = p.user_id
        WHERE b.user_id = $1
        ORDER BY b.created_at DESC, p.id DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(PostView::from).collect())
}

pub async fn count_bookmarks(
    pool: &PgPool,
    user_id: Uuid,
) -> std::result::Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookmarks WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
}
