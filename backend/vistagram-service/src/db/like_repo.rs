use crate::error::{AppError, Result};
use crate::models::{Like, LikeOutcome};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// A toggle only retries when a concurrent toggle for the same (user, post)
/// inserted between our delete and insert.
const MAX_TOGGLE_ATTEMPTS: u32 = 3;

/// Flip the like for (user, post).
///
/// Each attempt runs in one transaction: delete the existing row if any,
/// otherwise insert keyed on the (user_id, post_id) constraint. The counter moves
/// by exactly the row change that happened, so `likes_count` always equals the
/// number of like rows.
pub async fn toggle_like(
    pool: &PgPool,
    user_id: Uuid,
    post_id: Uuid,
) -> Result<Option<LikeOutcome>> {
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

        let removed: Option<Uuid> = sqlx::query_scalar(
            "DELETE FROM likes WHERE user_id = $1 AND post_id = $2 RETURNING id",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?;

        if removed.is_some() {
            let likes_count = adjust_likes_count(&mut tx, post_id, -1).await?;
            tx.commit().await?;
            return Ok(Some(LikeOutcome {
                liked: false,
                likes_count,
            }));
        }

        let inserted: Option<Like> = sqlx::query_as(
            r#"
            INSERT INTO likes (id, user_id, post_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, post_id) DO NOTHING
            RETURNING id, user_id, post_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?;

        if inserted.is_some() {
            let likes_count = adjust_likes_count(&mut tx, post_id, 1).await?;
            tx.commit().await?;
            return Ok(Some(LikeOutcome {
                liked: true,
                likes_count,
            }));
        }

        // A concurrent toggle committed a like after our delete saw nothing.
        tx.rollback().await?;
        tracing::debug!(%user_id, %post_id, attempt, "like toggle raced, retrying");
    }

    Err(AppError::Internal(format!(
        "like toggle for post {post_id} did not settle after {MAX_TOGGLE_ATTEMPTS} attempts"
    )))
}

async fn adjust_likes_count(
    conn: &mut PgConnection,
    post_id: Uuid,
    delta: i64,
) -> std::result::Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "UPDATE posts SET likes_count = likes_count + $2 WHERE id = $1 RETURNING likes_count",
    )
    .bind(post_id)
    .bind(delta)
    .fetch_one(&mut *conn)
    .await
}

/// Total like rows across every post owned by `user_id`
pub async fn count_likes_received(
    pool: &PgPool,
    user_id: Uuid,
) -> std::result::Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM likes l
        JOIN posts p ON p.id = l.post_id
        WHERE p.user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}
