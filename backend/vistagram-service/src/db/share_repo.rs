use crate::models::Share;
use sqlx::PgPool;
use uuid::Uuid;

/// Insert a share row and bump `shares_count` in one transaction.
///
/// Returns the new share count, or `None` if the post does not exist.
pub async fn record_share(
    pool: &PgPool,
    post_id: Uuid,
    ip_address: Option<&str>,
) -> Result<Option<i64>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let shares_count: Option<i64> = sqlx::query_scalar(
        "UPDATE posts SET shares_count = shares_count + 1 WHERE id = $1 RETURNING shares_count",
    )
    .bind(post_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(shares_count) = shares_count else {
        tx.rollback().await?;
        return Ok(None);
    };

    let share = sqlx::query_as::<_, Share>(
        r#"
        INSERT INTO shares (id, post_id, ip_address)
        VALUES ($1, $2, $3)
        RETURNING id, post_id, ip_address, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(post_id)
    .bind(ip_address)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::debug!(share_id = %share.id, %post_id, "share recorded");
    Ok(Some(shares_count))
}
