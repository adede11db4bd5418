use crate::db::NewPost;
use crate::models::{Post, PostView, PublicUser};
use sqlx::PgPool;
use uuid::Uuid;

/// Post joined with its author and the viewer's like state
#[derive(Debug, sqlx::FromRow)]
pub struct PostRow {
    #[sqlx(flatten)]
    pub post: Post,
    pub author_username: String,
    pub author_avatar: Option<String>,
    pub is_liked: bool,
}

impl From<PostRow> for PostView {
    fn from(row: PostRow) -> Self {
        let author = PublicUser {
            id: row.post.user_id,
            username: row.author_username,
            avatar: row.author_avatar,
        };
        PostView::new(row.post, author, row.is_liked)
    }
}

pub async fn create_post(pool: &PgPool, new_post: &NewPost) -> Result<PostView, sqlx::Error> {
    let row = sqlx::query_as::<_, PostRow>(
        r#"
        WITH inserted AS (
            INSERT INTO posts (id, caption, location, image_url, image_public_id, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
        )
        SELECT i.id, i.caption, i.location, i.image_url, i.image_public_id, i.user_id,
               i.created_at, i.likes_count, i.shares_count,
               u.username AS author_username, u.avatar AS author_avatar,
               FALSE AS is_liked
        FROM inserted i
        JOIN users u ON u.id = i.user_id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&new_post.caption)
    .bind(&new_post.location)
    .bind(&new_post.image_url)
    .bind(&new_post.image_public_id)
    .bind(new_post.user_id)
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

pub async fn list_posts(
    pool: &PgPool,
    offset: i64,
    limit: i64,
    viewer: Option<Uuid>,
) -> Result<Vec<PostView>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PostRow>(
        r#"
        SELECT p.id, p.caption, p.location, p.image_url, p.image_public_id, p.user_id,
               p.created_at, p.likes_count, p.shares_count,
               u.username AS author_username, u.avatar AS author_avatar,
               EXISTS (
                   SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = $3
               ) AS is_liked
        FROM posts p
        JOIN users u ON u.id = p.user_id
        ORDER BY p.created_at DESC, p.id DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .bind(viewer)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(PostView::from).collect())
}

pub async fn count_posts(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
        .fetch_one(pool)
        .await
}

pub async fn find_post(
    pool: &PgPool,
    id: Uuid,
    viewer: Option<Uuid>,
) -> Result<Option<PostView>, sqlx::Error> {
    let row = sqlx::query_as::<_, PostRow>(
        r#"
        SELECT p.id, p.caption, p.location, p.image_url, p.image_public_id, p.user_id,
               p.created_at, p.likes_count, p.shares_count,
               u.username AS author_username, u.avatar AS author_avatar,
               EXISTS (
                   SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = $2
               ) AS is_liked
        FROM posts p
        JOIN users u ON u.id = p.user_id
        WHERE p.id = $1
        "#,
    )
    .bind(id)
    .bind(viewer)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(PostView::from))
}

pub async fn count_posts_by_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
}
