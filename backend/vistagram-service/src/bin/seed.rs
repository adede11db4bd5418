/// Populate a development database with demo users, posts and likes.
///
/// Wipes existing content first. Every demo account uses the password
/// `password123`.
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use sqlx::PgPool;
use uuid::Uuid;
use vistagram_service::db::{like_repo, user_repo, NewUser};

const DEMO_PASSWORD: &str = "password123";

const UNSPLASH_IMAGES: [&str; 10] = [
    "https://images.unsplash.com/photo-1469474968028-56623f02e42e?w=1080",
    "https://images.unsplash.com/photo-1506905925346-21bda4d32df4?w=1080",
    "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=1080",
    "https://images.unsplash.com/photo-1494500764479-0c8f2919a3d8?w=1080",
    "https://images.unsplash.com/photo-1515488042361-ee00e0ddd4e4?w=1080",
    "https://images.unsplash.com/photo-1571501679680-de32f1e7aad4?w=1080",
    "https://images.unsplash.com/photo-1476514525535-07fb3b4ae5f1?w=1080",
    "https://images.unsplash.com/photo-1533738363-b7f9aef128ce?w=1080",
    "https://images.unsplash.com/photo-1513475382585-d06e58bcb0e0?w=1080",
    "https://images.unsplash.com/photo-1506252374453-ef5237e7d42f?w=1080",
];

/// (username, caption, location)
const SEED_POSTS: [(&str, &str, &str); 12] = [
    ("wanderlust_amy", "Golden hour over the caldera never gets old", "Santorini, Greece"),
    ("wanderlust_amy", "Found the quietest beach on the island", "Milos, Greece"),
    ("trail_tom", "Summit reached at 5am, worth every step", "Torres del Paine, Chile"),
    ("trail_tom", "Fog rolling through the valley below", "Dolomites, Italy"),
    ("citylights_kai", "Neon nights and ramen stalls", "Shinjuku, Tokyo"),
    ("citylights_kai", "Rooftop views after the rain", "Hong Kong"),
    ("nomad_nina", "Desert camp under a sky full of stars", "Merzouga, Morocco"),
    ("nomad_nina", "Morning market colors", "Marrakech, Morocco"),
    ("coastal_carlos", "Cliffs, wind and endless blue", "Algarve, Portugal"),
    ("coastal_carlos", "Sunset paddle with the locals", "Bali, Indonesia"),
    ("alpine_ada", "First snow on the ridge line", "Zermatt, Switzerland"),
    ("alpine_ada", "Lake so clear you can see every stone", "Lake Bled, Slovenia"),
];

async fn clear(pool: &PgPool) -> Result<()> {
    for table in ["bookmarks", "shares", "likes", "posts", "users"] {
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(pool)
            .await
            .with_context(|| format!("failed to clear {table}"))?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = db_pool::create_pool(db_pool::DbConfig::new("vistagram-seed", database_url))
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    clear(&pool).await?;
    tracing::info!("Existing content cleared");

    let password_hash = crypto_core::hash_password(DEMO_PASSWORD)?;
    let mut rng = rand::thread_rng();

    let mut usernames: Vec<&str> = SEED_POSTS.iter().map(|(username, _, _)| *username).collect();
    usernames.dedup();

    let mut user_ids = Vec::with_capacity(usernames.len());
    for username in &usernames {
        let user = user_repo::create_user(
            &pool,
            &NewUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash: password_hash.clone(),
            },
        )
        .await
        .with_context(|| format!("failed to create user {username}"))?;
        user_ids.push((*username, user.id));
    }

    let mut post_ids = Vec::with_capacity(SEED_POSTS.len());
    for (index, (username, caption, location)) in SEED_POSTS.iter().enumerate() {
        let Some((_, user_id)) = user_ids.iter().find(|(name, _)| name == username) else {
            continue;
        };
        let image_url = UNSPLASH_IMAGES.choose(&mut rng).copied().unwrap_or(UNSPLASH_IMAGES[0]);
        let created_at = Utc::now() - Duration::days(rng.gen_range(0..90));

        let post_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO posts (id, caption, location, image_url, image_public_id, user_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(*caption)
        .bind(*location)
        .bind(image_url)
        .bind(format!("seed/{index}"))
        .bind(*user_id)
        .bind(created_at)
        .fetch_one(&pool)
        .await
        .with_context(|| format!("failed to create post {}", index + 1))?;
        post_ids.push(post_id);
    }

    // Likes go through the regular toggle so counters match the like rows.
    let mut likes = 0;
    for post_id in &post_ids {
        for (_, user_id) in &user_ids {
            if rng.gen_bool(0.4) {
                like_repo::toggle_like(&pool, *user_id, *post_id).await?;
                likes += 1;
            }
        }
    }

    tracing::info!(
        users = user_ids.len(),
        posts = post_ids.len(),
        likes,
        "Seeding complete (password for every account: {DEMO_PASSWORD})"
    );
    Ok(())
}
