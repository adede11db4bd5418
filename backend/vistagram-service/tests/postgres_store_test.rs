/// PgStore tests against a real database.
///
/// Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.
use futures::future::join_all;
use std::sync::Arc;
use uuid::Uuid;
use vistagram_service::db::{NewPost, NewUser, PgStore, SocialStore};
use vistagram_service::error::AppError;

async fn store() -> PgStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = db_pool::create_pool(db_pool::DbConfig::new("vistagram-test", url))
        .await
        .expect("connect");
    sqlx::migrate!("./migrations").run(&pool).await.expect("migrate");
    PgStore::new(pool)
}

async fn new_user(store: &PgStore) -> Uuid {
    let tag = &Uuid::new_v4().simple().to_string()[..12];
    store
        .create_user(NewUser {
            username: format!("u{tag}"),
            email: format!("{tag}@example.com"),
            password_hash: "hash".into(),
        })
        .await
        .unwrap()
        .id
}

async fn new_post(store: &PgStore, user_id: Uuid) -> Uuid {
    store
        .create_post(NewPost {
            user_id,
            caption: "Postgres".into(),
            location: Some("Test".into()),
            image_url: "https://images.vistagram.test/pg.jpg".into(),
            image_public_id: "vistagram/pg".into(),
        })
        .await
        .unwrap()
        .id
}

async fn like_rows(store: &PgStore, post_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE post_id = $1")
        .bind(post_id)
        .fetch_one(store.pool())
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_pg_like_toggle_round_trip() {
    let store = store().await;
    let user = new_user(&store).await;
    let post = new_post(&store, user).await;

    let liked = store.toggle_like(user, post).await.unwrap().unwrap();
    assert!(liked.liked);
    assert_eq!(liked.likes_count, 1);

    let unliked = store.toggle_like(user, post).await.unwrap().unwrap();
    assert!(!unliked.liked);
    assert_eq!(unliked.likes_count, 0);
    assert_eq!(like_rows(&store, post).await, 0);

    assert!(store.toggle_like(user, Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_pg_concurrent_toggles_match_rows() {
    let store = Arc::new(store().await);
    let author = new_user(&store).await;
    let post = new_post(&store, author).await;

    let mut users = Vec::new();
    for _ in 0..8 {
        users.push(new_user(&store).await);
    }

    let toggles = users.iter().flat_map(|user| {
        let store = store.clone();
        let user = *user;
        // Three toggles per user: each ends up liked.
        (0..3).map(move |_| {
            let store = store.clone();
            async move { store.toggle_like(user, post).await }
        })
    });
    for result in join_all(toggles).await {
        result.unwrap();
    }

    let view = store.find_post(post, None).await.unwrap().unwrap();
    assert_eq!(view.likes_count, like_rows(&store, post).await);
    assert_eq!(view.likes_count, users.len() as i64);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_pg_duplicate_user_conflicts() {
    let store = store().await;
    let tag = &Uuid::new_v4().simple().to_string()[..12];
    let user = NewUser {
        username: format!("d{tag}"),
        email: format!("d{tag}@example.com"),
        password_hash: "hash".into(),
    };
    store.create_user(user.clone()).await.unwrap();

    match store.create_user(user).await {
        Err(AppError::Conflict(msg)) => {
            assert_eq!(msg, "User with this email or username already exists")
        }
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_pg_share_and_bookmark() {
    let store = store().await;
    let user = new_user(&store).await;
    let post = new_post(&store, user).await;

    assert_eq!(store.record_share(post, Some("203.0.113.1".into())).await.unwrap(), Some(1));
    assert_eq!(store.record_share(post, None).await.unwrap(), Some(2));
    assert_eq!(store.record_share(Uuid::new_v4(), None).await.unwrap(), None);

    assert_eq!(store.toggle_bookmark(user, post).await.unwrap(), Some(true));
    assert_eq!(store.count_bookmarks(user).await.unwrap(), 1);
    let bookmarked = store.list_bookmarked_posts(user, 0, 10).await.unwrap();
    assert_eq!(bookmarked[0].id, post);
    assert_eq!(store.toggle_bookmark(user, post).await.unwrap(), Some(false));

    store.ping().await.unwrap();
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_pg_concurrent_bookmark_toggles_alternate() {
    let store = Arc::new(store().await);
    let user = new_user(&store).await;
    let post = new_post(&store, user).await;

    let toggles = (0..9).map(|_| {
        let store = store.clone();
        async move { store.toggle_bookmark(user, post).await }
    });
    let outcomes: Vec<bool> = join_all(toggles)
        .await
        .into_iter()
        .map(|result| result.unwrap().unwrap())
        .collect();

    // Each call flips the state, so reported additions and removals differ by
    // exactly the rows left behind.
    let added = outcomes.iter().filter(|now_bookmarked| **now_bookmarked).count() as i64;
    let removed = outcomes.len() as i64 - added;
    let rows = store.count_bookmarks(user).await.unwrap();
    assert_eq!(added - removed, rows);
    assert_eq!(rows, 1);
}
