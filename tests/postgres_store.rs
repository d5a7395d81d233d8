//! Integration tests for the queries and guards that only Postgres can answer.
//!
//! Each test gets a fresh database from `#[sqlx::test]`, so `DATABASE_URL`
//! must point at a server that allows `CREATE DATABASE`.
//!
//! Run with: `cargo test --test postgres_store -- --ignored`

use axum::http::StatusCode;
use portfolio_cms::db;
use portfolio_cms::error::ApiError;
use portfolio_cms::routes::blog::{published_post, related_posts};
use portfolio_cms::routes::cms::blog_posts::{BlogPostsPanel, NewBlogPost};
use portfolio_cms::routes::cms::categories::{CategoriesPanel, NewCategory};
use portfolio_cms::routes::cms::Panel;
use portfolio_cms::slug::UNASSIGNED;
use sqlx::PgPool;
use uuid::Uuid;

fn make_post(slug: &str, category: &str, published: bool) -> NewBlogPost {
    NewBlogPost {
        title: slug.to_string(),
        slug: slug.to_string(),
        excerpt: "excerpt".to_string(),
        content: "<p>body</p>".to_string(),
        category: category.to_string(),
        category_color: "#fbbf24".to_string(),
        cover_image: None,
        published,
    }
}

fn make_category(slug: &str) -> NewCategory {
    NewCategory {
        name: slug.to_string(),
        slug: slug.to_string(),
        color: "#12ab34".to_string(),
    }
}

async fn unassigned_id(pool: &PgPool) -> Uuid {
    sqlx::query_scalar("SELECT id FROM categories WHERE slug = $1")
        .bind(UNASSIGNED)
        .fetch_one(pool)
        .await
        .unwrap()
}

// ============================================================================
// Public blog reads
// ============================================================================

#[sqlx::test(migrations = false)]
#[ignore = "needs DATABASE_URL"]
async fn test_unpublished_post_is_not_found(pool: PgPool) {
    db::run_migrations(&pool).await.unwrap();
    BlogPostsPanel::insert(&pool, make_post("draft-post", "rust", false))
        .await
        .unwrap();

    let err = published_post(&pool, "draft-post").await.unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = false)]
#[ignore = "needs DATABASE_URL"]
async fn test_missing_slug_is_not_found(pool: PgPool) {
    db::run_migrations(&pool).await.unwrap();

    let err = published_post(&pool, "never-written").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound("Post")));
}

#[sqlx::test(migrations = false)]
#[ignore = "needs DATABASE_URL"]
async fn test_published_post_lists_related_without_itself_or_drafts(pool: PgPool) {
    db::run_migrations(&pool).await.unwrap();
    for (slug, category, published) in [
        ("current", "rust", true),
        ("sibling", "rust", true),
        ("hidden-sibling", "rust", false),
        ("elsewhere", "go", true),
    ] {
        BlogPostsPanel::insert(&pool, make_post(slug, category, published))
            .await
            .unwrap();
    }

    let post = published_post(&pool, "current").await.unwrap();
    assert!(post.published);

    let related = related_posts(&pool, &post).await.unwrap();
    let slugs: Vec<_> = related.iter().map(|p| p.slug.as_str()).collect();
    assert_eq!(slugs, vec!["sibling"]);
}

// ============================================================================
// Category guards
// ============================================================================

#[sqlx::test(migrations = false)]
#[ignore = "needs DATABASE_URL"]
async fn test_category_in_use_cannot_be_deleted(pool: PgPool) {
    db::run_migrations(&pool).await.unwrap();
    let category = CategoriesPanel::insert(&pool, make_category("rust"))
        .await
        .unwrap();
    for slug in ["first", "second", "third"] {
        BlogPostsPanel::insert(&pool, make_post(slug, "rust", true))
            .await
            .unwrap();
    }

    let err = CategoriesPanel::before_delete(&pool, category.id)
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::CONFLICT);
    match err {
        ApiError::Conflict(msg) => assert!(msg.contains("used by 3 post(s)")),
        other => panic!("unexpected: {other:?}"),
    }
}

#[sqlx::test(migrations = false)]
#[ignore = "needs DATABASE_URL"]
async fn test_unused_category_can_be_deleted(pool: PgPool) {
    db::run_migrations(&pool).await.unwrap();
    let category = CategoriesPanel::insert(&pool, make_category("empty"))
        .await
        .unwrap();

    assert!(CategoriesPanel::before_delete(&pool, category.id).await.is_ok());
}

#[sqlx::test(migrations = false)]
#[ignore = "needs DATABASE_URL"]
async fn test_unassigned_category_is_protected(pool: PgPool) {
    db::run_migrations(&pool).await.unwrap();
    let id = unassigned_id(&pool).await;

    let err = CategoriesPanel::before_delete(&pool, id).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::FORBIDDEN);

    let err = CategoriesPanel::before_update(&pool, id).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::FORBIDDEN);

    let renamed = CategoriesPanel::update(&pool, id, make_category("renamed"))
        .await
        .unwrap();
    assert!(renamed.is_none());
    assert_eq!(unassigned_id(&pool).await, id);
}

#[sqlx::test(migrations = false)]
#[ignore = "needs DATABASE_URL"]
async fn test_unknown_category_is_not_found(pool: PgPool) {
    db::run_migrations(&pool).await.unwrap();

    let err = CategoriesPanel::before_delete(&pool, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = false)]
#[ignore = "needs DATABASE_URL"]
async fn test_migrations_are_idempotent(pool: PgPool) {
    db::run_migrations(&pool).await.unwrap();
    db::run_migrations(&pool).await.unwrap();

    let unassigned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE slug = $1")
        .bind(UNASSIGNED)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(unassigned, 1);
}
