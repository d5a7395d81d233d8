/**
 * Blog Routes
 * Public read endpoints for published posts and categories
 */
use axum::{
    extract::{Path, Query},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::db::{
    self,
    models::{BlogPost, BlogPostSummary, Category},
};
use crate::error::{ApiError, ApiResult};
use crate::slug::is_valid_slug;

/// Most related posts shown under an article
pub const RELATED_LIMIT: usize = 3;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for GET /api/blog
#[derive(Debug, Default, Deserialize)]
pub struct BlogListQuery {
    pub category: Option<String>,
}

impl BlogListQuery {
    fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Response for GET /api/blog/{slug}
#[derive(Debug, Serialize)]
pub struct BlogPostResponse {
    pub post: BlogPost,
    pub related: Vec<BlogPostSummary>,
}

/// Drop the current post from same-category candidates and keep the newest few.
pub fn pick_related(candidates: Vec<BlogPostSummary>, current_slug: &str) -> Vec<BlogPostSummary> {
    candidates
        .into_iter()
        .filter(|p| p.slug != current_slug)
        .take(RELATED_LIMIT)
        .collect()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/blog - Published posts, newest first
pub async fn list_posts(Query(query): Query<BlogListQuery>) -> ApiResult<Json<Vec<BlogPostSummary>>> {
    let pool = db::require_pool()?;

    let posts = sqlx::query_as::<_, BlogPostSummary>(
        r#"
        SELECT id, title, slug, excerpt, category, category_color, cover_image, created_at
        FROM blog_posts
        WHERE published = true AND ($1::TEXT IS NULL OR category = $1)
        ORDER BY created_at DESC
        "#,
    )
    .bind(query.category())
    .fetch_all(pool.as_ref())
    .await?;

    Ok(Json(posts))
}

/// Published post by slug; drafts and unknown slugs are both `NotFound`.
pub async fn published_post(pool: &PgPool, slug: &str) -> ApiResult<BlogPost> {
    if !is_valid_slug(slug) {
        return Err(ApiError::NotFound("Post"));
    }

    sqlx::query_as::<_, BlogPost>(
        r#"
        SELECT id, title, slug, excerpt, content, category, category_color,
               cover_image, published, created_at, updated_at
        FROM blog_posts
        WHERE slug = $1 AND published = true
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?
    .ok_or(ApiError::NotFound("Post"))
}

/// Newest published posts sharing the category of `post`, excluding it.
pub async fn related_posts(pool: &PgPool, post: &BlogPost) -> ApiResult<Vec<BlogPostSummary>> {
    // One extra row so the current post can be filtered out and still leave enough.
    let candidates = sqlx::query_as::<_, BlogPostSummary>(
        r#"
        SELECT id, title, slug, excerpt, category, category_color, cover_image, created_at
        FROM blog_posts
        WHERE published = true AND category = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(&post.category)
    .bind(RELATED_LIMIT as i64 + 1)
    .fetch_all(pool)
    .await?;

    Ok(pick_related(candidates, &post.slug))
}

/// GET /api/blog/{slug} - One published post and its related posts
pub async fn get_post(Path(slug): Path<String>) -> ApiResult<Json<BlogPostResponse>> {
    if !is_valid_slug(&slug) {
        return Err(ApiError::NotFound("Post"));
    }

    let pool = db::require_pool()?;
    let post = published_post(&pool, &slug).await?;
    let related = related_posts(&pool, &post).await?;
    Ok(Json(BlogPostResponse { post, related }))
}

/// GET /api/categories - Every category, by name
pub async fn list_categories() -> ApiResult<Json<Vec<Category>>> {
    let pool = db::require_pool()?;

    let categories = sqlx::query_as::<_, Category>(
        "SELECT id, name, slug, color, created_at FROM categories ORDER BY name ASC",
    )
    .fetch_all(pool.as_ref())
    .await?;

    Ok(Json(categories))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode, routing::get, Router};
    use chrono::{Duration, Utc};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn summary(slug: &str, age_days: i64) -> BlogPostSummary {
        BlogPostSummary {
            id: Uuid::new_v4(),
            title: slug.to_string(),
            slug: slug.to_string(),
            excerpt: String::new(),
            category: "rust".to_string(),
            category_color: "#fbbf24".to_string(),
            cover_image: None,
            created_at: Utc::now() - Duration::days(age_days),
        }
    }

    #[test]
    fn test_pick_related_excludes_current_post() {
        let candidates = vec![summary("a", 1), summary("current", 2), summary("b", 3)];
        let related = pick_related(candidates, "current");
        let slugs: Vec<_> = related.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["a", "b"]);
    }

    #[test]
    fn test_pick_related_caps_at_limit_and_keeps_order() {
        let candidates = vec![
            summary("a", 1),
            summary("b", 2),
            summary("c", 3),
            summary("d", 4),
        ];
        let related = pick_related(candidates, "elsewhere");
        assert_eq!(related.len(), RELATED_LIMIT);
        assert_eq!(related[0].slug, "a");
        assert_eq!(related[2].slug, "c");
    }

    #[test]
    fn test_blank_category_filter_is_ignored() {
        let query = BlogListQuery {
            category: Some("  ".to_string()),
        };
        assert!(query.category().is_none());
        let query = BlogListQuery {
            category: Some("ai-related".to_string()),
        };
        assert_eq!(query.category(), Some("ai-related"));
    }

    #[tokio::test]
    async fn test_malformed_slug_is_not_found() {
        let app = Router::new().route("/api/blog/{slug}", get(get_post));
        let response = app
            .oneshot(
                Request::get("/api/blog/Not_A_Slug")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_without_store_is_unavailable() {
        let app = Router::new().route("/api/blog", get(list_posts));
        let response = app
            .oneshot(Request::get("/api/blog?category=rust").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
