use async_trait::async_trait;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::Panel;
use crate::db::models::BlogPost;
use crate::editor;
use crate::error::{ApiError, ApiResult};
use crate::forms;
use crate::slug::{self, UNASSIGNED};

/// Badge color used when the editor leaves the field empty.
pub const DEFAULT_CATEGORY_COLOR: &str = "#fbbf24";

const RETURNING: &str = "RETURNING id, title, slug, excerpt, content, category, category_color, \
                         cover_image, published, created_at, updated_at";

#[derive(Debug, Deserialize, Validate)]
pub struct BlogPostForm {
    #[serde(default)]
    #[validate(custom(function = "forms::not_blank"))]
    pub title: String,
    #[serde(default, deserialize_with = "forms::blank_as_none")]
    pub slug: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "forms::not_blank"))]
    pub excerpt: String,
    #[serde(default)]
    #[validate(custom(function = "forms::not_blank"))]
    pub content: String,
    #[serde(default, deserialize_with = "forms::blank_as_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "forms::blank_as_none")]
    pub category_color: Option<String>,
    #[serde(default, deserialize_with = "forms::blank_as_none")]
    #[validate(url(message = "must be a valid URL"))]
    pub cover_image: Option<String>,
    #[serde(default = "forms::default_true")]
    pub published: bool,
}

/// A post ready to write: slug resolved, body sanitized, defaults applied.
#[derive(Debug)]
pub struct NewBlogPost {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub category: String,
    pub category_color: String,
    pub cover_image: Option<String>,
    pub published: bool,
}

impl TryFrom<BlogPostForm> for NewBlogPost {
    type Error = ApiError;

    fn try_from(form: BlogPostForm) -> Result<Self, Self::Error> {
        form.validate()?;

        let title = form.title.trim().to_string();
        let slug = slug::resolve_slug(form.slug.as_deref(), &title)
            .ok_or_else(|| ApiError::validation("slug cannot be derived from the title"))?;
        if !slug::is_valid_slug(&slug) {
            return Err(ApiError::validation(
                "slug may only contain lowercase letters, numbers and single hyphens",
            ));
        }

        let category = form.category.unwrap_or_else(|| UNASSIGNED.to_string());
        if !slug::is_valid_slug(&category) {
            return Err(ApiError::validation("category must be a valid category slug"));
        }

        let category_color = form
            .category_color
            .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string());
        if !slug::is_hex_color(&category_color) {
            return Err(ApiError::validation("category_color must be a #rrggbb color"));
        }

        Ok(Self {
            title,
            slug,
            excerpt: form.excerpt.trim().to_string(),
            content: editor::sanitize_content(&form.content),
            category,
            category_color,
            cover_image: form.cover_image,
            published: form.published,
        })
    }
}

pub struct BlogPostsPanel;

#[async_trait]
impl Panel for BlogPostsPanel {
    type Row = BlogPost;
    type Form = BlogPostForm;
    type Record = NewBlogPost;

    const LABEL: &'static str = "Blog post";
    const LIST_SQL: &'static str = r#"
        SELECT id, title, slug, excerpt, content, category, category_color,
               cover_image, published, created_at, updated_at
        FROM blog_posts
        ORDER BY created_at DESC
    "#;
    const DELETE_SQL: &'static str = "DELETE FROM blog_posts WHERE id = $1";

    fn prepare(form: BlogPostForm) -> ApiResult<NewBlogPost> {
        NewBlogPost::try_from(form)
    }

    async fn insert(pool: &PgPool, post: NewBlogPost) -> ApiResult<BlogPost> {
        let sql = format!(
            "INSERT INTO blog_posts (title, slug, excerpt, content, category, category_color, \
             cover_image, published) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) {}",
            RETURNING
        );
        let row = sqlx::query_as::<_, BlogPost>(&sql)
            .bind(&post.title)
            .bind(&post.slug)
            .bind(&post.excerpt)
            .bind(&post.content)
            .bind(&post.category)
            .bind(&post.category_color)
            .bind(&post.cover_image)
            .bind(post.published)
            .fetch_one(pool)
            .await?;
        Ok(row)
    }

    async fn update(pool: &PgPool, id: Uuid, post: NewBlogPost) -> ApiResult<Option<BlogPost>> {
        let sql = format!(
            "UPDATE blog_posts SET title = $1, slug = $2, excerpt = $3, content = $4, \
             category = $5, category_color = $6, cover_image = $7, published = $8, \
             updated_at = now() WHERE id = $9 {}",
            RETURNING
        );
        let row = sqlx::query_as::<_, BlogPost>(&sql)
            .bind(&post.title)
            .bind(&post.slug)
            .bind(&post.excerpt)
            .bind(&post.content)
            .bind(&post.category)
            .bind(&post.category_color)
            .bind(&post.cover_image)
            .bind(post.published)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(json: &str) -> BlogPostForm {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_empty_slug_is_derived_from_title() {
        let post = BlogPostsPanel::prepare(form(
            r#"{
                "title": "Hello, World!",
                "slug": "",
                "excerpt": "First post",
                "content": "<p>Hi</p>"
            }"#,
        ))
        .unwrap();
        assert_eq!(post.slug, "hello-world");
        assert_eq!(post.category, UNASSIGNED);
        assert_eq!(post.category_color, DEFAULT_CATEGORY_COLOR);
        assert!(post.published);
    }

    #[test]
    fn test_content_is_sanitized_before_storage() {
        let post = BlogPostsPanel::prepare(form(
            r#"{
                "title": "XSS",
                "excerpt": "e",
                "content": "<p>ok</p><script>alert(1)</script><a href=\"javascript:alert(1)\">x</a>"
            }"#,
        ))
        .unwrap();
        assert!(post.content.contains("<p>ok</p>"));
        assert!(!post.content.contains("script"));
        assert!(!post.content.contains("javascript:"));
    }

    #[test]
    fn test_explicit_slug_must_be_well_formed() {
        let result = BlogPostsPanel::prepare(form(
            r#"{"title": "T", "slug": "Not A Slug", "excerpt": "e", "content": "c"}"#,
        ));
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_title_without_slug_characters_is_rejected() {
        let result = BlogPostsPanel::prepare(form(
            r#"{"title": "!!!", "excerpt": "e", "content": "c"}"#,
        ));
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_category_color_must_be_hex() {
        let result = BlogPostsPanel::prepare(form(
            r#"{"title": "T", "excerpt": "e", "content": "c", "category_color": "yellow"}"#,
        ));
        match result {
            Err(ApiError::Validation(msg)) => assert!(msg.contains("category_color")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_unpublished_flag_is_kept() {
        let post = BlogPostsPanel::prepare(form(
            r#"{"title": "Draft", "excerpt": "e", "content": "c", "published": false, "category": "rust"}"#,
        ))
        .unwrap();
        assert!(!post.published);
        assert_eq!(post.category, "rust");
    }

    #[test]
    fn test_category_must_be_a_slug() {
        for category in ["Not A Slug", "rust/../x", "-rust"] {
            let json = format!(
                r#"{{"title": "T", "excerpt": "e", "content": "c", "category": "{category}"}}"#
            );
            match BlogPostsPanel::prepare(form(&json)) {
                Err(ApiError::Validation(msg)) => assert!(msg.contains("category")),
                other => panic!("unexpected for {category}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_padded_category_is_trimmed() {
        let post = BlogPostsPanel::prepare(form(
            r#"{"title": "T", "excerpt": "e", "content": "c", "category": "  rust  "}"#,
        ))
        .unwrap();
        assert_eq!(post.category, "rust");
    }
}
