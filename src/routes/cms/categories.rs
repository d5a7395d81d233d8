use async_trait::async_trait;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::blog_posts::DEFAULT_CATEGORY_COLOR;
use super::Panel;
use crate::db::models::Category;
use crate::error::{ApiError, ApiResult};
use crate::forms;
use crate::slug::{self, UNASSIGNED};

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryForm {
    #[serde(default)]
    #[validate(custom(function = "forms::not_blank"))]
    pub name: String,
    #[serde(default, deserialize_with = "forms::blank_as_none")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "forms::blank_as_none")]
    pub color: Option<String>,
}

#[derive(Debug)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub color: String,
}

/// Refuse to touch the reserved category.
pub fn ensure_category_editable(slug: &str) -> ApiResult<()> {
    if slug == UNASSIGNED {
        return Err(ApiError::Forbidden(
            "Cannot edit the Unassigned category".to_string(),
        ));
    }
    Ok(())
}

/// Refuse to delete the reserved category or any category still referenced by posts.
pub fn ensure_category_deletable(slug: &str, post_count: i64) -> ApiResult<()> {
    if slug == UNASSIGNED {
        return Err(ApiError::Forbidden(
            "Cannot delete the Unassigned category".to_string(),
        ));
    }
    if post_count > 0 {
        return Err(ApiError::Conflict(format!(
            "This category is used by {} post(s). Please reassign or delete those posts first.",
            post_count
        )));
    }
    Ok(())
}

async fn category_slug(pool: &PgPool, id: Uuid) -> ApiResult<String> {
    sqlx::query_scalar::<_, String>("SELECT slug FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(ApiError::NotFound("Category"))
}

pub struct CategoriesPanel;

#[async_trait]
impl Panel for CategoriesPanel {
    type Row = Category;
    type Form = CategoryForm;
    type Record = NewCategory;

    const LABEL: &'static str = "Category";
    const LIST_SQL: &'static str = r#"
        SELECT c.id, c.name, c.slug, c.color, c.created_at,
               (SELECT COUNT(*) FROM blog_posts p WHERE p.category = c.slug) AS post_count
        FROM categories c
        ORDER BY c.created_at ASC
    "#;
    const DELETE_SQL: &'static str = "DELETE FROM categories WHERE id = $1";

    fn prepare(form: CategoryForm) -> ApiResult<NewCategory> {
        form.validate()?;

        let name = form.name.trim().to_string();
        let slug = slug::resolve_slug(form.slug.as_deref(), &name)
            .ok_or_else(|| ApiError::validation("slug cannot be derived from the name"))?;
        if !slug::is_valid_slug(&slug) {
            return Err(ApiError::validation(
                "slug may only contain lowercase letters, numbers and single hyphens",
            ));
        }

        let color = form
            .color
            .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string());
        if !slug::is_hex_color(&color) {
            return Err(ApiError::validation("color must be a #rrggbb color"));
        }

        Ok(NewCategory { name, slug, color })
    }

    async fn insert(pool: &PgPool, category: NewCategory) -> ApiResult<Category> {
        let row = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, slug, color)
            VALUES ($1, $2, $3)
            RETURNING id, name, slug, color, created_at
            "#,
        )
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.color)
        .fetch_one(pool)
        .await?;
        Ok(row)
    }

    async fn update(pool: &PgPool, id: Uuid, category: NewCategory) -> ApiResult<Option<Category>> {
        // Posts keep pointing at the old slug; reassigning them is the editor's job.
        let row = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = $1, slug = $2, color = $3
            WHERE id = $4 AND slug <> 'unassigned'
            RETURNING id, name, slug, color, created_at
            "#,
        )
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.color)
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    async fn before_update(pool: &PgPool, id: Uuid) -> ApiResult<()> {
        let slug = category_slug(pool, id).await?;
        ensure_category_editable(&slug)
    }

    async fn before_delete(pool: &PgPool, id: Uuid) -> ApiResult<()> {
        let slug = category_slug(pool, id).await?;
        let post_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM blog_posts WHERE category = $1")
                .bind(&slug)
                .fetch_one(pool)
                .await?;
        ensure_category_deletable(&slug, post_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_unassigned_is_never_deletable() {
        for count in [0, 1, 42] {
            let err = ensure_category_deletable(UNASSIGNED, count).unwrap_err();
            assert_eq!(err.status(), StatusCode::FORBIDDEN);
            assert_eq!(
                err.to_string(),
                "Forbidden: Cannot delete the Unassigned category"
            );
        }
    }

    #[test]
    fn test_category_in_use_reports_post_count() {
        let err = ensure_category_deletable("rust", 3).unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        match err {
            ApiError::Conflict(msg) => assert_eq!(
                msg,
                "This category is used by 3 post(s). Please reassign or delete those posts first."
            ),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_unused_category_is_deletable() {
        assert!(ensure_category_deletable("rust", 0).is_ok());
    }

    #[test]
    fn test_unassigned_is_not_editable() {
        let err = ensure_category_editable(UNASSIGNED).unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert!(ensure_category_editable("rust").is_ok());
    }

    #[test]
    fn test_prepare_derives_slug_and_default_color() {
        let form: CategoryForm =
            serde_json::from_str(r#"{"name": "Systems Programming", "slug": "", "color": ""}"#)
                .unwrap();
        let category = CategoriesPanel::prepare(form).unwrap();
        assert_eq!(category.slug, "systems-programming");
        assert_eq!(category.color, DEFAULT_CATEGORY_COLOR);
    }

    #[test]
    fn test_prepare_rejects_bad_color() {
        let form: CategoryForm =
            serde_json::from_str(r##"{"name": "Rust", "color": "#12"}"##).unwrap();
        assert!(matches!(
            CategoriesPanel::prepare(form),
            Err(ApiError::Validation(_))
        ));
    }
}
