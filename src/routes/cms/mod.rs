/**
 * CMS Routes
 * List / create / update / delete for every managed table, admin only
 */
pub mod blog_posts;
pub mod categories;
pub mod experiences;
pub mod projects;
pub mod skills;
pub mod submissions;

use async_trait::async_trait;
use axum::{
    extract::Path,
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, PgPool};
use uuid::Uuid;

use crate::db;
use crate::error::{ApiError, ApiResult, AppJson};
use crate::routes::auth::AdminUser;

/// Body of every successful CMS mutation; `message` is what the panel toasts.
#[derive(Debug, Serialize, Deserialize)]
pub struct Notice<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Notice<T> {
    pub fn new(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

/// One CMS screen: a table, its display ordering and its edit form.
#[async_trait]
pub trait Panel: Send + Sync + 'static {
    type Row: for<'r> FromRow<'r, PgRow> + Serialize + Send + Unpin + 'static;
    /// Body posted by the edit dialog
    type Form: DeserializeOwned + Send + 'static;
    /// Validated, normalized values ready to write
    type Record: Send + 'static;

    /// Singular noun used in notifications ("Skill added successfully")
    const LABEL: &'static str;
    const LIST_SQL: &'static str;
    const DELETE_SQL: &'static str;

    fn prepare(form: Self::Form) -> ApiResult<Self::Record>;

    async fn insert(pool: &PgPool, record: Self::Record) -> ApiResult<Self::Row>;

    async fn update(pool: &PgPool, id: Uuid, record: Self::Record) -> ApiResult<Option<Self::Row>>;

    async fn before_update(_pool: &PgPool, _id: Uuid) -> ApiResult<()> {
        Ok(())
    }

    async fn before_delete(_pool: &PgPool, _id: Uuid) -> ApiResult<()> {
        Ok(())
    }
}

// ============================================================================
// Generic handlers
// ============================================================================

/// GET /api/cms/<panel>
pub async fn list<P: Panel>(_admin: AdminUser) -> ApiResult<Json<Vec<P::Row>>> {
    let pool = db::require_pool()?;
    let rows = sqlx::query_as::<_, P::Row>(P::LIST_SQL)
        .fetch_all(pool.as_ref())
        .await?;
    Ok(Json(rows))
}

/// POST /api/cms/<panel>
pub async fn create<P: Panel>(
    _admin: AdminUser,
    AppJson(form): AppJson<P::Form>,
) -> ApiResult<(StatusCode, Json<Notice<P::Row>>)> {
    let record = P::prepare(form)?;
    let pool = db::require_pool()?;

    let row = P::insert(pool.as_ref(), record).await?;
    tracing::info!(panel = P::LABEL, "row added");

    Ok((
        StatusCode::CREATED,
        Json(Notice::new(format!("{} added successfully", P::LABEL), Some(row))),
    ))
}

/// PUT /api/cms/<panel>/{id}
pub async fn update<P: Panel>(
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    AppJson(form): AppJson<P::Form>,
) -> ApiResult<Json<Notice<P::Row>>> {
    let record = P::prepare(form)?;
    let pool = db::require_pool()?;

    P::before_update(pool.as_ref(), id).await?;
    let row = P::update(pool.as_ref(), id, record)
        .await?
        .ok_or(ApiError::NotFound(P::LABEL))?;
    tracing::info!(panel = P::LABEL, id = %id, "row updated");

    Ok(Json(Notice::new(
        format!("{} updated successfully", P::LABEL),
        Some(row),
    )))
}

/// DELETE /api/cms/<panel>/{id}
pub async fn remove<P: Panel>(
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Notice<()>>> {
    let pool = db::require_pool()?;

    P::before_delete(pool.as_ref(), id).await?;
    let result = sqlx::query(P::DELETE_SQL)
        .bind(id)
        .execute(pool.as_ref())
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(P::LABEL));
    }
    tracing::info!(panel = P::LABEL, id = %id, "row deleted");

    Ok(Json(Notice::new(
        format!("{} deleted successfully", P::LABEL),
        None,
    )))
}

// ============================================================================
// Router
// ============================================================================

pub fn router() -> Router {
    use blog_posts::BlogPostsPanel;
    use categories::CategoriesPanel;
    use experiences::ExperiencesPanel;
    use projects::ProjectsPanel;
    use skills::SkillsPanel;

    Router::new()
        .route("/skills", get(list::<SkillsPanel>).post(create::<SkillsPanel>))
        .route(
            "/skills/{id}",
            put(update::<SkillsPanel>).delete(remove::<SkillsPanel>),
        )
        .route(
            "/experiences",
            get(list::<ExperiencesPanel>).post(create::<ExperiencesPanel>),
        )
        .route(
            "/experiences/{id}",
            put(update::<ExperiencesPanel>).delete(remove::<ExperiencesPanel>),
        )
        .route(
            "/projects",
            get(list::<ProjectsPanel>).post(create::<ProjectsPanel>),
        )
        .route(
            "/projects/{id}",
            put(update::<ProjectsPanel>).delete(remove::<ProjectsPanel>),
        )
        .route(
            "/blog-posts",
            get(list::<BlogPostsPanel>).post(create::<BlogPostsPanel>),
        )
        .route(
            "/blog-posts/{id}",
            put(update::<BlogPostsPanel>).delete(remove::<BlogPostsPanel>),
        )
        .route(
            "/categories",
            get(list::<CategoriesPanel>).post(create::<CategoriesPanel>),
        )
        .route(
            "/categories/{id}",
            put(update::<CategoriesPanel>).delete(remove::<CategoriesPanel>),
        )
        .route(
            "/contact-submissions",
            get(submissions::list_submissions),
        )
        .route(
            "/contact-submissions/{id}",
            delete(submissions::delete_submission),
        )
}
