/**
 * Portfolio Routes
 * Public, read-only views of the visible skills, experiences and projects
 */
use axum::{
    extract::{Path, Query},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;

use crate::db::{
    self,
    models::{Experience, Project, Skill},
};
use crate::error::{ApiError, ApiResult};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for GET /api/portfolio/{section}
#[derive(Debug, Default, Deserialize)]
pub struct SectionQuery {
    /// Only honoured by the projects section
    pub featured: Option<bool>,
}

/// Response for GET /api/portfolio
#[derive(Debug, Serialize)]
pub struct PortfolioResponse {
    pub skills: Vec<Skill>,
    pub experiences: Vec<Experience>,
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Skills,
    Experiences,
    Projects,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Skills, Section::Experiences, Section::Projects];

    pub fn as_str(self) -> &'static str {
        match self {
            Section::Skills => "skills",
            Section::Experiences => "experiences",
            Section::Projects => "projects",
        }
    }

    /// Case-insensitive lookup; unknown names are a client error.
    pub fn parse(raw: &str) -> ApiResult<Self> {
        let key = raw.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == key)
            .ok_or_else(|| {
                ApiError::validation(format!(
                    "Invalid section. Valid sections: {:?}",
                    Self::ALL.map(Section::as_str)
                ))
            })
    }
}

// ============================================================================
// Queries
// ============================================================================

async fn visible_skills(pool: &PgPool) -> Result<Vec<Skill>, sqlx::Error> {
    sqlx::query_as::<_, Skill>(
        r#"
        SELECT id, name, category, proficiency, icon, display_order, is_visible
        FROM skills
        WHERE is_visible = true
        ORDER BY display_order ASC, name ASC
        "#,
    )
    .fetch_all(pool)
    .await
}

async fn visible_experiences(pool: &PgPool) -> Result<Vec<Experience>, sqlx::Error> {
    sqlx::query_as::<_, Experience>(
        r#"
        SELECT id, company, position, location, start_date, end_date, description,
               technologies, display_order, is_visible
        FROM experiences
        WHERE is_visible = true
        ORDER BY display_order ASC, start_date DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

async fn visible_projects(pool: &PgPool, featured: Option<bool>) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        r#"
        SELECT id, title, description, long_description, image_url, demo_url, github_url,
               technologies, category, featured, display_order, is_visible
        FROM projects
        WHERE is_visible = true AND ($1::BOOLEAN IS NULL OR featured = $1)
        ORDER BY display_order ASC, title ASC
        "#,
    )
    .bind(featured)
    .fetch_all(pool)
    .await
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/portfolio
pub async fn get_portfolio() -> ApiResult<Json<PortfolioResponse>> {
    let pool = db::require_pool()?;

    let (skills, experiences, projects) = tokio::try_join!(
        visible_skills(pool.as_ref()),
        visible_experiences(pool.as_ref()),
        visible_projects(pool.as_ref(), None),
    )?;

    Ok(Json(PortfolioResponse {
        skills,
        experiences,
        projects,
    }))
}

/// GET /api/portfolio/{section}[?featured=true]
pub async fn get_section(
    Path(section): Path<String>,
    Query(query): Query<SectionQuery>,
) -> ApiResult<Json<Value>> {
    let section = Section::parse(&section)?;
    let pool = db::require_pool()?;

    let data = match section {
        Section::Skills => serde_json::to_value(visible_skills(pool.as_ref()).await?),
        Section::Experiences => serde_json::to_value(visible_experiences(pool.as_ref()).await?),
        Section::Projects => {
            serde_json::to_value(visible_projects(pool.as_ref(), query.featured).await?)
        }
    }
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(data))
}
