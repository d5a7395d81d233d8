use async_trait::async_trait;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::Panel;
use crate::db::models::Project;
use crate::error::ApiResult;
use crate::forms;

const RETURNING: &str = "RETURNING id, title, description, long_description, image_url, demo_url, \
                         github_url, technologies, category, featured, display_order, is_visible";

#[derive(Debug, Deserialize, Validate)]
pub struct ProjectForm {
    #[serde(default)]
    #[validate(custom(function = "forms::not_blank"))]
    pub title: String,
    #[serde(default)]
    #[validate(custom(function = "forms::not_blank"))]
    pub description: String,
    #[serde(default, deserialize_with = "forms::blank_as_none")]
    pub long_description: Option<String>,
    #[serde(default, deserialize_with = "forms::blank_as_none")]
    #[validate(url(message = "must be a valid URL"))]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "forms::blank_as_none")]
    #[validate(url(message = "must be a valid URL"))]
    pub demo_url: Option<String>,
    #[serde(default, deserialize_with = "forms::blank_as_none")]
    #[validate(url(message = "must be a valid URL"))]
    pub github_url: Option<String>,
    #[serde(default, deserialize_with = "forms::string_list")]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "forms::default_true")]
    pub is_visible: bool,
}

pub struct ProjectsPanel;

#[async_trait]
impl Panel for ProjectsPanel {
    type Row = Project;
    type Form = ProjectForm;
    type Record = ProjectForm;

    const LABEL: &'static str = "Project";
    const LIST_SQL: &'static str = r#"
        SELECT id, title, description, long_description, image_url, demo_url, github_url,
               technologies, category, featured, display_order, is_visible
        FROM projects
        ORDER BY display_order ASC, title ASC
    "#;
    const DELETE_SQL: &'static str = "DELETE FROM projects WHERE id = $1";

    fn prepare(mut form: ProjectForm) -> ApiResult<ProjectForm> {
        form.validate()?;
        form.title = form.title.trim().to_string();
        form.description = form.description.trim().to_string();
        form.category = form.category.trim().to_string();
        Ok(form)
    }

    async fn insert(pool: &PgPool, project: ProjectForm) -> ApiResult<Project> {
        let sql = format!(
            "INSERT INTO projects (title, description, long_description, image_url, demo_url, \
             github_url, technologies, category, featured, display_order, is_visible) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) {}",
            RETURNING
        );
        let row = sqlx::query_as::<_, Project>(&sql)
            .bind(&project.title)
            .bind(&project.description)
            .bind(&project.long_description)
            .bind(&project.image_url)
            .bind(&project.demo_url)
            .bind(&project.github_url)
            .bind(&project.technologies)
            .bind(&project.category)
            .bind(project.featured)
            .bind(project.display_order)
            .bind(project.is_visible)
            .fetch_one(pool)
            .await?;
        Ok(row)
    }

    async fn update(pool: &PgPool, id: Uuid, project: ProjectForm) -> ApiResult<Option<Project>> {
        let sql = format!(
            "UPDATE projects SET title = $1, description = $2, long_description = $3, \
             image_url = $4, demo_url = $5, github_url = $6, technologies = $7, category = $8, \
             featured = $9, display_order = $10, is_visible = $11 WHERE id = $12 {}",
            RETURNING
        );
        let row = sqlx::query_as::<_, Project>(&sql)
            .bind(&project.title)
            .bind(&project.description)
            .bind(&project.long_description)
            .bind(&project.image_url)
            .bind(&project.demo_url)
            .bind(&project.github_url)
            .bind(&project.technologies)
            .bind(&project.category)
            .bind(project.featured)
            .bind(project.display_order)
            .bind(project.is_visible)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }
}
