use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::Panel;
use crate::db::models::Experience;
use crate::error::{ApiError, ApiResult};
use crate::forms;

const COLUMNS: &str = "id, company, position, location, start_date, end_date, description, \
                       technologies, display_order, is_visible";

#[derive(Debug, Deserialize, Validate)]
pub struct ExperienceForm {
    #[serde(default)]
    #[validate(custom(function = "forms::not_blank"))]
    pub company: String,
    #[serde(default)]
    #[validate(custom(function = "forms::not_blank"))]
    pub position: String,
    #[serde(default, deserialize_with = "forms::blank_as_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "forms::blank_date")]
    pub start_date: Option<NaiveDate>,
    /// Blank means the role is current.
    #[serde(default, deserialize_with = "forms::blank_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "forms::blank_as_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "forms::string_list")]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "forms::default_true")]
    pub is_visible: bool,
}

/// Experience ready to write; the start date is known.
#[derive(Debug)]
pub struct NewExperience {
    pub company: String,
    pub position: String,
    pub location: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub technologies: Vec<String>,
    pub display_order: i32,
    pub is_visible: bool,
}

pub struct ExperiencesPanel;

#[async_trait]
impl Panel for ExperiencesPanel {
    type Row = Experience;
    type Form = ExperienceForm;
    type Record = NewExperience;

    const LABEL: &'static str = "Experience";
    const LIST_SQL: &'static str = r#"
        SELECT id, company, position, location, start_date, end_date, description,
               technologies, display_order, is_visible
        FROM experiences
        ORDER BY display_order ASC, start_date DESC
    "#;
    const DELETE_SQL: &'static str = "DELETE FROM experiences WHERE id = $1";

    fn prepare(form: ExperienceForm) -> ApiResult<NewExperience> {
        form.validate()?;
        let start_date = form
            .start_date
            .ok_or_else(|| ApiError::validation("start_date is required"))?;
        if matches!(form.end_date, Some(end) if end < start_date) {
            return Err(ApiError::validation("end_date must not be before start_date"));
        }
        Ok(NewExperience {
            company: form.company.trim().to_string(),
            position: form.position.trim().to_string(),
            location: form.location,
            start_date,
            end_date: form.end_date,
            description: form.description,
            technologies: form.technologies,
            display_order: form.display_order,
            is_visible: form.is_visible,
        })
    }

    async fn insert(pool: &PgPool, exp: NewExperience) -> ApiResult<Experience> {
        let sql = format!(
            "INSERT INTO experiences (company, position, location, start_date, end_date, \
             description, technologies, display_order, is_visible) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query_as::<_, Experience>(&sql)
            .bind(&exp.company)
            .bind(&exp.position)
            .bind(&exp.location)
            .bind(exp.start_date)
            .bind(exp.end_date)
            .bind(&exp.description)
            .bind(&exp.technologies)
            .bind(exp.display_order)
            .bind(exp.is_visible)
            .fetch_one(pool)
            .await?;
        Ok(row)
    }

    async fn update(pool: &PgPool, id: Uuid, exp: NewExperience) -> ApiResult<Option<Experience>> {
        let sql = format!(
            "UPDATE experiences SET company = $1, position = $2, location = $3, \
             start_date = $4, end_date = $5, description = $6, technologies = $7, \
             display_order = $8, is_visible = $9 WHERE id = $10 RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query_as::<_, Experience>(&sql)
            .bind(&exp.company)
            .bind(&exp.position)
            .bind(&exp.location)
            .bind(exp.start_date)
            .bind(exp.end_date)
            .bind(&exp.description)
            .bind(&exp.technologies)
            .bind(exp.display_order)
            .bind(exp.is_visible)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }
}
