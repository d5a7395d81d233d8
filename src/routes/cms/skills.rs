use async_trait::async_trait;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::Panel;
use crate::db::models::Skill;
use crate::error::ApiResult;
use crate::forms;

#[derive(Debug, Deserialize, Validate)]
pub struct SkillForm {
    #[serde(default)]
    #[validate(custom(function = "forms::not_blank"))]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    #[validate(range(min = 0, max = 100, message = "must be between 0 and 100"))]
    pub proficiency: i32,
    #[serde(default, deserialize_with = "forms::blank_as_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "forms::default_true")]
    pub is_visible: bool,
}

pub struct SkillsPanel;

#[async_trait]
impl Panel for SkillsPanel {
    type Row = Skill;
    type Form = SkillForm;
    type Record = SkillForm;

    const LABEL: &'static str = "Skill";
    const LIST_SQL: &'static str = r#"
        SELECT id, name, category, proficiency, icon, display_order, is_visible
        FROM skills
        ORDER BY display_order ASC, name ASC
    "#;
    const DELETE_SQL: &'static str = "DELETE FROM skills WHERE id = $1";

    fn prepare(mut form: SkillForm) -> ApiResult<SkillForm> {
        form.validate()?;
        form.name = form.name.trim().to_string();
        form.category = form.category.trim().to_string();
        Ok(form)
    }

    async fn insert(pool: &PgPool, skill: SkillForm) -> ApiResult<Skill> {
        let row = sqlx::query_as::<_, Skill>(
            r#"
            INSERT INTO skills (name, category, proficiency, icon, display_order, is_visible)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, category, proficiency, icon, display_order, is_visible
            "#,
        )
        .bind(&skill.name)
        .bind(&skill.category)
        .bind(skill.proficiency)
        .bind(&skill.icon)
        .bind(skill.display_order)
        .bind(skill.is_visible)
        .fetch_one(pool)
        .await?;
        Ok(row)
    }

    async fn update(pool: &PgPool, id: Uuid, skill: SkillForm) -> ApiResult<Option<Skill>> {
        let row = sqlx::query_as::<_, Skill>(
            r#"
            UPDATE skills
            SET name = $1, category = $2, proficiency = $3, icon = $4,
                display_order = $5, is_visible = $6
            WHERE id = $7
            RETURNING id, name, category, proficiency, icon, display_order, is_visible
            "#,
        )
        .bind(&skill.name)
        .bind(&skill.category)
        .bind(skill.proficiency)
        .bind(&skill.icon)
        .bind(skill.display_order)
        .bind(skill.is_visible)
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    fn form(json: &str) -> SkillForm {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_prepare_trims_and_defaults_visible() {
        let skill = SkillsPanel::prepare(form(
            r#"{"name": "  Rust ", "category": "Backend", "proficiency": 80, "icon": ""}"#,
        ))
        .unwrap();
        assert_eq!(skill.name, "Rust");
        assert!(skill.is_visible);
        assert!(skill.icon.is_none());
        assert_eq!(skill.display_order, 0);
    }

    #[test]
    fn test_prepare_rejects_out_of_range_proficiency() {
        for bad in ["-1", "101"] {
            let json = format!(r#"{{"name": "Rust", "proficiency": {}}}"#, bad);
            match SkillsPanel::prepare(form(&json)) {
                Err(ApiError::Validation(msg)) => assert!(msg.contains("proficiency")),
                other => panic!("unexpected: {other:?}"),
            }
        }
    }

    #[test]
    fn test_prepare_requires_name() {
        assert!(matches!(
            SkillsPanel::prepare(form(r#"{"name": " ", "proficiency": 50}"#)),
            Err(ApiError::Validation(_))
        ));
    }
}
