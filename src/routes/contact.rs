/**
 * Contact Route
 * Public form that drops a message into the CMS inbox
 */
use axum::{http::StatusCode, Json};
use serde::Deserialize;
use validator::Validate;

use crate::db;
use crate::error::{ApiResult, AppJson};
use crate::forms;
use crate::routes::cms::Notice;

#[derive(Debug, Deserialize, Validate)]
pub struct ContactForm {
    #[serde(default)]
    #[validate(custom(function = "forms::not_blank"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[serde(default, deserialize_with = "forms::blank_as_none")]
    pub subject: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "forms::not_blank"))]
    pub message: String,
}

impl ContactForm {
    fn normalize(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_string();
        self.message = self.message.trim().to_string();
        self
    }
}

/// POST /api/contact
pub async fn submit_contact(
    AppJson(form): AppJson<ContactForm>,
) -> ApiResult<(StatusCode, Json<Notice<()>>)> {
    let form = form.normalize();
    form.validate()?;

    let pool = db::require_pool()?;

    sqlx::query(
        r#"
        INSERT INTO contact_submissions (name, email, subject, message)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(&form.name)
    .bind(&form.email)
    .bind(&form.subject)
    .bind(&form.message)
    .execute(pool.as_ref())
    .await?;

    tracing::info!("contact submission received");

    Ok((
        StatusCode::CREATED,
        Json(Notice::new(
            "Thank you for your message! I'll get back to you soon.",
            None,
        )),
    ))
}
