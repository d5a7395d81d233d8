//! Contact form inbox: read and delete only.

use axum::{extract::Path, Json};
use uuid::Uuid;

use super::Notice;
use crate::db::{self, models::ContactSubmission};
use crate::error::{ApiError, ApiResult};
use crate::routes::auth::AdminUser;

/// GET /api/cms/contact-submissions
pub async fn list_submissions(_admin: AdminUser) -> ApiResult<Json<Vec<ContactSubmission>>> {
    let pool = db::require_pool()?;

    let submissions = sqlx::query_as::<_, ContactSubmission>(
        r#"
        SELECT id, name, email, subject, message, created_at
        FROM contact_submissions
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool.as_ref())
    .await?;

    Ok(Json(submissions))
}

/// DELETE /api/cms/contact-submissions/{id}
pub async fn delete_submission(
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Notice<()>>> {
    let pool = db::require_pool()?;

    let result = sqlx::query("DELETE FROM contact_submissions WHERE id = $1")
        .bind(id)
        .execute(pool.as_ref())
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Submission"));
    }
    tracing::info!(id = %id, "contact submission deleted");

    Ok(Json(Notice::new("Submission deleted successfully", None)))
}
