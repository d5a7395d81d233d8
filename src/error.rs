/*!
 * API Errors
 * Single error type shared by every handler
 */
use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Too many requests")]
    RateLimited,

    #[error("Database not available")]
    Unavailable,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(e) if is_unique_violation(e) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        let (error, message) = match self {
            Self::Validation(msg) => ("Validation failed".to_string(), Some(msg.clone())),
            Self::Unauthorized(msg) | Self::Forbidden(msg) | Self::Conflict(msg) => {
                (msg.clone(), None)
            }
            Self::NotFound(entity) => (format!("{} not found", entity), None),
            Self::RateLimited => (
                "Too many requests. Please try again later.".to_string(),
                None,
            ),
            Self::Unavailable => ("Database not available".to_string(), None),
            // The store's own message is what the CMS operator sees.
            Self::Database(e) => ("Database error".to_string(), Some(store_message(e))),
            Self::Internal(msg) => ("Internal error".to_string(), Some(msg.clone())),
        };
        ErrorResponse { error, message }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let detail = errs
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .next()
                    .unwrap_or_else(|| "is invalid".to_string());
                format!("{} {}", field, detail)
            })
            .collect();
        fields.sort();
        Self::Validation(fields.join("; "))
    }
}

/// Malformed or mistyped bodies are a client error like any failed form check.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// `Json` extractor whose rejection renders through `ApiError`.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn store_message(e: &sqlx::Error) -> String {
    match e {
        sqlx::Error::Database(db) => db.message().to_string(),
        other => other.to_string(),
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct NamedForm {
        #[validate(length(min = 1, message = "is required"))]
        name: String,
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound("Post").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Forbidden("no".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ApiError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::Unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            ApiError::Database(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_database_error_surfaces_store_message() {
        let body = ApiError::Database(sqlx::Error::RowNotFound).body();
        assert_eq!(body.error, "Database error");
        assert!(body.message.unwrap().contains("no rows"));
    }

    #[test]
    fn test_validation_errors_name_the_field() {
        let err: ApiError = NamedForm {
            name: String::new(),
        }
        .validate()
        .unwrap_err()
        .into();
        match err {
            ApiError::Validation(msg) => assert_eq!(msg, "name is required"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    async fn echo(AppJson(value): AppJson<serde_json::Value>) -> Json<serde_json::Value> {
        Json(value)
    }

    async fn post_body(content_type: Option<&str>, body: &'static str) -> (StatusCode, ErrorResponse) {
        use axum::{body::Body, http::Request, routing::post, Router};
        use tower::ServiceExt;

        let mut req = Request::post("/echo");
        if let Some(ct) = content_type {
            req = req.header("content-type", ct);
        }
        let res = Router::new()
            .route("/echo", post(echo))
            .oneshot(req.body(Body::from(body)).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_validation_error() {
        let (status, body) = post_body(Some("application/json"), "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Validation failed");
        assert!(body.message.is_some());
    }

    #[tokio::test]
    async fn test_missing_content_type_is_a_validation_error() {
        let (status, body) = post_body(None, "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Validation failed");
    }
}
