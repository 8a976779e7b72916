use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Outcome of a failed blog operation, shared by the repositories, the
/// HTTP layer and the sync client.
#[derive(Debug, thiserror::Error)]
pub enum BlogError {
    #[error("Blog not found")]
    NotFound,
    /// Carries the contested slug (or the violated constraint name).
    #[error("A blog with this slug already exists")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl BlogError {
    pub fn status(&self) -> StatusCode {
        match self {
            BlogError::NotFound => StatusCode::NOT_FOUND,
            BlogError::Conflict(_) | BlogError::Validation(_) => StatusCode::BAD_REQUEST,
            BlogError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BlogError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match &self {
            BlogError::Storage(detail) => {
                tracing::error!(error = %detail, "blog storage failure");
                "Storage failure".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

impl From<std::io::Error> for BlogError {
    fn from(e: std::io::Error) -> Self {
        BlogError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for BlogError {
    fn from(e: serde_json::Error) -> Self {
        BlogError::Storage(e.to_string())
    }
}

impl From<sqlx::Error> for BlogError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => BlogError::NotFound,
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                BlogError::Conflict(db.constraint().unwrap_or("slug").to_string())
            }
            other => BlogError::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(BlogError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            BlogError::Conflict("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            BlogError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            BlogError::Storage("disk".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_storage_detail_is_not_exposed() {
        let res = BlogError::Storage("/secret/path: permission denied".into()).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("secret"));
        assert!(text.contains("\"error\""));
    }

    #[test]
    fn test_sqlx_row_not_found_maps_to_not_found() {
        assert!(matches!(
            BlogError::from(sqlx::Error::RowNotFound),
            BlogError::NotFound
        ));
    }
}
