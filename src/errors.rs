use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::json;

/// Domain errors surfaced by the orchestration service.
///
/// Validation and conflict failures are rejected before any mutation and
/// never produce a broadcast. Database errors propagate un-retried; retrying
/// is the caller's responsibility.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ExternalDependency(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Unexpected(String),
}

impl MatchError {
    pub fn validation(msg: impl Into<String>) -> Self {
        MatchError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        MatchError::Conflict(msg.into())
    }

    pub fn match_not_found(id: uuid::Uuid) -> Self {
        MatchError::NotFound(format!("Match {} not found", id))
    }
}

impl actix_web::ResponseError for MatchError {
    fn status_code(&self) -> StatusCode {
        match self {
            MatchError::Validation(_) => StatusCode::BAD_REQUEST,
            MatchError::Conflict(_) => StatusCode::CONFLICT,
            MatchError::NotFound(_) => StatusCode::NOT_FOUND,
            MatchError::ExternalDependency(_) => StatusCode::BAD_GATEWAY,
            MatchError::Database(_) | MatchError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        // 5xx bodies never leak the underlying error text
        let message = match self {
            MatchError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Internal server error".to_string()
            }
            MatchError::Unexpected(e) => {
                tracing::error!("Unexpected error: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": message
        }))
    }
}
