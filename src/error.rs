use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
///
/// Every pipeline stage returns these unmodified; the HTTP boundary maps each
/// variant to a stable machine-readable code.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Group has no members to aggregate")]
    EmptyGroup,

    #[error("Intent resolution failed: {0}")]
    IntentResolution(String),

    #[error("Language model unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Language model rejected request: {0}")]
    UpstreamRejected(String),

    #[error("Search index unavailable: {0}")]
    SearchUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already a member: {0}")]
    AlreadyMember(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable code returned to API callers
    pub fn code(&self) -> &'static str {
        match self {
            AppError::EmptyGroup => "EMPTY_GROUP",
            AppError::IntentResolution(_) => "INTENT_RESOLUTION_FAILED",
            AppError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            AppError::UpstreamRejected(_) => "UPSTREAM_REJECTED",
            AppError::SearchUnavailable(_) => "SEARCH_UNAVAILABLE",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::AlreadyMember(_) => "ALREADY_MEMBER",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::EmptyGroup => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::IntentResolution(_) | AppError::UpstreamRejected(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::UpstreamUnavailable(_) | AppError::SearchUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyMember(_) => StatusCode::CONFLICT,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show callers. Upstream details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            AppError::IntentResolution(_) => {
                "Could not derive a shared interest from the group's preferences".to_string()
            }
            AppError::UpstreamUnavailable(_) | AppError::UpstreamRejected(_) => {
                "Recommendation model is currently unavailable".to_string()
            }
            AppError::SearchUnavailable(_) => "Destination search is currently unavailable".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "Request failed");
        } else {
            tracing::debug!(error = %self, code = self.code(), "Request rejected");
        }

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.public_message(),
            }
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
