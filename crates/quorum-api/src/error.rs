use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use quorum_core::error::PollError;
use serde_json::{json, Value};
use thiserror::Error;

/// Failure returned from a handler. The message is what the caller sees.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
    /// The data backend failed; its message is passed through unchanged.
    #[error("{0}")]
    Backend(String),
}

impl ApiError {
    /// Machine-readable error code string.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Backend(_) => "BACKEND_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if let ApiError::Backend(msg) = &self {
            tracing::error!("backend error: {msg}");
        }

        let message = self.to_string();
        let body = json!({
            "code": code,
            "error": message,
            "details": Value::Null,
        });

        (status, Json(body)).into_response()
    }
}

impl From<PollError> for ApiError {
    fn from(e: PollError) -> Self {
        let message = e.to_string();
        match e {
            PollError::Validation(_) | PollError::InvalidOption => ApiError::BadRequest(message),
            PollError::Unauthenticated(_) => ApiError::Unauthorized(message),
            PollError::Forbidden(_) => ApiError::Forbidden(message),
            PollError::NotFound => ApiError::NotFound(message),
            PollError::AlreadyVoted => ApiError::Conflict(message),
            PollError::Backend(_) => ApiError::Backend(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_core::validation::ValidationError;

    #[test]
    fn poll_errors_map_to_status_codes() {
        let cases = [
            (PollError::Validation(ValidationError::TooFewOptions), StatusCode::BAD_REQUEST),
            (PollError::InvalidOption, StatusCode::BAD_REQUEST),
            (PollError::Unauthenticated("login"), StatusCode::UNAUTHORIZED),
            (PollError::Forbidden("nope"), StatusCode::FORBIDDEN),
            (PollError::NotFound, StatusCode::NOT_FOUND),
            (PollError::AlreadyVoted, StatusCode::CONFLICT),
            (PollError::Backend("disk I/O error".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[tokio::test]
    async fn body_carries_the_message_under_error() {
        let resp = ApiError::from(PollError::NotFound).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(resp.into_body(), 4096).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Poll not found.");
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[test]
    fn backend_message_is_forwarded_verbatim() {
        let err = ApiError::from(PollError::Backend("database is locked".into()));
        assert_eq!(err.to_string(), "database is locked");
    }
}
