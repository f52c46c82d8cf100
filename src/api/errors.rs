use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::attempts::{AttemptError, ErrorKind};

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    kind: &'static str,
    detail: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str),
    InvalidState(String),
    NotFound(String),
    Conflict(String),
    Gone(String),
    UnprocessableEntity(String),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::InvalidState(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Gone(_) => StatusCode::GONE,
            Self::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::InvalidState(_) => ErrorKind::InvalidState.as_str(),
            Self::NotFound(_) => ErrorKind::NotFound.as_str(),
            Self::Conflict(_) => ErrorKind::Conflict.as_str(),
            Self::Gone(_) => ErrorKind::Expired.as_str(),
            Self::UnprocessableEntity(_) => ErrorKind::InvalidInput.as_str(),
            Self::Internal(_) => ErrorKind::Internal.as_str(),
        }
    }
}

impl From<AttemptError> for ApiError {
    fn from(err: AttemptError) -> Self {
        match err.kind() {
            ErrorKind::NotFound => Self::NotFound(err.to_string()),
            ErrorKind::Conflict => Self::Conflict(err.to_string()),
            ErrorKind::InvalidState => Self::InvalidState(err.to_string()),
            ErrorKind::Expired => Self::Gone(err.to_string()),
            ErrorKind::InvalidInput => Self::UnprocessableEntity(err.to_string()),
            ErrorKind::Internal => Self::internal(format!("{err:#}"), "Attempt storage failure"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();
        let detail = match self {
            ApiError::Unauthorized(message) | ApiError::Forbidden(message) => message.to_string(),
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                message
            }
            ApiError::InvalidState(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message)
            | ApiError::Gone(message)
            | ApiError::UnprocessableEntity(message) => message,
        };

        (status, Json(ErrorResponse { status: status.as_u16(), kind, detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn attempt_errors_map_to_status_and_kind() {
        let cases = [
            (AttemptError::NotFound("Attempt"), StatusCode::NOT_FOUND, "not_found"),
            (AttemptError::AlreadyActive, StatusCode::CONFLICT, "conflict"),
            (AttemptError::StillInProgress, StatusCode::BAD_REQUEST, "invalid_state"),
            (AttemptError::Expired, StatusCode::GONE, "expired"),
            (AttemptError::InvalidOption, StatusCode::UNPROCESSABLE_ENTITY, "invalid_input"),
            (
                AttemptError::Storage(anyhow::anyhow!("connection reset")),
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
            ),
        ];

        for (err, status, kind) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), status);
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(json["kind"], kind);
            assert_eq!(json["status"], status.as_u16());
        }
    }

    #[tokio::test]
    async fn internal_detail_does_not_leak_cause() {
        let response =
            ApiError::from(AttemptError::Storage(anyhow::anyhow!("password=hunter2"))).into_response();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["detail"], "Attempt storage failure");
    }
}
