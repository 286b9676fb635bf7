use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("model error: {0}")]
    Model(String),
    #[error("model returned no summaries")]
    EmptyOutput,
    #[error("other: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Input text cannot be empty")]
    EmptyInput,
    #[error("top_k must be at least 1, got {0}")]
    InvalidTopK(i64),
    #[error("{0}")]
    BadRequest(String),
    #[error("Error: {0}")]
    Summarize(#[from] SummarizeError),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::EmptyInput | ApiError::InvalidTopK(_) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Summarize(SummarizeError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Summarize(SummarizeError::Http(_) | SummarizeError::EmptyOutput) => {
                StatusCode::BAD_GATEWAY
            }
            ApiError::Summarize(SummarizeError::Model(_) | SummarizeError::Other(_))
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error=%self, status=%status.as_u16(), "request failed");
        } else {
            tracing::debug!(error=%self, status=%status.as_u16(), "request rejected");
        }
        (status, Json(ErrorBody { detail: self.to_string() })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_client_errors() {
        assert_eq!(ApiError::EmptyInput.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidTopK(0).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::BadRequest("missing field `text`".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn model_failures_are_server_side() {
        let cases = [
            (
                SummarizeError::Unavailable("loading".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (SummarizeError::Http("status 500".into()), StatusCode::BAD_GATEWAY),
            (SummarizeError::EmptyOutput, StatusCode::BAD_GATEWAY),
            (
                SummarizeError::Model("shape mismatch".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn summarize_errors_keep_message_in_detail() {
        let err = ApiError::from(SummarizeError::Model("out of memory".into()));
        assert_eq!(err.to_string(), "Error: model error: out of memory");
    }
}
