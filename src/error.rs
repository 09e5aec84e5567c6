//! Error types for the quiz pipeline and the HTTP layer.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde::Serialize;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, QuizError>;

/// Errors surfaced by the codec and the session flows.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuizError {
  /// The structure could not be serialized. Practically unreachable for well-formed values.
  #[error("Failed to encode quiz data: {0}")]
  Encoding(String),

  /// The token is not reversible text, not well-formed JSON, or carries no cards.
  #[error("Failed to decode quiz data: {0}")]
  Decoding(String),

  /// A results view was requested for a token without both result fields.
  #[error("No results found in quiz data")]
  MissingResults,

  #[error("{0}")]
  Validation(String),
}

/// The external judge could not produce a usable judgment.
///
/// Never shown to the end user: it triggers the exact-match fallback.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("judge unavailable: {0}")]
pub struct JudgeUnavailable(pub String);

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Quiz(#[from] QuizError),

  #[error("Bad request: {0}")]
  BadRequest(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
  error: String,
  message: String,
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, error_type) = match &self {
      ApiError::Quiz(QuizError::Encoding(_)) => (StatusCode::INTERNAL_SERVER_ERROR, "encoding_error"),
      ApiError::Quiz(QuizError::Decoding(_)) => (StatusCode::BAD_REQUEST, "decoding_error"),
      ApiError::Quiz(QuizError::MissingResults) => (StatusCode::NOT_FOUND, "missing_results"),
      ApiError::Quiz(QuizError::Validation(_)) => (StatusCode::BAD_REQUEST, "validation_error"),
      ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
    };

    let body = Json(ErrorResponse {
      error: error_type.to_string(),
      message: self.to_string(),
    });

    (status, body).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decoding_error_is_bad_request() {
    let response = ApiError::from(QuizError::Decoding("bad base64".into())).into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
  }

  #[test]
  fn missing_results_is_not_found() {
    let response = ApiError::from(QuizError::MissingResults).into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
  }

  #[test]
  fn encoding_error_is_internal() {
    let response = ApiError::from(QuizError::Encoding("cycle".into())).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[test]
  fn display_carries_cause() {
    let e = QuizError::Decoding("No valid cards found in quiz data".into());
    assert_eq!(e.to_string(), "Failed to decode quiz data: No valid cards found in quiz data");
    assert_eq!(ApiError::BadRequest("missing field".into()).to_string(), "Bad request: missing field");
  }
}
