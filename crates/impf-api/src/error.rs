//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use impf_core::{Error, validation::ValidationErrors};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Carries a fixed message only; a phone lookup never echoes the number.
  #[error("not found: {0}")]
  NotFound(&'static str),

  #[error("invalid input: {0}")]
  Validation(ValidationErrors),

  #[error("internal error: {0}")]
  Internal(String),
}

impl From<Error> for ApiError {
  fn from(e: Error) -> Self {
    match e {
      Error::Validation(errors) => Self::Validation(errors),
      Error::NotFound(_) => Self::NotFound("no such registration"),
      // A full call is a reconciler decision, never a request failure.
      e @ (Error::CapacityExceeded(_) | Error::Storage(_) | Error::Notify(_)) => {
        Self::Internal(e.to_string())
      }
    }
  }
}

impl From<ValidationErrors> for ApiError {
  fn from(errors: ValidationErrors) -> Self { Self::Validation(errors) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, Json(json!({ "error": m }))).into_response(),
      ApiError::Validation(errors) => (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error": "invalid input", "fields": errors })),
      )
        .into_response(),
      ApiError::Internal(m) => {
        error!(error = %m, "request failed");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({ "error": "internal error" })),
        )
          .into_response()
      }
    }
  }
}
