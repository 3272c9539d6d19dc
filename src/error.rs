//! Error taxonomy for request handling and artifact loading.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum AppError {
  #[error("missing required parameter '{0}'")]
  InputMissing(&'static str),

  #[error("invalid value '{value}' for '{field}'")]
  InvalidInput { field: &'static str, value: String },

  #[error("label must be 0, 1 or 2 (got '{0}')")]
  LabelOutOfRange(String),

  #[error("requested {requested} samples but only {available} are available")]
  SampleExhausted { requested: usize, available: usize },

  #[error("expected {expected} answers but received {received}")]
  AnswerCountMismatch { expected: usize, received: usize },

  #[error("sample {id} was answered more than once")]
  DuplicateAnswer { id: u64 },

  #[error("malformed request: {0}")]
  MalformedRequest(String),

  #[error("no active challenge for this session; request test tweets first")]
  NoActiveChallenge,

  #[error("model failure: {0}")]
  ExternalModelFailure(String),

  #[error("no reference label stored for sample {id}")]
  MissingReference { id: u64 },
}

#[derive(Serialize)]
pub struct ErrorResponse {
  pub error: String,
  pub code: u16,
}

impl AppError {
  pub fn status(&self) -> StatusCode {
    match self {
      AppError::InputMissing(_)
      | AppError::InvalidInput { .. }
      | AppError::LabelOutOfRange(_)
      | AppError::SampleExhausted { .. }
      | AppError::AnswerCountMismatch { .. }
      | AppError::DuplicateAnswer { .. }
      | AppError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
      AppError::NoActiveChallenge => StatusCode::CONFLICT,
      AppError::ExternalModelFailure(_) | AppError::MissingReference { .. } => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      error!(target: "tweetrater", error = %self, "Request failed");
    } else {
      warn!(target: "tweetrater", error = %self, "Rejected request");
    }
    let body = ErrorResponse { error: self.to_string(), code: status.as_u16() };
    (status, Json(body)).into_response()
  }
}

/// Problems reading the startup artifacts. These abort the process.
#[derive(Debug, Error)]
pub enum ArtifactError {
  #[error("failed to read {path}: {source}")]
  Io { path: String, source: std::io::Error },

  #[error("failed to parse {path}: {source}")]
  Json { path: String, source: serde_json::Error },

  #[error("malformed artifact: {0}")]
  Shape(String),

  #[error("incomplete artifact set: {0}")]
  Incomplete(String),

  #[error("failed to precompute test predictions: {0}")]
  Precompute(#[from] AppError),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn input_errors_are_client_errors() {
    assert_eq!(AppError::InputMissing("tweet").status(), StatusCode::BAD_REQUEST);
    assert_eq!(AppError::LabelOutOfRange("9".into()).status(), StatusCode::BAD_REQUEST);
    assert_eq!(
      AppError::AnswerCountMismatch { expected: 3, received: 2 }.status(),
      StatusCode::BAD_REQUEST
    );
    assert_eq!(AppError::DuplicateAnswer { id: 3 }.status(), StatusCode::BAD_REQUEST);
    assert_eq!(AppError::MalformedRequest("eof".into()).status(), StatusCode::BAD_REQUEST);
    assert_eq!(AppError::NoActiveChallenge.status(), StatusCode::CONFLICT);
  }

  #[test]
  fn model_errors_are_server_errors() {
    assert_eq!(
      AppError::ExternalModelFailure("nan".into()).status(),
      StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(AppError::MissingReference { id: 4 }.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }
}
