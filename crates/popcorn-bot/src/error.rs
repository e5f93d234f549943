//! Error types and axum `IntoResponse` implementation.
//!
//! Only [`Error::Unauthorized`] is reported to the platform as such; every
//! other failure collapses into a generic `500 Error` so nothing internal
//! leaks through the webhook response.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
  #[error("not found: {0}")]
  NotFound(String),
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("telegram api error: {0}")]
  Telegram(String),
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),
}

impl Error {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized => {
        (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
      }
      _ => (StatusCode::INTERNAL_SERVER_ERROR, "Error").into_response(),
    }
  }
}
