//! Error types for `popcorn-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown order status: {0:?}")]
  UnknownOrderStatus(String),

  #[error("unknown scene: {0:?}")]
  UnknownScene(String),

  #[error("invalid price {0:?}: {1}")]
  InvalidPrice(String, rust_decimal::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
