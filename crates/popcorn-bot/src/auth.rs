//! Shared-secret check for inbound webhook calls.
//!
//! Telegram echoes the `secret_token` given to `setWebhook` back in the
//! `X-Telegram-Bot-Api-Secret-Token` header of every delivery.

use axum::http::HeaderMap;

use crate::error::Error;

pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Verify the secret header against the configured value.
pub fn verify_secret(headers: &HeaderMap, expected: &str) -> Result<(), Error> {
  let presented = headers
    .get(SECRET_HEADER)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  if expected.is_empty()
    || !constant_time_eq::constant_time_eq(presented.as_bytes(), expected.as_bytes())
  {
    return Err(Error::Unauthorized);
  }

  Ok(())
}
