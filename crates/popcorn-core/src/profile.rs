//! User profiles and the role tag that decides which scene a user lands in.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Chat-platform user id. Doubles as the private chat id for direct messages.
pub type UserId = i64;

const SELLER_PREFIX: &str = "seller_";

/// The role tag stored on a profile.
///
/// Tags are free-form strings in storage: `customer`, `seller_<station>`, or
/// anything an operator typed by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Role {
  Customer,
  /// Staff working the counter at `station` (e.g. `seller_left`).
  Seller { station: String },
  /// Unrecognised tag; treated like a customer.
  Other(String),
}

impl Role {
  /// Parse a stored role tag. Never fails: unknown tags become [`Role::Other`].
  pub fn parse(tag: &str) -> Self {
    match tag {
      "customer" => Self::Customer,
      _ => match tag.strip_prefix(SELLER_PREFIX) {
        Some(station) if !station.is_empty() => Self::Seller {
          station: station.to_owned(),
        },
        _ => Self::Other(tag.to_owned()),
      },
    }
  }

  /// The tag written to storage.
  pub fn tag(&self) -> String {
    match self {
      Self::Customer => "customer".to_owned(),
      Self::Seller { station } => format!("{SELLER_PREFIX}{station}"),
      Self::Other(tag) => tag.clone(),
    }
  }

  pub fn is_seller(&self) -> bool { matches!(self, Self::Seller { .. }) }

  /// The station a seller works at, if any.
  pub fn station(&self) -> Option<&str> {
    match self {
      Self::Seller { station } => Some(station),
      _ => None,
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.tag())
  }
}

impl From<String> for Role {
  fn from(tag: String) -> Self { Self::parse(&tag) }
}

impl From<Role> for String {
  fn from(role: Role) -> Self { role.tag() }
}

/// A chat-platform user known to the shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
  pub user_id:    UserId,
  pub username:   Option<String>,
  pub full_name:  String,
  /// `None` until an operator assigns one.
  pub role:       Option<Role>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
