//! Per-user conversation state.

use std::str::FromStr as _;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  order::OrderId,
  profile::{Role, UserId},
};

/// A named conversation mode with its own set of recognised actions.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Scene {
  #[default]
  Customer,
  Seller,
}

impl Scene {
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownScene(s.to_owned()))
  }

  pub fn as_str(self) -> &'static str { self.into() }

  /// The scene a user lands in at session start. Sellers get the seller
  /// scene; everyone else, including users with no role, is a customer.
  pub fn for_role(role: Option<&Role>) -> Self {
    match role {
      Some(r) if r.is_seller() => Self::Seller,
      _ => Self::Customer,
    }
  }
}

/// Ephemeral state threaded through one event's handling and persisted
/// between events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub user_id:       UserId,
  pub scene:         Scene,
  /// The customer's open cart, once one is known.
  pub cart_order_id: Option<OrderId>,
}

impl Session {
  pub fn new(user_id: UserId, scene: Scene) -> Self {
    Self { user_id, scene, cart_order_id: None }
  }
}
