//! Orders, order items, and the fulfilment state machine.
//!
//! ```text
//! cart -(checkout)-> pending -(claim)-> preparing -(mark ready)-> ready -(hand off)-> completed
//! ```
//!
//! Status only ever moves forward. `cart` is the only status a customer may
//! mutate; everything after it belongs to staff.

use std::str::FromStr as _;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, product::ProductId, profile::UserId};

pub type OrderId = i64;

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
  Cart,
  Pending,
  Preparing,
  Ready,
  Completed,
}

impl OrderStatus {
  /// Parse the stored string form.
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownOrderStatus(s.to_owned()))
  }

  pub fn as_str(self) -> &'static str { self.into() }

  /// The single forward successor, or `None` for `completed`.
  pub fn next(self) -> Option<Self> {
    match self {
      Self::Cart => Some(Self::Pending),
      Self::Pending => Some(Self::Preparing),
      Self::Preparing => Some(Self::Ready),
      Self::Ready => Some(Self::Completed),
      Self::Completed => None,
    }
  }

  /// Whether `self → to` is a legal single-step transition.
  pub fn can_advance_to(self, to: Self) -> bool { self.next() == Some(to) }

  /// Submitted and not yet handed over.
  pub fn is_active(self) -> bool {
    matches!(self, Self::Pending | Self::Preparing | Self::Ready)
  }

  /// Human-readable label used in order listings.
  pub fn label(self) -> &'static str {
    match self {
      Self::Cart => "In cart",
      Self::Pending => "Awaiting staff",
      Self::Preparing => "Being prepared",
      Self::Ready => "Ready for pickup",
      Self::Completed => "Completed",
    }
  }
}

// ─── Order ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
  pub order_id:     OrderId,
  pub customer_id:  UserId,
  pub status:       OrderStatus,
  /// Station the order is collected from; chosen at checkout.
  pub pickup_point: Option<String>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

/// One line of an order. `(order_id, product_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
  pub order_id:      OrderId,
  pub product_id:    ProductId,
  pub quantity:      u32,
  /// Catalog price when the item was added; later price changes don't apply.
  pub price_at_time: Decimal,
}

/// An [`OrderItem`] joined with its product's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
  pub item:         OrderItem,
  pub product_name: String,
}

impl CartLine {
  pub fn line_total(&self) -> Decimal {
    self.item.price_at_time * Decimal::from(self.item.quantity)
  }
}

/// Sum of all line totals.
pub fn cart_total(lines: &[CartLine]) -> Decimal {
  lines.iter().map(CartLine::line_total).sum()
}
