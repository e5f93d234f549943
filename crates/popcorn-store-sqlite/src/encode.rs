//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings with microsecond precision.
//! Money is stored as the canonical decimal string so no precision is lost to
//! floating point.

use std::str::FromStr as _;

use chrono::{DateTime, SecondsFormat, Utc};
use popcorn_core::{
  order::{CartLine, Order, OrderItem, OrderStatus},
  product::Product,
  profile::{Role, UserProfile},
  session::{Scene, Session},
};
use rust_decimal::Decimal;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// Fixed-width so that string order matches time order in `ORDER BY`.
pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Decimal ─────────────────────────────────────────────────────────────────

pub fn encode_decimal(d: Decimal) -> String { d.normalize().to_string() }

pub fn decode_decimal(s: &str) -> Result<Decimal> {
  Decimal::from_str(s)
    .map_err(|e| popcorn_core::Error::InvalidPrice(s.to_owned(), e).into())
}

// ─── Integers ────────────────────────────────────────────────────────────────

pub fn decode_quantity(column: &'static str, value: i64) -> Result<u32> {
  u32::try_from(value).map_err(|_| Error::OutOfRange { column, value })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawOrder::from_row`].
pub const ORDER_COLUMNS: &str =
  "order_id, customer_id, status, pickup_point, created_at, updated_at";

/// Raw values read directly from an `orders` row.
pub struct RawOrder {
  pub order_id:     i64,
  pub customer_id:  i64,
  pub status:       String,
  pub pickup_point: Option<String>,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawOrder {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      order_id:     row.get(0)?,
      customer_id:  row.get(1)?,
      status:       row.get(2)?,
      pickup_point: row.get(3)?,
      created_at:   row.get(4)?,
      updated_at:   row.get(5)?,
    })
  }

  pub fn into_order(self) -> Result<Order> {
    Ok(Order {
      order_id:     self.order_id,
      customer_id:  self.customer_id,
      status:       OrderStatus::parse(&self.status)?,
      pickup_point: self.pickup_point,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}

/// Column list matching [`RawProduct::from_row`].
pub const PRODUCT_COLUMNS: &str = "product_id, name, category, price, is_available";

/// Raw values read directly from a `products` row.
pub struct RawProduct {
  pub product_id:   i64,
  pub name:         String,
  pub category:     String,
  pub price:        String,
  pub is_available: bool,
}

impl RawProduct {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      product_id:   row.get(0)?,
      name:         row.get(1)?,
      category:     row.get(2)?,
      price:        row.get(3)?,
      is_available: row.get(4)?,
    })
  }

  pub fn into_product(self) -> Result<Product> {
    Ok(Product {
      id:           self.product_id,
      name:         self.name,
      category:     self.category,
      price:        decode_decimal(&self.price)?,
      is_available: self.is_available,
    })
  }
}

/// Raw values from `order_items` joined with `products.name`.
pub struct RawCartLine {
  pub order_id:      i64,
  pub product_id:    i64,
  pub quantity:      i64,
  pub price_at_time: String,
  pub product_name:  String,
}

impl RawCartLine {
  pub fn into_line(self) -> Result<CartLine> {
    Ok(CartLine {
      item:         OrderItem {
        order_id:      self.order_id,
        product_id:    self.product_id,
        quantity:      decode_quantity("order_items.quantity", self.quantity)?,
        price_at_time: decode_decimal(&self.price_at_time)?,
      },
      product_name: self.product_name,
    })
  }
}

/// Raw values read directly from a `profiles` row.
pub struct RawProfile {
  pub user_id:    i64,
  pub username:   Option<String>,
  pub full_name:  String,
  pub role:       Option<String>,
  pub created_at: String,
  pub updated_at: String,
}

impl RawProfile {
  pub fn into_profile(self) -> Result<UserProfile> {
    Ok(UserProfile {
      user_id:    self.user_id,
      username:   self.username,
      full_name:  self.full_name,
      role:       self.role.as_deref().map(Role::parse),
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `sessions` row.
pub struct RawSession {
  pub user_id:       i64,
  pub scene:         String,
  pub cart_order_id: Option<i64>,
}

impl RawSession {
  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      user_id:       self.user_id,
      scene:         Scene::parse(&self.scene)?,
      cart_order_id: self.cart_order_id,
    })
  }
}
