//! Catalog products.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type ProductId = i64;

/// A catalog entry. Read-only from the bot's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
  pub id:           ProductId,
  pub name:         String,
  /// Free-text grouping, e.g. `popcorn`, `drinks`.
  pub category:     String,
  pub price:        Decimal,
  pub is_available: bool,
}

/// Input for seeding a product into a store.
#[derive(Debug, Clone)]
pub struct NewProduct {
  pub name:         String,
  pub category:     String,
  pub price:        Decimal,
  pub is_available: bool,
}

impl NewProduct {
  /// An available product.
  pub fn new(name: impl Into<String>, category: impl Into<String>, price: Decimal) -> Self {
    Self {
      name: name.into(),
      category: category.into(),
      price,
      is_available: true,
    }
  }
}
