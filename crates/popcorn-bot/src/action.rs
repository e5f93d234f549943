//! Structured event keys carried in inline-button callback data.

use std::fmt;

use popcorn_core::{order::OrderId, product::ProductId};

/// Bot API limit on a button's `callback_data`, in bytes.
pub const MAX_KEY_LEN: usize = 64;

/// A button press, decoded from its callback data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  // ── Customer ─────────────────────────────────────────────────────────────
  ShowMenu,
  Category(String),
  Add(ProductId),
  ShowCart,
  Remove(ProductId),
  Checkout,
  Confirm(String),
  MyOrders,
  BackToMain,

  // ── Seller ───────────────────────────────────────────────────────────────
  NewOrders,
  PreparingOrders,
  ReadyOrders,
  Take(OrderId),
  Ready(OrderId),
  Complete(OrderId),

  /// Anything else; dispatched as a no-op.
  Unknown(String),
}

impl Action {
  /// Decode callback data. Never fails.
  pub fn parse(key: &str) -> Self {
    match key {
      "show_menu" => return Self::ShowMenu,
      "show_cart" => return Self::ShowCart,
      "checkout" => return Self::Checkout,
      "my_orders" => return Self::MyOrders,
      "back_to_main" => return Self::BackToMain,
      "new_orders" => return Self::NewOrders,
      "preparing_orders" => return Self::PreparingOrders,
      "ready_orders" => return Self::ReadyOrders,
      _ => {}
    }

    let Some((prefix, arg)) = key.split_once('_') else {
      return Self::Unknown(key.to_owned());
    };

    let parsed = match prefix {
      "category" if !arg.is_empty() => Some(Self::Category(arg.to_owned())),
      "confirm" if !arg.is_empty() => Some(Self::Confirm(arg.to_owned())),
      "add" => arg.parse().ok().map(Self::Add),
      "remove" => arg.parse().ok().map(Self::Remove),
      "take" => arg.parse().ok().map(Self::Take),
      "ready" => arg.parse().ok().map(Self::Ready),
      "complete" => arg.parse().ok().map(Self::Complete),
      _ => None,
    };
    parsed.unwrap_or_else(|| Self::Unknown(key.to_owned()))
  }

  /// Whether the key fits in a button. Free-text arguments can overflow it.
  pub fn fits_button(&self) -> bool { self.to_string().len() <= MAX_KEY_LEN }
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::ShowMenu => f.write_str("show_menu"),
      Self::Category(c) => write!(f, "category_{c}"),
      Self::Add(id) => write!(f, "add_{id}"),
      Self::ShowCart => f.write_str("show_cart"),
      Self::Remove(id) => write!(f, "remove_{id}"),
      Self::Checkout => f.write_str("checkout"),
      Self::Confirm(point) => write!(f, "confirm_{point}"),
      Self::MyOrders => f.write_str("my_orders"),
      Self::BackToMain => f.write_str("back_to_main"),
      Self::NewOrders => f.write_str("new_orders"),
      Self::PreparingOrders => f.write_str("preparing_orders"),
      Self::ReadyOrders => f.write_str("ready_orders"),
      Self::Take(id) => write!(f, "take_{id}"),
      Self::Ready(id) => write!(f, "ready_{id}"),
      Self::Complete(id) => write!(f, "complete_{id}"),
      Self::Unknown(key) => f.write_str(key),
    }
  }
}
