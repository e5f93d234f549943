//! Abstract outbound actions. The transport decides how they are encoded.

use popcorn_core::order::{CartLine, Order, cart_total};
use rust_decimal::Decimal;

use crate::action::Action;

// ─── Keyboards ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
  pub label:  String,
  pub action: Action,
}

/// Rows of buttons.
pub type Keyboard = Vec<Vec<Button>>;

/// Text plus keyboard; what a handler shows the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Screen {
  pub text:     String,
  pub keyboard: Keyboard,
}

impl Screen {
  pub fn new(text: impl Into<String>) -> Self {
    Self { text: text.into(), keyboard: Vec::new() }
  }

  /// Append a row holding a single button.
  pub fn row(mut self, label: impl Into<String>, action: Action) -> Self {
    self.keyboard.push(vec![Button { label: label.into(), action }]);
    self
  }
}

// ─── Effects ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
  /// Send a new message.
  Reply {
    chat_id:  i64,
    text:     String,
    keyboard: Keyboard,
  },
  /// Replace the text and keyboard of an existing message.
  Edit {
    chat_id:    i64,
    message_id: i64,
    text:       String,
    keyboard:   Keyboard,
  },
  /// Acknowledge a button press, optionally with a toast.
  Answer {
    callback_id: String,
    text:        Option<String>,
  },
}

impl Effect {
  pub fn reply(chat_id: i64, screen: Screen) -> Self {
    Self::Reply { chat_id, text: screen.text, keyboard: screen.keyboard }
  }

  pub fn text(&self) -> Option<&str> {
    match self {
      Self::Reply { text, .. } | Self::Edit { text, .. } => Some(text),
      Self::Answer { text, .. } => text.as_deref(),
    }
  }
}

// ─── Formatting ──────────────────────────────────────────────────────────────

pub fn money(amount: Decimal, currency: &str) -> String {
  format!("{} {currency}", amount.round_dp(2).normalize())
}

/// One line per item followed by the total.
pub fn cart_summary(lines: &[CartLine], currency: &str) -> String {
  let mut out = String::new();
  for line in lines {
    out.push_str(&format!(
      "• {} × {} = {}\n",
      line.product_name,
      line.item.quantity,
      money(line.line_total(), currency),
    ));
  }
  out.push_str(&format!("\nTotal: {}", money(cart_total(lines), currency)));
  out
}

/// Header used on order cards for staff and customers.
pub fn order_header(order: &Order) -> String {
  let mut out = format!("Order #{} · {}", order.order_id, order.status.label());
  if let Some(point) = &order.pickup_point {
    out.push_str(&format!("\nPickup: {point}"));
  }
  out
}
