//! Inbound Telegram Bot API payloads and their reduction to bot events.
//!
//! Only the fields the bot reads are modelled; serde ignores the rest.

use popcorn_core::profile::UserId;
use serde::Deserialize;

use crate::action::Action;

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
  pub update_id:      i64,
  #[serde(default)]
  pub message:        Option<Message>,
  #[serde(default)]
  pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
  pub id:         UserId,
  pub first_name: String,
  #[serde(default)]
  pub last_name:  Option<String>,
  #[serde(default)]
  pub username:   Option<String>,
}

impl User {
  pub fn full_name(&self) -> String {
    match &self.last_name {
      Some(last) => format!("{} {last}", self.first_name).trim().to_owned(),
      None => self.first_name.trim().to_owned(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
  pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
  pub message_id: i64,
  #[serde(default)]
  pub from:       Option<User>,
  pub chat:       Chat,
  #[serde(default)]
  pub text:       Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
  pub id:      String,
  pub from:    User,
  #[serde(default)]
  pub message: Option<Message>,
  #[serde(default)]
  pub data:    Option<String>,
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// The message a button was attached to; edited in place when re-rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
  pub chat_id:    i64,
  pub message_id: i64,
}

/// What the bot does with an update.
#[derive(Debug, Clone)]
pub enum Event {
  /// The `/start` command.
  Start { user: User, chat_id: i64 },
  /// An inline-button press.
  Action {
    user:        User,
    callback_id: String,
    origin:      Option<MessageRef>,
    action:      Action,
  },
  /// Anything the bot does not react to.
  Ignored,
}

impl Update {
  pub fn into_event(self) -> Event {
    if let Some(query) = self.callback_query {
      let origin = query.message.as_ref().map(|m| MessageRef {
        chat_id:    m.chat.id,
        message_id: m.message_id,
      });
      let action = Action::parse(query.data.as_deref().unwrap_or_default());
      return Event::Action {
        user: query.from,
        callback_id: query.id,
        origin,
        action,
      };
    }

    match self.message {
      Some(Message { from: Some(user), chat, text: Some(text), .. })
        if is_start_command(&text) =>
      {
        Event::Start { user, chat_id: chat.id }
      }
      _ => Event::Ignored,
    }
  }
}

/// `/start`, `/start <payload>` or `/start@SomeBot`.
fn is_start_command(text: &str) -> bool {
  let command = text.split_whitespace().next().unwrap_or_default();
  let command = command.split('@').next().unwrap_or_default();
  command == "/start"
}
