//! Delivery of [`Effect`]s through the Telegram Bot API.

use std::{future::Future, time::Duration};

use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::{
  error::Error,
  render::{Effect, Keyboard},
};

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Sends effects to the chat platform.
pub trait Messenger: Send + Sync {
  fn deliver<'a>(
    &'a self,
    effect: &'a Effect,
  ) -> impl Future<Output = Result<(), Error>> + Send + 'a;
}

/// Bot API client. Cheap to clone; the inner [`reqwest::Client`] is
/// `Arc`-based.
#[derive(Clone)]
pub struct TelegramClient {
  client:  Client,
  api_url: String,
  token:   String,
}

#[derive(Deserialize)]
struct ApiResponse {
  ok:          bool,
  #[serde(default)]
  description: Option<String>,
}

impl TelegramClient {
  pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Result<Self, Error> {
    let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
    Ok(Self { client, api_url: api_url.into(), token: token.into() })
  }

  fn url(&self, method: &str) -> String {
    format!(
      "{}/bot{}/{method}",
      self.api_url.trim_end_matches('/'),
      self.token
    )
  }

  async fn call(&self, method: &str, body: Value) -> Result<(), Error> {
    let resp: ApiResponse = self
      .client
      .post(self.url(method))
      .json(&body)
      .send()
      .await?
      .json()
      .await?;

    if !resp.ok {
      return Err(Error::Telegram(format!(
        "{method}: {}",
        resp.description.unwrap_or_else(|| "no description".to_owned())
      )));
    }
    debug!(method, "bot api call ok");
    Ok(())
  }
}

/// The JSON body of a Bot API request for `effect`, with its method name.
pub fn encode(effect: &Effect) -> (&'static str, Value) {
  match effect {
    Effect::Reply { chat_id, text, keyboard } => {
      let mut body = json!({ "chat_id": chat_id, "text": text });
      if !keyboard.is_empty() {
        body["reply_markup"] = reply_markup(keyboard);
      }
      ("sendMessage", body)
    }
    Effect::Edit { chat_id, message_id, text, keyboard } => {
      let body = json!({
        "chat_id": chat_id,
        "message_id": message_id,
        "text": text,
        "reply_markup": reply_markup(keyboard),
      });
      ("editMessageText", body)
    }
    Effect::Answer { callback_id, text } => {
      let mut body = json!({ "callback_query_id": callback_id });
      if let Some(text) = text {
        body["text"] = json!(text);
      }
      ("answerCallbackQuery", body)
    }
  }
}

fn reply_markup(keyboard: &Keyboard) -> Value {
  let rows: Vec<Vec<Value>> = keyboard
    .iter()
    .map(|row| {
      row
        .iter()
        .map(|b| json!({ "text": b.label, "callback_data": b.action.to_string() }))
        .collect()
    })
    .collect();
  json!({ "inline_keyboard": rows })
}

impl Messenger for TelegramClient {
  async fn deliver(&self, effect: &Effect) -> Result<(), Error> {
    let (method, body) = encode(effect);
    self.call(method, body).await
  }
}
