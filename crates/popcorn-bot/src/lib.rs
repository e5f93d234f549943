//! Telegram ordering bot for Popcorn Shop.
//!
//! Exposes an axum [`Router`] that receives Bot API webhook deliveries and
//! drives them through the scene and order-lifecycle logic, backed by any
//! [`ShopStore`].

pub mod action;
pub mod auth;
pub mod bot;
pub mod catalog;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod render;
pub mod scene;
pub mod telegram;
pub mod update;

pub use error::Error;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  body::Body,
  extract::{Request, State},
  routing::get,
};
use popcorn_core::store::ShopStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use auth::verify_secret;
use bot::{Bot, BotSettings, PickupPoint};
use telegram::Messenger;
use update::Update;

const MAX_BODY_BYTES: usize = 1024 * 1024;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `POPCORN_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  pub store_path:       PathBuf,
  /// Must match the `secret_token` registered with `setWebhook`.
  pub webhook_secret:   String,
  pub bot_token:        String,
  #[serde(default = "default_api_url")]
  pub telegram_api_url: String,
  #[serde(default = "default_catalog_ttl")]
  pub catalog_ttl_secs: u64,
  #[serde(default = "default_pickup_points")]
  pub pickup_points:    Vec<PickupPoint>,
  #[serde(default = "default_currency")]
  pub currency:         String,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_api_url() -> String { telegram::DEFAULT_API_URL.to_owned() }

fn default_catalog_ttl() -> u64 { catalog::DEFAULT_FRESHNESS.as_secs() }

fn default_pickup_points() -> Vec<PickupPoint> {
  vec![
    PickupPoint { code: "left".to_owned(), label: "Left counter".to_owned() },
    PickupPoint { code: "right".to_owned(), label: "Right counter".to_owned() },
  ]
}

fn default_currency() -> String { "₽".to_owned() }

impl ServerConfig {
  pub fn catalog_ttl(&self) -> Duration { Duration::from_secs(self.catalog_ttl_secs) }

  pub fn bot_settings(&self) -> BotSettings {
    BotSettings {
      pickup_points: self.pickup_points.clone(),
      currency:      self.currency.clone(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, M> {
  pub bot:       Arc<Bot<S>>,
  pub messenger: Arc<M>,
  pub config:    Arc<ServerConfig>,
}

impl<S, M> Clone for AppState<S, M> {
  fn clone(&self) -> Self {
    Self {
      bot:       Arc::clone(&self.bot),
      messenger: Arc::clone(&self.messenger),
      config:    Arc::clone(&self.config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the webhook [`Router`]: `GET /` for liveness, `POST /` for updates.
pub fn router<S, M>(state: AppState<S, M>) -> Router
where
  S: ShopStore + 'static,
  M: Messenger + 'static,
{
  Router::new()
    .route("/", get(liveness).post(webhook::<S, M>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

async fn liveness() -> &'static str { "Bot is running" }

/// The error boundary between the platform and the bot.
///
/// The secret is checked before the body is read. Effects are delivered
/// best-effort: a failed send is logged and the update still counts as
/// handled, so the platform does not redeliver it.
async fn webhook<S, M>(
  State(state): State<AppState<S, M>>,
  req: Request<Body>,
) -> Result<&'static str, Error>
where
  S: ShopStore + 'static,
  M: Messenger + 'static,
{
  verify_secret(req.headers(), &state.config.webhook_secret)?;

  let body = axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES)
    .await
    .map_err(|e| Error::BadRequest(e.to_string()))?;
  let update: Update = serde_json::from_slice(&body).map_err(|e| {
    warn!(error = %e, "undecodable update");
    Error::BadRequest(e.to_string())
  })?;

  let update_id = update.update_id;
  let effects = state
    .bot
    .handle(update.into_event())
    .await
    .inspect_err(|e| error!(update_id, error = %e, "update handling failed"))?;

  for effect in &effects {
    if let Err(e) = state.messenger.deliver(effect).await {
      error!(update_id, error = %e, "effect delivery failed");
    }
  }
  Ok("OK")
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
  };

  use axum::http::{Request, StatusCode};
  use popcorn_core::{
    order::{CartLine, Order, OrderId, OrderStatus},
    product::{NewProduct, Product, ProductId},
    profile::{Role, UserId, UserProfile},
    session::{Scene, Session},
  };
  use popcorn_store_sqlite::SqliteStore;
  use rust_decimal::Decimal;
  use tower::ServiceExt as _;

  use super::*;
  use crate::{action::Action, auth::SECRET_HEADER, catalog::CatalogCache, render::Effect};

  const SECRET: &str = "test-secret";

  #[derive(Default)]
  struct RecordingMessenger {
    sent: Mutex<Vec<Effect>>,
  }

  impl RecordingMessenger {
    fn take(&self) -> Vec<Effect> { std::mem::take(&mut *self.sent.lock().unwrap()) }
  }

  impl Messenger for RecordingMessenger {
    async fn deliver(&self, effect: &Effect) -> Result<(), Error> {
      self.sent.lock().unwrap().push(effect.clone());
      Ok(())
    }
  }

  struct FailingMessenger;

  impl Messenger for FailingMessenger {
    async fn deliver(&self, _: &Effect) -> Result<(), Error> {
      Err(Error::Telegram("chat not found".into()))
    }
  }

  /// SQLite underneath, with failures that can be switched on mid-test.
  struct FlakyStore {
    inner:           SqliteStore,
    fail_save:       AtomicBool,
    fail_cart_reads: AtomicBool,
  }

  #[derive(Debug, thiserror::Error)]
  enum FlakyError {
    #[error(transparent)]
    Store(#[from] popcorn_store_sqlite::Error),
    #[error("injected failure")]
    Injected,
  }

  impl FlakyStore {
    fn new(inner: SqliteStore) -> Self {
      Self {
        inner,
        fail_save: AtomicBool::new(false),
        fail_cart_reads: AtomicBool::new(false),
      }
    }
  }

  impl ShopStore for FlakyStore {
    type Error = FlakyError;

    async fn upsert_profile(
      &self,
      user_id: UserId,
      username: Option<String>,
      full_name: String,
    ) -> Result<(), FlakyError> {
      Ok(self.inner.upsert_profile(user_id, username, full_name).await?)
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, FlakyError> {
      Ok(self.inner.get_profile(user_id).await?)
    }

    async fn get_profile_role(&self, user_id: UserId) -> Result<Option<Role>, FlakyError> {
      Ok(self.inner.get_profile_role(user_id).await?)
    }

    async fn set_profile_role(&self, user_id: UserId, role: Role) -> Result<bool, FlakyError> {
      Ok(self.inner.set_profile_role(user_id, role).await?)
    }

    async fn list_staff(&self, station: &str) -> Result<Vec<UserProfile>, FlakyError> {
      Ok(self.inner.list_staff(station).await?)
    }

    async fn list_available_products(&self) -> Result<Vec<Product>, FlakyError> {
      Ok(self.inner.list_available_products().await?)
    }

    async fn find_cart_order(&self, customer_id: UserId) -> Result<Option<Order>, FlakyError> {
      if self.fail_cart_reads.load(Ordering::SeqCst) {
        return Err(FlakyError::Injected);
      }
      Ok(self.inner.find_cart_order(customer_id).await?)
    }

    async fn create_order(&self, customer_id: UserId) -> Result<Option<Order>, FlakyError> {
      Ok(self.inner.create_order(customer_id).await?)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, FlakyError> {
      Ok(self.inner.get_order(order_id).await?)
    }

    async fn find_order_by_id_and_status(
      &self,
      order_id: OrderId,
      status: OrderStatus,
    ) -> Result<Option<Order>, FlakyError> {
      Ok(self.inner.find_order_by_id_and_status(order_id, status).await?)
    }

    async fn update_order_status(
      &self,
      order_id: OrderId,
      from: OrderStatus,
      to: OrderStatus,
    ) -> Result<bool, FlakyError> {
      Ok(self.inner.update_order_status(order_id, from, to).await?)
    }

    async fn submit_cart(&self, order_id: OrderId, pickup_point: String) -> Result<bool, FlakyError> {
      Ok(self.inner.submit_cart(order_id, pickup_point).await?)
    }

    async fn list_customer_orders(&self, customer_id: UserId) -> Result<Vec<Order>, FlakyError> {
      Ok(self.inner.list_customer_orders(customer_id).await?)
    }

    async fn list_orders_by_status(
      &self,
      status: OrderStatus,
      pickup_point: Option<&str>,
    ) -> Result<Vec<Order>, FlakyError> {
      Ok(self.inner.list_orders_by_status(status, pickup_point).await?)
    }

    async fn upsert_order_item(
      &self,
      order_id: OrderId,
      product_id: ProductId,
      quantity: u32,
      price: Decimal,
    ) -> Result<bool, FlakyError> {
      Ok(self.inner.upsert_order_item(order_id, product_id, quantity, price).await?)
    }

    async fn remove_order_item(
      &self,
      order_id: OrderId,
      product_id: ProductId,
    ) -> Result<bool, FlakyError> {
      Ok(self.inner.remove_order_item(order_id, product_id).await?)
    }

    async fn list_cart_lines(&self, order_id: OrderId) -> Result<Vec<CartLine>, FlakyError> {
      Ok(self.inner.list_cart_lines(order_id).await?)
    }

    async fn count_items_for_customer_cart(&self, customer_id: UserId) -> Result<u32, FlakyError> {
      Ok(self.inner.count_items_for_customer_cart(customer_id).await?)
    }

    async fn load_session(&self, user_id: UserId) -> Result<Option<Session>, FlakyError> {
      Ok(self.inner.load_session(user_id).await?)
    }

    async fn save_session(&self, session: &Session) -> Result<(), FlakyError> {
      if self.fail_save.load(Ordering::SeqCst) {
        return Err(FlakyError::Injected);
      }
      Ok(self.inner.save_session(session).await?)
    }
  }

  /// A flaky-store bot with one product and one `seller_left` staff member
  /// (user 20). Returns the product id.
  async fn flaky_setup() -> (
    SqliteStore,
    Arc<RecordingMessenger>,
    AppState<FlakyStore, RecordingMessenger>,
    ProductId,
  ) {
    let inner = SqliteStore::open_in_memory().await.unwrap();
    let salted = inner
      .add_product(NewProduct::new("Salted", "popcorn", Decimal::from(150)))
      .await
      .unwrap()
      .id;
    inner.upsert_profile(20, None, "Staff".into()).await.unwrap();
    inner.set_profile_role(20, Role::parse("seller_left")).await.unwrap();

    let sent = Arc::new(RecordingMessenger::default());
    let state = make_state(FlakyStore::new(inner.clone()), Arc::clone(&sent));
    (inner, sent, state, salted)
  }

  fn config() -> ServerConfig {
    ServerConfig {
      host:             "127.0.0.1".to_owned(),
      port:             8080,
      store_path:       PathBuf::from(":memory:"),
      webhook_secret:   SECRET.to_owned(),
      bot_token:        "123:abc".to_owned(),
      telegram_api_url: default_api_url(),
      catalog_ttl_secs: 300,
      pickup_points:    default_pickup_points(),
      currency:         default_currency(),
    }
  }

  fn make_state<S: ShopStore, M>(store: S, messenger: Arc<M>) -> AppState<S, M> {
    let config = config();
    AppState {
      bot: Arc::new(Bot::new(
        Arc::new(store),
        Arc::new(CatalogCache::new(config.catalog_ttl())),
        config.bot_settings(),
      )),
      messenger,
      config: Arc::new(config),
    }
  }

  struct Harness {
    store: SqliteStore,
    sent:  Arc<RecordingMessenger>,
    state: AppState<SqliteStore, RecordingMessenger>,
  }

  impl Harness {
    async fn new() -> Self {
      let store = SqliteStore::open_in_memory().await.unwrap();
      let sent = Arc::new(RecordingMessenger::default());
      let state = make_state(store.clone(), Arc::clone(&sent));
      Self { store, sent, state }
    }

    async fn product(&self, name: &str, available: bool) -> ProductId {
      let mut input = NewProduct::new(name, "popcorn", Decimal::from(150));
      input.is_available = available;
      self.store.add_product(input).await.unwrap().id
    }

    async fn staff(&self, user_id: i64, role: &str) {
      self.store.upsert_profile(user_id, None, "Staff".into()).await.unwrap();
      self.store.set_profile_role(user_id, Role::parse(role)).await.unwrap();
    }

    async fn post(&self, body: String) -> Vec<Effect> {
      let resp = post(self.state.clone(), Some(SECRET), body).await;
      assert_eq!(resp.status(), StatusCode::OK);
      self.sent.take()
    }

    async fn start(&self, user_id: i64) -> Vec<Effect> { self.post(start_update(user_id)).await }

    async fn press(&self, user_id: i64, data: &str) -> Vec<Effect> {
      self.post(callback_update(user_id, data)).await
    }
  }

  async fn post<S: ShopStore + 'static, M: Messenger + 'static>(
    state: AppState<S, M>,
    secret: Option<&str>,
    body: String,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method("POST").uri("/");
    if let Some(secret) = secret {
      builder = builder.header(SECRET_HEADER, secret);
    }
    let req = builder.body(Body::from(body)).unwrap();
    router(state).oneshot(req).await.unwrap()
  }

  fn start_update(user_id: i64) -> String {
    format!(
      r#"{{"update_id":1,"message":{{"message_id":1,
          "from":{{"id":{user_id},"is_bot":false,"first_name":"User","username":"u{user_id}"}},
          "chat":{{"id":{user_id},"type":"private"}},"date":0,"text":"/start"}}}}"#
    )
  }

  fn callback_update(user_id: i64, data: &str) -> String {
    format!(
      r#"{{"update_id":2,"callback_query":{{"id":"cb-{user_id}",
          "from":{{"id":{user_id},"is_bot":false,"first_name":"User"}},
          "message":{{"message_id":50,"chat":{{"id":{user_id}}}}},
          "data":"{data}"}}}}"#
    )
  }

  fn answer_text(effects: &[Effect]) -> Option<&str> {
    effects.iter().find_map(|e| match e {
      Effect::Answer { text, .. } => Some(text.as_deref().unwrap_or_default()),
      _ => None,
    })
  }

  fn texts(effects: &[Effect]) -> String {
    effects
      .iter()
      .filter_map(Effect::text)
      .collect::<Vec<_>>()
      .join("\n---\n")
  }

  fn replies_to(effects: &[Effect], chat: i64) -> Vec<&Effect> {
    effects
      .iter()
      .filter(|e| matches!(e, Effect::Reply { chat_id, .. } if *chat_id == chat))
      .collect()
  }

  fn button_labels(effects: &[Effect]) -> Vec<&str> {
    effects
      .iter()
      .flat_map(|e| match e {
        Effect::Reply { keyboard, .. } | Effect::Edit { keyboard, .. } => keyboard.as_slice(),
        Effect::Answer { .. } => [].as_slice(),
      })
      .flatten()
      .map(|b| b.label.as_str())
      .collect()
  }

  async fn body_string(resp: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
  }

  // ── Transport boundary ─────────────────────────────────────────────────────

  #[tokio::test]
  async fn get_is_liveness() {
    let h = Harness::new().await;
    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    let resp = router(h.state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "Bot is running");
  }

  #[tokio::test]
  async fn missing_or_wrong_secret_is_unauthorized() {
    let h = Harness::new().await;
    for secret in [None, Some("nope")] {
      let resp = post(h.state.clone(), secret, start_update(1)).await;
      assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
    assert!(h.sent.take().is_empty());
    assert_eq!(h.store.get_profile_role(1).await.unwrap(), None);
    assert!(h.store.load_session(1).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn malformed_payload_is_a_generic_error() {
    let h = Harness::new().await;
    let resp = post(h.state.clone(), Some(SECRET), "{not json".into()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(resp).await, "Error");
  }

  #[tokio::test]
  async fn delivery_failures_do_not_fail_the_update() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let state = make_state(store, Arc::new(FailingMessenger));
    let resp = post(state, Some(SECRET), start_update(1)).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn non_command_messages_are_acknowledged() {
    let h = Harness::new().await;
    let body = r#"{"update_id":9,"message":{"message_id":1,"chat":{"id":1},"text":"hi"}}"#;
    assert!(h.post(body.to_owned()).await.is_empty());
  }

  #[tokio::test]
  async fn failed_session_save_still_delivers_the_outcome() {
    let (inner, sent, state, salted) = flaky_setup().await;
    for body in [start_update(10), callback_update(10, &format!("add_{salted}"))] {
      assert_eq!(post(state.clone(), Some(SECRET), body).await.status(), StatusCode::OK);
    }
    sent.take();

    state.bot.store.fail_save.store(true, Ordering::SeqCst);
    let resp = post(state.clone(), Some(SECRET), callback_update(10, "confirm_left")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let effects = sent.take();
    assert!(texts(&effects).contains("placed"), "{effects:?}");
    assert_eq!(replies_to(&effects, 20).len(), 1);
    let order = inner.list_customer_orders(10).await.unwrap()[0].clone();
    assert_eq!(order.status, OrderStatus::Pending);
  }

  #[tokio::test]
  async fn start_renders_menu_when_session_save_fails() {
    let (_, sent, state, _) = flaky_setup().await;
    state.bot.store.fail_save.store(true, Ordering::SeqCst);

    let resp = post(state.clone(), Some(SECRET), start_update(10)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(texts(&sent.take()).contains("Welcome"));
  }

  // ── Scenes ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn new_user_lands_in_customer_menu() {
    let h = Harness::new().await;
    let effects = h.start(10).await;

    let Some(Effect::Reply { chat_id, text, keyboard }) = effects.first() else {
      panic!("expected a reply: {effects:?}");
    };
    assert_eq!(*chat_id, 10);
    assert!(text.contains("Welcome"), "{text}");
    assert_eq!(keyboard[0][0].action, Action::ShowMenu);
    assert_eq!(keyboard[1][0].label, "🛒 Cart (0)");

    assert_eq!(h.store.get_profile_role(10).await.unwrap(), None);
    let session = h.store.load_session(10).await.unwrap().unwrap();
    assert_eq!(session.scene, Scene::Customer);
  }

  #[tokio::test]
  async fn seller_lands_in_seller_scene() {
    let h = Harness::new().await;
    h.staff(20, "seller_counter").await;

    let effects = h.start(20).await;
    assert!(texts(&effects).contains("staff panel"), "{effects:?}");
    let session = h.store.load_session(20).await.unwrap().unwrap();
    assert_eq!(session.scene, Scene::Seller);
  }

  #[tokio::test]
  async fn unknown_action_is_only_acknowledged() {
    let h = Harness::new().await;
    h.start(10).await;
    let effects = h.press(10, "definitely_not_a_key").await;
    assert_eq!(effects, vec![Effect::Answer { callback_id: "cb-10".into(), text: None }]);
  }

  #[tokio::test]
  async fn seller_actions_do_nothing_in_customer_scene() {
    let h = Harness::new().await;
    let product = h.product("Salted", true).await;
    h.start(10).await;
    h.press(10, &format!("add_{product}")).await;
    h.press(10, "confirm_left").await;
    let order = h.store.list_customer_orders(10).await.unwrap()[0].clone();
    assert_eq!(order.status, OrderStatus::Pending);

    let effects = h.press(10, &format!("take_{}", order.order_id)).await;
    assert_eq!(effects.len(), 1);
    let order = h.store.get_order(order.order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
  }

  #[tokio::test]
  async fn press_without_session_derives_scene_from_role() {
    let h = Harness::new().await;
    h.staff(20, "seller_left").await;
    let effects = h.press(20, "new_orders").await;
    assert!(texts(&effects).contains("No new orders"), "{effects:?}");
  }

  #[tokio::test]
  async fn revoked_seller_is_sent_back_to_customer_scene() {
    let h = Harness::new().await;
    h.staff(20, "seller_left").await;
    h.start(20).await;
    h.store.set_profile_role(20, Role::Customer).await.unwrap();

    let effects = h.press(20, "new_orders").await;
    assert_eq!(answer_text(&effects), Some("⛔ Staff only."));
    let session = h.store.load_session(20).await.unwrap().unwrap();
    assert_eq!(session.scene, Scene::Customer);
  }

  #[tokio::test]
  async fn back_to_main_re_enters_by_role() {
    let h = Harness::new().await;
    h.start(10).await;
    h.staff(10, "seller_right").await;

    let effects = h.press(10, "back_to_main").await;
    assert!(texts(&effects).contains("Right counter staff panel"), "{effects:?}");
    let session = h.store.load_session(10).await.unwrap().unwrap();
    assert_eq!(session.scene, Scene::Seller);
  }

  // ── Cart ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn adding_unavailable_product_changes_nothing() {
    let h = Harness::new().await;
    let hidden = h.product("Truffle", false).await;
    h.start(10).await;

    for key in [format!("add_{hidden}"), "add_17".to_owned()] {
      let effects = h.press(10, &key).await;
      assert_eq!(answer_text(&effects), Some("Sorry, that item is not available."));
    }
    assert!(h.store.list_customer_orders(10).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn add_then_cart_badge_counts_items() {
    let h = Harness::new().await;
    let salted = h.product("Salted", true).await;
    let caramel = h.product("Caramel", true).await;
    h.start(10).await;

    let effects = h.press(10, &format!("add_{salted}")).await;
    assert_eq!(answer_text(&effects), Some("Salted added to your cart!"));
    h.press(10, &format!("add_{salted}")).await;
    h.press(10, &format!("add_{caramel}")).await;

    let session = h.store.load_session(10).await.unwrap().unwrap();
    assert!(session.cart_order_id.is_some());

    let effects = h.press(10, "back_to_main").await;
    let Some(Effect::Edit { keyboard, .. }) = effects.iter().find(|e| matches!(e, Effect::Edit { .. })) else {
      panic!("expected an edit: {effects:?}");
    };
    assert_eq!(keyboard[1][0].label, "🛒 Cart (2)");
  }

  #[tokio::test]
  async fn checkout_with_unknown_pickup_point_asks_again() {
    let h = Harness::new().await;
    let salted = h.product("Salted", true).await;
    h.start(10).await;
    h.press(10, &format!("add_{salted}")).await;

    let effects = h.press(10, "confirm_moon").await;
    assert!(texts(&effects).contains("Where will you pick up"), "{effects:?}");
    assert!(h.store.find_cart_order(10).await.unwrap().is_some());
  }

  #[tokio::test]
  async fn checkout_reports_store_failure_instead_of_empty_cart() {
    let (_, sent, state, salted) = flaky_setup().await;
    for body in [start_update(10), callback_update(10, &format!("add_{salted}"))] {
      post(state.clone(), Some(SECRET), body).await;
    }
    sent.take();

    state.bot.store.fail_cart_reads.store(true, Ordering::SeqCst);
    post(state.clone(), Some(SECRET), callback_update(10, "checkout")).await;
    let effects = sent.take();
    assert_eq!(
      answer_text(&effects),
      Some("⚠️ Something went wrong, please try again.")
    );
  }

  #[tokio::test]
  async fn overlong_category_is_left_off_the_menu() {
    let h = Harness::new().await;
    h.product("Salted", true).await;
    h.store
      .add_product(NewProduct::new("Mystery", "x".repeat(80), Decimal::from(10)))
      .await
      .unwrap();
    h.start(10).await;

    let effects = h.press(10, "show_menu").await;
    let Some(Effect::Edit { keyboard, .. }) = effects.iter().find(|e| matches!(e, Effect::Edit { .. })) else {
      panic!("expected an edit: {effects:?}");
    };
    let actions: Vec<&Action> = keyboard.iter().flatten().map(|b| &b.action).collect();
    assert_eq!(actions, [&Action::Category("popcorn".into()), &Action::BackToMain]);
  }

  // ── Full order flow ────────────────────────────────────────────────────────

  #[tokio::test]
  async fn order_flows_from_cart_to_completed() {
    let h = Harness::new().await;
    let salted = h.product("Salted", true).await;
    h.staff(20, "seller_left").await;
    h.staff(21, "seller_left").await;
    h.staff(30, "seller_right").await;
    h.start(10).await;

    h.press(10, &format!("add_{salted}")).await;
    let effects = h.press(10, "confirm_left").await;
    assert!(texts(&effects).contains("placed"), "{effects:?}");
    assert_eq!(replies_to(&effects, 20).len(), 1);
    assert_eq!(replies_to(&effects, 21).len(), 1);
    assert!(replies_to(&effects, 30).is_empty());

    let order_id = h.store.list_customer_orders(10).await.unwrap()[0].order_id;
    let take = format!("take_{order_id}");

    let text = texts(&h.start(10).await);
    assert!(
      text.contains(&format!("Your current order #{order_id}: Awaiting staff")),
      "{text}"
    );
    assert!(text.contains("Pickup: Left counter"), "{text}");
    assert!(text.contains("Total: 150 ₽"), "{text}");

    let effects = h.press(20, "new_orders").await;
    let labels = button_labels(&effects);
    assert!(
      labels
        .iter()
        .any(|l| l.starts_with(&format!("#{order_id} ")) && l.ends_with("· User · 150 ₽ · Take")),
      "{labels:?}"
    );

    let effects = h.press(20, &take).await;
    assert!(texts(&effects).contains(&format!("You took order #{order_id}")));
    assert_eq!(replies_to(&effects, 10).len(), 1);

    let effects = h.press(21, &take).await;
    assert_eq!(
      answer_text(&effects),
      Some("This order was already taken or no longer exists.")
    );

    let effects = h.press(20, &format!("complete_{order_id}")).await;
    assert_eq!(answer_text(&effects), Some("This order is not ready yet."));

    let effects = h.press(20, &format!("ready_{order_id}")).await;
    assert!(texts(&effects).contains("Pick it up at Left counter"), "{effects:?}");

    h.press(20, &format!("complete_{order_id}")).await;
    let order = h.store.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Completed);

    let effects = h.press(10, "my_orders").await;
    assert!(texts(&effects).contains("Completed"), "{effects:?}");

    let text = texts(&h.start(10).await);
    assert!(!text.contains("Your current order"), "{text}");
  }
}
