//! The per-event driver.
//!
//! Each event loads the user's session, runs it through the scene dispatch
//! table and saves it again. Handlers never talk to the transport; they push
//! [`Effect`]s onto a [`Ctx`] and the caller delivers them.

use std::sync::Arc;

use popcorn_core::{
  profile::{Role, UserId},
  session::{Scene, Session},
  store::ShopStore,
};
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::{
  catalog::CatalogCache,
  error::Error,
  handlers,
  lifecycle::Lifecycle,
  render::{Effect, Screen},
  scene,
  update::{Event, MessageRef, User},
};

// ─── Settings ────────────────────────────────────────────────────────────────

/// A counter customers can collect orders from. `code` matches the station
/// in staff roles (`seller_<code>`).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PickupPoint {
  pub code:  String,
  pub label: String,
}

#[derive(Debug, Clone)]
pub struct BotSettings {
  pub pickup_points: Vec<PickupPoint>,
  pub currency:      String,
}

impl BotSettings {
  pub fn pickup_point(&self, code: &str) -> Option<&PickupPoint> {
    self.pickup_points.iter().find(|p| p.code == code)
  }

  /// Display label for a station code; the code itself if unconfigured.
  pub fn station_label<'a>(&'a self, code: &'a str) -> &'a str {
    self.pickup_point(code).map_or(code, |p| p.label.as_str())
  }
}

// ─── Context ─────────────────────────────────────────────────────────────────

/// Everything a handler needs about the event in flight, plus the effects it
/// has produced so far.
pub struct Ctx {
  pub session: Session,
  pub user:    User,
  pub chat_id: i64,
  origin:      Option<MessageRef>,
  callback_id: Option<String>,
  answered:    bool,
  effects:     Vec<Effect>,
}

impl Ctx {
  fn new(
    session: Session,
    user: User,
    chat_id: i64,
    origin: Option<MessageRef>,
    callback_id: Option<String>,
  ) -> Self {
    Self {
      session,
      user,
      chat_id,
      origin,
      callback_id,
      answered: false,
      effects: Vec::new(),
    }
  }

  /// Show a screen to the acting user: edit the pressed message in place, or
  /// send a new one.
  pub fn show(&mut self, screen: Screen) {
    let effect = match self.origin {
      Some(origin) => Effect::Edit {
        chat_id:    origin.chat_id,
        message_id: origin.message_id,
        text:       screen.text,
        keyboard:   screen.keyboard,
      },
      None => Effect::reply(self.chat_id, screen),
    };
    self.effects.push(effect);
  }

  /// Toast on the pressed button. Only the first answer is kept.
  pub fn answer(&mut self, text: impl Into<String>) {
    let Some(callback_id) = &self.callback_id else {
      // A command, not a button press; say it in the chat instead.
      self.effects.push(Effect::reply(self.chat_id, Screen::new(text)));
      return;
    };
    if self.answered {
      debug!(callback_id, "callback already answered");
      return;
    }
    self.answered = true;
    self.effects.insert(0, Effect::Answer {
      callback_id: callback_id.clone(),
      text:        Some(text.into()),
    });
  }

  /// Send a message to someone else, e.g. staff or the ordering customer.
  pub fn notify(&mut self, chat_id: UserId, screen: Screen) {
    self.effects.push(Effect::reply(chat_id, screen));
  }

  /// The effects to deliver. Button presses are always acknowledged.
  fn finish(mut self) -> Vec<Effect> {
    if let Some(callback_id) = self.callback_id.take()
      && !self.answered
    {
      self.effects.insert(0, Effect::Answer { callback_id, text: None });
    }
    self.effects
  }
}

// ─── Bot ─────────────────────────────────────────────────────────────────────

pub struct Bot<S> {
  pub store:    Arc<S>,
  pub catalog:  Arc<CatalogCache>,
  pub settings: BotSettings,
}

impl<S: ShopStore> Bot<S> {
  pub fn new(store: Arc<S>, catalog: Arc<CatalogCache>, settings: BotSettings) -> Self {
    Self { store, catalog, settings }
  }

  pub fn lifecycle(&self) -> Lifecycle<'_, S> {
    Lifecycle::new(&*self.store, &*self.catalog)
  }

  /// Handle one event. Fails only when the session cannot be loaded, before
  /// anything has changed; everything else is reported to the user.
  pub async fn handle(&self, event: Event) -> Result<Vec<Effect>, Error> {
    match event {
      Event::Start { user, chat_id } => self.start(user, chat_id).await,
      Event::Action { user, callback_id, origin, action } => {
        let session = self.session_for(user.id).await?;
        let chat_id = origin.map_or(user.id, |o| o.chat_id);
        let mut ctx = Ctx::new(session, user, chat_id, origin, Some(callback_id));

        scene::dispatch(self, &mut ctx, action).await;

        self.persist(&ctx.session).await;
        Ok(ctx.finish())
      }
      Event::Ignored => Ok(Vec::new()),
    }
  }

  async fn start(&self, user: User, chat_id: i64) -> Result<Vec<Effect>, Error> {
    if let Err(e) = self
      .store
      .upsert_profile(user.id, user.username.clone(), user.full_name())
      .await
    {
      error!(user_id = user.id, error = %e, "profile upsert failed");
    }

    let role = self.role_of(user.id).await;
    let mut ctx = Ctx::new(Session::new(user.id, Scene::default()), user, chat_id, None, None);
    scene::enter_scene(&mut ctx.session, role.as_ref());
    self.persist(&ctx.session).await;

    handlers::entry(self, &mut ctx, role.as_ref(), "Welcome to Popcorn Shop!").await;
    Ok(ctx.finish())
  }

  /// Save the session after the event has run.
  ///
  /// Order state is already committed when this runs, so a failed save is
  /// logged and the effects still go out. Seller actions re-read the role and
  /// carts are looked up by customer, so a stale session is harmless.
  async fn persist(&self, session: &Session) {
    if let Err(e) = self.store.save_session(session).await {
      error!(
        user_id = session.user_id,
        scene = %session.scene,
        error = %e,
        "session save failed"
      );
    }
  }

  /// The stored session, or a fresh one routed by the user's role.
  async fn session_for(&self, user_id: UserId) -> Result<Session, Error> {
    if let Some(session) = self.store.load_session(user_id).await.map_err(Error::store)? {
      return Ok(session);
    }
    let role = self.role_of(user_id).await;
    let mut session = Session::new(user_id, Scene::default());
    scene::enter_scene(&mut session, role.as_ref());
    Ok(session)
  }

  /// The user's role; lookup failures count as no role.
  pub async fn role_of(&self, user_id: UserId) -> Option<Role> {
    match self.store.get_profile_role(user_id).await {
      Ok(role) => role,
      Err(e) => {
        warn!(user_id, error = %e, "role lookup failed");
        None
      }
    }
  }
}
