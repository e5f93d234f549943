//! Scene handlers. Each renders a screen and/or acknowledges the press.

pub mod customer;
pub mod seller;

use popcorn_core::{profile::Role, session::Scene, store::ShopStore};

use crate::{
  bot::{Bot, Ctx},
  error::Error,
  scene::enter_scene,
};

/// Render the entry screen of the session's current scene.
pub async fn entry<S: ShopStore>(bot: &Bot<S>, ctx: &mut Ctx, role: Option<&Role>, greeting: &str) {
  match (ctx.session.scene, role.and_then(Role::station)) {
    (Scene::Seller, Some(station)) => seller::panel(bot, ctx, station),
    _ => customer::main_menu(bot, ctx, greeting).await,
  }
}

/// Re-enter the scene the user's current role calls for.
pub async fn back_to_main<S: ShopStore>(bot: &Bot<S>, ctx: &mut Ctx) -> Result<(), Error> {
  let role = bot
    .store
    .get_profile_role(ctx.user.id)
    .await
    .map_err(Error::store)?;
  enter_scene(&mut ctx.session, role.as_ref());
  entry(bot, ctx, role.as_ref(), "Main menu").await;
  Ok(())
}
