//! Scene routing.
//!
//! A session is in exactly one [`Scene`]. Button presses are routed by the
//! `(scene, action)` pair; pairs without a handler only acknowledge the press.

use popcorn_core::{
  order::OrderStatus,
  profile::Role,
  session::{Scene, Session},
  store::ShopStore,
};
use tracing::{debug, error, info};

use crate::{
  action::Action,
  bot::{Bot, Ctx},
  handlers::{self, customer, seller},
};

/// Put the session in the scene for `role` and return it.
pub fn enter_scene(session: &mut Session, role: Option<&Role>) -> Scene {
  let scene = Scene::for_role(role);
  if session.scene != scene {
    info!(user_id = session.user_id, from = %session.scene, to = %scene, "scene change");
  }
  session.scene = scene;
  scene
}

/// Run the handler registered for the session's scene and `action`.
///
/// Handler failures are logged and turned into an error toast; they never
/// escape the event.
pub async fn dispatch<S: ShopStore>(bot: &Bot<S>, ctx: &mut Ctx, action: Action) {
  use Action as A;
  use Scene::{Customer, Seller};

  let scene = ctx.session.scene;
  let result = match (scene, action) {
    (Customer, A::ShowMenu) => customer::show_menu(bot, ctx).await,
    (Customer, A::Category(name)) => customer::category(bot, ctx, &name).await,
    (Customer, A::Add(id)) => customer::add(bot, ctx, id).await,
    (Customer, A::ShowCart) => customer::show_cart(bot, ctx).await,
    (Customer, A::Remove(id)) => customer::remove(bot, ctx, id).await,
    (Customer, A::Checkout) => customer::checkout(bot, ctx).await,
    (Customer, A::Confirm(point)) => customer::confirm(bot, ctx, &point).await,
    (Customer, A::MyOrders) => customer::my_orders(bot, ctx).await,

    (Seller, A::NewOrders) => seller::queue(bot, ctx, OrderStatus::Pending).await,
    (Seller, A::PreparingOrders) => seller::queue(bot, ctx, OrderStatus::Preparing).await,
    (Seller, A::ReadyOrders) => seller::queue(bot, ctx, OrderStatus::Ready).await,
    (Seller, A::Take(id)) => seller::take(bot, ctx, id).await,
    (Seller, A::Ready(id)) => seller::ready(bot, ctx, id).await,
    (Seller, A::Complete(id)) => seller::complete(bot, ctx, id).await,

    (_, A::BackToMain) => handlers::back_to_main(bot, ctx).await,

    (scene, action) => {
      debug!(%scene, %action, "no handler");
      Ok(())
    }
  };

  if let Err(e) = result {
    error!(user_id = ctx.user.id, %scene, error = %e, "handler failed");
    ctx.answer("⚠️ Something went wrong, please try again.");
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn enter_scene_follows_role() {
    let mut session = Session::new(1, Scene::Customer);

    assert_eq!(
      enter_scene(&mut session, Some(&Role::parse("seller_counter"))),
      Scene::Seller
    );
    assert_eq!(session.scene, Scene::Seller);

    assert_eq!(enter_scene(&mut session, None), Scene::Customer);
    assert_eq!(
      enter_scene(&mut session, Some(&Role::parse("ghost"))),
      Scene::Customer
    );
  }
}
