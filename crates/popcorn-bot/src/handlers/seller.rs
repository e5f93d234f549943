//! Seller scene: per-station order queues and the fulfilment buttons.

use popcorn_core::{
  order::{Order, OrderId, OrderStatus, cart_total},
  profile::Role,
  store::ShopStore,
};
use tracing::warn;

use crate::{
  action::Action,
  bot::{Bot, Ctx},
  error::Error,
  lifecycle::{AdvanceOutcome, ClaimOutcome},
  render::{Screen, cart_summary, money, order_header},
  scene::enter_scene,
};

pub fn panel<S: ShopStore>(bot: &Bot<S>, ctx: &mut Ctx, station: &str) {
  ctx.show(
    Screen::new(format!(
      "🧑‍🍳 {} staff panel. Choose a queue:",
      bot.settings.station_label(station)
    ))
    .row("📥 New orders", Action::NewOrders)
    .row("👨‍🍳 Preparing", Action::PreparingOrders)
    .row("✅ Ready", Action::ReadyOrders),
  );
}

/// The acting user's station, re-read from their role.
///
/// A user whose seller role was revoked is moved back to the customer scene.
async fn station<S: ShopStore>(bot: &Bot<S>, ctx: &mut Ctx) -> Result<Option<String>, Error> {
  let role = bot
    .store
    .get_profile_role(ctx.user.id)
    .await
    .map_err(Error::store)?;

  if let Some(station) = role.as_ref().and_then(Role::station) {
    return Ok(Some(station.to_owned()));
  }

  warn!(user_id = ctx.user.id, "staff action from a non-staff user");
  enter_scene(&mut ctx.session, role.as_ref());
  ctx.answer("⛔ Staff only.");
  Ok(None)
}

/// Orders in `status` for the user's station, oldest first, each with the
/// button that moves it forward.
pub async fn queue<S: ShopStore>(
  bot: &Bot<S>,
  ctx: &mut Ctx,
  status: OrderStatus,
) -> Result<(), Error> {
  let Some(station) = station(bot, ctx).await? else {
    return Ok(());
  };
  let orders = bot
    .store
    .list_orders_by_status(status, Some(&station))
    .await
    .map_err(Error::store)?;

  let (title, empty) = match status {
    OrderStatus::Pending => ("📥 New orders:", "No new orders."),
    OrderStatus::Preparing => ("👨‍🍳 Being prepared:", "Nothing is being prepared."),
    _ => ("✅ Waiting for pickup:", "No orders are waiting for pickup."),
  };

  let mut screen = Screen::new(if orders.is_empty() { empty } else { title });
  for order in &orders {
    let (verb, action) = match status {
      OrderStatus::Pending => ("Take", Action::Take(order.order_id)),
      OrderStatus::Preparing => ("Ready", Action::Ready(order.order_id)),
      _ => ("Hand over", Action::Complete(order.order_id)),
    };
    let (customer, total) = queue_details(bot, order).await;
    screen = screen.row(
      format!(
        "#{} · {} · {customer} · {total} · {verb}",
        order.order_id,
        order.created_at.format("%H:%M")
      ),
      action,
    );
  }
  ctx.show(screen.row("🔙 Back", Action::BackToMain));
  Ok(())
}

/// Customer name and order total for a queue row; placeholders on lookup
/// failure.
async fn queue_details<S: ShopStore>(bot: &Bot<S>, order: &Order) -> (String, String) {
  let customer = match bot.store.get_profile(order.customer_id).await {
    Ok(Some(profile)) => profile.full_name,
    Ok(None) => format!("user {}", order.customer_id),
    Err(e) => {
      warn!(order_id = order.order_id, error = %e, "could not load customer");
      format!("user {}", order.customer_id)
    }
  };
  let total = match bot.store.list_cart_lines(order.order_id).await {
    Ok(lines) => money(cart_total(&lines), &bot.settings.currency),
    Err(e) => {
      warn!(order_id = order.order_id, error = %e, "could not load order lines");
      "?".to_owned()
    }
  };
  (customer, total)
}

pub async fn take<S: ShopStore>(bot: &Bot<S>, ctx: &mut Ctx, order_id: OrderId) -> Result<(), Error> {
  if station(bot, ctx).await?.is_none() {
    return Ok(());
  }

  let order = match bot.lifecycle().claim_order(order_id).await {
    ClaimOutcome::Claimed(order) => order,
    ClaimOutcome::AlreadyTaken => {
      ctx.answer("This order was already taken or no longer exists.");
      return Ok(());
    }
    ClaimOutcome::Failed => {
      ctx.answer("⚠️ Could not take the order, please try again.");
      return Ok(());
    }
  };

  let lines = match bot.store.list_cart_lines(order_id).await {
    Ok(lines) => lines,
    Err(e) => {
      warn!(order_id, error = %e, "could not load order lines");
      Vec::new()
    }
  };
  let mut text = format!("✅ You took order #{order_id}.\n{}", order_header(&order));
  if !lines.is_empty() {
    text.push_str(&format!("\n\n{}", cart_summary(&lines, &bot.settings.currency)));
  }

  ctx.show(
    Screen::new(text)
      .row("✅ Ready", Action::Ready(order_id))
      .row("📦 Handed over", Action::Complete(order_id))
      .row("🔙 Back", Action::NewOrders),
  );
  ctx.notify(
    order.customer_id,
    Screen::new(format!("👨‍🍳 Your order #{order_id} is being prepared!")),
  );
  Ok(())
}

pub async fn ready<S: ShopStore>(bot: &Bot<S>, ctx: &mut Ctx, order_id: OrderId) -> Result<(), Error> {
  if station(bot, ctx).await?.is_none() {
    return Ok(());
  }

  match bot.lifecycle().advance_order(order_id, OrderStatus::Ready).await {
    AdvanceOutcome::Advanced(order) => {
      let pickup = order
        .pickup_point
        .as_deref()
        .map(|code| bot.settings.station_label(code).to_owned())
        .unwrap_or_else(|| "the counter".to_owned());
      ctx.show(
        Screen::new(format!("✅ Order #{order_id} is ready for pickup."))
          .row("📦 Handed over", Action::Complete(order_id))
          .row("🔙 Back", Action::PreparingOrders),
      );
      ctx.notify(
        order.customer_id,
        Screen::new(format!("✅ Your order #{order_id} is ready! Pick it up at {pickup}.")),
      );
    }
    AdvanceOutcome::WrongState => ctx.answer("This order is not being prepared."),
    AdvanceOutcome::Failed => ctx.answer("⚠️ Could not update the order, please try again."),
  }
  Ok(())
}

pub async fn complete<S: ShopStore>(
  bot: &Bot<S>,
  ctx: &mut Ctx,
  order_id: OrderId,
) -> Result<(), Error> {
  if station(bot, ctx).await?.is_none() {
    return Ok(());
  }

  match bot.lifecycle().advance_order(order_id, OrderStatus::Completed).await {
    AdvanceOutcome::Advanced(_) => ctx.show(
      Screen::new(format!("📦 Order #{order_id} completed."))
        .row("🔙 Back", Action::ReadyOrders),
    ),
    AdvanceOutcome::WrongState => ctx.answer("This order is not ready yet."),
    AdvanceOutcome::Failed => ctx.answer("⚠️ Could not update the order, please try again."),
  }
  Ok(())
}
