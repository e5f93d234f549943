//! Customer scene: browse, fill the cart, check out, follow orders.

use popcorn_core::{
  order::{OrderStatus, cart_total},
  product::ProductId,
  profile::UserId,
  store::ShopStore,
};
use tracing::warn;

use crate::{
  action::Action,
  bot::{Bot, Ctx},
  error::Error,
  lifecycle::{AddOutcome, CheckoutOutcome, RemoveOutcome},
  render::{Screen, cart_summary, money, order_header},
};

fn category_label(category: &str) -> String {
  match category {
    "popcorn" => "🍿 Popcorn".to_owned(),
    "drinks" => "🥤 Drinks".to_owned(),
    "cotton_candy" => "🍭 Cotton candy".to_owned(),
    other => other.to_owned(),
  }
}

pub async fn main_menu<S: ShopStore>(bot: &Bot<S>, ctx: &mut Ctx, greeting: &str) {
  let count = bot.lifecycle().count_cart_items(ctx.user.id).await;
  let mut text = greeting.to_owned();
  match active_order(bot, ctx.user.id).await {
    Ok(Some(card)) => text.push_str(&format!("\n\n{card}")),
    Ok(None) => {}
    Err(e) => warn!(user_id = ctx.user.id, error = %e, "could not load active order"),
  }
  ctx.show(
    Screen::new(text)
      .row("🍿 Order", Action::ShowMenu)
      .row(format!("🛒 Cart ({count})"), Action::ShowCart)
      .row("📋 My orders", Action::MyOrders),
  );
}

/// The newest submitted order still in progress, with its total.
async fn active_order<S: ShopStore>(
  bot: &Bot<S>,
  customer_id: UserId,
) -> Result<Option<String>, Error> {
  let orders = bot
    .store
    .list_customer_orders(customer_id)
    .await
    .map_err(Error::store)?;
  let Some(order) = orders.into_iter().find(|o| o.status.is_active()) else {
    return Ok(None);
  };
  let lines = bot
    .store
    .list_cart_lines(order.order_id)
    .await
    .map_err(Error::store)?;

  let mut card = format!("Your current order #{}: {}", order.order_id, order.status.label());
  if let Some(code) = &order.pickup_point {
    card.push_str(&format!("\nPickup: {}", bot.settings.station_label(code)));
  }
  card.push_str(&format!(
    "\nTotal: {}",
    money(cart_total(&lines), &bot.settings.currency)
  ));
  Ok(Some(card))
}

pub async fn show_menu<S: ShopStore>(bot: &Bot<S>, ctx: &mut Ctx) -> Result<(), Error> {
  let categories = bot
    .catalog
    .categories(&*bot.store)
    .await
    .map_err(Error::store)?;

  let mut screen = if categories.is_empty() {
    Screen::new("Nothing is on sale right now.")
  } else {
    Screen::new("Choose a category:")
  };
  for category in categories {
    let label = category_label(&category);
    let action = Action::Category(category);
    if !action.fits_button() {
      warn!(%action, "category name too long for a button; skipped");
      continue;
    }
    screen = screen.row(label, action);
  }
  ctx.show(screen.row("🔙 Back", Action::BackToMain));
  Ok(())
}

pub async fn category<S: ShopStore>(
  bot: &Bot<S>,
  ctx: &mut Ctx,
  category: &str,
) -> Result<(), Error> {
  let products = bot
    .catalog
    .products_in(&*bot.store, category)
    .await
    .map_err(Error::store)?;

  let mut screen = if products.is_empty() {
    Screen::new("Nothing left in this category.")
  } else {
    Screen::new(format!("{}: tap to add to your cart", category_label(category)))
  };
  for p in products {
    screen = screen.row(
      format!("{} · {}", p.name, money(p.price, &bot.settings.currency)),
      Action::Add(p.id),
    );
  }
  ctx.show(
    screen
      .row("🛒 Cart", Action::ShowCart)
      .row("🔙 Back", Action::ShowMenu),
  );
  Ok(())
}

pub async fn add<S: ShopStore>(
  bot: &Bot<S>,
  ctx: &mut Ctx,
  product_id: ProductId,
) -> Result<(), Error> {
  match bot.lifecycle().add_to_cart(ctx.user.id, product_id).await {
    AddOutcome::Added { product_name, order_id } => {
      ctx.session.cart_order_id = Some(order_id);
      ctx.answer(format!("{product_name} added to your cart!"));
    }
    AddOutcome::ProductUnavailable => ctx.answer("Sorry, that item is not available."),
    AddOutcome::Error => ctx.answer("⚠️ Could not add the item, please try again."),
  }
  Ok(())
}

pub async fn show_cart<S: ShopStore>(bot: &Bot<S>, ctx: &mut Ctx) -> Result<(), Error> {
  let cart = bot
    .lifecycle()
    .cart_lines(ctx.user.id)
    .await
    .map_err(Error::store)?;

  let Some((order, lines)) = cart.filter(|(_, lines)| !lines.is_empty()) else {
    ctx.show(
      Screen::new("🛒 Your cart is empty.")
        .row("🍿 Order", Action::ShowMenu)
        .row("🔙 Back", Action::BackToMain),
    );
    return Ok(());
  };
  ctx.session.cart_order_id = Some(order.order_id);

  let mut screen = Screen::new(format!(
    "🛒 Your cart:\n\n{}",
    cart_summary(&lines, &bot.settings.currency)
  ));
  for line in &lines {
    screen = screen.row(
      format!("❌ Remove {}", line.product_name),
      Action::Remove(line.item.product_id),
    );
  }
  ctx.show(
    screen
      .row("✅ Check out", Action::Checkout)
      .row("🍿 Keep shopping", Action::ShowMenu)
      .row("🔙 Back", Action::BackToMain),
  );
  Ok(())
}

pub async fn remove<S: ShopStore>(
  bot: &Bot<S>,
  ctx: &mut Ctx,
  product_id: ProductId,
) -> Result<(), Error> {
  match bot.lifecycle().remove_from_cart(ctx.user.id, product_id).await {
    RemoveOutcome::Removed => ctx.answer("Removed from your cart."),
    RemoveOutcome::Missing => ctx.answer("That item is no longer in your cart."),
    RemoveOutcome::Failed => {
      ctx.answer("⚠️ Could not remove the item, please try again.");
      return Ok(());
    }
  }
  show_cart(bot, ctx).await
}

/// Ask where the order will be collected.
pub async fn checkout<S: ShopStore>(bot: &Bot<S>, ctx: &mut Ctx) -> Result<(), Error> {
  let cart = bot
    .lifecycle()
    .cart_lines(ctx.user.id)
    .await
    .map_err(Error::store)?;
  if cart.is_none_or(|(_, lines)| lines.is_empty()) {
    ctx.answer("Your cart is empty.");
    return show_cart(bot, ctx).await;
  }

  let mut screen = Screen::new("Where will you pick up your order?");
  for point in &bot.settings.pickup_points {
    screen = screen.row(point.label.clone(), Action::Confirm(point.code.clone()));
  }
  ctx.show(screen.row("🔙 Back", Action::ShowCart));
  Ok(())
}

/// Submit the cart for the chosen pickup point and alert that point's staff.
pub async fn confirm<S: ShopStore>(bot: &Bot<S>, ctx: &mut Ctx, code: &str) -> Result<(), Error> {
  let Some(point) = bot.settings.pickup_point(code) else {
    ctx.answer("Please choose one of the listed pickup points.");
    return checkout(bot, ctx).await;
  };

  let (order, lines) = match bot.lifecycle().check_out(ctx.user.id, &point.code).await {
    CheckoutOutcome::Submitted(order, lines) => (order, lines),
    CheckoutOutcome::EmptyCart => {
      ctx.answer("Your cart is empty.");
      return show_cart(bot, ctx).await;
    }
    CheckoutOutcome::Failed => {
      ctx.answer("⚠️ Could not place the order, please try again.");
      return Ok(());
    }
  };
  ctx.session.cart_order_id = None;

  let summary = cart_summary(&lines, &bot.settings.currency);
  ctx.show(
    Screen::new(format!(
      "✅ Order #{} placed! Pick it up at {}.\n\n{summary}\n\nWe'll message you when it's ready.",
      order.order_id, point.label,
    ))
    .row("📋 My orders", Action::MyOrders)
    .row("🔙 Main menu", Action::BackToMain),
  );

  match bot.store.list_staff(&point.code).await {
    Ok(staff) => {
      for member in staff {
        ctx.notify(
          member.user_id,
          Screen::new(format!(
            "📥 New order #{} for {}\n\n{summary}",
            order.order_id, point.label,
          ))
          .row("👨‍🍳 Take", Action::Take(order.order_id)),
        );
      }
    }
    Err(e) => warn!(order_id = order.order_id, error = %e, "could not load staff to notify"),
  }
  Ok(())
}

/// Order history, newest first. The open cart is shown under the cart button.
pub async fn my_orders<S: ShopStore>(bot: &Bot<S>, ctx: &mut Ctx) -> Result<(), Error> {
  let orders = bot
    .store
    .list_customer_orders(ctx.user.id)
    .await
    .map_err(Error::store)?;

  let history: Vec<String> = orders
    .iter()
    .filter(|o| o.status != OrderStatus::Cart)
    .map(|o| format!("{}\nPlaced: {}", order_header(o), o.created_at.format("%Y-%m-%d %H:%M")))
    .collect();

  let text = if history.is_empty() {
    "You have no orders yet.".to_owned()
  } else {
    format!("📋 Your orders:\n\n{}", history.join("\n\n"))
  };
  ctx.show(Screen::new(text).row("🔙 Back", Action::BackToMain));
  Ok(())
}
