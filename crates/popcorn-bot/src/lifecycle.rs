//! Cart and order lifecycle rules.
//!
//! Every operation resolves to an outcome enum. Persistence errors are logged
//! here and collapsed into the `Failed`/`Error` variant; callers only decide
//! what to show the user.
//!
//! Cross-request invariants are enforced by the store's conditional writes:
//! `create_order` refuses a second cart, item writes only land on orders still
//! in `cart`, and status changes are compare-and-swap, so a caller that loses a
//! race gets a distinct outcome.

use popcorn_core::{
  order::{CartLine, Order, OrderId, OrderStatus},
  product::{Product, ProductId},
  profile::UserId,
  store::ShopStore,
};
use tracing::{error, info, warn};

use crate::catalog::CatalogCache;

// ─── Outcomes ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
  Added { product_name: String, order_id: OrderId },
  ProductUnavailable,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
  Claimed(Order),
  /// Missing, not pending, or claimed concurrently by someone else.
  AlreadyTaken,
  Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
  Advanced(Order),
  WrongState,
  Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
  Removed,
  Missing,
  Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
  Submitted(Order, Vec<CartLine>),
  EmptyCart,
  Failed,
}

// ─── Manager ─────────────────────────────────────────────────────────────────

/// Quantity written on every add.
///
/// TODO: decide whether repeated adds should accumulate; the upsert currently
/// overwrites, so adding the same product twice leaves quantity at 1.
pub const ADD_QUANTITY: u32 = 1;

const CART_ATTEMPTS: usize = 3;

pub struct Lifecycle<'a, S> {
  store:   &'a S,
  catalog: &'a CatalogCache,
}

impl<'a, S: ShopStore> Lifecycle<'a, S> {
  pub fn new(store: &'a S, catalog: &'a CatalogCache) -> Self {
    Self { store, catalog }
  }

  // ── Customer ──────────────────────────────────────────────────────────────

  pub async fn add_to_cart(&self, customer_id: UserId, product_id: ProductId) -> AddOutcome {
    let product = match self.catalog.find_product(self.store, product_id).await {
      Ok(Some(p)) => p,
      Ok(None) => return AddOutcome::ProductUnavailable,
      Err(e) => {
        error!(customer_id, product_id, error = %e, "catalog lookup failed");
        return AddOutcome::Error;
      }
    };

    match self.try_add(customer_id, &product).await {
      Ok(Some(order_id)) => AddOutcome::Added { product_name: product.name, order_id },
      Ok(None) => {
        error!(customer_id, product_id, "could not settle on a cart");
        AddOutcome::Error
      }
      Err(e) => {
        error!(customer_id, product_id, error = %e, "failed to add item");
        AddOutcome::Error
      }
    }
  }

  /// Write the line into the customer's cart. A cart submitted between
  /// lookup and write rejects the line, and a fresh cart is opened.
  async fn try_add(
    &self,
    customer_id: UserId,
    product: &Product,
  ) -> Result<Option<OrderId>, S::Error> {
    for _ in 0..CART_ATTEMPTS {
      let Some(order) = self.open_cart(customer_id).await? else {
        return Ok(None);
      };
      if self
        .store
        .upsert_order_item(order.order_id, product.id, ADD_QUANTITY, product.price)
        .await?
      {
        return Ok(Some(order.order_id));
      }
      warn!(
        customer_id,
        order_id = order.order_id,
        "cart submitted before the item was written"
      );
    }
    Ok(None)
  }

  /// The customer's cart, created if absent.
  ///
  /// Losing the insert to a concurrent event means a cart now exists, so it is
  /// looked up again. `None` only if the cart keeps vanishing between reads.
  async fn open_cart(&self, customer_id: UserId) -> Result<Option<Order>, S::Error> {
    for _ in 0..CART_ATTEMPTS {
      if let Some(order) = self.store.find_cart_order(customer_id).await? {
        return Ok(Some(order));
      }
      if let Some(order) = self.store.create_order(customer_id).await? {
        info!(customer_id, order_id = order.order_id, "cart opened");
        return Ok(Some(order));
      }
      warn!(customer_id, "lost cart creation race");
    }
    Ok(None)
  }

  /// Total quantity in the customer's cart; 0 on any error.
  pub async fn count_cart_items(&self, customer_id: UserId) -> u32 {
    match self.store.count_items_for_customer_cart(customer_id).await {
      Ok(n) => n,
      Err(e) => {
        warn!(customer_id, error = %e, "cart count failed");
        0
      }
    }
  }

  /// The open cart and its lines, if the customer has one.
  pub async fn cart_lines(
    &self,
    customer_id: UserId,
  ) -> Result<Option<(Order, Vec<CartLine>)>, S::Error> {
    let Some(order) = self.store.find_cart_order(customer_id).await? else {
      return Ok(None);
    };
    let lines = self.store.list_cart_lines(order.order_id).await?;
    Ok(Some((order, lines)))
  }

  pub async fn remove_from_cart(
    &self,
    customer_id: UserId,
    product_id: ProductId,
  ) -> RemoveOutcome {
    match self.try_remove(customer_id, product_id).await {
      Ok(true) => RemoveOutcome::Removed,
      Ok(false) => RemoveOutcome::Missing,
      Err(e) => {
        error!(customer_id, product_id, error = %e, "failed to remove item");
        RemoveOutcome::Failed
      }
    }
  }

  async fn try_remove(&self, customer_id: UserId, product_id: ProductId) -> Result<bool, S::Error> {
    let Some(order) = self.store.find_cart_order(customer_id).await? else {
      return Ok(false);
    };
    self.store.remove_order_item(order.order_id, product_id).await
  }

  /// Submit the cart for `pickup_point`. The point must already be validated.
  pub async fn check_out(&self, customer_id: UserId, pickup_point: &str) -> CheckoutOutcome {
    match self.try_check_out(customer_id, pickup_point).await {
      Ok(Some((order, lines))) => {
        info!(customer_id, order_id = order.order_id, pickup_point, "order submitted");
        CheckoutOutcome::Submitted(order, lines)
      }
      Ok(None) => CheckoutOutcome::EmptyCart,
      Err(e) => {
        error!(customer_id, error = %e, "checkout failed");
        CheckoutOutcome::Failed
      }
    }
  }

  async fn try_check_out(
    &self,
    customer_id: UserId,
    pickup_point: &str,
  ) -> Result<Option<(Order, Vec<CartLine>)>, S::Error> {
    let Some((order, lines)) = self.cart_lines(customer_id).await? else {
      return Ok(None);
    };
    if lines.is_empty() {
      return Ok(None);
    }
    if !self
      .store
      .submit_cart(order.order_id, pickup_point.to_owned())
      .await?
    {
      return Ok(None);
    }
    let order = self.store.get_order(order.order_id).await?;
    Ok(order.map(|o| (o, lines)))
  }

  // ── Staff ─────────────────────────────────────────────────────────────────

  /// `pending → preparing`. Exactly one of several concurrent claimers wins.
  pub async fn claim_order(&self, order_id: OrderId) -> ClaimOutcome {
    match self
      .transition(order_id, OrderStatus::Pending, OrderStatus::Preparing)
      .await
    {
      Ok(Some(order)) => {
        info!(order_id, "order claimed");
        ClaimOutcome::Claimed(order)
      }
      Ok(None) => ClaimOutcome::AlreadyTaken,
      Err(e) => {
        error!(order_id, error = %e, "claim failed");
        ClaimOutcome::Failed
      }
    }
  }

  /// Move a claimed order forward to `to` (`ready` or `completed`).
  pub async fn advance_order(&self, order_id: OrderId, to: OrderStatus) -> AdvanceOutcome {
    let from = match to {
      OrderStatus::Ready => OrderStatus::Preparing,
      OrderStatus::Completed => OrderStatus::Ready,
      _ => return AdvanceOutcome::WrongState,
    };
    debug_assert!(from.can_advance_to(to));

    match self.transition(order_id, from, to).await {
      Ok(Some(order)) => {
        info!(order_id, status = %to, "order advanced");
        AdvanceOutcome::Advanced(order)
      }
      Ok(None) => AdvanceOutcome::WrongState,
      Err(e) => {
        error!(order_id, error = %e, "status update failed");
        AdvanceOutcome::Failed
      }
    }
  }

  /// Read-check then compare-and-swap; `None` if the order was not in `from`
  /// or another caller changed it first.
  async fn transition(
    &self,
    order_id: OrderId,
    from: OrderStatus,
    to: OrderStatus,
  ) -> Result<Option<Order>, S::Error> {
    if self
      .store
      .find_order_by_id_and_status(order_id, from)
      .await?
      .is_none()
    {
      return Ok(None);
    }
    if !self.store.update_order_status(order_id, from, to).await? {
      warn!(order_id, %from, %to, "lost status race");
      return Ok(None);
    }
    self.store.get_order(order_id).await
  }
}
