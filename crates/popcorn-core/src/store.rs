//! The `ShopStore` trait: the persistence gateway the bot talks to.
//!
//! The trait is implemented by storage backends (e.g. `popcorn-store-sqlite`).
//! The bot crate depends on this abstraction, not on any concrete backend.
//!
//! Every event may be handled by a different process, so invariants that span
//! requests (one cart per customer, a single winner when staff claim an order)
//! live here as conditional writes rather than as in-process locks.

use std::future::Future;

use rust_decimal::Decimal;

use crate::{
  order::{CartLine, Order, OrderId, OrderStatus},
  product::{Product, ProductId},
  profile::{Role, UserId, UserProfile},
  session::Session,
};

/// Abstraction over a Popcorn Shop storage backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ShopStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Profiles ──────────────────────────────────────────────────────────

  /// Create the profile or refresh its names. Never touches the role.
  fn upsert_profile(
    &self,
    user_id: UserId,
    username: Option<String>,
    full_name: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_profile(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<Option<UserProfile>, Self::Error>> + Send + '_;

  /// The profile's role; `None` if the profile is missing or has no role.
  fn get_profile_role(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<Option<Role>, Self::Error>> + Send + '_;

  /// Assign a role to an existing profile. Returns `false` if no such profile.
  fn set_profile_role(
    &self,
    user_id: UserId,
    role: Role,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Profiles whose role is `seller_<station>`.
  fn list_staff<'a>(
    &'a self,
    station: &'a str,
  ) -> impl Future<Output = Result<Vec<UserProfile>, Self::Error>> + Send + 'a;

  // ── Catalog ───────────────────────────────────────────────────────────

  /// Every product with `is_available` set, ordered by category then id.
  fn list_available_products(
    &self,
  ) -> impl Future<Output = Result<Vec<Product>, Self::Error>> + Send + '_;

  // ── Orders ────────────────────────────────────────────────────────────

  /// The customer's order in status `cart`, if any.
  fn find_cart_order(
    &self,
    customer_id: UserId,
  ) -> impl Future<Output = Result<Option<Order>, Self::Error>> + Send + '_;

  /// Open a new `cart` order for the customer.
  ///
  /// Insert-if-not-exists: returns `None` when the customer already has a
  /// cart, e.g. because a concurrent event created it first.
  fn create_order(
    &self,
    customer_id: UserId,
  ) -> impl Future<Output = Result<Option<Order>, Self::Error>> + Send + '_;

  fn get_order(
    &self,
    order_id: OrderId,
  ) -> impl Future<Output = Result<Option<Order>, Self::Error>> + Send + '_;

  fn find_order_by_id_and_status(
    &self,
    order_id: OrderId,
    status: OrderStatus,
  ) -> impl Future<Output = Result<Option<Order>, Self::Error>> + Send + '_;

  /// Compare-and-swap the order's status.
  ///
  /// Writes only if the current status is `from`; returns whether the write
  /// happened. Callers must check legality of `from → to` themselves.
  fn update_order_status(
    &self,
    order_id: OrderId,
    from: OrderStatus,
    to: OrderStatus,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Checkout: move a `cart` order to `pending` and record where it will be
  /// collected. Returns `false` if the order is no longer a cart.
  fn submit_cart(
    &self,
    order_id: OrderId,
    pickup_point: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// All of a customer's orders, newest first.
  fn list_customer_orders(
    &self,
    customer_id: UserId,
  ) -> impl Future<Output = Result<Vec<Order>, Self::Error>> + Send + '_;

  /// Orders in `status`, oldest first, optionally restricted to one pickup
  /// point.
  fn list_orders_by_status<'a>(
    &'a self,
    status: OrderStatus,
    pickup_point: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<Order>, Self::Error>> + Send + 'a;

  // ── Order items ───────────────────────────────────────────────────────

  /// Insert the line, or overwrite quantity and price if
  /// `(order_id, product_id)` already exists.
  ///
  /// Only orders still in `cart` are touched. Returns `false` if the order is
  /// missing or has already been submitted.
  fn upsert_order_item(
    &self,
    order_id: OrderId,
    product_id: ProductId,
    quantity: u32,
    price: Decimal,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Returns `false` if there was no such line or the order is no longer a
  /// cart.
  fn remove_order_item(
    &self,
    order_id: OrderId,
    product_id: ProductId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Lines of an order with product names, in insertion order.
  fn list_cart_lines(
    &self,
    order_id: OrderId,
  ) -> impl Future<Output = Result<Vec<CartLine>, Self::Error>> + Send + '_;

  /// Total quantity across the customer's cart; 0 when there is no cart.
  fn count_items_for_customer_cart(
    &self,
    customer_id: UserId,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + '_;

  // ── Sessions ──────────────────────────────────────────────────────────

  fn load_session(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + '_;

  fn save_session<'a>(
    &'a self,
    session: &'a Session,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
