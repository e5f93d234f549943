//! [`SqliteStore`]: the SQLite implementation of [`ShopStore`].

use std::path::Path;

use chrono::Utc;
use popcorn_core::{
  order::{CartLine, Order, OrderId, OrderStatus},
  product::{NewProduct, Product, ProductId},
  profile::{Role, UserId, UserProfile},
  session::Session,
  store::ShopStore,
};
use rusqlite::OptionalExtension as _;
use rust_decimal::Decimal;

use crate::{
  Result,
  encode::{
    ORDER_COLUMNS, PRODUCT_COLUMNS, RawCartLine, RawOrder, RawProduct, RawProfile,
    RawSession, decode_quantity, encode_decimal, encode_dt,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Popcorn Shop store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Seed a catalog entry. The bot itself never writes products.
  pub async fn add_product(&self, input: NewProduct) -> Result<Product> {
    let name      = input.name.clone();
    let category  = input.category.clone();
    let price_str = encode_decimal(input.price);
    let available = input.is_available;

    let product_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO products (name, category, price, is_available)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![name, category, price_str, available],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Product {
      id:           product_id,
      name:         input.name,
      category:     input.category,
      price:        input.price,
      is_available: input.is_available,
    })
  }

  /// Change a product's price or availability in place.
  pub async fn update_product(
    &self,
    product_id:   ProductId,
    price:        Decimal,
    is_available: bool,
  ) -> Result<bool> {
    let price_str = encode_decimal(price);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE products SET price = ?2, is_available = ?3 WHERE product_id = ?1",
          rusqlite::params![product_id, price_str, is_available],
        )?)
      })
      .await?;
    Ok(changed == 1)
  }

  async fn query_orders(
    &self,
    sql: String,
    params: Vec<rusqlite::types::Value>,
  ) -> Result<Vec<Order>> {
    let raws: Vec<RawOrder> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawOrder::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawOrder::into_order).collect()
  }

  async fn query_order(
    &self,
    sql: String,
    params: Vec<rusqlite::types::Value>,
  ) -> Result<Option<Order>> {
    let raw: Option<RawOrder> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(&sql, rusqlite::params_from_iter(params), RawOrder::from_row)
          .optional()?)
      })
      .await?;

    raw.map(RawOrder::into_order).transpose()
  }
}

// ─── ShopStore impl ──────────────────────────────────────────────────────────

impl ShopStore for SqliteStore {
  type Error = crate::Error;

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn upsert_profile(
    &self,
    user_id:   UserId,
    username:  Option<String>,
    full_name: String,
  ) -> Result<()> {
    let now = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO profiles (user_id, username, full_name, role, created_at, updated_at)
           VALUES (?1, ?2, ?3, NULL, ?4, ?4)
           ON CONFLICT(user_id) DO UPDATE SET
             username   = excluded.username,
             full_name  = excluded.full_name,
             updated_at = excluded.updated_at",
          rusqlite::params![user_id, username, full_name, now],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>> {
    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, username, full_name, role, created_at, updated_at
             FROM profiles WHERE user_id = ?1",
            rusqlite::params![user_id],
            |row| {
              Ok(RawProfile {
                user_id:    row.get(0)?,
                username:   row.get(1)?,
                full_name:  row.get(2)?,
                role:       row.get(3)?,
                created_at: row.get(4)?,
                updated_at: row.get(5)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn get_profile_role(&self, user_id: UserId) -> Result<Option<Role>> {
    let tag: Option<Option<String>> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT role FROM profiles WHERE user_id = ?1",
            rusqlite::params![user_id],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;

    Ok(tag.flatten().as_deref().map(Role::parse))
  }

  async fn set_profile_role(&self, user_id: UserId, role: Role) -> Result<bool> {
    let tag = role.tag();
    let now = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE profiles SET role = ?2, updated_at = ?3 WHERE user_id = ?1",
          rusqlite::params![user_id, tag, now],
        )?)
      })
      .await?;
    Ok(changed == 1)
  }

  async fn list_staff(&self, station: &str) -> Result<Vec<UserProfile>> {
    let tag = Role::Seller { station: station.to_owned() }.tag();

    let raws: Vec<RawProfile> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT user_id, username, full_name, role, created_at, updated_at
           FROM profiles WHERE role = ?1 ORDER BY user_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![tag], |row| {
            Ok(RawProfile {
              user_id:    row.get(0)?,
              username:   row.get(1)?,
              full_name:  row.get(2)?,
              role:       row.get(3)?,
              created_at: row.get(4)?,
              updated_at: row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProfile::into_profile).collect()
  }

  // ── Catalog ───────────────────────────────────────────────────────────────

  async fn list_available_products(&self) -> Result<Vec<Product>> {
    let raws: Vec<RawProduct> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PRODUCT_COLUMNS} FROM products
           WHERE is_available = 1
           ORDER BY category, product_id"
        ))?;
        let rows = stmt
          .query_map([], RawProduct::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProduct::into_product).collect()
  }

  // ── Orders ────────────────────────────────────────────────────────────────

  async fn find_cart_order(&self, customer_id: UserId) -> Result<Option<Order>> {
    self
      .query_order(
        format!(
          "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = ?1 AND status = 'cart'"
        ),
        vec![customer_id.into()],
      )
      .await
  }

  async fn create_order(&self, customer_id: UserId) -> Result<Option<Order>> {
    let now     = Utc::now();
    let now_str = encode_dt(now);

    // The partial unique index turns a second cart into an ignored insert.
    let order_id: Option<i64> = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT OR IGNORE INTO orders (customer_id, status, created_at, updated_at)
           VALUES (?1, 'cart', ?2, ?2)",
          rusqlite::params![customer_id, now_str],
        )?;
        Ok((inserted == 1).then(|| conn.last_insert_rowid()))
      })
      .await?;

    Ok(order_id.map(|order_id| Order {
      order_id,
      customer_id,
      status: OrderStatus::Cart,
      pickup_point: None,
      created_at: now,
      updated_at: now,
    }))
  }

  async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
    self
      .query_order(
        format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = ?1"),
        vec![order_id.into()],
      )
      .await
  }

  async fn find_order_by_id_and_status(
    &self,
    order_id: OrderId,
    status:   OrderStatus,
  ) -> Result<Option<Order>> {
    self
      .query_order(
        format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = ?1 AND status = ?2"),
        vec![order_id.into(), status.as_str().to_owned().into()],
      )
      .await
  }

  async fn update_order_status(
    &self,
    order_id: OrderId,
    from:     OrderStatus,
    to:       OrderStatus,
  ) -> Result<bool> {
    let from_str = from.as_str();
    let to_str   = to.as_str();
    let now      = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE orders SET status = ?3, updated_at = ?4
           WHERE order_id = ?1 AND status = ?2",
          rusqlite::params![order_id, from_str, to_str, now],
        )?)
      })
      .await?;
    Ok(changed == 1)
  }

  async fn submit_cart(&self, order_id: OrderId, pickup_point: String) -> Result<bool> {
    let now = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE orders SET status = 'pending', pickup_point = ?2, updated_at = ?3
           WHERE order_id = ?1 AND status = 'cart'",
          rusqlite::params![order_id, pickup_point, now],
        )?)
      })
      .await?;
    Ok(changed == 1)
  }

  async fn list_customer_orders(&self, customer_id: UserId) -> Result<Vec<Order>> {
    self
      .query_orders(
        format!(
          "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = ?1
           ORDER BY created_at DESC, order_id DESC"
        ),
        vec![customer_id.into()],
      )
      .await
  }

  async fn list_orders_by_status(
    &self,
    status:       OrderStatus,
    pickup_point: Option<&str>,
  ) -> Result<Vec<Order>> {
    let mut params: Vec<rusqlite::types::Value> = vec![status.as_str().to_owned().into()];
    let mut sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE status = ?1");
    if let Some(point) = pickup_point {
      sql.push_str(" AND pickup_point = ?2");
      params.push(point.to_owned().into());
    }
    sql.push_str(" ORDER BY updated_at, order_id");

    self.query_orders(sql, params).await
  }

  // ── Order items ───────────────────────────────────────────────────────────

  async fn upsert_order_item(
    &self,
    order_id:   OrderId,
    product_id: ProductId,
    quantity:   u32,
    price:      Decimal,
  ) -> Result<bool> {
    let price_str = encode_decimal(price);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO order_items (order_id, product_id, quantity, price_at_time)
           SELECT ?1, ?2, ?3, ?4
           WHERE EXISTS (
             SELECT 1 FROM orders WHERE orders.order_id = ?1 AND orders.status = 'cart'
           )
           ON CONFLICT(order_id, product_id) DO UPDATE SET
             quantity      = excluded.quantity,
             price_at_time = excluded.price_at_time",
          rusqlite::params![order_id, product_id, quantity, price_str],
        )?)
      })
      .await?;
    Ok(changed == 1)
  }

  async fn remove_order_item(&self, order_id: OrderId, product_id: ProductId) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM order_items
           WHERE order_id = ?1 AND product_id = ?2
             AND EXISTS (
               SELECT 1 FROM orders WHERE orders.order_id = ?1 AND orders.status = 'cart'
             )",
          rusqlite::params![order_id, product_id],
        )?)
      })
      .await?;
    Ok(changed == 1)
  }

  async fn list_cart_lines(&self, order_id: OrderId) -> Result<Vec<CartLine>> {
    let raws: Vec<RawCartLine> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT oi.order_id, oi.product_id, oi.quantity, oi.price_at_time, p.name
           FROM order_items oi
           JOIN products p ON p.product_id = oi.product_id
           WHERE oi.order_id = ?1
           ORDER BY oi.rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![order_id], |row| {
            Ok(RawCartLine {
              order_id:      row.get(0)?,
              product_id:    row.get(1)?,
              quantity:      row.get(2)?,
              price_at_time: row.get(3)?,
              product_name:  row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCartLine::into_line).collect()
  }

  async fn count_items_for_customer_cart(&self, customer_id: UserId) -> Result<u32> {
    let total: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COALESCE(SUM(oi.quantity), 0)
           FROM order_items oi
           JOIN orders o ON o.order_id = oi.order_id
           WHERE o.customer_id = ?1 AND o.status = 'cart'",
          rusqlite::params![customer_id],
          |row| row.get(0),
        )?)
      })
      .await?;

    decode_quantity("cart item count", total)
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn load_session(&self, user_id: UserId) -> Result<Option<Session>> {
    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, scene, cart_order_id FROM sessions WHERE user_id = ?1",
            rusqlite::params![user_id],
            |row| {
              Ok(RawSession {
                user_id:       row.get(0)?,
                scene:         row.get(1)?,
                cart_order_id: row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSession::into_session).transpose()
  }

  async fn save_session(&self, session: &Session) -> Result<()> {
    let user_id       = session.user_id;
    let scene         = session.scene.as_str();
    let cart_order_id = session.cart_order_id;
    let now           = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (user_id, scene, cart_order_id, updated_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT(user_id) DO UPDATE SET
             scene         = excluded.scene,
             cart_order_id = excluded.cart_order_id,
             updated_at    = excluded.updated_at",
          rusqlite::params![user_id, scene, cart_order_id, now],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
