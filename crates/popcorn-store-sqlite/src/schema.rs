//! SQL schema for the Popcorn Shop SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS profiles (
    user_id     INTEGER PRIMARY KEY,
    username    TEXT,
    full_name   TEXT NOT NULL,
    role        TEXT,            -- 'customer' | 'seller_<station>' | NULL
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS products (
    product_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    category      TEXT NOT NULL,
    price         TEXT NOT NULL,   -- decimal string
    is_available  INTEGER NOT NULL DEFAULT 1
);

-- customer_id is not a foreign key: a customer may act before /start.
CREATE TABLE IF NOT EXISTS orders (
    order_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id   INTEGER NOT NULL,
    status        TEXT NOT NULL DEFAULT 'cart'
                  CHECK (status IN ('cart', 'pending', 'preparing', 'ready', 'completed')),
    pickup_point  TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

-- At most one open cart per customer.
CREATE UNIQUE INDEX IF NOT EXISTS orders_one_cart_idx
    ON orders(customer_id) WHERE status = 'cart';
CREATE INDEX IF NOT EXISTS orders_status_idx ON orders(status, pickup_point);

CREATE TABLE IF NOT EXISTS order_items (
    order_id       INTEGER NOT NULL REFERENCES orders(order_id) ON DELETE CASCADE,
    product_id     INTEGER NOT NULL REFERENCES products(product_id),
    quantity       INTEGER NOT NULL CHECK (quantity > 0),
    price_at_time  TEXT NOT NULL,   -- decimal string, snapshot of products.price
    PRIMARY KEY (order_id, product_id)
);

CREATE TABLE IF NOT EXISTS sessions (
    user_id        INTEGER PRIMARY KEY,
    scene          TEXT NOT NULL,
    cart_order_id  INTEGER,
    updated_at     TEXT NOT NULL
);

PRAGMA user_version = 1;
";
