//! Catalog cache with a freshness window.
//!
//! One cache per process, shared through `Arc`. A snapshot is the product
//! list together with the instant it was fetched; both are replaced in a
//! single write so no reader sees a new timestamp with old data.
//!
//! A failed refresh is returned to the caller. The previous snapshot is kept
//! for the next attempt but is not served as a fallback.

use std::{
  sync::Arc,
  time::{Duration, Instant},
};

use popcorn_core::{
  product::{Product, ProductId},
  store::ShopStore,
};
use tokio::sync::RwLock;
use tracing::debug;

pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(300);

struct Snapshot {
  products:   Arc<Vec<Product>>,
  fetched_at: Instant,
}

pub struct CatalogCache {
  freshness: Duration,
  slot:      RwLock<Option<Snapshot>>,
}

impl Default for CatalogCache {
  fn default() -> Self { Self::new(DEFAULT_FRESHNESS) }
}

impl CatalogCache {
  pub fn new(freshness: Duration) -> Self {
    Self { freshness, slot: RwLock::new(None) }
  }

  /// Available products, served from the snapshot while it is fresh.
  pub async fn get_products<S: ShopStore>(
    &self,
    store: &S,
  ) -> Result<Arc<Vec<Product>>, S::Error> {
    {
      let slot = self.slot.read().await;
      if let Some(snapshot) = slot.as_ref()
        && snapshot.fetched_at.elapsed() < self.freshness
      {
        return Ok(Arc::clone(&snapshot.products));
      }
    }

    let products = Arc::new(store.list_available_products().await?);
    debug!(count = products.len(), "catalog refreshed");

    *self.slot.write().await = Some(Snapshot {
      products:   Arc::clone(&products),
      fetched_at: Instant::now(),
    });
    Ok(products)
  }

  /// An available product by id.
  pub async fn find_product<S: ShopStore>(
    &self,
    store: &S,
    product_id: ProductId,
  ) -> Result<Option<Product>, S::Error> {
    let products = self.get_products(store).await?;
    Ok(
      products
        .iter()
        .find(|p| p.id == product_id && p.is_available)
        .cloned(),
    )
  }

  /// Distinct categories in catalog order.
  pub async fn categories<S: ShopStore>(&self, store: &S) -> Result<Vec<String>, S::Error> {
    let products = self.get_products(store).await?;
    let mut out: Vec<String> = Vec::new();
    for p in products.iter() {
      if !out.contains(&p.category) {
        out.push(p.category.clone());
      }
    }
    Ok(out)
  }

  pub async fn products_in<S: ShopStore>(
    &self,
    store: &S,
    category: &str,
  ) -> Result<Vec<Product>, S::Error> {
    let products = self.get_products(store).await?;
    Ok(
      products
        .iter()
        .filter(|p| p.category == category)
        .cloned()
        .collect(),
    )
  }
}
