// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use paysync_server::config::{AppConfig, StoreBackend};
use paysync_server::errors::{AppError, Result};
use paysync_server::models::{
  Banner, Category, Order, OrderKey, OrderStats, OrderStatus, OrderUpdate, Page, PageRequest, Product,
  ProductCounts, ProductFilter,
};
use paysync_server::services::{LogNotifier, NotificationGateway, PaymentNotification};
use paysync_server::state::AppState;
use paysync_server::store::{CatalogStore, MemoryStore, OrderStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// Builds the actix service for `$state` with the production routes.
macro_rules! test_app {
  ($state:expr) => {
    actix_web::test::init_service(
      actix_web::App::new()
        .app_data(actix_web::web::Data::new($state))
        .configure(paysync_server::web::configure_app_routes),
    )
    .await
  };
}

pub fn test_config() -> AppConfig {
  AppConfig {
    store_backend: StoreBackend::Memory,
    batch_item_timeout: Duration::from_millis(500),
    ..AppConfig::default()
  }
}

/// Order store that can be told to fail, counting every call it receives.
pub struct ScriptedOrders {
  pub inner: MemoryStore,
  pub fail_updates: bool,
  pub fail_reads: bool,
  pub calls: AtomicUsize,
}

impl ScriptedOrders {
  pub fn new(inner: MemoryStore) -> Self {
    Self {
      inner,
      fail_updates: false,
      fail_reads: false,
      calls: AtomicUsize::new(0),
    }
  }

  fn enter(&self) {
    self.calls.fetch_add(1, Ordering::SeqCst);
  }

  fn read_guard(&self) -> Result<()> {
    self.enter();
    if self.fail_reads {
      return Err(AppError::Store("order store unavailable".to_string()));
    }
    Ok(())
  }
}

#[async_trait]
impl OrderStore for ScriptedOrders {
  async fn update_orders(&self, key: &OrderKey, update: &OrderUpdate) -> Result<u64> {
    self.enter();
    if self.fail_updates {
      return Err(AppError::Store("order store unavailable".to_string()));
    }
    self.inner.update_orders(key, update).await
  }

  async fn product_ids(&self, key: &OrderKey, limit: usize) -> Result<Vec<String>> {
    self.enter();
    self.inner.product_ids(key, limit).await
  }

  async fn list_orders(&self, status: Option<OrderStatus>, page: PageRequest) -> Result<Page<Order>> {
    self.read_guard()?;
    self.inner.list_orders(status, page).await
  }

  async fn order_stats(&self) -> Result<OrderStats> {
    self.read_guard()?;
    self.inner.order_stats().await
  }
}

/// Catalog store with per-operation delays and injectable failures.
#[derive(Default)]
pub struct ScriptedCatalog {
  pub inner: MemoryStore,
  pub fail_archive: bool,
  pub fail_listing: bool,
  pub panic_on_banners: bool,
  pub delays: HashMap<&'static str, Duration>,
  pub calls: AtomicUsize,
}

impl ScriptedCatalog {
  pub fn new(inner: MemoryStore) -> Self {
    Self {
      inner,
      ..Self::default()
    }
  }

  async fn enter(&self, op: &'static str) {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if let Some(delay) = self.delays.get(op) {
      tokio::time::sleep(*delay).await;
    }
  }

  fn listing(&self) -> Result<()> {
    if self.fail_listing {
      return Err(AppError::Store("catalog unavailable".to_string()));
    }
    Ok(())
  }
}

#[async_trait]
impl CatalogStore for ScriptedCatalog {
  async fn archive_items(&self, ids: &[String], at: DateTime<Utc>) -> Result<u64> {
    self.enter("archive_items").await;
    if self.fail_archive {
      return Err(AppError::Store("catalog unavailable".to_string()));
    }
    self.inner.archive_items(ids, at).await
  }

  async fn list_products(&self, filter: &ProductFilter, page: PageRequest) -> Result<Page<Product>> {
    self.enter("list_products").await;
    self.listing()?;
    self.inner.list_products(filter, page).await
  }

  async fn feed(&self, limit: u32) -> Result<Vec<Product>> {
    self.enter("feed").await;
    self.listing()?;
    self.inner.feed(limit).await
  }

  async fn list_categories(&self) -> Result<Vec<Category>> {
    self.enter("list_categories").await;
    self.listing()?;
    self.inner.list_categories().await
  }

  async fn list_banners(&self) -> Result<Vec<Banner>> {
    self.enter("list_banners").await;
    if self.panic_on_banners {
      panic!("banner table corrupted");
    }
    self.listing()?;
    self.inner.list_banners().await
  }

  async fn product_counts(&self) -> Result<ProductCounts> {
    self.enter("product_counts").await;
    self.listing()?;
    self.inner.product_counts().await
  }
}

/// Keeps every notification it is handed; optionally fails after recording.
#[derive(Default)]
pub struct RecordingNotifier {
  pub sent: Mutex<Vec<PaymentNotification>>,
  pub fail: bool,
}

#[async_trait]
impl NotificationGateway for RecordingNotifier {
  async fn notify(&self, notification: &PaymentNotification) -> Result<()> {
    self.sent.lock().push(notification.clone());
    if self.fail {
      return Err(AppError::Notification("gateway returned 503".to_string()));
    }
    Ok(())
  }
}

pub fn memory_state(store: &MemoryStore, config: AppConfig) -> AppState {
  AppState::new(
    Arc::new(store.clone()),
    Arc::new(store.clone()),
    Arc::new(LogNotifier),
    Arc::new(config),
  )
}

pub fn state_with(
  orders: Arc<dyn OrderStore>,
  catalog: Arc<dyn CatalogStore>,
  notifier: Arc<dyn NotificationGateway>,
  config: AppConfig,
) -> AppState {
  AppState::new(orders, catalog, notifier, Arc::new(config))
}

/// A pending order `order_id` for item `product_id`, with the item on sale.
pub fn seed_purchase(store: &MemoryStore, order_id: &str, product_id: &str) {
  store.insert_product(Product::active(product_id, format!("Item {}", product_id), 100_000, None));
  store.insert_order(Order::pending(order_id, Some(product_id.to_string()), 100_000, "IDR"));
}

pub fn seed_catalog(store: &MemoryStore) {
  store.insert_category(Category {
    id: "cat_b".to_string(),
    name: "Photography".to_string(),
    slug: "photography".to_string(),
    position: 2,
  });
  store.insert_category(Category {
    id: "cat_a".to_string(),
    name: "Digital Art".to_string(),
    slug: "digital-art".to_string(),
    position: 1,
  });
  store.insert_banner(Banner {
    id: "ban_1".to_string(),
    title: "Launch".to_string(),
    image_url: "https://cdn.example.com/launch.jpg".to_string(),
    link_url: None,
    is_active: true,
    position: 1,
  });
  store.insert_banner(Banner {
    id: "ban_2".to_string(),
    title: "Retired".to_string(),
    image_url: "https://cdn.example.com/retired.jpg".to_string(),
    link_url: None,
    is_active: false,
    position: 2,
  });
  for i in 0..25 {
    let category = if i % 2 == 0 { "cat_a" } else { "cat_b" };
    store.insert_product(Product::active(
      format!("prd_{:02}", i),
      format!("Item {:02}", i),
      1_000 * (i + 1),
      Some(category.to_string()),
    ));
  }
}
