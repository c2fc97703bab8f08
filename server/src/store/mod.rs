// paysync-server/src/store/mod.rs

//! Ports to the Order and Catalog stores.
//!
//! Both stores are treated as external, already-consistent services: no
//! in-process locking spans a call, and nothing here opens a transaction
//! across the two.

pub mod memory;
pub mod postgres;
pub mod seed;

use crate::errors::Result;
use crate::models::{
  Banner, Category, Order, OrderKey, OrderStats, OrderStatus, OrderUpdate, Page, PageRequest, Product,
  ProductCounts, ProductFilter,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use seed::SeedData;

/// Upper bound on product lookups per archival attempt.
pub const ARCHIVE_LOOKUP_LIMIT: usize = 50;

#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Sets `update` on every order matching `key`; returns the number of rows matched.
  async fn update_orders(&self, key: &OrderKey, update: &OrderUpdate) -> Result<u64>;

  /// Non-null `product_id`s of orders matching `key`, at most `limit` of them.
  async fn product_ids(&self, key: &OrderKey, limit: usize) -> Result<Vec<String>>;

  /// Newest first.
  async fn list_orders(&self, status: Option<OrderStatus>, page: PageRequest) -> Result<Page<Order>>;

  async fn order_stats(&self) -> Result<OrderStats>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
  /// Marks the items inactive and stamps `archived_at` (first archival wins).
  async fn archive_items(&self, ids: &[String], at: DateTime<Utc>) -> Result<u64>;

  /// Sorted by name.
  async fn list_products(&self, filter: &ProductFilter, page: PageRequest) -> Result<Page<Product>>;

  /// Newest listed items first.
  async fn feed(&self, limit: u32) -> Result<Vec<Product>>;

  async fn list_categories(&self) -> Result<Vec<Category>>;

  /// Active banners by position.
  async fn list_banners(&self) -> Result<Vec<Banner>>;

  async fn product_counts(&self) -> Result<ProductCounts>;
}
