// paysync-server/src/store/memory.rs

use crate::errors::Result;
use crate::models::{
  Banner, Category, Order, OrderKey, OrderStats, OrderStatus, OrderUpdate, Page, PageRequest, Product,
  ProductCounts, ProductFilter,
};
use crate::store::{CatalogStore, OrderStore, SeedData};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Order and catalog tables held in process memory.
///
/// Backs `STORE_BACKEND=memory` and the integration tests. Clones share the
/// same tables.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
  orders: Arc<RwLock<HashMap<String, Order>>>,
  products: Arc<RwLock<HashMap<String, Product>>>,
  categories: Arc<RwLock<Vec<Category>>>,
  banners: Arc<RwLock<Vec<Banner>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert_order(&self, order: Order) {
    self.orders.write().insert(order.id.clone(), order);
  }

  pub fn insert_product(&self, product: Product) {
    self.products.write().insert(product.id.clone(), product);
  }

  pub fn insert_category(&self, category: Category) {
    self.categories.write().push(category);
  }

  pub fn insert_banner(&self, banner: Banner) {
    self.banners.write().push(banner);
  }

  pub fn seed(&self, data: &SeedData) {
    data.categories.iter().cloned().for_each(|c| self.insert_category(c));
    data.banners.iter().cloned().for_each(|b| self.insert_banner(b));
    data.products.iter().cloned().for_each(|p| self.insert_product(p));
    data.orders.iter().cloned().for_each(|o| self.insert_order(o));
  }

  pub fn order(&self, id: &str) -> Option<Order> {
    self.orders.read().get(id).cloned()
  }

  pub fn product(&self, id: &str) -> Option<Product> {
    self.products.read().get(id).cloned()
  }
}

#[async_trait]
impl OrderStore for MemoryStore {
  async fn update_orders(&self, key: &OrderKey, update: &OrderUpdate) -> Result<u64> {
    let now = Utc::now();
    let mut orders = self.orders.write();
    let mut rows = 0;
    for order in orders.values_mut().filter(|o| key.matches(o)) {
      update.apply_to(order, now);
      rows += 1;
    }
    Ok(rows)
  }

  async fn product_ids(&self, key: &OrderKey, limit: usize) -> Result<Vec<String>> {
    let orders = self.orders.read();
    Ok(
      orders
        .values()
        .filter(|o| key.matches(o))
        .filter_map(|o| o.product_id.clone())
        .take(limit)
        .collect(),
    )
  }

  async fn list_orders(&self, status: Option<OrderStatus>, page: PageRequest) -> Result<Page<Order>> {
    let mut matching: Vec<Order> = self
      .orders
      .read()
      .values()
      .filter(|o| status.map_or(true, |s| o.status == s))
      .cloned()
      .collect();
    matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(Page::slice(matching, page))
  }

  async fn order_stats(&self) -> Result<OrderStats> {
    let mut stats = OrderStats::default();
    for order in self.orders.read().values() {
      stats.record(order.status, 1, order.amount);
    }
    Ok(stats)
  }
}

#[async_trait]
impl CatalogStore for MemoryStore {
  async fn archive_items(&self, ids: &[String], at: DateTime<Utc>) -> Result<u64> {
    let mut products = self.products.write();
    let mut rows = 0;
    for id in ids {
      if let Some(product) = products.get_mut(id) {
        product.is_active = false;
        product.archived_at.get_or_insert(at);
        rows += 1;
      }
    }
    Ok(rows)
  }

  async fn list_products(&self, filter: &ProductFilter, page: PageRequest) -> Result<Page<Product>> {
    let mut matching: Vec<Product> = self
      .products
      .read()
      .values()
      .filter(|p| !filter.listed_only || p.is_listed())
      .filter(|p| filter.category_id.is_none() || p.category_id == filter.category_id)
      .cloned()
      .collect();
    matching.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    Ok(Page::slice(matching, page))
  }

  async fn feed(&self, limit: u32) -> Result<Vec<Product>> {
    let mut listed: Vec<Product> = self.products.read().values().filter(|p| p.is_listed()).cloned().collect();
    listed.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    listed.truncate(limit as usize);
    Ok(listed)
  }

  async fn list_categories(&self) -> Result<Vec<Category>> {
    let mut categories = self.categories.read().clone();
    categories.sort_by_key(|c| c.position);
    Ok(categories)
  }

  async fn list_banners(&self) -> Result<Vec<Banner>> {
    let mut banners: Vec<Banner> = self.banners.read().iter().filter(|b| b.is_active).cloned().collect();
    banners.sort_by_key(|b| b.position);
    Ok(banners)
  }

  async fn product_counts(&self) -> Result<ProductCounts> {
    let products = self.products.read();
    let active = products.values().filter(|p| p.is_listed()).count() as i64;
    let total = products.len() as i64;
    Ok(ProductCounts {
      active,
      archived: total - active,
      total,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn paid() -> OrderUpdate {
    OrderUpdate {
      status: OrderStatus::Paid,
      currency: "IDR".to_string(),
      provider_invoice_id: Some("inv_1".to_string()),
      provider_invoice_url: None,
      payment_channel: None,
      payer_email: None,
      expires_at: None,
      paid_at: Some(Utc::now()),
    }
  }

  #[tokio::test]
  async fn update_reports_matched_rows_per_key() {
    let store = MemoryStore::new();
    store.insert_order(Order::pending("o1", Some("p1".to_string()), 10, "IDR"));

    assert_eq!(store.update_orders(&OrderKey::InvoiceId("inv_1".into()), &paid()).await.unwrap(), 0);
    assert_eq!(store.update_orders(&OrderKey::OrderId("o1".into()), &paid()).await.unwrap(), 1);
    // The invoice id was persisted by the fallback update, so the primary key matches now.
    assert_eq!(store.update_orders(&OrderKey::InvoiceId("inv_1".into()), &paid()).await.unwrap(), 1);
    assert_eq!(
      store.product_ids(&OrderKey::InvoiceId("inv_1".into()), 50).await.unwrap(),
      vec!["p1".to_string()]
    );
  }

  #[tokio::test]
  async fn archival_is_sticky_and_hides_items() {
    let store = MemoryStore::new();
    store.insert_product(Product::active("p1", "Poster", 100, None));
    store.insert_product(Product::active("p2", "Print", 200, None));

    let first = Utc::now();
    assert_eq!(store.archive_items(&["p1".to_string(), "ghost".to_string()], first).await.unwrap(), 1);
    store
      .archive_items(&["p1".to_string()], first + chrono::Duration::minutes(1))
      .await
      .unwrap();

    let p1 = store.product("p1").unwrap();
    assert!(!p1.is_active);
    assert_eq!(p1.archived_at, Some(first));

    let listed = store
      .list_products(
        &ProductFilter {
          listed_only: true,
          category_id: None,
        },
        PageRequest::default(),
      )
      .await
      .unwrap();
    assert_eq!(listed.items.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(), vec!["p2"]);
    assert_eq!(
      store.product_counts().await.unwrap(),
      ProductCounts {
        active: 1,
        archived: 1,
        total: 2
      }
    );
  }
}
