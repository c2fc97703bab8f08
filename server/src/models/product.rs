// paysync-server/src/models/product.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A sellable catalog item. Once `archived_at` is set the item is inactive
/// and never listed as available again by this service.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Product {
  pub id: String,
  pub name: String,
  pub description: Option<String>,
  pub price: i64,
  pub category_id: Option<String>,
  pub is_active: bool,
  pub archived_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
}

impl Product {
  pub fn active(id: impl Into<String>, name: impl Into<String>, price: i64, category_id: Option<String>) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      description: None,
      price,
      category_id,
      is_active: true,
      archived_at: None,
      created_at: Utc::now(),
    }
  }

  pub fn is_listed(&self) -> bool {
    self.is_active && self.archived_at.is_none()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
  pub listed_only: bool,
  pub category_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductCounts {
  pub active: i64,
  pub archived: i64,
  pub total: i64,
}
