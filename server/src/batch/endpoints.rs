// paysync-server/src/batch/endpoints.rs

//! Static table of the read endpoints a batch may address.
//!
//! Each endpoint declares a params struct and a result type. Raw `params` are
//! deserialized into the declared struct before the handler runs, and the
//! typed result is turned back into JSON only at the edge.

use crate::errors::{AppError, Result};
use crate::models::{OrderStatus, PageRequest, ProductFilter};
use crate::state::AppState;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::future::Future;

pub const DEFAULT_FEED_LIMIT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
  Products,
  Feed,
  Categories,
  Banners,
  AdminOrders,
  AdminProducts,
  AdminStats,
}

/// Result of looking an endpoint name up in the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
  Supported(Endpoint),
  NotSupported(String),
}

impl Endpoint {
  pub const ALL: [Endpoint; 7] = [
    Endpoint::Products,
    Endpoint::Feed,
    Endpoint::Categories,
    Endpoint::Banners,
    Endpoint::AdminOrders,
    Endpoint::AdminProducts,
    Endpoint::AdminStats,
  ];

  pub fn name(self) -> &'static str {
    match self {
      Endpoint::Products => "products",
      Endpoint::Feed => "feed",
      Endpoint::Categories => "categories",
      Endpoint::Banners => "banners",
      Endpoint::AdminOrders => "admin/orders",
      Endpoint::AdminProducts => "admin/products",
      Endpoint::AdminStats => "admin/stats",
    }
  }

  pub fn resolve(name: &str) -> Resolved {
    let wanted = name.trim().trim_matches('/');
    Self::ALL
      .into_iter()
      .find(|e| e.name() == wanted)
      .map_or_else(|| Resolved::NotSupported(name.to_string()), Resolved::Supported)
  }

  pub fn requires_admin(self) -> bool {
    matches!(self, Endpoint::AdminOrders | Endpoint::AdminProducts | Endpoint::AdminStats)
  }

  /// Every endpoint is a read.
  pub fn supports_method(self, method: &str) -> bool {
    method.trim().eq_ignore_ascii_case("GET")
  }

  pub async fn call(self, state: &AppState, params: Option<JsonValue>) -> Result<JsonValue> {
    match self {
      Endpoint::Products => invoke(params, |p: ProductsParams| products(state, p)).await,
      Endpoint::Feed => invoke(params, |p: FeedParams| feed(state, p)).await,
      Endpoint::Categories => invoke(params, |_: NoParams| categories(state)).await,
      Endpoint::Banners => invoke(params, |_: NoParams| banners(state)).await,
      Endpoint::AdminOrders => invoke(params, |p: AdminOrdersParams| admin_orders(state, p)).await,
      Endpoint::AdminProducts => invoke(params, |p: AdminProductsParams| admin_products(state, p)).await,
      Endpoint::AdminStats => invoke(params, |_: NoParams| admin_stats(state)).await,
    }
  }
}

/// Missing or `null` params mean "all defaults"; anything but an object is a
/// shape error.
fn parse_params<P: DeserializeOwned + Default>(raw: Option<JsonValue>) -> Result<P> {
  match raw {
    None | Some(JsonValue::Null) => Ok(P::default()),
    Some(value @ JsonValue::Object(_)) => {
      serde_json::from_value(value).map_err(|e| AppError::Validation(format!("Invalid params: {}", e)))
    }
    Some(_) => Err(AppError::Validation("'params' must be an object.".to_string())),
  }
}

async fn invoke<P, T, F, Fut>(raw: Option<JsonValue>, handler: F) -> Result<JsonValue>
where
  P: DeserializeOwned + Default,
  T: Serialize,
  F: FnOnce(P) -> Fut,
  Fut: Future<Output = Result<T>>,
{
  let params = parse_params::<P>(raw)?;
  let output = handler(params).await?;
  serde_json::to_value(output).map_err(|e| AppError::Internal(format!("Could not serialize result: {}", e)))
}

/// Accepts `2` as well as `"2"`; query-string style callers send the latter.
fn lenient_u32<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
  D: Deserializer<'de>,
{
  use serde::de::Error;
  match Option::<JsonValue>::deserialize(deserializer)? {
    None | Some(JsonValue::Null) => Ok(None),
    Some(JsonValue::Number(n)) => n
      .as_u64()
      .and_then(|v| u32::try_from(v).ok())
      .map(Some)
      .ok_or_else(|| D::Error::custom(format!("expected a non-negative integer, got {}", n))),
    Some(JsonValue::String(s)) if s.trim().is_empty() => Ok(None),
    Some(JsonValue::String(s)) => s
      .trim()
      .parse::<u32>()
      .map(Some)
      .map_err(|_| D::Error::custom(format!("expected a non-negative integer, got '{}'", s))),
    Some(other) => Err(D::Error::custom(format!("expected a non-negative integer, got {}", other))),
  }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NoParams {}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PageParams {
  #[serde(default, deserialize_with = "lenient_u32")]
  pub page: Option<u32>,
  #[serde(default, deserialize_with = "lenient_u32")]
  pub limit: Option<u32>,
}

impl PageParams {
  pub fn request(&self) -> PageRequest {
    PageRequest::new(self.page, self.limit)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductsParams {
  #[serde(flatten)]
  pub paging: PageParams,
  #[serde(default)]
  pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FeedParams {
  #[serde(default, deserialize_with = "lenient_u32")]
  pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AdminOrdersParams {
  #[serde(flatten)]
  pub paging: PageParams,
  #[serde(default)]
  pub status: Option<OrderStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AdminProductsParams {
  #[serde(flatten)]
  pub paging: PageParams,
  #[serde(default)]
  pub category: Option<String>,
}

async fn products(state: &AppState, params: ProductsParams) -> Result<impl Serialize> {
  let filter = ProductFilter {
    listed_only: true,
    category_id: params.category.filter(|c| !c.trim().is_empty()),
  };
  state.catalog.list_products(&filter, params.paging.request()).await
}

async fn feed(state: &AppState, params: FeedParams) -> Result<impl Serialize> {
  let limit = params.limit.unwrap_or(DEFAULT_FEED_LIMIT).clamp(1, crate::models::page::MAX_PAGE_SIZE);
  let items = state.catalog.feed(limit).await?;
  Ok(json!({ "items": items }))
}

async fn categories(state: &AppState) -> Result<impl Serialize> {
  let items = state.catalog.list_categories().await?;
  Ok(json!({ "items": items }))
}

async fn banners(state: &AppState) -> Result<impl Serialize> {
  let items = state.catalog.list_banners().await?;
  Ok(json!({ "items": items }))
}

async fn admin_orders(state: &AppState, params: AdminOrdersParams) -> Result<impl Serialize> {
  state.orders.list_orders(params.status, params.paging.request()).await
}

async fn admin_products(state: &AppState, params: AdminProductsParams) -> Result<impl Serialize> {
  let filter = ProductFilter {
    listed_only: false,
    category_id: params.category.filter(|c| !c.trim().is_empty()),
  };
  state.catalog.list_products(&filter, params.paging.request()).await
}

async fn admin_stats(state: &AppState) -> Result<impl Serialize> {
  let (orders, products) = futures_util::try_join!(state.orders.order_stats(), state.catalog.product_counts())?;
  Ok(json!({ "orders": orders, "products": products }))
}
