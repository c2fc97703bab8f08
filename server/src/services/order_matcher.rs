// paysync-server/src/services/order_matcher.rs

//! Primary/fallback strategy for locating the orders a callback refers to.

use crate::errors::Result;
use crate::models::{NormalizedCallback, OrderKey, OrderUpdate};
use crate::store::OrderStore;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Which key updated rows, and how many.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MatchOutcome {
  Matched {
    key: OrderKey,
    rows: u64,
  },
  #[default]
  NoMatch,
}

impl MatchOutcome {
  /// `"invoice_id"`, `"external_id"` or `"none"`.
  pub fn by(&self) -> &'static str {
    match self {
      MatchOutcome::Matched { key, .. } => key.label(),
      MatchOutcome::NoMatch => "none",
    }
  }

  pub fn rows(&self) -> u64 {
    match self {
      MatchOutcome::Matched { rows, .. } => *rows,
      MatchOutcome::NoMatch => 0,
    }
  }

  pub fn key(&self) -> Option<&OrderKey> {
    match self {
      MatchOutcome::Matched { key, .. } => Some(key),
      MatchOutcome::NoMatch => None,
    }
  }

  pub fn is_matched(&self) -> bool {
    matches!(self, MatchOutcome::Matched { .. })
  }
}

pub struct OrderMatcher {
  orders: Arc<dyn OrderStore>,
}

impl OrderMatcher {
  pub fn new(orders: Arc<dyn OrderStore>) -> Self {
    Self { orders }
  }

  /// Applies `update` to orders whose provider invoice id equals the callback's.
  pub async fn try_primary_key(&self, callback: &NormalizedCallback, update: &OrderUpdate) -> Result<MatchOutcome> {
    self.try_key(callback.primary_key(), update).await
  }

  /// Applies `update` to the order whose id equals the callback's external id.
  pub async fn try_fallback_key(&self, callback: &NormalizedCallback, update: &OrderUpdate) -> Result<MatchOutcome> {
    self.try_key(callback.fallback_key(), update).await
  }

  /// Primary key first; the fallback only runs when the primary matched nothing.
  pub async fn reconcile(&self, callback: &NormalizedCallback) -> Result<MatchOutcome> {
    let update = callback.to_update();
    match self.try_primary_key(callback, &update).await? {
      MatchOutcome::NoMatch => self.try_fallback_key(callback, &update).await,
      matched => Ok(matched),
    }
  }

  #[instrument(skip(self, update), fields(key = ?key))]
  async fn try_key(&self, key: Option<OrderKey>, update: &OrderUpdate) -> Result<MatchOutcome> {
    let Some(key) = key else {
      debug!("Callback carries no value for this key.");
      return Ok(MatchOutcome::NoMatch);
    };
    let rows = self.orders.update_orders(&key, update).await?;
    debug!(rows, "Order update attempted.");
    Ok(if rows == 0 {
      MatchOutcome::NoMatch
    } else {
      MatchOutcome::Matched { key, rows }
    })
  }
}
