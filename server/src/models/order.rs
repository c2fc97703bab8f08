// paysync-server/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "order_status_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Paid,
  Completed,
  Cancelled,
}

impl OrderStatus {
  /// `paid` and `completed` both mean the money arrived.
  pub fn is_payment_success(self) -> bool {
    matches!(self, OrderStatus::Paid | OrderStatus::Completed)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Paid => "paid",
      OrderStatus::Completed => "completed",
      OrderStatus::Cancelled => "cancelled",
    }
  }
}

impl std::fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Order {
  pub id: String,
  pub product_id: Option<String>,
  pub status: OrderStatus,
  pub amount: i64,
  pub currency: String,
  pub provider_invoice_id: Option<String>,
  pub provider_invoice_url: Option<String>,
  pub payment_channel: Option<String>,
  pub payer_email: Option<String>,
  pub expires_at: Option<DateTime<Utc>>,
  pub paid_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Order {
  /// A fresh checkout order as the storefront would create it.
  pub fn pending(id: impl Into<String>, product_id: Option<String>, amount: i64, currency: &str) -> Self {
    let now = Utc::now();
    Self {
      id: id.into(),
      product_id,
      status: OrderStatus::Pending,
      amount,
      currency: currency.to_string(),
      provider_invoice_id: None,
      provider_invoice_url: None,
      payment_channel: None,
      payer_email: None,
      expires_at: None,
      paid_at: None,
      created_at: now,
      updated_at: now,
    }
  }
}

/// Filter of an order update. Exactly one key is used per attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderKey {
  InvoiceId(String),
  /// The local primary key, as echoed back by the provider in `external_id`.
  OrderId(String),
}

impl OrderKey {
  /// Wire name reported in the webhook acknowledgement (`by`).
  pub fn label(&self) -> &'static str {
    match self {
      OrderKey::InvoiceId(_) => "invoice_id",
      OrderKey::OrderId(_) => "external_id",
    }
  }

  pub fn value(&self) -> &str {
    match self {
      OrderKey::InvoiceId(v) | OrderKey::OrderId(v) => v,
    }
  }

  pub fn matches(&self, order: &Order) -> bool {
    match self {
      OrderKey::InvoiceId(id) => order.provider_invoice_id.as_deref() == Some(id.as_str()),
      OrderKey::OrderId(id) => order.id == *id,
    }
  }
}

impl std::fmt::Display for OrderKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}={}", self.label(), self.value())
  }
}

/// Field values a callback sets on matching orders.
///
/// Applying the same update twice leaves the row unchanged: `status` and
/// `currency` are always overwritten, optional fields only when supplied, and
/// `provider_invoice_id` / `paid_at` keep the first value ever written.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderUpdate {
  pub status: OrderStatus,
  pub currency: String,
  pub provider_invoice_id: Option<String>,
  pub provider_invoice_url: Option<String>,
  pub payment_channel: Option<String>,
  pub payer_email: Option<String>,
  pub expires_at: Option<DateTime<Utc>>,
  pub paid_at: Option<DateTime<Utc>>,
}

impl OrderUpdate {
  pub fn apply_to(&self, order: &mut Order, now: DateTime<Utc>) {
    order.status = self.status;
    order.currency = self.currency.clone();
    if order.provider_invoice_id.is_none() {
      order.provider_invoice_id = self.provider_invoice_id.clone();
    }
    if order.paid_at.is_none() {
      order.paid_at = self.paid_at;
    }
    if let Some(url) = &self.provider_invoice_url {
      order.provider_invoice_url = Some(url.clone());
    }
    if let Some(channel) = &self.payment_channel {
      order.payment_channel = Some(channel.clone());
    }
    if let Some(email) = &self.payer_email {
      order.payer_email = Some(email.clone());
    }
    if let Some(expires_at) = self.expires_at {
      order.expires_at = Some(expires_at);
    }
    order.updated_at = now;
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderStats {
  pub pending: i64,
  pub paid: i64,
  pub completed: i64,
  pub cancelled: i64,
  pub total: i64,
  /// Sum of `amount` over paid and completed orders.
  pub paid_revenue: i64,
}

impl OrderStats {
  pub fn record(&mut self, status: OrderStatus, count: i64, amount: i64) {
    match status {
      OrderStatus::Pending => self.pending += count,
      OrderStatus::Paid => self.paid += count,
      OrderStatus::Completed => self.completed += count,
      OrderStatus::Cancelled => self.cancelled += count,
    }
    self.total += count;
    if status.is_payment_success() {
      self.paid_revenue += amount;
    }
  }
}
