// paysync-server/src/models/callback.rs

//! Payment provider callback bodies.
//!
//! Parsing happens in two stages. [`RawEnvelope`] accepts whatever shape the
//! provider sends (fields wrapped in `data`, at the top level, or both).
//! [`RawEnvelope::normalize`] then decides, in one place, where every field
//! is read from and whether the callback is usable at all.

use crate::errors::{AppError, Result};
use crate::models::order::{OrderKey, OrderStatus, OrderUpdate};
use crate::services::status_mapper::map_provider_status;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

/// Accepts strings, numbers and booleans; anything else reads as absent.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(match Option::<JsonValue>::deserialize(deserializer)? {
    Some(JsonValue::String(s)) => Some(s),
    Some(JsonValue::Number(n)) => Some(n.to_string()),
    Some(JsonValue::Bool(b)) => Some(b.to_string()),
    _ => None,
  })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCallback {
  #[serde(default, deserialize_with = "lenient_string")]
  pub id: Option<String>,
  #[serde(default, deserialize_with = "lenient_string")]
  pub invoice_id: Option<String>,
  #[serde(default, deserialize_with = "lenient_string")]
  pub external_id: Option<String>,
  #[serde(default, deserialize_with = "lenient_string")]
  pub status: Option<String>,
  #[serde(default, deserialize_with = "lenient_string")]
  pub paid_at: Option<String>,
  #[serde(default, deserialize_with = "lenient_string")]
  pub payment_channel: Option<String>,
  #[serde(default, deserialize_with = "lenient_string")]
  pub payment_method: Option<String>,
  #[serde(default, deserialize_with = "lenient_string")]
  pub payer_email: Option<String>,
  #[serde(default)]
  pub payer: Option<JsonValue>,
  #[serde(default, deserialize_with = "lenient_string")]
  pub invoice_url: Option<String>,
  #[serde(default, deserialize_with = "lenient_string")]
  pub currency: Option<String>,
  #[serde(default, deserialize_with = "lenient_string")]
  pub expiry_date: Option<String>,
}

impl RawCallback {
  fn nested_payer_email(&self) -> Option<String> {
    self
      .payer
      .as_ref()
      .and_then(|p| p.get("email"))
      .and_then(JsonValue::as_str)
      .map(str::to_string)
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEnvelope {
  /// Kept raw; only an object counts as a wrapper.
  #[serde(default)]
  pub data: Option<JsonValue>,
  #[serde(flatten)]
  pub top: RawCallback,
}

/// A callback reduced to the fields reconciliation acts on.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCallback {
  pub invoice_id: Option<String>,
  pub external_id: Option<String>,
  /// Status token exactly as the provider sent it (trimmed).
  pub provider_status: String,
  pub status: OrderStatus,
  pub paid_at: Option<DateTime<Utc>>,
  pub payment_channel: Option<String>,
  pub payer_email: Option<String>,
  pub invoice_url: Option<String>,
  pub currency: String,
  pub expires_at: Option<DateTime<Utc>>,
}

/// First candidate that is present and not blank, trimmed.
fn first(candidates: impl IntoIterator<Item = Option<String>>) -> Option<String> {
  candidates
    .into_iter()
    .flatten()
    .map(|s| s.trim().to_string())
    .find(|s| !s.is_empty())
}

/// RFC 3339, or a naive `T`/space separated date-time taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
  let raw = raw.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Some(dt.with_timezone(&Utc));
  }
  ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    .map(|naive| naive.and_utc())
}

impl RawEnvelope {
  pub fn parse(body: &[u8]) -> Result<Self> {
    serde_json::from_slice(body).map_err(|e| AppError::Validation(format!("Invalid JSON payload: {}", e)))
  }

  /// Resolves every field, preferring `data` over the top level.
  ///
  /// Fails when no status is present or when neither a provider invoice id nor
  /// an external id is present. `now` becomes `paid_at` for a successful
  /// payment that arrives without one.
  pub fn normalize(self, default_currency: &str, now: DateTime<Utc>) -> Result<NormalizedCallback> {
    let d = match self.data {
      Some(wrapper @ JsonValue::Object(_)) => serde_json::from_value::<RawCallback>(wrapper)
        .map_err(|e| AppError::Validation(format!("Invalid 'data' object: {}", e)))?,
      _ => RawCallback::default(),
    };
    let t = self.top;

    let provider_status = first([d.status.clone(), t.status.clone()])
      .ok_or_else(|| AppError::Validation("Callback is missing 'status'.".to_string()))?;
    let invoice_id = first([d.id.clone(), d.invoice_id.clone(), t.id.clone(), t.invoice_id.clone()]);
    let external_id = first([d.external_id.clone(), t.external_id.clone()]);
    if invoice_id.is_none() && external_id.is_none() {
      return Err(AppError::Validation(
        "Callback carries neither 'id' nor 'external_id'.".to_string(),
      ));
    }

    let status = map_provider_status(Some(&provider_status));
    let paid_at = first([d.paid_at.clone(), t.paid_at.clone()])
      .as_deref()
      .and_then(parse_timestamp)
      .or_else(|| status.is_payment_success().then_some(now));

    Ok(NormalizedCallback {
      invoice_id,
      external_id,
      provider_status,
      status,
      paid_at,
      payment_channel: first([
        d.payment_channel.clone(),
        d.payment_method.clone(),
        t.payment_channel.clone(),
        t.payment_method.clone(),
      ]),
      payer_email: first([
        d.payer_email.clone(),
        d.nested_payer_email(),
        t.payer_email.clone(),
        t.nested_payer_email(),
      ]),
      invoice_url: first([d.invoice_url.clone(), t.invoice_url.clone()]),
      currency: first([d.currency.clone(), t.currency.clone()])
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or_else(|| default_currency.to_string()),
      expires_at: first([d.expiry_date.clone(), t.expiry_date.clone()])
        .as_deref()
        .and_then(parse_timestamp),
    })
  }
}

impl NormalizedCallback {
  pub fn primary_key(&self) -> Option<OrderKey> {
    self.invoice_id.clone().map(OrderKey::InvoiceId)
  }

  pub fn fallback_key(&self) -> Option<OrderKey> {
    self.external_id.clone().map(OrderKey::OrderId)
  }

  pub fn to_update(&self) -> OrderUpdate {
    OrderUpdate {
      status: self.status,
      currency: self.currency.clone(),
      provider_invoice_id: self.invoice_id.clone(),
      provider_invoice_url: self.invoice_url.clone(),
      payment_channel: self.payment_channel.clone(),
      payer_email: self.payer_email.clone(),
      expires_at: self.expires_at,
      paid_at: self.paid_at,
    }
  }
}
