// paysync-server/src/services/status_mapper.rs

use crate::models::OrderStatus;

/// Maps a provider invoice status onto the local order status.
///
/// Case-insensitive. Anything unrecognized, including a missing or empty
/// status, maps to `Pending`: an unknown token must never read as a payment.
pub fn map_provider_status(raw: Option<&str>) -> OrderStatus {
  let Some(raw) = raw else {
    return OrderStatus::Pending;
  };
  match raw.trim().to_ascii_uppercase().as_str() {
    "PAID" => OrderStatus::Paid,
    "SETTLED" => OrderStatus::Completed,
    "EXPIRED" | "CANCELLED" => OrderStatus::Cancelled,
    _ => OrderStatus::Pending,
  }
}
