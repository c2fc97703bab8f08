// paysync-server/src/services/notifier.rs

//! Operator notifications sent after a successful payment is reconciled.

use crate::errors::{AppError, Result};
use crate::models::OrderStatus;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentNotification {
  pub reconciliation_id: Uuid,
  pub matched_by: &'static str,
  pub key: String,
  pub status: OrderStatus,
  pub rows: u64,
  pub payer_email: Option<String>,
}

#[async_trait]
pub trait NotificationGateway: Send + Sync {
  async fn notify(&self, notification: &PaymentNotification) -> Result<()>;
}

/// POSTs each notification as JSON to a fixed URL.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
  client: reqwest::Client,
  url: String,
}

impl HttpNotifier {
  pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| AppError::Config(format!("Could not build notification client: {}", e)))?;
    Ok(Self { client, url: url.into() })
  }
}

#[async_trait]
impl NotificationGateway for HttpNotifier {
  #[instrument(skip_all, fields(url = %self.url, key = %notification.key))]
  async fn notify(&self, notification: &PaymentNotification) -> Result<()> {
    let response = self.client.post(&self.url).json(notification).send().await?;
    let status = response.status();
    if !status.is_success() {
      return Err(AppError::Notification(format!("Webhook responded with {}", status)));
    }
    info!(%status, "Operator notification delivered.");
    Ok(())
  }
}

/// Used when no notification URL is configured.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationGateway for LogNotifier {
  async fn notify(&self, notification: &PaymentNotification) -> Result<()> {
    info!(
      reconciliation_id = %notification.reconciliation_id,
      by = notification.matched_by,
      key = %notification.key,
      status = %notification.status,
      rows = notification.rows,
      "Payment reconciled."
    );
    Ok(())
  }
}
