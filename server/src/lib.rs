// paysync-server/src/lib.rs

//! Payment callback reconciliation and read batching over actix-web.

pub mod batch;
pub mod config;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod security;
pub mod services;
pub mod state;
pub mod store;
pub mod web;

use crate::config::{AppConfig, LogFormat, StoreBackend};
use crate::errors::Result;
use crate::services::{HttpNotifier, LogNotifier, NotificationGateway};
use crate::state::AppState;
use crate::store::{MemoryStore, PgStore, SeedData};
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` overrides the `info` default.
pub fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  let installed = match format {
    LogFormat::Json => builder.json().try_init(),
    LogFormat::Pretty => builder.try_init(),
  };
  if installed.is_err() {
    tracing::debug!("A global tracing subscriber was already installed.");
  }
}

/// Connects the configured stores and notifier and registers the pipelines.
pub async fn build_app_state(config: Arc<AppConfig>) -> Result<AppState> {
  let notifier: Arc<dyn NotificationGateway> = match &config.notify_webhook_url {
    Some(url) => Arc::new(HttpNotifier::new(url.clone(), config.notify_timeout)?),
    None => Arc::new(LogNotifier),
  };
  let seed = config.seed_db.then(|| SeedData::sample(&config.default_currency));

  let state = match config.store_backend {
    StoreBackend::Postgres => {
      let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| errors::AppError::Config("DATABASE_URL is required for the postgres backend".to_string()))?;
      let store = Arc::new(PgStore::connect(url).await?);
      store.ensure_schema().await?;
      if let Some(data) = &seed {
        store.seed(data).await?;
      }
      AppState::new(store.clone(), store, notifier, config)
    }
    StoreBackend::Memory => {
      tracing::warn!("Using the in-memory store; data is lost on restart.");
      let store = Arc::new(MemoryStore::new());
      if let Some(data) = &seed {
        store.seed(data);
      }
      AppState::new(store.clone(), store, notifier, config)
    }
  };
  Ok(state)
}
