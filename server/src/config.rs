// paysync-server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

impl LogFormat {
  /// Read before the subscriber exists, so it does not go through `AppConfig::from_env`.
  pub fn from_env() -> Self {
    match env::var("LOG_FORMAT").map(|v| v.trim().to_ascii_lowercase()) {
      Ok(v) if v == "json" => LogFormat::Json,
      _ => LogFormat::Pretty,
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub store_backend: StoreBackend,
  pub database_url: Option<String>,

  /// Shared secret expected in `callback_token_header`. `None` disables the check.
  pub callback_token: Option<String>,
  pub callback_token_header: String,
  pub default_currency: String,

  pub batch_max_requests: usize,
  pub batch_item_timeout: Duration,
  /// Required in `x-admin-token` for `admin/*` batch endpoints when set.
  pub admin_token: Option<String>,

  pub notify_webhook_url: Option<String>,
  pub notify_timeout: Duration,

  pub seed_db: bool,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      store_backend: StoreBackend::Postgres,
      database_url: None,
      callback_token: None,
      callback_token_header: "x-callback-token".to_string(),
      default_currency: "IDR".to_string(),
      batch_max_requests: 20,
      batch_item_timeout: Duration::from_secs(10),
      admin_token: None,
      notify_webhook_url: None,
      notify_timeout: Duration::from_secs(5),
      seed_db: false,
    }
  }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T>
where
  T::Err: std::fmt::Display,
{
  raw
    .trim()
    .parse::<T>()
    .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e)))
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    let get_env = |var_name: &str| env::var(var_name).ok().filter(|v| !v.trim().is_empty());

    let mut cfg = Self::default();

    if let Some(host) = get_env("SERVER_HOST") {
      cfg.server_host = host;
    }
    if let Some(port) = get_env("SERVER_PORT") {
      cfg.server_port = parse_var("SERVER_PORT", &port)?;
    }
    if let Some(backend) = get_env("STORE_BACKEND") {
      cfg.store_backend = match backend.trim().to_ascii_lowercase().as_str() {
        "postgres" => StoreBackend::Postgres,
        "memory" => StoreBackend::Memory,
        other => return Err(AppError::Config(format!("Unknown STORE_BACKEND '{}'", other))),
      };
    }
    cfg.database_url = get_env("DATABASE_URL");
    if cfg.store_backend == StoreBackend::Postgres && cfg.database_url.is_none() {
      return Err(AppError::Config(
        "Missing environment variable 'DATABASE_URL' (required for the postgres backend)".to_string(),
      ));
    }

    cfg.callback_token = get_env("CALLBACK_TOKEN");
    if let Some(header) = get_env("CALLBACK_TOKEN_HEADER") {
      cfg.callback_token_header = header.trim().to_ascii_lowercase();
    }
    if let Some(currency) = get_env("DEFAULT_CURRENCY") {
      cfg.default_currency = currency.trim().to_ascii_uppercase();
    }

    if let Some(max) = get_env("BATCH_MAX_REQUESTS") {
      cfg.batch_max_requests = parse_var("BATCH_MAX_REQUESTS", &max)?;
      if cfg.batch_max_requests == 0 {
        return Err(AppError::Config("BATCH_MAX_REQUESTS must be at least 1".to_string()));
      }
    }
    if let Some(ms) = get_env("BATCH_ITEM_TIMEOUT_MS") {
      cfg.batch_item_timeout = Duration::from_millis(parse_var("BATCH_ITEM_TIMEOUT_MS", &ms)?);
    }
    cfg.admin_token = get_env("ADMIN_TOKEN");

    cfg.notify_webhook_url = get_env("NOTIFY_WEBHOOK_URL");
    if let Some(ms) = get_env("NOTIFY_TIMEOUT_MS") {
      cfg.notify_timeout = Duration::from_millis(parse_var("NOTIFY_TIMEOUT_MS", &ms)?);
    }

    if let Some(seed) = get_env("SEED_DB") {
      cfg.seed_db = parse_var("SEED_DB", &seed)?;
    }

    if cfg.callback_token.is_none() {
      tracing::warn!("CALLBACK_TOKEN is not set; payment callbacks will be accepted without authentication.");
    }
    tracing::info!(
      backend = ?cfg.store_backend,
      callback_auth = cfg.callback_token.is_some(),
      admin_auth = cfg.admin_token.is_some(),
      notifications = cfg.notify_webhook_url.is_some(),
      "Application configuration loaded."
    );
    Ok(cfg)
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}
