// paysync-server/src/batch/mod.rs

//! Multi-endpoint read batching: wire shapes, the endpoint table and the
//! concurrent dispatcher.

pub mod dispatcher;
pub mod endpoints;

use crate::errors::{AppError, Result};
use actix_web::ResponseError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashSet;

/// Items stay raw until their ids are known so one malformed entry only
/// fails itself.
#[derive(Debug, Deserialize)]
pub struct BatchEnvelope {
  #[serde(default)]
  pub requests: Option<Vec<JsonValue>>,
}

/// A batch item after shape validation.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEntry {
  Valid(BatchSubRequest),
  /// Carries its own `400` response.
  Invalid(BatchSubResponse),
}

impl BatchEntry {
  pub fn id(&self) -> &str {
    match self {
      BatchEntry::Valid(request) => &request.id,
      BatchEntry::Invalid(response) => &response.id,
    }
  }

  fn from_value(id: String, value: JsonValue) -> Self {
    match serde_json::from_value::<BatchSubRequest>(value) {
      Ok(request) => BatchEntry::Valid(request),
      Err(e) => BatchEntry::Invalid(BatchSubResponse::failed(
        id.clone(),
        &AppError::Validation(format!("Invalid request '{}': {}", id, e)),
      )),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchSubRequest {
  pub id: String,
  pub endpoint: String,
  pub method: String,
  #[serde(default)]
  pub params: Option<JsonValue>,
}

/// Outcome of one sub-request. Exactly one of `data` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSubResponse {
  pub id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data: Option<JsonValue>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  pub status: u16,
}

impl BatchSubResponse {
  pub fn ok(id: String, data: JsonValue) -> Self {
    Self {
      id,
      data: Some(data),
      error: None,
      status: 200,
    }
  }

  pub fn failed(id: String, err: &AppError) -> Self {
    Self {
      id,
      data: None,
      error: Some(err.public_message()),
      status: err.status_code().as_u16(),
    }
  }

  pub fn is_success(&self) -> bool {
    self.status == 200
  }
}

impl BatchEnvelope {
  pub fn parse(body: &[u8]) -> Result<Self> {
    serde_json::from_slice(body).map_err(|e| AppError::Validation(format!("Invalid batch payload: {}", e)))
  }

  /// Returns one entry per item if there are between 1 and `max` of them,
  /// each with a readable, distinct id. Any other shape problem is confined
  /// to its own entry.
  pub fn into_entries(self, max: usize) -> Result<Vec<BatchEntry>> {
    let requests = self
      .requests
      .ok_or_else(|| AppError::Validation("'requests' array is required.".to_string()))?;
    if requests.is_empty() {
      return Err(AppError::Validation("'requests' must not be empty.".to_string()));
    }
    if requests.len() > max {
      return Err(AppError::Validation(format!(
        "Too many requests: {} (max {}).",
        requests.len(),
        max
      )));
    }

    let mut seen = HashSet::with_capacity(requests.len());
    let mut entries = Vec::with_capacity(requests.len());
    for (index, value) in requests.into_iter().enumerate() {
      let id = match value.get("id").and_then(JsonValue::as_str) {
        Some(id) => id.to_string(),
        None => {
          return Err(AppError::Validation(format!(
            "Request at index {} has no string 'id'.",
            index
          )))
        }
      };
      if !seen.insert(id.clone()) {
        return Err(AppError::Validation(format!("Duplicate request id '{}'.", id)));
      }
      entries.push(BatchEntry::from_value(id, value));
    }
    Ok(entries)
  }
}
