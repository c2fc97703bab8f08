// paysync-server/src/models/banner.rs

use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Banner {
  pub id: String,
  pub title: String,
  pub image_url: String,
  pub link_url: Option<String>,
  pub is_active: bool,
  pub position: i32,
}
