// paysync-server/src/models/category.rs

use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Category {
  pub id: String,
  pub name: String,
  pub slug: String,
  pub position: i32,
}
