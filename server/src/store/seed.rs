// paysync-server/src/store/seed.rs

use crate::models::{Banner, Category, Order, Product};
use chrono::{Duration, Utc};

/// Sample catalog and checkout orders for local runs (`SEED_DB=true`).
#[derive(Debug, Clone, Default)]
pub struct SeedData {
  pub categories: Vec<Category>,
  pub banners: Vec<Banner>,
  pub products: Vec<Product>,
  pub orders: Vec<Order>,
}

impl SeedData {
  pub fn sample(currency: &str) -> Self {
    let categories = vec![
      Category {
        id: "cat_art".to_string(),
        name: "Digital Art".to_string(),
        slug: "digital-art".to_string(),
        position: 1,
      },
      Category {
        id: "cat_photo".to_string(),
        name: "Photography".to_string(),
        slug: "photography".to_string(),
        position: 2,
      },
    ];

    let banners = vec![
      Banner {
        id: "ban_launch".to_string(),
        title: "New drops every week".to_string(),
        image_url: "https://cdn.example.com/banners/launch.jpg".to_string(),
        link_url: Some("/feed".to_string()),
        is_active: true,
        position: 1,
      },
      Banner {
        id: "ban_old".to_string(),
        title: "Last season".to_string(),
        image_url: "https://cdn.example.com/banners/old.jpg".to_string(),
        link_url: None,
        is_active: false,
        position: 2,
      },
    ];

    let now = Utc::now();
    let products: Vec<Product> = [
      ("prd_sunset", "Sunset Over Bromo", 150_000, "cat_photo"),
      ("prd_rice", "Rice Terraces", 120_000, "cat_photo"),
      ("prd_wayang", "Wayang Remix", 250_000, "cat_art"),
      ("prd_batik", "Batik Gradient", 90_000, "cat_art"),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (id, name, price, category))| {
      let mut product = Product::active(id, name, price, Some(category.to_string()));
      product.created_at = now - Duration::hours(i as i64);
      product
    })
    .collect();

    let orders = products
      .iter()
      .map(|p| Order::pending(format!("ord_{}", p.id.trim_start_matches("prd_")), Some(p.id.clone()), p.price, currency))
      .collect();

    Self {
      categories,
      banners,
      products,
      orders,
    }
  }
}
