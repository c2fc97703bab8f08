// paysync-server/src/store/postgres.rs

use crate::errors::Result;
use crate::models::{
  Banner, Category, Order, OrderKey, OrderStats, OrderStatus, OrderUpdate, Page, PageRequest, Product,
  ProductCounts, ProductFilter,
};
use crate::store::seed::SeedData;
use crate::store::{CatalogStore, OrderStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, instrument};

const SCHEMA_SQL: &str = include_str!("../../schema.sql");

/// Both stores on one Postgres database.
#[derive(Debug, Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl OrderKey {
  fn column(&self) -> &'static str {
    match self {
      OrderKey::InvoiceId(_) => "provider_invoice_id",
      OrderKey::OrderId(_) => "id",
    }
  }
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub async fn connect(database_url: &str) -> Result<Self> {
    let pool = PgPoolOptions::new().max_connections(10).connect(database_url).await?;
    info!("Database connection pool established.");
    Ok(Self::new(pool))
  }

  #[instrument(skip(self))]
  pub async fn ensure_schema(&self) -> Result<()> {
    sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
    info!("Database schema is in place.");
    Ok(())
  }

  /// Inserts the sample rows, leaving any existing row with the same id alone.
  #[instrument(skip_all)]
  pub async fn seed(&self, data: &SeedData) -> Result<()> {
    let mut tx = self.pool.begin().await?;
    for c in &data.categories {
      sqlx::query("INSERT INTO categories (id, name, slug, position) VALUES ($1, $2, $3, $4) ON CONFLICT (id) DO NOTHING")
        .bind(&c.id)
        .bind(&c.name)
        .bind(&c.slug)
        .bind(c.position)
        .execute(&mut *tx)
        .await?;
    }
    for b in &data.banners {
      sqlx::query(
        "INSERT INTO banners (id, title, image_url, link_url, is_active, position) \
         VALUES ($1, $2, $3, $4, $5, $6) ON CONFLICT (id) DO NOTHING",
      )
      .bind(&b.id)
      .bind(&b.title)
      .bind(&b.image_url)
      .bind(&b.link_url)
      .bind(b.is_active)
      .bind(b.position)
      .execute(&mut *tx)
      .await?;
    }
    for p in &data.products {
      sqlx::query(
        "INSERT INTO products (id, name, description, price, category_id, is_active, archived_at, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) ON CONFLICT (id) DO NOTHING",
      )
      .bind(&p.id)
      .bind(&p.name)
      .bind(&p.description)
      .bind(p.price)
      .bind(&p.category_id)
      .bind(p.is_active)
      .bind(p.archived_at)
      .bind(p.created_at)
      .execute(&mut *tx)
      .await?;
    }
    for o in &data.orders {
      sqlx::query(
        "INSERT INTO orders (id, product_id, status, amount, currency, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) ON CONFLICT (id) DO NOTHING",
      )
      .bind(&o.id)
      .bind(&o.product_id)
      .bind(o.status)
      .bind(o.amount)
      .bind(&o.currency)
      .bind(o.created_at)
      .bind(o.updated_at)
      .execute(&mut *tx)
      .await?;
    }
    tx.commit().await?;
    info!(
      categories = data.categories.len(),
      products = data.products.len(),
      orders = data.orders.len(),
      "Seed data applied."
    );
    Ok(())
  }
}

#[async_trait]
impl OrderStore for PgStore {
  #[instrument(skip(self, update), fields(key = %key, status = %update.status))]
  async fn update_orders(&self, key: &OrderKey, update: &OrderUpdate) -> Result<u64> {
    let sql = format!(
      "UPDATE orders SET \
         status = $1, \
         currency = $2, \
         provider_invoice_id = COALESCE(provider_invoice_id, $3), \
         provider_invoice_url = COALESCE($4, provider_invoice_url), \
         payment_channel = COALESCE($5, payment_channel), \
         payer_email = COALESCE($6, payer_email), \
         expires_at = COALESCE($7, expires_at), \
         paid_at = COALESCE(paid_at, $8), \
         updated_at = NOW() \
       WHERE {} = $9",
      key.column()
    );
    let result = sqlx::query(&sql)
      .bind(update.status)
      .bind(&update.currency)
      .bind(&update.provider_invoice_id)
      .bind(&update.provider_invoice_url)
      .bind(&update.payment_channel)
      .bind(&update.payer_email)
      .bind(update.expires_at)
      .bind(update.paid_at)
      .bind(key.value())
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected())
  }

  async fn product_ids(&self, key: &OrderKey, limit: usize) -> Result<Vec<String>> {
    let sql = format!(
      "SELECT product_id FROM orders WHERE {} = $1 AND product_id IS NOT NULL LIMIT $2",
      key.column()
    );
    let ids = sqlx::query_scalar::<_, String>(&sql)
      .bind(key.value())
      .bind(limit as i64)
      .fetch_all(&self.pool)
      .await?;
    Ok(ids)
  }

  async fn list_orders(&self, status: Option<OrderStatus>, page: PageRequest) -> Result<Page<Order>> {
    let orders = sqlx::query_as::<_, Order>(
      "SELECT * FROM orders WHERE ($1::order_status_enum IS NULL OR status = $1) \
       ORDER BY created_at DESC, id LIMIT $2 OFFSET $3",
    )
    .bind(status)
    .bind(i64::from(page.limit))
    .bind(page.offset() as i64)
    .fetch_all(&self.pool)
    .await?;
    let total = sqlx::query_scalar::<_, i64>(
      "SELECT COUNT(*) FROM orders WHERE ($1::order_status_enum IS NULL OR status = $1)",
    )
    .bind(status)
    .fetch_one(&self.pool)
    .await?;
    Ok(Page::new(orders, page, total))
  }

  async fn order_stats(&self) -> Result<OrderStats> {
    let rows = sqlx::query_as::<_, (OrderStatus, i64, i64)>(
      "SELECT status, COUNT(*)::BIGINT, COALESCE(SUM(amount), 0)::BIGINT FROM orders GROUP BY status",
    )
    .fetch_all(&self.pool)
    .await?;
    let mut stats = OrderStats::default();
    for (status, count, amount) in rows {
      stats.record(status, count, amount);
    }
    Ok(stats)
  }
}

#[async_trait]
impl CatalogStore for PgStore {
  #[instrument(skip(self), fields(items = ids.len()))]
  async fn archive_items(&self, ids: &[String], at: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query(
      "UPDATE products SET is_active = FALSE, archived_at = COALESCE(archived_at, $2) WHERE id = ANY($1)",
    )
    .bind(ids)
    .bind(at)
    .execute(&self.pool)
    .await?;
    Ok(result.rows_affected())
  }

  async fn list_products(&self, filter: &ProductFilter, page: PageRequest) -> Result<Page<Product>> {
    const WHERE: &str = "WHERE ($1 = FALSE OR (is_active AND archived_at IS NULL)) \
                         AND ($2::TEXT IS NULL OR category_id = $2)";
    let products = sqlx::query_as::<_, Product>(&format!(
      "SELECT * FROM products {} ORDER BY name, id LIMIT $3 OFFSET $4",
      WHERE
    ))
    .bind(filter.listed_only)
    .bind(&filter.category_id)
    .bind(i64::from(page.limit))
    .bind(page.offset() as i64)
    .fetch_all(&self.pool)
    .await?;
    let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM products {}", WHERE))
      .bind(filter.listed_only)
      .bind(&filter.category_id)
      .fetch_one(&self.pool)
      .await?;
    Ok(Page::new(products, page, total))
  }

  async fn feed(&self, limit: u32) -> Result<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
      "SELECT * FROM products WHERE is_active AND archived_at IS NULL ORDER BY created_at DESC, id LIMIT $1",
    )
    .bind(i64::from(limit))
    .fetch_all(&self.pool)
    .await?;
    Ok(products)
  }

  async fn list_categories(&self) -> Result<Vec<Category>> {
    let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY position, id")
      .fetch_all(&self.pool)
      .await?;
    Ok(categories)
  }

  async fn list_banners(&self) -> Result<Vec<Banner>> {
    let banners = sqlx::query_as::<_, Banner>("SELECT * FROM banners WHERE is_active ORDER BY position, id")
      .fetch_all(&self.pool)
      .await?;
    Ok(banners)
  }

  async fn product_counts(&self) -> Result<ProductCounts> {
    let (active, total) = sqlx::query_as::<_, (i64, i64)>(
      "SELECT COUNT(*) FILTER (WHERE is_active AND archived_at IS NULL), COUNT(*) FROM products",
    )
    .fetch_one(&self.pool)
    .await?;
    Ok(ProductCounts {
      active,
      archived: total - active,
      total,
    })
  }
}
