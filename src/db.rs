// gemstore/src/db.rs

//! Database bootstrap: connection pool, migrations, and optional demo seeding.

use crate::errors::{AppError, Result};
use crate::models::gem::DiscountType;
use sqlx::PgPool;
use tracing::info;

pub async fn connect(database_url: &str) -> Result<PgPool> {
  let pool = PgPool::connect(database_url).await?;
  info!("Successfully connected to the database.");
  Ok(pool)
}

/// Applies pending migrations from the embedded `migrations/` directory.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
  sqlx::migrate!("./migrations")
    .run(pool)
    .await
    .map_err(|e| AppError::Internal(format!("Database migration failed: {}", e)))?;
  info!("Database migrations applied.");
  Ok(())
}

/// Inserts a handful of demo gems so a fresh instance has something to sell.
/// No-op when the catalog already has rows.
pub async fn seed_demo_catalog(pool: &PgPool) -> Result<()> {
  let has_gems: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM gems)")
    .fetch_one(pool)
    .await?;
  if has_gems {
    info!("Catalog already populated; skipping demo seed.");
    return Ok(());
  }

  let demo_gems: &[(&str, &str, i64, i64, DiscountType, i32, &str)] = &[
    ("Burmese Ruby", "ruby", 250_000, 10, DiscountType::Percentage, 5, "Myanmar"),
    ("Kashmir Blue Sapphire", "sapphire", 480_000, 0, DiscountType::Fixed, 3, "India"),
    ("Colombian Emerald", "emerald", 320_000, 25_000, DiscountType::Fixed, 8, "Colombia"),
    ("Ceylon Yellow Sapphire", "sapphire", 95_000, 5, DiscountType::Percentage, 12, "Sri Lanka"),
    ("Basra Pearl", "pearl", 60_000, 0, DiscountType::Fixed, 20, "Persian Gulf"),
  ];

  for (name, category, price_cents, discount_value, discount_type, stock, origin) in demo_gems {
    sqlx::query(
      "INSERT INTO gems (name, category, price_cents, discount_value, discount_type, stock_quantity, is_available, origin)
       VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7)",
    )
    .bind(name)
    .bind(category)
    .bind(price_cents)
    .bind(discount_value)
    .bind(discount_type)
    .bind(stock)
    .bind(origin)
    .execute(pool)
    .await?;
  }

  info!("Seeded {} demo gems.", demo_gems.len());
  Ok(())
}
