//! Schema migrations. Every statement is idempotent.
//!
//! `food_entries` is the durable contract exports and backups rely on:
//! `id`, `occurred_at` (Unix epoch milliseconds), `meal_category`
//! (`breakfast|lunch|dinner|snack`), `food_name`, and the four facts.
//! `AUTOINCREMENT` keeps ids from being reused after deletes.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Create the database file and apply the schema.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

pub async fn apply_schema(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS food_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            occurred_at INTEGER NOT NULL,
            meal_category TEXT NOT NULL,
            food_name TEXT NOT NULL CHECK (length(trim(food_name)) > 0),
            calories REAL NOT NULL CHECK (calories >= 0),
            protein REAL NOT NULL CHECK (protein >= 0),
            carbs REAL NOT NULL CHECK (carbs >= 0),
            fat REAL NOT NULL CHECK (fat >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_food_entries_occurred_at ON food_entries(occurred_at DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
