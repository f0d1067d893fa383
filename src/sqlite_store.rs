//! SQLite-backed [`Store`] implementation.
//!
//! Every mutation runs under one write gate, so appends, updates, and
//! deletes are serialised against each other. Reads go straight to the WAL
//! pool and only see committed statements. Storage failures surface as
//! `StorageUnavailable` and are never retried here.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;

use nutrilog_core::calendar;
use nutrilog_core::store::Store;
use nutrilog_core::{Error, FoodEntry, MealCategory, NutritionFacts, Result};

use crate::config::Config;
use crate::db;
use crate::migrate;

const SELECT_COLUMNS: &str =
    "SELECT id, occurred_at, meal_category, food_name, calories, protein, carbs, fat FROM food_entries";

/// SQLite implementation of the [`Store`] trait over the `food_entries` table.
pub struct SqliteStore {
    pool: SqlitePool,
    write_gate: Mutex<()>,
}

impl SqliteStore {
    /// Wrap an already-migrated pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_gate: Mutex::new(()),
        }
    }

    /// Connect to the configured database and make sure the schema exists.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await.map_err(|e| {
            tracing::warn!(path = %config.db.path.display(), error = %e, "cannot open food log");
            Error::storage(
                format!("cannot open database at {}", config.db.path.display()),
                e,
            )
        })?;
        migrate::apply_schema(&pool).await.map_err(storage_err)?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn fetch(&self, sql: &str, binds: &[i64]) -> Result<Vec<FoodEntry>> {
        let mut query = sqlx::query(sql);
        for value in binds {
            query = query.bind(*value);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(storage_err)?;
        rows.iter().map(row_to_entry).collect()
    }
}

fn storage_err(e: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_check_violation() {
            return Error::ConstraintViolation(db_err.message().to_string());
        }
    }
    Error::storage("sqlite operation failed", e)
}

fn row_to_entry(row: &SqliteRow) -> Result<FoodEntry> {
    let id: i64 = row.try_get("id").map_err(storage_err)?;
    let occurred_ms: i64 = row.try_get("occurred_at").map_err(storage_err)?;
    let occurred_at = calendar::from_millis(occurred_ms).ok_or_else(|| Error::StorageUnavailable {
        message: format!("entry {} has an out-of-range timestamp {}", id, occurred_ms),
        source: None,
    })?;
    let meal: String = row.try_get("meal_category").map_err(storage_err)?;

    Ok(FoodEntry {
        id,
        occurred_at,
        meal_category: MealCategory::from_tag(&meal),
        food_name: row.try_get("food_name").map_err(storage_err)?,
        facts: NutritionFacts {
            calories: row.try_get("calories").map_err(storage_err)?,
            protein: row.try_get("protein").map_err(storage_err)?,
            carbs: row.try_get("carbs").map_err(storage_err)?,
            fat: row.try_get("fat").map_err(storage_err)?,
        },
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn append(&self, entry: &FoodEntry) -> Result<i64> {
        entry.validate()?;
        let _guard = self.write_gate.lock().await;

        let result = sqlx::query(
            r#"
            INSERT INTO food_entries (occurred_at, meal_category, food_name,
                                      calories, protein, carbs, fat)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(calendar::to_millis(&entry.occurred_at))
        .bind(entry.meal_category.as_str())
        .bind(&entry.food_name)
        .bind(entry.facts.calories)
        .bind(entry.facts.protein)
        .bind(entry.facts.carbs)
        .bind(entry.facts.fat)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        let id = result.last_insert_rowid();
        tracing::info!(id, food = %entry.food_name, "appended food entry");
        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Option<FoodEntry>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;
        row.as_ref().map(row_to_entry).transpose()
    }

    async fn entries_for_day(&self, date: NaiveDate) -> Result<Vec<FoodEntry>> {
        let (start, end) = calendar::day_bounds(date);
        tracing::debug!(%date, "querying day");
        self.fetch(
            &format!(
                "{} WHERE occurred_at >= ? AND occurred_at < ? ORDER BY occurred_at ASC, id ASC",
                SELECT_COLUMNS
            ),
            &[calendar::to_millis(&start), calendar::to_millis(&end)],
        )
        .await
    }

    async fn entries_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<FoodEntry>> {
        tracing::debug!(%start, %end, "querying range");
        self.fetch(
            &format!(
                "{} WHERE occurred_at >= ? AND occurred_at < ? ORDER BY occurred_at DESC, id DESC",
                SELECT_COLUMNS
            ),
            &[calendar::to_millis(&start), calendar::to_millis(&end)],
        )
        .await
    }

    async fn all_entries(&self) -> Result<Vec<FoodEntry>> {
        self.fetch(
            &format!("{} ORDER BY occurred_at DESC, id DESC", SELECT_COLUMNS),
            &[],
        )
        .await
    }

    async fn update(&self, entry: &FoodEntry) -> Result<()> {
        entry.validate()?;
        let _guard = self.write_gate.lock().await;

        let result = sqlx::query(
            r#"
            UPDATE food_entries
            SET occurred_at = ?, meal_category = ?, food_name = ?,
                calories = ?, protein = ?, carbs = ?, fat = ?
            WHERE id = ?
            "#,
        )
        .bind(calendar::to_millis(&entry.occurred_at))
        .bind(entry.meal_category.as_str())
        .bind(&entry.food_name)
        .bind(entry.facts.calories)
        .bind(entry.facts.protein)
        .bind(entry.facts.carbs)
        .bind(entry.facts.fat)
        .bind(entry.id)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(entry.id));
        }
        tracing::info!(id = entry.id, "updated food entry");
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let _guard = self.write_gate.lock().await;
        let result = sqlx::query("DELETE FROM food_entries WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        if result.rows_affected() > 0 {
            tracing::info!(id, "deleted food entry");
        }
        Ok(())
    }
}
