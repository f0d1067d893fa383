//! Export the food log as JSON.
//!
//! The document mirrors the `food_entries` table with `occurred_at` rendered
//! as RFC 3339, most recent entry first:
//!
//! ```json
//! { "entries": [ { "id": 3, "occurred_at": "2024-06-01T12:00:00.000Z",
//!   "meal_category": "lunch", "food_name": "Salad", "calories": 150.0,
//!   "protein": 5.0, "carbs": 10.0, "fat": 10.0 } ] }
//! ```

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use serde::Serialize;
use std::path::Path;

use nutrilog_core::store::Store;
use nutrilog_core::FoodEntry;

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

#[derive(Serialize)]
struct ExportData {
    entries: Vec<ExportEntry>,
}

#[derive(Debug, Serialize, PartialEq)]
struct ExportEntry {
    id: i64,
    occurred_at: String,
    meal_category: &'static str,
    food_name: String,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
}

impl From<&FoodEntry> for ExportEntry {
    fn from(entry: &FoodEntry) -> Self {
        Self {
            id: entry.id,
            occurred_at: entry
                .occurred_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            meal_category: entry.meal_category.as_str(),
            food_name: entry.food_name.clone(),
            calories: entry.facts.calories,
            protein: entry.facts.protein,
            carbs: entry.facts.carbs,
            fat: entry.facts.fat,
        }
    }
}

/// Render `entries` as the pretty-printed export document.
pub fn to_json(entries: &[FoodEntry]) -> Result<String> {
    let data = ExportData {
        entries: entries.iter().map(ExportEntry::from).collect(),
    };
    Ok(serde_json::to_string_pretty(&data)?)
}

/// Export every entry.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub async fn run_export(config: &Config, output: Option<&Path>) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let entries = store.all_entries().await;
    store.close().await;
    let entries = entries?;

    let json = to_json(&entries)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Exported {} entries to {}", entries.len(), path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}
