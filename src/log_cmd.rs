//! The log pipeline: free text in, stored entries out.
//!
//! Extraction always finishes before the first write, so an extractor
//! failure leaves the store untouched. Candidates are validated as a batch
//! before any of them is appended.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use nutrilog_core::extract::NutritionExtractor;
use nutrilog_core::store::Store;
use nutrilog_core::{FoodEntry, MealCategory};

use crate::args;
use crate::config::Config;
use crate::extractor::create_extractor;
use crate::sqlite_store::SqliteStore;

/// Extract candidates from `text` and turn them into unassigned entries.
///
/// `meal_override` replaces whatever category the extractor chose. Blank
/// text yields no entries without consulting the extractor.
pub async fn preview(
    extractor: &dyn NutritionExtractor,
    text: &str,
    at: DateTime<Utc>,
    meal_override: Option<MealCategory>,
) -> nutrilog_core::Result<Vec<FoodEntry>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let candidates = extractor.extract(text).await?;
    tracing::debug!(
        extractor = extractor.name(),
        count = candidates.len(),
        "extraction finished"
    );

    let entries: Vec<FoodEntry> = candidates
        .into_iter()
        .map(|candidate| {
            let mut entry = candidate.into_entry(at);
            if let Some(meal) = meal_override {
                entry.meal_category = meal;
            }
            entry
        })
        .collect();

    for entry in &entries {
        entry.validate()?;
    }
    Ok(entries)
}

/// Run [`preview`] and append every resulting entry, returning them with
/// their assigned ids. An empty result means nothing was recognised.
pub async fn log_text(
    store: &dyn Store,
    extractor: &dyn NutritionExtractor,
    text: &str,
    at: DateTime<Utc>,
    meal_override: Option<MealCategory>,
) -> nutrilog_core::Result<Vec<FoodEntry>> {
    let entries = preview(extractor, text, at, meal_override).await?;

    let mut stored = Vec::with_capacity(entries.len());
    for entry in entries {
        let id = store.append(&entry).await?;
        stored.push(entry.with_id(id));
    }
    Ok(stored)
}

/// CLI entry point for `nutrilog log`.
pub async fn run_log(
    config: &Config,
    text: &str,
    at: Option<String>,
    meal: Option<String>,
    dry_run: bool,
) -> Result<()> {
    let at = match at {
        Some(s) => args::parse_timestamp(&s)?,
        None => Utc::now(),
    };
    let meal = meal.as_deref().map(MealCategory::from_tag);
    let extractor = create_extractor(&config.extractor)?;

    if dry_run {
        let entries = preview(extractor.as_ref(), text, at, meal)
            .await
            .context("extraction failed")?;
        println!("Dry run: {} item(s) would be logged", entries.len());
        print_entries(&entries);
        return Ok(());
    }

    let store = SqliteStore::open(config).await?;
    let result = log_text(&store, extractor.as_ref(), text, at, meal).await;
    store.close().await;
    let entries = result.context("logging failed")?;

    if entries.is_empty() {
        println!("Nothing recognised in \"{}\". No entries logged.", text.trim());
        return Ok(());
    }
    println!("Logged {} item(s):", entries.len());
    print_entries(&entries);
    Ok(())
}

fn print_entries(entries: &[FoodEntry]) {
    for entry in entries {
        println!(
            "  #{:<4} {:<10} {:<24} {:>7.1} kcal  P {:.1}g  C {:.1}g  F {:.1}g",
            entry.id,
            entry.meal_category.as_str(),
            entry.food_name,
            entry.facts.calories,
            entry.facts.protein,
            entry.facts.carbs,
            entry.facts.fat,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use nutrilog_core::extract::{KeywordExtractor, TaggedNumberExtractor};
    use nutrilog_core::store::memory::InMemoryStore;
    use nutrilog_core::{Error, ExtractedFood};

    struct Offline;

    #[async_trait]
    impl NutritionExtractor for Offline {
        fn name(&self) -> &str {
            "offline"
        }

        async fn extract(&self, _text: &str) -> nutrilog_core::Result<Vec<ExtractedFood>> {
            Err(Error::ExtractorUnavailable("no network".into()))
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_log_text_appends_each_candidate() {
        let store = InMemoryStore::new();
        let extractor = KeywordExtractor::at_hour(8);
        let entries = log_text(&store, &extractor, "eggs and toast", noon(), None)
            .await
            .unwrap();

        let names: Vec<&str> = entries.iter().map(|e| e.food_name.as_str()).collect();
        assert_eq!(names, vec!["Egg", "Eggs", "Toast"]);
        assert!(entries.iter().all(|e| e.id > 0));
        assert_eq!(store.all_entries().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_meal_override() {
        let store = InMemoryStore::new();
        let entries = log_text(
            &store,
            &TaggedNumberExtractor::new(),
            "shake 200 calories",
            noon(),
            Some(MealCategory::Dinner),
        )
        .await
        .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].meal_category, MealCategory::Dinner);
    }

    #[tokio::test]
    async fn test_extractor_failure_writes_nothing() {
        let store = InMemoryStore::new();
        let err = log_text(&store, &Offline, "a sandwich", noon(), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "extractor_unavailable");
        assert!(store.all_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_nothing_recognised() {
        let store = InMemoryStore::new();
        let extractor = KeywordExtractor::at_hour(8);
        let entries = log_text(&store, &extractor, "a glass of water", noon(), None)
            .await
            .unwrap();
        assert!(entries.is_empty());
        assert!(store.all_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_text_logs_nothing() {
        let store = InMemoryStore::new();
        for text in ["", "   ", "\t\n"] {
            let entries = log_text(&store, &TaggedNumberExtractor::new(), text, noon(), None)
                .await
                .unwrap();
            assert!(entries.is_empty());
        }
        let entries = log_text(&store, &Offline, "  ", noon(), None).await.unwrap();
        assert!(entries.is_empty());
        assert!(store.all_entries().await.unwrap().is_empty());
    }
}
