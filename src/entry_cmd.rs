//! `nutrilog edit` and `nutrilog delete`.
//!
//! Edits read the stored entry, replace the requested fields, and write the
//! whole entry back with `Store::update`.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};

use nutrilog_core::calendar;
use nutrilog_core::store::Store;
use nutrilog_core::{Error, FoodEntry, MealCategory};

use crate::args;
use crate::config::Config;
use crate::sqlite_store::SqliteStore;

/// Field replacements for one entry. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct EntryEdit {
    pub food_name: Option<String>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub meal_category: Option<MealCategory>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl EntryEdit {
    pub fn is_empty(&self) -> bool {
        self.food_name.is_none()
            && self.calories.is_none()
            && self.protein.is_none()
            && self.carbs.is_none()
            && self.fat.is_none()
            && self.meal_category.is_none()
            && self.occurred_at.is_none()
    }

    pub fn apply(&self, mut entry: FoodEntry) -> FoodEntry {
        if let Some(name) = &self.food_name {
            entry.food_name = name.trim().to_string();
        }
        if let Some(v) = self.calories {
            entry.facts.calories = v;
        }
        if let Some(v) = self.protein {
            entry.facts.protein = v;
        }
        if let Some(v) = self.carbs {
            entry.facts.carbs = v;
        }
        if let Some(v) = self.fat {
            entry.facts.fat = v;
        }
        if let Some(meal) = self.meal_category {
            entry.meal_category = meal;
        }
        if let Some(at) = self.occurred_at {
            entry.occurred_at = calendar::truncate_to_millis(at);
        }
        entry
    }
}

/// Apply `edit` to entry `id` and persist it. Returns the stored entry.
pub async fn edit_entry(store: &dyn Store, id: i64, edit: &EntryEdit) -> nutrilog_core::Result<FoodEntry> {
    let current = store.get(id).await?.ok_or(Error::NotFound(id))?;
    let updated = edit.apply(current);
    store.update(&updated).await?;
    Ok(updated)
}

pub struct EditArgs {
    pub name: Option<String>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub meal: Option<String>,
    pub at: Option<String>,
}

pub async fn run_edit(config: &Config, id: i64, raw: EditArgs) -> Result<()> {
    let edit = EntryEdit {
        food_name: raw.name,
        calories: raw.calories,
        protein: raw.protein,
        carbs: raw.carbs,
        fat: raw.fat,
        meal_category: raw.meal.as_deref().map(MealCategory::from_tag),
        occurred_at: raw.at.as_deref().map(args::parse_timestamp).transpose()?,
    };
    if edit.is_empty() {
        bail!("Nothing to change. Pass at least one of --name, --calories, --protein, --carbs, --fat, --meal, --at.");
    }

    let store = SqliteStore::open(config).await?;
    let result = edit_entry(&store, id, &edit).await;
    store.close().await;
    let entry = result?;

    println!(
        "Updated #{}: {} ({}) {:.1} kcal, protein {:.1}g, carbs {:.1}g, fat {:.1}g",
        entry.id,
        entry.food_name,
        entry.meal_category,
        entry.facts.calories,
        entry.facts.protein,
        entry.facts.carbs,
        entry.facts.fat
    );
    Ok(())
}

pub async fn run_delete(config: &Config, id: i64) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let result = store.delete(id).await;
    store.close().await;
    result?;

    println!("Deleted #{}.", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use nutrilog_core::store::memory::InMemoryStore;
    use nutrilog_core::NutritionFacts;

    fn salad() -> FoodEntry {
        FoodEntry::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            MealCategory::Lunch,
            "Salad",
            NutritionFacts::new(150.0, 5.0, 10.0, 10.0).unwrap(),
        )
    }

    #[test]
    fn test_empty_edit() {
        assert!(EntryEdit::default().is_empty());
        let edit = EntryEdit {
            fat: Some(1.0),
            ..Default::default()
        };
        assert!(!edit.is_empty());
    }

    #[tokio::test]
    async fn test_edit_replaces_only_given_fields() {
        let store = InMemoryStore::new();
        let id = store.append(&salad()).await.unwrap();

        let edit = EntryEdit {
            calories: Some(180.0),
            meal_category: Some(MealCategory::Dinner),
            ..Default::default()
        };
        let updated = edit_entry(&store, id, &edit).await.unwrap();
        assert_eq!(updated.facts.calories, 180.0);
        assert_eq!(updated.facts.protein, 5.0);
        assert_eq!(updated.meal_category, MealCategory::Dinner);
        assert_eq!(store.get(id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_edit_missing_entry() {
        let store = InMemoryStore::new();
        let err = edit_entry(&store, 42, &EntryEdit::default()).await.unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn test_edit_rejects_negative_value() {
        let store = InMemoryStore::new();
        let id = store.append(&salad()).await.unwrap();
        let edit = EntryEdit {
            protein: Some(-1.0),
            ..Default::default()
        };
        let err = edit_entry(&store, id, &edit).await.unwrap_err();
        assert_eq!(err.kind(), "constraint_violation");
        assert_eq!(store.get(id).await.unwrap().unwrap().facts.protein, 5.0);
    }
}
