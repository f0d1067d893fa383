//! In-memory [`Store`] implementation for tests and embedding.
//!
//! Entries and the id counter sit behind one `std::sync::RwLock`, so id
//! assignment and every mutation happen under the same exclusive guard.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::calendar;
use crate::error::{Error, Result};
use crate::models::FoodEntry;

use super::Store;

struct Inner {
    entries: BTreeMap<i64, FoodEntry>,
    last_id: i64,
}

/// Volatile store with the same contract as the SQLite store.
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: BTreeMap::new(),
                last_id: 0,
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(|_| poisoned())
    }

    fn collect_where<F>(&self, keep: F) -> Result<Vec<FoodEntry>>
    where
        F: Fn(&FoodEntry) -> bool,
    {
        let inner = self.read()?;
        Ok(inner
            .entries
            .values()
            .filter(|e| keep(e))
            .cloned()
            .collect())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> Error {
    Error::StorageUnavailable {
        message: "in-memory store lock poisoned".to_string(),
        source: None,
    }
}

fn most_recent_first(entries: &mut [FoodEntry]) {
    entries.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at).then(b.id.cmp(&a.id)));
}

#[async_trait]
impl Store for InMemoryStore {
    async fn append(&self, entry: &FoodEntry) -> Result<i64> {
        entry.validate()?;
        let mut inner = self.write()?;
        inner.last_id += 1;
        let id = inner.last_id;
        inner.entries.insert(id, entry.clone().with_id(id));
        tracing::info!(id, food = %entry.food_name, "appended food entry");
        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Option<FoodEntry>> {
        Ok(self.read()?.entries.get(&id).cloned())
    }

    async fn entries_for_day(&self, date: NaiveDate) -> Result<Vec<FoodEntry>> {
        let (start, end) = calendar::day_bounds(date);
        let mut entries = self.collect_where(|e| e.occurred_at >= start && e.occurred_at < end)?;
        entries.sort_by(|a, b| a.occurred_at.cmp(&b.occurred_at).then(a.id.cmp(&b.id)));
        Ok(entries)
    }

    async fn entries_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<FoodEntry>> {
        let mut entries = self.collect_where(|e| e.occurred_at >= start && e.occurred_at < end)?;
        most_recent_first(&mut entries);
        Ok(entries)
    }

    async fn all_entries(&self) -> Result<Vec<FoodEntry>> {
        let mut entries = self.collect_where(|_| true)?;
        most_recent_first(&mut entries);
        Ok(entries)
    }

    async fn update(&self, entry: &FoodEntry) -> Result<()> {
        entry.validate()?;
        let mut inner = self.write()?;
        match inner.entries.get_mut(&entry.id) {
            Some(slot) => {
                *slot = entry.clone();
                tracing::info!(id = entry.id, "updated food entry");
                Ok(())
            }
            None => Err(Error::NotFound(entry.id)),
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        if self.write()?.entries.remove(&id).is_some() {
            tracing::info!(id, "deleted food entry");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MealCategory, NutritionFacts};
    use chrono::{Duration, Local, TimeZone};

    fn local_noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(y, m, d, 12, 0, 0)
            .earliest()
            .unwrap()
            .with_timezone(&Utc)
    }

    fn entry(name: &str, at: DateTime<Utc>, calories: f64) -> FoodEntry {
        FoodEntry::new(
            at,
            MealCategory::Lunch,
            name,
            NutritionFacts::new(calories, 1.0, 2.0, 3.0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_append_assigns_increasing_ids() {
        let store = InMemoryStore::new();
        let at = local_noon(2024, 5, 1);
        let a = store.append(&entry("Apple", at, 95.0)).await.unwrap();
        let b = store.append(&entry("Toast", at, 80.0)).await.unwrap();
        assert!(b > a);
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let store = InMemoryStore::new();
        let at = local_noon(2024, 5, 1);
        let a = store.append(&entry("Apple", at, 95.0)).await.unwrap();
        store.delete(a).await.unwrap();
        let b = store.append(&entry("Toast", at, 80.0)).await.unwrap();
        assert!(b > a);
    }

    #[tokio::test]
    async fn test_append_rejects_invalid_entry() {
        let store = InMemoryStore::new();
        let mut bad = entry("Apple", local_noon(2024, 5, 1), 95.0);
        bad.facts.fat = -2.0;
        let err = store.append(&bad).await.unwrap_err();
        assert_eq!(err.kind(), "constraint_violation");
        assert!(store.all_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_entries_for_day_round_trip() {
        let store = InMemoryStore::new();
        let at = local_noon(2024, 5, 1);
        let original = entry("Apple", at, 95.0);
        let id = store.append(&original).await.unwrap();
        store
            .append(&entry("Tomorrow", at + Duration::days(1), 10.0))
            .await
            .unwrap();

        let day = store
            .entries_for_day(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
            .await
            .unwrap();
        assert_eq!(day, vec![original.with_id(id)]);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = InMemoryStore::new();
        let ghost = entry("Ghost", local_noon(2024, 5, 1), 1.0).with_id(42);
        let err = store.update(&ghost).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(42)));
    }

    #[tokio::test]
    async fn test_update_replaces_wholesale() {
        let store = InMemoryStore::new();
        let at = local_noon(2024, 5, 1);
        let id = store.append(&entry("Apple", at, 95.0)).await.unwrap();
        let replacement = entry("Pear", at, 60.0).with_id(id);
        store.update(&replacement).await.unwrap();
        assert_eq!(store.get(id).await.unwrap(), Some(replacement));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = InMemoryStore::new();
        let id = store
            .append(&entry("Apple", local_noon(2024, 5, 1), 95.0))
            .await
            .unwrap();
        store.delete(id).await.unwrap();
        let after_once = store.all_entries().await.unwrap();
        store.delete(id).await.unwrap();
        assert_eq!(store.all_entries().await.unwrap(), after_once);
        store.delete(9999).await.unwrap();
    }

    #[tokio::test]
    async fn test_range_is_most_recent_first() {
        let store = InMemoryStore::new();
        let d1 = local_noon(2024, 5, 1);
        let d2 = local_noon(2024, 5, 2);
        let d3 = local_noon(2024, 5, 3);
        for (name, at) in [("Middle", d2), ("Oldest", d1), ("Newest", d3)] {
            store.append(&entry(name, at, 10.0)).await.unwrap();
        }
        let names: Vec<String> = store
            .entries_in_range(d1, d3 + Duration::hours(1))
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.food_name)
            .collect();
        assert_eq!(names, vec!["Newest", "Middle", "Oldest"]);
    }

    #[tokio::test]
    async fn test_range_end_is_exclusive() {
        let store = InMemoryStore::new();
        let at = local_noon(2024, 5, 1);
        store.append(&entry("Edge", at, 10.0)).await.unwrap();
        assert!(store.entries_in_range(at - Duration::hours(1), at).await.unwrap().is_empty());
        assert_eq!(store.entries_in_range(at, at + Duration::seconds(1)).await.unwrap().len(), 1);
    }
}
