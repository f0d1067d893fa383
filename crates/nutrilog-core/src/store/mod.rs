//! Storage abstraction for the food log.
//!
//! The [`Store`] trait is the canonical owner of logged entries. The
//! in-memory store lives here; the SQLite store lives in the app crate.
//! Implementations must be `Send + Sync` and must serialise mutations so
//! no read observes a half-applied write.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::Result;
use crate::models::FoodEntry;

/// Durable, queryable collection of food entries.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`append`](Store::append) | Validate and insert an unassigned entry, returning its new id |
/// | [`get`](Store::get) | Look up one entry by id |
/// | [`entries_for_day`](Store::entries_for_day) | Entries on one local calendar day |
/// | [`entries_in_range`](Store::entries_in_range) | Entries in `[start, end)`, most recent first |
/// | [`all_entries`](Store::all_entries) | Every entry, most recent first |
/// | [`update`](Store::update) | Replace an existing entry wholesale |
/// | [`delete`](Store::delete) | Remove an entry; missing ids are a no-op |
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert `entry`, ignoring its `id`, and return the freshly assigned id.
    ///
    /// Ids increase strictly with call order and are never reused, even
    /// after deletes. Fails with `ConstraintViolation` before any write if
    /// the entry is invalid.
    async fn append(&self, entry: &FoodEntry) -> Result<i64>;

    async fn get(&self, id: i64) -> Result<Option<FoodEntry>>;

    /// Entries whose `occurred_at` lies on `date` in the local zone,
    /// oldest first (ties broken by id).
    async fn entries_for_day(&self, date: NaiveDate) -> Result<Vec<FoodEntry>>;

    /// Entries with `occurred_at` in `[start, end)`, most recent first
    /// (ties broken by descending id).
    async fn entries_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<FoodEntry>>;

    async fn all_entries(&self) -> Result<Vec<FoodEntry>>;

    /// Replace the entry sharing `entry.id`. Fails with `NotFound` when no
    /// such entry exists and with `ConstraintViolation` when `entry` is invalid.
    async fn update(&self, entry: &FoodEntry) -> Result<()>;

    /// Remove the entry with `id` if present. Idempotent.
    async fn delete(&self, id: i64) -> Result<()>;
}
