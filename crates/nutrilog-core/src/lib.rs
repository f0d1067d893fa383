//! # nutrilog core
//!
//! Runtime-agnostic logic for the nutrilog food diary: nutrition value
//! types, the error taxonomy, the [`store::Store`] abstraction, the
//! [`extract::NutritionExtractor`] strategies that need no network, and
//! the aggregation engine.
//!
//! This crate contains no tokio, sqlx, or HTTP dependencies. The SQLite
//! store and the remote extractor live in the `nutrilog` app crate.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | `NutritionFacts`, `MealCategory`, `FoodEntry`, `ExtractedFood` |
//! | [`error`] | Engine error kinds shared by stores and extractors |
//! | [`calendar`] | Local-day boundaries and epoch-millisecond conversions |
//! | [`store`] | `Store` trait and the in-memory implementation |
//! | [`extract`] | `NutritionExtractor` trait, tagged-number and keyword strategies |
//! | [`aggregate`] | Daily stats, averages, totals, and period summaries |

pub mod aggregate;
pub mod calendar;
pub mod error;
pub mod extract;
pub mod models;
pub mod store;

pub use error::{Error, Result};
pub use models::{ExtractedFood, FoodEntry, MealCategory, NutritionFacts};
