//! Aggregation engine: pure reductions over a borrowed slice of entries.
//!
//! Nothing here touches a store. Callers fetch entries (usually with
//! `Store::entries_in_range`) and hand the slice over.
//!
//! Periods are rolling windows ending at `now`: a week is
//! `[now - 7 days, now)` and a month is `[now - 30 days, now)`.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::calendar;
use crate::models::{FoodEntry, MealCategory, NutritionFacts};

/// Summed nutrition for one calendar day. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl DailyStat {
    pub fn facts(&self) -> NutritionFacts {
        NutritionFacts {
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
        }
    }
}

/// Selects one nutrition field of a [`DailyStat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NutrientField {
    Calories,
    Protein,
    Carbs,
    Fat,
}

impl NutrientField {
    pub const ALL: [NutrientField; 4] = [Self::Calories, Self::Protein, Self::Carbs, Self::Fat];

    pub fn of(&self, stat: &DailyStat) -> f64 {
        match self {
            Self::Calories => stat.calories,
            Self::Protein => stat.protein,
            Self::Carbs => stat.carbs,
            Self::Fat => stat.fat,
        }
    }
}

/// Rolling history window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Week,
    Month,
}

impl Period {
    pub fn days(&self) -> i64 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
        }
    }

    /// `[now - days, now)`.
    pub fn window(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (now - Duration::days(self.days()), now)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

/// Group entries by local calendar day and sum each field.
///
/// Input order does not matter. Output is sorted most recent day first.
pub fn daily_stats(entries: &[FoodEntry]) -> Vec<DailyStat> {
    daily_stats_in(entries, &Local)
}

/// [`daily_stats`] with days taken in an explicit zone.
pub fn daily_stats_in<Tz: TimeZone>(entries: &[FoodEntry], tz: &Tz) -> Vec<DailyStat> {
    let mut by_day: BTreeMap<NaiveDate, NutritionFacts> = BTreeMap::new();
    for entry in entries {
        *by_day
            .entry(calendar::day_of_in(&entry.occurred_at, tz))
            .or_default() += entry.facts;
    }
    by_day
        .into_iter()
        .rev()
        .map(|(date, facts)| DailyStat {
            date,
            calories: facts.calories,
            protein: facts.protein,
            carbs: facts.carbs,
            fat: facts.fat,
        })
        .collect()
}

/// Arithmetic mean of `field` across `stats`; `0.0` for an empty slice.
pub fn average(stats: &[DailyStat], field: NutrientField) -> f64 {
    if stats.is_empty() {
        return 0.0;
    }
    stats.iter().map(|s| field.of(s)).sum::<f64>() / stats.len() as f64
}

/// Field-wise sum of `entries`.
pub fn totals(entries: &[FoodEntry]) -> NutritionFacts {
    entries.iter().map(|e| e.facts).sum()
}

/// Entries split by meal, in breakfast, lunch, dinner, snack order. All
/// four categories are present even when empty.
pub fn by_meal(entries: &[FoodEntry]) -> Vec<(MealCategory, Vec<&FoodEntry>)> {
    MealCategory::ALL
        .into_iter()
        .map(|category| {
            let group = entries
                .iter()
                .filter(|e| e.meal_category == category)
                .collect();
            (category, group)
        })
        .collect()
}

/// Daily breakdown plus per-day averages for one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub days: Vec<DailyStat>,
    pub average: NutritionFacts,
}

/// Summarise the entries of `period` ending at `now`. Entries outside the
/// window are ignored, so callers may pass a wider slice.
pub fn summarize(entries: &[FoodEntry], period: Period, now: DateTime<Utc>) -> PeriodSummary {
    let (start, end) = period.window(now);
    let in_window: Vec<FoodEntry> = entries
        .iter()
        .filter(|e| e.occurred_at >= start && e.occurred_at < end)
        .cloned()
        .collect();
    let days = daily_stats(&in_window);
    let averages = NutritionFacts {
        calories: average(&days, NutrientField::Calories),
        protein: average(&days, NutrientField::Protein),
        carbs: average(&days, NutrientField::Carbs),
        fat: average(&days, NutrientField::Fat),
    };
    PeriodSummary {
        start,
        end,
        days,
        average: averages,
    }
}
