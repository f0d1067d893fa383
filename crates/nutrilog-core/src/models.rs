//! Nutrition value types shared by every component.
//!
//! [`FoodEntry`] is the persisted entity; [`ExtractedFood`] is what an
//! extractor hands back before anything is stored.

use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::error::{Error, Result};

/// Id carried by an entry the store has not assigned yet.
pub const UNASSIGNED_ID: i64 = 0;

/// Calories and macro grams for one food item or a sum of items.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NutritionFacts {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl NutritionFacts {
    /// Build validated facts. Fails with `ConstraintViolation` on any
    /// negative or non-finite value.
    pub fn new(calories: f64, protein: f64, carbs: f64, fat: f64) -> Result<Self> {
        let facts = Self {
            calories,
            protein,
            carbs,
            fat,
        };
        facts.validate()?;
        Ok(facts)
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("calories", self.calories),
            ("protein", self.protein),
            ("carbs", self.carbs),
            ("fat", self.fat),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::ConstraintViolation(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

impl Add for NutritionFacts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            calories: self.calories + rhs.calories,
            protein: self.protein + rhs.protein,
            carbs: self.carbs + rhs.carbs,
            fat: self.fat + rhs.fat,
        }
    }
}

impl AddAssign for NutritionFacts {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for NutritionFacts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), Add::add)
    }
}

/// Coarse time-of-day classification of a logged entry.
///
/// Unrecognised tags map to [`MealCategory::Snack`], never to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum MealCategory {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealCategory {
    pub const ALL: [MealCategory; 4] = [Self::Breakfast, Self::Lunch, Self::Dinner, Self::Snack];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        }
    }

    /// Parse a stored or user-supplied tag, case-insensitively.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "breakfast" => Self::Breakfast,
            "lunch" => Self::Lunch,
            "dinner" => Self::Dinner,
            _ => Self::Snack,
        }
    }

    /// First category named anywhere in `text` (substring match), checked in
    /// breakfast, lunch, dinner, snack order.
    pub fn mentioned_in(text: &str) -> Option<Self> {
        let lowered = text.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| lowered.contains(category.as_str()))
    }

    /// Category for a local wall-clock hour:
    /// `[5,11)` breakfast, `[11,15)` lunch, `[15,18)` snack, otherwise dinner.
    pub fn for_hour(hour: u32) -> Self {
        match hour {
            5..=10 => Self::Breakfast,
            11..=14 => Self::Lunch,
            15..=17 => Self::Snack,
            _ => Self::Dinner,
        }
    }
}

impl Default for MealCategory {
    fn default() -> Self {
        Self::Snack
    }
}

impl fmt::Display for MealCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealCategory {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_tag(s))
    }
}

impl From<String> for MealCategory {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

/// One logged food item.
///
/// Entries are replaced wholesale via `Store::update`; there is no
/// partial-field mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntry {
    /// Store-assigned id; [`UNASSIGNED_ID`] until appended.
    pub id: i64,
    pub occurred_at: DateTime<Utc>,
    pub meal_category: MealCategory,
    pub food_name: String,
    pub facts: NutritionFacts,
}

impl FoodEntry {
    /// New unassigned entry. The name is trimmed and the timestamp is
    /// truncated to millisecond precision, the resolution stores keep.
    pub fn new(
        occurred_at: DateTime<Utc>,
        meal_category: MealCategory,
        food_name: impl Into<String>,
        facts: NutritionFacts,
    ) -> Self {
        Self {
            id: UNASSIGNED_ID,
            occurred_at: calendar::truncate_to_millis(occurred_at),
            meal_category,
            food_name: food_name.into().trim().to_string(),
            facts,
        }
    }

    /// Same as [`FoodEntry::new`] with `occurred_at` set to now.
    pub fn now(
        meal_category: MealCategory,
        food_name: impl Into<String>,
        facts: NutritionFacts,
    ) -> Self {
        Self::new(Utc::now(), meal_category, food_name, facts)
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.food_name.trim().is_empty() {
            return Err(Error::ConstraintViolation(
                "food name must not be empty".to_string(),
            ));
        }
        self.facts.validate()
    }

    /// Local calendar day of `occurred_at`.
    pub fn day(&self) -> NaiveDate {
        calendar::day_of(&self.occurred_at)
    }
}

/// A candidate produced by an extractor. Never persisted directly.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFood {
    pub food_name: String,
    pub facts: NutritionFacts,
    pub meal_category: MealCategory,
}

impl ExtractedFood {
    pub fn new(food_name: impl Into<String>, facts: NutritionFacts, meal_category: MealCategory) -> Self {
        Self {
            food_name: food_name.into(),
            facts,
            meal_category,
        }
    }

    pub fn into_entry(self, occurred_at: DateTime<Utc>) -> FoodEntry {
        FoodEntry::new(occurred_at, self.meal_category, self.food_name, self.facts)
    }
}
