use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, Timelike};

use crate::error::Result;
use crate::models::{ExtractedFood, MealCategory, NutritionFacts};

use super::NutritionExtractor;

/// Keyword → (calories, protein g, carbs g, fat g) for a common portion.
pub const KEYWORD_TABLE: &[(&str, f64, f64, f64, f64)] = &[
    ("egg", 70.0, 6.0, 1.0, 5.0),
    ("eggs", 140.0, 12.0, 2.0, 10.0),
    ("toast", 80.0, 3.0, 15.0, 1.0),
    ("chicken", 165.0, 31.0, 0.0, 4.0),
    ("rice", 130.0, 2.7, 28.0, 0.3),
    ("apple", 95.0, 0.5, 25.0, 0.3),
    ("banana", 105.0, 1.3, 27.0, 0.4),
    ("salad", 50.0, 2.0, 8.0, 1.0),
    ("pasta", 200.0, 7.0, 40.0, 1.5),
    ("pizza", 285.0, 12.0, 36.0, 10.0),
    ("burger", 354.0, 20.0, 33.0, 17.0),
    ("sandwich", 250.0, 15.0, 30.0, 8.0),
    ("yogurt", 100.0, 5.0, 12.0, 2.5),
    ("oatmeal", 150.0, 5.0, 27.0, 3.0),
    ("protein shake", 200.0, 25.0, 10.0, 3.0),
    ("milk", 150.0, 8.0, 12.0, 8.0),
    ("coffee", 5.0, 0.3, 0.0, 0.0),
];

type HourSource = Arc<dyn Fn() -> u32 + Send + Sync>;

/// Matches table keywords as plain substrings of the lowercased text.
///
/// Matching is not word-bounded: `"eggs"` fires both `egg` and `eggs`.
/// Every hit yields one candidate named by the capitalised keyword. The
/// meal category comes from an explicit meal word in the text, else from
/// the current local hour.
#[derive(Clone)]
pub struct KeywordExtractor {
    hour: HourSource,
}

impl KeywordExtractor {
    /// Extractor that reads the hour from the local wall clock.
    pub fn new() -> Self {
        Self::with_hour_source(|| Local::now().hour())
    }

    /// Extractor with an injected clock, for deterministic categorisation.
    pub fn with_hour_source<F>(hour: F) -> Self
    where
        F: Fn() -> u32 + Send + Sync + 'static,
    {
        Self {
            hour: Arc::new(hour),
        }
    }

    /// Extractor pinned to a fixed hour.
    pub fn at_hour(hour: u32) -> Self {
        Self::with_hour_source(move || hour)
    }

    /// Synchronous core of [`NutritionExtractor::extract`].
    pub fn parse(&self, text: &str) -> Vec<ExtractedFood> {
        let lowered = text.to_lowercase();
        let matches: Vec<_> = KEYWORD_TABLE
            .iter()
            .filter(|(keyword, ..)| lowered.contains(keyword))
            .collect();
        if matches.is_empty() {
            return Vec::new();
        }

        let category = MealCategory::mentioned_in(&lowered)
            .unwrap_or_else(|| MealCategory::for_hour((self.hour)()));

        matches
            .into_iter()
            .map(|&(keyword, calories, protein, carbs, fat)| {
                let facts = NutritionFacts {
                    calories,
                    protein,
                    carbs,
                    fat,
                };
                ExtractedFood::new(capitalize_words(keyword), facts, category)
            })
            .collect()
    }
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KeywordExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeywordExtractor")
            .field("keywords", &KEYWORD_TABLE.len())
            .finish()
    }
}

/// `"protein shake"` → `"Protein Shake"`.
fn capitalize_words(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[async_trait]
impl NutritionExtractor for KeywordExtractor {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn extract(&self, text: &str) -> Result<Vec<ExtractedFood>> {
        Ok(self.parse(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(foods: &[ExtractedFood]) -> Vec<&str> {
        foods.iter().map(|f| f.food_name.as_str()).collect()
    }

    #[test]
    fn test_table_values_are_valid() {
        for (keyword, cal, p, c, f) in KEYWORD_TABLE {
            assert!(
                NutritionFacts::new(*cal, *p, *c, *f).is_ok(),
                "bad entry for {}",
                keyword
            );
        }
    }

    #[test]
    fn test_eggs_and_toast_for_breakfast() {
        // Evening clock: the explicit meal word must win.
        let foods = KeywordExtractor::at_hour(20).parse("I had 2 eggs and toast for breakfast");
        let found = names(&foods);
        assert!(found.contains(&"Eggs"));
        assert!(found.contains(&"Toast"));
        // Substring matching also fires "egg" inside "eggs".
        assert!(found.contains(&"Egg"));
        assert!(foods.iter().all(|f| f.meal_category == MealCategory::Breakfast));
    }

    #[test]
    fn test_eggs_candidate_values() {
        let foods = KeywordExtractor::at_hour(8).parse("eggs");
        let eggs = foods.iter().find(|f| f.food_name == "Eggs").unwrap();
        assert_eq!(eggs.facts, NutritionFacts::new(140.0, 12.0, 2.0, 10.0).unwrap());
    }

    #[test]
    fn test_no_keyword_is_empty() {
        assert!(KeywordExtractor::at_hour(12).parse("a mystery stew").is_empty());
    }

    #[test]
    fn test_time_of_day_fallback() {
        let cases = [
            (6, MealCategory::Breakfast),
            (12, MealCategory::Lunch),
            (16, MealCategory::Snack),
            (19, MealCategory::Dinner),
            (2, MealCategory::Dinner),
        ];
        for (hour, expected) in cases {
            let foods = KeywordExtractor::at_hour(hour).parse("an apple");
            assert_eq!(foods.len(), 1);
            assert_eq!(foods[0].meal_category, expected, "hour {}", hour);
        }
    }

    #[test]
    fn test_multi_word_keyword_capitalised() {
        let foods = KeywordExtractor::at_hour(12).parse("Protein Shake after gym");
        assert_eq!(names(&foods), vec!["Protein Shake"]);
    }

    #[test]
    fn test_hour_source_is_consulted() {
        let extractor = KeywordExtractor::with_hour_source(|| 13);
        assert_eq!(extractor.parse("rice")[0].meal_category, MealCategory::Lunch);
    }

    #[tokio::test]
    async fn test_trait_dispatch() {
        let extractor: Box<dyn NutritionExtractor> = Box::new(KeywordExtractor::at_hour(9));
        assert_eq!(extractor.name(), "keyword");
        let foods = extractor.extract("banana and coffee").await.unwrap();
        assert_eq!(names(&foods), vec!["Banana", "Coffee"]);
    }
}
