use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ExtractedFood, MealCategory, NutritionFacts};

use super::NutritionExtractor;

/// Reads `<number> <label>` pairs out of the text.
///
/// Labels: `calories`/`cal`, `protein`/`p`, `carbs`/`carb`/`c`, `fat`/`f`.
/// A number with no recognised label becomes the calorie value only while
/// calories are still unset; later unlabeled numbers are dropped. Always
/// yields exactly one candidate named by the trimmed input.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaggedNumberExtractor;

impl TaggedNumberExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous core of [`NutritionExtractor::extract`].
    pub fn parse(&self, text: &str) -> ExtractedFood {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered.split_whitespace().collect();

        let mut calories: Option<f64> = None;
        let mut facts = NutritionFacts::zero();

        for (i, token) in tokens.iter().enumerate() {
            let Some(value) = parse_amount(token) else {
                continue;
            };
            match tokens.get(i + 1).copied().and_then(Unit::from_label) {
                Some(Unit::Calories) => calories = Some(value),
                Some(Unit::Protein) => facts.protein = value,
                Some(Unit::Carbs) => facts.carbs = value,
                Some(Unit::Fat) => facts.fat = value,
                None => {
                    if calories.is_none() {
                        calories = Some(value);
                    }
                }
            }
        }
        facts.calories = calories.unwrap_or(0.0);

        let category = MealCategory::mentioned_in(text).unwrap_or_default();
        ExtractedFood::new(text.trim(), facts, category)
    }
}

enum Unit {
    Calories,
    Protein,
    Carbs,
    Fat,
}

impl Unit {
    fn from_label(label: &str) -> Option<Self> {
        match label {
            "calories" | "cal" => Some(Self::Calories),
            "protein" | "p" => Some(Self::Protein),
            "carbs" | "carb" | "c" => Some(Self::Carbs),
            "fat" | "f" => Some(Self::Fat),
            _ => None,
        }
    }
}

/// Non-negative finite numbers only; anything else is not a numeric token.
fn parse_amount(token: &str) -> Option<f64> {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

#[async_trait]
impl NutritionExtractor for TaggedNumberExtractor {
    fn name(&self) -> &str {
        "tagged"
    }

    async fn extract(&self, text: &str) -> Result<Vec<ExtractedFood>> {
        Ok(vec![self.parse(text)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_tagged_input() {
        let text = "apple 95 calories 10 protein 20 carbs 5 fat";
        let food = TaggedNumberExtractor.parse(text);
        assert_eq!(food.food_name, text);
        assert_eq!(food.facts, NutritionFacts::new(95.0, 10.0, 20.0, 5.0).unwrap());
    }

    #[test]
    fn test_short_labels() {
        let food = TaggedNumberExtractor.parse("shake 200 cal 30 p 8 c 3 f");
        assert_eq!(food.facts, NutritionFacts::new(200.0, 30.0, 8.0, 3.0).unwrap());
    }

    #[test]
    fn test_first_unlabeled_number_is_calories() {
        let food = TaggedNumberExtractor.parse("rice 300 then 400 grams");
        assert_eq!(food.facts.calories, 300.0);
        assert_eq!(food.facts.protein, 0.0);
    }

    #[test]
    fn test_trailing_number_without_label() {
        let food = TaggedNumberExtractor.parse("10 protein 250");
        assert_eq!(food.facts.calories, 250.0);
        assert_eq!(food.facts.protein, 10.0);
    }

    #[test]
    fn test_no_numbers_yields_zero_candidate() {
        let food = TaggedNumberExtractor.parse("  just a salad  ");
        assert_eq!(food.food_name, "just a salad");
        assert_eq!(food.facts, NutritionFacts::zero());
        assert_eq!(food.meal_category, MealCategory::Snack);
    }

    #[test]
    fn test_negative_numbers_are_ignored() {
        let food = TaggedNumberExtractor.parse("-50 calories 12 protein");
        assert_eq!(food.facts.calories, 0.0);
        assert_eq!(food.facts.protein, 12.0);
    }

    #[test]
    fn test_labels_are_case_insensitive() {
        let food = TaggedNumberExtractor.parse("Oats 150 Calories for Breakfast");
        assert_eq!(food.facts.calories, 150.0);
        assert_eq!(food.meal_category, MealCategory::Breakfast);
    }

    #[tokio::test]
    async fn test_independent_extractions_sum() {
        let extractor = TaggedNumberExtractor::new();
        let mut total = 0.0;
        for text in ["100 calories", "200 calories"] {
            let foods = extractor.extract(text).await.unwrap();
            assert_eq!(foods.len(), 1);
            total += foods[0].facts.calories;
        }
        assert_eq!(total, 300.0);
    }
}
