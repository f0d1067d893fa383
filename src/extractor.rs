//! Extractor selection and the model-backed strategy.
//!
//! [`create_extractor`] picks one strategy from `[extractor] strategy`:
//! - **`tagged`**: [`TaggedNumberExtractor`], numbers followed by unit labels.
//! - **`keyword`**: [`KeywordExtractor`], fixed keyword nutrition table.
//! - **`remote`**: [`RemoteExtractor`], an OpenAI-compatible chat-completions
//!   endpoint asked to answer in JSON.
//!
//! The choice is made once. A failing remote call is surfaced to the caller;
//! it never falls back to a heuristic strategy.
//!
//! # Retry Strategy
//!
//! The remote extractor retries transport-level failures only:
//! - HTTP 429 and 5xx → retry with exponential backoff (1s, 2s, 4s, ... capped at 32s)
//! - Connection errors and timeouts → retry
//! - Other HTTP 4xx → fail immediately with `ExtractorUnavailable`
//! - Unparsable replies → fail immediately with `ExtractorInvalidResponse`

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use nutrilog_core::extract::{KeywordExtractor, NutritionExtractor, TaggedNumberExtractor};
use nutrilog_core::{Error, ExtractedFood, MealCategory, NutritionFacts};

use crate::config::{ExtractorConfig, RemoteConfig};

/// Build the extractor named by `config.strategy`.
///
/// ```rust
/// # use nutrilog::config::ExtractorConfig;
/// # use nutrilog::extractor::create_extractor;
/// let extractor = create_extractor(&ExtractorConfig::default()).unwrap();
/// assert_eq!(extractor.name(), "keyword");
/// ```
pub fn create_extractor(config: &ExtractorConfig) -> Result<Box<dyn NutritionExtractor>> {
    match config.strategy.as_str() {
        "tagged" => Ok(Box::new(TaggedNumberExtractor::new())),
        "keyword" => Ok(Box::new(KeywordExtractor::new())),
        "remote" => Ok(Box::new(RemoteExtractor::new(&config.remote)?)),
        other => bail!("Unknown extractor strategy: {}", other),
    }
}

/// What the model is asked to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteMode {
    /// One `{calories, protein, carbs, fat}` object for the whole text.
    Aggregate,
    /// `{"items": [...]}` with one object per food.
    Items,
}

impl RemoteMode {
    fn from_config(mode: &str) -> Result<Self> {
        match mode {
            "aggregate" => Ok(Self::Aggregate),
            "items" => Ok(Self::Items),
            other => bail!("Unknown remote extractor mode: {}", other),
        }
    }

    fn prompt(&self, text: &str) -> String {
        match self {
            Self::Aggregate => format!(
                "Extract the total calories and macronutrients (protein, carbs, fat) from this \
                 description: {}.\nRespond only in JSON with keys calories, protein, carbs, fat.",
                text
            ),
            Self::Items => format!(
                "Parse the following food log entry and extract food items with their \
                 nutritional information.\nRespond only in JSON of the form \
                 {{\"items\": [{{\"food_name\": string, \"calories\": number, \"protein\": number, \
                 \"carbs\": number, \"fat\": number, \"meal_category\": \
                 \"breakfast\"|\"lunch\"|\"dinner\"|\"snack\"}}]}}.\nProvide your best estimate \
                 based on common portion sizes.\n\nUser input: {}",
                text
            ),
        }
    }
}

/// Model-backed extractor speaking the chat-completions protocol.
///
/// The API key is read from the environment variable named by
/// `api_key_env` when the extractor is built. A missing key does not fail
/// construction; every `extract` call then fails with `ExtractorUnavailable`.
pub struct RemoteExtractor {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
    api_key_env: String,
    mode: RemoteMode,
    max_retries: u32,
}

impl RemoteExtractor {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).ok();
        Self::with_api_key(config, api_key)
    }

    /// Build with an explicit key instead of reading the environment.
    pub fn with_api_key(config: &RemoteConfig, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            model: config.model.clone(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            api_key_env: config.api_key_env.clone(),
            mode: RemoteMode::from_config(&config.mode)?,
            max_retries: config.max_retries,
        })
    }

    pub fn mode(&self) -> RemoteMode {
        self.mode
    }

    async fn complete(&self, api_key: &str, text: &str) -> nutrilog_core::Result<Value> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": self.mode.prompt(text) }],
            "response_format": { "type": "json_object" },
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tracing::warn!(attempt, ?delay, "retrying remote extraction");
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&self.url)
                .bearer_auth(api_key)
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let body_text = response.text().await.map_err(|e| {
                            Error::ExtractorUnavailable(format!("reading reply failed: {}", e))
                        })?;
                        return serde_json::from_str(&body_text)
                            .map_err(|e| invalid(format!("body is not JSON: {}", e)));
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    let message = format!("remote API error {}: {}", status, body_text);

                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err = Some(message);
                        continue;
                    }

                    return Err(Error::ExtractorUnavailable(message));
                }
                Err(e) => {
                    last_err = Some(format!("cannot reach {}: {}", self.url, e));
                    continue;
                }
            }
        }

        Err(Error::ExtractorUnavailable(last_err.unwrap_or_else(|| {
            "remote extraction failed after retries".to_string()
        })))
    }
}

#[async_trait]
impl NutritionExtractor for RemoteExtractor {
    fn name(&self) -> &str {
        "remote"
    }

    async fn extract(&self, text: &str) -> nutrilog_core::Result<Vec<ExtractedFood>> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(Error::ExtractorUnavailable(format!(
                "{} environment variable not set",
                self.api_key_env
            )));
        };
        tracing::debug!(model = %self.model, mode = ?self.mode, "requesting remote extraction");
        let json = self.complete(api_key, text).await?;
        parse_chat_response(&json, text, self.mode)
    }
}

#[derive(Debug, Deserialize)]
struct AggregateReply {
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
}

#[derive(Debug, Deserialize)]
struct ItemsReply {
    items: Vec<ItemReply>,
}

#[derive(Debug, Deserialize)]
struct ItemReply {
    #[serde(alias = "foodName", alias = "name")]
    food_name: String,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    #[serde(default, alias = "mealType", alias = "meal_type", alias = "mealCategory")]
    meal_category: Option<String>,
}

fn invalid(message: impl Into<String>) -> Error {
    Error::ExtractorInvalidResponse(message.into())
}

fn checked_facts(calories: f64, protein: f64, carbs: f64, fat: f64) -> nutrilog_core::Result<NutritionFacts> {
    NutritionFacts::new(calories, protein, carbs, fat).map_err(|e| invalid(e.to_string()))
}

/// Pull `choices[0].message.content` out of a chat-completions reply and
/// decode it as nutrition data in the shape `mode` asked for.
pub fn parse_chat_response(
    json: &Value,
    text: &str,
    mode: RemoteMode,
) -> nutrilog_core::Result<Vec<ExtractedFood>> {
    let content = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| invalid("missing choices[0].message.content"))?;
    parse_content(content, text, mode)
}

/// Decode the model's JSON answer.
///
/// `Items` mode requires an `items` array and yields one candidate per
/// item. `Aggregate` mode requires a single `{calories, protein, carbs, fat}`
/// object named by the trimmed input. A reply in the other shape is invalid.
pub fn parse_content(
    content: &str,
    text: &str,
    mode: RemoteMode,
) -> nutrilog_core::Result<Vec<ExtractedFood>> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| invalid(format!("content is not JSON: {}", e)))?;
    let fallback_meal = MealCategory::mentioned_in(text).unwrap_or_default();

    match mode {
        RemoteMode::Items => {
            if !value.get("items").is_some_and(Value::is_array) {
                return Err(invalid("items mode reply has no items array"));
            }
            let reply: ItemsReply = serde_json::from_value(value)
                .map_err(|e| invalid(format!("bad items reply: {}", e)))?;
            reply
                .items
                .into_iter()
                .map(|item| {
                    let name = item.food_name.trim();
                    if name.is_empty() {
                        return Err(invalid("item with empty food_name"));
                    }
                    let facts = checked_facts(item.calories, item.protein, item.carbs, item.fat)?;
                    let meal = item
                        .meal_category
                        .as_deref()
                        .map(MealCategory::from_tag)
                        .unwrap_or(fallback_meal);
                    Ok(ExtractedFood::new(name, facts, meal))
                })
                .collect()
        }
        RemoteMode::Aggregate => {
            if value.get("items").is_some() {
                return Err(invalid("aggregate mode reply is an items list"));
            }
            let reply: AggregateReply = serde_json::from_value(value)
                .map_err(|e| invalid(format!("bad aggregate reply: {}", e)))?;
            let facts = checked_facts(reply.calories, reply.protein, reply.carbs, reply.fat)?;
            Ok(vec![ExtractedFood::new(text.trim(), facts, fallback_meal)])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(content: &str) -> Value {
        serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        })
    }

    fn remote_config(url: &str) -> RemoteConfig {
        RemoteConfig {
            url: url.to_string(),
            max_retries: 0,
            timeout_secs: 2,
            ..RemoteConfig::default()
        }
    }

    #[test]
    fn test_factory_strategies() {
        for (strategy, name) in [("tagged", "tagged"), ("keyword", "keyword"), ("remote", "remote")] {
            let config = ExtractorConfig {
                strategy: strategy.to_string(),
                remote: RemoteConfig::default(),
            };
            assert_eq!(create_extractor(&config).unwrap().name(), name);
        }
        let bad = ExtractorConfig {
            strategy: "oracle".to_string(),
            remote: RemoteConfig::default(),
        };
        assert!(create_extractor(&bad).is_err());
    }

    #[test]
    fn test_parse_aggregate() {
        let foods = parse_chat_response(
            &chat(r#"{"calories": 450, "protein": 30, "carbs": 40, "fat": 12}"#),
            "  chicken wrap for lunch ",
            RemoteMode::Aggregate,
        )
        .unwrap();
        assert_eq!(foods.len(), 1);
        assert_eq!(foods[0].food_name, "chicken wrap for lunch");
        assert_eq!(foods[0].facts, NutritionFacts::new(450.0, 30.0, 40.0, 12.0).unwrap());
        assert_eq!(foods[0].meal_category, MealCategory::Lunch);
    }

    #[test]
    fn test_parse_items() {
        let content = r#"{"items": [
            {"foodName": "Eggs", "calories": 140, "protein": 12, "carbs": 2, "fat": 10, "mealType": "breakfast"},
            {"food_name": "Toast", "calories": 80, "protein": 3, "carbs": 15, "fat": 1}
        ]}"#;
        let foods = parse_content(content, "2 eggs and toast", RemoteMode::Items).unwrap();
        assert_eq!(foods.len(), 2);
        assert_eq!(foods[0].food_name, "Eggs");
        assert_eq!(foods[0].meal_category, MealCategory::Breakfast);
        assert_eq!(foods[1].food_name, "Toast");
        assert_eq!(foods[1].meal_category, MealCategory::Snack);
    }

    #[test]
    fn test_parse_empty_items_is_ok() {
        assert!(parse_content(r#"{"items": []}"#, "water", RemoteMode::Items)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        use RemoteMode::{Aggregate, Items};
        let cases = [
            (Aggregate, chat("not json at all")),
            (Aggregate, chat(r#"{"calories": "lots"}"#)),
            (Aggregate, chat(r#"{"calories": 100, "protein": 1, "carbs": 1}"#)),
            (Aggregate, chat(r#"{"calories": -5, "protein": 1, "carbs": 1, "fat": 1}"#)),
            (Items, chat(r#"{"items": [{"food_name": " ", "calories": 1, "protein": 1, "carbs": 1, "fat": 1}]}"#)),
            (Items, chat(r#"{"items": {"food_name": "Toast"}}"#)),
            (Items, serde_json::json!({"choices": []})),
            (Aggregate, serde_json::json!({"error": "nope"})),
        ];
        for (mode, json) in cases {
            let err = parse_chat_response(&json, "x", mode).unwrap_err();
            assert_eq!(err.kind(), "extractor_invalid_response", "input {}", json);
        }
    }

    #[test]
    fn test_aggregate_mode_rejects_items_reply() {
        let content = r#"{"items": [
            {"food_name": "Eggs", "calories": 140, "protein": 12, "carbs": 2, "fat": 10},
            {"food_name": "Toast", "calories": 80, "protein": 3, "carbs": 15, "fat": 1}
        ]}"#;
        let err = parse_content(content, "eggs and toast", RemoteMode::Aggregate).unwrap_err();
        assert_eq!(err.kind(), "extractor_invalid_response");
    }

    #[test]
    fn test_items_mode_rejects_aggregate_reply() {
        let content = r#"{"calories": 220, "protein": 15, "carbs": 17, "fat": 11}"#;
        let err = parse_content(content, "eggs and toast", RemoteMode::Items).unwrap_err();
        assert_eq!(err.kind(), "extractor_invalid_response");
    }

    #[tokio::test]
    async fn test_missing_key_is_unavailable() {
        let extractor =
            RemoteExtractor::with_api_key(&remote_config("http://127.0.0.1:9/v1"), None).unwrap();
        let err = extractor.extract("an apple").await.unwrap_err();
        assert_eq!(err.kind(), "extractor_unavailable");
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = format!("http://127.0.0.1:{}/v1/chat/completions", port);
        let extractor =
            RemoteExtractor::with_api_key(&remote_config(&url), Some("test-key".into())).unwrap();
        let err = extractor.extract("an apple").await.unwrap_err();
        assert_eq!(err.kind(), "extractor_unavailable");
    }

    #[test]
    fn test_prompt_mentions_input() {
        assert!(RemoteMode::Items.prompt("two tacos").contains("two tacos"));
        assert!(RemoteMode::Aggregate.prompt("two tacos").contains("calories, protein, carbs, fat"));
    }
}
