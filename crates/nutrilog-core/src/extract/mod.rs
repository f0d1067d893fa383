//! Nutrition extraction: free text in, candidate foods out.
//!
//! Defines the [`NutritionExtractor`] trait and the two strategies that need
//! no network:
//! - **[`TaggedNumberExtractor`]**: reads numbers followed by unit labels
//!   (`"95 calories 10 protein"`).
//! - **[`KeywordExtractor`]**: matches known food keywords against a fixed
//!   nutrition table.
//!
//! The model-backed strategy lives in the app crate. Which strategy runs is
//! decided once, when the extractor is constructed; callers only ever hold a
//! `dyn NutritionExtractor`, and strategies are never chained implicitly.
//!
//! Extractors never touch a store. Turning candidates into entries and
//! appending them is the caller's job, and happens only after `extract`
//! has returned.

mod keyword;
mod tagged;

pub use keyword::{KeywordExtractor, KEYWORD_TABLE};
pub use tagged::TaggedNumberExtractor;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::ExtractedFood;

/// Turns a free-text meal description into zero or more candidates.
#[async_trait]
pub trait NutritionExtractor: Send + Sync {
    /// Strategy identifier (e.g. `"keyword"`).
    fn name(&self) -> &str;

    /// Extract candidates from `text`. An empty vector means nothing was
    /// recognised and is not an error.
    async fn extract(&self, text: &str) -> Result<Vec<ExtractedFood>>;
}
