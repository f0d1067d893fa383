//! Error kinds surfaced by the food log engine.
//!
//! Stores and extractors return [`Error`]; none of them retry internally
//! or fall back to another strategy. Deleting a missing id is not an error.

use thiserror::Error;

/// Boxed source error carried by [`Error::StorageUnavailable`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    /// Entry data broke an invariant (negative nutrition value, empty name).
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// An update targeted an id that is not in the store.
    #[error("food entry not found: {0}")]
    NotFound(i64),

    /// The durable backend could not be opened or answered with an I/O error.
    #[error("storage unavailable: {message}")]
    StorageUnavailable {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The remote extractor is not configured or could not be reached.
    #[error("extractor unavailable: {0}")]
    ExtractorUnavailable(String),

    /// The remote extractor answered with something that is not nutrition data.
    #[error("extractor returned an invalid response: {0}")]
    ExtractorInvalidResponse(String),
}

impl Error {
    pub fn storage(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Stable machine-readable tag for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConstraintViolation(_) => "constraint_violation",
            Self::NotFound(_) => "not_found",
            Self::StorageUnavailable { .. } => "storage_unavailable",
            Self::ExtractorUnavailable(_) => "extractor_unavailable",
            Self::ExtractorInvalidResponse(_) => "extractor_invalid_response",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
