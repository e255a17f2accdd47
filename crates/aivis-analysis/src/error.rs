use aivis_core::ConfigError;
use thiserror::Error;

/// Failure of the model-backed sentiment path. Never fatal to a run: the
/// extractor falls back to the lexicon when one of these surfaces.
#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("sentiment model returned status {0}")]
    Status(u16),

    #[error("sentiment model response invalid: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid entity name '{name}': {reason}")]
    InvalidEntity { name: String, reason: String },
}
