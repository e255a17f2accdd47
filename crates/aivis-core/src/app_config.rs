use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::PlatformId;
use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Coefficients of the per-platform weighted visibility score.
///
/// The three weights must sum to `1.0`; [`ScoreWeights::new`] enforces this.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub mention_rate: f64,
    pub position: f64,
    pub sentiment: f64,
}

impl ScoreWeights {
    const SUM_TOLERANCE: f64 = 1e-6;

    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if any weight is negative or
    /// non-finite, or if the weights do not sum to `1.0`.
    pub fn new(mention_rate: f64, position: f64, sentiment: f64) -> Result<Self, ConfigError> {
        let weights = Self {
            mention_rate,
            position,
            sentiment,
        };
        for (name, w) in [
            ("mention_rate", mention_rate),
            ("position", position),
            ("sentiment", sentiment),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "score weight '{name}' must be a non-negative number, got {w}"
                )));
            }
        }
        if (weights.sum() - 1.0).abs() > Self::SUM_TOLERANCE {
            return Err(ConfigError::Validation(format!(
                "score weights must sum to 1.0, got {}",
                weights.sum()
            )));
        }
        Ok(weights)
    }

    #[must_use]
    pub fn sum(&self) -> f64 {
        self.mention_rate + self.position + self.sentiment
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            mention_rate: 0.5,
            position: 0.3,
            sentiment: 0.2,
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub profile_path: PathBuf,
    pub industries_path: PathBuf,
    pub max_workers: usize,
    pub request_timeout_secs: u64,
    pub run_deadline_secs: Option<u64>,
    pub score_weights: ScoreWeights,
    /// Relative weight per platform for the composite score. Empty means equal.
    pub platform_weights: BTreeMap<PlatformId, f64>,
    pub sentiment_model_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub perplexity_api_key: Option<String>,
}

impl AppConfig {
    #[must_use]
    pub fn api_key(&self, platform: PlatformId) -> Option<&str> {
        match platform {
            PlatformId::OpenAi => self.openai_api_key.as_deref(),
            PlatformId::Gemini => self.gemini_api_key.as_deref(),
            PlatformId::Perplexity => self.perplexity_api_key.as_deref(),
        }
    }

    /// Platforms with an API key configured.
    #[must_use]
    pub fn configured_platforms(&self) -> Vec<PlatformId> {
        PlatformId::ALL
            .into_iter()
            .filter(|p| self.api_key(*p).is_some())
            .collect()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("profile_path", &self.profile_path)
            .field("industries_path", &self.industries_path)
            .field("max_workers", &self.max_workers)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("run_deadline_secs", &self.run_deadline_secs)
            .field("score_weights", &self.score_weights)
            .field("platform_weights", &self.platform_weights)
            .field("sentiment_model_url", &self.sentiment_model_url)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "perplexity_api_key",
                &self.perplexity_api_key.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        let w = ScoreWeights::default();
        assert!((w.sum() - 1.0).abs() < 1e-9, "got {}", w.sum());
        assert!(ScoreWeights::new(w.mention_rate, w.position, w.sentiment).is_ok());
    }

    #[test]
    fn weights_not_summing_to_one_rejected() {
        let err = ScoreWeights::new(0.5, 0.5, 0.5).unwrap_err();
        assert!(err.to_string().contains("sum to 1.0"));
    }

    #[test]
    fn negative_weight_rejected() {
        let err = ScoreWeights::new(1.2, -0.2, 0.0).unwrap_err();
        assert!(err.to_string().contains("position"));
    }
}
