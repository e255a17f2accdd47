//! Sentiment scoring for the text surrounding an entity mention.
//!
//! Two scorers implement [`SentimentScorer`]: a model-backed classifier
//! reached over HTTP ([`ModelSentiment`]) and the built-in word lexicon
//! ([`LexiconSentiment`]). [`select_sentiment_scorer`] picks one at startup.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SentimentError;

/// Product-recommendation word weights.
///
/// Keys are lowercase single words. Values in `(0.0, 1.0]` are positive,
/// in `[-1.0, 0.0)` are negative. The final score is clamped to `[-1.0, 1.0]`.
pub(crate) const LEXICON: &[(&str, f32)] = &[
    // Positive signals
    ("best", 0.5),
    ("excellent", 0.5),
    ("great", 0.4),
    ("amazing", 0.5),
    ("outstanding", 0.5),
    ("superior", 0.4),
    ("top", 0.3),
    ("leading", 0.3),
    ("recommended", 0.4),
    ("recommend", 0.4),
    ("popular", 0.3),
    ("reliable", 0.4),
    ("trusted", 0.4),
    ("innovative", 0.3),
    ("effective", 0.3),
    ("efficient", 0.3),
    ("quality", 0.3),
    ("premium", 0.3),
    ("love", 0.5),
    ("prefer", 0.3),
    ("preferred", 0.3),
    ("winner", 0.5),
    ("secure", 0.3),
    ("easy", 0.3),
    // Negative signals
    ("worst", -0.6),
    ("terrible", -0.6),
    ("bad", -0.4),
    ("awful", -0.6),
    ("poor", -0.4),
    ("inferior", -0.4),
    ("avoid", -0.5),
    ("problem", -0.3),
    ("problems", -0.3),
    ("issue", -0.3),
    ("issues", -0.3),
    ("complaint", -0.4),
    ("complaints", -0.4),
    ("expensive", -0.3),
    ("slow", -0.3),
    ("difficult", -0.3),
    ("complicated", -0.3),
    ("limited", -0.3),
    ("lacking", -0.4),
    ("hate", -0.6),
    ("disappointed", -0.5),
    ("disappointing", -0.5),
    ("frustrating", -0.5),
    ("annoying", -0.4),
    ("scam", -0.7),
];

/// Score a text string using the built-in lexicon.
///
/// Splits text into lowercase words, sums matching weights, and clamps
/// the result to `[-1.0, 1.0]`. Returns `0.0` for empty or unknown text.
#[must_use]
pub fn lexicon_score(text: &str) -> f32 {
    let mut score = 0.0_f32;
    for word in text.split_whitespace() {
        let w = word
            .trim_matches(|c: char| !c.is_alphabetic())
            .to_lowercase();
        if let Some(&(_, weight)) = LEXICON.iter().find(|(lex_word, _)| *lex_word == w) {
            score += weight;
        }
    }
    score.clamp(-1.0, 1.0)
}

/// Polarity of a short text window, in `[-1.0, 1.0]`.
#[async_trait]
pub trait SentimentScorer: Send + Sync {
    /// Short label recorded in logs and the report.
    fn name(&self) -> &'static str;

    async fn score(&self, text: &str) -> Result<f32, SentimentError>;
}

/// Infallible scorer backed by [`lexicon_score`].
#[derive(Debug, Default, Clone, Copy)]
pub struct LexiconSentiment;

#[async_trait]
impl SentimentScorer for LexiconSentiment {
    fn name(&self) -> &'static str {
        "lexicon"
    }

    async fn score(&self, text: &str) -> Result<f32, SentimentError> {
        Ok(lexicon_score(text))
    }
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    label: String,
    score: f32,
}

/// TEI returns a flat list for one input and a nested list for batches.
#[derive(Deserialize)]
#[serde(untagged)]
enum PredictResponse {
    Flat(Vec<Prediction>),
    Nested(Vec<Vec<Prediction>>),
}

/// Text-classification model served by a TEI-compatible `/predict` endpoint.
///
/// The score is `P(positive) - P(negative)`; a neutral label contributes
/// nothing.
pub struct ModelSentiment {
    client: reqwest::Client,
    base_url: String,
}

impl ModelSentiment {
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SentimentError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Returns `true` when `GET /health` answers with a success status.
    pub async fn is_available(&self) -> bool {
        match self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(url = %self.base_url, error = %e, "sentiment model health probe failed");
                false
            }
        }
    }
}

#[async_trait]
impl SentimentScorer for ModelSentiment {
    fn name(&self) -> &'static str {
        "model"
    }

    async fn score(&self, text: &str) -> Result<f32, SentimentError> {
        let response = self
            .client
            .post(format!("{}/predict", self.base_url))
            .json(&PredictRequest { inputs: text })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SentimentError::Status(response.status().as_u16()));
        }

        let predictions = match response.json::<PredictResponse>().await {
            Ok(PredictResponse::Flat(p)) => p,
            Ok(PredictResponse::Nested(p)) => p.into_iter().next().unwrap_or_default(),
            Err(e) => return Err(SentimentError::InvalidResponse(e.to_string())),
        };

        polarity(&predictions)
    }
}

fn polarity(predictions: &[Prediction]) -> Result<f32, SentimentError> {
    let mut positive = None;
    let mut negative = None;

    for p in predictions {
        match p.label.to_lowercase().as_str() {
            "positive" | "pos" => positive = Some(p.score),
            "negative" | "neg" => negative = Some(p.score),
            _ => {}
        }
    }

    if positive.is_none() && negative.is_none() {
        return Err(SentimentError::InvalidResponse(
            "no positive or negative label in prediction".to_owned(),
        ));
    }

    let score = positive.unwrap_or(0.0) - negative.unwrap_or(0.0);
    if score.is_finite() {
        Ok(score.clamp(-1.0, 1.0))
    } else {
        Err(SentimentError::InvalidResponse(format!(
            "non-finite polarity {score}"
        )))
    }
}

/// Choose the sentiment scorer once for the whole run.
///
/// Uses the model when a URL is configured and its health probe succeeds;
/// otherwise logs a warning and returns the lexicon scorer.
pub async fn select_sentiment_scorer(
    model_url: Option<&str>,
    timeout: Duration,
) -> Arc<dyn SentimentScorer> {
    let Some(url) = model_url else {
        tracing::info!("no sentiment model configured, using lexicon scorer");
        return Arc::new(LexiconSentiment);
    };

    match ModelSentiment::new(url, timeout) {
        Ok(model) if model.is_available().await => {
            tracing::info!(url, "using model-backed sentiment scorer");
            Arc::new(model)
        }
        Ok(_) => {
            tracing::warn!(url, "sentiment model unavailable, falling back to lexicon scorer");
            Arc::new(LexiconSentiment)
        }
        Err(e) => {
            tracing::warn!(url, error = %e, "sentiment model client failed to build, falling back to lexicon scorer");
            Arc::new(LexiconSentiment)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_returns_zero() {
        assert_eq!(lexicon_score(""), 0.0);
    }

    #[test]
    fn unknown_text_returns_zero() {
        assert_eq!(lexicon_score("the quick brown fox"), 0.0);
    }

    #[test]
    fn positive_keyword_returns_positive() {
        let score = lexicon_score("Stripe is a reliable choice");
        assert!(score > 0.0, "expected positive score, got {score}");
    }

    #[test]
    fn negative_keyword_returns_negative() {
        let score = lexicon_score("users report slow support and hidden fees, avoid it");
        assert!(score < 0.0, "expected negative score, got {score}");
    }

    #[test]
    fn score_clamps_to_range() {
        let high = lexicon_score("best excellent amazing outstanding winner love");
        let low = lexicon_score("worst terrible awful scam hate avoid");
        assert_eq!(high, 1.0);
        assert_eq!(low, -1.0);
    }

    #[test]
    fn punctuation_stripped_from_words() {
        assert!(lexicon_score("(recommended!)") > 0.0);
    }

    #[test]
    fn polarity_subtracts_negative_from_positive() {
        let preds = vec![
            Prediction {
                label: "POSITIVE".to_owned(),
                score: 0.8,
            },
            Prediction {
                label: "negative".to_owned(),
                score: 0.1,
            },
            Prediction {
                label: "neutral".to_owned(),
                score: 0.1,
            },
        ];
        let score = polarity(&preds).unwrap();
        assert!((score - 0.7).abs() < 1e-6, "got {score}");
    }

    #[test]
    fn polarity_without_known_labels_is_error() {
        let preds = vec![Prediction {
            label: "LABEL_0".to_owned(),
            score: 0.9,
        }];
        assert!(polarity(&preds).is_err());
    }

    #[tokio::test]
    async fn no_model_url_selects_lexicon() {
        let scorer = select_sentiment_scorer(None, Duration::from_secs(1)).await;
        assert_eq!(scorer.name(), "lexicon");
    }
}
