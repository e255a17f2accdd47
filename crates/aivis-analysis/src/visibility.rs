//! Aggregation of per-response mentions into visibility scores.

use std::collections::{BTreeMap, HashMap};

use aivis_core::{PlatformId, ScoreWeights, TaskKey};
use serde::{Deserialize, Serialize};

use crate::extractor::Mention;

/// One entity on one platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityScore {
    pub entity: String,
    pub platform: PlatformId,
    /// Successful responses from this platform.
    pub responses: usize,
    /// Responses with at least one mention of `entity`.
    pub mentioned_in: usize,
    pub mention_rate: f64,
    pub avg_position: Option<f64>,
    pub avg_sentiment: Option<f64>,
    /// `0.0..=100.0`.
    pub weighted_score: f64,
    /// The platform produced no successful responses.
    pub insufficient_data: bool,
}

/// Cross-platform score for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    pub entity: String,
    pub score: f64,
    /// Platforms that contributed to `score`.
    pub platforms_with_data: usize,
    pub insufficient_data: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityReport {
    pub weights: ScoreWeights,
    /// Effective relative weight of each scored platform in the composite.
    pub platform_weights: BTreeMap<PlatformId, f64>,
    /// Entity-major, in the order entities and platforms were given.
    pub scores: Vec<VisibilityScore>,
    pub composite: Vec<CompositeScore>,
    /// 1-based rank of the brand by composite score; `None` without data.
    pub competitive_rank: Option<u32>,
}

impl VisibilityReport {
    /// Rows for `entity`, one per platform.
    pub fn rows_for<'a>(&'a self, entity: &'a str) -> impl Iterator<Item = &'a VisibilityScore> + 'a {
        self.scores.iter().filter(move |s| s.entity == entity)
    }

    #[must_use]
    pub fn score_for(&self, entity: &str, platform: PlatformId) -> Option<&VisibilityScore> {
        self.scores
            .iter()
            .find(|s| s.entity == entity && s.platform == platform)
    }

    #[must_use]
    pub fn composite_for(&self, entity: &str) -> Option<&CompositeScore> {
        self.composite.iter().find(|c| c.entity == entity)
    }
}

/// Inverted step normalisation of an average sentence position.
#[must_use]
pub fn position_score(avg_position: f64) -> f64 {
    if avg_position <= 1.0 {
        1.0
    } else if avg_position <= 2.0 {
        0.85
    } else if avg_position <= 3.0 {
        0.70
    } else if avg_position <= 5.0 {
        0.50
    } else if avg_position <= 10.0 {
        0.25
    } else {
        0.10
    }
}

#[derive(Debug, Clone)]
pub struct VisibilityScorer {
    weights: ScoreWeights,
    platform_weights: BTreeMap<PlatformId, f64>,
}

impl VisibilityScorer {
    #[must_use]
    pub fn new(weights: ScoreWeights) -> Self {
        Self {
            weights,
            platform_weights: BTreeMap::new(),
        }
    }

    /// Relative platform weights for the composite. Unlisted platforms weigh `1.0`.
    #[must_use]
    pub fn with_platform_weights(mut self, platform_weights: BTreeMap<PlatformId, f64>) -> Self {
        self.platform_weights = platform_weights;
        self
    }

    #[must_use]
    pub fn weights(&self) -> ScoreWeights {
        self.weights
    }

    fn platform_weight(&self, platform: PlatformId) -> f64 {
        self.platform_weights.get(&platform).copied().unwrap_or(1.0)
    }

    /// Score every entity on every platform.
    ///
    /// `mentions_by_response` holds one entry per successful response, empty
    /// when nothing was mentioned. Never fails: platforms without responses
    /// come back zeroed and flagged `insufficient_data`.
    #[must_use]
    pub fn score(
        &self,
        mentions_by_response: &HashMap<TaskKey, Vec<Mention>>,
        platforms: &[PlatformId],
        brand: &str,
        competitors: &[String],
    ) -> VisibilityReport {
        let entities: Vec<&str> = std::iter::once(brand)
            .chain(competitors.iter().map(String::as_str))
            .collect();

        let mut responses: HashMap<PlatformId, usize> = HashMap::new();
        // (entity index, platform) -> first mention per response
        let mut hits: HashMap<(usize, PlatformId), Vec<&Mention>> = HashMap::new();

        for (key, mentions) in mentions_by_response {
            *responses.entry(key.platform).or_default() += 1;

            let mut seen = vec![false; entities.len()];
            for mention in mentions {
                let well_formed = mention.response_id == *key;
                debug_assert!(well_formed, "mention for {} filed under {key}", mention.response_id);
                if !well_formed {
                    tracing::error!(response = %key, mention_response = %mention.response_id, "mention filed under wrong response, skipping");
                    continue;
                }

                let idx = entities.iter().position(|e| *e == mention.entity);
                debug_assert!(idx.is_some(), "mention for unknown entity {}", mention.entity);
                let Some(idx) = idx else {
                    tracing::error!(entity = %mention.entity, response = %key, "mention for unknown entity, skipping");
                    continue;
                };

                if !seen[idx] {
                    seen[idx] = true;
                    hits.entry((idx, key.platform)).or_default().push(mention);
                }
            }
        }

        let mut scores = Vec::with_capacity(entities.len() * platforms.len());
        for (idx, entity) in entities.iter().enumerate() {
            for &platform in platforms {
                let total = responses.get(&platform).copied().unwrap_or(0);
                let found = hits.get(&(idx, platform)).map_or(&[][..], Vec::as_slice);
                scores.push(self.score_row(entity, platform, total, found));
            }
        }

        let composite: Vec<CompositeScore> = entities
            .iter()
            .map(|entity| self.composite_for(entity, &scores))
            .collect();

        let competitive_rank = composite.first().filter(|c| !c.insufficient_data).map(|brand_score| {
            let ahead = composite
                .iter()
                .filter(|c| !c.insufficient_data && c.score > brand_score.score)
                .count();
            u32::try_from(ahead + 1).unwrap_or(u32::MAX)
        });

        let platform_weights = platforms
            .iter()
            .map(|&p| (p, self.platform_weight(p)))
            .collect();

        VisibilityReport {
            weights: self.weights,
            platform_weights,
            scores,
            composite,
            competitive_rank,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn score_row(
        &self,
        entity: &str,
        platform: PlatformId,
        responses: usize,
        mentions: &[&Mention],
    ) -> VisibilityScore {
        if responses == 0 {
            return VisibilityScore {
                entity: entity.to_owned(),
                platform,
                responses: 0,
                mentioned_in: 0,
                mention_rate: 0.0,
                avg_position: None,
                avg_sentiment: None,
                weighted_score: 0.0,
                insufficient_data: true,
            };
        }

        let mentioned_in = mentions.len();
        let mention_rate = mentioned_in as f64 / responses as f64;

        let (avg_position, avg_sentiment) = if mentions.is_empty() {
            (None, None)
        } else {
            let n = mentions.len() as f64;
            let pos = mentions.iter().map(|m| f64::from(m.position)).sum::<f64>() / n;
            let sent = mentions.iter().map(|m| f64::from(m.sentiment)).sum::<f64>() / n;
            (Some(pos), Some(sent.clamp(-1.0, 1.0)))
        };

        let pos_component = avg_position.map_or(0.0, position_score);
        let sent_component = avg_sentiment.map_or(0.0, |s| (s + 1.0) / 2.0);
        let weighted_score = 100.0
            * (self.weights.mention_rate * mention_rate
                + self.weights.position * pos_component
                + self.weights.sentiment * sent_component);

        VisibilityScore {
            entity: entity.to_owned(),
            platform,
            responses,
            mentioned_in,
            mention_rate,
            avg_position,
            avg_sentiment,
            weighted_score,
            insufficient_data: false,
        }
    }

    fn composite_for(&self, entity: &str, scores: &[VisibilityScore]) -> CompositeScore {
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        let mut platforms_with_data = 0;

        for row in scores
            .iter()
            .filter(|s| s.entity == entity && !s.insufficient_data)
        {
            let w = self.platform_weight(row.platform);
            if w > 0.0 {
                weighted_sum += w * row.weighted_score;
                weight_total += w;
                platforms_with_data += 1;
            }
        }

        if platforms_with_data == 0 {
            return CompositeScore {
                entity: entity.to_owned(),
                score: 0.0,
                platforms_with_data: 0,
                insufficient_data: true,
            };
        }

        CompositeScore {
            entity: entity.to_owned(),
            score: weighted_sum / weight_total,
            platforms_with_data,
            insufficient_data: false,
        }
    }
}
