use std::collections::BTreeMap;

use aivis_core::{PlatformId, Prompt, QueryResult, ScoreWeights, TaskKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extractor::Mention;
use crate::insights::{MarketPosition, PlatformComparison};
use crate::visibility::{CompositeScore, VisibilityScore};

/// Call outcomes for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSummary {
    pub platform: PlatformId,
    pub succeeded: usize,
    pub failed: usize,
}

impl PlatformSummary {
    /// No call to this platform succeeded.
    #[must_use]
    pub fn unavailable(&self) -> bool {
        self.succeeded == 0
    }
}

/// Everything a renderer needs, without re-deriving any analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub brand: String,
    pub competitors: Vec<String>,
    pub industry: String,
    pub location: Option<String>,
    pub platforms: Vec<PlatformId>,
    pub prompts: Vec<Prompt>,
    pub sentiment_scorer: String,
    pub weights: ScoreWeights,
    pub platform_weights: BTreeMap<PlatformId, f64>,
    pub scores: Vec<VisibilityScore>,
    pub composite: Vec<CompositeScore>,
    pub competitive_rank: Option<u32>,
    pub platform_summaries: Vec<PlatformSummary>,
    /// Sorted by task key.
    pub results: Vec<QueryResult>,
    /// Sorted by response, then entity order.
    pub mentions: Vec<Mention>,
    pub platform_comparisons: Vec<PlatformComparison>,
    pub market_position: Option<MarketPosition>,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
    /// The run deadline cut off some calls.
    pub partial: bool,
}

impl AnalysisReport {
    #[must_use]
    pub fn brand_composite(&self) -> Option<&CompositeScore> {
        self.composite.iter().find(|c| c.entity == self.brand)
    }

    #[must_use]
    pub fn result_for(&self, key: TaskKey) -> Option<&QueryResult> {
        self.results.iter().find(|r| r.task == key)
    }

    #[must_use]
    pub fn score_for(&self, entity: &str, platform: PlatformId) -> Option<&VisibilityScore> {
        self.scores
            .iter()
            .find(|s| s.entity == entity && s.platform == platform)
    }

    pub fn mentions_in(&self, key: TaskKey) -> impl Iterator<Item = &Mention> {
        self.mentions.iter().filter(move |m| m.response_id == key)
    }
}

#[must_use]
pub(crate) fn summarize_platforms(
    platforms: &[PlatformId],
    results: &[QueryResult],
) -> Vec<PlatformSummary> {
    platforms
        .iter()
        .map(|&platform| {
            let (succeeded, failed) = results
                .iter()
                .filter(|r| r.task.platform == platform)
                .fold((0, 0), |(ok, err), r| {
                    if r.is_success() {
                        (ok + 1, err)
                    } else {
                        (ok, err + 1)
                    }
                });
            PlatformSummary {
                platform,
                succeeded,
                failed,
            }
        })
        .collect()
}
