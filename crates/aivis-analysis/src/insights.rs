//! Human-readable findings and recommendations derived from a scored run.

use std::fmt;

use aivis_core::PlatformId;
use serde::{Deserialize, Serialize};

use crate::extractor::Mention;
use crate::visibility::VisibilityReport;

/// Brand vs competitor-average mentions on one platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformStanding {
    Leading,
    Competitive,
    Lagging,
}

impl PlatformStanding {
    /// Ratio above 1.2 leads, above 0.8 is competitive.
    #[must_use]
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > 1.2 {
            Self::Leading
        } else if ratio > 0.8 {
            Self::Competitive
        } else {
            Self::Lagging
        }
    }
}

impl fmt::Display for PlatformStanding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Leading => "leading",
            Self::Competitive => "competitive",
            Self::Lagging => "lagging",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformComparison {
    pub platform: PlatformId,
    pub brand_mentions: usize,
    pub avg_competitor_mentions: f64,
    /// `None` when no competitor was mentioned on this platform.
    pub performance_ratio: Option<f64>,
    pub standing: PlatformStanding,
}

/// Label for the brand's composite visibility score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketPosition {
    MarketLeader,
    StrongCompetitor,
    EmergingPlayer,
    NichePresence,
}

impl MarketPosition {
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::MarketLeader
        } else if score >= 60.0 {
            Self::StrongCompetitor
        } else if score >= 40.0 {
            Self::EmergingPlayer
        } else {
            Self::NichePresence
        }
    }
}

impl fmt::Display for MarketPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MarketLeader => "Market Leader",
            Self::StrongCompetitor => "Strong Competitor",
            Self::EmergingPlayer => "Emerging Player",
            Self::NichePresence => "Niche Presence",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Insights {
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
    /// Empty when there are no competitors.
    pub platform_comparisons: Vec<PlatformComparison>,
    /// `None` when the brand has no composite score.
    pub market_position: Option<MarketPosition>,
}

fn label(platform: PlatformId) -> String {
    platform.as_str().to_uppercase()
}

fn total_mentions(report: &VisibilityReport, entity: &str) -> usize {
    report.rows_for(entity).map(|r| r.mentioned_in).sum()
}

fn mentions_on(report: &VisibilityReport, entity: &str, platform: PlatformId) -> usize {
    report
        .score_for(entity, platform)
        .map_or(0, |r| r.mentioned_in)
}

/// Per-platform standing of the brand against the competitor average.
///
/// Platforms without data are skipped.
#[must_use]
pub fn compare_platforms(
    report: &VisibilityReport,
    brand: &str,
    competitors: &[String],
) -> Vec<PlatformComparison> {
    if competitors.is_empty() {
        return Vec::new();
    }

    report
        .rows_for(brand)
        .filter(|r| !r.insufficient_data)
        .map(|row| {
            let competitor_total: usize = competitors
                .iter()
                .map(|c| mentions_on(report, c, row.platform))
                .sum();
            #[allow(clippy::cast_precision_loss)]
            let avg = competitor_total as f64 / competitors.len() as f64;
            #[allow(clippy::cast_precision_loss)]
            let performance_ratio = (avg > 0.0).then(|| row.mentioned_in as f64 / avg);
            let standing = match performance_ratio {
                Some(ratio) => PlatformStanding::from_ratio(ratio),
                None if row.mentioned_in > 0 => PlatformStanding::Leading,
                None => PlatformStanding::Competitive,
            };
            PlatformComparison {
                platform: row.platform,
                brand_mentions: row.mentioned_in,
                avg_competitor_mentions: avg,
                performance_ratio,
                standing,
            }
        })
        .collect()
}

/// Build insight and recommendation lines for `brand`.
#[must_use]
pub fn derive_insights(
    report: &VisibilityReport,
    mentions: &[Mention],
    brand: &str,
    competitors: &[String],
) -> Insights {
    let mut insights = Vec::new();
    let mut recommendations = Vec::new();

    let brand_total = total_mentions(report, brand);
    if brand_total == 0 {
        insights.push(
            "No brand mentions found across AI platforms, indicating zero AI visibility".to_owned(),
        );
    } else if brand_total < 5 {
        insights.push("Low brand mention frequency suggests limited AI platform visibility".to_owned());
    } else if brand_total >= 20 {
        insights.push("Strong brand mention frequency indicates good AI platform visibility".to_owned());
    }

    for row in report.rows_for(brand).filter(|r| r.insufficient_data) {
        insights.push(format!(
            "{} returned no usable responses and was excluded from the composite score",
            label(row.platform)
        ));
    }

    // Strongest and weakest among platforms that answered.
    let answered: Vec<_> = report.rows_for(brand).filter(|r| !r.insufficient_data).collect();
    let best = answered
        .iter()
        .max_by_key(|r| r.mentioned_in)
        .filter(|r| r.mentioned_in > 0);
    let worst = answered.iter().min_by_key(|r| r.mentioned_in);
    if let (Some(best), Some(worst)) = (best, worst) {
        insights.push(format!(
            "{} is your strongest platform with {} mentions",
            label(best.platform),
            best.mentioned_in
        ));
        if best.platform != worst.platform && worst.mentioned_in * 2 < best.mentioned_in {
            insights.push(format!(
                "{} shows significant room for improvement",
                label(worst.platform)
            ));
            recommendations.push(format!(
                "Develop targeted content strategy for {} to improve visibility",
                label(worst.platform)
            ));
        }
    }

    let leader = competitors
        .iter()
        .map(|c| (c, total_mentions(report, c)))
        .filter(|(_, n)| *n > brand_total)
        .max_by_key(|(_, n)| *n);
    if let Some((name, n)) = leader {
        insights.push(format!("{name} leads in AI visibility with {n} mentions"));
    }

    let ranks: Vec<u32> = mentions
        .iter()
        .filter(|m| m.entity == brand)
        .filter_map(|m| m.list_rank)
        .collect();
    let avg_rank = if ranks.is_empty() {
        None
    } else {
        #[allow(clippy::cast_precision_loss)]
        let n = ranks.len() as f64;
        Some(ranks.iter().map(|&r| f64::from(r)).sum::<f64>() / n)
    };
    if let Some(avg) = avg_rank {
        if avg <= 2.0 {
            insights.push("Excellent ranking position, typically appearing in the top 2 results".to_owned());
        } else if avg <= 5.0 {
            insights.push("Good ranking position but opportunity to reach the top 3".to_owned());
        } else {
            insights.push(
                "Low ranking position; focus needed on improving result placement".to_owned(),
            );
        }
    }

    if brand_total < 10 {
        recommendations.push(
            "Increase content production and SEO efforts to improve AI platform indexing".to_owned(),
        );
    }
    if avg_rank.is_some_and(|avg| avg > 3.0) {
        recommendations.push("Optimize content for featured snippets and AI-friendly formats".to_owned());
    }
    if let Some((name, _)) = leader {
        recommendations.push(format!("Analyze {name}'s content strategy and digital presence"));
    }
    if mentions.iter().any(|m| m.entity == brand && m.sentiment < 0.0) {
        recommendations.push(
            "Address negative sentiment through improved brand messaging and PR".to_owned(),
        );
    }

    let platform_comparisons = compare_platforms(report, brand, competitors);
    let lagging: Vec<String> = platform_comparisons
        .iter()
        .filter(|c| c.standing == PlatformStanding::Lagging)
        .map(|c| label(c.platform))
        .collect();
    if !lagging.is_empty() {
        insights.push(format!("Lagging behind competitors on {}", lagging.join(", ")));
    }

    let market_position = report
        .composite_for(brand)
        .filter(|c| !c.insufficient_data)
        .map(|c| MarketPosition::from_score(c.score));
    if let Some(position) = market_position {
        insights.push(format!("Overall market position: {position}"));
    }

    recommendations.push("Regularly monitor AI platform responses to track visibility changes".to_owned());
    recommendations.push("Create AI-friendly content that answers common industry questions".to_owned());

    Insights {
        insights,
        recommendations,
        platform_comparisons,
        market_position,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use aivis_core::{ScoreWeights, TaskKey};

    use super::*;
    use crate::visibility::VisibilityScorer;

    fn mention(entity: &str, key: TaskKey, list_rank: Option<u32>, sentiment: f32) -> Mention {
        Mention {
            entity: entity.to_owned(),
            response_id: key,
            position: 1,
            list_rank,
            sentiment,
            context_snippet: String::new(),
        }
    }

    #[test]
    fn zero_visibility_is_called_out() {
        let mut map = HashMap::new();
        map.insert(
            TaskKey {
                prompt_id: 0,
                platform: PlatformId::OpenAi,
            },
            Vec::new(),
        );
        let report = VisibilityScorer::new(ScoreWeights::default()).score(
            &map,
            &[PlatformId::OpenAi, PlatformId::Gemini],
            "BrandX",
            &[],
        );

        let out = derive_insights(&report, &[], "BrandX", &[]);

        assert!(out.insights[0].contains("zero AI visibility"));
        assert!(out.insights.iter().any(|i| i.starts_with("GEMINI returned no usable")));
        assert!(out
            .recommendations
            .iter()
            .any(|r| r.contains("Increase content production")));
        assert_eq!(
            out.recommendations.last().map(String::as_str),
            Some("Create AI-friendly content that answers common industry questions")
        );
    }

    #[test]
    fn leading_competitor_and_weak_platform() {
        let mut map = HashMap::new();
        let mut all = Vec::new();
        for id in 0..4 {
            let a = TaskKey {
                prompt_id: id,
                platform: PlatformId::OpenAi,
            };
            let b = TaskKey {
                prompt_id: id,
                platform: PlatformId::Perplexity,
            };
            let on_a = vec![mention("BrandX", a, Some(4), -0.3), mention("Stripe", a, Some(1), 0.5)];
            let on_b = vec![mention("Stripe", b, Some(1), 0.5)];
            all.extend(on_a.clone());
            all.extend(on_b.clone());
            map.insert(a, on_a);
            map.insert(b, on_b);
        }
        let competitors = vec!["Stripe".to_owned()];
        let report = VisibilityScorer::new(ScoreWeights::default()).score(
            &map,
            &[PlatformId::OpenAi, PlatformId::Perplexity],
            "BrandX",
            &competitors,
        );

        let out = derive_insights(&report, &all, "BrandX", &competitors);

        assert!(out.insights.contains(&"OPENAI is your strongest platform with 4 mentions".to_owned()));
        assert!(out.insights.contains(&"PERPLEXITY shows significant room for improvement".to_owned()));
        assert!(out.insights.contains(&"Stripe leads in AI visibility with 8 mentions".to_owned()));
        assert!(out.insights.iter().any(|i| i.starts_with("Good ranking position")));
        assert!(out.recommendations.iter().any(|r| r.contains("featured snippets")));
        assert!(out.recommendations.iter().any(|r| r.contains("negative sentiment")));
        assert!(out.recommendations.iter().any(|r| r.starts_with("Analyze Stripe's")));

        let standings: Vec<(PlatformId, PlatformStanding)> = out
            .platform_comparisons
            .iter()
            .map(|c| (c.platform, c.standing))
            .collect();
        assert_eq!(
            standings,
            vec![
                (PlatformId::OpenAi, PlatformStanding::Competitive),
                (PlatformId::Perplexity, PlatformStanding::Lagging),
            ]
        );
        assert!(out.insights.contains(&"Lagging behind competitors on PERPLEXITY".to_owned()));
        assert!(out.market_position.is_some());
    }

    #[test]
    fn standing_thresholds() {
        assert_eq!(PlatformStanding::from_ratio(1.5), PlatformStanding::Leading);
        assert_eq!(PlatformStanding::from_ratio(1.2), PlatformStanding::Competitive);
        assert_eq!(PlatformStanding::from_ratio(0.9), PlatformStanding::Competitive);
        assert_eq!(PlatformStanding::from_ratio(0.8), PlatformStanding::Lagging);
    }

    #[test]
    fn market_position_labels() {
        assert_eq!(MarketPosition::from_score(85.0), MarketPosition::MarketLeader);
        assert_eq!(MarketPosition::from_score(60.0), MarketPosition::StrongCompetitor);
        assert_eq!(MarketPosition::from_score(45.5), MarketPosition::EmergingPlayer);
        assert_eq!(MarketPosition::from_score(10.0).to_string(), "Niche Presence");
    }

    #[test]
    fn brand_alone_on_a_platform_is_leading() {
        let key = TaskKey {
            prompt_id: 0,
            platform: PlatformId::Gemini,
        };
        let mut map = HashMap::new();
        map.insert(key, vec![mention("BrandX", key, None, 0.2)]);
        let competitors = vec!["Stripe".to_owned()];
        let report = VisibilityScorer::new(ScoreWeights::default()).score(
            &map,
            &[PlatformId::Gemini, PlatformId::Perplexity],
            "BrandX",
            &competitors,
        );

        let comparisons = compare_platforms(&report, "BrandX", &competitors);

        assert_eq!(comparisons.len(), 1, "platform without data is skipped");
        assert_eq!(comparisons[0].standing, PlatformStanding::Leading);
        assert_eq!(comparisons[0].performance_ratio, None);
        assert!(compare_platforms(&report, "BrandX", &[]).is_empty());
    }
}
