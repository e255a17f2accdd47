//! Analysis pipeline orchestration.

use std::collections::HashMap;
use std::sync::Arc;

use aivis_core::{AnalysisProfile, ConfigError, PromptSet, QueryResult, QueryTask, TaskKey};
use aivis_platforms::{ProgressFn, QueryRunner};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use uuid::Uuid;

use crate::error::AnalysisError;
use crate::extractor::{EntitySet, Mention, MentionExtractor};
use crate::insights::derive_insights;
use crate::report::{summarize_platforms, AnalysisReport};
use crate::session::SessionStore;
use crate::visibility::VisibilityScorer;

/// Responses scored for sentiment concurrently.
const EXTRACT_CONCURRENCY: usize = 8;

/// Runs one analysis end to end and files the report in the session store.
pub struct AnalysisPipeline {
    runner: QueryRunner,
    extractor: MentionExtractor,
    scorer: VisibilityScorer,
    store: Arc<dyn SessionStore>,
    max_workers: usize,
}

impl AnalysisPipeline {
    #[must_use]
    pub fn new(
        runner: QueryRunner,
        extractor: MentionExtractor,
        scorer: VisibilityScorer,
        store: Arc<dyn SessionStore>,
        max_workers: usize,
    ) -> Self {
        Self {
            runner,
            extractor,
            scorer,
            store,
            max_workers,
        }
    }

    /// Run the full analysis for one profile.
    ///
    /// 1. Validate the profile and client coverage. Nothing is sent on error.
    /// 2. Fan the prompts out to every profile platform.
    /// 3. Extract mentions from each successful response.
    /// 4. Score, derive insights, and save the report.
    ///
    /// Individual call failures never fail the run; they appear as `Failure`
    /// results and degrade that platform's rows.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Config`] for an invalid profile, an empty
    /// prompt set, or a platform without a client, and
    /// [`AnalysisError::InvalidEntity`] for an unmatchable entity name.
    pub async fn run_analysis(
        &self,
        profile: &AnalysisProfile,
        prompts: &PromptSet,
        on_progress: ProgressFn,
    ) -> Result<Arc<AnalysisReport>, AnalysisError> {
        profile.validate()?;
        if prompts.is_empty() {
            return Err(ConfigError::Validation("prompt set is empty".to_owned()).into());
        }
        if let Some(missing) = profile
            .platforms
            .iter()
            .find(|p| !self.runner.clients().contains_key(*p))
        {
            return Err(ConfigError::MissingEnvVar(missing.api_key_var().to_owned()).into());
        }

        let entity_names = profile.entities();
        let entities = EntitySet::new(entity_names.as_slice())?;
        let (brand, competitors) = entity_names
            .split_first()
            .map(|(b, c)| (b.as_str(), c))
            .ok_or_else(|| ConfigError::Validation("brand name must be non-empty".to_owned()))?;

        let run_id = Uuid::new_v4();
        let tasks = QueryTask::fan_out(prompts.prompts(), &profile.platforms);
        tracing::info!(
            %run_id,
            brand,
            prompts = prompts.len(),
            platforms = profile.platforms.len(),
            tasks = tasks.len(),
            "starting analysis run"
        );

        let output = self.runner.run(tasks, self.max_workers, on_progress).await;
        let mut results = output.results;
        results.sort_by_key(|r| r.task);

        let mentions_by_response = self.extract_all(&results, &entities).await;

        let visibility = self.scorer.score(
            &mentions_by_response,
            &profile.platforms,
            brand,
            competitors,
        );

        let mut mentions: Vec<Mention> = Vec::new();
        let mut keys: Vec<&TaskKey> = mentions_by_response.keys().collect();
        keys.sort();
        for key in keys {
            mentions.extend(mentions_by_response[key].iter().cloned());
        }

        let insights = derive_insights(&visibility, &mentions, brand, competitors);
        let platform_summaries = summarize_platforms(&profile.platforms, &results);

        for summary in platform_summaries.iter().filter(|s| s.unavailable()) {
            tracing::warn!(platform = %summary.platform, failed = summary.failed, "platform returned no usable responses");
        }

        let report = Arc::new(AnalysisReport {
            run_id,
            generated_at: Utc::now(),
            brand: brand.to_owned(),
            competitors: competitors.to_vec(),
            industry: profile.industry.clone(),
            location: profile.location.clone(),
            platforms: profile.platforms.clone(),
            prompts: prompts.iter().cloned().collect(),
            sentiment_scorer: self.extractor.sentiment_scorer().to_owned(),
            weights: visibility.weights,
            platform_weights: visibility.platform_weights,
            scores: visibility.scores,
            composite: visibility.composite,
            competitive_rank: visibility.competitive_rank,
            platform_summaries,
            results,
            mentions,
            platform_comparisons: insights.platform_comparisons,
            market_position: insights.market_position,
            insights: insights.insights,
            recommendations: insights.recommendations,
            partial: output.partial,
        });

        self.store.save(Arc::clone(&report));
        tracing::info!(
            %run_id,
            rank = ?report.competitive_rank,
            partial = report.partial,
            "analysis run complete"
        );

        Ok(report)
    }

    /// One map entry per successful response, possibly empty.
    async fn extract_all(
        &self,
        results: &[QueryResult],
        entities: &EntitySet,
    ) -> HashMap<TaskKey, Vec<Mention>> {
        stream::iter(results.iter().filter_map(|r| r.text().map(|t| (r.task, t))))
            .map(|(key, text)| async move { (key, self.extractor.extract(key, text, entities).await) })
            .buffer_unordered(EXTRACT_CONCURRENCY)
            .collect()
            .await
    }
}
