//! `analyze` and `prompts` command handlers.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use aivis_analysis::{
    select_sentiment_scorer, AnalysisPipeline, InMemorySessionStore, MentionExtractor,
    VisibilityScorer,
};
use aivis_core::{load_industries, load_profile, AnalysisProfile, AppConfig, IndustryTemplates, PromptSet};
use aivis_platforms::{build_clients, Progress, ProgressFn, QueryRunner};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::render;
use crate::OutputFormat;

/// Industry templates from the configured file, or none if it is absent.
///
/// A missing file is not fatal: every industry then uses the generic
/// vocabulary. A present but invalid file is.
fn load_templates(config: &AppConfig) -> anyhow::Result<IndustryTemplates> {
    if config.industries_path.exists() {
        Ok(load_industries(&config.industries_path)?)
    } else {
        tracing::warn!(
            path = %config.industries_path.display(),
            "industry templates file not found, using generic vocabulary"
        );
        Ok(IndustryTemplates::default())
    }
}

fn load_inputs(
    config: &AppConfig,
    profile_path: Option<&Path>,
    seed: Option<u64>,
) -> anyhow::Result<(AnalysisProfile, PromptSet)> {
    let profile = load_profile(profile_path.unwrap_or(&config.profile_path))?;
    profile.validate()?;
    let templates = load_templates(config)?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let prompts = PromptSet::for_profile(&profile, &templates, &mut rng);
    Ok((profile, prompts))
}

fn progress_printer() -> ProgressFn {
    Arc::new(|p: Progress| {
        let platform = p.last_platform.map_or("-", |pl| pl.as_str());
        eprintln!("  [{}/{}] {platform}", p.completed, p.total);
    })
}

/// Run a full analysis and print the report.
///
/// # Errors
///
/// Returns an error if the profile or templates cannot be loaded, a profile
/// platform has no API key, or the report cannot be written. Individual
/// platform failures only degrade the report.
pub(crate) async fn run_analyze(
    config: &AppConfig,
    profile_path: Option<&Path>,
    format: OutputFormat,
    output: Option<&Path>,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let (profile, prompts) = load_inputs(config, profile_path, seed)?;
    let clients = build_clients(config, &profile.platforms)?;

    let call_timeout = Duration::from_secs(config.request_timeout_secs);
    let mut runner = QueryRunner::new(clients, call_timeout);
    if let Some(secs) = config.run_deadline_secs {
        runner = runner.with_run_deadline(Duration::from_secs(secs));
    }

    let sentiment = select_sentiment_scorer(config.sentiment_model_url.as_deref(), call_timeout).await;
    let scorer = VisibilityScorer::new(config.score_weights)
        .with_platform_weights(config.platform_weights.clone());

    let pipeline = AnalysisPipeline::new(
        runner,
        MentionExtractor::new(sentiment),
        scorer,
        Arc::new(InMemorySessionStore::new()),
        config.max_workers,
    );

    eprintln!(
        "Analyzing {} with {} prompts across {} platform(s)...",
        profile.brand,
        prompts.len(),
        profile.platforms.len()
    );
    let report = pipeline
        .run_analysis(&profile, &prompts, progress_printer())
        .await?;

    match format {
        OutputFormat::Table => render::print_report(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report.as_ref())?),
    }

    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(report.as_ref())?)?;
        eprintln!("Report written to {}", path.display());
    }

    Ok(())
}

/// Print the generated prompt set without contacting any platform.
///
/// # Errors
///
/// Returns an error if the profile or templates cannot be loaded.
pub(crate) fn run_prompts(
    config: &AppConfig,
    profile_path: Option<&Path>,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let (profile, prompts) = load_inputs(config, profile_path, seed)?;

    println!(
        "{} prompts for {} ({}):",
        prompts.len(),
        profile.brand,
        profile.industry
    );
    for prompt in prompts.iter() {
        println!("  {:>3}. [{}] {}", prompt.id + 1, prompt.category, prompt.text);
    }
    Ok(())
}
