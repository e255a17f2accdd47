//! End-to-end runs of the analysis pipeline against scripted platforms.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use aivis_analysis::{
    AnalysisError, AnalysisPipeline, InMemorySessionStore, LexiconSentiment, MentionExtractor,
    SessionStore, VisibilityScorer,
};
use aivis_core::{
    AnalysisProfile, ConfigError, ErrorKind, PlatformId, PromptCategory, PromptSet, QueryOutcome,
    ScoreWeights,
};
use aivis_platforms::{ClientMap, PlatformClient, PlatformError, Progress, ProgressFn, QueryRunner};
use async_trait::async_trait;

struct Scripted {
    platform: PlatformId,
    reply: &'static str,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl PlatformClient for Scripted {
    fn platform(&self) -> PlatformId {
        self.platform
    }

    async fn send(&self, _prompt: &str) -> Result<String, PlatformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(self.reply.to_owned())
    }
}

fn profile(platforms: Vec<PlatformId>) -> AnalysisProfile {
    AnalysisProfile {
        brand: "BrandX".to_owned(),
        industry: "FinTech".to_owned(),
        location: None,
        prompt_count: 3,
        platforms,
        competitors: vec!["Stripe".to_owned()],
        competitor_prompts: false,
    }
}

fn prompts() -> PromptSet {
    PromptSet::new(vec![
        (PromptCategory::Recommendation, "Best payment platform?".to_owned()),
        (PromptCategory::DirectComparison, "Top 5 payment gateways?".to_owned()),
        (PromptCategory::BuyingJourney, "Which processor should a startup use?".to_owned()),
    ])
}

struct Harness {
    pipeline: AnalysisPipeline,
    store: Arc<InMemorySessionStore>,
    calls: Arc<AtomicUsize>,
}

/// Platform A answers with BrandX at once; platform B never answers in time.
fn harness() -> Harness {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut clients = ClientMap::new();
    clients.insert(
        PlatformId::OpenAi,
        Arc::new(Scripted {
            platform: PlatformId::OpenAi,
            reply: "1. BrandX is reliable and popular.\n2. Stripe is another option.",
            delay: Duration::from_millis(1),
            calls: Arc::clone(&calls),
        }) as Arc<dyn PlatformClient>,
    );
    clients.insert(
        PlatformId::Gemini,
        Arc::new(Scripted {
            platform: PlatformId::Gemini,
            reply: "BrandX",
            delay: Duration::from_secs(30),
            calls: Arc::clone(&calls),
        }) as Arc<dyn PlatformClient>,
    );

    let store = Arc::new(InMemorySessionStore::new());
    let pipeline = AnalysisPipeline::new(
        QueryRunner::new(clients, Duration::from_millis(100)),
        MentionExtractor::new(Arc::new(LexiconSentiment)),
        VisibilityScorer::new(ScoreWeights::default()),
        Arc::clone(&store) as Arc<dyn SessionStore>,
        4,
    );

    Harness {
        pipeline,
        store,
        calls,
    }
}

fn no_progress() -> ProgressFn {
    Arc::new(|_| {})
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn timed_out_platform_is_flagged_while_other_platform_scores() {
    let h = harness();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let on_progress: ProgressFn = Arc::new(move |p: Progress| sink.lock().unwrap().push(p.completed));

    let report = h
        .pipeline
        .run_analysis(
            &profile(vec![PlatformId::OpenAi, PlatformId::Gemini]),
            &prompts(),
            on_progress,
        )
        .await
        .expect("run should succeed despite platform failures");

    assert_eq!(report.results.len(), 6);
    let (ok, timed_out): (Vec<_>, Vec<_>) = report.results.iter().partition(|r| r.is_success());
    assert_eq!(ok.len(), 3);
    assert!(ok.iter().all(|r| r.task.platform == PlatformId::OpenAi));
    assert_eq!(timed_out.len(), 3);
    for r in &timed_out {
        assert_eq!(r.task.platform, PlatformId::Gemini);
        assert!(matches!(
            r.outcome,
            QueryOutcome::Failure {
                kind: ErrorKind::Timeout,
                ..
            }
        ));
    }

    let a = report.score_for("BrandX", PlatformId::OpenAi).unwrap();
    assert_eq!(a.mention_rate, 1.0);
    assert_eq!(a.avg_position, Some(1.0));
    assert!(!a.insufficient_data);

    let b = report.score_for("BrandX", PlatformId::Gemini).unwrap();
    assert_eq!(b.mention_rate, 0.0);
    assert_eq!(b.weighted_score, 0.0);
    assert!(b.insufficient_data);

    let composite = report.brand_composite().unwrap();
    assert_eq!(composite.platforms_with_data, 1);
    assert!((composite.score - a.weighted_score).abs() < 1e-9);

    // Three responses, each naming BrandX and Stripe once.
    assert_eq!(report.mentions.len(), 6);
    assert_eq!(report.competitive_rank, Some(1));
    assert!((report.weights.sum() - 1.0).abs() < 1e-9);
    assert!(!report.partial);

    let gemini = report
        .platform_summaries
        .iter()
        .find(|s| s.platform == PlatformId::Gemini)
        .unwrap();
    assert!(gemini.unavailable());

    assert_eq!(*seen.lock().unwrap(), (1..=6).collect::<Vec<_>>());

    let stored = h.store.get(report.run_id).expect("report saved in session");
    assert_eq!(stored.run_id, report.run_id);
    assert_eq!(h.store.latest().map(|r| r.run_id), Some(report.run_id));
}

#[tokio::test]
async fn invalid_profile_fails_before_any_call() {
    let h = harness();
    let mut bad = profile(vec![PlatformId::OpenAi]);
    bad.brand = "  ".to_owned();

    let err = h
        .pipeline
        .run_analysis(&bad, &prompts(), no_progress())
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::Config(ConfigError::Validation(_))));
    assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn platform_without_client_fails_before_any_call() {
    let h = harness();

    let err = h
        .pipeline
        .run_analysis(
            &profile(vec![PlatformId::OpenAi, PlatformId::Perplexity]),
            &prompts(),
            no_progress(),
        )
        .await
        .unwrap_err();

    assert!(
        matches!(&err, AnalysisError::Config(ConfigError::MissingEnvVar(v)) if v == "PERPLEXITY_API_KEY"),
        "got {err:?}"
    );
    assert_eq!(h.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_prompt_set_is_rejected() {
    let h = harness();
    let err = h
        .pipeline
        .run_analysis(&profile(vec![PlatformId::OpenAi]), &PromptSet::default(), no_progress())
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::Config(_)));
}
