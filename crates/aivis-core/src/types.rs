use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Conversational-AI provider queried during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformId {
    OpenAi,
    Gemini,
    Perplexity,
}

impl PlatformId {
    pub const ALL: [PlatformId; 3] = [PlatformId::OpenAi, PlatformId::Gemini, PlatformId::Perplexity];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PlatformId::OpenAi => "openai",
            PlatformId::Gemini => "gemini",
            PlatformId::Perplexity => "perplexity",
        }
    }

    /// Environment variable holding this platform's API key.
    #[must_use]
    pub fn api_key_var(self) -> &'static str {
        match self {
            PlatformId::OpenAi => "OPENAI_API_KEY",
            PlatformId::Gemini => "GEMINI_API_KEY",
            PlatformId::Perplexity => "PERPLEXITY_API_KEY",
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "chatgpt" => Ok(PlatformId::OpenAi),
            "gemini" => Ok(PlatformId::Gemini),
            "perplexity" => Ok(PlatformId::Perplexity),
            other => Err(format!("unknown platform '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptCategory {
    DirectComparison,
    Recommendation,
    ProblemSolving,
    FeatureSpecific,
    BuyingJourney,
    CompetitorComparison,
}

impl fmt::Display for PromptCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PromptCategory::DirectComparison => "direct_comparison",
            PromptCategory::Recommendation => "recommendation",
            PromptCategory::ProblemSolving => "problem_solving",
            PromptCategory::FeatureSpecific => "feature_specific",
            PromptCategory::BuyingJourney => "buying_journey",
            PromptCategory::CompetitorComparison => "competitor_comparison",
        };
        f.write_str(s)
    }
}

/// A generated prompt. `id` is its index in the owning [`crate::PromptSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: u32,
    pub text: String,
    pub category: PromptCategory,
}

/// Identity of one fan-out cell; also used as the response id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskKey {
    pub prompt_id: u32,
    pub platform: PlatformId,
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.platform, self.prompt_id)
    }
}

/// One (prompt, platform) pair to be queried exactly once.
#[derive(Debug, Clone)]
pub struct QueryTask {
    pub prompt: Arc<Prompt>,
    pub platform: PlatformId,
}

impl QueryTask {
    #[must_use]
    pub fn new(prompt: Arc<Prompt>, platform: PlatformId) -> Self {
        Self { prompt, platform }
    }

    #[must_use]
    pub fn key(&self) -> TaskKey {
        TaskKey {
            prompt_id: self.prompt.id,
            platform: self.platform,
        }
    }

    /// Build the full prompt × platform grid, platform-major.
    #[must_use]
    pub fn fan_out(prompts: &[Arc<Prompt>], platforms: &[PlatformId]) -> Vec<QueryTask> {
        platforms
            .iter()
            .flat_map(|&platform| {
                prompts
                    .iter()
                    .map(move |prompt| QueryTask::new(Arc::clone(prompt), platform))
            })
            .collect()
    }
}

/// Coarse failure class reported for a platform call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AuthError,
    RateLimited,
    Timeout,
    Malformed,
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::AuthError => "auth_error",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Malformed => "malformed",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryOutcome {
    Success { text: String },
    Failure { kind: ErrorKind, message: String },
}

/// Outcome of a single [`QueryTask`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub task: TaskKey,
    pub prompt: String,
    pub outcome: QueryOutcome,
    pub latency_ms: u64,
}

impl QueryResult {
    #[must_use]
    pub fn success(task: &QueryTask, text: String, latency_ms: u64) -> Self {
        Self {
            task: task.key(),
            prompt: task.prompt.text.clone(),
            outcome: QueryOutcome::Success { text },
            latency_ms,
        }
    }

    #[must_use]
    pub fn failure(
        task: &QueryTask,
        kind: ErrorKind,
        message: impl Into<String>,
        latency_ms: u64,
    ) -> Self {
        Self {
            task: task.key(),
            prompt: task.prompt.text.clone(),
            outcome: QueryOutcome::Failure {
                kind,
                message: message.into(),
            },
            latency_ms,
        }
    }

    /// Response text when the call succeeded.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.outcome {
            QueryOutcome::Success { text } => Some(text),
            QueryOutcome::Failure { .. } => None,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, QueryOutcome::Success { .. })
    }
}
