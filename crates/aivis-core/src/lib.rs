//! Shared domain types and configuration for the AI visibility analyzer.
//!
//! Holds the prompt/task/result model that flows through the query runner,
//! environment-driven [`AppConfig`], the YAML analysis profile and industry
//! templates, and the [`PromptSet`] generator.

pub mod app_config;
pub mod config;
pub mod error;
pub mod industries;
pub mod profile;
pub mod prompts;
pub mod types;

pub use app_config::{AppConfig, Environment, ScoreWeights};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use industries::{load_industries, IndustryTemplate, IndustryTemplates};
pub use profile::{load_profile, AnalysisProfile};
pub use prompts::{PromptGenerator, PromptSet};
pub use types::{
    ErrorKind, PlatformId, Prompt, PromptCategory, QueryOutcome, QueryResult, QueryTask, TaskKey,
};
