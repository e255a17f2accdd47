//! Conversational-AI platform clients and the concurrent query runner.
//!
//! Each provider sits behind the [`PlatformClient`] capability ("send prompt,
//! get text or error"). [`QueryRunner`] fans a batch of prompt × platform
//! tasks out over a bounded worker pool, isolating per-call failures and
//! reporting progress through a serialized [`ProgressTracker`].

pub mod client;
pub mod error;
pub mod progress;
pub mod runner;
pub mod status;

mod chat;
mod gemini;
mod http;
mod openai;
mod perplexity;

pub use client::{build_clients, ClientMap, PlatformClient};
pub use error::PlatformError;
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
pub use perplexity::PerplexityClient;
pub use progress::{Progress, ProgressFn, ProgressTracker};
pub use runner::{QueryRunner, RunOutput, MAX_WORKERS};
pub use status::{check_connectivity, PlatformStatus};
