//! Mention extraction, visibility scoring, and the end-to-end analysis run.
//!
//! Responses collected by the query runner are scanned for the brand and its
//! competitors, scored per platform, and assembled into an
//! [`AnalysisReport`] that is filed in an injected [`SessionStore`].

pub mod error;
pub mod extractor;
pub mod insights;
pub mod pipeline;
pub mod report;
pub mod sentiment;
pub mod session;
pub mod visibility;

pub use error::{AnalysisError, SentimentError};
pub use extractor::{EntitySet, Mention, MentionExtractor};
pub use insights::{
    compare_platforms, derive_insights, Insights, MarketPosition, PlatformComparison,
    PlatformStanding,
};
pub use pipeline::AnalysisPipeline;
pub use report::{AnalysisReport, PlatformSummary};
pub use sentiment::{
    lexicon_score, select_sentiment_scorer, LexiconSentiment, ModelSentiment, SentimentScorer,
};
pub use session::{InMemorySessionStore, SessionStore};
pub use visibility::{
    position_score, CompositeScore, VisibilityReport, VisibilityScore, VisibilityScorer,
};
