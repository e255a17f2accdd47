use aivis_core::ErrorKind;
use thiserror::Error;

/// Failure of a single platform call.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("authentication rejected (HTTP {status})")]
    Auth { status: u16 },

    #[error("rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("request timed out")]
    Timeout,

    #[error("unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The response parsed but carried no usable text.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl PlatformError {
    /// Coarse class recorded on the failed `QueryResult`.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlatformError::Http(e) if e.is_timeout() => ErrorKind::Timeout,
            PlatformError::Http(e) if e.is_decode() => ErrorKind::Malformed,
            PlatformError::Http(e) => match e.status().map(|s| s.as_u16()) {
                Some(401 | 403) => ErrorKind::AuthError,
                Some(429) => ErrorKind::RateLimited,
                _ => ErrorKind::Unknown,
            },
            PlatformError::Auth { .. } => ErrorKind::AuthError,
            PlatformError::RateLimited { .. } => ErrorKind::RateLimited,
            PlatformError::Timeout => ErrorKind::Timeout,
            PlatformError::UnexpectedStatus { .. } => ErrorKind::Unknown,
            PlatformError::Deserialize { .. } | PlatformError::Malformed(_) => ErrorKind::Malformed,
        }
    }
}
