use aivis_core::PlatformId;
use async_trait::async_trait;
use reqwest::Client;

use crate::chat::{ChatMessage, ChatRequest, ChatResponse};
use crate::client::PlatformClient;
use crate::error::PlatformError;
use crate::http::{build_http_client, endpoint, send_json};

const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";
const MODEL: &str = "sonar";
const SYSTEM_PROMPT: &str = "Be precise and concise in your response.";

/// Client for Perplexity's OpenAI-compatible chat completions API.
///
/// Requests are restricted to the last month of search results and ask for
/// text only (no images or related questions).
pub struct PerplexityClient {
    client: Client,
    api_key: String,
    url: String,
}

impl PerplexityClient {
    /// # Errors
    ///
    /// Returns [`PlatformError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, PlatformError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client against a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, PlatformError> {
        Ok(Self {
            client: build_http_client(timeout_secs)?,
            api_key: api_key.to_owned(),
            url: endpoint(base_url, "chat/completions"),
        })
    }
}

#[async_trait]
impl PlatformClient for PerplexityClient {
    fn platform(&self) -> PlatformId {
        PlatformId::Perplexity
    }

    async fn send(&self, prompt: &str) -> Result<String, PlatformError> {
        let mut body = ChatRequest::new(
            MODEL,
            vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        );
        body.top_p = Some(0.9);
        body.return_images = Some(false);
        body.return_related_questions = Some(false);
        body.search_recency_filter = Some("month");
        body.stream = Some(false);

        let request = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body);

        let response: ChatResponse = send_json(request, "perplexity chat completion").await?;
        response.into_text("perplexity")
    }
}
