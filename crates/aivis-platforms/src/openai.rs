use aivis_core::PlatformId;
use async_trait::async_trait;
use reqwest::Client;

use crate::chat::{ChatMessage, ChatRequest, ChatResponse};
use crate::client::PlatformClient;
use crate::error::PlatformError;
use crate::http::{build_http_client, endpoint, send_json};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const MODEL: &str = "gpt-4o";

/// Client for OpenAI's chat completions API.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    url: String,
}

impl OpenAiClient {
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
            url: endpoint(base_url, "v1/chat/completions"),
        })
    }
}

#[async_trait]
impl PlatformClient for OpenAiClient {
    fn platform(&self) -> PlatformId {
        PlatformId::OpenAi
    }

    async fn send(&self, prompt: &str) -> Result<String, PlatformError> {
        let body = ChatRequest::new(
            MODEL,
            vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        );
        let request = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body);

        let response: ChatResponse = send_json(request, "openai chat completion").await?;
        response.into_text("openai")
    }
}
