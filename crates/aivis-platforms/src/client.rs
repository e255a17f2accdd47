use std::collections::HashMap;
use std::sync::Arc;

use aivis_core::{AppConfig, ConfigError, PlatformId};
use async_trait::async_trait;

use crate::error::PlatformError;
use crate::gemini::GeminiClient;
use crate::openai::OpenAiClient;
use crate::perplexity::PerplexityClient;

/// One conversational-AI provider: send a prompt, get text or an error.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    fn platform(&self) -> PlatformId;

    async fn send(&self, prompt: &str) -> Result<String, PlatformError>;
}

/// Read-only client set shared by all workers of a run.
pub type ClientMap = HashMap<PlatformId, Arc<dyn PlatformClient>>;

/// Construct clients for `platforms` from the configured API keys.
///
/// # Errors
///
/// Returns [`ConfigError::MissingEnvVar`] naming the API key variable of the
/// first platform without a key, or [`ConfigError::Validation`] if an HTTP
/// client cannot be built.
pub fn build_clients(config: &AppConfig, platforms: &[PlatformId]) -> Result<ClientMap, ConfigError> {
    let mut clients: ClientMap = HashMap::new();

    for &platform in platforms {
        let api_key = config
            .api_key(platform)
            .ok_or_else(|| ConfigError::MissingEnvVar(platform.api_key_var().to_string()))?;
        let timeout = config.request_timeout_secs;

        let client: Result<Arc<dyn PlatformClient>, PlatformError> = match platform {
            PlatformId::OpenAi => OpenAiClient::new(api_key, timeout).map(|c| Arc::new(c) as _),
            PlatformId::Gemini => GeminiClient::new(api_key, timeout).map(|c| Arc::new(c) as _),
            PlatformId::Perplexity => {
                PerplexityClient::new(api_key, timeout).map(|c| Arc::new(c) as _)
            }
        };

        let client = client.map_err(|e| {
            ConfigError::Validation(format!("failed to build {platform} client: {e}"))
        })?;
        clients.insert(platform, client);
    }

    Ok(clients)
}
