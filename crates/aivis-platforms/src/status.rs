use std::sync::Arc;
use std::time::{Duration, Instant};

use aivis_core::PlatformId;
use futures::future::join_all;
use serde::Serialize;

use crate::client::{ClientMap, PlatformClient};

const PROBE_PROMPT: &str = "Hello, this is a test message.";

/// Outcome of a single connectivity probe.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformStatus {
    pub platform: PlatformId,
    pub reachable: bool,
    pub error: Option<String>,
    pub latency_ms: u64,
}

/// Send a short probe prompt to every client concurrently.
///
/// Results are sorted by platform. A probe that exceeds `timeout` is reported
/// unreachable.
pub async fn check_connectivity(clients: &ClientMap, timeout: Duration) -> Vec<PlatformStatus> {
    let probes = clients
        .values()
        .map(|client| probe(Arc::clone(client), timeout));
    let mut statuses = join_all(probes).await;
    statuses.sort_by_key(|s| s.platform);
    statuses
}

async fn probe(client: Arc<dyn PlatformClient>, timeout: Duration) -> PlatformStatus {
    let started = Instant::now();
    let outcome = tokio::time::timeout(timeout, client.send(PROBE_PROMPT)).await;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let error = match outcome {
        Ok(Ok(_)) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(_) => Some("probe timed out".to_owned()),
    };

    PlatformStatus {
        platform: client.platform(),
        reachable: error.is_none(),
        error,
        latency_ms,
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::PlatformError;

    struct StubClient(PlatformId, bool);

    #[async_trait]
    impl PlatformClient for StubClient {
        fn platform(&self) -> PlatformId {
            self.0
        }

        async fn send(&self, _prompt: &str) -> Result<String, PlatformError> {
            if self.1 {
                Ok("hi".to_owned())
            } else {
                Err(PlatformError::Auth { status: 403 })
            }
        }
    }

    #[tokio::test]
    async fn reports_each_platform_sorted() {
        let mut clients = ClientMap::new();
        clients.insert(
            PlatformId::Perplexity,
            Arc::new(StubClient(PlatformId::Perplexity, false)),
        );
        clients.insert(PlatformId::OpenAi, Arc::new(StubClient(PlatformId::OpenAi, true)));

        let statuses = check_connectivity(&clients, Duration::from_secs(1)).await;

        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].platform, PlatformId::OpenAi);
        assert!(statuses[0].reachable);
        assert!(!statuses[1].reachable);
        assert!(statuses[1].error.as_deref().unwrap().contains("403"));
    }
}
