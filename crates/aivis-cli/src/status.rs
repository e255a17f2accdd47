//! `status` command handler.

use std::time::Duration;

use aivis_core::AppConfig;
use aivis_platforms::{build_clients, check_connectivity};

/// Probe every platform that has an API key configured.
///
/// # Errors
///
/// Returns an error if no platform has a key or a client cannot be built.
pub(crate) async fn run_status(config: &AppConfig) -> anyhow::Result<()> {
    let platforms = config.configured_platforms();
    if platforms.is_empty() {
        anyhow::bail!(
            "no platform API keys configured; set OPENAI_API_KEY, GEMINI_API_KEY, or PERPLEXITY_API_KEY"
        );
    }

    let clients = build_clients(config, &platforms)?;
    let statuses =
        check_connectivity(&clients, Duration::from_secs(config.request_timeout_secs)).await;

    for status in &statuses {
        if status.reachable {
            println!(
                "  \u{2713} {:<12} reachable ({} ms)",
                status.platform.as_str(),
                status.latency_ms
            );
        } else {
            println!(
                "  \u{2717} {:<12} {}",
                status.platform.as_str(),
                status.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    let reachable = statuses.iter().filter(|s| s.reachable).count();
    println!("{reachable}/{} platform(s) reachable", statuses.len());
    Ok(())
}
