//! Request plumbing shared by the HTTP-backed platform clients.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::PlatformError;

const USER_AGENT: &str = "aivis/0.1 (ai-visibility-analyzer)";

/// Longest error body kept on `UnexpectedStatus`.
const MAX_ERROR_BODY_CHARS: usize = 500;

pub(crate) fn build_http_client(timeout_secs: u64) -> Result<Client, PlatformError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Join a base URL and a path with exactly one slash between them.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Send the request, map non-2xx statuses to typed errors, and decode JSON.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    context: &str,
) -> Result<T, PlatformError> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            PlatformError::Timeout
        } else {
            PlatformError::Http(e)
        }
    })?;
    let response = check_status(response).await?;
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| PlatformError::Deserialize {
        context: context.to_owned(),
        source: e,
    })
}

async fn check_status(response: Response) -> Result<Response, PlatformError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(PlatformError::Auth {
            status: status.as_u16(),
        }),
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            Err(PlatformError::RateLimited { retry_after_secs })
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => Err(PlatformError::Timeout),
        _ => {
            let body = response.text().await.unwrap_or_default();
            Err(PlatformError::UnexpectedStatus {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_normalises_slashes() {
        assert_eq!(
            endpoint("https://api.example.com/", "/v1/chat"),
            "https://api.example.com/v1/chat"
        );
        assert_eq!(
            endpoint("http://127.0.0.1:9000", "chat/completions"),
            "http://127.0.0.1:9000/chat/completions"
        );
    }
}
