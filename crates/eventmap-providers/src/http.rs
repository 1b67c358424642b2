//! Shared HTTP plumbing: client construction, status mapping, JSON decoding.

use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::{ProviderError, ProviderResult};

/// Longest upstream error body quoted in an error message.
const BODY_EXCERPT_CHARS: usize = 300;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Builds a client with the given per-request timeout.
pub fn build_client(timeout: Duration) -> ProviderResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("eventmap/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| {
            ProviderError::configuration(format!("failed to create HTTP client: {}", e))
        })
}

/// Sends a request and maps non-success statuses onto [`ProviderError`].
pub async fn send(request: RequestBuilder) -> ProviderResult<Response> {
    let response = request.send().await.map_err(ProviderError::from_reqwest)?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let detail = match status {
        StatusCode::TOO_MANY_REQUESTS => response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(|secs| format!("retry after {} seconds", secs))
            .unwrap_or_default(),
        StatusCode::NOT_FOUND => response.url().to_string(),
        _ => {
            let body = response.text().await.unwrap_or_default();
            body.chars().take(BODY_EXCERPT_CHARS).collect()
        }
    };
    Err(ProviderError::from_status(status, &detail))
}

/// Sends a request and decodes the JSON body.
pub async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> ProviderResult<T> {
    let response = send(request).await?;
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

    serde_json::from_str(&body).map_err(|e| {
        ProviderError::invalid_response(format!("failed to parse response: {}", e)).with_source(e)
    })
}
