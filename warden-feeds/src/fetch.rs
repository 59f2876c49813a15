//! Bounded-retry feed download
//!
//! Each attempt has a fixed timeout; only HTTP 200 counts as success. A
//! non-200 status or transport failure consumes one attempt, with a short
//! fixed backoff between attempts.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, warn};

use warden_core::FetchPolicy;

/// Errors from feed fetching and cache persistence
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("all {attempts} fetch attempts failed for {url}")]
    Exhausted { url: String, attempts: u32 },

    #[error("cache I/O error at {path}: {source}")]
    CacheIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Build the shared HTTP client with the per-attempt timeout.
pub fn build_client(policy: &FetchPolicy) -> Result<Client, FeedError> {
    Client::builder()
        .timeout(Duration::from_secs(policy.timeout_secs))
        .user_agent(concat!("warden/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(FeedError::Client)
}

/// Download a feed body, retrying up to the policy budget.
pub async fn fetch_feed(client: &Client, url: &str, policy: &FetchPolicy) -> Result<String, FeedError> {
    let attempts = policy.retries.max(1);

    for attempt in 1..=attempts {
        match client.get(url).send().await {
            Ok(response) if response.status() == StatusCode::OK => match response.text().await {
                Ok(body) => {
                    debug!(url, attempt, bytes = body.len(), "feed fetched");
                    return Ok(body);
                }
                Err(e) => warn!(url, attempt, error = %e, "feed body read failed"),
            },
            Ok(response) => {
                warn!(url, attempt, status = %response.status(), "feed fetch returned non-200");
            }
            Err(e) => {
                warn!(url, attempt, error = %e, "feed fetch failed");
            }
        }

        if attempt < attempts {
            tokio::time::sleep(Duration::from_secs(policy.backoff_secs)).await;
        }
    }

    Err(FeedError::Exhausted {
        url: url.to_string(),
        attempts,
    })
}
