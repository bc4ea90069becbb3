// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_client(config: &CrawlerConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Issue a GET, retrying transport failures and transient statuses.
///
/// Makes at most `max_attempts` requests with a fixed pause between them.
/// The final response is returned whatever its status; use
/// [`ensure_success`] to turn error statuses into [`AppError::Status`].
pub async fn get_with_retry(
    client: &Client,
    url: &str,
    config: &CrawlerConfig,
) -> Result<Response> {
    let attempts = config.max_attempts.max(1);
    let backoff = Duration::from_millis(config.retry_backoff_ms);
    let mut attempt = 1;

    loop {
        let outcome = client.get(url).send().await;

        let retry = match &outcome {
            Ok(response) => is_transient(response.status()),
            Err(e) => !e.is_builder(),
        };
        if !retry || attempt >= attempts {
            return Ok(outcome?);
        }

        match &outcome {
            Ok(response) => log::warn!(
                "GET {} returned {} (attempt {}/{}), retrying",
                url,
                response.status(),
                attempt,
                attempts
            ),
            Err(e) => log::warn!(
                "GET {} failed (attempt {}/{}): {}, retrying",
                url,
                attempt,
                attempts,
                e
            ),
        }

        attempt += 1;
        if !backoff.is_zero() {
            tokio::time::sleep(backoff).await;
        }
    }
}

/// Reject responses with a status of 400 or above.
pub fn ensure_success(response: Response, url: &str) -> Result<Response> {
    let status = response.status();
    if status.as_u16() >= 400 {
        return Err(AppError::status(url, status.as_u16()));
    }
    Ok(response)
}

fn is_transient(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}
