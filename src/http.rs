//! HTTP client construction shared by all upstream clients
//!
//! Every client gets its own timeout and a bounded retry policy that only
//! retries transient failures (connection errors, timeouts, 5xx, 429).

use std::time::{Duration, Instant};

use reqwest::Response;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use tracing::{debug, info, warn};

use crate::{BotError, Result};

pub const USER_AGENT: &str = concat!("WeatherBot/", env!("CARGO_PKG_VERSION"));

/// Requests slower than this are logged as warnings
const SLOW_REQUEST: Duration = Duration::from_secs(5);

/// Build an HTTP client with a per-request timeout and bounded retries
pub fn build_client(timeout_seconds: u32, max_retries: u32) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds.into()))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| BotError::config(format!("Failed to create HTTP client: {e}")))?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Issue a GET request, mapping transport failures to `UpstreamUnavailable`.
///
/// The status code is left for the caller to interpret.
pub async fn get(client: &ClientWithMiddleware, url: &str, service: &str) -> Result<Response> {
    debug!("{} request: {}", service, url);
    let start_time = Instant::now();

    let response = client.get(url).send().await.map_err(|e| {
        warn!(
            "{} request failed after {:.3}s: {}",
            service,
            start_time.elapsed().as_secs_f64(),
            e
        );
        BotError::upstream(service, e.to_string())
    })?;

    let duration = start_time.elapsed();
    info!(
        "{} responded {} in {:.3}s",
        service,
        response.status(),
        duration.as_secs_f64()
    );
    if duration > SLOW_REQUEST {
        warn!(
            "Slow {} response detected: {:.3}s",
            service,
            duration.as_secs_f64()
        );
    }

    Ok(response)
}

/// Map a non-success status to `UpstreamUnavailable`
pub fn ensure_success(response: Response, service: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        warn!("{} returned HTTP {}", service, status);
        Err(BotError::upstream(
            service,
            format!(
                "HTTP {} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown error")
            ),
        ))
    }
}
