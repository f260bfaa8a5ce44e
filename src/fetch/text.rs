use reqwest::{Client, Response, StatusCode};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::{config::FetchConfig, error::RetrievalError};

/// Server-side statuses worth another attempt.
pub fn is_retryable(status: StatusCode) -> bool {
    matches!(status.as_u16(), 500 | 502 | 503 | 504)
}

/// GET `url`, retrying transient server errors up to `cfg.max_attempts`
/// times. Client errors and connection failures are returned immediately.
pub async fn get_with_retry(
    client: &Client,
    url: &str,
    cfg: &FetchConfig,
) -> Result<Response, RetrievalError> {
    let attempts = cfg.max_attempts.max(1);
    for attempt in 1..=attempts {
        let resp = client
            .get(url)
            .send()
            .await
            .map_err(|source| RetrievalError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if status.is_success() {
            debug!(url, attempt, "fetched");
            return Ok(resp);
        }
        if !is_retryable(status) {
            return Err(RetrievalError::Status {
                url: url.to_string(),
                status,
            });
        }
        warn!(url, attempt, %status, "server error");
        if attempt < attempts {
            sleep(cfg.retry_delay).await;
        }
    }

    Err(RetrievalError::Exhausted {
        url: url.to_string(),
        attempts,
    })
}

/// Download `url` and decode the body as UTF-8.
pub async fn fetch_text(
    client: &Client,
    url: &str,
    cfg: &FetchConfig,
) -> Result<String, RetrievalError> {
    let bytes = get_with_retry(client, url, cfg)
        .await?
        .bytes()
        .await
        .map_err(|source| RetrievalError::Transport {
            url: url.to_string(),
            source,
        })?;
    String::from_utf8(bytes.to_vec()).map_err(|_| RetrievalError::Decode {
        url: url.to_string(),
    })
}
