//! Shared HTTP plumbing for the adapters.
//!
//! Every adapter call goes through one pooled [`reqwest::Client`] with a
//! bounded per-request timeout, and through [`send_with_retry`] which
//! retries transient failures up to a fixed ceiling before giving up.

use std::time::Duration;

use tracing::{debug, warn};

use crate::traits::ScrapeError;

/// User agent sent on every upstream request.
const USER_AGENT: &str = concat!("skillpulse/", env!("CARGO_PKG_VERSION"));

/// Base delay for retry backoff; doubled per attempt.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Build the shared HTTP client used by all adapters.
pub fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Send a request, retrying transient failures up to `max_retries` times.
///
/// Transient = transport errors (connect/timeout) and 429/5xx responses.
/// A non-success status that survives the retry ceiling becomes
/// [`ScrapeError::Status`]; 4xx responses other than 429 fail immediately.
pub async fn send_with_retry(
    request: reqwest::RequestBuilder,
    max_retries: u32,
) -> Result<reqwest::Response, ScrapeError> {
    let mut attempt = 0u32;
    loop {
        // Streaming bodies are never used here, so the clone always succeeds.
        let req = request
            .try_clone()
            .ok_or_else(|| ScrapeError::Parse("request body is not cloneable".to_string()))?;

        match req.send().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => {
                let status = response.status();
                let retriable = status.as_u16() == 429 || status.is_server_error();
                if !retriable || attempt >= max_retries {
                    let url = response.url().to_string();
                    warn!(status = status.as_u16(), url = %url, "upstream request failed");
                    return Err(ScrapeError::Status {
                        status: status.as_u16(),
                        url,
                    });
                }
            }
            Err(e) => {
                let retriable = e.is_timeout() || e.is_connect() || e.is_request();
                if !retriable || attempt >= max_retries {
                    return Err(ScrapeError::Http(e));
                }
            }
        }

        let delay = RETRY_BASE_DELAY * 2u32.pow(attempt);
        debug!(attempt = attempt + 1, delay_ms = delay.as_millis() as u64, "retrying upstream request");
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// Parse an RFC 3339 / ISO 8601 timestamp, tolerating a trailing `Z`.
///
/// Returns `None` on anything unparsable — upstream date formats vary and
/// a bad timestamp must not fail the item.
pub fn parse_datetime(value: Option<&str>) -> Option<chrono::DateTime<chrono::Utc>> {
    let raw = value?;
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .or_else(|| {
            // pypi upload times come without an offset (e.g. "2024-01-15T10:30:00")
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_datetime_rfc3339_zulu() {
        let dt = parse_datetime(Some("2024-06-01T12:00:00Z")).unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-06-01T12:00:00+00:00");
    }

    #[test]
    fn test_parse_datetime_with_offset() {
        let dt = parse_datetime(Some("2024-06-01T12:00:00+02:00")).unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-06-01T10:00:00+00:00");
    }

    #[test]
    fn test_parse_datetime_naive() {
        let dt = parse_datetime(Some("2024-01-15T10:30:00")).unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-15T10:30:00+00:00");
    }

    #[test]
    fn test_parse_datetime_garbage_is_none() {
        assert!(parse_datetime(Some("not a date")).is_none());
        assert!(parse_datetime(Some("")).is_none());
        assert!(parse_datetime(None).is_none());
    }
}
