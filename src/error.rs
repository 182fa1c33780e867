//! Errors surfaced by a single event fetch.
//!
//! Every variant renders with a short prefix naming the stage that failed
//! (request construction, transport, HTTP status, retry loop, decode).

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be built (bad URL, bad header value).
    #[error("request error: {0}")]
    Request(#[source] reqwest::Error),

    /// Connection-level failure: DNS, refused connection, per-attempt timeout.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("GitHub API client error: {status}")]
    ClientStatus { status: StatusCode },

    #[error("GitHub API server error: {status}")]
    ServerStatus { status: StatusCode },

    #[error("rate limited: retry after {}s", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error("rate limited: no usable Retry-After header")]
    RateLimitedWithoutHint,

    #[error(
        "fetch GitHub response: retry budget exhausted after {attempts} attempts in {:.1}s: {last}",
        .elapsed.as_secs_f64()
    )]
    RetriesExhausted {
        attempts: u32,
        elapsed: Duration,
        #[source]
        last: Box<FetchError>,
    },

    #[error("read response: {0}")]
    Body(#[source] reqwest::Error),

    #[error("decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("fetch cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_stage_prefix() {
        let err = FetchError::ServerStatus {
            status: StatusCode::BAD_GATEWAY,
        };
        assert_eq!(err.to_string(), "GitHub API server error: 502 Bad Gateway");

        let err = FetchError::ClientStatus {
            status: StatusCode::NOT_FOUND,
        };
        assert_eq!(err.to_string(), "GitHub API client error: 404 Not Found");

        let err = FetchError::RateLimited {
            retry_after: Duration::from_secs(2),
        };
        assert_eq!(err.to_string(), "rate limited: retry after 2s");
    }

    #[test]
    fn exhausted_wraps_last_failure() {
        let err = FetchError::RetriesExhausted {
            attempts: 4,
            elapsed: Duration::from_millis(1500),
            last: Box::new(FetchError::RateLimitedWithoutHint),
        };
        let text = err.to_string();
        assert!(text.starts_with("fetch GitHub response: retry budget exhausted after 4 attempts"));
        assert!(text.ends_with("rate limited: no usable Retry-After header"));

        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "rate limited: no usable Retry-After header");
    }

    #[test]
    fn decode_error_converts() {
        let json_err = serde_json::from_str::<serde_json::Value>("{\"id\":").unwrap_err();
        let err: FetchError = json_err.into();
        assert!(err.to_string().starts_with("decode response:"));
    }
}
