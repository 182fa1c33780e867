//! Map one HTTP attempt onto a retry outcome.
//!
//! Precedence: transport failure, then 5xx, then 429, then other 4xx,
//! anything else is a success handed to the decoder. Which failures are
//! waited out and which stop the loop is read from [`ClassifyPolicy`], so the
//! table can change without touching the retry loop.

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;

use crate::error::FetchError;

/// Result of a single attempt, consumed immediately by the retry loop.
#[derive(Debug)]
pub enum Outcome<T> {
    Success(T),
    /// Stop now and report the error.
    Fatal(FetchError),
    /// The server named its own wait; sleep exactly this long.
    RateLimited(Duration),
    /// Sleep for the next exponential interval and try again.
    Transient(FetchError),
}

impl<T> Outcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Success(v) => Outcome::Success(f(v)),
            Outcome::Fatal(e) => Outcome::Fatal(e),
            Outcome::RateLimited(d) => Outcome::RateLimited(d),
            Outcome::Transient(e) => Outcome::Transient(e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Fatal,
    Transient,
}

impl Disposition {
    fn outcome<T>(self, err: FetchError) -> Outcome<T> {
        match self {
            Disposition::Fatal => Outcome::Fatal(err),
            Disposition::Transient => Outcome::Transient(err),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifyPolicy {
    /// DNS failures, refused connections, per-attempt timeouts.
    pub transport_error: Disposition,
    /// Any status >= 500.
    pub server_error: Disposition,
    /// 429 whose Retry-After is missing or not an integer number of seconds.
    pub rate_limit_without_hint: Disposition,
}

impl ClassifyPolicy {
    /// Server errors and transport failures stop the loop; a 429 without a
    /// usable hint falls back to the exponential schedule.
    pub const DEFAULT: Self = Self {
        transport_error: Disposition::Fatal,
        server_error: Disposition::Fatal,
        rate_limit_without_hint: Disposition::Transient,
    };

    pub fn classify_transport<T>(&self, err: reqwest::Error) -> Outcome<T> {
        self.transport_error.outcome(FetchError::Transport(err))
    }

    /// Classify a completed response from its status line and headers. The
    /// response itself is only carried through on success.
    pub fn classify_response<T>(
        &self,
        status: StatusCode,
        headers: &HeaderMap,
        response: T,
    ) -> Outcome<T> {
        if status.is_server_error() {
            return self
                .server_error
                .outcome(FetchError::ServerStatus { status });
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return match parse_retry_after(headers) {
                Some(delay) => Outcome::RateLimited(delay),
                None => self
                    .rate_limit_without_hint
                    .outcome(FetchError::RateLimitedWithoutHint),
            };
        }
        if status.is_client_error() {
            return Outcome::Fatal(FetchError::ClientStatus { status });
        }
        Outcome::Success(response)
    }
}

impl Default for ClassifyPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Reads `Retry-After` as a whole number of seconds. HTTP-date values are
/// not accepted.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
