//! Runtime configuration read from the environment (and `.env`).

use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_ELAPSED_SECS: u64 = 15 * 60;
const DEFAULT_CONCURRENT_REQUESTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub token: String,
    pub event_urls: Vec<String>,
    /// Per-attempt transport timeout.
    pub request_timeout: Duration,
    /// Budget for all attempts of one fetch.
    pub max_elapsed: Duration,
    pub concurrent_requests: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("GITHUB_TOKEN").ok_or_else(|| anyhow!("GITHUB_TOKEN is not set"))?;
        let urls = lookup("EVENT_URLS").ok_or_else(|| anyhow!("EVENT_URLS is not set"))?;
        let event_urls: Vec<String> = urls
            .split(',')
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(String::from)
            .collect();
        if event_urls.is_empty() {
            bail!("EVENT_URLS contains no URLs");
        }

        let timeout_secs = parse_or(&lookup, "FETCH_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let max_elapsed_secs =
            parse_or(&lookup, "RETRY_MAX_ELAPSED_SECS", DEFAULT_MAX_ELAPSED_SECS)?;
        let concurrent_requests =
            parse_or(&lookup, "CONCURRENT_REQUESTS", DEFAULT_CONCURRENT_REQUESTS)?;
        if concurrent_requests == 0 {
            bail!("CONCURRENT_REQUESTS must be at least 1");
        }

        Ok(Self {
            token,
            event_urls,
            request_timeout: Duration::from_secs(timeout_secs),
            max_elapsed: Duration::from_secs(max_elapsed_secs),
            concurrent_requests,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a number, got {:?}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = config_from(&[
            ("GITHUB_TOKEN", "t0ken"),
            ("EVENT_URLS", "https://api.github.com/events/1"),
        ])
        .unwrap();
        assert_eq!(config.token, "t0ken");
        assert_eq!(config.event_urls, ["https://api.github.com/events/1"]);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.max_elapsed, Duration::from_secs(900));
        assert_eq!(config.concurrent_requests, 10);
    }

    #[test]
    fn urls_are_trimmed_and_blanks_dropped() {
        let config = config_from(&[
            ("GITHUB_TOKEN", "t0ken"),
            ("EVENT_URLS", " https://a/1 ,, https://a/2,"),
            ("FETCH_TIMEOUT_SECS", "3"),
            ("RETRY_MAX_ELAPSED_SECS", " 60 "),
        ])
        .unwrap();
        assert_eq!(config.event_urls, ["https://a/1", "https://a/2"]);
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.max_elapsed, Duration::from_secs(60));
    }

    #[test]
    fn missing_token_is_an_error() {
        let err = config_from(&[("EVENT_URLS", "https://a/1")]).unwrap_err();
        assert!(err.to_string().contains("GITHUB_TOKEN"));
    }

    #[test]
    fn empty_url_list_is_an_error() {
        let err = config_from(&[("GITHUB_TOKEN", "t"), ("EVENT_URLS", " , ")]).unwrap_err();
        assert!(err.to_string().contains("no URLs"));
    }

    #[test]
    fn bad_number_names_the_variable() {
        let err = config_from(&[
            ("GITHUB_TOKEN", "t"),
            ("EVENT_URLS", "https://a/1"),
            ("FETCH_TIMEOUT_SECS", "ten"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("FETCH_TIMEOUT_SECS"));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let err = config_from(&[
            ("GITHUB_TOKEN", "t"),
            ("EVENT_URLS", "https://a/1"),
            ("CONCURRENT_REQUESTS", "0"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("CONCURRENT_REQUESTS"));
    }
}
