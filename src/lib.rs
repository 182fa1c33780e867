//! Fetch a single GitHub event with bounded, rate-limit aware retries.

pub mod classify;
pub mod config;
pub mod error;
pub mod github_client;
pub mod models;
pub mod retry;

pub use classify::{ClassifyPolicy, Disposition, Outcome};
pub use config::Config;
pub use error::{FetchError, Result};
pub use github_client::GithubClient;
pub use models::Event;
pub use retry::{retry_with_backoff, BackoffConfig};
