use crate::classify::{ClassifyPolicy, Outcome};
use crate::error::{FetchError, Result};
use crate::models::Event;
use crate::retry::{retry_with_backoff, BackoffConfig};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, Response};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

/// Bound on a single HTTP round trip, independent of the retry budget.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Authenticated GET client for single GitHub API resources.
///
/// The transport is shared between clones; the target URL is not. Give each
/// concurrent fetch its own clone.
#[derive(Clone)]
pub struct GithubClient {
    client: Arc<reqwest::Client>,
    token: String,
    method: Method,
    url: String,
    policy: ClassifyPolicy,
    backoff: BackoffConfig,
}

impl GithubClient {
    pub fn new(token: String) -> Result<Self> {
        Self::with_timeout(token, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(token: String, timeout: Duration) -> Result<Self> {
        Ok(Self::with_transport(token, Arc::new(build_transport(timeout)?)))
    }

    /// Wraps an existing transport, e.g. one shared by several clients.
    pub fn with_transport(token: String, client: Arc<reqwest::Client>) -> Self {
        Self {
            client,
            token,
            method: Method::GET,
            url: String::new(),
            policy: ClassifyPolicy::DEFAULT,
            backoff: BackoffConfig::DEFAULT,
        }
    }

    pub fn with_policy(mut self, policy: ClassifyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch_event(&mut self, url: &str) -> Result<Event> {
        self.fetch_event_with_cancel(url, &CancellationToken::new())
            .await
    }

    /// Fetches and decodes one event, retrying rate limits and transient
    /// failures until the backoff budget runs out or `cancel` fires.
    pub async fn fetch_event_with_cancel(
        &mut self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Event> {
        self.set_url(url);
        let this = &*self;
        let span = info_span!("fetch_event", url = %this.url);

        async move {
            let response =
                retry_with_backoff(&this.backoff, cancel, |_| this.send_once()).await?;

            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                event = decode_event(response) => event?,
            };
            info!(event_id = %event.id, event_type = %event.event_type, "fetched event");
            Ok(event)
        }
        .instrument(span)
        .await
    }

    async fn send_once(&self) -> Outcome<Response> {
        let request = match self
            .client
            .request(self.method.clone(), &self.url)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "application/json")
            .build()
        {
            Ok(request) => request,
            Err(e) => return Outcome::Fatal(FetchError::Request(e)),
        };

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(e) => return self.policy.classify_transport(e),
        };

        let status = response.status();
        debug!(status = status.as_u16(), "received response");
        // A non-success response is dropped here, which releases its connection.
        self.policy
            .classify_response(status, response.headers(), ())
            .map(|()| response)
    }
}

fn build_transport(timeout: Duration) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("github-event-fetcher"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(FetchError::Request)
}

/// Reads the whole body before parsing, so a truncated body is a decode
/// error and never a partial event.
async fn decode_event(response: Response) -> Result<Event> {
    let body = response.bytes().await.map_err(|e| {
        warn!(error = %e, "failed to read response body");
        FetchError::Body(e)
    })?;
    Ok(serde_json::from_slice(&body)?)
}
