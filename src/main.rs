use anyhow::{bail, Context, Result};
use futures::{stream, StreamExt};
use github_event_fetcher::{BackoffConfig, Config, GithubClient};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = Config::from_env().context("Failed to load configuration")?;
    let backoff = BackoffConfig {
        max_elapsed_time: config.max_elapsed,
        ..BackoffConfig::DEFAULT
    };
    let client = GithubClient::with_timeout(config.token.clone(), config.request_timeout)
        .context("Failed to build HTTP client")?
        .with_backoff(backoff);

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling fetches");
            on_ctrl_c.cancel();
        }
    });

    info!(count = config.event_urls.len(), "fetching events");
    let failures = stream::iter(config.event_urls.clone())
        .map(|url| {
            let mut client = client.clone();
            let cancel = cancel.clone();
            async move {
                match client.fetch_event_with_cancel(&url, &cancel).await {
                    Ok(event) => {
                        println!("{}: {}", url, event.summary());
                        0usize
                    }
                    Err(e) => {
                        error!(url = %url, error = %e, "fetch failed");
                        1
                    }
                }
            }
        })
        .buffer_unordered(config.concurrent_requests)
        .fold(0usize, |acc, failed| async move { acc + failed })
        .await;

    if failures > 0 {
        bail!("{} of {} fetches failed", failures, config.event_urls.len());
    }
    Ok(())
}
