// src/fetch/client.rs

use anyhow::{anyhow, Context, Result};
use reqwest::{header::RETRY_AFTER, Client, StatusCode};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, trace, warn};
use url::Url;

use crate::config::Config;

/// Upper bound on how long a `Retry-After` header can park us.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// HTTP access to EDGAR: one shared `reqwest::Client`, the base URL every
/// relative link hangs off, and the retry/pacing knobs from [`Config`].
#[derive(Debug, Clone)]
pub struct EdgarClient {
    http: Client,
    base: Url,
    max_retries: u32,
    backoff_ms: u64,
    request_delay: Duration,
}

impl EdgarClient {
    pub fn new(config: &Config) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .with_context(|| format!("parsing base URL {}", config.base_url))?;
        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .gzip(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            http,
            base,
            max_retries: config.max_retries,
            backoff_ms: config.backoff_ms,
            request_delay: Duration::from_millis(config.request_delay_ms),
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Join an href (`/Archives/...` or absolute) onto the base URL.
    pub fn resolve(&self, href: &str) -> Result<Url> {
        self.base
            .join(href)
            .with_context(|| format!("resolving {} against {}", href, self.base))
    }

    async fn fetch_once(&self, url: &Url) -> Result<String, Failure> {
        debug!("Fetching text from {}", url);
        let resp = self.http.get(url.clone()).send().await.map_err(|e| {
            Failure::transient(anyhow::Error::new(e).context(format!("GET {} failed", url)))
        })?;

        let status = resp.status();
        if status.is_success() {
            return resp.text().await.map_err(|e| {
                Failure::transient(
                    anyhow::Error::new(e).context(format!("Reading text from {}", url)),
                )
            });
        }

        let error = anyhow!("{} returned {}", url, status);
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            // EDGAR sends Retry-After (seconds) when throttling
            let retry_after = resp
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(|secs| Duration::from_secs(secs).min(MAX_RETRY_AFTER));
            return Err(Failure::Transient { error, retry_after });
        }
        if status == StatusCode::FORBIDDEN {
            warn!(%url, "EDGAR refused the request; check the User-Agent carries a contact email");
        }
        Err(Failure::Permanent(error))
    }

    /// GET `url` as text. Throttling (429), server errors and transport
    /// failures are retried with exponential backoff, or the server's
    /// `Retry-After` when given; other 4xx responses fail at once.
    pub async fn get_text(&self, url: &Url) -> Result<String> {
        let mut attempts = 0;
        loop {
            if !self.request_delay.is_zero() {
                trace!(delay_ms = self.request_delay.as_millis() as u64, "pacing");
                sleep(self.request_delay).await;
            }
            match self.fetch_once(url).await {
                Ok(t) => return Ok(t),
                Err(Failure::Permanent(e)) => return Err(e),
                Err(Failure::Transient { error, retry_after }) if attempts < self.max_retries => {
                    attempts += 1;
                    let delay = retry_after.unwrap_or_else(|| {
                        Duration::from_millis(self.backoff_ms * 2u64.pow(attempts - 1))
                    });
                    warn!(%url, attempt = attempts, delay_ms = delay.as_millis() as u64, error = %error, "Retrying");
                    sleep(delay).await;
                }
                Err(Failure::Transient { error, .. }) => {
                    error!(%url, attempts, error = %error, "Exhausted retries");
                    return Err(error);
                }
            }
        }
    }
}

/// Outcome of one failed GET.
enum Failure {
    /// Client errors other than throttling; asking again will not help.
    Permanent(anyhow::Error),
    Transient {
        error: anyhow::Error,
        retry_after: Option<Duration>,
    },
}

impl Failure {
    fn transient(error: anyhow::Error) -> Self {
        Failure::Transient {
            error,
            retry_after: None,
        }
    }
}
