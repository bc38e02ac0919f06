//! HTTP transport collaborator.
//!
//! The pipeline only ever sees a clean body or a terminal error; header
//! rotation, delays, and timeouts all live behind the `Fetcher` trait.

use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

/// Real browser user agents rotated per request.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; rv:118.0) Gecko/20100101 Firefox/118.0",
];

/// Markers that a bot-challenge interstitial came back instead of the page.
const CHALLENGE_MARKERS: &[&str] = &[
    "cf-browser-verification",
    "cf-challenge",
    "Just a moment...",
    "g-recaptcha",
];

/// True when a response body is a bot-challenge interstitial rather
/// than the requested page.
pub fn is_challenge(body: &str) -> bool {
    CHALLENGE_MARKERS.iter().any(|marker| body.contains(marker))
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status} fetching {url}")]
    Status { status: u16, url: String },
    #[error("challenge page detected at {0}")]
    Challenge(String),
}

/// Page transport seam. Implementations own retries, proxying, and any
/// session state.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// reqwest-backed fetcher with user-agent rotation and a randomized
/// inter-request delay.
pub struct HttpFetcher {
    client: Client,
    delay: (Duration, Duration),
    user_agent: Option<String>,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, delay_min: Duration, delay_max: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            delay: (delay_min, delay_max),
            user_agent: None,
        }
    }

    /// Pin a fixed user agent instead of rotating.
    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = Some(user_agent.to_string());
        self
    }

    fn pick_user_agent(&self) -> String {
        match &self.user_agent {
            Some(fixed) => fixed.clone(),
            None => USER_AGENTS
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or(USER_AGENTS[0])
                .to_string(),
        }
    }

    async fn pause(&self) {
        let (min, max) = self.delay;
        if max.is_zero() {
            return;
        }
        let span = max.saturating_sub(min);
        let jitter = if span.is_zero() {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..=span.as_millis() as u64))
        };
        tokio::time::sleep(min + jitter).await;
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", self.pick_user_agent())
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .header("Referer", "https://google.com/")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        if is_challenge(&body) {
            return Err(FetchError::Challenge(url.to_string()));
        }

        debug!("fetched {} ({} bytes)", url, body.len());
        self.pause().await;
        Ok(body)
    }
}
