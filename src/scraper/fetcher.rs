//! Polite HTTP fetcher for listing pages
//!
//! This module provides the HTTP layer used by the built-in scrapers, with:
//! - A per-site request quota enforced with governor
//! - Random jitter between requests
//! - User-Agent rotation
//! - Charset-aware decoding (Content-Type header, then `<meta charset>`, then UTF-8)
//!
//! Failed requests are not retried.

use crate::config::FetcherConfig;
use crate::utils::error::FetchError;
use encoding_rs::{Encoding, UTF_8};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT},
    Client, Response,
};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::OnceLock;
use std::time::Duration;
use url::Url;

/// Pool of realistic User-Agent strings for rotation
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:122.0) Gecko/20100101 Firefox/122.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
];

/// Request pacing for one target site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Politeness {
    /// Sustained request quota
    pub requests_per_minute: u32,

    /// Lower bound of the random pause before each request
    pub min_delay_ms: u64,

    /// Upper bound of the random pause before each request
    pub max_delay_ms: u64,
}

impl Default for Politeness {
    fn default() -> Self {
        Self {
            requests_per_minute: 6,
            min_delay_ms: 3_000,
            max_delay_ms: 8_000,
        }
    }
}

impl Politeness {
    pub const fn new(requests_per_minute: u32, min_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            requests_per_minute,
            min_delay_ms,
            max_delay_ms,
        }
    }

    /// No pacing at all; for local mock servers
    pub const fn unthrottled() -> Self {
        Self::new(60_000, 0, 0)
    }
}

/// Rate-limited HTTP fetcher
pub struct AssetFetcher {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// Rate limiter to control request frequency
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,

    politeness: Politeness,

    /// Fixed user agent; `None` rotates through [`USER_AGENTS`]
    user_agent: Option<String>,
}

impl AssetFetcher {
    /// Create a fetcher with the given pacing and client settings
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(politeness: Politeness, settings: &FetcherConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .gzip(true)
            .cookie_store(settings.enable_cookies)
            .build()?;

        let rate = NonZeroU32::new(politeness.requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_minute(rate).allow_burst(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(quota);

        Ok(Self {
            client,
            rate_limiter,
            politeness,
            user_agent: settings.user_agent.clone(),
        })
    }

    /// Fetch a page and decode its body to text
    ///
    /// # Errors
    ///
    /// - `FetchError::InvalidUrl` if `url` is not absolute
    /// - `FetchError::Status` for non-success responses
    /// - `FetchError::Timeout` / `FetchError::Http` for transport failures
    /// - `FetchError::Decode` if the body cannot be decoded
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;

        self.rate_limiter.until_ready().await;

        let jitter = self.jitter();
        if !jitter.is_zero() {
            tokio::time::sleep(jitter).await;
        }

        let referer = parsed.origin().ascii_serialization();
        let headers = self.build_headers(&referer);

        tracing::debug!(url = %url, "Fetching page");

        let response = self
            .client
            .get(parsed)
            .headers(headers)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        self.decode_response(response).await
    }

    /// Random pause drawn from the politeness window
    fn jitter(&self) -> Duration {
        let Politeness {
            min_delay_ms,
            max_delay_ms,
            ..
        } = self.politeness;

        let millis = if max_delay_ms > min_delay_ms {
            rand::thread_rng().gen_range(min_delay_ms..=max_delay_ms)
        } else {
            min_delay_ms
        };

        Duration::from_millis(millis)
    }

    async fn decode_response(&self, response: Response) -> Result<String, FetchError> {
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_default();

        let bytes = response.bytes().await?;

        decode_bytes(&bytes, &content_type)
    }

    fn build_headers(&self, referer: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();

        let user_agent = match &self.user_agent {
            Some(fixed) => HeaderValue::from_str(fixed).ok(),
            None => Some(HeaderValue::from_static(random_user_agent())),
        };
        if let Some(value) = user_agent {
            headers.insert(USER_AGENT, value);
        }

        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        if let Ok(referer_value) = HeaderValue::from_str(referer) {
            headers.insert(REFERER, referer_value);
        }

        headers
    }
}

/// Get a random user agent from the pool
fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS.choose(&mut rng).unwrap_or(&USER_AGENTS[0])
}

/// Charset label from a Content-Type header value
fn header_charset(content_type: &str) -> Option<&'static Encoding> {
    content_type
        .split(';')
        .filter_map(|part| part.trim().strip_prefix("charset="))
        .find_map(|label| Encoding::for_label(label.trim_matches('"').as_bytes()))
}

/// Charset declared by a `<meta>` tag within the first KiB
fn meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    static META_RE: OnceLock<Regex> = OnceLock::new();
    let re = META_RE.get_or_init(|| {
        Regex::new(r#"(?i)charset\s*=\s*["']?([a-z0-9_\-]+)"#).expect("Invalid regex pattern")
    });

    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(1024)]);
    re.captures(&head)
        .and_then(|cap| cap.get(1))
        .and_then(|label| Encoding::for_label(label.as_str().as_bytes()))
}

/// Decode a response body using the declared or sniffed charset
///
/// # Errors
///
/// Returns `FetchError::Decode` if the bytes are malformed for the chosen encoding
pub fn decode_bytes(bytes: &[u8], content_type: &str) -> Result<String, FetchError> {
    let encoding = header_charset(content_type)
        .or_else(|| meta_charset(bytes))
        .unwrap_or(UTF_8);

    let (cow, _encoding, had_errors) = encoding.decode(bytes);

    if had_errors {
        return Err(FetchError::Decode(format!(
            "{} decoding errors",
            encoding.name()
        )));
    }

    Ok(cow.into_owned())
}
