//! Polite async HTTP fetcher wrapping reqwest.
//!
//! Every request picks a random user agent and opens a fresh connection
//! (the idle pool is disabled). Requests are limited per host by a
//! semaphore, and each network request keeps its slot for an extra random
//! delay after it completes. Successful responses are written to the
//! response cache; cache hits skip the limiter entirely.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use rand::seq::SliceRandom;
use rand::Rng;
use tokio::sync::Semaphore;
use url::Url;

use crate::cache::{CachedPage, ResponseCache};
use crate::config::CrawlConfig;
use crate::events::{CrawlEventKind, EventEmitter};
use crate::types::{CrawlError, CrawlResult};

/// Browser user agents rotated across requests.
pub const USER_AGENTS: [&str; 8] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.7; rv:132.0) Gecko/20100101 Firefox/132.0",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
];

/// A fetched page body.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Requested URL.
    pub url: String,
    pub status: u16,
    pub body: String,
    /// Served from the response cache rather than the network.
    pub from_cache: bool,
}

/// HTTP fetcher shared by all crawl tasks.
pub struct Fetcher {
    client: reqwest::Client,
    cache: Option<ResponseCache>,
    limits: DashMap<String, Arc<Semaphore>>,
    parallelism: usize,
    random_delay: Duration,
    events: Arc<EventEmitter>,
}

impl Fetcher {
    /// Build a fetcher from the crawl configuration.
    pub fn new(config: &CrawlConfig, events: Arc<EventEmitter>) -> CrawlResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(0)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            cache: config.cache_dir.as_ref().map(|dir| ResponseCache::new(dir.clone())),
            limits: DashMap::new(),
            parallelism: config.parallelism.max(1),
            random_delay: config.random_delay,
            events,
        })
    }

    /// Fetch a page, from the cache when possible.
    ///
    /// Every call emits a `Request` event, cached or not. Non-2xx responses
    /// and transport failures are reported as a `RequestFailed` event and
    /// returned as errors.
    pub async fn get(&self, url: &str, depth: u32) -> CrawlResult<FetchedPage> {
        self.events.emit(CrawlEventKind::Request {
            url: url.to_string(),
            depth,
        });

        if let Some(page) = self.cache.as_ref().and_then(|c| c.get(url)) {
            tracing::debug!("cache hit for {url}");
            self.events.emit(CrawlEventKind::CacheHit {
                url: url.to_string(),
            });
            return Ok(FetchedPage {
                url: page.url,
                status: page.status,
                body: page.body,
                from_cache: true,
            });
        }

        let result = self.get_network(url).await;
        if let Err(ref e) = result {
            let (status, message) = describe_error(e);
            tracing::warn!("request failed ({status}) {url}: {message}");
            self.events.emit(CrawlEventKind::RequestFailed {
                url: url.to_string(),
                status,
                message,
            });
        }
        result
    }

    async fn get_network(&self, url: &str) -> CrawlResult<FetchedPage> {
        let host = host_of(url)?;
        let limiter = self
            .limits
            .entry(host)
            .or_insert_with(|| Arc::new(Semaphore::new(self.parallelism)))
            .value()
            .clone();
        let _permit = limiter
            .acquire()
            .await
            .map_err(|_| CrawlError::Config("request limiter closed".to_string()))?;

        let result = self.send(url).await;

        let delay = random_delay(self.random_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let page = result?;
        if let Some(ref cache) = self.cache {
            let entry = CachedPage {
                url: page.url.clone(),
                status: page.status,
                body: page.body.clone(),
            };
            if let Err(e) = cache.put(&entry) {
                tracing::warn!("failed to cache {url}: {e}");
            }
        }
        Ok(page)
    }

    async fn send(&self, url: &str) -> CrawlResult<FetchedPage> {
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, random_user_agent())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CrawlError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = resp.text().await?;

        Ok(FetchedPage {
            url: url.to_string(),
            status: status.as_u16(),
            body,
            from_cache: false,
        })
    }
}

fn host_of(url: &str) -> CrawlResult<String> {
    let parsed = Url::parse(url).map_err(|e| CrawlError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    parsed
        .host_str()
        .map(|h| h.to_string())
        .ok_or_else(|| CrawlError::InvalidUrl {
            url: url.to_string(),
            reason: "missing host".to_string(),
        })
}

/// Status code and short message for a failed request.
fn describe_error(err: &CrawlError) -> (u16, String) {
    match err {
        CrawlError::Status { status, .. } => {
            let reason = reqwest::StatusCode::from_u16(*status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("HTTP error");
            (*status, reason.to_string())
        }
        CrawlError::Http(e) if e.is_timeout() => (0, "timed out".to_string()),
        CrawlError::Http(e) if e.is_connect() => (0, format!("connection failed: {e}")),
        other => (other.status_code(), other.to_string()),
    }
}

/// Pick a user agent at random.
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Uniform random delay in `[0, max)`.
pub fn random_delay(max: Duration) -> Duration {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..max_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetcher_creation() {
        let fetcher = Fetcher::new(&CrawlConfig::default(), Arc::new(EventEmitter::default()));
        assert!(fetcher.is_ok());
    }

    #[test]
    fn test_random_user_agent_comes_from_pool() {
        for _ in 0..20 {
            assert!(USER_AGENTS.contains(&random_user_agent()));
        }
    }

    #[test]
    fn test_random_delay_bounds() {
        assert_eq!(random_delay(Duration::ZERO), Duration::ZERO);
        for _ in 0..50 {
            assert!(random_delay(Duration::from_millis(40)) < Duration::from_millis(40));
        }
    }

    #[test]
    fn test_describe_status_error() {
        let err = CrawlError::Status {
            status: 404,
            url: "https://example.com/missing".into(),
        };
        assert_eq!(describe_error(&err), (404, "Not Found".to_string()));
    }

    #[test]
    fn test_host_of_rejects_relative() {
        assert!(host_of("/wiki/Finn").is_err());
        assert_eq!(host_of("https://example.com/wiki").unwrap(), "example.com");
    }
}
