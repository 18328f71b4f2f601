use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

/// Site base every relative filing link resolves against.
pub const EDGAR_BASE_URL: &str = "https://www.sec.gov/";

/// Default identification the SEC asks automated clients to send.
const DEFAULT_USER_AGENT: &str = "software@example.com";

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// SEC courtesy limit on simultaneous requests.
const MAX_CONCURRENT_FETCHES: usize = 10;

/// The one capability parsers need from the outside world. Implementations
/// own transport details (headers, timeouts, limits); the orchestrator maps
/// any error to "this document contributed nothing".
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch_document(&self, url: &Url) -> Result<String>;
}

/// Caps in-flight requests so a filing's worth of statement fetches cannot
/// exceed the SEC's courtesy limit.
struct FetchLimiter {
    semaphore: Arc<Semaphore>,
}

impl FetchLimiter {
    fn new(max_concurrent: usize) -> Self {
        FetchLimiter {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    async fn acquire(&self) -> tokio::sync::SemaphorePermit<'_> {
        self.semaphore.acquire().await.expect("semaphore closed")
    }
}

/// HTTP fetcher for EDGAR pages.
pub struct EdgarClient {
    client: Client,
    limiter: FetchLimiter,
    base_url: Url,
}

impl EdgarClient {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(FETCH_TIMEOUT)
            .gzip(true)
            .build()?;
        Ok(EdgarClient {
            client,
            limiter: FetchLimiter::new(MAX_CONCURRENT_FETCHES),
            base_url: Url::parse(EDGAR_BASE_URL)?,
        })
    }

    /// Build a client from the environment: `EDGAR_USER_AGENT` overrides the
    /// identification header, `EDGAR_BASE_URL` points discovery at a
    /// different host (used by tests and mirrors).
    pub fn from_env() -> Result<Self> {
        let user_agent = std::env::var("EDGAR_USER_AGENT")
            .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());
        let mut client = Self::new(&user_agent)?;
        if let Ok(base) = std::env::var("EDGAR_BASE_URL") {
            client.base_url = Url::parse(&base)?;
        }
        Ok(client)
    }

    /// Resolve a site-relative link (a viewer href, a manifest filename)
    /// against the configured base.
    pub fn resolve(&self, link: &str) -> Result<Url> {
        Ok(self.base_url.join(link)?)
    }

    /// Company feed URL used to resolve a ticker symbol to its CIK.
    pub fn cik_feed_url(&self, symbol: &str) -> Result<Url> {
        let mut url = self.base_url.join("cgi-bin/browse-edgar")?;
        url.query_pairs_mut()
            .append_pair("action", "getcompany")
            .append_pair("output", "xml")
            .append_pair("CIK", symbol);
        Ok(url)
    }

    /// Browse-query URL listing a company's filings of one type.
    pub fn query_url(&self, symbol: &str, filing_type: &str) -> Result<Url> {
        let mut url = self.base_url.join("cgi-bin/browse-edgar")?;
        url.query_pairs_mut()
            .append_pair("action", "getcompany")
            .append_pair("CIK", symbol)
            .append_pair("type", filing_type)
            .append_pair("dateb", "")
            .append_pair("owner", "exclude")
            .append_pair("count", "10");
        Ok(url)
    }
}

#[async_trait]
impl DocumentFetcher for EdgarClient {
    async fn fetch_document(&self, url: &Url) -> Result<String> {
        let _permit = self.limiter.acquire().await;
        debug!("fetching {}", url);

        let response = self.client.get(url.as_str()).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("fetch of {} failed: HTTP {}", url, response.status()));
        }

        let body = response.text().await?;
        debug!("fetched {} ({} bytes)", url, body.len());
        Ok(body)
    }
}
