use std::time::Duration;

use async_trait::async_trait;
use thirtyfour::prelude::*;
use tokio::time::sleep;
use tracing::debug;

use crate::config::{
    Config, RENDER_POLL_INTERVAL_MS, RENDER_WAIT_TIMEOUT_SECS, SCROLL_PAUSE_SECS, SCROLL_ROUNDS,
    SITE_BASE_URL, USER_AGENT,
};
use crate::error::Result;
use crate::types::SearchQuery;

/// Build the results-page URL for one query: query text plus-encoded into the
/// path, price band as query parameters. `k0` is the all-categories segment.
pub fn build_search_url(query: &SearchQuery) -> String {
    let encoded = query.query.replace(' ', "+");
    format!(
        "{SITE_BASE_URL}/s-{encoded}/k0?priceFrom={}&priceTo={}",
        query.min_price, query.max_price
    )
}

/// Fetch seam — the driver only needs "rendered HTML for this query".
#[async_trait]
pub trait FetchListings {
    async fn fetch_rendered(&self, query: &SearchQuery) -> Result<String>;
}

/// Renders a query's first results page in a headless Chrome session behind a
/// WebDriver endpoint. One session per call, torn down on every exit path.
pub struct BrowserFetcher {
    webdriver_url: String,
}

impl BrowserFetcher {
    pub fn new(cfg: &Config) -> Self {
        Self {
            webdriver_url: cfg.webdriver_url.clone(),
        }
    }

    async fn capture(driver: &WebDriver, url: &str) -> Result<String> {
        driver.goto(url).await?;

        // The listing grid is hydrated lazily; scroll to the bottom a few
        // times so every tile on the first page is materialized.
        for _ in 0..SCROLL_ROUNDS {
            driver
                .execute("window.scrollTo(0, document.body.scrollHeight);", Vec::new())
                .await?;
            sleep(Duration::from_secs(SCROLL_PAUSE_SECS)).await;
        }
        Self::wait_for_ready(driver).await?;

        Ok(driver.source().await?)
    }

    /// Wait until the document reports itself fully loaded, bounded by
    /// [`RENDER_WAIT_TIMEOUT_SECS`]. A page still loading at the deadline is
    /// captured as-is.
    async fn wait_for_ready(driver: &WebDriver) -> Result<()> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(RENDER_WAIT_TIMEOUT_SECS);
        loop {
            let ret = driver
                .execute("return document.readyState;", Vec::new())
                .await?;
            if ret.json().as_str() == Some("complete") {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                debug!("document not complete after {RENDER_WAIT_TIMEOUT_SECS}s, capturing anyway");
                return Ok(());
            }
            sleep(Duration::from_millis(RENDER_POLL_INTERVAL_MS)).await;
        }
    }
}

#[async_trait]
impl FetchListings for BrowserFetcher {
    async fn fetch_rendered(&self, query: &SearchQuery) -> Result<String> {
        let url = build_search_url(query);
        debug!("fetching {url}");

        let mut caps = DesiredCapabilities::chrome();
        caps.add_arg("--headless=new")?;
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--disable-dev-shm-usage")?;
        caps.add_arg(&format!("--user-agent={USER_AGENT}"))?;

        let driver = WebDriver::new(self.webdriver_url.as_str(), caps).await?;
        // The session must be released on every path out of here, error or not.
        let captured = Self::capture(&driver, &url).await;
        let quit = driver.quit().await;
        let html = captured?;
        quit?;
        Ok(html)
    }
}
