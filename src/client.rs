use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use tracing::{instrument, warn};

use crate::error::ScrapeError;
use crate::hyresult_scraper;
use crate::model::ResultRecord;

/// Results pages are slow but should never take longer than this.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Fetches athlete result pages from hyresult.com.
///
/// `ResultsClient` wraps a [`reqwest::Client`] that looks like a desktop
/// browser and gives up after a fixed timeout.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> Result<(), hyrox_roast::ScrapeError> {
/// use hyrox_roast::ResultsClient;
///
/// let client = ResultsClient::new();
/// let result = client
///     .get_result("https://www.hyresult.com/result/LR3MS4JI2BA7B6")
///     .await?;
/// println!("{} finished in {}", result.athlete_name, result.total_time);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ResultsClient {
    http: reqwest::Client,
}

impl ResultsClient {
    /// Create a client with the default timeout.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    /// Create a client with browser headers and the given request timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "falling back to a default HTTP client");
                reqwest::Client::new()
            });
        Self { http }
    }

    /// Create a new client using the provided [`reqwest::Client`].
    ///
    /// Use this when you need to configure proxies, headers, etc.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { http: client }
    }

    /// Fetch a result page (splits tab) and extract the athlete's record.
    #[instrument(skip(self))]
    pub async fn get_result(&self, url: &str) -> Result<ResultRecord, ScrapeError> {
        hyresult_scraper::result::get_result(&self.http, url).await
    }
}

impl Default for ResultsClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract a record from an already downloaded result page.
pub fn parse_result_page(html: &str) -> ResultRecord {
    let document = hyresult_scraper::Html::parse_document(html);
    hyresult_scraper::result::parse_result(&document)
}
