use crate::feed::source::{FetchFailure, PagedSource, RandomQuoteSource};
use crate::model::quote::{Quote, QuotePage};
use async_trait::async_trait;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://dummyjson.com/";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`QuotesApiClient`].
#[derive(Debug, Clone)]
pub struct QuotesApiConfig {
    /// API root; `quotes` and `quotes/random` are resolved against it.
    pub base_url: Url,
    /// Whole-request timeout, connect included.
    pub timeout: Duration,
}

impl Default for QuotesApiConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default quotes URL is valid"),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// reqwest-backed quotes API client.
#[derive(Debug, Clone)]
pub struct QuotesApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl QuotesApiClient {
    /// Builds the client.
    ///
    /// # Errors
    /// - `Transport` when the TLS backend cannot be initialized.
    pub fn new(config: &QuotesApiConfig) -> Result<Self, FetchFailure> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| FetchFailure::Transport(err.to_string()))?;
        Ok(Self {
            http,
            base_url: with_trailing_slash(config.base_url.clone()),
        })
    }

    /// `GET {base}/quotes?limit=..&skip=..`
    pub fn page_url(&self, limit: u32, skip: u32) -> Url {
        let mut url = self.endpoint("quotes");
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("skip", &skip.to_string());
        url
    }

    /// `GET {base}/quotes/random`
    pub fn random_url(&self) -> Url {
        self.endpoint("quotes/random")
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let base_path = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{base_path}/{path}"));
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchFailure> {
        let started_at = Instant::now();
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|err| FetchFailure::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                "event=api_request module=api status=error http_status={} path={} duration_ms={}",
                status.as_u16(),
                url.path(),
                started_at.elapsed().as_millis()
            );
            return Err(FetchFailure::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| FetchFailure::Transport(err.to_string()))?;
        debug!(
            "event=api_request module=api status=ok path={} bytes={} duration_ms={}",
            url.path(),
            body.len(),
            started_at.elapsed().as_millis()
        );
        serde_json::from_slice(&body).map_err(|err| FetchFailure::Decode(err.to_string()))
    }
}

#[async_trait]
impl PagedSource for QuotesApiClient {
    async fn fetch_page(&self, limit: u32, skip: u32) -> Result<QuotePage, FetchFailure> {
        self.get_json(self.page_url(limit, skip)).await
    }
}

#[async_trait]
impl RandomQuoteSource for QuotesApiClient {
    async fn fetch_random(&self) -> Result<Quote, FetchFailure> {
        self.get_json(self.random_url()).await
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
