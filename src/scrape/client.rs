use anyhow::{Context, Result};
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use thiserror::Error;
use tokio::time::{sleep, Duration};

const REQUEST_DELAY: Duration = Duration::from_millis(250);

/// A page as seen by the crawl: the raw status plus the body text. Status
/// handling is the paginator's job, so a non-2xx response is still `Ok`.
#[derive(Debug, Clone)]
pub struct FetchedPage {
	pub status: u16,
	pub body: String,
}

impl FetchedPage {
	pub fn ok(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

#[derive(Debug, Error)]
#[error("request for {url} failed: {source}")]
pub struct FetchError {
	url: String,
	#[source]
	source: reqwest::Error,
}

/// The crawl's view of HTTP. The paginator is generic over this so tests
/// can script page sequences without a network.
#[allow(async_fn_in_trait)]
pub trait PageFetcher {
	async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

pub struct HttpFetcher {
	client: reqwest::Client,
}

impl HttpFetcher {
	pub fn new() -> Result<Self> {
		let mut headers = HeaderMap::new();
		headers.insert(
			USER_AGENT,
			HeaderValue::from_static("Kaspersky-Threats-DB/0.1"),
		);

		let client = reqwest::Client::builder()
			.default_headers(headers)
			.build()
			.context("Failed to create HTTP client")?;

		Ok(Self { client })
	}
}

impl PageFetcher for HttpFetcher {
	async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
		debug!("GET {}", url);

		let response = self.client
			.get(url)
			.send()
			.await
			.map_err(|source| FetchError { url: url.to_string(), source })?;

		let status = response.status().as_u16();
		let body = response
			.text()
			.await
			.map_err(|source| FetchError { url: url.to_string(), source })?;

		sleep(REQUEST_DELAY).await;
		Ok(FetchedPage { status, body })
	}
}
