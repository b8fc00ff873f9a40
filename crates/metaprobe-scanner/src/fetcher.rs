//! HTTP retrieval with separate page and file timeouts.
//!
//! Non-2xx statuses are returned to the caller rather than raised; only
//! transport failures (timeouts, DNS, refused connections) are errors.
//! Redirects are followed only while they stay on the origin of the first
//! request.

use crate::error::{Result, ScanError};
use metaprobe_core::CrawlerConfig;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect, Client};
use std::time::Duration;
use url::Url;

const MAX_REDIRECTS: usize = 10;

/// A fetched page. The body is only read when the response is a successful
/// HTML response.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects
    pub url: Url,
    /// HTTP status code
    pub status: u16,
    /// Raw `Content-Type` header, if any
    pub content_type: Option<String>,
    /// Page body (empty unless [`FetchedPage::is_html`] and successful)
    pub body: String,
}

impl FetchedPage {
    /// 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Content type contains `text/html`.
    #[must_use]
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("text/html"))
    }
}

/// A fetched file. Bytes are only read on a 2xx status.
#[derive(Debug, Clone)]
pub struct FetchedFile {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub bytes: Vec<u8>,
}

impl FetchedFile {
    /// 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Shared HTTP client for all scan jobs.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    page_timeout: Duration,
    file_timeout: Duration,
}

impl Fetcher {
    /// Build a fetcher from crawler settings.
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(same_origin_redirects())
            .build()
            .map_err(|e| ScanError::Client(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            page_timeout: config.page_timeout(),
            file_timeout: config.file_timeout(),
        })
    }

    /// Fetch a page, reading the body only for successful HTML responses.
    pub async fn fetch_page(&self, url: &Url) -> Result<FetchedPage> {
        tracing::debug!("GET page {}", url);
        let response = self
            .client
            .get(url.clone())
            .timeout(self.page_timeout)
            .send()
            .await
            .map_err(|e| network(url, e))?;

        let mut page = FetchedPage {
            url: response.url().clone(),
            status: response.status().as_u16(),
            content_type: response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string),
            body: String::new(),
        };

        if page.is_success() && page.is_html() {
            page.body = response.text().await.map_err(|e| network(url, e))?;
        }

        Ok(page)
    }

    /// Fetch a file, reading the body only on a 2xx status.
    pub async fn fetch_file(&self, url: &Url) -> Result<FetchedFile> {
        tracing::debug!("GET file {}", url);
        let response = self
            .client
            .get(url.clone())
            .timeout(self.file_timeout)
            .send()
            .await
            .map_err(|e| network(url, e))?;

        let status = response.status().as_u16();
        let bytes = if response.status().is_success() {
            response
                .bytes()
                .await
                .map_err(|e| network(url, e))?
                .to_vec()
        } else {
            Vec::new()
        };

        Ok(FetchedFile { status, bytes })
    }
}

fn network(url: &Url, source: reqwest::Error) -> ScanError {
    ScanError::Network {
        url: url.to_string(),
        source,
    }
}

fn same_origin_redirects() -> redirect::Policy {
    redirect::Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        let same_origin = attempt
            .previous()
            .first()
            .is_some_and(|first| first.origin() == attempt.url().origin());
        if same_origin {
            attempt.follow()
        } else {
            tracing::debug!("Not following cross-origin redirect to {}", attempt.url());
            attempt.stop()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> Fetcher {
        Fetcher::new(&CrawlerConfig::default()).expect("build fetcher")
    }

    #[tokio::test]
    async fn test_fetch_html_page() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body("<a href=\"/x\">x</a>")
            .create_async()
            .await;

        let url = Url::parse(&server.url()).expect("server url");
        let page = fetcher().fetch_page(&url).await.expect("fetch page");

        assert!(page.is_success());
        assert!(page.is_html());
        assert!(page.body.contains("href"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_html_page_body_is_not_read() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/feed")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{}")
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/feed", server.url())).expect("url");
        let page = fetcher().fetch_page(&url).await.expect("fetch page");

        assert!(!page.is_html());
        assert!(page.body.is_empty());
    }

    #[tokio::test]
    async fn test_file_status_is_reported_not_raised() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing.pdf")
            .with_status(404)
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/missing.pdf", server.url())).expect("url");
        let file = fetcher().fetch_file(&url).await.expect("fetch file");

        assert_eq!(file.status, 404);
        assert!(!file.is_success());
        assert!(file.bytes.is_empty());
    }

    #[tokio::test]
    async fn test_cross_origin_redirect_is_not_followed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/go")
            .with_status(302)
            .with_header("location", "http://external.invalid/file.pdf")
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/go", server.url())).expect("url");
        let file = fetcher().fetch_file(&url).await.expect("fetch file");

        assert_eq!(file.status, 302);
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let url = Url::parse("http://127.0.0.1:9/a.pdf").expect("url");
        let err = fetcher().fetch_file(&url).await.expect_err("refused");
        assert!(matches!(err, ScanError::Network { .. }));
    }
}
