//! HTTP fetcher implementation backed by reqwest

use std::sync::Arc;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client as ReqwestClient;
use tracing::{debug, debug_span, instrument, Instrument};
use url::Url;

use crate::fetcher::{FetchError, FetchedDocument, Fetcher, FetcherConfig};

/// Fetches pages over HTTP with a bounded timeout
#[derive(Clone)]
pub struct HttpFetcher {
    /// The underlying reqwest client
    client: ReqwestClient,

    /// Shared limiter when a global request rate is configured
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl HttpFetcher {
    /// Create a fetcher from configuration
    pub fn new(config: &FetcherConfig) -> Result<Self, FetchError> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        let limiter = config
            .requests_per_second
            .map(|rps| Arc::new(RateLimiter::direct(Quota::per_second(rps))));

        Ok(Self { client, limiter })
    }

    /// Send a single GET request and read the body as text
    #[instrument(skip(self), fields(url = %url), level = "debug")]
    async fn get(&self, url: &Url) -> Result<FetchedDocument, FetchError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().instrument(debug_span!("limiter")).await;
        }

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            debug!("Non-success status {} for {}", status, url);
            return Err(FetchError::Status(status.as_u16()));
        }

        let html = response.text().await.map_err(map_transport_error)?;
        debug!("Fetched {} bytes from {}", html.len(), url);

        Ok(FetchedDocument::success(url.as_str(), html))
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedDocument, FetchError> {
        self.get(url).await
    }
}

fn map_transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Http(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FetchStatus;
    use mockito::Server;

    fn page_url(server: &Server, path: &str) -> Url {
        Url::parse(&format!("{}{}", server.url(), path)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let mut server = Server::new_async().await;
        let mock_server = server
            .mock("GET", "/home")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html><head><title>Home</title></head></html>")
            .match_header("user-agent", "enricher-test")
            .expect(1)
            .create_async()
            .await;

        let config = FetcherConfig::builder().user_agent("enricher-test").build();
        let fetcher = HttpFetcher::new(&config).unwrap();

        let doc = fetcher.fetch(&page_url(&server, "/home")).await.unwrap();
        assert_eq!(doc.status, FetchStatus::Success);
        assert!(doc.html.contains("<title>Home</title>"));

        mock_server.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let mut server = Server::new_async().await;
        let mock_server = server
            .mock("GET", "/missing")
            .with_status(404)
            .with_body("Not Found")
            .expect(1)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(&FetcherConfig::default()).unwrap();
        let result = fetcher.fetch(&page_url(&server, "/missing")).await;

        assert!(matches!(result, Err(FetchError::Status(404))));
        mock_server.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_single_attempt_on_server_error() {
        let mut server = Server::new_async().await;
        let mock_server = server
            .mock("GET", "/flaky")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(&FetcherConfig::default()).unwrap();
        let err = fetcher
            .fetch(&page_url(&server, "/flaky"))
            .await
            .unwrap_err();

        assert_eq!(err.status(), FetchStatus::FetchError);
        mock_server.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Port 9 (discard) is not expected to be listening on localhost
        let fetcher = HttpFetcher::new(&FetcherConfig::builder().timeout_secs(2).build()).unwrap();
        let url = Url::parse("http://127.0.0.1:9/").unwrap();

        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Http(_) | FetchError::Timeout));
    }

    #[tokio::test]
    async fn test_fetch_with_rate_limit() {
        let mut server = Server::new_async().await;
        let mock_server = server
            .mock("GET", "/")
            .with_status(200)
            .with_body("<html></html>")
            .expect(2)
            .create_async()
            .await;

        let config = FetcherConfig::builder().requests_per_second(50).build();
        let fetcher = HttpFetcher::new(&config).unwrap();
        let url = page_url(&server, "/");

        assert!(fetcher.fetch(&url).await.is_ok());
        assert!(fetcher.fetch(&url).await.is_ok());

        mock_server.assert_async().await;
    }
}
