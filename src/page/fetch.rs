//! Content fetch strategies.
//!
//! The monitor is polymorphic over [`PageFetcher`]: a lightweight HTTP
//! GET strategy that sees static markup only, and a full browser
//! strategy (feature `browser`) that sees script-injected values. The
//! strategy is picked at startup and never switched mid-session.

use crate::config::{Config, FetchEngine};
use crate::error::FetchError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use wreq::Client;
use wreq_util::Emulation;

/// Trait for page content acquisition - enables mocking for tests.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches the rendered content of a URL, enforcing the configured
    /// timeout regardless of the backend's own limits.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;

    /// Releases backend resources. The polling loop calls this exactly
    /// once, on every exit path.
    async fn close(&mut self) -> Result<(), FetchError>;

    /// Strategy name for logs.
    fn name(&self) -> &'static str;
}

/// Builds the fetch strategy selected in the configuration.
pub async fn build(config: &Config) -> Result<Box<dyn PageFetcher>, FetchError> {
    match config.engine {
        FetchEngine::Static => {
            let fetcher = HttpFetcher::new(config.timeout(), config.proxy.as_deref())?;
            Ok(Box::new(fetcher))
        }
        #[cfg(feature = "browser")]
        FetchEngine::Browser => {
            let fetcher = crate::page::browser::BrowserFetcher::launch(config.timeout()).await?;
            Ok(Box::new(fetcher))
        }
        #[cfg(not(feature = "browser"))]
        FetchEngine::Browser => Err(FetchError::BackendUnavailable(
            "this build does not include the browser engine (enable the 'browser' feature)"
                .to_string(),
        )),
    }
}

/// Static HTTP GET strategy with browser impersonation.
///
/// Cannot see content injected by page scripts; use the browser engine
/// for those pages.
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Creates a new HTTP fetcher with the given request timeout.
    pub fn new(timeout: Duration, proxy: Option<&str>) -> Result<Self, FetchError> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url)
                .map_err(|e| FetchError::BackendUnavailable(format!("bad proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        let client =
            builder.build().map_err(|e| FetchError::BackendUnavailable(e.to_string()))?;

        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        debug!("GET {}", url);

        let request = async {
            let response = self
                .client
                .get(url)
                .emulation(Emulation::Chrome131)
                .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
                .header("Accept-Language", "en-US,en;q=0.9")
                .header("Cache-Control", "no-cache")
                .header("Upgrade-Insecure-Requests", "1")
                .send()
                .await
                .map_err(|e| FetchError::Network(e.to_string()))?;

            let status = response.status();
            debug!("Response status: {}", status);
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }

            response.text().await.map_err(|e| FetchError::Network(e.to_string()))
        };

        tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))?
    }

    async fn close(&mut self) -> Result<(), FetchError> {
        // No long-lived backend session behind plain GETs.
        debug!("HTTP fetcher closed");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_fetcher(timeout: Duration) -> HttpFetcher {
        HttpFetcher::new(timeout, None).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let mock_server = MockServer::start().await;

        let html = "<html><body><span>1.234,56</span></body></html>";
        Mock::given(method("GET"))
            .and(path("/quote"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&mock_server)
            .await;

        let fetcher = make_fetcher(Duration::from_secs(5));
        let body = fetcher.fetch(&format!("{}/quote", mock_server.uri())).await.unwrap();
        assert!(body.contains("1.234,56"));
    }

    #[tokio::test]
    async fn test_fetch_empty_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .mount(&mock_server)
            .await;

        let fetcher = make_fetcher(Duration::from_secs(5));
        let body = fetcher.fetch(&mock_server.uri()).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_http_error_404() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let fetcher = make_fetcher(Duration::from_secs(5));
        let err = fetcher.fetch(&mock_server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(404)));
    }

    #[tokio::test]
    async fn test_fetch_http_error_500() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let fetcher = make_fetcher(Duration::from_secs(5));
        let err = fetcher.fetch(&mock_server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(500)));
    }

    #[tokio::test]
    async fn test_fetch_timeout_enforced() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("slow")
                    .set_delay(Duration::from_secs(30)),
            )
            .mount(&mock_server)
            .await;

        let fetcher = make_fetcher(Duration::from_millis(200));
        let err = fetcher.fetch(&mock_server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_fetch_network_error() {
        // Nothing listens on port 1.
        let fetcher = make_fetcher(Duration::from_secs(5));
        let err = fetcher.fetch("http://127.0.0.1:1/").await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_) | FetchError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_bad_proxy_is_backend_unavailable() {
        let result = HttpFetcher::new(Duration::from_secs(5), Some("not a proxy url"));
        assert!(matches!(result, Err(FetchError::BackendUnavailable(_))));
    }

    #[tokio::test]
    async fn test_close_is_idempotent_noop() {
        let mut fetcher = make_fetcher(Duration::from_secs(5));
        assert!(fetcher.close().await.is_ok());
        assert!(fetcher.close().await.is_ok());
    }

    #[test]
    fn test_name() {
        let fetcher = make_fetcher(Duration::from_secs(5));
        assert_eq!(fetcher.name(), "static");
    }
}
