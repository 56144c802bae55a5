//! HTTP existence oracle backed by the UN Official Document System.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;

use crate::OracleError;
use crate::oracle::ExistenceOracle;

pub const DEFAULT_BASE_URL: &str = "https://documents.un.org";

/// Existence oracle for `documents.un.org/api/symbol/access`.
///
/// The endpoint redirects to the PDF when the symbol exists; otherwise it
/// answers 404 or serves an HTML error page.
pub struct HttpOracle {
    client: reqwest::Client,
    base_url: String,
    language: String,
    timeout: Duration,
}

impl HttpOracle {
    /// Create a new oracle for the given base URL.
    ///
    /// `base_url` should be like `https://documents.un.org` (no trailing slash).
    pub fn new(base_url: String, language: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            language,
            timeout: Duration::from_secs(10),
        }
    }

    /// Per-request timeout (default 10s).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn access_url(&self) -> String {
        format!("{}/api/symbol/access", self.base_url)
    }

    fn query<'a>(&'a self, symbol: &'a str) -> [(&'static str, &'a str); 3] {
        [("s", symbol), ("l", self.language.as_str()), ("t", "pdf")]
    }
}

#[async_trait]
impl ExistenceOracle for HttpOracle {
    async fn exists(&self, symbol: &str) -> Result<bool, OracleError> {
        let resp = self
            .client
            .head(self.access_url())
            .query(&self.query(symbol))
            .timeout(self.timeout)
            .send()
            .await?;
        let status = resp.status();

        // Only 404 confirms absence; any other failure leaves the position uncertain.
        if status == StatusCode::NOT_FOUND {
            debug!(symbol, "symbol absent");
            return Ok(false);
        }
        if !status.is_success() {
            return Err(OracleError::Server {
                status: status.as_u16(),
                body: String::new(),
            });
        }

        // Unknown symbols can come back as a 200 HTML error page.
        let is_pdf = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("pdf"));
        debug!(symbol, is_pdf, "symbol probed");
        Ok(is_pdf)
    }

    async fn fetch(&self, symbol: &str) -> Result<Vec<u8>, OracleError> {
        let resp = self
            .client
            .get(self.access_url())
            .query(&self.query(symbol))
            .timeout(self.timeout)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OracleError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            return Err(OracleError::Malformed {
                symbol: symbol.to_string(),
                reason: "empty body".into(),
            });
        }
        Ok(bytes.to_vec())
    }
}

#[cfg(all(test, feature = "http"))]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn oracle(server: &MockServer) -> HttpOracle {
        HttpOracle::new(server.uri(), "en".into()).with_timeout(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn pdf_response_means_exists() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/api/symbol/access"))
            .and(query_param("s", "A/80/L.1"))
            .and(query_param("l", "en"))
            .and(query_param("t", "pdf"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "application/pdf"))
            .expect(1)
            .mount(&server)
            .await;

        assert!(oracle(&server).await.exists("A/80/L.1").await.unwrap());
    }

    #[tokio::test]
    async fn not_found_means_absent() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/api/symbol/access"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        assert!(!oracle(&server).await.exists("A/80/L.999").await.unwrap());
    }

    #[tokio::test]
    async fn html_error_page_means_absent() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/api/symbol/access"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
            .mount(&server)
            .await;

        assert!(!oracle(&server).await.exists("A/80/L.999").await.unwrap());
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/api/symbol/access"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = oracle(&server).await.exists("A/80/L.1").await.unwrap_err();
        assert!(matches!(err, OracleError::Server { status: 503, .. }));
    }

    #[tokio::test]
    async fn rate_limit_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/api/symbol/access"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        assert!(oracle(&server).await.exists("A/80/L.1").await.is_err());
    }

    #[tokio::test]
    async fn client_errors_other_than_404_are_transient() {
        for code in [400u16, 401, 403, 410] {
            let server = MockServer::start().await;
            Mock::given(method("HEAD"))
                .and(path("/api/symbol/access"))
                .respond_with(ResponseTemplate::new(code))
                .mount(&server)
                .await;

            let err = oracle(&server).await.exists("A/80/L.1").await.unwrap_err();
            assert!(
                matches!(err, OracleError::Server { status, .. } if status == code),
                "{code}: {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn fetch_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/symbol/access"))
            .and(query_param("s", "A/RES/80/1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/pdf")
                    .set_body_bytes(b"%PDF-1.7 body".to_vec()),
            )
            .mount(&server)
            .await;

        let bytes = oracle(&server).await.fetch("A/RES/80/1").await.unwrap();
        assert_eq!(bytes, b"%PDF-1.7 body");
    }

    #[tokio::test]
    async fn fetch_empty_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/symbol/access"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let err = oracle(&server).await.fetch("A/RES/80/1").await.unwrap_err();
        assert!(matches!(err, OracleError::Malformed { .. }));
    }

    #[tokio::test]
    async fn fetch_error_status_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/symbol/access"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = oracle(&server).await.fetch("A/RES/80/1").await.unwrap_err();
        match err {
            OracleError::Server { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn oracle_trims_trailing_slash() {
        let oracle = HttpOracle::new("https://documents.un.org/".into(), "en".into());
        assert_eq!(oracle.base_url, "https://documents.un.org");
        assert_eq!(oracle.access_url(), "https://documents.un.org/api/symbol/access");
    }
}
