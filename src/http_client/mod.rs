//! HTTP transport used by the fetch backends.

mod user_agent;

#[cfg(test)]
pub(crate) mod fake;

pub use user_agent::{default_user_agent, resolve_user_agent, BROWSER_USER_AGENTS};

use std::error::Error as _;
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Proxy, StatusCode};
use tracing::debug;

use crate::config::ScrapeConfig;
use crate::error::TransportError;

/// A single GET request.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub timeout: Duration,
    pub proxy_http: Option<String>,
    pub proxy_https: Option<String>,
    pub user_agent: String,
    pub verify_tls: bool,
}

impl FetchRequest {
    /// Request for `url` using the transport settings of `config`.
    pub fn from_config(config: &ScrapeConfig, url: &str) -> Self {
        Self {
            url: url.to_string(),
            timeout: config.request_timeout,
            proxy_http: config.proxy_http.clone(),
            proxy_https: config.proxy_https.clone(),
            user_agent: resolve_user_agent(config.user_agent.as_deref()),
            verify_tls: config.verify_tls,
        }
    }

    pub fn has_proxy(&self) -> bool {
        self.proxy_http.is_some() || self.proxy_https.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
    /// Address the request left from, when the transport knows it.
    pub local_ip: Option<IpAddr>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Reason phrase for an HTTP status code, empty when unknown.
pub fn status_reason(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, request: &FetchRequest) -> Result<FetchResponse, TransportError>;
}

/// [`HttpTransport`] over reqwest.
///
/// A client is built for every request, so proxy and TLS settings always
/// come from the request and no connections outlive it.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport;

impl ReqwestTransport {
    pub fn new() -> Self {
        Self
    }

    fn client(request: &FetchRequest) -> Result<Client, TransportError> {
        let mut builder = Client::builder()
            .user_agent(&request.user_agent)
            .timeout(request.timeout)
            .gzip(true)
            .brotli(true)
            .danger_accept_invalid_certs(!request.verify_tls)
            // Only the proxies configured on the request apply
            .no_proxy();

        if let Some(ref proxy) = request.proxy_http {
            let proxy =
                Proxy::http(proxy.as_str()).map_err(|e| TransportError::Proxy(e.to_string()))?;
            builder = builder.proxy(proxy);
        }
        if let Some(ref proxy) = request.proxy_https {
            let proxy =
                Proxy::https(proxy.as_str()).map_err(|e| TransportError::Proxy(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        builder
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))
    }
}

/// Map a reqwest failure onto the transport error kinds.
fn classify(err: reqwest::Error, proxied: bool) -> TransportError {
    let mut detail = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        detail.push_str(": ");
        detail.push_str(&inner.to_string());
        source = inner.source();
    }

    if err.is_timeout() {
        return TransportError::Timeout(detail);
    }

    let lower = detail.to_lowercase();
    if lower.contains("certificate") || lower.contains("tls") || lower.contains("handshake") {
        TransportError::Tls(detail)
    } else if proxied && (err.is_connect() || lower.contains("proxy")) {
        TransportError::Proxy(detail)
    } else {
        TransportError::Other(detail)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, request: &FetchRequest) -> Result<FetchResponse, TransportError> {
        let client = Self::client(request)?;
        let proxied = request.has_proxy();

        debug!("GET {}", request.url);
        let response = client
            .get(&request.url)
            .send()
            .await
            .map_err(|e| classify(e, proxied))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| classify(e, proxied))?;

        Ok(FetchResponse {
            status,
            body,
            local_ip: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(599), "");
    }

    #[test]
    fn test_request_from_config() {
        let config = ScrapeConfig::new("https://example.com")
            .unwrap()
            .with_user_agent("TestAgent/2.0")
            .with_proxies(None, Some("http://127.0.0.1:3128".to_string()));

        let request = FetchRequest::from_config(&config, "https://example.com/page/2");
        assert_eq!(request.url, "https://example.com/page/2");
        assert_eq!(request.user_agent, "TestAgent/2.0");
        assert_eq!(request.timeout, config.request_timeout);
        assert!(request.has_proxy());
        assert!(request.verify_tls);
    }

    #[test]
    fn test_response_success_range() {
        let ok = FetchResponse {
            status: 204,
            body: String::new(),
            local_ip: None,
        };
        let redirect = FetchResponse { status: 301, ..ok.clone() };
        assert!(ok.is_success());
        assert!(!redirect.is_success());
    }

    #[tokio::test]
    async fn test_invalid_proxy_is_proxy_error() {
        let config = ScrapeConfig::new("http://example.com")
            .unwrap()
            .with_proxies(Some("http://[invalid".to_string()), None);
        let request = FetchRequest::from_config(&config, "http://example.com");

        let err = ReqwestTransport::new().get(&request).await.unwrap_err();
        assert!(matches!(err, TransportError::Proxy(_)));
    }
}
