//! HTTP backend with optional script rendering and link pagination.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use url::Url;

use super::{
    check_page_cap, elapsed_ms, http_error_message, next_page_url, record_transport_error,
    BackendKind, ScrapeBackend,
};
use crate::browser::ScriptRenderer;
use crate::config::ScrapeConfig;
use crate::error::{ConfigError, RenderError, ScrapeError};
use crate::http_client::{FetchRequest, HttpTransport};
use crate::models::{ScrapeResult, ScrapeStatus};

const BACKEND: &str = "scriptable";

/// Fetches pages over HTTP, renders them when scripts are requested, and
/// follows "next" links found in each document.
pub struct ScriptableFetchScraper {
    transport: Arc<dyn HttpTransport>,
    renderer: Option<Arc<dyn ScriptRenderer>>,
}

impl ScriptableFetchScraper {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            renderer: None,
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn ScriptRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    async fn render(
        &self,
        url: &str,
        body: String,
        config: &ScrapeConfig,
    ) -> Result<String, RenderError> {
        match (&self.renderer, config.javascript) {
            (Some(renderer), true) => renderer.render(url, &body, config).await,
            _ => Ok(body),
        }
    }
}

#[async_trait]
impl ScrapeBackend for ScriptableFetchScraper {
    fn kind(&self) -> BackendKind {
        BackendKind::Scriptable
    }

    fn validate(&self, config: &ScrapeConfig) -> Result<(), ConfigError> {
        let unsupported = |reason: &'static str| ConfigError::Unsupported {
            backend: BACKEND,
            reason,
        };

        check_page_cap(config)?;
        if config.next_button.is_some() {
            return Err(unsupported("a next button"));
        }
        if !config.wait_conditions.is_empty() {
            return Err(unsupported("wait conditions"));
        }
        if config.javascript && self.renderer.is_none() {
            return Err(unsupported("javascript without a script renderer"));
        }
        Ok(())
    }

    async fn scrape(&self, config: &ScrapeConfig) -> Result<ScrapeResult, ScrapeError> {
        self.validate(config)?;

        let mut result = ScrapeResult::new(config.url());
        let mut url = config.url().to_string();
        // Links are compared in their parsed form
        let start = Url::parse(&url).map(String::from).unwrap_or_else(|_| url.clone());
        let mut visited = HashSet::from([start]);

        loop {
            info!("Fetching page {} from {}", result.len() + 1, url);
            let started = Instant::now();

            let response = match self.transport.get(&FetchRequest::from_config(config, &url)).await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!("Request to {} failed: {}", url, e);
                    record_transport_error(&mut result, &e);
                    break;
                }
            };
            if result.caller_ip().is_none() {
                result.set_caller_ip(response.local_ip);
            }
            if !response.is_success() {
                warn!("{} returned HTTP {}", url, response.status);
                result.fail(ScrapeStatus::Error, http_error_message(response.status));
                break;
            }

            let html = match self.render(&url, response.body, config).await {
                Ok(html) => html,
                // Nothing collected yet: the environment is unusable
                Err(RenderError::Setup(e)) if result.is_empty() => return Err(e.into()),
                Err(e) => {
                    warn!("Rendering {} failed: {}", url, e);
                    result.fail(ScrapeStatus::Error, e.to_string());
                    break;
                }
            };

            let next = if config.attempt_multi_page {
                next_page_url(&html, &url)
            } else {
                None
            };

            result.add_page(html, elapsed_ms(started), ScrapeStatus::Success);
            result.set_status(ScrapeStatus::Success);

            if result.len() >= config.max_pages {
                info!("Reached page limit ({})", config.max_pages);
                break;
            }
            if !config.attempt_multi_page {
                break;
            }

            match next {
                Some(next) if visited.insert(next.clone()) => {
                    debug!("Next page: {}", next);
                    url = next;
                }
                Some(next) => {
                    debug!("Next page {} already fetched, stopping", next);
                    break;
                }
                None => {
                    debug!("No next page link on {}", url);
                    break;
                }
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::{FakeFactory, FakePage};
    use crate::browser::SessionRenderer;
    use crate::config::{WaitCondition, WaitLocator};
    use crate::error::TransportError;
    use crate::http_client::fake::FakeTransport;
    use std::time::Duration;

    const BASE: &str = "http://example.com";

    fn chain(pages: usize) -> FakeTransport {
        (1..=pages).fold(FakeTransport::new(), |t, n| {
            let next = if n < pages {
                format!(r#"<a href="/page{}.html">Next</a>"#, n + 1)
            } else {
                String::new()
            };
            t.page(
                &format!("{}/page{}.html", BASE, n),
                200,
                &format!("<h1>Page {}</h1>{}", n, next),
            )
        })
    }

    fn config() -> ScrapeConfig {
        ScrapeConfig::new(format!("{}/page1.html", BASE))
            .unwrap()
            .with_multi_page()
    }

    #[test]
    fn test_validate() {
        let s = ScriptableFetchScraper::new(Arc::new(FakeTransport::new()));
        let locator = WaitLocator::xpath("//a").unwrap();

        assert!(s.validate(&config()).is_ok());
        assert!(s.validate(&config().with_next_button(locator.clone())).is_err());
        assert!(s
            .validate(&config().with_wait_condition(WaitCondition::optional(locator)))
            .is_err());
        assert!(matches!(
            s.validate(&config().with_javascript(Duration::from_millis(1))),
            Err(ConfigError::Unsupported { backend: "scriptable", .. })
        ));
    }

    #[tokio::test]
    async fn test_follows_links_until_none_left() {
        let transport = Arc::new(chain(3));
        let s = ScriptableFetchScraper::new(transport.clone());
        let result = s.scrape(&config()).await.unwrap();

        assert!(result.is_success());
        assert_eq!(result.len(), 3);
        for (n, page) in result.iter().enumerate() {
            assert!(page.html().contains(&format!("Page {}", n + 1)));
            assert_eq!(page.status(), ScrapeStatus::Success);
        }
        assert_eq!(transport.requested_urls().len(), 3);
    }

    #[tokio::test]
    async fn test_page_cap_is_exact() {
        let s = ScriptableFetchScraper::new(Arc::new(chain(5)));

        let result = s.scrape(&config().with_max_pages(3)).await.unwrap();
        assert_eq!(result.len(), 3);

        let result = s.scrape(&config().with_max_pages(1)).await.unwrap();
        assert_eq!(result.len(), 1);
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_zero_page_cap_is_rejected() {
        let transport = Arc::new(chain(2));
        let s = ScriptableFetchScraper::new(transport.clone());

        let err = s.scrape(&config().with_max_pages(0)).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Config(ConfigError::ZeroPageCap)));
        assert!(transport.requested_urls().is_empty());
    }

    #[tokio::test]
    async fn test_single_page_without_pagination() {
        let s = ScriptableFetchScraper::new(Arc::new(chain(3)));
        let config = ScrapeConfig::new(format!("{}/page1.html", BASE)).unwrap();
        let result = s.scrape(&config).await.unwrap();
        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn test_mid_crawl_failure_keeps_pages() {
        let transport = chain(2).failing(
            &format!("{}/page2.html", BASE),
            TransportError::Timeout("slow".into()),
        );
        let s = ScriptableFetchScraper::new(Arc::new(transport));
        let result = s.scrape(&config()).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result.status(), ScrapeStatus::Timeout);
        assert!(!result.is_success());
        assert!(result.error().unwrap().contains("slow"));
    }

    #[tokio::test]
    async fn test_http_error_mid_crawl() {
        let transport = chain(2).page(&format!("{}/page2.html", BASE), 500, "oops");
        let s = ScriptableFetchScraper::new(Arc::new(transport));
        let result = s.scrape(&config()).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result.status(), ScrapeStatus::Error);
        assert_eq!(result.error(), Some("HTTP Error: 500 - Internal Server Error"));
    }

    #[tokio::test]
    async fn test_link_cycle_stops() {
        let url = format!("{}/page1.html", BASE);
        let transport =
            FakeTransport::new().page(&url, 200, r#"<a href="/page1.html">Next</a>"#);
        let s = ScriptableFetchScraper::new(Arc::new(transport));
        let result = s.scrape(&config()).await.unwrap();

        assert_eq!(result.len(), 1);
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_link_back_to_unnormalized_start_url_stops() {
        let start = "http://Example.com/page1.html";
        let body = r#"<a href="/page1.html">Next</a>"#;
        let transport = Arc::new(
            FakeTransport::new()
                .page(start, 200, body)
                .page(&format!("{}/page1.html", BASE), 200, body),
        );
        let s = ScriptableFetchScraper::new(transport.clone());
        let config = ScrapeConfig::new(start).unwrap().with_multi_page();
        let result = s.scrape(&config).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(transport.requested_urls(), vec![start.to_string()]);
    }

    #[tokio::test]
    async fn test_javascript_pages_are_rendered() {
        let factory = FakeFactory::new(vec![FakePage::new("<p>LOADED-Javascript Line</p>")]);
        let renderer = Arc::new(SessionRenderer::new(factory));
        let s = ScriptableFetchScraper::new(Arc::new(chain(1))).with_renderer(renderer);

        let config = config().with_javascript(Duration::from_millis(1));
        let result = s.scrape(&config).await.unwrap();

        assert!(result.is_success());
        assert!(result.first_page().unwrap().html().contains("LOADED-Javascript"));
    }

    #[tokio::test]
    async fn test_renderer_setup_failure_is_raised() {
        let factory = FakeFactory::new(vec![]).failing_open();
        let renderer = Arc::new(SessionRenderer::new(factory));
        let s = ScriptableFetchScraper::new(Arc::new(chain(1))).with_renderer(renderer);

        let config = config().with_javascript(Duration::from_millis(1));
        assert!(matches!(s.scrape(&config).await, Err(ScrapeError::Setup(_))));
    }
}
