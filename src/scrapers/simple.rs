//! Single-request backend.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{
    check_page_cap, elapsed_ms, http_error_message, record_transport_error, BackendKind,
    ScrapeBackend,
};
use crate::config::ScrapeConfig;
use crate::error::{ConfigError, ScrapeError};
use crate::http_client::{FetchRequest, HttpTransport};
use crate::models::{ScrapeResult, ScrapeStatus};

const BACKEND: &str = "simple";

/// Fetches exactly one page with a plain GET.
pub struct SimpleFetchScraper {
    transport: Arc<dyn HttpTransport>,
}

impl SimpleFetchScraper {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ScrapeBackend for SimpleFetchScraper {
    fn kind(&self) -> BackendKind {
        BackendKind::Simple
    }

    fn validate(&self, config: &ScrapeConfig) -> Result<(), ConfigError> {
        let unsupported = |reason: &'static str| ConfigError::Unsupported {
            backend: BACKEND,
            reason,
        };

        check_page_cap(config)?;
        if config.javascript {
            return Err(unsupported("javascript"));
        }
        if config.attempt_multi_page {
            return Err(unsupported("multi-page scraping"));
        }
        if config.next_button.is_some() {
            return Err(unsupported("a next button"));
        }
        if !config.wait_conditions.is_empty() {
            return Err(unsupported("wait conditions"));
        }
        Ok(())
    }

    async fn scrape(&self, config: &ScrapeConfig) -> Result<ScrapeResult, ScrapeError> {
        self.validate(config)?;

        let mut result = ScrapeResult::new(config.url());
        let request = FetchRequest::from_config(config, config.url());

        info!("Fetching {}", config.url());
        let started = Instant::now();
        match self.transport.get(&request).await {
            Ok(response) => {
                result.set_caller_ip(response.local_ip);
                if response.is_success() {
                    let ms = elapsed_ms(started);
                    debug!("Fetched {} in {}ms", config.url(), ms);
                    result.add_page(response.body, ms, ScrapeStatus::Success);
                    result.set_status(ScrapeStatus::Success);
                } else {
                    warn!("{} returned HTTP {}", config.url(), response.status);
                    result.fail(ScrapeStatus::Error, http_error_message(response.status));
                }
            }
            Err(e) => {
                warn!("Request to {} failed: {}", config.url(), e);
                record_transport_error(&mut result, &e);
            }
        }

        Ok(result)
    }
}
