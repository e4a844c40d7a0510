//! Browser backend: wait for page conditions, click through pages.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{check_page_cap, elapsed_ms, BackendKind, ScrapeBackend};
use crate::browser::{BrowserSession, SessionFactory};
use crate::config::{ScrapeConfig, WaitCondition, WaitLogic, WaitType};
use crate::error::{ConfigError, ScrapeError};
use crate::models::{ScrapeResult, ScrapeStatus};
use crate::wait::{poll_until, validate_conditions, ScraperWait, DEFAULT_POLL_INTERVAL};

const BACKEND: &str = "browser";

/// Key of the wait condition generated for the configured next button.
pub const NEXT_BUTTON_KEY: &str = "next_button";

enum SessionSource<'a, F: SessionFactory> {
    /// Opened before the crawl and closed after it.
    Managed(&'a F),
    /// Supplied by the caller, left open.
    Borrowed(&'a F::Session),
}

/// Drives a browser session page by page.
///
/// In managed mode a session is opened from the factory for each scrape
/// and closed whatever the outcome. A borrowed session is never closed;
/// it must not be used by two scrapes at once.
pub struct BrowserScraper<'a, F: SessionFactory> {
    source: SessionSource<'a, F>,
    poll_interval: Duration,
}

impl<'a, F: SessionFactory> BrowserScraper<'a, F> {
    pub fn managed(factory: &'a F) -> Self {
        Self {
            source: SessionSource::Managed(factory),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn borrowed(session: &'a F::Session) -> Self {
        Self {
            source: SessionSource::Borrowed(session),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn is_managed(&self) -> bool {
        matches!(self.source, SessionSource::Managed(_))
    }
}

/// The next button (required, clickable) followed by the configured
/// conditions.
fn page_conditions(config: &ScrapeConfig) -> Vec<WaitCondition> {
    let mut conditions = Vec::with_capacity(config.wait_conditions.len() + 1);
    if let Some(ref next) = config.next_button {
        conditions.push(
            WaitCondition::new(next.clone(), WaitLogic::MustHave, WaitType::Clickable)
                .named(NEXT_BUTTON_KEY),
        );
    }
    conditions.extend(config.wait_conditions.iter().cloned());
    conditions
}

async fn crawl<S: BrowserSession>(
    session: &S,
    config: &ScrapeConfig,
    poll_interval: Duration,
) -> Result<ScrapeResult, ConfigError> {
    let conditions = page_conditions(config);
    let mut result = ScrapeResult::new(config.url());

    if let Some(wait) = config.page_load_wait {
        session.set_page_load_timeout(wait);
    }

    info!("Loading {}", config.url());
    let started = Instant::now();
    if let Err(e) = session.navigate(config.url()).await {
        warn!("{}", e);
        result.fail(ScrapeStatus::Error, e.to_string());
        return Ok(result);
    }
    debug!("Loaded {} in {}ms", config.url(), elapsed_ms(started));

    loop {
        let mut waiter = ScraperWait::new(conditions.clone())?;
        let started = Instant::now();
        let waited = poll_until(session, &mut waiter, config.request_timeout, poll_interval).await;

        let html = match session.page_source().await {
            Ok(html) => html,
            Err(e) => {
                warn!("Failed to read page source: {}", e);
                result.fail(ScrapeStatus::Error, e.to_string());
                break;
            }
        };
        let ms = elapsed_ms(started);

        if let Err(timeout) = waited {
            warn!("Page {} not ready: {}", result.len() + 1, timeout);
            result.add_page(html, ms, ScrapeStatus::Timeout);
            result.fail(ScrapeStatus::Timeout, timeout.to_string());
            break;
        }

        result.add_page(html, ms, ScrapeStatus::Success);
        result.set_status(ScrapeStatus::Success);
        debug!("Page {} ready after {}ms", result.len(), ms);

        if result.len() >= config.max_pages {
            info!("Reached page limit ({})", config.max_pages);
            break;
        }

        let next = match (&config.next_button, waiter.found(NEXT_BUTTON_KEY)) {
            (Some(_), Some(next)) => next,
            _ => break,
        };

        debug!("Clicking next button");
        if let Err(e) = session.click(next).await {
            warn!("Failed to click next button: {}", e);
            result.fail(ScrapeStatus::Error, e.to_string());
            break;
        }
    }

    Ok(result)
}

#[async_trait]
impl<'a, F: SessionFactory> ScrapeBackend for BrowserScraper<'a, F> {
    fn kind(&self) -> BackendKind {
        BackendKind::Browser
    }

    fn validate(&self, config: &ScrapeConfig) -> Result<(), ConfigError> {
        check_page_cap(config)?;
        if config.next_button.is_none() && config.wait_conditions.is_empty() {
            return Err(ConfigError::MissingWaitCondition(BACKEND));
        }
        validate_conditions(&page_conditions(config))
    }

    async fn scrape(&self, config: &ScrapeConfig) -> Result<ScrapeResult, ScrapeError> {
        self.validate(config)?;

        match self.source {
            SessionSource::Borrowed(session) => {
                Ok(crawl(session, config, self.poll_interval).await?)
            }
            SessionSource::Managed(factory) => {
                let session = factory.open(config).await?;
                let result = crawl(&session, config, self.poll_interval).await;
                factory.close(session).await;
                Ok(result?)
            }
        }
    }
}
