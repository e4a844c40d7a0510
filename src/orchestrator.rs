//! Backend selection and dispatch.

use std::sync::Arc;

use tracing::info;

use crate::browser::{
    ChromeLauncher, ChromeRenderer, ScriptRenderer, SessionConfig, SessionFactory,
};
use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use crate::http_client::{HttpTransport, ReqwestTransport};
use crate::models::ScrapeResult;
use crate::scrapers::{
    BackendKind, BrowserScraper, ScrapeBackend, ScriptableFetchScraper, SimpleFetchScraper,
};

/// Browser when page expectations are configured, scriptable when
/// scripts or pagination are requested, simple otherwise.
pub fn select_backend(config: &ScrapeConfig) -> BackendKind {
    if config.next_button.is_some() || !config.wait_conditions.is_empty() {
        BackendKind::Browser
    } else if config.javascript || config.attempt_multi_page {
        BackendKind::Scriptable
    } else {
        BackendKind::Simple
    }
}

/// Owns the collaborators and runs scrapes on the cheapest capable backend.
pub struct Orchestrator<F: SessionFactory = ChromeLauncher> {
    transport: Arc<dyn HttpTransport>,
    renderer: Option<Arc<dyn ScriptRenderer>>,
    factory: F,
}

impl Orchestrator<ChromeLauncher> {
    /// reqwest transport plus Chrome for rendering and browser scrapes.
    pub fn with_defaults(session: SessionConfig) -> Self {
        let launcher = ChromeLauncher::new(session);
        let renderer: Arc<dyn ScriptRenderer> = Arc::new(ChromeRenderer::new(launcher.clone()));
        Self::new(Arc::new(ReqwestTransport::new()), launcher).with_renderer(renderer)
    }
}

impl<F: SessionFactory> Orchestrator<F> {
    pub fn new(transport: Arc<dyn HttpTransport>, factory: F) -> Self {
        Self {
            transport,
            renderer: None,
            factory,
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn ScriptRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    fn scriptable(&self) -> ScriptableFetchScraper {
        let scraper = ScriptableFetchScraper::new(Arc::clone(&self.transport));
        match self.renderer {
            Some(ref renderer) => scraper.with_renderer(Arc::clone(renderer)),
            None => scraper,
        }
    }

    /// Validate `config` against `kind` without fetching anything.
    pub fn validate_with(
        &self,
        kind: BackendKind,
        config: &ScrapeConfig,
    ) -> Result<(), ScrapeError> {
        match kind {
            BackendKind::Simple => {
                SimpleFetchScraper::new(Arc::clone(&self.transport)).validate(config)?
            }
            BackendKind::Scriptable => self.scriptable().validate(config)?,
            BackendKind::Browser => BrowserScraper::managed(&self.factory).validate(config)?,
        }
        Ok(())
    }

    /// Scrape with an explicitly chosen backend.
    pub async fn scrape_with(
        &self,
        kind: BackendKind,
        config: &ScrapeConfig,
    ) -> Result<ScrapeResult, ScrapeError> {
        info!("Scraping {} with the {} backend", config.url(), kind);
        match kind {
            BackendKind::Simple => {
                SimpleFetchScraper::new(Arc::clone(&self.transport))
                    .scrape(config)
                    .await
            }
            BackendKind::Scriptable => self.scriptable().scrape(config).await,
            BackendKind::Browser => BrowserScraper::managed(&self.factory).scrape(config).await,
        }
    }

    /// Scrape with the backend picked by [`select_backend`].
    pub async fn scrape(&self, config: &ScrapeConfig) -> Result<ScrapeResult, ScrapeError> {
        self.scrape_with(select_backend(config), config).await
    }

    /// Scrape on a caller-owned browser session, which is left open.
    pub async fn scrape_in_session(
        &self,
        session: &F::Session,
        config: &ScrapeConfig,
    ) -> Result<ScrapeResult, ScrapeError> {
        BrowserScraper::<F>::borrowed(session).scrape(config).await
    }
}

/// Scrape `config` with default collaborators; browser settings come from
/// the environment.
pub async fn scrape_url(config: &ScrapeConfig) -> Result<ScrapeResult, ScrapeError> {
    Orchestrator::with_defaults(SessionConfig::default().with_env_overrides())
        .scrape(config)
        .await
}
