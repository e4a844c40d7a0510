//! Script rendering through a browser session.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{BrowserSession, ChromeLauncher, ScriptRenderer, SessionFactory};
use crate::config::ScrapeConfig;
use crate::error::{DriverError, RenderError};

/// Renders pages by loading them in a fresh browser session.
///
/// The page is re-requested by the browser so its scripts run with the
/// page's own origin; the body fetched over HTTP is not reused.
pub struct SessionRenderer<F: SessionFactory> {
    factory: F,
}

/// Renderer backed by Chrome.
pub type ChromeRenderer = SessionRenderer<ChromeLauncher>;

impl<F: SessionFactory> SessionRenderer<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }
}

async fn capture<S: BrowserSession>(
    session: &S,
    url: &str,
    wait: Duration,
) -> Result<String, DriverError> {
    session.navigate(url).await?;
    tokio::time::sleep(wait).await;
    session.page_source().await
}

#[async_trait]
impl<F: SessionFactory> ScriptRenderer for SessionRenderer<F> {
    async fn render(
        &self,
        url: &str,
        _html: &str,
        config: &ScrapeConfig,
    ) -> Result<String, RenderError> {
        debug!("Rendering {} (wait {:?})", url, config.javascript_wait);
        let session = self.factory.open(config).await?;
        session.set_page_load_timeout(config.request_timeout);

        let rendered = capture(&session, url, config.javascript_wait).await;
        self.factory.close(session).await;

        Ok(rendered?)
    }
}
