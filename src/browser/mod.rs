//! Browser automation collaborators.
//!
//! The scrapers only talk to a browser through [`BrowserSession`],
//! [`SessionFactory`] and [`ScriptRenderer`]. The Chrome implementation
//! uses chromiumoxide (CDP) and is compiled with the `browser` feature;
//! without it the Chrome types still exist but every operation fails with
//! [`SetupError::Unavailable`](crate::error::SetupError::Unavailable).

mod chrome;
mod config;
mod executable;
mod render;

#[cfg(test)]
pub(crate) mod fake;

pub use chrome::{ChromeLauncher, ChromeSession};
pub use config::{default_headless, default_launch_timeout, SessionConfig};
pub use executable::find_chrome;
pub use render::{ChromeRenderer, SessionRenderer};

use std::time::Duration;

use async_trait::async_trait;

use crate::config::{ScrapeConfig, WaitLocator};
use crate::error::{DriverError, RenderError, SetupError};

/// A live browser tab.
///
/// A session is not safe for two concurrent scrapes: the crawl loop
/// navigates and clicks, so callers sharing one session must serialize
/// their scrape calls.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Handle to an element in the current document.
    type Element: Send + Sync;

    async fn navigate(&self, url: &str) -> Result<(), DriverError>;

    /// Current document source.
    async fn page_source(&self) -> Result<String, DriverError>;

    /// Resolve a locator; `None` when no element matches.
    async fn find_element(&self, locator: &WaitLocator) -> Option<Self::Element>;

    async fn is_visible(&self, element: &Self::Element) -> bool;

    async fn is_enabled(&self, element: &Self::Element) -> bool;

    async fn click(&self, element: &Self::Element) -> Result<(), DriverError>;

    /// Bound the time `navigate` may take.
    fn set_page_load_timeout(&self, timeout: Duration);
}

/// Opens and closes sessions for the browser scraper's managed mode.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: BrowserSession;

    async fn open(&self, config: &ScrapeConfig) -> Result<Self::Session, SetupError>;

    async fn close(&self, session: Self::Session);
}

/// Executes a fetched page's scripts and returns the resulting HTML.
#[async_trait]
pub trait ScriptRenderer: Send + Sync {
    /// Render `url` (whose raw body is `html`), letting scripts run for
    /// `config.javascript_wait` before capturing the document.
    async fn render(
        &self,
        url: &str,
        html: &str,
        config: &ScrapeConfig,
    ) -> Result<String, RenderError>;
}
