//! Chrome sessions over the DevTools protocol.

#[cfg(feature = "browser")]
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
#[cfg(feature = "browser")]
use chromiumoxide::element::Element;
#[cfg(feature = "browser")]
use chromiumoxide::handler::{Handler, HandlerConfig};
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use tokio::sync::Mutex;
#[cfg(feature = "browser")]
use tokio::task::JoinHandle;
#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

use super::{BrowserSession, SessionConfig, SessionFactory};
#[cfg(feature = "browser")]
use crate::config::LocatorKind;
use crate::config::{ScrapeConfig, WaitLocator};
use crate::error::{DriverError, SetupError};
#[cfg(feature = "browser")]
use crate::http_client::resolve_user_agent;

/// Opens Chrome sessions, either by launching a local browser or by
/// connecting to a remote DevTools endpoint.
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    config: SessionConfig,
}

impl ChromeLauncher {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

/// True when the element is rendered with a non-empty box.
#[cfg(feature = "browser")]
const IS_VISIBLE_FN: &str = r#"function() {
    const style = window.getComputedStyle(this);
    const rect = this.getBoundingClientRect();
    return style.visibility !== 'hidden' && style.display !== 'none'
        && (rect.width > 0 || rect.height > 0);
}"#;

#[cfg(feature = "browser")]
const IS_ENABLED_FN: &str = "function() { return !this.disabled; }";

/// One Chrome tab plus the browser that owns it.
#[cfg(feature = "browser")]
pub struct ChromeSession {
    browser: Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    remote: bool,
    /// Zero means "no explicit page-load timeout".
    page_load_timeout_ms: AtomicU64,
}

#[cfg(feature = "browser")]
fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    })
}

#[cfg(feature = "browser")]
impl ChromeLauncher {
    async fn launch(&self, scrape: &ScrapeConfig) -> Result<(Browser, JoinHandle<()>), SetupError> {
        info!("Launching browser (headless={})", self.config.headless);

        let chrome_path = super::find_chrome(&self.config)?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .request_timeout(Duration::from_secs(self.config.launch_timeout));

        // with_head means NOT headless
        if !self.config.headless {
            builder = builder.with_head();
        }

        if let Some(proxy) = scrape.proxy_for_url() {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox")
            .arg("--disable-gpu");

        if !scrape.verify_tls {
            builder = builder.arg("--ignore-certificate-errors");
        }

        for arg in &self.config.chrome_args {
            builder = builder.arg(arg.clone());
        }

        let browser_config = builder.build().map_err(SetupError::Launch)?;

        let (browser, handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| SetupError::Launch(e.to_string()))?;

        Ok((browser, spawn_handler(handler)))
    }

    async fn connect_remote(&self, url: &str) -> Result<(Browser, JoinHandle<()>), SetupError> {
        info!(
            "Connecting to remote browser at {} (timeout: {}s)",
            url, self.config.launch_timeout
        );

        // Get WebSocket URL from the /json/version endpoint
        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.launch_timeout))
            .build()
            .map_err(|e| SetupError::Connect(e.to_string()))?;
        let resp: serde_json::Value = client
            .get(&version_url)
            .send()
            .await
            .map_err(|e| SetupError::Connect(e.to_string()))?
            .json()
            .await
            .map_err(|e| SetupError::Connect(format!("bad version info: {}", e)))?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SetupError::Connect("no webSocketDebuggerUrl in response".into()))?;

        debug!("Connecting to WebSocket: {}", ws_url);

        let handler_config = HandlerConfig {
            request_timeout: Duration::from_secs(self.config.launch_timeout),
            ..Default::default()
        };

        let (browser, handler) = Browser::connect_with_config(ws_url, handler_config)
            .await
            .map_err(|e| SetupError::Connect(e.to_string()))?;

        Ok((browser, spawn_handler(handler)))
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl SessionFactory for ChromeLauncher {
    type Session = ChromeSession;

    async fn open(&self, config: &ScrapeConfig) -> Result<ChromeSession, SetupError> {
        let remote = self.config.remote().map(str::to_string);
        let (browser, handler) = match remote {
            Some(ref url) => self.connect_remote(url).await?,
            None => self.launch(config).await?,
        };

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(SetupError::Launch(format!("failed to open tab: {}", e)));
            }
        };

        let user_agent = resolve_user_agent(config.user_agent.as_deref());
        if let Err(e) = page
            .execute(SetUserAgentOverrideParams::new(user_agent))
            .await
        {
            warn!("Failed to set user agent: {}", e);
        }

        Ok(ChromeSession {
            browser: Mutex::new(browser),
            page,
            handler,
            remote: remote.is_some(),
            page_load_timeout_ms: AtomicU64::new(0),
        })
    }

    async fn close(&self, session: ChromeSession) {
        let ChromeSession {
            browser,
            page,
            handler,
            remote,
            ..
        } = session;

        if let Err(e) = page.close().await {
            debug!("Failed to close tab: {}", e);
        }

        // A remote browser outlives our session
        if !remote {
            let mut browser = browser.into_inner();
            if let Err(e) = browser.close().await {
                debug!("Failed to close browser: {}", e);
            }
            let _ = browser.wait().await;
        }

        handler.abort();
        debug!("Browser session closed");
    }
}

#[cfg(feature = "browser")]
async fn eval_bool(element: &Element, function: &str) -> bool {
    match element.call_js_fn(function, false).await {
        Ok(ret) => ret
            .result
            .value
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        Err(e) => {
            debug!("Element check failed: {}", e);
            false
        }
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl BrowserSession for ChromeSession {
    type Element = Element;

    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        info!("Navigating to {}", url);
        let timeout_ms = self.page_load_timeout_ms.load(Ordering::Relaxed);

        let navigation = self.page.goto(url);
        let outcome = if timeout_ms == 0 {
            navigation.await
        } else {
            tokio::time::timeout(Duration::from_millis(timeout_ms), navigation)
                .await
                .map_err(|_| DriverError::NavigationTimeout {
                    url: url.to_string(),
                    secs: timeout_ms / 1000,
                })?
        };

        outcome.map(|_| ()).map_err(|e| DriverError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    async fn page_source(&self) -> Result<String, DriverError> {
        self.page
            .content()
            .await
            .map_err(|e| DriverError::Protocol(e.to_string()))
    }

    async fn find_element(&self, locator: &WaitLocator) -> Option<Element> {
        let found = match locator.kind() {
            LocatorKind::Css => self.page.find_element(locator.text()).await,
            LocatorKind::Xpath => self.page.find_xpath(locator.text()).await,
        };
        found.ok()
    }

    async fn is_visible(&self, element: &Element) -> bool {
        eval_bool(element, IS_VISIBLE_FN).await
    }

    async fn is_enabled(&self, element: &Element) -> bool {
        eval_bool(element, IS_ENABLED_FN).await
    }

    async fn click(&self, element: &Element) -> Result<(), DriverError> {
        element
            .click()
            .await
            .map(|_| ())
            .map_err(|e| DriverError::Protocol(e.to_string()))
    }

    fn set_page_load_timeout(&self, timeout: Duration) {
        let ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.page_load_timeout_ms.store(ms, Ordering::Relaxed);
    }
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
pub struct ChromeSession {
    _private: (),
}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl SessionFactory for ChromeLauncher {
    type Session = ChromeSession;

    async fn open(&self, _config: &ScrapeConfig) -> Result<ChromeSession, SetupError> {
        Err(SetupError::Unavailable)
    }

    async fn close(&self, _session: ChromeSession) {}
}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl BrowserSession for ChromeSession {
    type Element = ();

    async fn navigate(&self, _url: &str) -> Result<(), DriverError> {
        Err(DriverError::Unavailable)
    }

    async fn page_source(&self) -> Result<String, DriverError> {
        Err(DriverError::Unavailable)
    }

    async fn find_element(&self, _locator: &WaitLocator) -> Option<()> {
        None
    }

    async fn is_visible(&self, _element: &()) -> bool {
        false
    }

    async fn is_enabled(&self, _element: &()) -> bool {
        false
    }

    async fn click(&self, _element: &()) -> Result<(), DriverError> {
        Err(DriverError::Unavailable)
    }

    fn set_page_load_timeout(&self, _timeout: Duration) {}
}
