//! Scrape configuration.
//!
//! A [`ScrapeConfig`] only guarantees that its URL is non-blank. Whether a
//! given backend can honor the rest of the fields is decided by that
//! backend's `validate`, so the same config may be accepted by one backend
//! and rejected by another.

mod locator;

pub use locator::{LocatorKind, WaitCondition, WaitLocator, WaitLogic, WaitType};

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default request timeout (5 seconds).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Default wait after script execution before capturing HTML (3 seconds).
pub const DEFAULT_JAVASCRIPT_WAIT: Duration = Duration::from_secs(3);

/// Default page cap.
pub const DEFAULT_MAX_PAGES: usize = 15;

/// A URL that is guaranteed not to be blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageUrl(String);

impl PageUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PageUrl {
    type Error = ConfigError;

    fn try_from(url: String) -> Result<Self, Self::Error> {
        if url.trim().is_empty() {
            return Err(ConfigError::BlankUrl);
        }
        Ok(Self(url))
    }
}

impl TryFrom<&str> for PageUrl {
    type Error = ConfigError;

    fn try_from(url: &str) -> Result<Self, Self::Error> {
        Self::try_from(url.to_string())
    }
}

impl From<PageUrl> for String {
    fn from(url: PageUrl) -> Self {
        url.0
    }
}

/// Parameters for one retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeConfig {
    url: PageUrl,

    /// Timeout for a single request, and for each wait-condition poll.
    #[serde(default = "default_request_timeout", with = "duration_secs")]
    pub request_timeout: Duration,

    /// Proxy used for `http://` targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_http: Option<String>,

    /// Proxy used for `https://` targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_https: Option<String>,

    /// User agent override. When unset a browser user agent is generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Maximum number of pages appended to one result. Must be at least 1.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Execute page scripts before capturing HTML.
    #[serde(default)]
    pub javascript: bool,

    /// How long to let scripts run before capturing HTML.
    #[serde(default = "default_javascript_wait", with = "duration_secs")]
    pub javascript_wait: Duration,

    /// Follow "next" links found in each fetched document.
    #[serde(default)]
    pub attempt_multi_page: bool,

    /// Element clicked to advance to the next page (browser only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_button: Option<WaitLocator>,

    /// Conditions that decide when a page is ready (browser only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wait_conditions: Vec<WaitCondition>,

    /// Browser page-load timeout.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "option_duration_secs"
    )]
    pub page_load_wait: Option<Duration>,

    /// Verify TLS certificates.
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

fn default_javascript_wait() -> Duration {
    DEFAULT_JAVASCRIPT_WAIT
}

fn default_max_pages() -> usize {
    DEFAULT_MAX_PAGES
}

fn default_verify_tls() -> bool {
    true
}

impl ScrapeConfig {
    /// Create a config with defaults for everything but the URL.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            url: PageUrl::try_from(url.into())?,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            proxy_http: None,
            proxy_https: None,
            user_agent: None,
            max_pages: DEFAULT_MAX_PAGES,
            javascript: false,
            javascript_wait: DEFAULT_JAVASCRIPT_WAIT,
            attempt_multi_page: false,
            next_button: None,
            wait_conditions: Vec::new(),
            page_load_wait: None,
            verify_tls: true,
        })
    }

    /// Parse a config from TOML.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load a config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Replace the URL, rejecting blank input. On error the old URL is kept.
    pub fn set_url(&mut self, url: impl Into<String>) -> Result<(), ConfigError> {
        self.url = PageUrl::try_from(url.into())?;
        Ok(())
    }

    /// Proxy matching the target URL's scheme.
    pub fn proxy_for_url(&self) -> Option<&str> {
        let url = self.url().to_ascii_lowercase();
        if url.starts_with("https") {
            self.proxy_https.as_deref()
        } else if url.starts_with("http") {
            self.proxy_http.as_deref()
        } else {
            None
        }
    }

    pub fn has_proxy(&self) -> bool {
        self.proxy_http.is_some() || self.proxy_https.is_some()
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_javascript(mut self, wait: Duration) -> Self {
        self.javascript = true;
        self.javascript_wait = wait;
        self
    }

    pub fn with_multi_page(mut self) -> Self {
        self.attempt_multi_page = true;
        self
    }

    pub fn with_next_button(mut self, locator: WaitLocator) -> Self {
        self.next_button = Some(locator);
        self
    }

    pub fn with_wait_condition(mut self, condition: WaitCondition) -> Self {
        self.wait_conditions.push(condition);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_proxies(mut self, http: Option<String>, https: Option<String>) -> Self {
        self.proxy_http = http;
        self.proxy_https = https;
        self
    }

    pub fn with_page_load_wait(mut self, wait: Duration) -> Self {
        self.page_load_wait = Some(wait);
        self
    }
}

/// Durations as (fractional) seconds.
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

mod option_duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&d.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<f64>::deserialize(deserializer)?
            .map(|secs| Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom))
            .transpose()
    }
}
