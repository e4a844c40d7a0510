//! Error types.
//!
//! Only misconfiguration and an unusable environment are raised to the
//! caller. Per-page failures (transport, navigation, wait timeouts) are
//! recorded in the [`ScrapeResult`](crate::models::ScrapeResult) instead.

use thiserror::Error;

/// Invalid configuration, or a configuration a backend cannot honor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Url cannot be blank")]
    BlankUrl,
    #[error("Locator text cannot be blank")]
    EmptyLocator,
    #[error("Duplicate wait condition: {0}")]
    DuplicateCondition(String),
    #[error("{backend} backend does not support {reason}")]
    Unsupported {
        backend: &'static str,
        reason: &'static str,
    },
    #[error("Page cap must be at least 1")]
    ZeroPageCap,
    #[error("{0} backend requires a next button or at least one wait condition")]
    MissingWaitCondition(&'static str),
    #[error("Url is not a local address: {0}")]
    NotLocal(String),
    #[error("Failed to parse config: {0}")]
    Parse(String),
}

/// Browser environment could not be set up.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Chrome/Chromium not found. Install it or set CHROME_PATH")]
    BrowserNotFound,
    #[error("Failed to launch browser: {0}")]
    Launch(String),
    #[error("Failed to connect to remote browser: {0}")]
    Connect(String),
    #[error("Browser support not compiled. Rebuild with: cargo build --features browser")]
    Unavailable,
}

/// Errors raised by a scrape call.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Setup(#[from] SetupError),
}

/// Failures reported by the HTTP transport.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Proxy error: {0}")]
    Proxy(String),
    #[error("TLS error: {0}")]
    Tls(String),
    #[error("Request failed: {0}")]
    Other(String),
}

/// Failures reported by a browser session or script renderer.
#[derive(Debug, Clone, Error)]
pub enum DriverError {
    #[error("Navigation failed for {url}: {reason}")]
    Navigation { url: String, reason: String },
    #[error("Navigation timed out after {secs}s for {url}")]
    NavigationTimeout { url: String, secs: u64 },
    #[error("Browser protocol error: {0}")]
    Protocol(String),
    #[error("Browser support not compiled")]
    Unavailable,
}

/// The wait conditions were not met before the timeout elapsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Timed out after {waited_ms}ms waiting for page conditions")]
pub struct WaitTimeout {
    pub waited_ms: u64,
}

/// Failures from a script renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Driver(#[from] DriverError),
}
