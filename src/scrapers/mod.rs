//! Retrieval backends.
//!
//! Every backend checks a [`ScrapeConfig`] against what it can do before
//! fetching anything, then runs its own page loop and reports per-page
//! outcomes through the returned [`ScrapeResult`].

mod automation;
mod pagination;
mod scriptable;
mod simple;

pub use automation::{BrowserScraper, NEXT_BUTTON_KEY};
pub use pagination::next_page_url;
pub use scriptable::ScriptableFetchScraper;
pub use simple::SimpleFetchScraper;

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ScrapeConfig;
use crate::error::{ConfigError, ScrapeError, TransportError};
use crate::http_client::status_reason;
use crate::models::{ScrapeResult, ScrapeStatus};

/// The available retrieval strategies, cheapest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// One HTTP GET.
    Simple,
    /// HTTP GETs with optional script rendering and link pagination.
    Scriptable,
    /// A live browser with wait conditions and click pagination.
    Browser,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [Self::Simple, Self::Scriptable, Self::Browser];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Scriptable => "scriptable",
            Self::Browser => "browser",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown backend: {}", s))
    }
}

#[async_trait]
pub trait ScrapeBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Reject configurations this backend cannot honor.
    fn validate(&self, config: &ScrapeConfig) -> Result<(), ConfigError>;

    /// Validate, then crawl. Per-page failures end up in the result; only
    /// misconfiguration and browser setup failures are returned as errors.
    async fn scrape(&self, config: &ScrapeConfig) -> Result<ScrapeResult, ScrapeError>;
}

/// Every backend appends at least the first page, so a cap of zero cannot
/// be honored.
pub(crate) fn check_page_cap(config: &ScrapeConfig) -> Result<(), ConfigError> {
    if config.max_pages == 0 {
        return Err(ConfigError::ZeroPageCap);
    }
    Ok(())
}

/// Page status for a transport failure.
pub(crate) fn transport_status(err: &TransportError) -> ScrapeStatus {
    match err {
        TransportError::Timeout(_) => ScrapeStatus::Timeout,
        TransportError::Proxy(_) | TransportError::Tls(_) => ScrapeStatus::ProxyError,
        TransportError::Other(_) => ScrapeStatus::Error,
    }
}

pub(crate) fn http_error_message(status: u16) -> String {
    format!("HTTP Error: {} - {}", status, status_reason(status))
}

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Record a transport failure on `result`.
pub(crate) fn record_transport_error(result: &mut ScrapeResult, err: &TransportError) {
    result.fail(transport_status(err), err.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_round_trips_through_str() {
        for kind in BackendKind::ALL {
            assert_eq!(kind.as_str().parse::<BackendKind>(), Ok(kind));
        }
        assert_eq!("Browser".parse::<BackendKind>(), Ok(BackendKind::Browser));
        assert!("selenium".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_transport_status_mapping() {
        let cases = [
            (TransportError::Timeout("t".into()), ScrapeStatus::Timeout),
            (TransportError::Proxy("p".into()), ScrapeStatus::ProxyError),
            (TransportError::Tls("s".into()), ScrapeStatus::ProxyError),
            (TransportError::Other("o".into()), ScrapeStatus::Error),
        ];
        for (err, status) in cases {
            assert_eq!(transport_status(&err), status);
        }
    }

    #[test]
    fn test_http_error_message() {
        assert_eq!(http_error_message(404), "HTTP Error: 404 - Not Found");
        assert_eq!(http_error_message(503), "HTTP Error: 503 - Service Unavailable");
    }
}
