//! Pages and the result that collects them.

use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a page fetch, or of a whole scrape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeStatus {
    #[default]
    Unknown,
    Success,
    Timeout,
    Error,
    ProxyError,
}

impl ScrapeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Success => "Success",
            Self::Timeout => "Timeout",
            Self::Error => "Error",
            Self::ProxyError => "Proxy Error",
        }
    }
}

impl fmt::Display for ScrapeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fetched page. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapePage {
    html: String,
    request_time_ms: u64,
    status: ScrapeStatus,
    fetched_at: DateTime<Utc>,
}

impl ScrapePage {
    fn new(html: String, request_time_ms: u64, status: ScrapeStatus) -> Self {
        Self {
            html,
            request_time_ms,
            status,
            fetched_at: Utc::now(),
        }
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn request_time_ms(&self) -> u64 {
        self.request_time_ms
    }

    pub fn status(&self) -> ScrapeStatus {
        self.status
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

/// Ordered pages of one scrape plus its overall outcome.
///
/// The overall status is the status of the last attempted page, so a crawl
/// that times out on page N keeps pages 1..N-1 as `Success` while reporting
/// `Timeout` overall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeResult {
    url: String,
    pages: Vec<ScrapePage>,
    /// Local/egress address observed by the transport, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    caller_ip: Option<IpAddr>,
    status: ScrapeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ScrapeResult {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            pages: Vec::new(),
            caller_ip: None,
            status: ScrapeStatus::Unknown,
            error: None,
        }
    }

    /// Append a page. Pages are never removed or modified afterwards.
    pub fn add_page(&mut self, html: impl Into<String>, request_time_ms: u64, status: ScrapeStatus) {
        self.pages.push(ScrapePage::new(html.into(), request_time_ms, status));
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> ScrapeStatus {
        self.status
    }

    pub fn set_status(&mut self, status: ScrapeStatus) {
        self.status = status;
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Record a failed attempt.
    pub fn fail(&mut self, status: ScrapeStatus, message: impl Into<String>) {
        self.status = status;
        self.error = Some(message.into());
    }

    pub fn caller_ip(&self) -> Option<IpAddr> {
        self.caller_ip
    }

    pub fn set_caller_ip(&mut self, ip: Option<IpAddr>) {
        self.caller_ip = ip;
    }

    /// Sum of all page request times, computed on each call.
    pub fn request_time_ms(&self) -> u64 {
        self.pages.iter().map(ScrapePage::request_time_ms).sum()
    }

    /// True only when the overall status is `Success`.
    pub fn is_success(&self) -> bool {
        self.status == ScrapeStatus::Success
    }

    pub fn first_page(&self) -> Option<&ScrapePage> {
        self.pages.first()
    }

    pub fn pages(&self) -> &[ScrapePage] {
        &self.pages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScrapePage> {
        self.pages.iter()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl<'a> IntoIterator for &'a ScrapeResult {
    type Item = &'a ScrapePage;
    type IntoIter = std::slice::Iter<'a, ScrapePage>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.iter()
    }
}
