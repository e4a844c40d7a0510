//! Address classification and reachability checks.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use url::{Host, Url};

use crate::config::ScrapeConfig;
use crate::error::{ConfigError, ScrapeError};
use crate::http_client::{HttpTransport, ReqwestTransport};
use crate::scrapers::{ScrapeBackend, SimpleFetchScraper};

/// Host names treated as local regardless of resolution.
const LOCAL_ALIASES: &[&str] = &["localhost", "0.0", "127.1"];

fn is_local_v4(ip: Ipv4Addr) -> bool {
    ip.is_private() || ip.is_loopback() || ip.is_link_local() || ip.is_unspecified()
}

fn is_local_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_local_v4(v4);
    }
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (first & 0xffc0) == 0xfe80
}

pub fn is_local_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_local_v4(v4),
        IpAddr::V6(v6) => is_local_v6(v6),
    }
}

/// Host part of a URL, or of a bare `host[:port][/path]` string.
fn host_of(target: &str) -> Option<String> {
    let target = target.trim();
    if target.contains("://") {
        let url = Url::parse(target).ok()?;
        return match url.host()? {
            Host::Domain(domain) => Some(domain.to_lowercase()),
            Host::Ipv4(ip) => Some(ip.to_string()),
            Host::Ipv6(ip) => Some(ip.to_string()),
        };
    }

    let authority = target.split('/').next()?;
    let host = match authority.strip_prefix('[') {
        Some(rest) => rest.split(']').next()?,
        None => authority.split(':').next()?,
    };
    Some(host.to_lowercase())
}

/// Whether `target` (a URL or bare host) points at this machine or a
/// private network.
pub fn is_local_address(target: &str) -> bool {
    let Some(host) = host_of(target) else {
        return false;
    };
    if LOCAL_ALIASES.contains(&host.as_str()) {
        return true;
    }
    host.parse::<IpAddr>().map(is_local_ip).unwrap_or(false)
}

/// Whether `url` answers a plain GET with a 2xx status.
///
/// With `local_only`, non-local targets are rejected before any request.
pub async fn check_url(url: &str, local_only: bool) -> Result<bool, ScrapeError> {
    check_url_with(Arc::new(ReqwestTransport::new()), url, local_only).await
}

pub async fn check_url_with(
    transport: Arc<dyn HttpTransport>,
    url: &str,
    local_only: bool,
) -> Result<bool, ScrapeError> {
    if local_only && !is_local_address(url) {
        return Err(ConfigError::NotLocal(url.to_string()).into());
    }

    let config = ScrapeConfig::new(url)?;
    let result = SimpleFetchScraper::new(transport).scrape(&config).await?;
    Ok(result.is_success())
}
