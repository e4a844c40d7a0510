//! pagecrawl - configurable multi-backend web page retrieval.
//!
//! Pages are fetched with a plain HTTP request, with HTTP plus script
//! rendering and link pagination, or with a live browser that waits for
//! page conditions and clicks through a "next" button. The
//! [`Orchestrator`] picks the cheapest backend able to honor a
//! [`ScrapeConfig`].

pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod http_client;
pub mod models;
pub mod orchestrator;
pub mod scrapers;
pub mod utils;
pub mod wait;

pub use config::{LocatorKind, ScrapeConfig, WaitCondition, WaitLocator, WaitLogic, WaitType};
pub use error::{ConfigError, ScrapeError, SetupError};
pub use models::{ScrapePage, ScrapeResult, ScrapeStatus};
pub use orchestrator::{scrape_url, select_backend, Orchestrator};
pub use scrapers::{BackendKind, ScrapeBackend};
