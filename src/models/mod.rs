//! Scrape result types.

mod result;

pub use result::{ScrapePage, ScrapeResult, ScrapeStatus};
