//! Terminal rendering of scrape results.

use console::{style, StyledObject};

use crate::models::{ScrapeResult, ScrapeStatus};

fn styled_status(status: ScrapeStatus) -> StyledObject<&'static str> {
    let text = status.as_str();
    match status {
        ScrapeStatus::Success => style(text).green(),
        ScrapeStatus::Timeout | ScrapeStatus::Unknown => style(text).yellow(),
        ScrapeStatus::Error | ScrapeStatus::ProxyError => style(text).red(),
    }
}

pub fn print_summary(result: &ScrapeResult, with_html: bool) {
    println!("\n{} {}", style("URL:").bold(), result.url());

    for (i, page) in result.iter().enumerate() {
        println!(
            "  {:>3}. {:<12} {:>7}ms  {} bytes",
            i + 1,
            styled_status(page.status()),
            page.request_time_ms(),
            page.html().len()
        );
    }

    println!(
        "{} {} ({} page{}, {}ms)",
        style("Status:").bold(),
        styled_status(result.status()),
        result.len(),
        if result.len() == 1 { "" } else { "s" },
        result.request_time_ms()
    );
    if let Some(ip) = result.caller_ip() {
        println!("{} {}", style("Caller IP:").bold(), ip);
    }
    if let Some(error) = result.error() {
        println!("{} {}", style("Error:").red().bold(), error);
    }

    if with_html {
        for (i, page) in result.iter().enumerate() {
            println!("\n{}", style(format!("--- page {} ---", i + 1)).dim());
            println!("{}", page.html());
        }
    }
}

pub fn print_json(result: &ScrapeResult) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

pub fn print_check(url: &str, reachable: bool) {
    if reachable {
        println!("{} {}", style("✓ reachable").green(), url);
    } else {
        println!("{} {}", style("✗ unreachable").red(), url);
    }
}
