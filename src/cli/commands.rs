//! CLI commands implementation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use super::output::{print_check, print_json, print_summary};
use crate::browser::SessionConfig;
use crate::config::{ScrapeConfig, WaitCondition, WaitLocator};
use crate::orchestrator::{select_backend, Orchestrator};
use crate::scrapers::BackendKind;
use crate::utils::check_url;

#[derive(Parser)]
#[command(name = "pagecrawl")]
#[command(about = "Fetch web pages with pagination and wait conditions")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a URL and print the pages retrieved
    Scrape(ScrapeArgs),

    /// Check whether a URL answers with a 2xx status
    Check {
        url: String,
        /// Refuse URLs that are not local or private addresses
        #[arg(long)]
        local_only: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendChoice {
    Auto,
    Simple,
    Scriptable,
    Browser,
}

impl BackendChoice {
    fn resolve(self, config: &ScrapeConfig) -> BackendKind {
        match self {
            Self::Auto => select_backend(config),
            Self::Simple => BackendKind::Simple,
            Self::Scriptable => BackendKind::Scriptable,
            Self::Browser => BackendKind::Browser,
        }
    }
}

#[derive(Args)]
struct ScrapeArgs {
    /// URL to fetch (overrides the url in --config)
    url: Option<String>,

    /// TOML file with scrape settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend to use
    #[arg(short, long, value_enum, default_value = "auto")]
    backend: BackendChoice,

    /// Request timeout in seconds
    #[arg(short, long)]
    timeout: Option<f64>,

    /// Maximum number of pages to fetch
    #[arg(short = 'n', long)]
    max_pages: Option<usize>,

    /// Execute page scripts before capturing HTML
    #[arg(long)]
    javascript: bool,

    /// Seconds to let scripts run
    #[arg(long)]
    javascript_wait: Option<f64>,

    /// Follow "next" links
    #[arg(long)]
    multi_page: bool,

    /// XPath of the next-page button
    #[arg(long, conflicts_with = "next_css")]
    next_xpath: Option<String>,

    /// CSS selector of the next-page button
    #[arg(long)]
    next_css: Option<String>,

    /// XPath of an element that must be present (repeatable)
    #[arg(long)]
    wait_xpath: Vec<String>,

    /// CSS selector of an element that must be present (repeatable)
    #[arg(long)]
    wait_css: Vec<String>,

    /// Proxy for http:// targets
    #[arg(long, env = "HTTP_PROXY")]
    proxy_http: Option<String>,

    /// Proxy for https:// targets
    #[arg(long, env = "HTTPS_PROXY")]
    proxy_https: Option<String>,

    /// User agent override
    #[arg(long)]
    user_agent: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long)]
    insecure: bool,

    /// Remote browser DevTools URL
    #[arg(long, env = "BROWSER_URL")]
    browser_url: Option<String>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Print each page's HTML after the summary
    #[arg(long)]
    html: bool,
}

fn secs(value: f64, flag: &str) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("invalid {}: {}", flag, value))
}

fn load_config(path: &Path) -> anyhow::Result<ScrapeConfig> {
    let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
    ScrapeConfig::load(Path::new(&expanded))
        .with_context(|| format!("failed to load config from {}", expanded))
}

impl ScrapeArgs {
    fn scrape_config(&self) -> anyhow::Result<ScrapeConfig> {
        let mut config = match (&self.config, &self.url) {
            (Some(path), url) => {
                let mut config = load_config(path)?;
                if let Some(url) = url {
                    config.set_url(url.as_str())?;
                }
                config
            }
            (None, Some(url)) => ScrapeConfig::new(url.as_str())?,
            (None, None) => bail!("a URL or --config is required"),
        };

        if let Some(timeout) = self.timeout {
            config.request_timeout = secs(timeout, "--timeout")?;
        }
        if let Some(max_pages) = self.max_pages {
            config.max_pages = max_pages;
        }
        if self.javascript {
            config.javascript = true;
        }
        if let Some(wait) = self.javascript_wait {
            config.javascript_wait = secs(wait, "--javascript-wait")?;
        }
        if self.multi_page {
            config.attempt_multi_page = true;
        }
        if let Some(ref xpath) = self.next_xpath {
            config.next_button = Some(WaitLocator::xpath(xpath.as_str())?);
        }
        if let Some(ref css) = self.next_css {
            config.next_button = Some(WaitLocator::css(css.as_str())?);
        }
        for xpath in &self.wait_xpath {
            config
                .wait_conditions
                .push(WaitCondition::must_have(WaitLocator::xpath(xpath.as_str())?));
        }
        for css in &self.wait_css {
            config
                .wait_conditions
                .push(WaitCondition::must_have(WaitLocator::css(css.as_str())?));
        }
        if self.proxy_http.is_some() {
            config.proxy_http = self.proxy_http.clone();
        }
        if self.proxy_https.is_some() {
            config.proxy_https = self.proxy_https.clone();
        }
        if self.user_agent.is_some() {
            config.user_agent = self.user_agent.clone();
        }
        if self.insecure {
            config.verify_tls = false;
        }

        Ok(config)
    }

    fn session_config(&self) -> SessionConfig {
        let mut session = SessionConfig::default().with_env_overrides();
        if self.browser_url.is_some() {
            session.remote_url = self.browser_url.clone();
        }
        if self.headed {
            session.headless = false;
        }
        session
    }
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

async fn cmd_scrape(args: ScrapeArgs) -> anyhow::Result<()> {
    let config = args.scrape_config()?;
    let backend = args.backend.resolve(&config);
    let orchestrator = Orchestrator::with_defaults(args.session_config());

    let pb = if args.json {
        ProgressBar::hidden()
    } else {
        spinner(format!("Fetching {} ({})...", config.url(), backend))
    };
    let outcome = orchestrator.scrape_with(backend, &config).await;
    pb.finish_and_clear();

    let result = outcome?;
    if args.json {
        print_json(&result)?;
    } else {
        print_summary(&result, args.html);
    }

    if !result.is_success() {
        bail!(
            "scrape of {} ended with status {}",
            result.url(),
            result.status()
        );
    }
    Ok(())
}

async fn cmd_check(url: &str, local_only: bool) -> anyhow::Result<()> {
    let reachable = check_url(url, local_only).await?;
    print_check(url, reachable);
    if !reachable {
        bail!("{} is not reachable", url);
    }
    Ok(())
}

/// Parse arguments and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape(args) => cmd_scrape(args).await,
        Commands::Check { url, local_only } => cmd_check(&url, local_only).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ScrapeArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Scrape(args) => args,
            Commands::Check { .. } => panic!("expected scrape"),
        }
    }

    #[test]
    fn test_flags_build_config() {
        let args = parse(&[
            "pagecrawl",
            "scrape",
            "http://example.com",
            "--timeout",
            "2.5",
            "-n",
            "3",
            "--next-xpath",
            "//a[@rel='next']",
            "--wait-css",
            "#content",
            "--insecure",
        ]);
        let config = args.scrape_config().unwrap();

        assert_eq!(config.url(), "http://example.com");
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.max_pages, 3);
        assert_eq!(config.next_button.as_ref().unwrap().text(), "//a[@rel='next']");
        assert_eq!(config.wait_conditions.len(), 1);
        assert!(!config.verify_tls);
        assert_eq!(args.backend.resolve(&config), BackendKind::Browser);
    }

    #[test]
    fn test_url_or_config_required() {
        let args = parse(&["pagecrawl", "scrape"]);
        assert!(args.scrape_config().is_err());
    }

    #[test]
    fn test_config_file_with_url_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scrape.toml");
        std::fs::write(&path, "url = \"http://a.example\"\nmax_pages = 4\n").unwrap();

        let path_arg = path.to_string_lossy().into_owned();
        let args = parse(&["pagecrawl", "scrape", "http://b.example", "-c", &path_arg]);
        let config = args.scrape_config().unwrap();

        assert_eq!(config.url(), "http://b.example");
        assert_eq!(config.max_pages, 4);
    }

    #[test]
    fn test_blank_wait_locator_rejected() {
        let args = parse(&["pagecrawl", "scrape", "http://example.com", "--wait-xpath", " "]);
        assert!(args.scrape_config().is_err());
    }

    #[test]
    fn test_forced_backend() {
        let args = parse(&["pagecrawl", "scrape", "http://example.com", "-b", "scriptable"]);
        let config = args.scrape_config().unwrap();
        assert_eq!(args.backend.resolve(&config), BackendKind::Scriptable);
    }
}
