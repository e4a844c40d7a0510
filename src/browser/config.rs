//! Browser session configuration.
//!
//! Always compiled so config parsing works without the `browser` feature.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How to obtain a browser for managed sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Run in headless mode (default: true).
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Chrome/Chromium executable. When unset, common install locations
    /// and `PATH` are searched.
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,

    /// Remote Chrome DevTools URL (e.g., "ws://localhost:9222").
    /// If set, connects to an existing browser instead of launching one.
    #[serde(default)]
    pub remote_url: Option<String>,

    /// Timeout in seconds for launching or connecting.
    #[serde(default = "default_launch_timeout")]
    pub launch_timeout: u64,
}

pub fn default_headless() -> bool {
    true
}

pub fn default_launch_timeout() -> u64 {
    30
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            chrome_executable: None,
            chrome_args: Vec::new(),
            remote_url: None,
            launch_timeout: default_launch_timeout(),
        }
    }
}

impl SessionConfig {
    /// Apply `BROWSER_URL` and `CHROME_PATH` from the environment.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("BROWSER_URL") {
            if !val.trim().is_empty() {
                self.remote_url = Some(val.trim().to_string());
            }
        }

        if self.chrome_executable.is_none() {
            if let Ok(val) = std::env::var("CHROME_PATH") {
                if !val.trim().is_empty() {
                    self.chrome_executable = Some(PathBuf::from(val.trim()));
                }
            }
        }

        self
    }

    /// WebSocket/HTTP base of the remote browser, if configured.
    pub fn remote(&self) -> Option<&str> {
        self.remote_url.as_deref().filter(|u| !u.is_empty())
    }
}
