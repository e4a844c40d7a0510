//! Chrome executable lookup.

use std::path::PathBuf;

use tracing::info;

use super::SessionConfig;
use crate::error::SetupError;

/// Common Chrome executable paths to check.
const CHROME_PATHS: &[&str] = &[
    // Linux
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    // macOS
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    // Common install locations
    "/opt/google/chrome/google-chrome",
];

const CHROME_COMMANDS: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

/// Find the Chrome executable for a session.
///
/// An explicitly configured path must exist; otherwise known install
/// locations and then `PATH` are searched.
pub fn find_chrome(config: &SessionConfig) -> Result<PathBuf, SetupError> {
    if let Some(ref path) = config.chrome_executable {
        if path.exists() {
            return Ok(path.clone());
        }
        return Err(SetupError::Launch(format!(
            "configured Chrome executable does not exist: {}",
            path.display()
        )));
    }

    for path in CHROME_PATHS {
        let p = std::path::Path::new(path);
        if p.exists() {
            info!("Found Chrome at: {}", path);
            return Ok(p.to_path_buf());
        }
    }

    for cmd in CHROME_COMMANDS {
        if let Ok(path) = which::which(cmd) {
            info!("Found Chrome in PATH: {}", path.display());
            return Ok(path);
        }
    }

    Err(SetupError::BrowserNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_configured_path_is_an_error() {
        let config = SessionConfig {
            chrome_executable: Some(PathBuf::from("/nonexistent/chrome-binary")),
            ..SessionConfig::default()
        };
        assert!(matches!(find_chrome(&config), Err(SetupError::Launch(_))));
    }

    #[test]
    fn test_existing_configured_path_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chrome");
        std::fs::write(&path, "").unwrap();

        let config = SessionConfig {
            chrome_executable: Some(path.clone()),
            ..SessionConfig::default()
        };
        assert_eq!(find_chrome(&config).unwrap(), path);
    }
}
