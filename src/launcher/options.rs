//! Chrome command-line options.
//!
//! Provides a type-safe interface for configuring the browser process:
//! binary location, headless mode, window size, user-data directory and
//! extra switches.
//!
//! # Example
//!
//! ```ignore
//! use chrome_cdp::ChromeOptions;
//!
//! let options = ChromeOptions::new("/usr/bin/chromium")
//!     .with_headless()
//!     .with_window_size(1920, 1080);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Switches applied to every launch.
///
/// `--remote-debugging-port=0` makes the browser pick a free port and
/// announce the resulting endpoint on stderr.
pub const DEFAULT_ARGS: &[&str] = &[
    "--remote-debugging-port=0",
    "--disable-background-networking",
    "--disable-background-timer-throttling",
    "--disable-breakpad",
    "--disable-client-side-phishing-detection",
    "--disable-default-apps",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--disable-hang-monitor",
    "--disable-popup-blocking",
    "--disable-prompt-on-repost",
    "--disable-sync",
    "--metrics-recording-only",
    "--no-first-run",
    "--enable-automation",
    "--password-store=basic",
    "--use-mock-keychain",
];

/// Default time to wait for the browser to announce its endpoint.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// ChromeOptions
// ============================================================================

/// Browser process configuration.
#[derive(Debug, Clone)]
pub struct ChromeOptions {
    /// Path to the browser binary.
    pub binary: PathBuf,

    /// Run without a GUI.
    pub headless: bool,

    /// Window dimensions in pixels (width, height).
    pub window_size: Option<(u32, u32)>,

    /// Profile directory. When `None`, a temporary directory is created
    /// and removed when the browser is dropped.
    pub user_data_dir: Option<PathBuf>,

    /// Additional command-line switches.
    pub extra_args: Vec<String>,

    /// Time to wait for the DevTools endpoint announcement.
    pub startup_timeout: Duration,
}

// ============================================================================
// Constructors
// ============================================================================

impl ChromeOptions {
    /// Creates options for the given browser binary with default settings.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            headless: false,
            window_size: None,
            user_data_dir: None,
            extra_args: Vec::new(),
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ChromeOptions {
    /// Enables headless mode.
    #[inline]
    #[must_use]
    pub fn with_headless(mut self) -> Self {
        self.headless = true;
        self
    }

    /// Sets the window dimensions.
    #[inline]
    #[must_use]
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = Some((width, height));
        self
    }

    /// Uses an existing profile directory instead of a temporary one.
    #[inline]
    #[must_use]
    pub fn with_user_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_data_dir = Some(dir.into());
        self
    }

    /// Appends a custom command-line switch.
    #[inline]
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Overrides the endpoint-announcement deadline.
    #[inline]
    #[must_use]
    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }
}

// ============================================================================
// Argument Generation
// ============================================================================

impl ChromeOptions {
    /// Builds the full argument list for the given profile directory.
    #[must_use]
    pub fn to_args(&self, user_data_dir: &Path) -> Vec<String> {
        let mut args: Vec<String> = DEFAULT_ARGS.iter().map(ToString::to_string).collect();

        args.push(format!("--user-data-dir={}", user_data_dir.display()));

        if self.headless {
            args.push("--headless=new".to_string());
        }

        if let Some((width, height)) = self.window_size {
            args.push(format!("--window-size={width},{height}"));
        }

        args.extend(self.extra_args.iter().cloned());
        args.push("about:blank".to_string());

        args
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args_always_present() {
        let options = ChromeOptions::new("/usr/bin/chromium");
        let args = options.to_args(Path::new("/tmp/profile"));

        assert!(args.contains(&"--remote-debugging-port=0".to_string()));
        assert!(args.contains(&"--user-data-dir=/tmp/profile".to_string()));
        assert_eq!(args.last(), Some(&"about:blank".to_string()));
    }

    #[test]
    fn test_headless_and_window_size() {
        let options = ChromeOptions::new("/usr/bin/chromium")
            .with_headless()
            .with_window_size(1280, 720);
        let args = options.to_args(Path::new("/tmp/profile"));

        assert!(args.contains(&"--headless=new".to_string()));
        assert!(args.contains(&"--window-size=1280,720".to_string()));
    }

    #[test]
    fn test_extra_args_appended_before_initial_page() {
        let options = ChromeOptions::new("/usr/bin/chromium").with_arg("--no-sandbox");
        let args = options.to_args(Path::new("/tmp/profile"));

        let extra_pos = args.iter().position(|a| a == "--no-sandbox").expect("arg");
        assert_eq!(extra_pos, args.len() - 2);
    }

    #[test]
    fn test_builder_defaults() {
        let options = ChromeOptions::new("/opt/chrome");
        assert!(!options.headless);
        assert!(options.user_data_dir.is_none());
        assert_eq!(options.startup_timeout, DEFAULT_STARTUP_TIMEOUT);
    }
}
