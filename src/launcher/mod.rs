//! Browser process launcher.
//!
//! Spawns a Chromium-family browser with remote debugging enabled, scans
//! its stderr for the `DevTools listening on ws://…` announcement, connects
//! the WebSocket transport to that endpoint and opens a [`Connection`].
//!
//! The returned [`Browser`] is a scoped resource owner: dropping it kills
//! the process and removes the temporary profile directory on every exit
//! path, normal or not. No process-wide shutdown hooks are involved.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `options` | Browser command-line configuration |

// ============================================================================
// Imports
// ============================================================================

use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde_json::json;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::transport::WebSocketTransport;

// ============================================================================
// Submodules
// ============================================================================

/// Browser command-line configuration.
pub mod options;

pub use options::ChromeOptions;

// ============================================================================
// Constants
// ============================================================================

/// Fixed stderr pattern announcing the listening endpoint.
static LISTENING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^DevTools listening on (ws://\S+)$").expect("listening pattern is valid")
});

/// Deadline for the cooperative `Browser.close` exchange.
const QUIT_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Launcher
// ============================================================================

/// Spawns browser processes and opens CDP connections to them.
pub struct Launcher;

impl Launcher {
    /// Launches the browser described by `options`.
    ///
    /// # Errors
    ///
    /// - [`Error::BrowserNotFound`] if the binary does not exist
    /// - [`Error::Launch`] if the process cannot be spawned, or exits
    ///   before announcing its endpoint
    /// - [`Error::ConnectionTimeout`] if no endpoint is announced within
    ///   the startup timeout
    /// - [`Error::WebSocket`] if the transport handshake fails
    pub async fn launch(options: ChromeOptions) -> Result<Browser> {
        if !options.binary.exists() {
            return Err(Error::browser_not_found(&options.binary));
        }

        // Temporary profile unless the caller supplied one. Owned by the
        // Browser so it outlives the process and is removed on drop.
        let (profile_dir, temp_profile) = match &options.user_data_dir {
            Some(dir) => (dir.clone(), None),
            None => {
                let temp = TempDir::new()?;
                (temp.path().to_path_buf(), Some(temp))
            }
        };

        let args = options.to_args(&profile_dir);
        debug!(binary = %options.binary.display(), "Launching browser");

        let mut child = Command::new(&options.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::launch(e.to_string()))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::launch("stderr not captured"))?;
        let mut lines = BufReader::new(stderr).lines();

        let endpoint = match timeout(options.startup_timeout, scan_for_endpoint(&mut lines)).await
        {
            Ok(Ok(endpoint)) => endpoint,
            Ok(Err(e)) => {
                let _ = child.start_kill();
                return Err(e);
            }
            Err(_) => {
                let _ = child.start_kill();
                return Err(Error::connection_timeout(
                    options.startup_timeout.as_millis() as u64,
                ));
            }
        };
        info!(endpoint = %endpoint, "Browser listening");

        // Keep draining stderr so the process never blocks on a full pipe.
        tokio::spawn(async move {
            while let Ok(Some(line)) = lines.next_line().await {
                trace!(stderr = %line, "Browser output");
            }
        });

        let (tx, rx) = match WebSocketTransport::connect(endpoint.as_str()).await {
            Ok(halves) => halves,
            Err(e) => {
                let _ = child.start_kill();
                return Err(e);
            }
        };

        let name = match (endpoint.host_str(), endpoint.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            _ => endpoint.to_string(),
        };
        let connection = Connection::open(name, tx, rx);

        Ok(Browser {
            child,
            connection,
            endpoint,
            _temp_profile: temp_profile,
        })
    }
}

/// Reads stderr lines until the endpoint announcement appears.
async fn scan_for_endpoint<R>(lines: &mut tokio::io::Lines<BufReader<R>>) -> Result<Url>
where
    R: AsyncRead + Unpin,
{
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!(stderr = line, "Browser output");

        if let Some(captures) = LISTENING_PATTERN.captures(line) {
            let raw = &captures[1];
            return Url::parse(raw)
                .map_err(|e| Error::launch(format!("invalid endpoint {raw}: {e}")));
        }
    }

    Err(Error::launch(
        "browser exited before announcing a DevTools endpoint",
    ))
}

// ============================================================================
// Browser
// ============================================================================

/// A launched browser process and its CDP connection.
///
/// Owns the process, the connection and the temporary profile directory.
/// Dropping the value kills the process and removes the directory; calling
/// [`Browser::close`] first gives the browser a chance to quit cleanly.
pub struct Browser {
    child: Child,
    connection: Connection,
    endpoint: Url,
    _temp_profile: Option<TempDir>,
}

impl Browser {
    /// Returns the CDP connection to this browser.
    #[inline]
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Returns the DevTools endpoint the browser announced.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns the browser process id, if still running.
    #[inline]
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Closes the browser cooperatively.
    ///
    /// Sends `Browser.close`, closes the connection, then waits for the
    /// process to exit, killing it if it does not.
    pub async fn close(mut self) {
        if !self.connection.is_closed() {
            if let Err(e) = self
                .connection
                .send("Browser.close", json!({}), QUIT_TIMEOUT)
                .await
            {
                warn!(error = %e, "Cooperative browser close failed");
            }
            self.connection.close();
        }

        match timeout(QUIT_TIMEOUT, self.child.wait()).await {
            Ok(Ok(status)) => debug!(%status, "Browser exited"),
            _ => {
                warn!("Browser did not exit in time, killing");
                let _ = self.child.start_kill();
            }
        }
    }
}

impl Drop for Browser {
    fn drop(&mut self) {
        self.connection.close();
        // Last resort for exit paths that skipped close(); kill_on_drop
        // covers the process, the TempDir removes the profile.
        let _ = self.child.start_kill();
    }
}

impl std::fmt::Debug for Browser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Browser")
            .field("endpoint", &self.endpoint.as_str())
            .field("pid", &self.pid())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    async fn scan(input: &str) -> Result<Url> {
        let mut lines = BufReader::new(input.as_bytes()).lines();
        scan_for_endpoint(&mut lines).await
    }

    #[tokio::test]
    async fn test_scan_finds_endpoint() {
        let stderr = "\
[WARNING] something unrelated\n\
\n\
DevTools listening on ws://127.0.0.1:9222/devtools/browser/abc-123\n\
later line\n";

        let endpoint = scan(stderr).await.expect("endpoint");
        assert_eq!(
            endpoint.as_str(),
            "ws://127.0.0.1:9222/devtools/browser/abc-123"
        );
    }

    #[tokio::test]
    async fn test_scan_requires_exact_prefix() {
        // The announcement must start the line.
        let stderr = "note: DevTools listening on ws://127.0.0.1:9222/x\n";
        let err = scan(stderr).await.unwrap_err();
        assert!(matches!(err, Error::Launch { .. }));
    }

    #[tokio::test]
    async fn test_scan_eof_is_launch_error() {
        let err = scan("no announcement here\n").await.unwrap_err();
        assert!(matches!(err, Error::Launch { .. }));
    }

    #[test]
    fn test_pattern_captures_url_only() {
        let captures = LISTENING_PATTERN
            .captures("DevTools listening on ws://[::1]:9333/devtools/browser/xyz")
            .expect("match");
        assert_eq!(&captures[1], "ws://[::1]:9333/devtools/browser/xyz");
    }
}
