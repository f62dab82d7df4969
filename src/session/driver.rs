//! Session driver interface
//!
//! The pipeline never talks to the portal directly; it consumes this
//! capability interface: open a session, authenticate, wait for an element,
//! type, click, extract text, trigger a download. Any browser-automation or
//! HTTP+HTML implementation qualifies. Each call carries its own failure
//! mode and callers decide per-call whether a failure is fatal to the cycle
//! or skips a single record.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by session driver calls
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Navigation failed for {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("Timed out after {timeout:?} waiting for {locator}")]
    Timeout { locator: String, timeout: Duration },

    #[error("Element not found: {locator}")]
    NotFound { locator: String },

    #[error("Invalid locator {locator}: {message}")]
    Locator { locator: String, message: String },

    #[error("No view loaded; call open() first")]
    NoView,

    #[error("Authentication rejected by the portal")]
    AuthRejected,

    #[error("Download failed: {0}")]
    Download(String),

    #[error("HTTP transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for session driver operations
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Outcome of a bounded element wait
///
/// "Element not found" is not one condition but two, and the difference
/// matters: the portal renders its empty-result marker as ordinary content,
/// so a missing element on a fully rendered view means "no data", while a
/// view that never reached a determinate state means "broken". Exception
/// semantics cannot distinguish the two; this tri-state can.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The element appeared before the deadline
    Found,
    /// The view rendered but the element is definitively missing; callers
    /// that expect an empty-result rendering treat this as "no data"
    Absent,
    /// The view never reached a determinate state before the deadline
    TimedOut,
}

/// Portal login credentials
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    // Never print the password, even at trace level
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Navigation and extraction primitives over an authenticated portal session
///
/// Locators are CSS selectors. Implementations own whatever transport state
/// the portal requires (cookies, view state, form buffers); the pipeline
/// holds a driver for at most one cycle and closes it on every exit path.
#[async_trait]
pub trait SessionDriver: Send {
    /// Navigates to a URL (absolute, or relative to the portal base)
    async fn open(&mut self, url: &str) -> SessionResult<()>;

    /// Authenticates against the currently loaded login view
    async fn authenticate(&mut self, credentials: &Credentials) -> SessionResult<()>;

    /// Waits up to `timeout` for an element to be present
    async fn wait_for(&mut self, locator: &str, timeout: Duration) -> SessionResult<WaitOutcome>;

    /// Activates an element: follows a link or submits the enclosing form
    async fn click(&mut self, locator: &str) -> SessionResult<()>;

    /// Types into a form field, replacing any previous value
    async fn type_text(&mut self, locator: &str, text: &str) -> SessionResult<()>;

    /// Reads the text content of an element
    async fn read_text(&mut self, locator: &str) -> SessionResult<String>;

    /// Returns the source of the currently loaded view
    fn view_source(&self) -> SessionResult<String>;

    /// Activates a download control and blocks until a file with the
    /// expected name appears under `dir` or the timeout elapses
    async fn trigger_download(
        &mut self,
        locator: &str,
        dir: &Path,
        expected_name: &str,
        timeout: Duration,
    ) -> SessionResult<PathBuf>;

    /// Tears down the session; further calls are invalid
    async fn close(&mut self) -> SessionResult<()>;
}
