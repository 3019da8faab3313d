use async_trait::async_trait;
use std::time::Duration;

/// One isolated browsing session against the travel site. Implementations
/// wrap a real browser (WebDriver) or a deterministic fake in tests.
#[async_trait]
pub trait BrowserSession: Send {
    async fn goto(&mut self, url: &str) -> Result<(), SessionError>;

    async fn current_url(&mut self) -> Result<String, SessionError>;

    /// Clear the element matching `selector` and type `value` into it
    async fn fill(&mut self, selector: &str, value: &str) -> Result<(), SessionError>;

    async fn click(&mut self, selector: &str) -> Result<(), SessionError>;

    /// Wait up to `timeout` for `selector` to appear. Ok(false) on timeout;
    /// Err only for session-level faults.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool, SessionError>;

    /// Whether at least one element matches `selector`
    async fn exists(&mut self, selector: &str) -> Result<bool, SessionError>;

    /// Inner text of the first match, None when absent
    async fn text(&mut self, selector: &str) -> Result<Option<String>, SessionError>;

    /// Release the session. Must be called on every exit path.
    async fn close(&mut self) -> Result<(), SessionError>;
}

/// Factory for fresh sessions; the driver opens one per booking run
#[async_trait]
pub trait Browser: Send + Sync {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, SessionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to open browser session: {0}")]
    Connect(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("element interaction failed for '{selector}': {detail}")]
    Element { selector: String, detail: String },

    #[error("session error: {0}")]
    Other(String),
}
