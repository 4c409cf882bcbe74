//! Automation-session resource: driver capability traits and the single-owner
//! lifecycle manager.

pub mod chrome;
pub mod manager;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::SessionOptions;
use crate::error::ServerError;

/// Opaque capability that creates automation sessions. `open` may fail
/// (missing Chrome binary, launch failure) and must not leave a half-built
/// session behind when it does.
#[async_trait]
pub trait Driver: Send + Sync {
    async fn open(
        &self,
        options: &SessionOptions,
    ) -> Result<std::sync::Arc<dyn SessionHandle>, ServerError>;
}

/// One live automation session: a driven browser page. Actions may time out;
/// `close` must be safe to call more than once.
#[async_trait]
pub trait SessionHandle: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), ServerError>;

    /// Best-effort: `None` when the page cannot be queried.
    async fn current_url(&self) -> Option<String>;
    async fn title(&self) -> Option<String>;

    /// Click the first element matching the CSS selector.
    async fn click(&self, selector: &str) -> Result<(), ServerError>;

    /// Clear the matched input/textarea and type `text` into it.
    async fn fill(&self, selector: &str, text: &str) -> Result<(), ServerError>;

    /// Wait up to `timeout` for the selector to resolve. `Ok(false)` means
    /// the element never appeared — that alone is not an error.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<bool, ServerError>;

    /// Route triggered downloads into `dir`. Best-effort; the download itself
    /// is driven by clicking the page's download controls.
    async fn accept_downloads(&self, dir: &Path) -> Result<(), ServerError>;

    async fn close(&self) -> Result<(), ServerError>;
}

/// Snapshot reported by status tools. Producing it never fails.
#[derive(Debug, Clone, Default)]
pub struct SessionStatus {
    pub open: bool,
    pub current_url: Option<String>,
    pub page_title: Option<String>,
    pub in_studio: bool,
}
