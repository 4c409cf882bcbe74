//! Server and session configuration.
//!
//! Consumed by the core, produced by the CLI. Credential inputs (login email
//! and password) arrive as tool arguments, not configuration, and are never
//! logged.

use std::path::PathBuf;
use std::time::Duration;

pub const SUNO_CREATE_URL: &str = "https://app.suno.ai/create/";
pub const SUNO_LIBRARY_URL: &str = "https://app.suno.ai/library/";
pub const SUNO_STUDIO_URL: &str = "https://studio.suno.ai/";

/// Options recognized when opening the automation session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub headless: bool,
    pub navigation_timeout: Duration,
    /// Chrome profile directory. `None` launches with an ephemeral profile.
    pub user_data_dir: Option<PathBuf>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            headless: true,
            navigation_timeout: Duration::from_secs(30),
            user_data_dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub session: SessionOptions,
    /// Directory reported as the destination for triggered downloads.
    pub download_dir: PathBuf,
    /// Upper bound on a single tool call, enforced by the dispatcher.
    pub call_timeout: Duration,
    /// When false, session-using tools fail with `session_closed` instead of
    /// launching the browser implicitly.
    pub auto_open: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            session: SessionOptions::default(),
            download_dir: PathBuf::from("downloads"),
            call_timeout: Duration::from_secs(120),
            auto_open: true,
        }
    }
}
