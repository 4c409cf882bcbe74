//! Error taxonomy for the dispatch/session core.
//!
//! Every error carries a stable machine-readable kind alongside the
//! human-readable message. Dispatch-level errors (unknown tool, invalid
//! arguments) are caller mistakes and are never retried; session and
//! automation errors may be retried inside individual handlers before
//! surfacing here.

use thiserror::Error;

/// Stable machine-readable error codes, as seen by transport clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DuplicateTool,
    ToolNotFound,
    InvalidArguments,
    SessionInit,
    SessionClosed,
    OperationTimeout,
    AutomationAction,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuplicateTool => "duplicate_tool",
            Self::ToolNotFound => "tool_not_found",
            Self::InvalidArguments => "invalid_arguments",
            Self::SessionInit => "session_init_failed",
            Self::SessionClosed => "session_closed",
            Self::OperationTimeout => "operation_timeout",
            Self::AutomationAction => "automation_action_failed",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Failed to initialize browser session: {0}")]
    SessionInit(String),

    #[error("No open browser session (auto-open is disabled). Call suno_open_browser first.")]
    SessionClosed,

    #[error("Operation timed out after {0:?}")]
    OperationTimeout(std::time::Duration),

    #[error("Automation step '{step}' failed on '{target}': {message}")]
    AutomationAction {
        step: &'static str,
        target: String,
        message: String,
    },
}

impl ServerError {
    /// Context-preserving constructor for driver failures.
    pub fn automation(step: &'static str, target: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::AutomationAction {
            step,
            target: target.into(),
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateTool(_) => ErrorKind::DuplicateTool,
            Self::UnknownTool(_) => ErrorKind::ToolNotFound,
            Self::InvalidArguments(_) => ErrorKind::InvalidArguments,
            Self::SessionInit(_) => ErrorKind::SessionInit,
            Self::SessionClosed => ErrorKind::SessionClosed,
            Self::OperationTimeout(_) => ErrorKind::OperationTimeout,
            Self::AutomationAction { .. } => ErrorKind::AutomationAction,
        }
    }
}
