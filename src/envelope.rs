//! Uniform response envelope for tool calls.
//!
//! Every dispatch completes with a `ToolCallResult` — success or handled
//! failure — and the transport layer only ever sees this shape. Handlers that
//! are registered but not yet built return `ToolOutput::NotImplemented`,
//! which the builder maps to a *success* envelope carrying the stable
//! "Implementation needed" marker so discovery and integration flows keep
//! working against an evolving tool surface.

use serde::Serialize;

use crate::error::{ErrorKind, ServerError};

/// Marker text for placeholder tools. Fully implemented handlers must never
/// emit this string.
pub const NOT_IMPLEMENTED_MARKER: &str = "Implementation needed";

/// What a handler produces on success.
#[derive(Debug)]
pub enum ToolOutput {
    Text(String),
    /// Registered placeholder: the tool exists but its automation flow
    /// has not been built yet.
    NotImplemented,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentItem {
    Text { text: String },
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn as_text(&self) -> &str {
        match self {
            Self::Text { text } => text,
        }
    }
}

/// Ordered content for one completed call. Never empty.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResponseEnvelope {
    pub content: Vec<ContentItem>,
}

impl ResponseEnvelope {
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        // The content invariant: non-empty for any completed call.
        let text = if text.is_empty() { "ok".to_string() } else { text };
        Self {
            content: vec![ContentItem::text(text)],
        }
    }

    /// Normalize a handler's raw output into the envelope shape.
    pub fn from_output(tool_name: &str, output: ToolOutput) -> Self {
        match output {
            ToolOutput::Text(text) => {
                debug_assert!(
                    !text.contains(NOT_IMPLEMENTED_MARKER),
                    "implemented handlers must not emit the placeholder marker"
                );
                Self::text(text)
            }
            ToolOutput::NotImplemented => Self::text(format!(
                "{tool_name}: {NOT_IMPLEMENTED_MARKER}. \
                 This tool is registered but its automation flow is not built yet."
            )),
        }
    }
}

/// Per-call result. Constructed per dispatch, never persisted.
#[derive(Debug)]
pub enum ToolCallResult {
    Success(ResponseEnvelope),
    Failure { kind: ErrorKind, message: String },
}

impl ToolCallResult {
    pub fn failure(err: &ServerError) -> Self {
        Self::Failure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_content_is_never_empty() {
        let env = ResponseEnvelope::text("");
        assert_eq!(env.content.len(), 1);
        assert!(!env.content[0].as_text().is_empty());
    }

    #[test]
    fn not_implemented_maps_to_marker_success() {
        let env = ResponseEnvelope::from_output("studio_open", ToolOutput::NotImplemented);
        assert!(env.content[0].as_text().contains(NOT_IMPLEMENTED_MARKER));
        assert!(env.content[0].as_text().contains("studio_open"));
    }

    #[test]
    fn content_item_serializes_with_text_type() {
        let item = ContentItem::text("hello");
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "text");
        assert_eq!(value["text"], "hello");
    }

    #[test]
    fn failure_carries_stable_kind() {
        let result = ToolCallResult::failure(&ServerError::UnknownTool("nope".into()));
        match result {
            ToolCallResult::Failure { kind, message } => {
                assert_eq!(kind.as_str(), "tool_not_found");
                assert!(message.contains("nope"));
            }
            _ => panic!("expected failure"),
        }
    }
}
