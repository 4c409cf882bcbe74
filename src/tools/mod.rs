//! Tool handlers and registration.
//!
//! Two groups: basic session/generation tools (fully implemented against the
//! driver capability) and studio tools (registered placeholders).

pub mod basic;
pub mod selectors;
pub mod studio;

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::config::ServerConfig;
use crate::dispatch::CallStats;
use crate::envelope::ToolOutput;
use crate::error::ServerError;
use crate::registry::{ToolDefinition, ToolHandler, ToolRegistry};
use crate::session::manager::SessionManager;

/// Shared state captured by every handler closure.
pub struct ToolContext {
    pub session: Arc<SessionManager>,
    pub config: ServerConfig,
    pub stats: Arc<CallStats>,
}

/// Arguments for tools that take none.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
pub struct EmptyParams {}

/// JSON Schema for a parameter struct, as stored in the registry and used by
/// the dispatcher's structural validation.
pub fn input_schema<T: schemars::JsonSchema>() -> Value {
    let schema = schemars::gen::SchemaGenerator::default().into_root_schema_for::<T>();
    serde_json::to_value(schema).unwrap_or_else(|_| serde_json::json!({"type": "object"}))
}

/// Adapt a typed async handler into the registry's erased handler shape.
/// Missing arguments deserialize from `{}`; serde failures map to
/// `invalid_arguments` (second line of defense behind schema validation).
fn erase<P, F, Fut>(ctx: &Arc<ToolContext>, f: F) -> ToolHandler
where
    P: serde::de::DeserializeOwned + Send + 'static,
    F: Fn(Arc<ToolContext>, P) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<ToolOutput, ServerError>> + Send + 'static,
{
    let ctx = Arc::clone(ctx);
    Arc::new(move |args: Value| {
        let ctx = Arc::clone(&ctx);
        let f = f.clone();
        Box::pin(async move {
            let args = match args {
                Value::Null => Value::Object(serde_json::Map::new()),
                other => other,
            };
            let params: P = serde_json::from_value(args)
                .map_err(|e| ServerError::InvalidArguments(e.to_string()))?;
            f(ctx, params).await
        })
    })
}

/// Register the full tool surface: six basic tools, five studio tools.
/// Registration order is the discovery order.
pub fn register_all(registry: &mut ToolRegistry, ctx: &Arc<ToolContext>) -> Result<(), ServerError> {
    use basic::*;
    use studio::*;

    registry.register(ToolDefinition::new(
        "suno_open_browser",
        "Open the browser and navigate to the Suno AI create page. \
         Required before other Suno operations unless auto-open is enabled.",
        input_schema::<OpenBrowserParams>(),
        erase(ctx, open_browser),
    ))?;
    registry.register(ToolDefinition::new(
        "suno_login",
        "Login to a Suno AI account with email and password. \
         Credentials are used for the login form only and never logged.",
        input_schema::<LoginParams>(),
        erase(ctx, login),
    ))?;
    registry.register(ToolDefinition::new(
        "suno_generate_track",
        "Generate a music track from a prompt, with optional style, lyrics, \
         and duration. Generation continues in the background; check progress \
         with suno_get_status.",
        input_schema::<GenerateTrackParams>(),
        erase(ctx, generate_track),
    ))?;
    registry.register(ToolDefinition::new(
        "suno_download_track",
        "Locate a generated track in the library by ID and trigger its \
         download (and stems when requested) into the configured directory.",
        input_schema::<DownloadTrackParams>(),
        erase(ctx, download_track),
    ))?;
    registry.register(ToolDefinition::new(
        "suno_get_status",
        "Report session and server status: browser open/closed, current page, \
         completed call count, and the last error if any. Never fails.",
        input_schema::<EmptyParams>(),
        erase(ctx, get_status),
    ))?;
    registry.register(ToolDefinition::new(
        "suno_close_browser",
        "Close the browser session. Safe to call when nothing is open.",
        input_schema::<EmptyParams>(),
        erase(ctx, close_browser),
    ))?;

    registry.register(ToolDefinition::new(
        "studio_open",
        "Open Suno Studio (DAW mode).",
        input_schema::<EmptyParams>(),
        erase(ctx, studio_open),
    ))?;
    registry.register(ToolDefinition::new(
        "studio_create_project",
        "Create a new Studio project with name, template, BPM, and key.",
        input_schema::<CreateProjectParams>(),
        erase(ctx, studio_create_project),
    ))?;
    registry.register(ToolDefinition::new(
        "studio_generate_stem",
        "Generate a stem (drums, bass, synth, ...) into the current project.",
        input_schema::<GenerateStemParams>(),
        erase(ctx, studio_generate_stem),
    ))?;
    registry.register(ToolDefinition::new(
        "studio_export_project",
        "Export the current Studio project as a final mix.",
        input_schema::<ExportProjectParams>(),
        erase(ctx, studio_export_project),
    ))?;
    registry.register(ToolDefinition::new(
        "studio_get_status",
        "Report Studio project state.",
        input_schema::<EmptyParams>(),
        erase(ctx, studio_get_status),
    ))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_params_accept_empty_object() {
        let params: EmptyParams = serde_json::from_value(serde_json::json!({})).unwrap();
        let _ = params;
    }

    #[test]
    fn input_schema_marks_required_fields() {
        let schema = input_schema::<basic::LoginParams>();
        let required = schema["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "email"));
        assert!(required.iter().any(|v| v == "password"));
    }
}
