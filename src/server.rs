//! The MCP server facade: composes registry, dispatcher, and session manager
//! and exposes every registered tool as a typed rmcp tool method.
//!
//! The facade never lets a handler error reach the transport as a thrown
//! protocol error: every dispatch outcome maps to a CallToolResult envelope,
//! with failures carrying their stable error kind in the text.

use rmcp::model::*;
use rmcp::tool;
use rmcp::{Error as McpError, ServerHandler};
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::dispatch::{CallStats, Dispatcher};
use crate::envelope::ToolCallResult;
use crate::error::ServerError;
use crate::registry::ToolRegistry;
use crate::session::chrome::ChromeDriver;
use crate::session::manager::SessionManager;
use crate::session::Driver;
use crate::tools::{self, basic, studio, ToolContext};

#[derive(Clone)]
pub struct SunoMcpServer {
    registry: Arc<ToolRegistry>,
    dispatcher: Arc<Dispatcher>,
    session: Arc<SessionManager>,
}

impl SunoMcpServer {
    /// Server backed by a real Chrome session.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        Self::with_driver(config, Arc::new(ChromeDriver))
    }

    /// Server backed by an arbitrary driver (tests inject a mock here, so
    /// multiple instances never share browser state).
    pub fn with_driver(config: ServerConfig, driver: Arc<dyn Driver>) -> Result<Self, ServerError> {
        let session = Arc::new(SessionManager::new(
            driver,
            config.session.clone(),
            config.auto_open,
        ));
        let stats = Arc::new(CallStats::new());
        let ctx = Arc::new(ToolContext {
            session: Arc::clone(&session),
            config: config.clone(),
            stats: Arc::clone(&stats),
        });

        let mut registry = ToolRegistry::new();
        tools::register_all(&mut registry, &ctx)?;
        let registry = Arc::new(registry);
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&registry),
            stats,
            config.call_timeout,
        ));

        Ok(Self {
            registry,
            dispatcher,
            session,
        })
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Deterministic teardown of the browser resource; idempotent.
    pub async fn shutdown(&self) {
        self.session.close().await;
    }

    /// Route a typed tool call through the dispatcher and convert the
    /// envelope for the transport.
    async fn relay<P: serde::Serialize>(
        &self,
        name: &str,
        params: P,
    ) -> Result<CallToolResult, McpError> {
        let args = serde_json::to_value(params)
            .map_err(|e| McpError::internal_error(format!("argument encoding: {e}"), None))?;
        Ok(Self::to_transport(self.dispatcher.dispatch(name, args).await))
    }

    fn to_transport(result: ToolCallResult) -> CallToolResult {
        match result {
            ToolCallResult::Success(envelope) => CallToolResult::success(
                envelope
                    .content
                    .into_iter()
                    .map(|item| Content::text(item.as_text().to_string()))
                    .collect(),
            ),
            ToolCallResult::Failure { kind, message } => {
                CallToolResult::error(vec![Content::text(format!("[{kind}] {message}"))])
            }
        }
    }
}

#[tool(tool_box)]
impl ServerHandler for SunoMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "suno-mcp: automated Suno AI music generation. \
                 Start with `suno_open_browser`, authenticate with `suno_login`, \
                 then `suno_generate_track` to create music and \
                 `suno_download_track` to fetch it. `suno_get_status` reports \
                 session state at any time."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[tool(tool_box)]
impl SunoMcpServer {
    // ── Basic tools ─────────────────────────────────────────────────────

    #[tool(description = "Open the browser and navigate to the Suno AI create page.")]
    async fn suno_open_browser(
        &self,
        #[tool(aggr)] params: basic::OpenBrowserParams,
    ) -> Result<CallToolResult, McpError> {
        self.relay("suno_open_browser", params).await
    }

    #[tool(description = "Login to a Suno AI account. Credentials are never logged.")]
    async fn suno_login(
        &self,
        #[tool(aggr)] params: basic::LoginParams,
    ) -> Result<CallToolResult, McpError> {
        self.relay("suno_login", params).await
    }

    #[tool(description = "Generate a music track from a prompt with optional style and lyrics.")]
    async fn suno_generate_track(
        &self,
        #[tool(aggr)] params: basic::GenerateTrackParams,
    ) -> Result<CallToolResult, McpError> {
        self.relay("suno_generate_track", params).await
    }

    #[tool(description = "Download a generated track (and optionally stems) from the library.")]
    async fn suno_download_track(
        &self,
        #[tool(aggr)] params: basic::DownloadTrackParams,
    ) -> Result<CallToolResult, McpError> {
        self.relay("suno_download_track", params).await
    }

    #[tool(description = "Report session and server status. Never fails.")]
    async fn suno_get_status(&self) -> Result<CallToolResult, McpError> {
        self.relay("suno_get_status", serde_json::json!({})).await
    }

    #[tool(description = "Close the browser session. Safe to call when nothing is open.")]
    async fn suno_close_browser(&self) -> Result<CallToolResult, McpError> {
        self.relay("suno_close_browser", serde_json::json!({})).await
    }

    // ── Studio tools ────────────────────────────────────────────────────

    #[tool(description = "Open Suno Studio (DAW mode).")]
    async fn studio_open(&self) -> Result<CallToolResult, McpError> {
        self.relay("studio_open", serde_json::json!({})).await
    }

    #[tool(description = "Create a new Studio project.")]
    async fn studio_create_project(
        &self,
        #[tool(aggr)] params: studio::CreateProjectParams,
    ) -> Result<CallToolResult, McpError> {
        self.relay("studio_create_project", params).await
    }

    #[tool(description = "Generate a stem into the current Studio project.")]
    async fn studio_generate_stem(
        &self,
        #[tool(aggr)] params: studio::GenerateStemParams,
    ) -> Result<CallToolResult, McpError> {
        self.relay("studio_generate_stem", params).await
    }

    #[tool(description = "Export the current Studio project.")]
    async fn studio_export_project(
        &self,
        #[tool(aggr)] params: studio::ExportProjectParams,
    ) -> Result<CallToolResult, McpError> {
        self.relay("studio_export_project", params).await
    }

    #[tool(description = "Report Studio project state.")]
    async fn studio_get_status(&self) -> Result<CallToolResult, McpError> {
        self.relay("studio_get_status", serde_json::json!({})).await
    }
}
