//! Studio (DAW) tools.
//!
//! The Studio surface is registered so discovery and client integrations see
//! the full tool set, but the automation flows are not built yet: every
//! handler returns the `NotImplemented` placeholder, which the envelope
//! builder maps to the documented "Implementation needed" marker as a
//! success.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::envelope::ToolOutput;
use crate::error::ServerError;
use crate::tools::{EmptyParams, ToolContext};

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CreateProjectParams {
    #[schemars(description = "Project name")]
    pub name: String,
    #[schemars(description = "Project template (e.g. pop, electronic)")]
    pub template: Option<String>,
    #[schemars(description = "Project tempo in BPM")]
    pub bpm: Option<u32>,
    #[schemars(description = "Musical key (e.g. C, D#m)")]
    pub key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GenerateStemParams {
    #[schemars(description = "Description of the stem to generate")]
    pub prompt: String,
    #[schemars(description = "Stem type: drums, bass, synth, vocals, ...")]
    pub stem_type: Option<String>,
    #[schemars(description = "Timeline position in bars")]
    pub position: Option<u32>,
    #[schemars(description = "Stem length in bars")]
    pub duration: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ExportProjectParams {
    #[schemars(description = "Export format: wav or mp3")]
    pub format: Option<String>,
    #[schemars(description = "Export quality: high, medium, or low")]
    pub quality: Option<String>,
}

pub async fn studio_open(
    _ctx: Arc<ToolContext>,
    _params: EmptyParams,
) -> Result<ToolOutput, ServerError> {
    Ok(ToolOutput::NotImplemented)
}

pub async fn studio_create_project(
    _ctx: Arc<ToolContext>,
    _params: CreateProjectParams,
) -> Result<ToolOutput, ServerError> {
    Ok(ToolOutput::NotImplemented)
}

pub async fn studio_generate_stem(
    _ctx: Arc<ToolContext>,
    _params: GenerateStemParams,
) -> Result<ToolOutput, ServerError> {
    Ok(ToolOutput::NotImplemented)
}

pub async fn studio_export_project(
    _ctx: Arc<ToolContext>,
    _params: ExportProjectParams,
) -> Result<ToolOutput, ServerError> {
    Ok(ToolOutput::NotImplemented)
}

pub async fn studio_get_status(
    _ctx: Arc<ToolContext>,
    _params: EmptyParams,
) -> Result<ToolOutput, ServerError> {
    Ok(ToolOutput::NotImplemented)
}
