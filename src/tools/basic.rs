//! Basic Suno tools: session lifecycle, login, generation, download, status.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{SessionOptions, SUNO_CREATE_URL, SUNO_LIBRARY_URL};
use crate::envelope::ToolOutput;
use crate::error::ServerError;
use crate::retry::{with_retry, RetryPolicy};
use crate::tools::{selectors, EmptyParams, ToolContext};

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct OpenBrowserParams {
    #[schemars(description = "Run the browser in headless mode (default: true)")]
    pub headless: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct LoginParams {
    #[schemars(description = "Suno AI account email address")]
    pub email: String,
    #[schemars(description = "Suno AI account password")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GenerateTrackParams {
    #[schemars(description = "Description of the desired music")]
    pub prompt: String,
    #[schemars(description = "Musical style (default: synthwave)")]
    pub style: Option<String>,
    #[schemars(description = "Lyrics to incorporate into the track")]
    pub lyrics: Option<String>,
    #[schemars(description = "Track length: auto, short, medium, or long")]
    pub duration: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DownloadTrackParams {
    #[schemars(description = "ID of the track to download")]
    pub track_id: String,
    #[schemars(description = "Directory to save files (default: the configured download dir)")]
    pub download_path: Option<String>,
    #[schemars(description = "Also trigger the stems download when available (default: true)")]
    pub include_stems: Option<bool>,
}

pub async fn open_browser(
    ctx: Arc<ToolContext>,
    params: OpenBrowserParams,
) -> Result<ToolOutput, ServerError> {
    let options = SessionOptions {
        headless: params.headless.unwrap_or(ctx.config.session.headless),
        ..ctx.config.session.clone()
    };
    let headless = options.headless;
    // Explicit open: works even with auto-open disabled.
    ctx.session.ensure_open(Some(options)).await?;

    let (url, title) = ctx
        .session
        .with_session(|handle| async move {
            handle.navigate(SUNO_CREATE_URL).await?;
            Ok((handle.current_url().await, handle.title().await))
        })
        .await?;

    Ok(ToolOutput::Text(format!(
        "Browser opened and navigated to Suno AI.\n\
         Page title: {}\nURL: {}\nHeadless: {headless}",
        title.unwrap_or_else(|| "unknown".into()),
        url.unwrap_or_else(|| "unknown".into()),
    )))
}

pub async fn login(ctx: Arc<ToolContext>, params: LoginParams) -> Result<ToolOutput, ServerError> {
    ctx.session
        .with_session(|handle| async move {
            if let Some(url) = handle.current_url().await {
                if url.contains("/create") && !url.contains("/login") {
                    return Ok(ToolOutput::Text(format!(
                        "Already logged in. Current URL: {url}\nReady for music generation."
                    )));
                }
            }

            // A visible sign-in button is optional: some flows land directly
            // on the form.
            let _ = selectors::click_any(&handle, selectors::LOGIN_BUTTON, "open_login_form").await;
            let _ = selectors::wait_for_any(&handle, selectors::EMAIL_INPUT, Duration::from_secs(5))
                .await?;

            let policy = RetryPolicy::default();
            with_retry(policy, || {
                selectors::fill_any(&handle, selectors::EMAIL_INPUT, &params.email, "fill_email")
            })
            .await?;
            with_retry(policy, || {
                selectors::fill_any(
                    &handle,
                    selectors::PASSWORD_INPUT,
                    &params.password,
                    "fill_password",
                )
            })
            .await?;
            with_retry(policy, || {
                selectors::click_any(&handle, selectors::SUBMIT_BUTTON, "submit_login")
            })
            .await?;

            // The app may run extra auth steps (2FA); give navigation a
            // moment before reading the outcome.
            tokio::time::sleep(Duration::from_secs(3)).await;
            let final_url = handle.current_url().await.unwrap_or_default();
            let logged_in = final_url.contains("/create") || final_url.contains("/library");

            Ok(ToolOutput::Text(if logged_in {
                format!("Login successful. Current URL: {final_url}\nReady for music generation.")
            } else {
                format!(
                    "Login attempted. Current URL: {final_url}\n\
                     Additional authentication steps may be required."
                )
            }))
        })
        .await
}

pub async fn generate_track(
    ctx: Arc<ToolContext>,
    params: GenerateTrackParams,
) -> Result<ToolOutput, ServerError> {
    ctx.session
        .with_session(|handle| async move {
            let on_create_page = handle
                .current_url()
                .await
                .map(|url| url.contains("/create"))
                .unwrap_or(false);
            if !on_create_page {
                handle.navigate(SUNO_CREATE_URL).await?;
            }
            let _ = selectors::wait_for_any(&handle, selectors::PROMPT_INPUT, Duration::from_secs(5))
                .await?;

            let policy = RetryPolicy::default();
            with_retry(policy, || {
                selectors::fill_any(&handle, selectors::PROMPT_INPUT, &params.prompt, "fill_prompt")
            })
            .await?;

            if let Some(lyrics) = params.lyrics.as_deref() {
                with_retry(policy, || {
                    selectors::fill_any(&handle, selectors::LYRICS_INPUT, lyrics, "fill_lyrics")
                })
                .await?;
            }

            let style = params.style.as_deref().unwrap_or("synthwave");
            if style != "synthwave" {
                // Style control is not present in every UI revision.
                let _ = selectors::fill_any(&handle, selectors::STYLE_INPUT, style, "fill_style")
                    .await;
            }

            with_retry(policy, || {
                selectors::click_any(&handle, selectors::GENERATE_BUTTON, "click_generate")
            })
            .await?;

            let started = selectors::wait_for_any(
                &handle,
                selectors::GENERATING_INDICATOR,
                Duration::from_secs(5),
            )
            .await?;

            let mut report = format!(
                "Track generation {}.\nPrompt: \"{}\"\nStyle: {style}",
                if started { "started" } else { "initiated" },
                params.prompt,
            );
            if params.lyrics.is_some() {
                report.push_str("\nLyrics: provided");
            }
            if let Some(duration) = params.duration.as_deref() {
                report.push_str(&format!("\nDuration: {duration}"));
            }
            report.push_str("\n\nGeneration in progress. Use suno_get_status to check progress.");
            Ok(ToolOutput::Text(report))
        })
        .await
}

pub async fn download_track(
    ctx: Arc<ToolContext>,
    params: DownloadTrackParams,
) -> Result<ToolOutput, ServerError> {
    let download_dir = params
        .download_path
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_else(|| ctx.config.download_dir.clone());
    let include_stems = params.include_stems.unwrap_or(true);

    ctx.session
        .with_session(|handle| async move {
            handle.accept_downloads(&download_dir).await?;

            let in_library = handle
                .current_url()
                .await
                .map(|url| url.contains("/library"))
                .unwrap_or(false);
            if !in_library {
                handle.navigate(SUNO_LIBRARY_URL).await?;
            }

            let track_selectors = selectors::track_candidates(&params.track_id);
            let found =
                selectors::wait_for_any(&handle, &track_selectors, Duration::from_secs(8)).await?;
            if !found {
                return Err(ServerError::automation(
                    "locate_track",
                    params.track_id.clone(),
                    "track not found in library",
                ));
            }
            selectors::click_any(&handle, &track_selectors, "open_track").await?;

            with_retry(RetryPolicy::default(), || {
                selectors::click_any(&handle, selectors::DOWNLOAD_BUTTON, "click_download")
            })
            .await?;

            // Stems are best-effort: the main download already succeeded.
            let stems_triggered = include_stems
                && selectors::click_any(&handle, selectors::STEMS_BUTTON, "click_stems")
                    .await
                    .is_ok();

            Ok(ToolOutput::Text(format!(
                "Download triggered for track {}.\nDestination: {}\nStems requested: {}",
                params.track_id,
                download_dir.display(),
                if stems_triggered { "yes" } else { "no" },
            )))
        })
        .await
}

/// Aggregate status report. Reports failure state as data and never fails
/// itself.
pub async fn get_status(ctx: Arc<ToolContext>, _params: EmptyParams) -> Result<ToolOutput, ServerError> {
    let status = ctx.session.status().await;
    Ok(ToolOutput::Text(format!(
        "Suno MCP Status\n\
         Browser open: {}\n\
         Current URL: {}\n\
         Page title: {}\n\
         In studio: {}\n\
         Completed calls: {}\n\
         Last error: {}",
        status.open,
        status.current_url.as_deref().unwrap_or("none"),
        status.page_title.as_deref().unwrap_or("none"),
        status.in_studio,
        ctx.stats.completed_calls(),
        ctx.stats.last_error().as_deref().unwrap_or("none"),
    )))
}

pub async fn close_browser(
    ctx: Arc<ToolContext>,
    _params: EmptyParams,
) -> Result<ToolOutput, ServerError> {
    ctx.session.close().await;
    Ok(ToolOutput::Text("Browser closed.".into()))
}
