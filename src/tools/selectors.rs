//! Selector candidate lists and fallback helpers for the Suno UI.
//!
//! The Suno frontend changes frequently; every interaction tries an ordered
//! list of candidate selectors and succeeds on the first that works.

use std::sync::Arc;
use std::time::Duration;

use crate::error::ServerError;
use crate::session::SessionHandle;

pub const LOGIN_BUTTON: &[&str] = &[
    "[data-testid=\"login-button\"]",
    "button[data-purpose=\"sign-in\"]",
    ".login-button",
];

pub const EMAIL_INPUT: &[&str] = &[
    "input[type=\"email\"]",
    "input[name=\"email\"]",
    "input[placeholder*=\"email\" i]",
    "#email",
    "[data-testid=\"email-input\"]",
];

pub const PASSWORD_INPUT: &[&str] = &[
    "input[type=\"password\"]",
    "input[name=\"password\"]",
    "input[placeholder*=\"password\" i]",
    "#password",
    "[data-testid=\"password-input\"]",
];

pub const SUBMIT_BUTTON: &[&str] = &[
    "button[type=\"submit\"]",
    "[data-testid=\"submit-button\"]",
    ".submit-button",
];

pub const PROMPT_INPUT: &[&str] = &[
    "textarea[placeholder*=\"describe\" i]",
    "textarea[placeholder*=\"prompt\" i]",
    "textarea[name=\"prompt\"]",
    "textarea[data-testid=\"prompt-input\"]",
    ".prompt-input",
    "#prompt",
];

pub const LYRICS_INPUT: &[&str] = &[
    "textarea[placeholder*=\"lyrics\" i]",
    "textarea[name=\"lyrics\"]",
    "textarea[data-testid=\"lyrics-input\"]",
    ".lyrics-input",
];

pub const STYLE_INPUT: &[&str] = &[
    "input[placeholder*=\"style\" i]",
    "select[name=\"style\"]",
    "select[data-testid=\"style-select\"]",
];

pub const GENERATE_BUTTON: &[&str] = &[
    "button[type=\"submit\"]",
    "[data-testid=\"generate-button\"]",
    ".generate-button",
    "[data-purpose=\"create\"]",
];

pub const GENERATING_INDICATOR: &[&str] = &[
    "[data-testid=\"generating\"]",
    ".generating",
    "[data-status=\"generating\"]",
];

pub const DOWNLOAD_BUTTON: &[&str] = &[
    "[data-testid=\"download-button\"]",
    ".download-button",
    "a[download]",
];

pub const STEMS_BUTTON: &[&str] = &[
    "[data-testid=\"stems-button\"]",
    ".stems-button",
];

/// Selectors locating a specific track card in the library.
pub fn track_candidates(track_id: &str) -> Vec<String> {
    vec![
        format!("[data-track-id=\"{track_id}\"]"),
        format!("[data-song-id=\"{track_id}\"]"),
        format!("a[href*=\"{track_id}\"]"),
        format!("[data-testid=\"track-{track_id}\"]"),
    ]
}

/// Click the first candidate that works. Fails with the step name when every
/// candidate misses.
pub async fn click_any(
    handle: &Arc<dyn SessionHandle>,
    candidates: &[impl AsRef<str>],
    step: &'static str,
) -> Result<(), ServerError> {
    for candidate in candidates {
        if handle.click(candidate.as_ref()).await.is_ok() {
            tracing::debug!(step, selector = candidate.as_ref(), "Clicked");
            return Ok(());
        }
    }
    Err(ServerError::automation(
        step,
        summarize(candidates),
        "no candidate selector matched",
    ))
}

/// Fill the first candidate that works.
pub async fn fill_any(
    handle: &Arc<dyn SessionHandle>,
    candidates: &[impl AsRef<str>],
    text: &str,
    step: &'static str,
) -> Result<(), ServerError> {
    for candidate in candidates {
        if handle.fill(candidate.as_ref(), text).await.is_ok() {
            tracing::debug!(step, selector = candidate.as_ref(), "Filled");
            return Ok(());
        }
    }
    Err(ServerError::automation(
        step,
        summarize(candidates),
        "no candidate selector matched",
    ))
}

/// Wait until any candidate appears. `Ok(false)` when none did within the
/// timeout.
pub async fn wait_for_any(
    handle: &Arc<dyn SessionHandle>,
    candidates: &[impl AsRef<str>],
    timeout: Duration,
) -> Result<bool, ServerError> {
    let per_candidate = timeout / candidates.len().max(1) as u32;
    for candidate in candidates {
        if handle.wait_for(candidate.as_ref(), per_candidate).await? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn summarize(candidates: &[impl AsRef<str>]) -> String {
    candidates
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ")
}
