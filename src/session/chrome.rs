//! chromiumoxide-backed driver: launches Chrome over CDP and drives the page
//! with JS-eval interactions.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::sync::Mutex;

use crate::config::SessionOptions;
use crate::error::ServerError;
use crate::session::{Driver, SessionHandle};

/// Find the Chrome/Chromium binary on the current platform.
pub fn find_chrome_binary() -> Result<PathBuf, ServerError> {
    let candidates = chrome_candidates();

    for candidate in &candidates {
        let path = PathBuf::from(candidate);
        if path.exists() {
            tracing::info!("Found Chrome at: {}", path.display());
            return Ok(path);
        }
    }

    for name in &[
        "google-chrome",
        "google-chrome-stable",
        "chromium-browser",
        "chromium",
    ] {
        if let Ok(path) = which::which(name) {
            tracing::info!("Found Chrome in PATH: {}", path.display());
            return Ok(path);
        }
    }

    Err(ServerError::SessionInit(format!(
        "Could not find Chrome or Chromium. Searched:\n{}",
        candidates.join("\n")
    )))
}

fn chrome_candidates() -> Vec<String> {
    let mut candidates = Vec::new();

    #[cfg(target_os = "macos")]
    {
        candidates.extend([
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome".into(),
            "/Applications/Chromium.app/Contents/MacOS/Chromium".into(),
        ]);
        if let Ok(home) = std::env::var("HOME") {
            candidates.push(format!(
                "{}/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
                home
            ));
        }
    }

    #[cfg(target_os = "linux")]
    {
        candidates.extend([
            "/usr/bin/google-chrome".into(),
            "/usr/bin/google-chrome-stable".into(),
            "/usr/bin/chromium-browser".into(),
            "/usr/bin/chromium".into(),
            "/snap/bin/chromium".into(),
        ]);
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(pf) = std::env::var("PROGRAMFILES") {
            candidates.push(format!("{}\\Google\\Chrome\\Application\\chrome.exe", pf));
        }
        if let Ok(local) = std::env::var("LOCALAPPDATA") {
            candidates.push(format!("{}\\Google\\Chrome\\Application\\chrome.exe", local));
        }
    }

    candidates
}

pub struct ChromeDriver;

#[async_trait]
impl Driver for ChromeDriver {
    async fn open(&self, options: &SessionOptions) -> Result<Arc<dyn SessionHandle>, ServerError> {
        let session = ChromeSession::launch(options).await?;
        Ok(Arc::new(session))
    }
}

/// One driven Chrome instance plus its page.
pub struct ChromeSession {
    page: Page,
    browser: Mutex<Option<Browser>>,
    handler_task: tokio::task::JoinHandle<()>,
    navigation_timeout: Duration,
    // Ephemeral profile dir; cleaned up when the session drops.
    _profile_dir: Option<tempfile::TempDir>,
}

impl ChromeSession {
    pub async fn launch(options: &SessionOptions) -> Result<Self, ServerError> {
        let chrome = find_chrome_binary()?;

        let mut profile_dir = None;
        let user_data_dir = match &options.user_data_dir {
            Some(dir) => dir.clone(),
            None => {
                let tmp = tempfile::tempdir()
                    .map_err(|e| ServerError::SessionInit(format!("temp profile dir: {e}")))?;
                let path = tmp.path().to_path_buf();
                profile_dir = Some(tmp);
                path
            }
        };

        let mut builder = BrowserConfig::builder();
        if options.headless {
            builder = builder.arg("--headless=new");
        }
        builder = builder
            .chrome_executable(chrome)
            .user_data_dir(&user_data_dir)
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-default-apps")
            .arg("--disable-extensions")
            .arg("--disable-hang-monitor")
            .arg("--disable-popup-blocking")
            .arg("--disable-prompt-on-repost")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .arg("--metrics-recording-only")
            .window_size(1280, 720);

        let config = builder
            .build()
            .map_err(|e| ServerError::SessionInit(e.to_string()))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ServerError::SessionInit(format!("Failed to launch Chrome: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {
                // Drain CDP events
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                // Partial launch must be fully torn down before the error
                // surfaces.
                handler_task.abort();
                drop(browser);
                return Err(ServerError::SessionInit(format!(
                    "Failed to create initial page: {e}"
                )));
            }
        };

        tracing::info!(headless = options.headless, "Browser session started");

        Ok(Self {
            page,
            browser: Mutex::new(Some(browser)),
            handler_task,
            navigation_timeout: options.navigation_timeout,
            _profile_dir: profile_dir,
        })
    }

    async fn eval(&self, step: &'static str, target: &str, js: String) -> Result<(), ServerError> {
        self.page
            .evaluate(js.as_str())
            .await
            .map_err(|e| ServerError::automation(step, target, e))?;
        Ok(())
    }

    /// JS expression resolving the first match of a CSS selector, throwing
    /// when absent so the failure carries the selector.
    fn require_element_js(selector: &str) -> String {
        let sel = serde_json::to_string(selector).unwrap_or_default();
        format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el) throw new Error('Element not found: ' + {sel});
                return el;
            }})"#
        )
    }
}

#[async_trait]
impl SessionHandle for ChromeSession {
    async fn navigate(&self, url: &str) -> Result<(), ServerError> {
        tracing::info!("Navigating to: {}", url);
        let goto = self.page.goto(url);
        match tokio::time::timeout(self.navigation_timeout, goto).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(ServerError::automation("navigate", url, e)),
            Err(_) => {
                return Err(ServerError::automation(
                    "navigate",
                    url,
                    format!("timed out after {:?}", self.navigation_timeout),
                ))
            }
        }
        // goto waits for the load event; brief settle for post-load JS
        // rendering on heavy SPA pages.
        tokio::time::sleep(Duration::from_millis(300)).await;
        Ok(())
    }

    async fn current_url(&self) -> Option<String> {
        self.page.url().await.ok().flatten()
    }

    async fn title(&self) -> Option<String> {
        self.page.get_title().await.ok().flatten()
    }

    async fn click(&self, selector: &str) -> Result<(), ServerError> {
        let js = format!(
            r#"(() => {{
                const el = {resolve}();
                el.scrollIntoView({{ block: 'center', inline: 'center', behavior: 'instant' }});
                el.click();
                return true;
            }})()"#,
            resolve = Self::require_element_js(selector)
        );
        self.eval("click", selector, js).await
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<(), ServerError> {
        // Native value setter + input/change events so framework-controlled
        // inputs (React) pick up the change.
        let js = format!(
            r#"(() => {{
                const el = {resolve}();
                el.scrollIntoView({{ block: 'center', behavior: 'instant' }});
                el.focus();
                const text = {text};
                if (el.tagName === 'INPUT' || el.tagName === 'TEXTAREA') {{
                    const setter = Object.getOwnPropertyDescriptor(
                        window.HTMLInputElement.prototype, 'value'
                    )?.set || Object.getOwnPropertyDescriptor(
                        window.HTMLTextAreaElement.prototype, 'value'
                    )?.set;
                    if (setter) {{ setter.call(el, text); }} else {{ el.value = text; }}
                    el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                    el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                }} else {{
                    el.textContent = '';
                    document.execCommand('insertText', false, text);
                }}
                return true;
            }})()"#,
            resolve = Self::require_element_js(selector),
            text = serde_json::to_string(text)
                .map_err(|e| ServerError::automation("fill", selector, e))?,
        );
        self.eval("fill", selector, js).await
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<bool, ServerError> {
        let sel = serde_json::to_string(selector)
            .map_err(|e| ServerError::automation("wait_for", selector, e))?;
        let check_js = format!("(() => document.querySelector({sel}) !== null)()");

        let interval = Duration::from_millis(100);
        let mut elapsed = Duration::ZERO;
        loop {
            let found: bool = self
                .page
                .evaluate(check_js.as_str())
                .await
                .ok()
                .and_then(|r| r.into_value().ok())
                .unwrap_or(false);
            if found {
                return Ok(true);
            }
            if elapsed >= timeout {
                return Ok(false);
            }
            tokio::time::sleep(interval).await;
            elapsed += interval;
        }
    }

    async fn accept_downloads(&self, dir: &Path) -> Result<(), ServerError> {
        std::fs::create_dir_all(dir)
            .map_err(|e| ServerError::automation("accept_downloads", dir.display().to_string(), e))?;
        let cmd = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::Allow)
            .download_path(dir.display().to_string())
            .build()
            .map_err(|e| {
                ServerError::automation("accept_downloads", dir.display().to_string(), e)
            })?;
        self.page
            .execute(cmd)
            .await
            .map_err(|e| ServerError::automation("accept_downloads", dir.display().to_string(), e))?;
        Ok(())
    }

    async fn close(&self) -> Result<(), ServerError> {
        // Browser drop tears down Chrome; taking it out of the slot makes a
        // second close a no-op.
        let browser = self.browser.lock().await.take();
        if browser.is_some() {
            self.handler_task.abort();
        }
        drop(browser);
        Ok(())
    }
}
