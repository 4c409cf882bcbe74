//! Single point of truth for the automation-session lifetime.
//!
//! At most one live session per manager. Open and close serialize on the
//! slot mutex; tool calls that use the session serialize on a second, coarser
//! lock held for the duration of one call, so long automation waits never
//! block an unrelated open/close indefinitely. The lock guard is RAII: it is
//! released on every exit path, including handler errors.

use std::sync::Arc;

use tokio::sync::{oneshot, Mutex};

use crate::config::SessionOptions;
use crate::error::ServerError;
use crate::session::{Driver, SessionHandle, SessionStatus};

pub struct SessionManager {
    driver: Arc<dyn Driver>,
    defaults: SessionOptions,
    auto_open: bool,
    /// Open/close critical section and owner of the one live handle.
    slot: Mutex<Option<Arc<dyn SessionHandle>>>,
    /// Serializes session-using tool calls against each other.
    use_lock: Mutex<()>,
}

impl SessionManager {
    pub fn new(driver: Arc<dyn Driver>, defaults: SessionOptions, auto_open: bool) -> Self {
        Self {
            driver,
            defaults,
            auto_open,
            slot: Mutex::new(None),
            use_lock: Mutex::new(()),
        }
    }

    pub async fn is_open(&self) -> bool {
        self.slot.lock().await.is_some()
    }

    /// Idempotent open: an existing session is returned unchanged — the
    /// supplied options are only consulted when a session is actually created.
    /// Concurrent callers serialize on the slot lock, so exactly one
    /// underlying resource ever exists. A failed launch is the driver's
    /// responsibility to tear down fully before returning.
    ///
    /// The launch itself runs on a detached task. If this call is cancelled
    /// mid-open (the dispatcher's per-call timeout drops the future), the
    /// task still runs to completion and closes the session it launched, so
    /// a timed-out open never leaks a half-initialized browser.
    pub async fn ensure_open(
        &self,
        options: Option<SessionOptions>,
    ) -> Result<Arc<dyn SessionHandle>, ServerError> {
        let mut slot = self.slot.lock().await;
        if let Some(handle) = slot.as_ref() {
            return Ok(Arc::clone(handle));
        }
        let options = options.unwrap_or_else(|| self.defaults.clone());
        tracing::info!(headless = options.headless, "Launching browser session");

        let driver = Arc::clone(&self.driver);
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let result = driver.open(&options).await;
            match tx.send(result) {
                Ok(()) => {}
                // The caller went away while the launch was in flight; a
                // session with no owner must be released, not leaked.
                Err(Ok(handle)) => {
                    tracing::warn!("Session open outlived its caller, closing the orphaned session");
                    if let Err(err) = handle.close().await {
                        tracing::warn!("Orphaned session close reported an error (ignored): {}", err);
                    }
                }
                Err(Err(err)) => {
                    tracing::warn!("Abandoned session open failed: {}", err);
                }
            }
        });
        let handle = rx
            .await
            .map_err(|_| ServerError::SessionInit("session open task aborted".into()))??;
        *slot = Some(Arc::clone(&handle));
        Ok(handle)
    }

    /// Idempotent close: releases the underlying resource exactly once, is a
    /// no-op when nothing is open, and never fails — close errors are logged
    /// as non-fatal.
    pub async fn close(&self) {
        let handle = self.slot.lock().await.take();
        if let Some(handle) = handle {
            if let Err(err) = handle.close().await {
                tracing::warn!("Browser close reported an error (ignored): {}", err);
            } else {
                tracing::info!("Browser session closed");
            }
        }
    }

    /// Run one session-using operation under the coarse use lock. Opens the
    /// session lazily unless auto-open is disabled, in which case a missing
    /// session is a `session_closed` failure.
    pub async fn with_session<F, Fut, T>(&self, f: F) -> Result<T, ServerError>
    where
        F: FnOnce(Arc<dyn SessionHandle>) -> Fut,
        Fut: std::future::Future<Output = Result<T, ServerError>>,
    {
        let _use = self.use_lock.lock().await;
        let handle = {
            let slot = self.slot.lock().await;
            slot.as_ref().map(Arc::clone)
            // Slot lock drops here — open/close stay unblocked while the
            // handler runs.
        };
        let handle = match handle {
            Some(handle) => handle,
            None if self.auto_open => self.ensure_open(None).await?,
            None => return Err(ServerError::SessionClosed),
        };
        f(handle).await
    }

    /// Status snapshot. Reports failure state as data, never as an error.
    pub async fn status(&self) -> SessionStatus {
        let handle = {
            let slot = self.slot.lock().await;
            slot.as_ref().map(Arc::clone)
        };
        match handle {
            None => SessionStatus::default(),
            Some(handle) => {
                let current_url = handle.current_url().await;
                let page_title = handle.title().await;
                let in_studio = current_url
                    .as_deref()
                    .map(|url| url.contains("/studio") || url.contains("studio.suno"))
                    .unwrap_or(false);
                SessionStatus {
                    open: true,
                    current_url,
                    page_title,
                    in_studio,
                }
            }
        }
    }
}
