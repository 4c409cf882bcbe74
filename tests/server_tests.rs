//! End-to-end tests of the dispatch/lifecycle core against a mock driver.
//! No Chrome is required: the driver capability is injected, so these tests
//! exercise the registry, dispatcher, envelope, and session manager exactly
//! as the transport layer would.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use suno_mcp::config::{ServerConfig, SessionOptions};
use suno_mcp::envelope::{ToolCallResult, NOT_IMPLEMENTED_MARKER};
use suno_mcp::error::ServerError;
use suno_mcp::server::SunoMcpServer;
use suno_mcp::session::{Driver, SessionHandle};

// ── Mock driver ─────────────────────────────────────────────────────────

#[derive(Default)]
struct MockDriver {
    opens: AtomicU32,
    closes: Arc<AtomicU32>,
    open_delay: Duration,
    fail_open: bool,
}

impl MockDriver {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn with_open_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            open_delay: delay,
            ..Self::default()
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail_open: true,
            ..Self::default()
        })
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn open(&self, _options: &SessionOptions) -> Result<Arc<dyn SessionHandle>, ServerError> {
        if self.open_delay > Duration::ZERO {
            tokio::time::sleep(self.open_delay).await;
        }
        if self.fail_open {
            return Err(ServerError::SessionInit("mock launch failure".into()));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockSession {
            closes: Arc::clone(&self.closes),
            url: Mutex::new(None),
        }))
    }
}

struct MockSession {
    closes: Arc<AtomicU32>,
    url: Mutex<Option<String>>,
}

#[async_trait]
impl SessionHandle for MockSession {
    async fn navigate(&self, url: &str) -> Result<(), ServerError> {
        *self.url.lock().unwrap() = Some(url.to_string());
        Ok(())
    }

    async fn current_url(&self) -> Option<String> {
        self.url.lock().unwrap().clone()
    }

    async fn title(&self) -> Option<String> {
        Some("Suno AI".to_string())
    }

    async fn click(&self, _selector: &str) -> Result<(), ServerError> {
        Ok(())
    }

    async fn fill(&self, _selector: &str, _text: &str) -> Result<(), ServerError> {
        Ok(())
    }

    async fn wait_for(&self, _selector: &str, _timeout: Duration) -> Result<bool, ServerError> {
        Ok(true)
    }

    async fn accept_downloads(&self, _dir: &Path) -> Result<(), ServerError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), ServerError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn server_with(driver: Arc<MockDriver>) -> SunoMcpServer {
    SunoMcpServer::with_driver(ServerConfig::default(), driver).expect("server construction")
}

fn success_text(result: &ToolCallResult) -> &str {
    match result {
        ToolCallResult::Success(envelope) => envelope.content[0].as_text(),
        ToolCallResult::Failure { kind, message } => {
            panic!("expected success, got {kind}: {message}")
        }
    }
}

// ── Discovery ───────────────────────────────────────────────────────────

#[tokio::test]
async fn discovery_lists_exactly_the_eleven_tools() {
    let server = server_with(MockDriver::new());
    let names: Vec<_> = server.registry().list().map(|t| t.name).collect();
    assert_eq!(
        names,
        vec![
            "suno_open_browser",
            "suno_login",
            "suno_generate_track",
            "suno_download_track",
            "suno_get_status",
            "suno_close_browser",
            "studio_open",
            "studio_create_project",
            "studio_generate_stem",
            "studio_export_project",
            "studio_get_status",
        ]
    );
}

#[tokio::test]
async fn every_tool_dispatches_with_minimal_valid_args() {
    let server = server_with(MockDriver::new());
    let minimal = vec![
        ("suno_open_browser", json!({})),
        ("suno_login", json!({"email": "a@b.c", "password": "pw"})),
        ("suno_generate_track", json!({"prompt": "lofi rain"})),
        ("suno_download_track", json!({"track_id": "track_123"})),
        ("suno_get_status", json!({})),
        ("suno_close_browser", json!({})),
        ("studio_open", json!({})),
        ("studio_create_project", json!({"name": "My Album"})),
        ("studio_generate_stem", json!({"prompt": "deep bassline"})),
        ("studio_export_project", json!({})),
        ("studio_get_status", json!({})),
    ];
    for (name, args) in minimal {
        let result = server.dispatcher().dispatch(name, args).await;
        assert!(result.is_success(), "tool {name} failed: {result:?}");
    }
}

// ── Dispatch failure paths ──────────────────────────────────────────────

#[tokio::test]
async fn unknown_tool_returns_tool_not_found_failure() {
    let server = server_with(MockDriver::new());
    let result = server
        .dispatcher()
        .dispatch("nonexistent_tool", json!({}))
        .await;
    match result {
        ToolCallResult::Failure { kind, message } => {
            assert_eq!(kind.as_str(), "tool_not_found");
            assert!(message.contains("nonexistent_tool"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_required_argument_returns_invalid_arguments() {
    let server = server_with(MockDriver::new());
    let result = server.dispatcher().dispatch("suno_login", json!({})).await;
    match result {
        ToolCallResult::Failure { kind, message } => {
            assert_eq!(kind.as_str(), "invalid_arguments");
            assert!(message.contains("email"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn session_init_failure_surfaces_to_caller() {
    let server = server_with(MockDriver::failing());
    let result = server
        .dispatcher()
        .dispatch("suno_open_browser", json!({}))
        .await;
    match result {
        ToolCallResult::Failure { kind, .. } => {
            assert_eq!(kind.as_str(), "session_init_failed")
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn slow_handler_times_out_with_operation_timeout() {
    let config = ServerConfig {
        call_timeout: Duration::from_millis(50),
        ..ServerConfig::default()
    };
    let driver = MockDriver::with_open_delay(Duration::from_secs(5));
    let server = SunoMcpServer::with_driver(config, driver).unwrap();
    let result = server
        .dispatcher()
        .dispatch("suno_open_browser", json!({}))
        .await;
    match result {
        ToolCallResult::Failure { kind, .. } => {
            assert_eq!(kind.as_str(), "operation_timeout")
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn timed_out_open_tears_down_the_launched_session() {
    let config = ServerConfig {
        call_timeout: Duration::from_millis(50),
        ..ServerConfig::default()
    };
    let driver = MockDriver::with_open_delay(Duration::from_millis(200));
    let server = SunoMcpServer::with_driver(config, Arc::<MockDriver>::clone(&driver)).unwrap();

    let result = server
        .dispatcher()
        .dispatch("suno_open_browser", json!({}))
        .await;
    match result {
        ToolCallResult::Failure { kind, .. } => {
            assert_eq!(kind.as_str(), "operation_timeout")
        }
        other => panic!("expected failure, got {other:?}"),
    }

    // The launch finishes after the caller is gone; the orphaned session
    // must be closed, not stored and not leaked.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(driver.opens.load(Ordering::SeqCst), 1);
    assert_eq!(driver.closes.load(Ordering::SeqCst), 1);
    assert!(!server.session().is_open().await);
}

#[tokio::test]
async fn auto_open_disabled_fails_session_using_tools_with_session_closed() {
    let config = ServerConfig {
        auto_open: false,
        ..ServerConfig::default()
    };
    let server = SunoMcpServer::with_driver(config, MockDriver::new()).unwrap();
    let result = server
        .dispatcher()
        .dispatch("suno_generate_track", json!({"prompt": "jazz"}))
        .await;
    match result {
        ToolCallResult::Failure { kind, .. } => assert_eq!(kind.as_str(), "session_closed"),
        other => panic!("expected failure, got {other:?}"),
    }

    // The explicit open tool still works.
    let result = server
        .dispatcher()
        .dispatch("suno_open_browser", json!({}))
        .await;
    assert!(result.is_success());
}

// ── Session lifecycle ───────────────────────────────────────────────────

#[tokio::test]
async fn close_without_open_is_a_noop_success() {
    let driver = MockDriver::new();
    let server = server_with(Arc::clone(&driver));
    let result = server
        .dispatcher()
        .dispatch("suno_close_browser", json!({}))
        .await;
    assert!(result.is_success());
    assert_eq!(driver.closes.load(Ordering::SeqCst), 0);
    assert!(!server.session().is_open().await);
}

#[tokio::test]
async fn double_close_releases_the_resource_exactly_once() {
    let driver = MockDriver::new();
    let server = server_with(Arc::clone(&driver));
    server.session().ensure_open(None).await.unwrap();

    server.session().close().await;
    server.session().close().await;

    assert_eq!(driver.closes.load(Ordering::SeqCst), 1);
    assert!(!server.session().is_open().await);
}

#[tokio::test]
async fn ensure_open_is_idempotent() {
    let driver = MockDriver::new();
    let server = server_with(Arc::clone(&driver));
    server.session().ensure_open(None).await.unwrap();
    server.session().ensure_open(None).await.unwrap();
    assert_eq!(driver.opens.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_opens_create_exactly_one_session() {
    let driver = MockDriver::with_open_delay(Duration::from_millis(100));
    let server = server_with(Arc::clone(&driver));
    let session = server.session();

    let (a, b) = tokio::join!(session.ensure_open(None), session.ensure_open(None));
    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(driver.opens.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn shutdown_is_idempotent() {
    let driver = MockDriver::new();
    let server = server_with(Arc::clone(&driver));
    server.session().ensure_open(None).await.unwrap();
    server.shutdown().await;
    server.shutdown().await;
    assert_eq!(driver.closes.load(Ordering::SeqCst), 1);
}

// ── Status and placeholders ─────────────────────────────────────────────

#[tokio::test]
async fn get_status_always_succeeds_and_carries_the_status_marker() {
    let server = server_with(MockDriver::new());

    // Uninitialized session.
    let result = server.dispatcher().dispatch("suno_get_status", json!({})).await;
    let text = success_text(&result).to_string();
    assert!(text.contains("Suno MCP Status"));
    assert!(text.contains("Browser open: false"));

    // After a failed call, status still succeeds and reports the failure as
    // data.
    let _ = server
        .dispatcher()
        .dispatch("nonexistent_tool", json!({}))
        .await;
    let result = server.dispatcher().dispatch("suno_get_status", json!({})).await;
    let text = success_text(&result).to_string();
    assert!(text.contains("Suno MCP Status"));
    assert!(text.contains("Last error: nonexistent_tool"));
}

#[tokio::test]
async fn status_reports_completed_call_count() {
    let server = server_with(MockDriver::new());
    for _ in 0..3 {
        let _ = server.dispatcher().dispatch("studio_open", json!({})).await;
    }
    let result = server.dispatcher().dispatch("suno_get_status", json!({})).await;
    assert!(success_text(&result).contains("Completed calls: 3"));
}

#[tokio::test]
async fn placeholder_tool_returns_success_with_marker_text() {
    let server = server_with(MockDriver::new());
    let result = server
        .dispatcher()
        .dispatch("studio_create_project", json!({"name": "AutoMix"}))
        .await;
    match result {
        ToolCallResult::Success(envelope) => {
            assert!(!envelope.content.is_empty());
            let first = serde_json::to_value(&envelope.content[0]).unwrap();
            assert_eq!(first["type"], "text");
            assert!(first["text"]
                .as_str()
                .unwrap()
                .contains(NOT_IMPLEMENTED_MARKER));
        }
        other => panic!("expected success, got {other:?}"),
    }
}

#[tokio::test]
async fn implemented_tools_never_emit_the_placeholder_marker() {
    let server = server_with(MockDriver::new());
    for (name, args) in [
        ("suno_open_browser", json!({})),
        ("suno_get_status", json!({})),
        ("suno_close_browser", json!({})),
    ] {
        let result = server.dispatcher().dispatch(name, args).await;
        assert!(
            !success_text(&result).contains(NOT_IMPLEMENTED_MARKER),
            "{name} leaked the placeholder marker"
        );
    }
}

// ── Envelope shape across instances ─────────────────────────────────────

#[tokio::test]
async fn server_instances_do_not_share_session_state() {
    let driver_a = MockDriver::new();
    let driver_b = MockDriver::new();
    let server_a = server_with(Arc::clone(&driver_a));
    let server_b = server_with(Arc::clone(&driver_b));

    server_a.session().ensure_open(None).await.unwrap();
    assert!(server_a.session().is_open().await);
    assert!(!server_b.session().is_open().await);
    assert_eq!(driver_b.opens.load(Ordering::SeqCst), 0);
}
