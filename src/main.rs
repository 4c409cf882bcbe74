use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use rmcp::transport::stdio;
use rmcp::ServiceExt;

use suno_mcp::config::{ServerConfig, SessionOptions};

/// suno-mcp: Suno AI music generation over headless Chrome
#[derive(Parser)]
#[command(name = "suno-mcp", version, about)]
struct Cli {
    /// Run Chrome with a visible window (default: headless)
    #[arg(long)]
    headed: bool,

    /// Directory for triggered track downloads
    #[arg(long, default_value = "downloads")]
    download_dir: PathBuf,

    /// Chrome profile directory (default: ephemeral profile)
    #[arg(long)]
    user_data_dir: Option<PathBuf>,

    /// Page navigation timeout in milliseconds
    #[arg(long, default_value_t = 30_000)]
    navigation_timeout_ms: u64,

    /// Upper bound on a single tool call, in seconds
    #[arg(long, default_value_t = 120)]
    call_timeout_secs: u64,

    /// Require an explicit suno_open_browser call before session-using tools
    #[arg(long)]
    no_auto_open: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log to stderr only — stdout is the MCP transport
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();
    let config = ServerConfig {
        session: SessionOptions {
            headless: !cli.headed,
            navigation_timeout: Duration::from_millis(cli.navigation_timeout_ms),
            user_data_dir: cli.user_data_dir,
        },
        download_dir: cli.download_dir,
        call_timeout: Duration::from_secs(cli.call_timeout_secs),
        auto_open: !cli.no_auto_open,
    };

    tracing::info!(
        "Starting suno-mcp server (headless: {})",
        config.session.headless
    );

    let server = suno_mcp::server::SunoMcpServer::new(config)?;
    let service = server.clone().serve(stdio()).await?;

    // Wait for the MCP service to finish OR a termination signal — whichever
    // comes first
    tokio::select! {
        result = service.waiting() => { result?; }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received interrupt signal, shutting down");
        }
    }

    // Always release the browser before exiting
    server.shutdown().await;

    tracing::info!("suno-mcp server shut down");
    Ok(())
}
