//! Schedule Helper MCP server: the scheduling tools over stdio.
//!
//! Usage: spawned by an MCP client (e.g. Claude Desktop) as
//! `schedule-helper-mcp`. Reads the same configuration as the HTTP service.
//! Stdout carries the protocol, so logs go to stderr.

use rmcp::ServiceExt;
use schedule_helper::adapters::resolve_tz;
use schedule_helper::config::Settings;
use schedule_helper::mcp::ScheduleHelperMcp;
use schedule_helper::routes::scheduling::AppState;
use schedule_helper::services::SlotSource;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {e}"))?;

    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings.logging.level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    resolve_tz(&settings.defaults.timezone)
        .map_err(|e| anyhow::anyhow!("Invalid default timezone: {e}"))?;

    let state = AppState::from_settings(&settings)
        .map_err(|e| anyhow::anyhow!("Failed to compile extraction patterns: {e}"))?;

    tracing::info!("MCP server starting, slot source: {}", state.slot_source.name());

    let service = ScheduleHelperMcp::new(state)
        .serve(rmcp::transport::io::stdio())
        .await?;
    service.waiting().await?;

    Ok(())
}
