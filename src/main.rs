//! SynClub MCP server binary (stdio transport).
//!
//! Configure in an MCP client's settings:
//! ```json
//! {
//!   "mcpServers": {
//!     "synclub": {
//!       "command": "/path/to/synclub-mcp",
//!       "env": {
//!         "SYNCLUB_MCP_API": "<api key>",
//!         "UNIFIED_API_BASE_URL": "https://..."
//!       }
//!     }
//!   }
//! }
//! ```

use anyhow::Result;
use std::sync::Arc;
use synclub_mcp::{boot_stdio_server, Dispatcher, Gateway, GatewayConfig, SynclubServer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Stdout carries the MCP protocol; all logging goes to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting synclub-mcp");

    let config = GatewayConfig::from_env();
    let gateway = Arc::new(Gateway::new(config)?);
    let dispatcher = Arc::new(Dispatcher::new(gateway));

    boot_stdio_server(SynclubServer::new(dispatcher)).await?;

    tracing::info!("synclub-mcp shut down");
    Ok(())
}
