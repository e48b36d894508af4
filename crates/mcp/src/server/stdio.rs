//! Stdio transport for a single local MCP client.

use std::sync::Arc;

use anyhow::{Context, Result};
use dssmcp_api::DssConnector;
use rmcp::ServiceExt;
use rmcp::transport::io::stdio;
use tracing::info;

use crate::server::core::DssMcpCore;

/// Serve MCP over stdin/stdout until the client disconnects.
pub async fn serve_stdio(connector: Arc<DssConnector>) -> Result<()> {
    info!(platform = %connector.base_url(), "serving MCP over stdio");
    let service = DssMcpCore::new(connector)
        .serve(stdio())
        .await
        .context("cannot start the stdio MCP service")?;
    let reason = service.waiting().await.context("stdio MCP service failed")?;
    info!(?reason, "stdio MCP service ended");
    Ok(())
}
