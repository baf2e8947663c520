//! MCP 服务端:通过 rmcp SDK 暴露工具目录,转发调用给调度器。
//!
//! MCP server surface.
//!
//! The transport and session layer come from the `rmcp` SDK and are consumed
//! as a black box; this module only implements `ServerHandler`:
//! `tools/list` serves the static catalog, `tools/call` forwards to the
//! [`Dispatcher`]. The dispatcher never errors outward, so `call_tool`
//! always answers with a tool result and the session stays alive.

use crate::catalog;
use crate::dispatch::Dispatcher;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler, ServiceExt};
use std::borrow::Cow;
use std::sync::Arc;

/// MCP handler backed by the tool dispatcher.
#[derive(Clone)]
pub struct SynclubServer {
    dispatcher: Arc<Dispatcher>,
}

impl SynclubServer {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

impl ServerHandler for SynclubServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "synclub-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "SynClub MCP Server: comic story, chapter, character and image \
                 generation tools backed by the SynClub API."
                    .into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools = catalog::TOOLS
            .iter()
            .map(|spec| {
                Tool::new(
                    Cow::Borrowed(spec.name),
                    Cow::Borrowed(spec.description),
                    Arc::new(
                        spec.input_schema
                            .as_object()
                            .cloned()
                            .unwrap_or_default(),
                    ),
                )
            })
            .collect();
        Ok(ListToolsResult {
            tools,
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let args = request.arguments.unwrap_or_default();
        let outcome = self.dispatcher.dispatch(&request.name, &args).await;
        let content = vec![Content::text(outcome.text)];
        Ok(if outcome.is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        })
    }
}

/// Boot the MCP server in stdio mode.
///
/// Runs until the client closes the transport. Logging must go to stderr;
/// stdout belongs to the protocol.
pub async fn boot_stdio_server(server: SynclubServer) -> anyhow::Result<()> {
    tracing::info!("Starting SynClub MCP stdio server");

    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .inspect_err(|e| {
            tracing::error!("MCP stdio serve error: {:?}", e);
        })?;

    service.waiting().await?;
    Ok(())
}
