//! # synclub-mcp
//!
//! SynClub MCP 服务器:将漫画生成后端 API 封装为一组 MCP 工具。
//!
//! MCP server exposing the SynClub comic-generation API as a fixed set of
//! tools. Each tool invocation is translated into one upstream HTTP call and
//! driven to a synchronous result: immediate payloads are returned as-is,
//! event streams are aggregated in arrival order, and asynchronous task
//! handles are polled to completion on a bounded budget.
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Environment-driven gateway configuration |
//! | [`error`] | Unified error taxonomy |
//! | [`envelope`] | Normalization of the two backend envelope dialects |
//! | [`gateway`] | HTTP client: auth injection, envelope decoding, multipart |
//! | `sse` | Event-stream aggregation |
//! | [`poller`] | Bounded task polling |
//! | [`catalog`] | Static tool definitions, endpoint map, dispatch descriptors |
//! | [`dispatch`] | Orchestration core: validate → build → complete → normalize |
//! | [`server`] | MCP surface over the `rmcp` SDK |

pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod poller;
pub mod server;

pub(crate) mod sse;

pub use config::GatewayConfig;
pub use dispatch::{Dispatcher, PollSettings, ToolOutcome};
pub use error::{Error, Result};
pub use gateway::{FileField, Gateway, RequestOptions};
pub use poller::PollPolicy;
pub use server::{boot_stdio_server, SynclubServer};
