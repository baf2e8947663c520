//! 统一错误类型：后端状态码分类与调度边界的错误归一。
//!
//! Unified error type for the SynClub MCP server.
//!
//! Every failure a tool invocation can hit is a variant here. The dispatcher
//! catches all of them at its boundary and converts them into an error tool
//! result; only the generic passthrough path (`Gateway::get` / `Gateway::post`
//! used directly) re-raises them to the caller.

use thiserror::Error;

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type covering backend classification, polling, streaming,
/// and dispatch validation.
#[derive(Debug, Error)]
pub enum Error {
    /// Backend status code 1004: credential invalid or missing.
    #[error("API Error: {message}. Trace-Id: {}", .trace_id.as_deref().unwrap_or("-"))]
    Auth {
        message: String,
        trace_id: Option<String>,
    },

    /// Backend status code 2038: the account must complete real-name
    /// verification before this API can be used.
    #[error("需要完成实名认证(https://synclub.baidu-int.com)。Trace-Id: {}", .trace_id.as_deref().unwrap_or("-"))]
    VerificationRequired { trace_id: Option<String> },

    /// Any other nonzero backend status code, or a wrapped transport failure
    /// (reported as code 500).
    #[error("API Error: {code}-{message}. Trace-Id: {}", .trace_id.as_deref().unwrap_or("-"))]
    Request {
        code: i64,
        message: String,
        trace_id: Option<String>,
    },

    /// Tool name not present in the catalog.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Tool exists but has no backend endpoint mapping.
    #[error("No endpoint mapping for tool {0}")]
    Configuration(String),

    /// A required tool argument is absent or empty.
    #[error("missing required argument: {0}")]
    Validation(String),

    /// Polling observed a terminal nonzero, non-pending status code.
    #[error("task failed: {0}")]
    TaskFailed(String),

    /// Polling exhausted its attempt budget.
    #[error("task did not complete in time")]
    Timeout,

    /// Transport failure while consuming an event stream.
    #[error("stream error: {0}")]
    Stream(String),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Wrap a transport-level failure into a `Request` error with code 500.
    ///
    /// Already-classified errors must not go through here; the gateway
    /// propagates those unchanged.
    pub(crate) fn transport(err: impl std::fmt::Display) -> Self {
        Error::Request {
            code: 500,
            message: format!("Request failed: {err}"),
            trace_id: None,
        }
    }

    /// Backend status code carried by this error, if any.
    pub fn status_code(&self) -> Option<i64> {
        match self {
            Error::Auth { .. } => Some(crate::envelope::AUTH_INVALID),
            Error::VerificationRequired { .. } => Some(crate::envelope::VERIFICATION_REQUIRED),
            Error::Request { code, .. } => Some(*code),
            _ => None,
        }
    }
}
