//! 后端响应信封归一化：`base_resp` 与 `errno` 两种方言的统一视图。
//!
//! Backend envelope normalization.
//!
//! The upstream API answers in two envelope dialects:
//!
//! - most endpoints wrap status in `base_resp: {status_code, status_msg}`;
//! - the task-status endpoint reports `errno` with `err_msg` (or `msg`) at the
//!   top level.
//!
//! [`Envelope`] reconciles both into one `{code, message}` view so the gateway
//! and the poller never touch raw field names. Status code constants live here
//! as well; the pending sentinel (2200) is the one nonzero code that does not
//! mean failure.

use serde_json::Value;

/// Successful completion.
pub const SUCCESS: i64 = 0;
/// Credential invalid or missing.
pub const AUTH_INVALID: i64 = 1004;
/// Account has not completed real-name verification.
pub const VERIFICATION_REQUIRED: i64 = 2038;
/// Asynchronous task not yet complete. Not a failure during polling.
pub const PENDING: i64 = 2200;

/// Normalized view over a backend response envelope.
///
/// `code: None` means the response carried no envelope at all, in which case
/// the gateway passes the raw body through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    pub code: Option<i64>,
    pub message: Option<String>,
}

impl Envelope {
    /// Read the standard `base_resp.{status_code, status_msg}` dialect.
    pub fn from_base_resp(body: &Value) -> Self {
        let base = body.get("base_resp");
        Self {
            code: base
                .and_then(|b| b.get("status_code"))
                .and_then(Value::as_i64),
            message: base
                .and_then(|b| b.get("status_msg"))
                .and_then(Value::as_str)
                .map(str::to_owned),
        }
    }

    /// Read the task-status dialect: top-level `errno` with `err_msg` or
    /// `msg`, falling back to `base_resp` when `errno` is absent.
    pub fn from_task_response(body: &Value) -> Self {
        if let Some(code) = body.get("errno").and_then(Value::as_i64) {
            let message = body
                .get("err_msg")
                .or_else(|| body.get("msg"))
                .and_then(Value::as_str)
                .map(str::to_owned);
            return Self {
                code: Some(code),
                message,
            };
        }
        Self::from_base_resp(body)
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(SUCCESS)
    }

    pub fn is_pending(&self) -> bool {
        self.code == Some(PENDING)
    }

    /// Terminal failure: a code that is present, nonzero, and not the pending
    /// sentinel.
    pub fn is_failure(&self) -> bool {
        matches!(self.code, Some(code) if code != SUCCESS && code != PENDING)
    }

    /// Status message, or `fallback` when the backend sent none.
    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| fallback.to_owned())
    }
}
