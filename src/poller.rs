//! 任务轮询:按固定间隔查询任务状态直至成功、失败或超出次数预算。
//!
//! Task polling.
//!
//! A backend call that defers work answers with a task handle; the poller
//! queries the shared status endpoint on a fixed interval until a
//! caller-supplied extractor produces a value, the task reports a terminal
//! failure, or the attempt budget is exhausted.
//!
//! The pending sentinel (2200) is explicitly not an error: it means "ask
//! again". Policies are plain values so each tool can carry its own
//! `(max_attempts, interval)` pair.

use crate::catalog::QUERY_TASK_ENDPOINT;
use crate::envelope::Envelope;
use crate::gateway::Gateway;
use crate::{Error, Result};
use serde_json::{json, Value};
use std::time::Duration;

/// One polling budget: attempt count and fixed inter-attempt interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollPolicy {
    /// Budget used by the image-generation tools.
    pub const STANDARD: PollPolicy = PollPolicy {
        max_attempts: 30,
        interval: Duration::from_secs(2),
    };

    /// Longer-interval budget used by the image-edit tool.
    pub const EXTENDED: PollPolicy = PollPolicy {
        max_attempts: 20,
        interval: Duration::from_secs(5),
    };
}

/// Poll the task-status endpoint until `extract` produces a value.
///
/// Per attempt: sleep `policy.interval`, then query with `{task_id}`. A
/// nonzero, non-pending status code stops polling with
/// [`Error::TaskFailed`]; an exhausted budget stops with [`Error::Timeout`].
pub async fn poll_until_done<T, F>(
    gateway: &Gateway,
    task_id: &str,
    policy: PollPolicy,
    extract: F,
) -> Result<T>
where
    F: Fn(&Value) -> Option<T>,
{
    for attempt in 1..=policy.max_attempts {
        tokio::time::sleep(policy.interval).await;

        let status = gateway
            .post(QUERY_TASK_ENDPOINT, json!({ "task_id": task_id }))
            .await?;

        if let Some(value) = extract(&status) {
            tracing::debug!(task_id, attempt, "task completed");
            return Ok(value);
        }

        let envelope = Envelope::from_task_response(&status);
        if envelope.is_failure() {
            return Err(Error::TaskFailed(envelope.message_or("Task failed")));
        }
        tracing::trace!(task_id, attempt, "task still pending");
    }

    Err(Error::Timeout)
}
