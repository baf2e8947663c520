//! 工具调度核心:校验、载荷构建、完成策略选择与结果归一化。
//!
//! Tool dispatch.
//!
//! Per invocation, strictly in order: look up the tool and its endpoint,
//! build the payload, drive the call to completion (stream aggregation, or
//! one immediate call followed by polling when the response carries a task
//! handle), and normalize whatever came back into one text result.
//!
//! [`Dispatcher::dispatch`] never fails outward: every error is caught at
//! this boundary and converted into an error outcome carrying a
//! human-readable message.

use crate::catalog::{self, Strategy, ToolArgs};
use crate::gateway::Gateway;
use crate::poller::{poll_until_done, PollPolicy};
use crate::{Error, Result};
use serde_json::Value;
use std::sync::Arc;

/// Uniform output of one tool invocation, regardless of completion strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    pub text: String,
    pub is_error: bool,
}

/// Polling budgets carried by the dispatcher. Defaults match production;
/// tests substitute short intervals.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub standard: PollPolicy,
    pub extended: PollPolicy,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            standard: PollPolicy::STANDARD,
            extended: PollPolicy::EXTENDED,
        }
    }
}

/// What a task response resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TaskOutput {
    /// Populated `data.content`.
    Text(String),
    /// Populated `data.img_data` (or top-level `img_data`).
    Images(Value),
}

/// The orchestration core: one dispatcher per process, shared gateway.
pub struct Dispatcher {
    gateway: Arc<Gateway>,
    polls: PollSettings,
}

impl Dispatcher {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self::with_poll_settings(gateway, PollSettings::default())
    }

    pub fn with_poll_settings(gateway: Arc<Gateway>, polls: PollSettings) -> Self {
        Self { gateway, polls }
    }

    /// Run one tool invocation to completion. All failures become an error
    /// outcome; nothing propagates to the transport layer.
    pub async fn dispatch(&self, name: &str, args: &ToolArgs) -> ToolOutcome {
        tracing::debug!(tool = name, "dispatching tool call");
        match self.run(name, args).await {
            Ok(text) => ToolOutcome {
                text,
                is_error: false,
            },
            Err(err) => {
                tracing::warn!(tool = name, error = %err, "tool invocation failed");
                ToolOutcome {
                    text: format!("invocation failed: {err}"),
                    is_error: true,
                }
            }
        }
    }

    async fn run(&self, name: &str, args: &ToolArgs) -> Result<String> {
        let spec =
            catalog::find(name).ok_or_else(|| Error::UnknownTool(name.to_owned()))?;
        let endpoint =
            catalog::endpoint(name).ok_or_else(|| Error::Configuration(name.to_owned()))?;
        let payload = (spec.build_payload)(args)?;

        match spec.strategy {
            Strategy::Stream => self.gateway.collect_sse(endpoint, &payload).await,
            Strategy::Task { poll } => {
                let resp = self.gateway.post(endpoint, payload).await?;

                let output = match extract_task_output(&resp) {
                    Some(output) => Some(output),
                    None => match task_id_of(&resp) {
                        Some(task_id) => Some(
                            poll_until_done(
                                &self.gateway,
                                task_id,
                                self.policy(poll),
                                extract_task_output,
                            )
                            .await?,
                        ),
                        None => None,
                    },
                };

                match output {
                    Some(TaskOutput::Text(text)) => Ok(text),
                    Some(TaskOutput::Images(img_data)) => {
                        let urls = flatten_image_urls(&img_data);
                        if urls.is_empty() {
                            // No usable URL in the image list: fall back to
                            // the raw payload.
                            Ok(serde_json::to_string(&resp)?)
                        } else {
                            Ok(urls)
                        }
                    }
                    None => Ok(serde_json::to_string(&resp)?),
                }
            }
        }
    }

    fn policy(&self, kind: catalog::PollKind) -> PollPolicy {
        match kind {
            catalog::PollKind::Standard => self.polls.standard,
            catalog::PollKind::Extended => self.polls.extended,
        }
    }
}

fn task_id_of(body: &Value) -> Option<&str> {
    body.pointer("/data/task_id").and_then(Value::as_str)
}

/// Success-extractor shared by the immediate and polled paths: populated
/// content wins, then image data (nested under `data` or at the top level).
fn extract_task_output(body: &Value) -> Option<TaskOutput> {
    let data = body.get("data");

    if let Some(content) = data
        .and_then(|d| d.get("content"))
        .and_then(Value::as_str)
    {
        if !content.is_empty() {
            return Some(TaskOutput::Text(content.to_owned()));
        }
    }

    let img_data = data
        .and_then(|d| d.get("img_data"))
        .or_else(|| body.get("img_data"))?;
    if img_data.as_array().is_some_and(|items| !items.is_empty()) {
        return Some(TaskOutput::Images(img_data.clone()));
    }
    None
}

/// Flatten an image list to newline-joined URLs.
///
/// Per image, the `webp` URL is preferred over `url`; a bare string entry is
/// used as-is.
fn flatten_image_urls(img_data: &Value) -> String {
    let mut urls = Vec::new();
    for item in img_data.as_array().into_iter().flatten() {
        for image in item
            .get("images")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
        {
            // Empty fields fall through to the next candidate.
            let url = image
                .get("webp")
                .and_then(Value::as_str)
                .filter(|u| !u.is_empty())
                .or_else(|| {
                    image
                        .get("url")
                        .and_then(Value::as_str)
                        .filter(|u| !u.is_empty())
                })
                .or_else(|| image.as_str());
            if let Some(url) = url.filter(|u| !u.is_empty()) {
                urls.push(url.to_owned());
            }
        }
    }
    urls.join("\n")
}
