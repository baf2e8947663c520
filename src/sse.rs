//! 流式聚合:将 `data: ` 前缀的事件流按到达顺序拼接为一个字符串。
//!
//! Stream aggregation.
//!
//! The story/chapter/prompt endpoints answer with a chunked event stream of
//! newline-separated lines. Lines carrying the `data: ` prefix are parsed as
//! JSON and their `data.content` fragment, when present and non-empty, is
//! appended to an accumulator in arrival order. Malformed lines are skipped
//! silently; they must never abort the stream. The stream may legitimately
//! aggregate to an empty string.
//!
//! Chunk boundaries do not align with line boundaries, so incoming bytes are
//! carried in a [`LineBuffer`] until a full line is available.

use crate::{Error, Result};
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

const DATA_PREFIX: &str = "data: ";

/// Reassembles newline-delimited lines from arbitrarily split byte chunks.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    /// Feed one chunk; returns every line completed by it.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            lines.push(String::from_utf8_lossy(&line[..line.len() - 1]).into_owned());
        }
        lines
    }

    /// Flush the trailing partial line, if any, at stream end.
    pub(crate) fn finish(self) -> Option<String> {
        if self.buf.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.buf).into_owned())
        }
    }
}

/// Extract the `data.content` fragment from one stream line.
///
/// Returns `None` for non-`data: ` lines, malformed JSON, and empty content.
pub(crate) fn content_of(line: &str) -> Option<String> {
    let payload = line.trim_end_matches('\r').strip_prefix(DATA_PREFIX)?;
    let value: Value = serde_json::from_str(payload).ok()?;
    let content = value.get("data")?.get("content")?.as_str()?;
    if content.is_empty() {
        None
    } else {
        Some(content.to_owned())
    }
}

/// POST `payload` to `url` and aggregate the event stream into one string.
pub(crate) async fn collect(
    http: &reqwest::Client,
    url: &str,
    api_key: Option<&str>,
    payload: &Value,
) -> Result<String> {
    let mut req = http
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .json(payload);
    if let Some(key) = api_key {
        req = req.header("x-api-key", key);
    }

    let resp = req
        .send()
        .await
        .and_then(|resp| resp.error_for_status())
        .map_err(|e| Error::Stream(e.to_string()))?;

    let mut stream = resp.bytes_stream();
    let mut lines = LineBuffer::default();
    let mut aggregated = String::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::Stream(e.to_string()))?;
        for line in lines.push(&chunk) {
            if let Some(content) = content_of(&line) {
                aggregated.push_str(&content);
            }
        }
    }
    if let Some(last) = lines.finish() {
        if let Some(content) = content_of(&last) {
            aggregated.push_str(&content);
        }
    }

    Ok(aggregated)
}
