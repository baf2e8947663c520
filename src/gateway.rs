//! HTTP 网关客户端:统一注入鉴权头,解码后端信封并分类错误。
//!
//! HTTP gateway client for the unified backend API.
//!
//! One [`Gateway`] wraps one `reqwest::Client` (stateless, shared across all
//! invocations). Every call injects the auth headers, encodes the body as JSON
//! or multipart depending on whether file fields are present, and decodes the
//! `base_resp` envelope into either the raw body or a classified error:
//!
//! - no `status_code` field → the body is passed through unchanged;
//! - `0` → success, body returned;
//! - `1004` → [`Error::Auth`];
//! - `2038` → [`Error::VerificationRequired`] with the upstream trace id;
//! - any other value → [`Error::Request`] with code, message, and trace id.
//!
//! Transport failures and unparseable bodies are wrapped into
//! [`Error::Request`] with code 500; already-classified errors propagate
//! unchanged.

use crate::config::GatewayConfig;
use crate::envelope::{self, Envelope};
use crate::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;

const TRACE_ID_HEADER: &str = "trace-id";
const API_KEY_HEADER: &str = "x-api-key";

/// A file field for a multipart request.
#[derive(Debug, Clone)]
pub struct FileField {
    /// Multipart field name.
    pub field: String,
    /// File name reported to the backend.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Per-request options: exactly one body encoding, plus extra headers and
/// query parameters.
#[derive(Debug, Default)]
pub struct RequestOptions {
    /// JSON request body. Ignored when `files` is present.
    pub json: Option<Value>,
    /// File fields; presence switches the body to multipart encoding.
    pub files: Option<Vec<FileField>>,
    /// Extra headers. Auth headers injected by the gateway win on conflict.
    pub headers: Vec<(String, String)>,
    /// Query string parameters.
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn json(body: Value) -> Self {
        Self {
            json: Some(body),
            ..Default::default()
        }
    }
}

/// Client for the single upstream backend host.
pub struct Gateway {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl Gateway {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(Error::transport)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub(crate) fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.api_host, endpoint)
    }

    pub(crate) fn api_key(&self) -> Option<&str> {
        self.config.api_key.as_deref()
    }

    /// Perform one backend call and decode the response envelope.
    ///
    /// Returns the raw JSON body on success or envelope absence; classified
    /// errors otherwise.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Value> {
        let mut req = self.http.request(method, self.url(endpoint));

        if !options.query.is_empty() {
            req = req.query(&options.query);
        }

        // Caller headers first; the injected auth and accept headers use
        // insert semantics, so they replace caller-supplied values of the
        // same name instead of riding alongside them.
        let mut headers = HeaderMap::new();
        for (name, value) in &options.headers {
            let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
                continue;
            };
            let Ok(value) = HeaderValue::from_str(value) else {
                continue;
            };
            headers.insert(name, value);
        }
        if let Some(key) = self.api_key() {
            if let Ok(value) = HeaderValue::from_str(key) {
                headers.insert(AUTHORIZATION, value.clone());
                headers.insert(HeaderName::from_static(API_KEY_HEADER), value);
            }
        }
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(files) = options.files {
            // The multipart encoder owns the content type (boundary included).
            headers.remove(CONTENT_TYPE);
            let mut form = reqwest::multipart::Form::new();
            for file in files {
                form = form.part(
                    file.field,
                    reqwest::multipart::Part::bytes(file.bytes).file_name(file.file_name),
                );
            }
            req = req.multipart(form);
        } else {
            headers
                .entry(CONTENT_TYPE)
                .or_insert(HeaderValue::from_static("application/json"));
            if let Some(body) = &options.json {
                req = req.json(body);
            }
        }
        req = req.headers(headers);

        let resp = req.send().await.map_err(Error::transport)?;
        let trace_id = resp
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let body: Value = resp.json().await.map_err(Error::transport)?;
        let status = Envelope::from_base_resp(&body);
        match status.code {
            // Non-enveloped response: pass the raw body through unchanged.
            None => Ok(body),
            Some(envelope::SUCCESS) => Ok(body),
            Some(envelope::AUTH_INVALID) => Err(Error::Auth {
                message: status.message_or("invalid credential"),
                trace_id,
            }),
            Some(envelope::VERIFICATION_REQUIRED) => {
                Err(Error::VerificationRequired { trace_id })
            }
            Some(code) => Err(Error::Request {
                code,
                message: status.message_or("unknown error"),
                trace_id,
            }),
        }
    }

    /// Generic GET passthrough. Errors are re-raised to the caller, never
    /// converted to a tool result.
    pub async fn get(&self, endpoint: &str, query: Vec<(String, String)>) -> Result<Value> {
        self.request(
            Method::GET,
            endpoint,
            RequestOptions {
                query,
                ..Default::default()
            },
        )
        .await
    }

    /// Generic POST passthrough with a JSON body.
    pub async fn post(&self, endpoint: &str, body: Value) -> Result<Value> {
        self.request(Method::POST, endpoint, RequestOptions::json(body))
            .await
    }

    /// Open a streaming POST against `endpoint` and aggregate the
    /// `data: `-prefixed event stream into one string.
    pub async fn collect_sse(&self, endpoint: &str, payload: &Value) -> Result<String> {
        crate::sse::collect(&self.http, &self.url(endpoint), self.api_key(), payload).await
    }
}
