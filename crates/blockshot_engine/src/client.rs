use std::fmt;
use std::time::Duration;

use blockshot_core::{Batch, BatchFailure, BatchResult};
use blockshot_logging::{blockshot_debug, blockshot_warn};
use serde_json::Value;

use crate::config::{redact, DEFAULT_RENDER_ENGINE};

/// Diagnostic used when the converter gave no usable message.
pub const GENERIC_CONVERTER_ERROR: &str = "converter returned error";

#[derive(Clone)]
pub struct ConverterSettings {
    pub endpoint: String,
    pub api_key: String,
    pub css_url: Option<String>,
    pub render_engine: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
}

impl ConverterSettings {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            css_url: None,
            render_engine: DEFAULT_RENDER_ENGINE.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            redirect_limit: 3,
        }
    }
}

impl fmt::Debug for ConverterSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterSettings")
            .field("endpoint", &self.endpoint)
            .field("api_key", &redact(&self.api_key))
            .field("css_url", &self.css_url)
            .field("render_engine", &self.render_engine)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("redirect_limit", &self.redirect_limit)
            .finish()
    }
}

/// One request per batch. Implementations report every failure inside the
/// returned [`BatchResult`].
#[async_trait::async_trait]
pub trait ConverterClient: Send + Sync {
    /// `index` is 1-based, `total` is the number of batches in the run.
    async fn send(&self, batch: &Batch, index: usize, total: usize) -> BatchResult;
}

#[derive(Debug, Clone)]
pub struct ReqwestConverterClient {
    settings: ConverterSettings,
}

impl ReqwestConverterClient {
    pub fn new(settings: ConverterSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(
                self.settings.redirect_limit,
            ))
            .build()
    }

    fn form_fields<'a>(&'a self, batch: &'a Batch) -> Vec<(&'static str, &'a str)> {
        let mut fields = Vec::with_capacity(batch.len() + 3);
        fields.push(("api_key", self.settings.api_key.as_str()));
        for fragment in &batch.fragments {
            fields.push(("html_blocks[]", fragment.as_str()));
        }
        if let Some(css_url) = self.settings.css_url.as_deref() {
            fields.push(("css_url", css_url));
        }
        let engine = match self.settings.render_engine.trim() {
            "" => DEFAULT_RENDER_ENGINE,
            engine => engine,
        };
        fields.push(("render_engine", engine));
        fields
    }
}

#[async_trait::async_trait]
impl ConverterClient for ReqwestConverterClient {
    async fn send(&self, batch: &Batch, index: usize, total: usize) -> BatchResult {
        let blocks = batch.len();
        blockshot_debug!(
            "Sending batch {}/{}: {} blocks, ~{} bytes",
            index,
            total,
            blocks,
            batch.size
        );

        let client = match self.build_client() {
            Ok(client) => client,
            Err(err) => {
                return BatchResult::failed(index, 0, blocks, BatchFailure::Transport, err.to_string())
            }
        };

        let response = match client
            .post(self.settings.endpoint.as_str())
            .form(&self.form_fields(batch))
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                let message = describe_transport_error(&err);
                blockshot_warn!("Batch {}/{} transport failure: {}", index, total, message);
                return BatchResult::failed(index, 0, blocks, BatchFailure::Transport, message);
            }
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                return BatchResult::failed(
                    index,
                    status,
                    blocks,
                    BatchFailure::Transport,
                    describe_transport_error(&err),
                )
            }
        };

        classify_response(index, status, blocks, &body)
    }
}

fn classify_response(index: usize, status: u16, blocks: usize, body: &str) -> BatchResult {
    let status_ok = (200..300).contains(&status);
    match serde_json::from_str::<Value>(body) {
        Ok(json) if status_ok && is_truthy(json.get("success")) => {
            let output_file = json
                .pointer("/data/rendering/output_file")
                .and_then(Value::as_str)
                .map(str::to_string);
            BatchResult::succeeded(index, status, blocks, output_file)
        }
        Ok(json) => {
            let failure = if status_ok {
                BatchFailure::Rejected
            } else {
                BatchFailure::HttpStatus
            };
            let message =
                converter_message(&json).unwrap_or_else(|| GENERIC_CONVERTER_ERROR.to_string());
            BatchResult::failed(index, status, blocks, failure, message)
        }
        Err(_) => {
            let failure = if status_ok {
                BatchFailure::InvalidBody
            } else {
                BatchFailure::HttpStatus
            };
            BatchResult::failed(index, status, blocks, failure, GENERIC_CONVERTER_ERROR)
        }
    }
}

/// The converter's own `error` or `message` field, first non-blank wins.
fn converter_message(json: &Value) -> Option<String> {
    ["error", "message"].iter().find_map(|key| match json.get(*key)? {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Object(inner) => inner
            .get("message")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string),
        _ => None,
    })
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(text)) => !text.is_empty() && text != "0",
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(_)) => true,
    }
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        return format!("request timed out: {err}");
    }
    if err.is_redirect() {
        return format!("redirect limit exceeded: {err}");
    }
    if err.is_connect() {
        return format!("connection failed: {err}");
    }
    err.to_string()
}
