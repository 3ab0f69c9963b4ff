use std::fmt;
use std::time::Duration;

use blockshot_core::{RunError, SkipClassSet};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::client::ConverterSettings;

pub const MIN_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const MIN_BATCH_MAX_BYTES: usize = 100_000;
pub const MIN_BATCH_MAX_BLOCKS: usize = 1;
pub const DEFAULT_RENDER_ENGINE: &str = "auto";

const CONNECT_TIMEOUT_SECS: u64 = 10;
const REDIRECT_LIMIT: usize = 3;

/// Settings for one run. Numeric limits are clamped up to their floors by the
/// accessor methods; the raw fields keep whatever was configured.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub convert_url: String,
    pub convert_api_key: String,
    pub css_url: Option<String>,
    pub render_engine: String,
    /// Seconds.
    pub request_timeout: u64,
    pub batch_max_bytes: usize,
    pub batch_max_blocks: usize,
    /// Comma-separated; used when a run does not name its own skip classes.
    pub default_skip_classes: String,
    /// Converter calls in flight at once. 1 sends batches one after another.
    pub dispatch_concurrency: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            convert_url: String::new(),
            convert_api_key: String::new(),
            css_url: None,
            render_engine: DEFAULT_RENDER_ENGINE.to_string(),
            request_timeout: 60,
            batch_max_bytes: 2_000_000,
            batch_max_blocks: 50,
            default_skip_classes: "no-render".to_string(),
            dispatch_concurrency: 1,
        }
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("convert_url", &self.convert_url)
            .field("convert_api_key", &redact(&self.convert_api_key))
            .field("css_url", &self.css_url)
            .field("render_engine", &self.render_engine)
            .field("request_timeout", &self.request_timeout)
            .field("batch_max_bytes", &self.batch_max_bytes)
            .field("batch_max_blocks", &self.batch_max_blocks)
            .field("default_skip_classes", &self.default_skip_classes)
            .field("dispatch_concurrency", &self.dispatch_concurrency)
            .finish()
    }
}

impl RunConfig {
    /// Checks the settings a run cannot start without.
    pub fn validate(&self) -> Result<(), RunError> {
        let url = self.convert_url.trim();
        if url.is_empty() {
            return Err(RunError::Config("convert_url is not set".into()));
        }
        if self.convert_api_key.trim().is_empty() {
            return Err(RunError::Config("convert_api_key is not set".into()));
        }
        let parsed = Url::parse(url)
            .map_err(|err| RunError::Config(format!("convert_url '{url}' is invalid: {err}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RunError::Config(format!(
                "convert_url must be http or https, got '{}'",
                parsed.scheme()
            )));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout.max(MIN_REQUEST_TIMEOUT_SECS))
    }

    pub fn batch_max_bytes(&self) -> usize {
        self.batch_max_bytes.max(MIN_BATCH_MAX_BYTES)
    }

    pub fn batch_max_blocks(&self) -> usize {
        self.batch_max_blocks.max(MIN_BATCH_MAX_BLOCKS)
    }

    pub fn dispatch_concurrency(&self) -> usize {
        self.dispatch_concurrency.max(1)
    }

    pub fn render_engine(&self) -> &str {
        match self.render_engine.trim() {
            "" => DEFAULT_RENDER_ENGINE,
            engine => engine,
        }
    }

    pub fn css_url(&self) -> Option<&str> {
        self.css_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// The run's own list when it names one, the configured default otherwise.
    pub fn skip_classes(&self, requested_csv: &str) -> SkipClassSet {
        if requested_csv.trim().is_empty() {
            SkipClassSet::parse(&self.default_skip_classes)
        } else {
            SkipClassSet::parse(requested_csv)
        }
    }

    pub fn converter_settings(&self) -> ConverterSettings {
        let request_timeout = self.request_timeout();
        ConverterSettings {
            endpoint: self.convert_url.trim().to_string(),
            api_key: self.convert_api_key.trim().to_string(),
            css_url: self.css_url().map(str::to_string),
            render_engine: self.render_engine().to_string(),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS).min(request_timeout),
            request_timeout,
            redirect_limit: REDIRECT_LIMIT,
        }
    }
}

pub(crate) fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}
