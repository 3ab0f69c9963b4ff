use thiserror::Error;

/// Conditions that stop a run before any batch is sent.
///
/// Per-resource and per-batch failures are not errors here; they are recorded
/// in the report and the run carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("no resources found for mode '{mode}'")]
    NotFound { mode: String },
    #[error("resource store error: {0}")]
    Store(String),
    #[error("no renderable blocks found in {rendered} rendered resources")]
    ExtractionEmpty { rendered: usize },
}

impl RunError {
    pub fn http_code(&self) -> u16 {
        match self {
            RunError::Validation(_) => 400,
            RunError::NotFound { .. } => 404,
            RunError::ExtractionEmpty { .. } => 422,
            RunError::Config(_) | RunError::Store(_) => 500,
        }
    }

    /// Stable snake_case tag for the report payload.
    pub fn kind(&self) -> &'static str {
        match self {
            RunError::Config(_) => "config",
            RunError::Validation(_) => "validation",
            RunError::NotFound { .. } => "not_found",
            RunError::Store(_) => "store",
            RunError::ExtractionEmpty { .. } => "extraction_empty",
        }
    }
}
