//! Blockshot engine: extraction, resource access, converter dispatch and the
//! run orchestrator.
mod client;
mod config;
mod decode;
mod extract;
mod orchestrator;
mod persist;
mod store;

pub use client::{
    ConverterClient, ConverterSettings, ReqwestConverterClient, GENERIC_CONVERTER_ERROR,
};
pub use config::{
    RunConfig, DEFAULT_RENDER_ENGINE, MIN_BATCH_MAX_BLOCKS, MIN_BATCH_MAX_BYTES,
    MIN_REQUEST_TIMEOUT_SECS,
};
pub use decode::{decode_html, DecodeError, DecodedHtml};
pub use extract::{BlockExtractor, LeafBlockExtractor};
pub use orchestrator::Orchestrator;
pub use persist::{ensure_output_dir, PersistError, ReportWriter};
pub use store::{FsResourceStore, ResourceStore, StoreError};
pub use tokio_util::sync::CancellationToken;
