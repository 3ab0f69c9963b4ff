//! Blockshot core: pure data model and the dedupe/pack/report algorithms.
mod batch;
mod dedupe;
mod error;
mod fragment;
mod report;
mod selection;
mod skip;

pub use batch::{pack, Batch, FRAGMENT_OVERHEAD};
pub use dedupe::{content_hash, dedupe};
pub use error::RunError;
pub use fragment::{ResourceRef, TextFragment};
pub use report::{
    BatchFailure, BatchResult, ReportData, ResourceErrorEntry, ResourceStat, RunReport,
    HTTP_OK, HTTP_PARTIAL,
};
pub use selection::{parse_resource_ids, ResourceFilter, RunMode};
pub use skip::SkipClassSet;
