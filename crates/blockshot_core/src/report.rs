use serde::Serialize;

use crate::{RunError, RunMode};

pub const HTTP_OK: u16 = 200;
pub const HTTP_PARTIAL: u16 = 207;

/// Why a batch failed. Transport failures never reached the converter; the
/// other kinds carry the converter's HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchFailure {
    Transport,
    HttpStatus,
    InvalidBody,
    Rejected,
}

/// Outcome of one converter call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    /// 1-based position in the run's batch sequence.
    pub batch: usize,
    pub success: bool,
    /// 0 when no response was received.
    pub http_code: u16,
    pub blocks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<BatchFailure>,
}

impl BatchResult {
    pub fn succeeded(
        batch: usize,
        http_code: u16,
        blocks: usize,
        output_file: Option<String>,
    ) -> Self {
        Self {
            batch,
            success: true,
            http_code,
            blocks,
            output_file,
            error: None,
            failure: None,
        }
    }

    pub fn failed(
        batch: usize,
        http_code: u16,
        blocks: usize,
        failure: BatchFailure,
        error: impl Into<String>,
    ) -> Self {
        Self {
            batch,
            success: false,
            http_code,
            blocks,
            output_file: None,
            error: Some(error.into()),
            failure: Some(failure),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceStat {
    pub id: u64,
    pub title: String,
    pub blocks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceErrorEntry {
    pub id: u64,
    pub title: String,
    pub error: String,
}

/// Aggregate payload of a run. Fields that a stage never reached keep their
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ReportData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<RunMode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requested_ids: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    pub resources_scanned: usize,
    /// Fragments extracted before deduplication.
    pub blocks_extracted: usize,
    /// Unique fragments after deduplication.
    pub blocks_total: usize,
    pub batch_max_bytes: usize,
    pub batch_max_blocks: usize,
    pub batches_total: usize,
    pub batches_success: usize,
    pub batches_failed: usize,
    pub batches_skipped: usize,
    pub cancelled: bool,
    pub resources: Vec<ResourceStat>,
    pub resource_errors: Vec<ResourceErrorEntry>,
    pub batches: Vec<BatchResult>,
}

/// The single externally visible output of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub success: bool,
    pub http_code: u16,
    pub message: String,
    pub data: ReportData,
}

impl RunReport {
    /// Report for a run that stopped before dispatching anything.
    pub fn aborted(error: &RunError, mut data: ReportData) -> Self {
        data.error_kind = Some(error.kind().to_string());
        Self {
            success: false,
            http_code: error.http_code(),
            message: error.to_string(),
            data,
        }
    }

    /// Report for a run that reached dispatch. Batch counters are derived
    /// from `data.batches` and `data.batches_total`.
    pub fn dispatched(mut data: ReportData) -> Self {
        data.batches_success = data.batches.iter().filter(|b| b.success).count();
        data.batches_failed = data.batches.len() - data.batches_success;
        data.batches_skipped = data.batches_total.saturating_sub(data.batches.len());

        let success =
            data.batches_success > 0 && data.batches_failed == 0 && data.batches_skipped == 0;
        let http_code = if success { HTTP_OK } else { HTTP_PARTIAL };

        let mut message = format!(
            "Scanned {} resources: {} unique blocks in {} batches ({} succeeded, {} failed).",
            data.resources_scanned,
            data.blocks_total,
            data.batches_total,
            data.batches_success,
            data.batches_failed
        );
        if data.cancelled {
            message.push_str(&format!(
                " Run cancelled, {} batches not sent.",
                data.batches_skipped
            ));
        }

        Self {
            success,
            http_code,
            message,
            data,
        }
    }
}
