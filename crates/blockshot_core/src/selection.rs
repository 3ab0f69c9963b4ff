use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::RunError;

/// Which resources a run targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    All,
    Ids,
}

impl FromStr for RunMode {
    type Err = RunError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(RunMode::All),
            "ids" => Ok(RunMode::Ids),
            other => Err(RunError::Validation(format!(
                "unknown mode '{other}', expected 'all' or 'ids'"
            ))),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::All => write!(f, "all"),
            RunMode::Ids => write!(f, "ids"),
        }
    }
}

/// Filter handed to the resource store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceFilter {
    /// Every non-deleted resource.
    All,
    /// Only these ids; ascending and unique.
    Ids(Vec<u64>),
}

/// Parse a comma-separated id list, keeping positive integers only.
/// The result is ascending with duplicates collapsed.
pub fn parse_resource_ids(csv: &str) -> Vec<u64> {
    csv.split(',')
        .filter_map(|part| part.trim().parse::<u64>().ok())
        .filter(|id| *id > 0)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

impl ResourceFilter {
    pub fn from_request(mode: RunMode, resource_ids_csv: &str) -> Result<Self, RunError> {
        match mode {
            RunMode::All => Ok(ResourceFilter::All),
            RunMode::Ids => {
                let ids = parse_resource_ids(resource_ids_csv);
                if ids.is_empty() {
                    return Err(RunError::Validation(
                        "resource_ids must contain at least one positive integer".into(),
                    ));
                }
                Ok(ResourceFilter::Ids(ids))
            }
        }
    }

    pub fn requested_ids(&self) -> &[u64] {
        match self {
            ResourceFilter::All => &[],
            ResourceFilter::Ids(ids) => ids,
        }
    }
}
