use std::fs;
use std::path::Path;

use anyhow::Context;
use blockshot_engine::RunConfig;
use blockshot_logging::blockshot_warn;

/// Load the run configuration from a RON file. Without a file the defaults
/// are used, which leaves the converter endpoint unset.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<RunConfig> {
    let Some(path) = path else {
        blockshot_warn!("No config file given; using defaults");
        return Ok(RunConfig::default());
    };

    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: RunConfig = ron::from_str(&content)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    Ok(config)
}
