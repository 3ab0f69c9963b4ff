use std::path::PathBuf;

use blockshot_logging::LogDestination;
use clap::{ArgAction, Parser};
use log::LevelFilter;

/// Extract text blocks from rendered resources and send them to an
/// HTML-to-image converter.
#[derive(Debug, Parser)]
#[command(name = "blockshot", version)]
pub struct Args {
    /// RON file with the run configuration.
    #[arg(short, long, env = "BLOCKSHOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding one `<id>.html` file per resource.
    #[arg(short, long, default_value = ".")]
    pub resources: PathBuf,

    /// Which resources to process: `all` or `ids`.
    #[arg(short, long, default_value = "all")]
    pub mode: String,

    /// Comma-separated resource ids, used with `--mode ids`.
    #[arg(long, default_value = "")]
    pub ids: String,

    /// Comma-separated classes to skip; falls back to the configured default.
    #[arg(long, default_value = "")]
    pub skip_classes: String,

    /// Write the JSON report to this file instead of stdout.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Also write logs to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Keep logs off the terminal. With `--log-file` they still go to the file.
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// `None` when logging is switched off entirely.
    pub fn log_destination(&self) -> Option<LogDestination<'_>> {
        match (self.log_file.as_deref(), self.quiet) {
            (Some(path), true) => Some(LogDestination::File(path)),
            (Some(path), false) => Some(LogDestination::Both(path)),
            (None, true) => None,
            (None, false) => Some(LogDestination::Terminal),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
