mod cli;
mod settings;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use blockshot_core::{RunReport, HTTP_PARTIAL};
use blockshot_engine::{CancellationToken, FsResourceStore, Orchestrator, ReportWriter};
use blockshot_logging::{blockshot_error, blockshot_info, blockshot_warn};
use clap::Parser;

fn main() -> ExitCode {
    let args = cli::Args::parse();
    if let Some(destination) = args.log_destination() {
        blockshot_logging::initialize(destination, args.log_level());
    }

    match run(&args) {
        Ok(report) => exit_code(&report),
        Err(err) => {
            blockshot_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &cli::Args) -> anyhow::Result<RunReport> {
    let config = settings::load_config(args.config.as_deref())?;
    let store = Arc::new(FsResourceStore::new(&args.resources));
    let orchestrator = Orchestrator::new(store, config);

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let cancel = CancellationToken::new();
    let report = runtime.block_on(async {
        let interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                blockshot_warn!("Interrupted; no further batches will be sent");
                interrupt.cancel();
            }
        });
        orchestrator
            .run_with_cancel(&args.mode, &args.ids, &args.skip_classes, &cancel)
            .await
    });

    match args.out.as_deref() {
        Some(path) => {
            let written = write_report(path, &report)?;
            blockshot_info!("Report written to {:?}", written);
        }
        None => {
            let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
            println!("{json}");
        }
    }
    Ok(report)
}

fn write_report(path: &Path, report: &RunReport) -> anyhow::Result<std::path::PathBuf> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("invalid report path {}", path.display()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    let written = ReportWriter::new(dir)
        .write(filename, report)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    Ok(written)
}

fn exit_code(report: &RunReport) -> ExitCode {
    if report.success {
        ExitCode::SUCCESS
    } else if report.http_code == HTTP_PARTIAL {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}
