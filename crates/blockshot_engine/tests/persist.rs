use std::fs;

use blockshot_core::{ReportData, RunError, RunReport};
use blockshot_engine::{ensure_output_dir, ReportWriter};
use tempfile::TempDir;

fn sample_report() -> RunReport {
    RunReport::aborted(&RunError::Config("convert_url is not set".into()), ReportData::default())
}

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("reports");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn report_is_written_as_json_and_replaced() {
    let temp = TempDir::new().unwrap();
    let writer = ReportWriter::new(temp.path().join("out"));

    let first = writer.write("report.json", &sample_report()).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&first).unwrap()).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["http_code"], 500);
    assert_eq!(json["data"]["error_kind"], "config");

    let second = writer.write("report.json", &sample_report()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = ReportWriter::new(file_path.clone());
    assert!(writer.write("report.json", &sample_report()).is_err());
    assert!(!file_path.with_file_name("report.json").exists());
}
