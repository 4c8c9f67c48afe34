//! Output collaborator: persists the audit summary as a two-part tabular
//! report (per-record detail rows plus aggregate metrics). The pipeline core
//! never touches the filesystem; only this module and the CLI do.

use crate::audit::AuditSummary;
use crate::error::Result;
use chrono::Local;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct ReportPaths {
    pub detail: PathBuf,
    pub summary: PathBuf,
}

const DETAIL_HEADER: &str =
    "row,documentType,documentNumber,category,subcategory,description,status,noveltyCode,errorMessage,processedAt";

/// Writes `audit-report-<ts>.csv` (one row per audit entry, in input order)
/// and `audit-summary-<ts>.csv` (aggregate metrics) under `dir`.
pub fn write_report(summary: &AuditSummary, dir: &Path) -> Result<ReportPaths> {
    fs::create_dir_all(dir)?;
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");

    let detail_path = dir.join(format!("audit-report-{}.csv", timestamp));
    let mut detail = fs::File::create(&detail_path)?;
    writeln!(detail, "{}", DETAIL_HEADER)?;
    for entry in &summary.records {
        writeln!(
            detail,
            "{},{},{},{},{},{},{},{},{},{}",
            entry.row_number,
            csv_field(&entry.document_type),
            csv_field(&entry.document_number),
            csv_field(&entry.category),
            csv_field(&entry.subcategory),
            csv_field(&entry.description),
            entry.status.as_str(),
            csv_field(entry.novelty_code.as_deref().unwrap_or("")),
            csv_field(entry.error_message.as_deref().unwrap_or("")),
            entry.timestamp.format("%Y-%m-%dT%H:%M:%S"),
        )?;
    }

    let summary_path = dir.join(format!("audit-summary-{}.csv", timestamp));
    let mut metrics = fs::File::create(&summary_path)?;
    writeln!(metrics, "metric,value")?;
    writeln!(metrics, "Total records,{}", summary.total_records)?;
    writeln!(metrics, "Successful records,{}", summary.successful)?;
    writeln!(metrics, "Failed records,{}", summary.failed)?;
    writeln!(metrics, "Persons not found,{}", summary.person_not_found)?;
    writeln!(metrics, "Success rate,{:.2}%", summary.success_rate() * 100.0)?;

    info!(detail = %detail_path.display(), summary = %summary_path.display(), "audit report written");
    Ok(ReportPaths {
        detail: detail_path,
        summary: summary_path,
    })
}

fn csv_field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditTrail;
    use crate::types::IncidentRecord;

    fn record(row: usize, description: &str) -> IncidentRecord {
        IncidentRecord {
            row_index: row,
            document_type: "CÉDULA".to_string(),
            document_number: "0102030405".to_string(),
            category: "SEGURIDAD".to_string(),
            subcategory: "ROBO".to_string(),
            description: description.to_string(),
            color_name: String::new(),
            novelty_date: String::new(),
            novelty_time: String::new(),
        }
    }

    #[test]
    fn writes_detail_and_summary_files() {
        let mut trail = AuditTrail::new(2);
        trail.record_success(&record(1, "plain"), "555".to_string());
        trail.record_error(&record(2, "needs, escaping \"here\""), "boom");

        let dir = tempfile::tempdir().unwrap();
        let paths = write_report(&trail.summary(), dir.path()).unwrap();

        let detail = fs::read_to_string(&paths.detail).unwrap();
        let lines: Vec<&str> = detail.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], DETAIL_HEADER);
        assert!(lines[1].contains("SUCCESS"));
        assert!(lines[1].contains("555"));
        assert!(lines[2].contains("\"needs, escaping \"\"here\"\"\""));

        let metrics = fs::read_to_string(&paths.summary).unwrap();
        assert!(metrics.contains("Total records,2"));
        assert!(metrics.contains("Success rate,50.00%"));
    }

    #[test]
    fn csv_escaping_only_quotes_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
