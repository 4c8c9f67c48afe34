use crate::types::IncidentRecord;
use chrono::{DateTime, Utc};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    Success,
    Error,
    PersonNotFound,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Success => "SUCCESS",
            AuditStatus::Error => "ERROR",
            AuditStatus::PersonNotFound => "PERSON_NOT_FOUND",
        }
    }
}

/// One per-record outcome. Exactly one entry exists for every record that was
/// processed or explicitly skipped.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub row_number: usize,
    pub document_type: String,
    pub document_number: String,
    pub category: String,
    pub subcategory: String,
    pub description: String,
    pub status: AuditStatus,
    pub error_message: Option<String>,
    pub novelty_code: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Immutable snapshot of the audit trail after the batch ends or halts.
#[derive(Debug, Clone)]
pub struct AuditSummary {
    pub total_records: usize,
    pub successful: usize,
    pub failed: usize,
    pub person_not_found: usize,
    pub records: Vec<AuditEntry>,
}

impl AuditSummary {
    pub fn success_rate(&self) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            self.successful as f64 / self.total_records as f64
        }
    }
}

/// Append-only, order-preserving accumulator of per-record outcomes.
#[derive(Debug)]
pub struct AuditTrail {
    total_records: usize,
    successful: usize,
    failed: usize,
    person_not_found: usize,
    entries: Vec<AuditEntry>,
}

impl AuditTrail {
    pub fn new(total_records: usize) -> Self {
        Self {
            total_records,
            successful: 0,
            failed: 0,
            person_not_found: 0,
            entries: Vec::with_capacity(total_records),
        }
    }

    fn push(
        &mut self,
        record: &IncidentRecord,
        status: AuditStatus,
        error_message: Option<String>,
        novelty_code: Option<String>,
    ) {
        self.entries.push(AuditEntry {
            row_number: record.row_index,
            document_type: record.document_type.clone(),
            document_number: record.document_number.clone(),
            category: record.category.clone(),
            subcategory: record.subcategory.clone(),
            description: record.description.clone(),
            status,
            error_message,
            novelty_code,
            timestamp: Utc::now(),
        });
    }

    pub fn record_success(&mut self, record: &IncidentRecord, novelty_code: String) {
        self.push(record, AuditStatus::Success, None, Some(novelty_code));
        self.successful += 1;
    }

    pub fn record_error(&mut self, record: &IncidentRecord, message: impl Into<String>) {
        self.push(record, AuditStatus::Error, Some(message.into()), None);
        self.failed += 1;
    }

    pub fn record_person_not_found(&mut self, record: &IncidentRecord) {
        self.push(
            record,
            AuditStatus::PersonNotFound,
            Some("person not found in the target system".to_string()),
            None,
        );
        self.person_not_found += 1;
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn summary(&self) -> AuditSummary {
        AuditSummary {
            total_records: self.total_records,
            successful: self.successful,
            failed: self.failed,
            person_not_found: self.person_not_found,
            records: self.entries.clone(),
        }
    }

    pub fn log_summary(&self) {
        let summary = self.summary();
        info!(
            total = summary.total_records,
            successful = summary.successful,
            failed = summary.failed,
            person_not_found = summary.person_not_found,
            success_rate = %format!("{:.2}%", summary.success_rate() * 100.0),
            "batch finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(row: usize) -> IncidentRecord {
        IncidentRecord {
            row_index: row,
            document_type: "CÉDULA".to_string(),
            document_number: format!("010203040{}", row),
            category: "SEGURIDAD".to_string(),
            subcategory: "ROBO".to_string(),
            description: "test".to_string(),
            color_name: String::new(),
            novelty_date: String::new(),
            novelty_time: String::new(),
        }
    }

    #[test]
    fn counters_match_entries() {
        let mut trail = AuditTrail::new(3);
        trail.record_success(&record(1), "555".to_string());
        trail.record_person_not_found(&record(2));
        trail.record_error(&record(3), "boom");

        let summary = trail.summary();
        assert_eq!(summary.records.len(), 3);
        assert_eq!(
            summary.successful + summary.failed + summary.person_not_found,
            3
        );
        assert_eq!(summary.records[0].status, AuditStatus::Success);
        assert_eq!(summary.records[0].novelty_code.as_deref(), Some("555"));
        assert_eq!(summary.records[1].status, AuditStatus::PersonNotFound);
        assert_eq!(summary.records[2].error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn entries_preserve_input_order() {
        let mut trail = AuditTrail::new(2);
        trail.record_error(&record(1), "first");
        trail.record_success(&record(2), "556".to_string());
        let rows: Vec<usize> = trail.entries().iter().map(|e| e.row_number).collect();
        assert_eq!(rows, vec![1, 2]);
    }

    #[test]
    fn success_rate_guards_division_by_zero() {
        let trail = AuditTrail::new(0);
        assert_eq!(trail.summary().success_rate(), 0.0);

        let mut trail = AuditTrail::new(2);
        trail.record_success(&record(1), "1".to_string());
        trail.record_error(&record(2), "x");
        assert!((trail.summary().success_rate() - 0.5).abs() < f64::EPSILON);
    }
}
