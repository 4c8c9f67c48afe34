//! Sequential batch processor.
//!
//! One record is fully processed before the next begins; the registration
//! call is not idempotent, so this path must never be made concurrent. The
//! catalog snapshot is fetched exactly once before the loop, and the token
//! cache is only written between iterations or inside the single 401 retry.

use crate::api::ApiClient;
use crate::audit::{AuditSummary, AuditTrail};
use crate::catalog::ResolvedCodes;
use crate::colors;
use crate::config::BusinessDefaults;
use crate::datetime;
use crate::error::{MigrateError, Result};
use crate::types::{CatalogCode, IncidentRecord, NoveltyPerson, NoveltyRequest, Person};
use chrono::{Local, Utc};
use tracing::{debug, info, warn};

pub struct BatchResult {
    pub summary: AuditSummary,
    /// True when a business rejection stopped the batch before the last record.
    pub halted: bool,
}

pub struct BatchProcessor {
    api: ApiClient,
    defaults: BusinessDefaults,
}

impl BatchProcessor {
    pub fn new(api: ApiClient, defaults: BusinessDefaults) -> Self {
        Self { api, defaults }
    }

    /// Runs the batch to completion or until the first business rejection.
    /// Bootstrap failures (initial token, catalog fetch) abort the run before
    /// record 1; everything after that is absorbed into the audit trail.
    pub async fn run(&mut self, records: &[IncidentRecord]) -> Result<BatchResult> {
        self.api.auth_mut().get_token().await?;
        info!("initial bearer token obtained");

        let catalogs = self.api.fetch_catalogs().await?;
        if !self.api.auth().is_valid() {
            info!("token expired while fetching catalogs; refreshing before record 1");
            self.api.auth_mut().get_token().await?;
            if !self.api.auth().is_valid() {
                return Err(MigrateError::AuthFailure(
                    "could not refresh token after catalog fetch".to_string(),
                ));
            }
        }

        let mut audit = AuditTrail::new(records.len());
        let mut halted = false;
        info!(records = records.len(), "starting batch processing");

        for record in records {
            if let Err(skip_message) = self.ensure_fresh_token(record).await {
                audit.record_error(record, skip_message);
                continue;
            }

            let person = match self
                .api
                .find_person(record.normalized_document_type(), &record.document_number)
                .await
            {
                Ok(Some(person)) => {
                    debug!(row = record.row_index, "person found");
                    person
                }
                Ok(None) => {
                    info!(row = record.row_index, "person not found; skipping record");
                    audit.record_person_not_found(record);
                    continue;
                }
                Err(e) => {
                    warn!(row = record.row_index, error = %e, "person lookup failed");
                    audit.record_error(record, format!("person lookup failed: {}", e));
                    continue;
                }
            };

            let codes = catalogs.resolve(&record.category, &record.subcategory);
            let request = self.build_request(record, &person, codes);

            match self.api.register_novelty(&request).await {
                Ok(receipt) => {
                    info!(
                        row = record.row_index,
                        novelty_code = %receipt.novelty_code,
                        "record registered"
                    );
                    audit.record_success(record, receipt.novelty_code);
                }
                Err(MigrateError::BusinessRejection { observation }) => {
                    warn!(
                        row = record.row_index,
                        %observation,
                        "registration rejected by business rule; halting remaining records"
                    );
                    audit.record_error(record, observation);
                    halted = true;
                    // Halt contract: no record after this one is attempted.
                    break;
                }
                Err(e) => {
                    warn!(row = record.row_index, error = %e, "registration failed");
                    audit.record_error(record, e.to_string());
                }
            }
        }

        audit.log_summary();
        Ok(BatchResult {
            summary: audit.summary(),
            halted,
        })
    }

    /// Proactive refresh before touching the network for a record. Returns
    /// the audit message when the record must be skipped.
    async fn ensure_fresh_token(&mut self, record: &IncidentRecord) -> std::result::Result<(), String> {
        if !self.api.auth().is_expiring_soon() && self.api.auth().is_valid() {
            return Ok(());
        }
        info!(row = record.row_index, "token expiring soon or invalid; refreshing");
        match self.api.auth_mut().get_token().await {
            Ok(_) if self.api.auth().is_valid() => Ok(()),
            Ok(_) => Err("could not obtain a valid token".to_string()),
            Err(e) => Err(format!("token refresh failed: {}", e)),
        }
    }

    fn build_request(
        &self,
        record: &IncidentRecord,
        person: &Person,
        codes: ResolvedCodes,
    ) -> NoveltyRequest {
        let novelty_date = datetime::parse_record_datetime(&record.novelty_date, &record.novelty_time)
            .map(|dt| datetime::to_iso_string(&dt))
            .unwrap_or_else(|| datetime::to_iso_string(&Local::now().naive_local()));

        // Unresolved codes degrade to the record's raw text rather than failing
        let type_code = codes
            .type_code
            .map(CatalogCode::Code)
            .unwrap_or_else(|| CatalogCode::Raw(record.category.clone()));
        let value_code = codes
            .value_code
            .map(CatalogCode::Code)
            .unwrap_or_else(|| CatalogCode::Raw(record.subcategory.clone()));

        NoveltyRequest {
            catalog_type_code: type_code,
            catalog_value_code: value_code.clone(),
            catalogue_value_code: value_code,
            work_area_code: self.defaults.work_area_code,
            novelty_date,
            description: record.description.clone(),
            can_update: true,
            person_list: vec![NoveltyPerson {
                person_code: person.person_code,
                document_number: person.document_number.clone(),
                document_type: person.document_type.clone(),
                main_person: true,
                block_days: None,
                start_block_date: None,
                end_block_date: None,
            }],
            is_active: true,
            is_main_person_block: false,
            is_update: false,
            complaint: false,
            is_police_report: false,
            actives_done_codes: String::new(),
            repose: false,
            need_ambulance_service: false,
            cam_location: self.defaults.cam_location.clone(),
            cam_sub_location: self.defaults.cam_sub_location.clone(),
            description_location: self.defaults.description_location.clone(),
            sub_total_no_imp: 0,
            sub_total_imp: 0,
            iva: 0,
            amount_left: 0,
            novelty_total: 0,
            detected_by_employee: self.defaults.detected_by_employee,
            created_by_employee: self.defaults.created_by_employee,
            employee_person_code_created: self.defaults.employee_person_code_created,
            employee_person_code_detected: self.defaults.employee_person_code_detected,
            status: true,
            source: "1".to_string(),
            device: "WEB".to_string(),
            color: colors::color_by_name(&record.color_name).to_string(),
            created_date: Utc::now().timestamp_millis(),
            created_by_user: self.defaults.created_by_user.clone(),
        }
    }
}
