use serde::{Deserialize, Serialize};

/// One input row of the migration batch. Immutable once loaded; the 1-based
/// row index is assigned by the loader and carried through to the audit trail.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRecord {
    #[serde(default)]
    pub row_index: usize,
    pub document_type: String,
    pub document_number: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color_name: String,
    #[serde(default)]
    pub novelty_date: String,
    #[serde(default)]
    pub novelty_time: String,
}

impl IncidentRecord {
    /// Maps the spreadsheet document-type label to the API code.
    pub fn normalized_document_type(&self) -> &'static str {
        if self.document_type.trim() == "CÉDULA" {
            "CI"
        } else {
            "PAS"
        }
    }
}

/// Person resolved by the lookup endpoint. The wire format uses the upstream
/// system's Spanish field names; only the fields the pipeline needs are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct Person {
    #[serde(rename = "codigoPersona")]
    pub person_code: i64,
    #[serde(rename = "tipoDocumento")]
    pub document_type: String,
    #[serde(rename = "numeroDocumento")]
    pub document_number: String,
}

#[derive(Debug, Deserialize)]
pub struct PersonResponse {
    #[serde(default)]
    pub data: Option<Person>,
}

/// A catalog code resolved from the snapshot, or the record's raw text when
/// no catalog entry matched (degraded-mode fallback).
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CatalogCode {
    Code(i64),
    Raw(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoveltyPerson {
    pub person_code: i64,
    pub document_number: String,
    pub document_type: String,
    pub main_person: bool,
    pub block_days: Option<i64>,
    pub start_block_date: Option<i64>,
    pub end_block_date: Option<i64>,
}

/// Outbound registration payload. Field names and static defaults mirror the
/// downstream novelty model exactly; the duplicated `catalogueValueCode`
/// spelling is required by the endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoveltyRequest {
    pub catalog_type_code: CatalogCode,
    pub catalog_value_code: CatalogCode,
    pub catalogue_value_code: CatalogCode,
    pub work_area_code: i64,
    pub novelty_date: String,
    pub description: String,
    pub can_update: bool,
    pub person_list: Vec<NoveltyPerson>,
    pub is_active: bool,
    pub is_main_person_block: bool,
    pub is_update: bool,
    pub complaint: bool,
    pub is_police_report: bool,
    pub actives_done_codes: String,
    pub repose: bool,
    pub need_ambulance_service: bool,
    pub cam_location: String,
    pub cam_sub_location: String,
    pub description_location: String,
    pub sub_total_no_imp: i64,
    pub sub_total_imp: i64,
    pub iva: i64,
    pub amount_left: i64,
    pub novelty_total: i64,
    pub detected_by_employee: i64,
    pub created_by_employee: i64,
    pub employee_person_code_created: i64,
    pub employee_person_code_detected: i64,
    pub status: bool,
    pub source: String,
    pub device: String,
    pub color: String,
    pub created_date: i64,
    pub created_by_user: String,
}

#[derive(Debug, Deserialize)]
pub struct NoveltyResponse {
    #[serde(default)]
    pub data: NoveltyResponseData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoveltyResponseData {
    #[serde(default)]
    pub novelty_code: Option<i64>,
    /// Non-empty observation means the endpoint rejected the record on a
    /// business rule even though the HTTP call succeeded.
    #[serde(default)]
    pub observation: Option<String>,
}

/// Successful registration outcome.
#[derive(Debug, Clone)]
pub struct NoveltyReceipt {
    pub novelty_code: String,
}
