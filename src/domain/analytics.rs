//! Visitor/export analytics DTOs
//!
//! Event rows are keyed by (source id, MSME id) and only ever counted; the
//! aggregators rank businesses by summed counts, with company name as the
//! deterministic tie-break.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Visit event from the public directory UI
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordVisitRequest {
    pub source_id: String,
    pub msme_id: Uuid,
}

/// Export event covering one or more selected records
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordExportRequest {
    pub source_id: String,
    pub msme_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordExportResponse {
    pub recorded: usize,
}

/// Ranking entry for the most-visited listing
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VisitRanking {
    pub msme_id: Uuid,
    pub company_name: String,
    pub sector_name: String,
    pub total_visits: i64,
}

/// Ranking entry for the most-exported listing
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ExportRanking {
    pub msme_id: Uuid,
    pub company_name: String,
    pub sector_name: String,
    pub total_exports: i64,
}

/// Per-sector rollup for superadmin charts
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SectorSummary {
    pub sector_id: Uuid,
    pub sector_name: String,
    pub msme_count: i64,
    pub visit_total: i64,
    pub export_total: i64,
}

/// Optional sector scope for the aggregators
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ScopeQuery {
    #[serde(default)]
    pub sector: Option<String>,
}
