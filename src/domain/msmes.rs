//! MSME record types and gateway query parameters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::api::pagination::PageMeta;

/// Business record
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Msme {
    pub id: Uuid,
    pub company_name: String,
    pub description: Option<String>,
    pub contact_person: Option<String>,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub province: Option<String>,
    pub municipality: String,
    pub barangay: Option<String>,
    pub year_established: Option<i32>,
    pub registration_no: String,
    pub sector_id: Uuid,
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload. PUT replaces the whole record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MsmeRequest {
    pub company_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub contact_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    pub municipality: String,
    #[serde(default)]
    pub barangay: Option<String>,
    #[serde(default)]
    pub year_established: Option<i32>,
    pub registration_no: String,
    pub sector_id: Uuid,
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// Gateway query parameters for `GET /msmes`.
///
/// `sectors`, `municipalities` and `ids` are comma-separated lists.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MsmeListQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub desc: Option<bool>,
    #[serde(default)]
    pub sectors: Option<String>,
    #[serde(default)]
    pub municipalities: Option<String>,
    #[serde(default)]
    pub ids: Option<String>,
}

/// Allow-listed sort columns for the gateway. Anything else is a 400.
pub fn sort_column(sort: Option<&str>) -> Option<&'static str> {
    match sort {
        None | Some("companyName") => Some("company_name"),
        Some("municipality") => Some("municipality"),
        Some("yearEstablished") => Some("year_established"),
        Some("createdAt") => Some("created_at"),
        Some(_) => None,
    }
}

/// Split a comma-separated query value, dropping empty entries.
pub fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// One page of gateway results
#[derive(Debug, Serialize)]
pub struct MsmePage {
    pub msmes: Vec<Msme>,
    pub meta: PageMeta,
}

/// Duplicate pre-check request (checked, not enforced atomically)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheckRequest {
    pub company_name: String,
    pub registration_no: String,
    #[serde(default)]
    pub exclude_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheckResponse {
    pub is_duplicate_company_name: bool,
    pub is_duplicate_registration_no: bool,
}

/// Search query for `GET /msmes/search`
#[derive(Debug, Clone, Deserialize)]
pub struct MsmeSearchQuery {
    pub q: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_defaults_to_company_name() {
        assert_eq!(sort_column(None), Some("company_name"));
    }

    #[test]
    fn allow_listed_columns_map_to_sql() {
        assert_eq!(sort_column(Some("companyName")), Some("company_name"));
        assert_eq!(sort_column(Some("municipality")), Some("municipality"));
        assert_eq!(sort_column(Some("yearEstablished")), Some("year_established"));
        assert_eq!(sort_column(Some("createdAt")), Some("created_at"));
    }

    #[test]
    fn unknown_sort_columns_are_rejected() {
        assert_eq!(sort_column(Some("registrationNo")), None);
        assert_eq!(sort_column(Some("id; DROP TABLE msmes")), None);
    }

    #[test]
    fn csv_splitting_trims_and_drops_empties() {
        assert_eq!(split_csv("Coffee, Bamboo ,"), vec!["Coffee", "Bamboo"]);
        assert!(split_csv(" , ").is_empty());
    }
}
