//! Sector taxonomy types
//!
//! Sector names are compared through a normalized routing key everywhere:
//! lowercase with whitespace and `-`/`_` separators stripped, so that
//! "IT-BPM", "it bpm" and "IT_BPM" all address the same sector.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Sector record
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Sector {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sector with the number of MSMEs assigned to it
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SectorWithCount {
    pub id: Uuid,
    pub name: String,
    pub msme_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create or rename a sector
#[derive(Debug, Clone, Deserialize)]
pub struct SectorRequest {
    pub name: String,
}

/// Reduce a sector name to its routing key.
pub fn normalize_sector_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separator_variants_share_one_key() {
        assert_eq!(normalize_sector_name("IT-BPM"), "itbpm");
        assert_eq!(normalize_sector_name("it bpm"), "itbpm");
        assert_eq!(normalize_sector_name("IT_BPM"), "itbpm");
    }

    #[test]
    fn plain_names_just_lowercase() {
        assert_eq!(normalize_sector_name("Bamboo"), "bamboo");
        assert_eq!(normalize_sector_name("Coffee"), "coffee");
    }

    #[test]
    fn interior_and_surrounding_whitespace_is_stripped() {
        assert_eq!(normalize_sector_name("  Food Processing "), "foodprocessing");
    }
}
