//! Admin management DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AdminIdentity;
use crate::domain::sectors::Sector;

/// Admin record with its sector assignments
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminWithSectors {
    #[serde(flatten)]
    pub admin: AdminIdentity,
    pub sectors: Vec<Sector>,
}

/// Request to approve a pending admin, assigning their sectors
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveAdminRequest {
    pub sector_ids: Vec<Uuid>,
}

/// Request to reject a pending admin
#[derive(Debug, Clone, Deserialize)]
pub struct RejectAdminRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Self-registration payload, invoked after auth-provider signup.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAdminRequest {
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
}
