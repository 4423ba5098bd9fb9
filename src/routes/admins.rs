//! Admin management routes
//!
//! Signup lands an unapproved record; the superadmin approves (assigning
//! sectors), rejects, or removes admins.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::{Created, DataResponse, MessageResponse, NoContent};
use crate::app::AppState;
use crate::auth::{AdminIdentity, RequireAuth, RequireSuperadmin};
use crate::domain::admins::{
    AdminWithSectors, ApproveAdminRequest, RegisterAdminRequest, RejectAdminRequest,
};
use crate::domain::sectors::Sector;
use crate::error::ApiError;
use crate::services::{cache_keys, notifications};

const ADMIN_COLUMNS: &str = "id, email, display_name, is_superadmin, is_pending, is_active, \
     email_verified, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct AssignmentRow {
    admin_id: Uuid,
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// POST /admins
///
/// Self-registration hook invoked after auth-provider signup. Idempotent;
/// the record starts pending and inactive.
pub async fn register_admin(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(input): Json<RegisterAdminRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = input.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(ApiError::bad_request("email must not be empty"));
    }

    let query_str = format!(
        r#"
        INSERT INTO admins (id, email, display_name, is_superadmin, is_pending, is_active,
                            email_verified, created_at, updated_at)
        VALUES ($1, $2, $3, false, true, false, false, NOW(), NOW())
        ON CONFLICT (id) DO UPDATE SET
            email = EXCLUDED.email,
            display_name = COALESCE(EXCLUDED.display_name, admins.display_name),
            updated_at = NOW()
        RETURNING {}
        "#,
        ADMIN_COLUMNS
    );

    let admin = sqlx::query_as::<_, AdminIdentity>(&query_str)
        .bind(auth.user_id)
        .bind(&email)
        .bind(&input.display_name)
        .fetch_one(&state.db)
        .await?;

    tracing::info!(admin_id = %admin.id, "Admin registration recorded");

    Ok(Created(DataResponse::new(admin)))
}

/// GET /admins
///
/// Active admins with their sector assignments.
pub async fn list_active_admins(
    State(state): State<Arc<AppState>>,
    _admin: RequireSuperadmin,
) -> Result<impl IntoResponse, ApiError> {
    let query_str = format!(
        "SELECT {} FROM admins WHERE is_active AND NOT is_pending ORDER BY email",
        ADMIN_COLUMNS
    );

    let admins = sqlx::query_as::<_, AdminIdentity>(&query_str)
        .fetch_all(&state.db)
        .await?;

    let data = attach_sectors(&state, admins).await?;

    Ok(Json(DataResponse::new(data)))
}

/// GET /admins/pending
///
/// Signups awaiting approval.
pub async fn list_pending_admins(
    State(state): State<Arc<AppState>>,
    _admin: RequireSuperadmin,
) -> Result<impl IntoResponse, ApiError> {
    let query_str = format!(
        "SELECT {} FROM admins WHERE is_pending ORDER BY created_at",
        ADMIN_COLUMNS
    );

    let admins = sqlx::query_as::<_, AdminIdentity>(&query_str)
        .fetch_all(&state.db)
        .await?;

    Ok(Json(DataResponse::new(admins)))
}

/// POST /admins/:id/approve
///
/// Clears the pending flag, activates the account and assigns sectors.
pub async fn approve_admin(
    State(state): State<Arc<AppState>>,
    Path(admin_id): Path<Uuid>,
    superadmin: RequireSuperadmin,
    Json(input): Json<ApproveAdminRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if input.sector_ids.is_empty() {
        return Err(ApiError::bad_request("sectorIds must not be empty"));
    }

    let target = fetch_admin(&state, admin_id).await?;
    if !target.is_pending && target.is_active {
        return Err(ApiError::bad_request("Admin is already approved"));
    }

    let known: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sectors WHERE id = ANY($1)")
        .bind(&input.sector_ids)
        .fetch_one(&state.db)
        .await?;
    if known != input.sector_ids.len() as i64 {
        return Err(ApiError::bad_request("sectorIds contains unknown sectors"));
    }

    sqlx::query(
        r#"
        UPDATE admins SET is_pending = false, is_active = true, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(admin_id)
    .execute(&state.db)
    .await?;

    sqlx::query("DELETE FROM admin_sectors WHERE admin_id = $1")
        .bind(admin_id)
        .execute(&state.db)
        .await?;

    for sector_id in &input.sector_ids {
        sqlx::query("INSERT INTO admin_sectors (admin_id, sector_id) VALUES ($1, $2)")
            .bind(admin_id)
            .bind(sector_id)
            .execute(&state.db)
            .await?;
    }

    invalidate_guard_cache(&state, admin_id).await;

    if let Err(e) = notifications::notify_admin_approved(&state.db, admin_id).await {
        tracing::warn!(admin_id = %admin_id, error = %e, "Failed to write approval notification");
    }

    tracing::info!(
        admin_id = %admin_id,
        approved_by = %superadmin.admin_id(),
        sectors = input.sector_ids.len(),
        "Admin approved"
    );

    Ok(Json(MessageResponse::new("Admin approved")))
}

/// POST /admins/:id/reject
pub async fn reject_admin(
    State(state): State<Arc<AppState>>,
    Path(admin_id): Path<Uuid>,
    superadmin: RequireSuperadmin,
    Json(input): Json<RejectAdminRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let target = fetch_admin(&state, admin_id).await?;
    if target.is_superadmin {
        return Err(ApiError::bad_request("Cannot reject the superadmin"));
    }

    sqlx::query(
        r#"
        UPDATE admins SET is_pending = false, is_active = false, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(admin_id)
    .execute(&state.db)
    .await?;

    invalidate_guard_cache(&state, admin_id).await;

    if let Err(e) =
        notifications::notify_admin_rejected(&state.db, admin_id, input.reason.as_deref()).await
    {
        tracing::warn!(admin_id = %admin_id, error = %e, "Failed to write rejection notification");
    }

    tracing::info!(
        admin_id = %admin_id,
        rejected_by = %superadmin.admin_id(),
        "Admin rejected"
    );

    Ok(Json(MessageResponse::new("Admin rejected")))
}

/// DELETE /admins/:id
pub async fn delete_admin(
    State(state): State<Arc<AppState>>,
    Path(admin_id): Path<Uuid>,
    superadmin: RequireSuperadmin,
) -> Result<impl IntoResponse, ApiError> {
    if admin_id == superadmin.admin_id() {
        return Err(ApiError::bad_request("Cannot delete your own account"));
    }

    let result = sqlx::query("DELETE FROM admins WHERE id = $1")
        .bind(admin_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Admin not found"));
    }

    invalidate_guard_cache(&state, admin_id).await;

    tracing::info!(
        admin_id = %admin_id,
        deleted_by = %superadmin.admin_id(),
        "Admin deleted"
    );

    Ok(NoContent)
}

async fn fetch_admin(state: &AppState, admin_id: Uuid) -> Result<AdminIdentity, ApiError> {
    let query_str = format!("SELECT {} FROM admins WHERE id = $1", ADMIN_COLUMNS);

    sqlx::query_as::<_, AdminIdentity>(&query_str)
        .bind(admin_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Admin not found"))
}

/// Stitch sector assignments onto a list of admins.
pub async fn attach_sectors(
    state: &AppState,
    admins: Vec<AdminIdentity>,
) -> Result<Vec<AdminWithSectors>, ApiError> {
    let admin_ids: Vec<Uuid> = admins.iter().map(|a| a.id).collect();

    let rows = sqlx::query_as::<_, AssignmentRow>(
        r#"
        SELECT a.admin_id, s.id, s.name, s.created_at, s.updated_at
        FROM admin_sectors a
        JOIN sectors s ON s.id = a.sector_id
        WHERE a.admin_id = ANY($1)
        ORDER BY s.name
        "#,
    )
    .bind(&admin_ids)
    .fetch_all(&state.db)
    .await?;

    let mut by_admin: HashMap<Uuid, Vec<Sector>> = HashMap::new();
    for row in rows {
        by_admin.entry(row.admin_id).or_default().push(Sector {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        });
    }

    Ok(admins
        .into_iter()
        .map(|admin| {
            let sectors = by_admin.remove(&admin.id).unwrap_or_default();
            AdminWithSectors { admin, sectors }
        })
        .collect())
}

async fn invalidate_guard_cache(state: &AppState, admin_id: Uuid) {
    if let Err(e) = state.cache.delete(&cache_keys::guard_sector(admin_id)).await {
        tracing::warn!(admin_id = %admin_id, error = %e, "Failed to invalidate guard cache");
    }
}
