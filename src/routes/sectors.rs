//! Sector taxonomy routes
//!
//! Public listing for directory filters; mutations are superadmin-only.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::{Created, DataResponse, NoContent};
use crate::app::AppState;
use crate::auth::RequireSuperadmin;
use crate::domain::sectors::{normalize_sector_name, Sector, SectorRequest, SectorWithCount};
use crate::error::ApiError;
use crate::services::cache_keys;

/// Find a sector whose normalized name matches the given segment.
pub async fn find_sector_by_key(db: &PgPool, raw: &str) -> Result<Option<Sector>, sqlx::Error> {
    let key = normalize_sector_name(raw);

    let sectors = sqlx::query_as::<_, Sector>(
        "SELECT id, name, created_at, updated_at FROM sectors",
    )
    .fetch_all(db)
    .await?;

    Ok(sectors
        .into_iter()
        .find(|s| normalize_sector_name(&s.name) == key))
}

/// GET /sectors
///
/// All sectors with their MSME counts. Public, cached.
pub async fn list_sectors(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let cache_key = cache_keys::sectors_all();
    if let Some(sectors) = state.cache.get::<Vec<SectorWithCount>>(&cache_key).await {
        return Ok(Json(DataResponse::new(sectors)));
    }

    let sectors = sqlx::query_as::<_, SectorWithCount>(
        r#"
        SELECT s.id, s.name,
               (SELECT COUNT(*) FROM msmes m WHERE m.sector_id = s.id) AS msme_count,
               s.created_at, s.updated_at
        FROM sectors s
        ORDER BY s.name
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    if let Err(e) = state.cache.set(&cache_key, &sectors).await {
        tracing::warn!(error = %e, "Failed to cache sector listing");
    }

    Ok(Json(DataResponse::new(sectors)))
}

/// GET /sectors/:id
pub async fn get_sector(
    State(state): State<Arc<AppState>>,
    Path(sector_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let sector = sqlx::query_as::<_, SectorWithCount>(
        r#"
        SELECT s.id, s.name,
               (SELECT COUNT(*) FROM msmes m WHERE m.sector_id = s.id) AS msme_count,
               s.created_at, s.updated_at
        FROM sectors s
        WHERE s.id = $1
        "#,
    )
    .bind(sector_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Sector not found"))?;

    Ok(Json(DataResponse::new(sector)))
}

/// POST /sectors
pub async fn create_sector(
    State(state): State<Arc<AppState>>,
    admin: RequireSuperadmin,
    Json(input): Json<SectorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }

    // Names collide when their routing keys collide, not just on exact match
    if find_sector_by_key(&state.db, &name).await?.is_some() {
        return Err(ApiError::conflict("A sector with this name already exists"));
    }

    let sector = sqlx::query_as::<_, Sector>(
        r#"
        INSERT INTO sectors (id, name, created_at, updated_at)
        VALUES ($1, $2, NOW(), NOW())
        RETURNING id, name, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&name)
    .fetch_one(&state.db)
    .await?;

    invalidate_sector_cache(&state).await;

    tracing::info!(sector_id = %sector.id, admin_id = %admin.admin_id(), "Sector created");

    Ok(Created(DataResponse::new(sector)))
}

/// PUT /sectors/:id
pub async fn update_sector(
    State(state): State<Arc<AppState>>,
    Path(sector_id): Path<Uuid>,
    admin: RequireSuperadmin,
    Json(input): Json<SectorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }

    if let Some(existing) = find_sector_by_key(&state.db, &name).await? {
        if existing.id != sector_id {
            return Err(ApiError::conflict("A sector with this name already exists"));
        }
    }

    let sector = sqlx::query_as::<_, Sector>(
        r#"
        UPDATE sectors SET name = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING id, name, created_at, updated_at
        "#,
    )
    .bind(sector_id)
    .bind(&name)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Sector not found"))?;

    invalidate_sector_cache(&state).await;

    tracing::info!(sector_id = %sector_id, admin_id = %admin.admin_id(), "Sector renamed");

    Ok(Json(DataResponse::new(sector)))
}

/// DELETE /sectors/:id
///
/// Refused while MSMEs still reference the sector.
pub async fn delete_sector(
    State(state): State<Arc<AppState>>,
    Path(sector_id): Path<Uuid>,
    admin: RequireSuperadmin,
) -> Result<impl IntoResponse, ApiError> {
    let msme_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM msmes WHERE sector_id = $1")
        .bind(sector_id)
        .fetch_one(&state.db)
        .await?;

    if msme_count > 0 {
        return Err(ApiError::bad_request(format!(
            "Sector still has {} MSME records",
            msme_count
        )));
    }

    let result = sqlx::query("DELETE FROM sectors WHERE id = $1")
        .bind(sector_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Sector not found"));
    }

    invalidate_sector_cache(&state).await;

    tracing::info!(sector_id = %sector_id, admin_id = %admin.admin_id(), "Sector deleted");

    Ok(NoContent)
}

/// GET /sectors/by-name/:sector
///
/// Resolve a sector from its routing key (used by sector-scoped pages).
pub async fn get_sector_by_name(
    State(state): State<Arc<AppState>>,
    Path(sector): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let sector = find_sector_by_key(&state.db, &sector)
        .await?
        .ok_or_else(|| ApiError::not_found("Sector not found"))?;

    Ok(Json(DataResponse::new(sector)))
}

async fn invalidate_sector_cache(state: &AppState) {
    if let Err(e) = state.cache.delete(&cache_keys::sectors_all()).await {
        tracing::warn!(error = %e, "Failed to invalidate sector cache");
    }
}
