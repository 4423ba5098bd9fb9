//! Analytics routes
//!
//! Visit/export event recording from the public UI plus the top-N
//! rankings the dashboards chart. Rankings tie-break on company name so
//! equal counts render in a stable order.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::auth::{RequireAdmin, RequireSuperadmin};
use crate::domain::analytics::{
    ExportRanking, RecordExportRequest, RecordExportResponse, RecordVisitRequest, ScopeQuery,
    SectorSummary, VisitRanking,
};
use crate::error::ApiError;
use crate::routes::sectors::find_sector_by_key;

/// POST /analytics/visits
///
/// Upsert-increment a visit for (source, msme). Public.
pub async fn record_visit(
    State(state): State<Arc<AppState>>,
    Json(input): Json<RecordVisitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if input.source_id.trim().is_empty() {
        return Err(ApiError::bad_request("sourceId must not be empty"));
    }

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM msmes WHERE id = $1)")
        .bind(input.msme_id)
        .fetch_one(&state.db)
        .await?;
    if !exists {
        return Err(ApiError::not_found("MSME not found"));
    }

    sqlx::query(
        r#"
        INSERT INTO visitors (id, source_id, msme_id, visit_count, last_visited_at)
        VALUES ($1, $2, $3, 1, NOW())
        ON CONFLICT (source_id, msme_id) DO UPDATE SET
            visit_count = visitors.visit_count + 1,
            last_visited_at = NOW()
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(input.source_id.trim())
    .bind(input.msme_id)
    .execute(&state.db)
    .await?;

    Ok(Json(serde_json::json!({ "recorded": true })))
}

/// POST /analytics/exports
///
/// Record an export covering the selected MSMEs. Unknown ids are skipped.
pub async fn record_exports(
    State(state): State<Arc<AppState>>,
    Json(input): Json<RecordExportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if input.source_id.trim().is_empty() {
        return Err(ApiError::bad_request("sourceId must not be empty"));
    }
    if input.msme_ids.is_empty() {
        return Err(ApiError::bad_request("msmeIds must not be empty"));
    }

    let existing: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM msmes WHERE id = ANY($1)")
        .bind(&input.msme_ids)
        .fetch_all(&state.db)
        .await?;

    for msme_id in &existing {
        sqlx::query(
            r#"
            INSERT INTO export_logs (id, source_id, msme_id, export_count, last_exported_at)
            VALUES ($1, $2, $3, 1, NOW())
            ON CONFLICT (source_id, msme_id) DO UPDATE SET
                export_count = export_logs.export_count + 1,
                last_exported_at = NOW()
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.source_id.trim())
        .bind(msme_id)
        .execute(&state.db)
        .await?;
    }

    Ok(Json(DataResponse::new(RecordExportResponse {
        recorded: existing.len(),
    })))
}

/// GET /analytics/top-visited?sector=
///
/// Top 10 businesses by summed visit count, optionally sector-scoped.
pub async fn top_visited(
    State(state): State<Arc<AppState>>,
    Query(scope): Query<ScopeQuery>,
    _admin: RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    let sector_id = match resolve_scope(&state, scope.sector.as_deref()).await? {
        Scope::Unscoped => None,
        Scope::Sector(id) => Some(id),
        Scope::UnknownSector => {
            return Ok(Json(DataResponse::new(Vec::<VisitRanking>::new())));
        }
    };

    let rankings = sqlx::query_as::<_, VisitRanking>(
        r#"
        SELECT m.id AS msme_id, m.company_name, s.name AS sector_name,
               SUM(v.visit_count) AS total_visits
        FROM visitors v
        JOIN msmes m ON m.id = v.msme_id
        JOIN sectors s ON s.id = m.sector_id
        WHERE ($1::uuid IS NULL OR m.sector_id = $1)
        GROUP BY m.id, m.company_name, s.name
        ORDER BY total_visits DESC, m.company_name ASC
        LIMIT 10
        "#,
    )
    .bind(sector_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(DataResponse::new(rankings)))
}

/// GET /analytics/most-exported?sector=
///
/// The single most-exported business in the optional sector scope.
pub async fn most_exported(
    State(state): State<Arc<AppState>>,
    Query(scope): Query<ScopeQuery>,
    _admin: RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    let sector_id = match resolve_scope(&state, scope.sector.as_deref()).await? {
        Scope::Unscoped => None,
        Scope::Sector(id) => Some(id),
        Scope::UnknownSector => {
            return Ok(Json(DataResponse::new(None::<ExportRanking>)));
        }
    };

    let ranking = sqlx::query_as::<_, ExportRanking>(
        r#"
        SELECT m.id AS msme_id, m.company_name, s.name AS sector_name,
               SUM(e.export_count) AS total_exports
        FROM export_logs e
        JOIN msmes m ON m.id = e.msme_id
        JOIN sectors s ON s.id = m.sector_id
        WHERE ($1::uuid IS NULL OR m.sector_id = $1)
        GROUP BY m.id, m.company_name, s.name
        ORDER BY total_exports DESC, m.company_name ASC
        LIMIT 1
        "#,
    )
    .bind(sector_id)
    .fetch_optional(&state.db)
    .await?;

    Ok(Json(DataResponse::new(ranking)))
}

/// GET /analytics/sector-summary
///
/// Per-sector rollup for the superadmin dashboard.
pub async fn sector_summary(
    State(state): State<Arc<AppState>>,
    _admin: RequireSuperadmin,
) -> Result<impl IntoResponse, ApiError> {
    let summaries = sqlx::query_as::<_, SectorSummary>(
        r#"
        SELECT s.id AS sector_id, s.name AS sector_name,
               (SELECT COUNT(*) FROM msmes m WHERE m.sector_id = s.id) AS msme_count,
               (SELECT COALESCE(SUM(v.visit_count), 0) FROM visitors v
                JOIN msmes m ON m.id = v.msme_id WHERE m.sector_id = s.id) AS visit_total,
               (SELECT COALESCE(SUM(e.export_count), 0) FROM export_logs e
                JOIN msmes m ON m.id = e.msme_id WHERE m.sector_id = s.id) AS export_total
        FROM sectors s
        ORDER BY s.name
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(DataResponse::new(summaries)))
}

enum Scope {
    Unscoped,
    Sector(Uuid),
    UnknownSector,
}

async fn resolve_scope(state: &AppState, sector: Option<&str>) -> Result<Scope, ApiError> {
    match sector {
        None => Ok(Scope::Unscoped),
        Some(raw) if raw.trim().is_empty() => Ok(Scope::Unscoped),
        Some(raw) => match find_sector_by_key(&state.db, raw).await? {
            Some(sector) => Ok(Scope::Sector(sector.id)),
            None => Ok(Scope::UnknownSector),
        },
    }
}
