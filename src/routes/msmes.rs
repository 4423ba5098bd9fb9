//! MSME routes
//!
//! The data gateway: bounded, paginated reads over the business-record
//! table plus CRUD and the duplicate pre-check used by admin forms.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::pagination::{validate_page, PageMeta, MSME_PAGE_SIZE};
use crate::api::response::{Created, DataResponse, NoContent};
use crate::app::AppState;
use crate::auth::RequireAdmin;
use crate::domain::msmes::{
    sort_column, split_csv, DuplicateCheckRequest, DuplicateCheckResponse, Msme, MsmeListQuery,
    MsmePage, MsmeRequest, MsmeSearchQuery,
};
use crate::domain::sectors::normalize_sector_name;
use crate::error::ApiError;
use crate::routes::sectors::find_sector_by_key;

const MSME_COLUMNS: &str = "id, company_name, description, contact_person, contact_number, \
     email, province, municipality, barangay, year_established, registration_no, sector_id, \
     logo_url, created_at, updated_at";

/// GET /msmes
///
/// Paginated, filtered, sorted listing. Public.
pub async fn list_msmes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MsmeListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = validate_page(query.page)?;
    let sort_col = sort_column(query.sort.as_deref()).ok_or_else(|| {
        ApiError::bad_request(format!(
            "unsupported sort column: {}",
            query.sort.as_deref().unwrap_or_default()
        ))
    })?;
    let order_dir = if query.desc.unwrap_or(false) {
        "DESC"
    } else {
        "ASC"
    };

    // Resolve sector-name filters through the taxonomy first; if none of
    // the requested names exist, the record table is never queried.
    let sector_ids: Option<Vec<Uuid>> = match query.sectors.as_deref() {
        None => None,
        Some(raw) => {
            let names = split_csv(raw);
            if names.is_empty() {
                None
            } else {
                let ids = resolve_sector_ids(&state, &names).await?;
                if ids.is_empty() {
                    return Ok(Json(MsmePage {
                        msmes: vec![],
                        meta: PageMeta::new(page, MSME_PAGE_SIZE, 0),
                    }));
                }
                Some(ids)
            }
        }
    };

    let municipalities: Option<Vec<String>> = query
        .municipalities
        .as_deref()
        .map(|raw| {
            split_csv(raw)
                .into_iter()
                .map(|m| m.to_lowercase())
                .collect::<Vec<_>>()
        })
        .filter(|v| !v.is_empty());

    let ids: Option<Vec<Uuid>> = match query.ids.as_deref() {
        None => None,
        Some(raw) => {
            let parsed: Result<Vec<Uuid>, _> =
                split_csv(raw).iter().map(|s| Uuid::parse_str(s)).collect();
            let parsed = parsed.map_err(|_| {
                ApiError::bad_request("ids must be a comma-separated list of UUIDs")
            })?;
            if parsed.is_empty() {
                None
            } else {
                Some(parsed)
            }
        }
    };

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM msmes
        WHERE ($1::uuid[] IS NULL OR sector_id = ANY($1))
        AND ($2::text[] IS NULL OR LOWER(municipality) = ANY($2))
        AND ($3::uuid[] IS NULL OR id = ANY($3))
        "#,
    )
    .bind(&sector_ids)
    .bind(&municipalities)
    .bind(&ids)
    .fetch_one(&state.db)
    .await?;

    let query_str = format!(
        r#"
        SELECT {}
        FROM msmes
        WHERE ($1::uuid[] IS NULL OR sector_id = ANY($1))
        AND ($2::text[] IS NULL OR LOWER(municipality) = ANY($2))
        AND ($3::uuid[] IS NULL OR id = ANY($3))
        ORDER BY {} {}
        LIMIT $4 OFFSET $5
        "#,
        MSME_COLUMNS, sort_col, order_dir
    );

    let msmes = sqlx::query_as::<_, Msme>(&query_str)
        .bind(&sector_ids)
        .bind(&municipalities)
        .bind(&ids)
        .bind(MSME_PAGE_SIZE)
        .bind(PageMeta::offset(page, MSME_PAGE_SIZE))
        .fetch_all(&state.db)
        .await?;

    Ok(Json(MsmePage {
        msmes,
        meta: PageMeta::new(page, MSME_PAGE_SIZE, total),
    }))
}

/// GET /msmes/sector/:sector
///
/// Sector-scoped listing for the sector dashboards. The sector segment is
/// matched through the normalized routing key.
pub async fn list_msmes_by_sector(
    State(state): State<Arc<AppState>>,
    Path(sector): Path<String>,
    Query(query): Query<MsmeListQuery>,
    _admin: RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    let page = validate_page(query.page)?;

    let sector = find_sector_by_key(&state.db, &sector)
        .await?
        .ok_or_else(|| ApiError::not_found("Sector not found"))?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM msmes WHERE sector_id = $1")
        .bind(sector.id)
        .fetch_one(&state.db)
        .await?;

    let query_str = format!(
        "SELECT {} FROM msmes WHERE sector_id = $1 ORDER BY company_name LIMIT $2 OFFSET $3",
        MSME_COLUMNS
    );

    let msmes = sqlx::query_as::<_, Msme>(&query_str)
        .bind(sector.id)
        .bind(MSME_PAGE_SIZE)
        .bind(PageMeta::offset(page, MSME_PAGE_SIZE))
        .fetch_all(&state.db)
        .await?;

    Ok(Json(MsmePage {
        msmes,
        meta: PageMeta::new(page, MSME_PAGE_SIZE, total),
    }))
}

/// GET /msmes/search?q=
///
/// Case-insensitive company-name search, bounded. Public.
pub async fn search_msmes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MsmeSearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let q = query.q.trim().to_string();
    if q.is_empty() {
        return Err(ApiError::bad_request("q must not be empty"));
    }

    let query_str = format!(
        "SELECT {} FROM msmes WHERE company_name ILIKE '%' || $1 || '%' \
         ORDER BY company_name LIMIT 20",
        MSME_COLUMNS
    );

    let msmes = sqlx::query_as::<_, Msme>(&query_str)
        .bind(&q)
        .fetch_all(&state.db)
        .await?;

    Ok(Json(DataResponse::new(msmes)))
}

/// GET /msmes/:id
pub async fn get_msme(
    State(state): State<Arc<AppState>>,
    Path(msme_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let query_str = format!("SELECT {} FROM msmes WHERE id = $1", MSME_COLUMNS);

    let msme = sqlx::query_as::<_, Msme>(&query_str)
        .bind(msme_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("MSME not found"))?;

    Ok(Json(DataResponse::new(msme)))
}

/// POST /msmes
pub async fn create_msme(
    State(state): State<Arc<AppState>>,
    admin: RequireAdmin,
    Json(input): Json<MsmeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_msme_request(&input)?;
    ensure_sector_exists(&state, input.sector_id).await?;

    let duplicates = check_duplicates(&state, &input.company_name, &input.registration_no, None)
        .await?;
    if duplicates.is_duplicate_company_name {
        return Err(ApiError::conflict("Company name already registered"));
    }
    if duplicates.is_duplicate_registration_no {
        return Err(ApiError::conflict("Registration number already registered"));
    }

    let id = Uuid::new_v4();
    let query_str = format!(
        r#"
        INSERT INTO msmes (id, company_name, description, contact_person, contact_number,
                           email, province, municipality, barangay, year_established,
                           registration_no, sector_id, logo_url, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, NOW(), NOW())
        RETURNING {}
        "#,
        MSME_COLUMNS
    );

    let msme = sqlx::query_as::<_, Msme>(&query_str)
        .bind(id)
        .bind(&input.company_name)
        .bind(&input.description)
        .bind(&input.contact_person)
        .bind(&input.contact_number)
        .bind(&input.email)
        .bind(&input.province)
        .bind(&input.municipality)
        .bind(&input.barangay)
        .bind(input.year_established)
        .bind(&input.registration_no)
        .bind(input.sector_id)
        .bind(&input.logo_url)
        .fetch_one(&state.db)
        .await?;

    tracing::info!(msme_id = %id, admin_id = %admin.admin_id(), "MSME created");

    Ok(Created(DataResponse::new(msme)))
}

/// PUT /msmes/:id
///
/// Full-record replace.
pub async fn update_msme(
    State(state): State<Arc<AppState>>,
    Path(msme_id): Path<Uuid>,
    admin: RequireAdmin,
    Json(input): Json<MsmeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_msme_request(&input)?;
    ensure_sector_exists(&state, input.sector_id).await?;

    let query_str = format!(
        r#"
        UPDATE msmes SET
            company_name = $2, description = $3, contact_person = $4, contact_number = $5,
            email = $6, province = $7, municipality = $8, barangay = $9,
            year_established = $10, registration_no = $11, sector_id = $12, logo_url = $13,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        MSME_COLUMNS
    );

    let msme = sqlx::query_as::<_, Msme>(&query_str)
        .bind(msme_id)
        .bind(&input.company_name)
        .bind(&input.description)
        .bind(&input.contact_person)
        .bind(&input.contact_number)
        .bind(&input.email)
        .bind(&input.province)
        .bind(&input.municipality)
        .bind(&input.barangay)
        .bind(input.year_established)
        .bind(&input.registration_no)
        .bind(input.sector_id)
        .bind(&input.logo_url)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("MSME not found"))?;

    tracing::info!(msme_id = %msme_id, admin_id = %admin.admin_id(), "MSME updated");

    Ok(Json(DataResponse::new(msme)))
}

/// DELETE /msmes/:id
pub async fn delete_msme(
    State(state): State<Arc<AppState>>,
    Path(msme_id): Path<Uuid>,
    admin: RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM msmes WHERE id = $1")
        .bind(msme_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("MSME not found"));
    }

    tracing::info!(msme_id = %msme_id, admin_id = %admin.admin_id(), "MSME deleted");

    Ok(NoContent)
}

/// POST /msmes/check-duplicate
///
/// Case-insensitive pre-check before create/update, optionally excluding
/// the record being edited.
pub async fn check_duplicate(
    State(state): State<Arc<AppState>>,
    _admin: RequireAdmin,
    Json(input): Json<DuplicateCheckRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = check_duplicates(
        &state,
        &input.company_name,
        &input.registration_no,
        input.exclude_id,
    )
    .await?;

    Ok(Json(DataResponse::new(result)))
}

async fn check_duplicates(
    state: &AppState,
    company_name: &str,
    registration_no: &str,
    exclude_id: Option<Uuid>,
) -> Result<DuplicateCheckResponse, ApiError> {
    let is_duplicate_company_name: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM msmes
            WHERE LOWER(company_name) = LOWER($1)
            AND ($2::uuid IS NULL OR id <> $2)
        )
        "#,
    )
    .bind(company_name)
    .bind(exclude_id)
    .fetch_one(&state.db)
    .await?;

    let is_duplicate_registration_no: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM msmes
            WHERE LOWER(registration_no) = LOWER($1)
            AND ($2::uuid IS NULL OR id <> $2)
        )
        "#,
    )
    .bind(registration_no)
    .bind(exclude_id)
    .fetch_one(&state.db)
    .await?;

    Ok(DuplicateCheckResponse {
        is_duplicate_company_name,
        is_duplicate_registration_no,
    })
}

fn validate_msme_request(input: &MsmeRequest) -> Result<(), ApiError> {
    if input.company_name.trim().is_empty() {
        return Err(ApiError::bad_request("companyName must not be empty"));
    }
    if input.registration_no.trim().is_empty() {
        return Err(ApiError::bad_request("registrationNo must not be empty"));
    }
    if input.municipality.trim().is_empty() {
        return Err(ApiError::bad_request("municipality must not be empty"));
    }
    Ok(())
}

async fn ensure_sector_exists(state: &AppState, sector_id: Uuid) -> Result<(), ApiError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM sectors WHERE id = $1)")
        .bind(sector_id)
        .fetch_one(&state.db)
        .await?;

    if !exists {
        return Err(ApiError::bad_request("Unknown sector"));
    }
    Ok(())
}

/// Match requested sector names against the taxonomy by normalized key.
async fn resolve_sector_ids(state: &AppState, names: &[String]) -> Result<Vec<Uuid>, ApiError> {
    let rows: Vec<(Uuid, String)> = sqlx::query_as("SELECT id, name FROM sectors")
        .fetch_all(&state.db)
        .await?;

    let wanted: HashSet<String> = names.iter().map(|n| normalize_sector_name(n)).collect();

    Ok(rows
        .into_iter()
        .filter(|(_, name)| wanted.contains(&normalize_sector_name(name)))
        .map(|(id, _)| id)
        .collect())
}
