//! Session and guard routes
//!
//! The session endpoint resolves the caller's provider identity to the
//! application-level admin record; the guard endpoint computes the access
//! decision for a requested admin path.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::auth::{AdminIdentity, RequireAuth};
use crate::domain::admins::AdminWithSectors;
use crate::error::ApiError;
use crate::guard::{decide, GuardDecision};
use crate::routes::admins::attach_sectors;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: SessionUser,
    /// Present when the caller has an application-level admin record.
    pub admin: Option<AdminWithSectors>,
    pub expires_at: i64,
}

/// GET /auth/session
///
/// Resolve the caller's identity and role. Pending admins see their own
/// record here (with flags) even though functional routes reject them.
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let admin = sqlx::query_as::<_, AdminIdentity>(
        r#"
        SELECT id, email, display_name, is_superadmin, is_pending, is_active,
               email_verified, created_at, updated_at
        FROM admins
        WHERE id = $1
        "#,
    )
    .bind(auth.user_id)
    .fetch_optional(&state.db)
    .await?;

    let admin = match admin {
        Some(record) => attach_sectors(&state, vec![record]).await?.pop(),
        None => None,
    };

    let session = SessionResponse {
        user: SessionUser {
            id: auth.user_id,
            email: auth.email.clone(),
        },
        admin,
        expires_at: auth.claims().exp,
    };

    Ok(Json(DataResponse::new(session)))
}

#[derive(Debug, Deserialize)]
pub struct GuardQuery {
    pub path: String,
}

/// GET /auth/guard?path=
///
/// Evaluate the sector access guard for the caller against a path. An
/// unauthenticated or unknown caller gets the login redirect rather than
/// a 401, mirroring what the page guard renders.
pub async fn check_guard(
    State(state): State<Arc<AppState>>,
    auth: Option<RequireAuth>,
    Query(query): Query<GuardQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(auth) = auth else {
        return Ok(Json(decide(None, &query.path)));
    };

    let admin = sqlx::query_as::<_, AdminIdentity>(
        r#"
        SELECT id, email, display_name, is_superadmin, is_pending, is_active,
               email_verified, created_at, updated_at
        FROM admins
        WHERE id = $1
        "#,
    )
    .bind(auth.user_id)
    .fetch_optional(&state.db)
    .await?;

    let Some(admin) = admin else {
        return Ok(Json(decide(None, &query.path)));
    };

    let guard = state.guards.guard_for(admin.id);
    let decision: GuardDecision = guard
        .evaluate(&state.db, &state.cache, Some(&admin), &query.path)
        .await;

    Ok(Json(decision))
}
