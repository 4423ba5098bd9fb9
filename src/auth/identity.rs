//! Application-level admin identity resolution.
//!
//! The auth provider knows who the caller is; the `admins` table knows what
//! they are allowed to do. These extractors bridge the two.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::RequireAuth;
use crate::app::AppState;
use crate::error::ErrorResponse;

/// Admin record resolved from the `admins` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdminIdentity {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub is_superadmin: bool,
    pub is_pending: bool,
    pub is_active: bool,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Extractor requiring an approved, active admin.
///
/// A non-superadmin with `is_pending` set is denied functional access until
/// approved by the superadmin.
#[derive(Debug, Clone)]
pub struct RequireAdmin {
    pub auth: RequireAuth,
    pub admin: AdminIdentity,
}

impl RequireAdmin {
    pub fn admin_id(&self) -> Uuid {
        self.admin.id
    }
}

/// Extractor requiring the superadmin role.
#[derive(Debug, Clone)]
pub struct RequireSuperadmin(pub RequireAdmin);

impl std::ops::Deref for RequireSuperadmin {
    type Target = RequireAdmin;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug)]
pub enum AdminAuthError {
    NotAuthenticated,
    NotAnAdmin,
    PendingApproval,
    Inactive,
    NotSuperadmin,
    DatabaseError(String),
}

impl IntoResponse for AdminAuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AdminAuthError::NotAuthenticated => {
                (StatusCode::UNAUTHORIZED, "Authentication required")
            }
            AdminAuthError::NotAnAdmin => (StatusCode::FORBIDDEN, "No admin record for this user"),
            AdminAuthError::PendingApproval => {
                (StatusCode::FORBIDDEN, "Admin account awaiting approval")
            }
            AdminAuthError::Inactive => (StatusCode::FORBIDDEN, "Admin account is inactive"),
            AdminAuthError::NotSuperadmin => {
                (StatusCode::FORBIDDEN, "Superadmin privileges required")
            }
            AdminAuthError::DatabaseError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = ErrorResponse {
            code: match status {
                StatusCode::UNAUTHORIZED => "UNAUTHORIZED".to_string(),
                StatusCode::FORBIDDEN => "FORBIDDEN".to_string(),
                _ => "INTERNAL_ERROR".to_string(),
            },
            message: message.to_string(),
            request_id: None,
        };

        (status, Json(body)).into_response()
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AdminAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth = RequireAuth::from_request_parts(parts, state)
            .await
            .map_err(|_| AdminAuthError::NotAuthenticated)?;

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
        .await
        .map_err(|e| AdminAuthError::DatabaseError(e.to_string()))?
        .ok_or(AdminAuthError::NotAnAdmin)?;

        // Superadmin bypasses the approval workflow entirely
        if !admin.is_superadmin {
            if admin.is_pending {
                tracing::warn!(admin_id = %admin.id, "Pending admin attempted functional access");
                return Err(AdminAuthError::PendingApproval);
            }
            if !admin.is_active {
                tracing::warn!(admin_id = %admin.id, "Inactive admin attempted access");
                return Err(AdminAuthError::Inactive);
            }
        }

        Ok(RequireAdmin { auth, admin })
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireSuperadmin {
    type Rejection = AdminAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let admin = RequireAdmin::from_request_parts(parts, state).await?;

        if !admin.admin.is_superadmin {
            tracing::warn!(
                admin_id = %admin.admin.id,
                "Non-superadmin attempted a superadmin route"
            );
            return Err(AdminAuthError::NotSuperadmin);
        }

        Ok(RequireSuperadmin(admin))
    }
}
