//! Notification routes

use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::response::{DataResponse, MessageResponse};
use crate::app::AppState;
use crate::auth::RequireAdmin;
use crate::domain::notifications::Notification;
use crate::error::ApiError;

/// GET /notifications
///
/// The caller's notifications, newest first.
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    admin: RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    let notifications = sqlx::query_as::<_, Notification>(
        r#"
        SELECT id, admin_id, kind, title, message, read, created_at
        FROM notifications
        WHERE admin_id = $1
        ORDER BY created_at DESC
        LIMIT 50
        "#,
    )
    .bind(admin.admin_id())
    .fetch_all(&state.db)
    .await?;

    Ok(Json(DataResponse::new(notifications)))
}

/// POST /notifications/read
///
/// Mark all of the caller's notifications as read.
pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    admin: RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    sqlx::query("UPDATE notifications SET read = true WHERE admin_id = $1 AND NOT read")
        .bind(admin.admin_id())
        .execute(&state.db)
        .await?;

    Ok(Json(MessageResponse::new("Notifications marked read")))
}
