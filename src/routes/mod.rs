pub mod admins;
pub mod analytics;
pub mod health;
pub mod msmes;
pub mod notifications;
pub mod sectors;
pub mod session;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        // Session / guard
        .route("/auth/session", get(session::get_session))
        .route("/auth/guard", get(session::check_guard))
        // Admin management
        .route(
            "/admins",
            get(admins::list_active_admins).post(admins::register_admin),
        )
        .route("/admins/pending", get(admins::list_pending_admins))
        .route("/admins/:id/approve", post(admins::approve_admin))
        .route("/admins/:id/reject", post(admins::reject_admin))
        .route("/admins/:id", delete(admins::delete_admin))
        // MSME directory
        .route("/msmes", get(msmes::list_msmes).post(msmes::create_msme))
        .route("/msmes/search", get(msmes::search_msmes))
        .route("/msmes/check-duplicate", post(msmes::check_duplicate))
        .route("/msmes/sector/:sector", get(msmes::list_msmes_by_sector))
        .route(
            "/msmes/:id",
            get(msmes::get_msme)
                .put(msmes::update_msme)
                .delete(msmes::delete_msme),
        )
        // Sector taxonomy
        .route(
            "/sectors",
            get(sectors::list_sectors).post(sectors::create_sector),
        )
        .route("/sectors/by-name/:sector", get(sectors::get_sector_by_name))
        .route(
            "/sectors/:id",
            get(sectors::get_sector)
                .put(sectors::update_sector)
                .delete(sectors::delete_sector),
        )
        // Analytics
        .route("/analytics/visits", post(analytics::record_visit))
        .route("/analytics/exports", post(analytics::record_exports))
        .route("/analytics/top-visited", get(analytics::top_visited))
        .route("/analytics/most-exported", get(analytics::most_exported))
        .route("/analytics/sector-summary", get(analytics::sector_summary))
        // Notifications
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/read", post(notifications::mark_all_read))
}
