//! Notification service
//!
//! Writes in-app notification rows when the approval workflow changes an
//! admin's standing. Email delivery is owned by an external system.

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::notifications::NotificationKind;

/// Create a notification for an admin
pub async fn create_notification(
    db: &PgPool,
    admin_id: Uuid,
    kind: NotificationKind,
    title: &str,
    message: Option<&str>,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    let kind_str = kind.to_string();

    sqlx::query(
        r#"
        INSERT INTO notifications (id, admin_id, kind, title, message)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(admin_id)
    .bind(&kind_str)
    .bind(title)
    .bind(message)
    .execute(db)
    .await?;

    tracing::info!(
        admin_id = %admin_id,
        kind = %kind_str,
        notification_id = %id,
        "Notification created"
    );

    Ok(id)
}

/// Notify an admin that their account was approved
pub async fn notify_admin_approved(db: &PgPool, admin_id: Uuid) -> Result<Uuid, sqlx::Error> {
    create_notification(
        db,
        admin_id,
        NotificationKind::AccountApproved,
        "Your admin account has been approved",
        Some("You can now manage MSME records for your assigned sector."),
    )
    .await
}

/// Notify an admin that their account was rejected
pub async fn notify_admin_rejected(
    db: &PgPool,
    admin_id: Uuid,
    reason: Option<&str>,
) -> Result<Uuid, sqlx::Error> {
    create_notification(
        db,
        admin_id,
        NotificationKind::AccountRejected,
        "Your admin registration was rejected",
        reason,
    )
    .await
}
