//! Durable persistence for notification records.
//!
//! Create and mark-sent are the only writes the pipeline performs; the read
//! operations back the query API and return records newest-first.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use bookpulse_common::error::AppError;
use bookpulse_common::types::{BookingStatus, NewNotification, NotificationRecord};

/// Persistence operations over the `notifications` table.
pub struct NotificationStore;

impl NotificationStore {
    /// Insert a candidate record. Every record starts unsent.
    pub async fn create(
        pool: &PgPool,
        candidate: &NewNotification,
    ) -> Result<NotificationRecord, AppError> {
        let id = Uuid::new_v4();

        let record: NotificationRecord = sqlx::query_as(
            r#"
            INSERT INTO notifications
                (id, booking_id, user_id, user_email, event_id, event_name,
                 tickets, total_price, status, notification_type, sent, sent_at, "timestamp")
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, false, NULL, $11)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(candidate.booking_id)
        .bind(candidate.user_id)
        .bind(&candidate.user_email)
        .bind(&candidate.event_id)
        .bind(&candidate.event_name)
        .bind(candidate.tickets)
        .bind(candidate.total_price)
        .bind(candidate.status.to_string())
        .bind(candidate.notification_type.to_string())
        .bind(&candidate.timestamp)
        .fetch_one(pool)
        .await?;

        tracing::info!(
            notification_id = %record.id,
            booking_id = record.booking_id,
            status = %record.status,
            "Notification persisted"
        );

        Ok(record)
    }

    /// Record a successful dispatch. Called exactly once per record.
    pub async fn mark_sent(
        pool: &PgPool,
        id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE notifications SET sent = true, sent_at = $2 WHERE id = $1")
            .bind(id)
            .bind(sent_at)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Notification {} not found", id)));
        }

        Ok(())
    }

    /// All notifications, newest-first.
    pub async fn get_all(pool: &PgPool) -> Result<Vec<NotificationRecord>, AppError> {
        let records: Vec<NotificationRecord> =
            sqlx::query_as("SELECT * FROM notifications ORDER BY created_at DESC")
                .fetch_all(pool)
                .await?;

        Ok(records)
    }

    /// Notifications for one user, newest-first.
    pub async fn get_by_user(
        pool: &PgPool,
        user_id: i64,
    ) -> Result<Vec<NotificationRecord>, AppError> {
        let records: Vec<NotificationRecord> = sqlx::query_as(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// Notifications for one booking, newest-first.
    pub async fn get_by_booking(
        pool: &PgPool,
        booking_id: i64,
    ) -> Result<Vec<NotificationRecord>, AppError> {
        let records: Vec<NotificationRecord> = sqlx::query_as(
            "SELECT * FROM notifications WHERE booking_id = $1 ORDER BY created_at DESC",
        )
        .bind(booking_id)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// Notifications with the given booking status, newest-first.
    pub async fn get_by_status(
        pool: &PgPool,
        status: BookingStatus,
    ) -> Result<Vec<NotificationRecord>, AppError> {
        let records: Vec<NotificationRecord> = sqlx::query_as(
            "SELECT * FROM notifications WHERE status = $1 ORDER BY created_at DESC",
        )
        .bind(status.to_string())
        .fetch_all(pool)
        .await?;

        Ok(records)
    }
}
