//! Notification processing pipeline.
//!
//! Drives each queue message through:
//! 1. Normalize the raw bytes into a candidate record
//! 2. Validate the 8 required business fields
//! 3. Persist the record through the notification store
//! 4. Dispatch CONFIRMED/CANCELLED records and mark them sent
//!
//! Every failure carries its settlement: malformed payloads and validation
//! failures drop the message, transient store/dispatch failures requeue it.

use chrono::Utc;
use sqlx::PgPool;

use bookpulse_common::error::AppError;
use bookpulse_common::types::{BookingStatus, NotificationRecord};

use crate::dispatch::Dispatch;
use crate::error::ProcessError;
use crate::normalizer;
use crate::store::NotificationStore;

/// Orchestration core: validates, persists, and drives dispatch.
pub struct NotificationProcessor<D> {
    pool: PgPool,
    dispatcher: D,
}

impl<D: Dispatch> NotificationProcessor<D> {
    pub fn new(pool: PgPool, dispatcher: D) -> Self {
        Self { pool, dispatcher }
    }

    /// Run one raw queue payload through the full pipeline.
    ///
    /// On success the returned record reflects its final persisted state;
    /// on failure the error's `disposition()` tells the connection manager
    /// how to settle the delivery.
    pub async fn process(&self, payload: &[u8]) -> Result<NotificationRecord, ProcessError> {
        let message = normalizer::normalize(payload)?;

        let missing = message.missing_fields();
        if !missing.is_empty() {
            tracing::warn!(missing = ?missing, "Rejecting message with missing required fields");
            return Err(ProcessError::missing_fields(&missing));
        }

        let mut record = NotificationStore::create(&self.pool, &message.record)
            .await
            .map_err(classify_store_error)?;

        match record.status {
            BookingStatus::Pending => {
                tracing::info!(
                    notification_id = %record.id,
                    "Status is PENDING, no notification sent"
                );
            }
            BookingStatus::Confirmed | BookingStatus::Cancelled => {
                let receipt = self
                    .dispatcher
                    .dispatch(&record)
                    .await
                    .map_err(|e| ProcessError::Transient(e.to_string()))?;

                let sent_at = Utc::now();
                NotificationStore::mark_sent(&self.pool, record.id, sent_at)
                    .await
                    .map_err(classify_store_error)?;
                record.sent = true;
                record.sent_at = Some(sent_at);

                tracing::info!(
                    notification_id = %record.id,
                    message_id = %receipt.message_id,
                    channel = %record.notification_type,
                    "Notification dispatched"
                );
            }
        }

        Ok(record)
    }
}

/// Split store failures at the point of failure: schema rejections (integrity
/// constraint class 23xxx) drop the message, anything else — connectivity,
/// timeout — requeues it.
fn classify_store_error(err: AppError) -> ProcessError {
    match &err {
        AppError::Database(sqlx::Error::Database(db))
            if db.code().is_some_and(|c| c.starts_with("23")) =>
        {
            ProcessError::Validation(format!("store rejected record: {}", db.message()))
        }
        _ => ProcessError::Transient(err.to_string()),
    }
}
