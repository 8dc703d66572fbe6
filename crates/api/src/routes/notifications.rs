//! Read-only notification query routes.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use bookpulse_common::error::AppError;
use bookpulse_common::types::{BookingStatus, NotificationRecord};
use bookpulse_engine::store::NotificationStore;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/pending", get(latest_pending))
        .route("/api/notifications/user/{user_id}", get(by_user))
        .route("/api/notifications/booking/{booking_id}", get(by_booking))
        .route("/api/notifications/status/{status}", get(by_status))
}

/// GET /api/notifications — All notifications, newest-first.
async fn list_notifications(
    State(state): State<AppState>,
) -> Result<Json<Vec<NotificationRecord>>, AppError> {
    let notifications = NotificationStore::get_all(&state.pool).await?;
    Ok(Json(notifications))
}

/// GET /api/notifications/user/:user_id — Notifications for one user.
async fn by_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<NotificationRecord>>, AppError> {
    let notifications = NotificationStore::get_by_user(&state.pool, user_id).await?;
    Ok(Json(notifications))
}

/// GET /api/notifications/booking/:booking_id — Notifications for one booking.
async fn by_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<i64>,
) -> Result<Json<Vec<NotificationRecord>>, AppError> {
    let notifications = NotificationStore::get_by_booking(&state.pool, booking_id).await?;
    Ok(Json(notifications))
}

/// GET /api/notifications/status/:status — Notifications filtered by booking status.
async fn by_status(
    State(state): State<AppState>,
    Path(status): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let status = BookingStatus::parse(&status.to_uppercase())
        .ok_or_else(|| AppError::Validation(format!("Invalid status '{}'", status)))?;

    let notifications = NotificationStore::get_by_status(&state.pool, status).await?;

    Ok(Json(json!({
        "status": "success",
        "count": notifications.len(),
        "status_type": status.to_string(),
        "notifications": notifications,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

#[derive(Debug, Deserialize)]
struct PendingQuery {
    limit: Option<usize>,
}

/// GET /api/notifications/pending?limit=N — Latest PENDING notifications.
async fn latest_pending(
    State(state): State<AppState>,
    Query(query): Query<PendingQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let limit = query.limit.unwrap_or(10);

    let pending = NotificationStore::get_by_status(&state.pool, BookingStatus::Pending).await?;
    let total_pending = pending.len();
    let limited: Vec<_> = pending.into_iter().take(limit).collect();

    Ok(Json(json!({
        "status": "success",
        "count": limited.len(),
        "total_pending": total_pending,
        "limit": limit,
        "notifications": limited,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}
