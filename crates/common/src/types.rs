use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking lifecycle status carried on every booking message.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    /// Parse the wire representation. Unknown values yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(BookingStatus::Pending),
            "CONFIRMED" => Some(BookingStatus::Confirmed),
            "CANCELLED" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "PENDING"),
            BookingStatus::Confirmed => write!(f, "CONFIRMED"),
            BookingStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Delivery channel for a notification.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ChannelKind {
    #[default]
    Email,
    Sms,
}

impl ChannelKind {
    /// Parse the wire representation. Unknown values yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "EMAIL" => Some(ChannelKind::Email),
            "SMS" => Some(ChannelKind::Sms),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelKind::Email => write!(f, "EMAIL"),
            ChannelKind::Sms => write!(f, "SMS"),
        }
    }
}

/// A fully-coerced candidate record produced by the normalizer, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNotification {
    pub booking_id: i64,
    pub user_id: i64,
    pub user_email: String,
    pub event_id: String,
    pub event_name: String,
    pub tickets: i64,
    pub total_price: f64,
    pub status: BookingStatus,
    pub notification_type: ChannelKind,
    /// ISO-8601 timestamp from the message, or generated at normalization time.
    pub timestamp: String,
}

/// A persisted booking notification.
///
/// Rows are immutable except for the `sent`/`sent_at` transition, which the
/// processor performs exactly once after a successful dispatch.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NotificationRecord {
    pub id: Uuid,
    pub booking_id: i64,
    pub user_id: i64,
    pub user_email: String,
    pub event_id: String,
    pub event_name: String,
    pub tickets: i64,
    pub total_price: f64,
    pub status: BookingStatus,
    pub notification_type: ChannelKind,
    pub sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub timestamp: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_round_trip() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(BookingStatus::parse(&status.to_string()), Some(status));
        }
        assert_eq!(BookingStatus::parse("confirmed"), None);
        assert_eq!(BookingStatus::parse(""), None);
    }

    #[test]
    fn test_channel_parse_round_trip() {
        for channel in [ChannelKind::Email, ChannelKind::Sms] {
            assert_eq!(ChannelKind::parse(&channel.to_string()), Some(channel));
        }
        assert_eq!(ChannelKind::parse("push"), None);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(BookingStatus::default(), BookingStatus::Pending);
        assert_eq!(ChannelKind::default(), ChannelKind::Email);
    }
}
