//! Channel dispatchers — the {Email, SMS} capability set.
//!
//! `Dispatch` is the seam the processor drives: a dispatcher either returns a
//! receipt or fails, never partially succeeds. The reference dispatchers
//! format the full customer-facing message and log delivery intent; actual
//! transport is an external collaborator behind this contract.

use async_trait::async_trait;
use uuid::Uuid;

use bookpulse_common::types::{BookingStatus, ChannelKind, NotificationRecord};

use crate::error::DispatchError;

/// Receipt returned by a successful dispatch: an opaque identifier plus
/// status text.
#[derive(Debug, Clone)]
pub struct DispatchReceipt {
    pub message_id: String,
    pub status: String,
}

#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn dispatch(&self, record: &NotificationRecord)
    -> Result<DispatchReceipt, DispatchError>;
}

/// Routes each record to the dispatcher for its notification channel.
pub struct ChannelRouter {
    email: EmailDispatcher,
    sms: SmsDispatcher,
}

impl ChannelRouter {
    pub fn new() -> Self {
        Self {
            email: EmailDispatcher,
            sms: SmsDispatcher,
        }
    }
}

impl Default for ChannelRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Dispatch for ChannelRouter {
    async fn dispatch(
        &self,
        record: &NotificationRecord,
    ) -> Result<DispatchReceipt, DispatchError> {
        match record.notification_type {
            ChannelKind::Email => self.email.dispatch(record).await,
            ChannelKind::Sms => self.sms.dispatch(record).await,
        }
    }
}

pub struct EmailDispatcher;

impl EmailDispatcher {
    fn subject(record: &NotificationRecord) -> String {
        match record.status {
            BookingStatus::Confirmed => {
                format!("Your Booking Confirmation #{}", record.booking_id)
            }
            BookingStatus::Cancelled => {
                format!("Your Booking Cancellation #{}", record.booking_id)
            }
            BookingStatus::Pending => format!("Your Booking #{}", record.booking_id),
        }
    }

    fn body(record: &NotificationRecord) -> String {
        let (headline, footer) = match record.status {
            BookingStatus::Cancelled => (
                format!("Your booking for {} has been cancelled.", record.event_name),
                "If you did not request this cancellation, please contact our support team.",
            ),
            _ => (
                format!("Your booking for {} has been confirmed.", record.event_name),
                "Thank you for your booking!",
            ),
        };

        format!(
            "Dear Customer,\n\n\
             {headline}\n\n\
             Booking Details:\n\
             - Booking ID: {}\n\
             - Event: {}\n\
             - Tickets: {}\n\
             - Total Price: ${:.2}\n\n\
             {footer}\n\n\
             Best regards,\n\
             The Event Booking Team",
            record.booking_id, record.event_name, record.tickets, record.total_price,
        )
    }
}

#[async_trait]
impl Dispatch for EmailDispatcher {
    async fn dispatch(
        &self,
        record: &NotificationRecord,
    ) -> Result<DispatchReceipt, DispatchError> {
        if record.status == BookingStatus::Pending {
            return Err(DispatchError(
                "PENDING notifications are never dispatched".to_string(),
            ));
        }

        let subject = Self::subject(record);
        tracing::info!(
            to = %record.user_email,
            subject = %subject,
            body = %Self::body(record),
            "Sending email notification"
        );

        Ok(DispatchReceipt {
            message_id: format!("email-{}", Uuid::new_v4()),
            status: "email notification logged".to_string(),
        })
    }
}

pub struct SmsDispatcher;

impl SmsDispatcher {
    fn body(record: &NotificationRecord) -> String {
        match record.status {
            BookingStatus::Cancelled => format!(
                "Your booking #{} for {} has been cancelled. \
                 If you did not request this cancellation, please contact our support team.",
                record.booking_id, record.event_name,
            ),
            _ => format!(
                "Your booking #{} for {} has been confirmed. Tickets: {}, Total: ${:.2}",
                record.booking_id, record.event_name, record.tickets, record.total_price,
            ),
        }
    }
}

#[async_trait]
impl Dispatch for SmsDispatcher {
    async fn dispatch(
        &self,
        record: &NotificationRecord,
    ) -> Result<DispatchReceipt, DispatchError> {
        if record.status == BookingStatus::Pending {
            return Err(DispatchError(
                "PENDING notifications are never dispatched".to_string(),
            ));
        }

        tracing::info!(
            user_id = record.user_id,
            body = %Self::body(record),
            "Sending SMS notification"
        );

        Ok(DispatchReceipt {
            message_id: format!("sms-{}", Uuid::new_v4()),
            status: "SMS notification logged".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_record(status: BookingStatus, channel: ChannelKind) -> NotificationRecord {
        NotificationRecord {
            id: Uuid::new_v4(),
            booking_id: 7,
            user_id: 3,
            user_email: "a@b.com".to_string(),
            event_id: "e1".to_string(),
            event_name: "Concert".to_string(),
            tickets: 2,
            total_price: 50.5,
            status,
            notification_type: channel,
            sent: false,
            sent_at: None,
            timestamp: Utc::now().to_rfc3339(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_email_dispatch_returns_receipt() {
        let record = make_record(BookingStatus::Confirmed, ChannelKind::Email);
        let receipt = EmailDispatcher.dispatch(&record).await.unwrap();
        assert!(receipt.message_id.starts_with("email-"));
    }

    #[tokio::test]
    async fn test_sms_dispatch_returns_receipt() {
        let record = make_record(BookingStatus::Cancelled, ChannelKind::Sms);
        let receipt = SmsDispatcher.dispatch(&record).await.unwrap();
        assert!(receipt.message_id.starts_with("sms-"));
    }

    #[tokio::test]
    async fn test_router_selects_channel() {
        let router = ChannelRouter::new();

        let email = make_record(BookingStatus::Confirmed, ChannelKind::Email);
        let receipt = router.dispatch(&email).await.unwrap();
        assert!(receipt.message_id.starts_with("email-"));

        let sms = make_record(BookingStatus::Confirmed, ChannelKind::Sms);
        let receipt = router.dispatch(&sms).await.unwrap();
        assert!(receipt.message_id.starts_with("sms-"));
    }

    #[tokio::test]
    async fn test_pending_records_are_refused() {
        let record = make_record(BookingStatus::Pending, ChannelKind::Email);
        assert!(EmailDispatcher.dispatch(&record).await.is_err());
    }

    #[test]
    fn test_email_body_mentions_booking_details() {
        let record = make_record(BookingStatus::Confirmed, ChannelKind::Email);
        let body = EmailDispatcher::body(&record);
        assert!(body.contains("Booking ID: 7"));
        assert!(body.contains("Event: Concert"));
        assert!(body.contains("Tickets: 2"));
        assert!(body.contains("$50.50"));
    }

    #[test]
    fn test_cancellation_email_mentions_support() {
        let record = make_record(BookingStatus::Cancelled, ChannelKind::Email);
        let body = EmailDispatcher::body(&record);
        assert!(body.contains("has been cancelled"));
        assert!(body.contains("contact our support team"));
    }
}
