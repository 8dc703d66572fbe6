//! Message normalization — turns an opaque byte payload into a
//! structurally-complete candidate record.
//!
//! Decoding can fail (malformed payload); coercion never does. Every field
//! gets the most complete value the payload allows: numeric strings parse to
//! numbers, absent or unparseable numerics become 0, absent strings become
//! empty, absent enums take their default, and a missing timestamp is
//! generated on the spot. Which numeric fields were actually present is
//! tracked so validation can tell a missing field from a legitimate zero.

use chrono::Utc;
use serde_json::{Map, Value};

use bookpulse_common::types::{BookingStatus, ChannelKind, NewNotification};

use crate::error::ProcessError;

/// A coerced candidate record plus the payload presence needed for validation.
#[derive(Debug, Clone)]
pub struct NormalizedMessage {
    pub record: NewNotification,
    present: NumericPresence,
}

#[derive(Debug, Clone, Copy)]
struct NumericPresence {
    booking_id: bool,
    user_id: bool,
    tickets: bool,
    total_price: bool,
}

impl NormalizedMessage {
    /// Required business fields that are missing from the payload or empty
    /// after coercion.
    ///
    /// A numeric field that was present — even one coerced to 0 from an
    /// unparseable value — is not reported; string fields are reported when
    /// they coerced to empty. `status` always has a value after
    /// normalization and never appears here.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.present.booking_id {
            missing.push("booking_id");
        }
        if !self.present.user_id {
            missing.push("user_id");
        }
        if self.record.user_email.is_empty() {
            missing.push("user_email");
        }
        if self.record.event_id.is_empty() {
            missing.push("event_id");
        }
        if self.record.event_name.is_empty() {
            missing.push("event_name");
        }
        if !self.present.tickets {
            missing.push("tickets");
        }
        if !self.present.total_price {
            missing.push("total_price");
        }
        missing
    }
}

/// Decode and coerce a raw queue payload into a candidate record.
pub fn normalize(payload: &[u8]) -> Result<NormalizedMessage, ProcessError> {
    let value: Value = serde_json::from_slice(payload)
        .map_err(|e| ProcessError::MalformedPayload(e.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(ProcessError::MalformedPayload(
            "payload is not a JSON object".to_string(),
        ));
    };

    let (booking_id, has_booking_id) = coerce_int(&fields, "booking_id");
    let (user_id, has_user_id) = coerce_int(&fields, "user_id");
    let (tickets, has_tickets) = coerce_int(&fields, "tickets");
    let (total_price, has_total_price) = coerce_float(&fields, "total_price");

    let record = NewNotification {
        booking_id,
        user_id,
        user_email: coerce_string(&fields, "user_email"),
        event_id: coerce_string(&fields, "event_id"),
        event_name: coerce_string(&fields, "event_name"),
        tickets,
        total_price,
        status: fields
            .get("status")
            .and_then(Value::as_str)
            .and_then(BookingStatus::parse)
            .unwrap_or_default(),
        notification_type: fields
            .get("notification_type")
            .and_then(Value::as_str)
            .and_then(ChannelKind::parse)
            .unwrap_or_default(),
        timestamp: fields
            .get("timestamp")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| Utc::now().to_rfc3339()),
    };

    Ok(NormalizedMessage {
        record,
        present: NumericPresence {
            booking_id: has_booking_id,
            user_id: has_user_id,
            tickets: has_tickets,
            total_price: has_total_price,
        },
    })
}

fn coerce_int(fields: &Map<String, Value>, key: &str) -> (i64, bool) {
    match fields.get(key) {
        None | Some(Value::Null) => (0, false),
        Some(Value::Number(n)) => (
            n.as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or(0),
            true,
        ),
        Some(Value::String(s)) => {
            let s = s.trim();
            let parsed = s
                .parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or(0);
            (parsed, true)
        }
        Some(_) => (0, true),
    }
}

fn coerce_float(fields: &Map<String, Value>, key: &str) -> (f64, bool) {
    match fields.get(key) {
        None | Some(Value::Null) => (0.0, false),
        Some(Value::Number(n)) => (n.as_f64().unwrap_or(0.0), true),
        Some(Value::String(s)) => (s.trim().parse().unwrap_or(0.0), true),
        Some(_) => (0.0, true),
    }
}

fn coerce_string(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize_json(value: serde_json::Value) -> NormalizedMessage {
        normalize(value.to_string().as_bytes()).unwrap()
    }

    fn complete_message() -> serde_json::Value {
        json!({
            "booking_id": 1,
            "user_id": 2,
            "user_email": "a@b.com",
            "event_id": "e1",
            "event_name": "Concert",
            "tickets": 2,
            "total_price": 50.5,
            "status": "CONFIRMED",
            "notification_type": "EMAIL",
            "timestamp": "2024-06-01T12:00:00Z"
        })
    }

    #[test]
    fn test_complete_message_coerces_all_fields() {
        let msg = normalize_json(complete_message());
        assert_eq!(msg.record.booking_id, 1);
        assert_eq!(msg.record.user_id, 2);
        assert_eq!(msg.record.user_email, "a@b.com");
        assert_eq!(msg.record.event_id, "e1");
        assert_eq!(msg.record.event_name, "Concert");
        assert_eq!(msg.record.tickets, 2);
        assert_eq!(msg.record.total_price, 50.5);
        assert_eq!(msg.record.status, BookingStatus::Confirmed);
        assert_eq!(msg.record.notification_type, ChannelKind::Email);
        assert!(msg.missing_fields().is_empty());
    }

    #[test]
    fn test_numeric_strings_normalize_like_numbers() {
        let mut as_strings = complete_message();
        as_strings["booking_id"] = json!("1");
        as_strings["user_id"] = json!("2");
        as_strings["tickets"] = json!("2");
        as_strings["total_price"] = json!("50.5");

        let from_strings = normalize_json(as_strings);
        let from_numbers = normalize_json(complete_message());
        assert_eq!(from_strings.record, from_numbers.record);
    }

    #[test]
    fn test_fractional_integer_string_truncates() {
        let mut message = complete_message();
        message["tickets"] = json!("2.9");
        assert_eq!(normalize_json(message).record.tickets, 2);
    }

    #[test]
    fn test_unparseable_payload_is_malformed() {
        let err = normalize(b"{not valid json").unwrap_err();
        assert!(matches!(err, ProcessError::MalformedPayload(_)));
    }

    #[test]
    fn test_non_object_payload_is_malformed() {
        let err = normalize(b"[1, 2, 3]").unwrap_err();
        assert!(matches!(err, ProcessError::MalformedPayload(_)));
    }

    #[test]
    fn test_missing_total_price_is_reported() {
        let mut message = complete_message();
        message.as_object_mut().unwrap().remove("total_price");
        let msg = normalize_json(message);
        assert_eq!(msg.record.total_price, 0.0);
        assert_eq!(msg.missing_fields(), vec!["total_price"]);
    }

    #[test]
    fn test_empty_email_is_reported() {
        let mut message = complete_message();
        message["user_email"] = json!("");
        assert_eq!(normalize_json(message).missing_fields(), vec!["user_email"]);
    }

    #[test]
    fn test_present_zero_numeric_is_not_reported() {
        let mut message = complete_message();
        message["tickets"] = json!(0);
        assert!(normalize_json(message).missing_fields().is_empty());
    }

    #[test]
    fn test_unparseable_numeric_string_coerces_to_zero_but_counts_as_present() {
        let mut message = complete_message();
        message["tickets"] = json!("a few");
        let msg = normalize_json(message);
        assert_eq!(msg.record.tickets, 0);
        assert!(msg.missing_fields().is_empty());
    }

    #[test]
    fn test_null_field_counts_as_missing() {
        let mut message = complete_message();
        message["total_price"] = json!(null);
        assert_eq!(
            normalize_json(message).missing_fields(),
            vec!["total_price"]
        );
    }

    #[test]
    fn test_enum_defaults_applied() {
        let mut message = complete_message();
        message.as_object_mut().unwrap().remove("status");
        message.as_object_mut().unwrap().remove("notification_type");
        let msg = normalize_json(message);
        assert_eq!(msg.record.status, BookingStatus::Pending);
        assert_eq!(msg.record.notification_type, ChannelKind::Email);
    }

    #[test]
    fn test_unknown_enum_values_fall_back_to_default() {
        let mut message = complete_message();
        message["status"] = json!("SHIPPED");
        message["notification_type"] = json!("CARRIER_PIGEON");
        let msg = normalize_json(message);
        assert_eq!(msg.record.status, BookingStatus::Pending);
        assert_eq!(msg.record.notification_type, ChannelKind::Email);
    }

    #[test]
    fn test_missing_timestamp_is_generated() {
        let mut message = complete_message();
        message.as_object_mut().unwrap().remove("timestamp");
        let msg = normalize_json(message);
        assert!(!msg.record.timestamp.is_empty());
    }

    #[test]
    fn test_supplied_timestamp_is_kept() {
        let mut message = complete_message();
        message["timestamp"] = json!("2024-06-01T12:00:00Z");
        assert_eq!(normalize_json(message).record.timestamp, "2024-06-01T12:00:00Z");
    }
}
