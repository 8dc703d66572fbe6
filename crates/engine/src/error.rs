//! Message-level error taxonomy for the notification pipeline.
//!
//! Every failure is tagged with its variant at the point where it occurs;
//! the connection manager settles the broker message from the variant alone,
//! never from error class names.

use thiserror::Error;

/// How the connection manager settles a broker message after processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Remove the message from the queue (processed).
    Ack,
    /// Remove the message from the queue without retry (accepted data loss).
    Drop,
    /// Return the message to the queue for immediate redelivery.
    Requeue,
}

/// A failure while processing a single queue message.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The payload could not be parsed as a JSON object. No record is created.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A required business field is missing, or the store rejected the record.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Store or dispatch failure worth retrying (connectivity, timeout).
    #[error("transient failure: {0}")]
    Transient(String),
}

impl ProcessError {
    pub fn missing_fields(fields: &[&str]) -> Self {
        Self::Validation(format!("missing required fields: {}", fields.join(", ")))
    }

    /// Settlement for this failure.
    pub fn disposition(&self) -> Disposition {
        match self {
            Self::MalformedPayload(_) | Self::Validation(_) => Disposition::Drop,
            Self::Transient(_) => Disposition::Requeue,
        }
    }
}

/// A channel dispatcher failed to produce a receipt.
#[derive(Debug, Error)]
#[error("dispatch failed: {0}")]
pub struct DispatchError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_mapping() {
        assert_eq!(
            ProcessError::MalformedPayload("bad json".into()).disposition(),
            Disposition::Drop
        );
        assert_eq!(
            ProcessError::Validation("missing".into()).disposition(),
            Disposition::Drop
        );
        assert_eq!(
            ProcessError::Transient("timeout".into()).disposition(),
            Disposition::Requeue
        );
    }

    #[test]
    fn test_missing_fields_message_lists_names() {
        let err = ProcessError::missing_fields(&["user_email", "total_price"]);
        assert_eq!(
            err.to_string(),
            "validation failed: missing required fields: user_email, total_price"
        );
    }
}
