//! Booking notification pipeline: normalization, validation, persistence,
//! and channel dispatch.

pub mod dispatch;
pub mod error;
pub mod normalizer;
pub mod processor;
pub mod store;
