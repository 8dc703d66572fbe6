//! Read-only query API over persisted booking notifications.

pub mod routes;
pub mod state;
