//! Broker-facing side of the notification pipeline: connection lifecycle,
//! subscription, delivery settlement, and fixed-delay reconnection.

pub mod consumer;
