//! HTTP and WebSocket handlers.

pub mod health;
pub mod ingress;
pub mod metrics;
pub mod sessions;
pub mod ws;
