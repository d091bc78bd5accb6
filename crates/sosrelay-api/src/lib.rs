//! # sosrelay-api
//!
//! HTTP layer for the SOS relay built on Axum.
//!
//! Provides the WebSocket upgrade, the system-of-record ingress endpoint,
//! health and metrics endpoints, middleware (CORS, logging), DTOs, and
//! error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use error::ApiError;
pub use state::AppState;
