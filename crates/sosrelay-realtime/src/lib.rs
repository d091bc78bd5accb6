//! # sosrelay-realtime
//!
//! Real-time room hub for the SOS relay. Provides:
//!
//! - WebSocket session registry with officer unit tracking
//! - Room directory for incident, unit and global channels
//! - Bounded per-incident location history replayed on join
//! - Ingress of system-of-record events into room broadcasts
//! - Relay of client actions to the system-of-record

pub mod bridge;
pub mod connection;
pub mod history;
pub mod message;
pub mod metrics;
pub mod room;
pub mod server;

pub use bridge::event_bridge::EventBridge;
pub use connection::manager::ConnectionManager;
pub use history::HistoryBuffer;
pub use room::RoomDirectory;
pub use server::RealtimeEngine;
