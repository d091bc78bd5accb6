//! WebSocket connection management: session registry, handles, heartbeat.

pub mod handle;
pub mod heartbeat;
pub mod manager;
pub mod pool;

pub use handle::{ConnectionHandle, Delivery, SessionInfo, SessionRole};
pub use manager::ConnectionManager;
pub use pool::ConnectionPool;
