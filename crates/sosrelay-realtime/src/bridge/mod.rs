//! Bridges between the system-of-record and the room hub.

pub mod assignment;
pub mod de;
pub mod event_bridge;
pub mod ingress;
pub mod relay;

pub use event_bridge::{EventBridge, IngressReceipt};
pub use ingress::IngressEvent;
pub use relay::{RecordClient, RecordRelay, RelayResponse};
