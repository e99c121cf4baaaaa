//! WebSocket Subscription Gateway
//!
//! Long-lived connections that authenticate at connect time and stream
//! chat message events to authorized subscribers.

pub mod handler;
pub mod protocol;
pub mod session;

pub use handler::ws_handler;
pub use protocol::{extract_token, ClientFrame, GatewayErrorCode, ServerFrame};
pub use session::ConnectionSession;
