// File: herald-common/src/models/event.rs

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::message::MessageCreate;

/// The gateway events the dispatch layer consumes. Extend this enum
/// as more of the platform surface gets routed through it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GatewayEvent {
    MessageCreate(MessageCreate),
    /// The platform client is starting up.
    Starting,
    /// The platform client is shutting down.
    Stopping,
}

impl GatewayEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GatewayEvent::MessageCreate(_) => EventKind::MessageCreate,
            GatewayEvent::Starting => EventKind::Starting,
            GatewayEvent::Stopping => EventKind::Stopping,
        }
    }
}

/// Subscription key for one gateway event shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    MessageCreate,
    Starting,
    Stopping,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::MessageCreate => write!(f, "message_create"),
            EventKind::Starting => write!(f, "starting"),
            EventKind::Stopping => write!(f, "stopping"),
        }
    }
}
