// File: herald-common/src/models/mod.rs
pub mod event;
pub mod ids;
pub mod message;
pub mod user;

pub use event::{EventKind, GatewayEvent};
pub use ids::{ChannelId, GuildId, Mention, MessageId, UserId, WebhookId};
pub use message::{Message, MessageCreate};
pub use user::User;
