// File: herald-common/src/models/message.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::ids::{ChannelId, GuildId, MessageId, WebhookId};
use crate::models::user::User;

/// A chat message as delivered by the platform. Only the fields the
/// dispatch layer reads are modeled; everything else rides along in
/// `platform_data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub channel_id: ChannelId,
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    pub author: User,
    #[serde(default)]
    pub author_roles: Vec<String>,
    #[serde(default)]
    pub webhook_id: Option<WebhookId>,
    /// `None` for payloads with no text (embed-only posts, system notices).
    #[serde(default)]
    pub content: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Opaque passthrough for platform-specific fields.
    #[serde(default)]
    pub platform_data: Value,
}

/// The message-create gateway payload: the message plus which shard
/// delivered it, when the platform reports one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageCreate {
    pub message: Message,
    #[serde(default)]
    pub shard_id: Option<u32>,
}

impl MessageCreate {
    /// True when a real person wrote this: not a bot account and not
    /// relayed through a webhook.
    pub fn is_human(&self) -> bool {
        !self.message.author.bot && self.message.webhook_id.is_none()
    }
}
