// File: herald-common/src/traits/platform.rs

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Error;
use crate::models::{ChannelId, EventKind, GatewayEvent, Message, MessageId, User, UserId};

/// One subscription to gateway events. `id` must stay stable for the
/// lifetime of the listener; dispatchers key unsubscription on it.
#[async_trait]
pub trait EventListener: Send + Sync {
    fn id(&self) -> &str;

    async fn on_event(&self, event: GatewayEvent) -> Result<(), Error>;
}

/// The event-subscription surface of the platform client.
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    async fn subscribe(
        &self,
        kind: EventKind,
        listener: Arc<dyn EventListener>,
    ) -> Result<(), Error>;

    async fn unsubscribe(&self, kind: EventKind, listener_id: &str) -> Result<(), Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RestClient: Send + Sync {
    async fn send_message(&self, channel_id: ChannelId, content: &str) -> Result<Message, Error>;

    /// The account the platform client is logged in as.
    async fn current_user(&self) -> Result<User, Error>;
}

pub trait ShardInfo: Send + Sync {
    fn shard_count(&self) -> u32;

    fn latency(&self, shard_id: u32) -> Option<Duration>;
}

/// Read-only view over whatever the platform client caches. Every
/// accessor may miss; callers fall back to REST.
pub trait CacheView: Send + Sync {
    fn current_user(&self) -> Option<User>;

    fn user(&self, id: UserId) -> Option<User>;

    fn message(&self, id: MessageId) -> Option<Message>;
}

/// The aggregate handle an application hands to the dispatch layer.
/// Only the event dispatcher is mandatory; the rest of the capability
/// set defaults to absent and can be supplied piecemeal instead.
pub trait PlatformClient: Send + Sync {
    fn event_dispatcher(&self) -> Arc<dyn EventDispatcher>;

    fn rest(&self) -> Option<Arc<dyn RestClient>> {
        None
    }

    fn shards(&self) -> Option<Arc<dyn ShardInfo>> {
        None
    }

    fn cache(&self) -> Option<Arc<dyn CacheView>> {
        None
    }
}
