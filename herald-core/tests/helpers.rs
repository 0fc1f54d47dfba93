// tests/helpers.rs (shared fakes for the integration suites)
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use herald_common::models::{
    ChannelId, EventKind, GatewayEvent, GuildId, Message, MessageCreate, MessageId, User, UserId,
    WebhookId,
};
use herald_common::traits::{
    CacheView, EventDispatcher, EventListener, PlatformClient, RestClient, ShardInfo,
};
use herald_common::Error;
use herald_core::hooks::Hooks;
use herald_core::{ClientHandle, Component, Context, FoundCommand};

pub const TEST_CHANNEL: ChannelId = ChannelId(77);

// ---------- dispatcher ----------

/// In-process dispatcher that records every subscription change and
/// hands publish results back to the test.
pub struct RecordingDispatcher {
    listeners: RwLock<HashMap<EventKind, Vec<Arc<dyn EventListener>>>>,
    pub subscriptions: Mutex<Vec<(EventKind, String)>>,
    pub unsubscriptions: Mutex<Vec<(EventKind, String)>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            subscriptions: Mutex::new(Vec::new()),
            unsubscriptions: Mutex::new(Vec::new()),
        }
    }

    pub async fn publish(&self, event: GatewayEvent) -> Vec<Result<(), Error>> {
        let targets = {
            let listeners = self.listeners.read().await;
            listeners.get(&event.kind()).cloned().unwrap_or_default()
        };
        let mut results = Vec::new();
        for listener in targets {
            results.push(listener.on_event(event.clone()).await);
        }
        results
    }

    pub async fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.read().await.get(&kind).map_or(0, Vec::len)
    }
}

#[async_trait]
impl EventDispatcher for RecordingDispatcher {
    async fn subscribe(
        &self,
        kind: EventKind,
        listener: Arc<dyn EventListener>,
    ) -> Result<(), Error> {
        self.subscriptions
            .lock()
            .await
            .push((kind, listener.id().to_string()));
        let mut listeners = self.listeners.write().await;
        listeners.entry(kind).or_default().push(listener);
        Ok(())
    }

    async fn unsubscribe(&self, kind: EventKind, listener_id: &str) -> Result<(), Error> {
        self.unsubscriptions
            .lock()
            .await
            .push((kind, listener_id.to_string()));
        let mut listeners = self.listeners.write().await;
        if let Some(subs) = listeners.get_mut(&kind) {
            subs.retain(|l| l.id() != listener_id);
        }
        Ok(())
    }
}

// ---------- rest / shards / cache ----------

/// Records outbound messages and answers `current_user` with the
/// configured bot account.
pub struct ScriptedRest {
    bot: User,
    pub sent: Mutex<Vec<(ChannelId, String)>>,
}

impl ScriptedRest {
    pub fn new(bot: User) -> Self {
        Self {
            bot,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub async fn sent_lines(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .map(|(_, line)| line.clone())
            .collect()
    }
}

#[async_trait]
impl RestClient for ScriptedRest {
    async fn send_message(&self, channel_id: ChannelId, content: &str) -> Result<Message, Error> {
        self.sent
            .lock()
            .await
            .push((channel_id, content.to_string()));
        Ok(base_message(999_999, &self.bot, Some(content)))
    }

    async fn current_user(&self) -> Result<User, Error> {
        Ok(self.bot.clone())
    }
}

pub struct StaticShards;

impl ShardInfo for StaticShards {
    fn shard_count(&self) -> u32 {
        2
    }

    fn latency(&self, shard_id: u32) -> Option<Duration> {
        (shard_id < 2).then(|| Duration::from_millis(30))
    }
}

pub struct MemoryCache {
    pub current: Option<User>,
    pub users: HashMap<UserId, User>,
}

impl MemoryCache {
    pub fn with_current_user(user: User) -> Self {
        Self {
            current: Some(user),
            users: HashMap::new(),
        }
    }
}

impl CacheView for MemoryCache {
    fn current_user(&self) -> Option<User> {
        self.current.clone()
    }

    fn user(&self, id: UserId) -> Option<User> {
        self.users.get(&id).cloned()
    }

    fn message(&self, _id: MessageId) -> Option<Message> {
        None
    }
}

// ---------- platform aggregate ----------

pub struct TestPlatform {
    pub dispatch: Arc<RecordingDispatcher>,
    pub rest: Option<Arc<ScriptedRest>>,
    pub shards: Option<Arc<StaticShards>>,
    pub cache: Option<Arc<MemoryCache>>,
}

impl PlatformClient for TestPlatform {
    fn event_dispatcher(&self) -> Arc<dyn EventDispatcher> {
        self.dispatch.clone()
    }

    fn rest(&self) -> Option<Arc<dyn RestClient>> {
        self.rest.clone().map(|r| r as Arc<dyn RestClient>)
    }

    fn shards(&self) -> Option<Arc<dyn ShardInfo>> {
        self.shards.clone().map(|s| s as Arc<dyn ShardInfo>)
    }

    fn cache(&self) -> Option<Arc<dyn CacheView>> {
        self.cache.clone().map(|c| c as Arc<dyn CacheView>)
    }
}

/// Dispatcher + REST + shards, no cache.
pub fn full_platform() -> (Arc<RecordingDispatcher>, Arc<ScriptedRest>, Arc<TestPlatform>) {
    let dispatch = Arc::new(RecordingDispatcher::new());
    let rest = Arc::new(ScriptedRest::new(bot_user()));
    let platform = Arc::new(TestPlatform {
        dispatch: dispatch.clone(),
        rest: Some(rest.clone()),
        shards: Some(Arc::new(StaticShards)),
        cache: None,
    });
    (dispatch, rest, platform)
}

/// Same as [`full_platform`] but with a cache that knows the bot user.
pub fn cached_platform() -> (Arc<RecordingDispatcher>, Arc<ScriptedRest>, Arc<TestPlatform>) {
    let dispatch = Arc::new(RecordingDispatcher::new());
    let rest = Arc::new(ScriptedRest::new(bot_user()));
    let platform = Arc::new(TestPlatform {
        dispatch: dispatch.clone(),
        rest: Some(rest.clone()),
        shards: Some(Arc::new(StaticShards)),
        cache: Some(Arc::new(MemoryCache::with_current_user(bot_user()))),
    });
    (dispatch, rest, platform)
}

// ---------- users and messages ----------

pub fn bot_user() -> User {
    User::new(UserId(100), "herald", true)
}

pub fn human(id: u64, name: &str) -> User {
    User::new(UserId(id), name, false)
}

fn base_message(id: u64, author: &User, content: Option<&str>) -> Message {
    Message {
        id: MessageId(id),
        channel_id: TEST_CHANNEL,
        guild_id: Some(GuildId(1)),
        author: author.clone(),
        author_roles: vec![],
        webhook_id: None,
        content: content.map(str::to_string),
        timestamp: Utc::now(),
        platform_data: serde_json::Value::Null,
    }
}

pub fn guild_message(id: u64, author: &User, content: &str) -> MessageCreate {
    MessageCreate {
        message: base_message(id, author, Some(content)),
        shard_id: Some(0),
    }
}

pub fn direct_message(id: u64, author: &User, content: &str) -> MessageCreate {
    let mut message = base_message(id, author, Some(content));
    message.guild_id = None;
    MessageCreate {
        message,
        shard_id: Some(0),
    }
}

pub fn roled_message(id: u64, author: &User, roles: &[&str], content: &str) -> MessageCreate {
    let mut message = base_message(id, author, Some(content));
    message.author_roles = roles.iter().map(|r| r.to_string()).collect();
    MessageCreate {
        message,
        shard_id: Some(0),
    }
}

pub fn webhook_message(id: u64, author: &User, content: &str) -> MessageCreate {
    let mut message = base_message(id, author, Some(content));
    message.webhook_id = Some(WebhookId(5));
    MessageCreate {
        message,
        shard_id: Some(0),
    }
}

pub fn embed_only_message(id: u64, author: &User) -> MessageCreate {
    MessageCreate {
        message: base_message(id, author, None),
        shard_id: Some(0),
    }
}

// ---------- probe component ----------

/// Bare [`Component`] that records how the client drives it.
pub struct ProbeComponent {
    name: String,
    claims: bool,
    fail_close: bool,
    pub offered: StdMutex<Vec<String>>,
    pub opens: StdMutex<u32>,
    pub closes: StdMutex<u32>,
    pub bound: StdMutex<bool>,
}

impl ProbeComponent {
    pub fn new(name: &str, claims: bool) -> Self {
        Self {
            name: name.to_string(),
            claims,
            fail_close: false,
            offered: StdMutex::new(Vec::new()),
            opens: StdMutex::new(0),
            closes: StdMutex::new(0),
            bound: StdMutex::new(false),
        }
    }

    /// Variant whose close() fails after recording the call.
    pub fn failing_close(name: &str) -> Self {
        let mut probe = Self::new(name, false);
        probe.fail_close = true;
        probe
    }

    pub fn offered(&self) -> Vec<String> {
        self.offered.lock().unwrap().clone()
    }

    pub fn opens(&self) -> u32 {
        *self.opens.lock().unwrap()
    }

    pub fn closes(&self) -> u32 {
        *self.closes.lock().unwrap()
    }

    pub fn bound(&self) -> bool {
        *self.bound.lock().unwrap()
    }
}

#[async_trait]
impl Component for ProbeComponent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn bind_client(&self, _client: ClientHandle) -> Result<(), Error> {
        *self.bound.lock().unwrap() = true;
        Ok(())
    }

    fn check_name(&self, _name: &str) -> Vec<FoundCommand> {
        Vec::new()
    }

    async fn check_context(&self, _ctx: &Context) -> Vec<FoundCommand> {
        Vec::new()
    }

    async fn execute(
        &self,
        ctx: Context,
        _client_hooks: Option<Arc<dyn Hooks>>,
    ) -> Result<bool, Error> {
        self.offered.lock().unwrap().push(ctx.content().to_string());
        Ok(self.claims)
    }

    async fn open(&self) -> Result<(), Error> {
        *self.opens.lock().unwrap() += 1;
        Ok(())
    }

    async fn close(&self) -> Result<(), Error> {
        *self.closes.lock().unwrap() += 1;
        if self.fail_close {
            return Err(Error::Component(format!(
                "component '{}' refused to close",
                self.name
            )));
        }
        Ok(())
    }
}

// ---------- hooks ----------

/// Hooks that append "label:stage" entries to a shared log, so tests
/// can assert the client -> component -> command ordering.
pub struct LabeledHooks {
    label: &'static str,
    log: Arc<StdMutex<Vec<String>>>,
    pre_pass: bool,
}

impl LabeledHooks {
    pub fn new(label: &'static str, log: Arc<StdMutex<Vec<String>>>) -> Self {
        Self {
            label,
            log,
            pre_pass: true,
        }
    }

    /// Variant whose pre-execution hook vetoes the run.
    pub fn vetoing(label: &'static str, log: Arc<StdMutex<Vec<String>>>) -> Self {
        Self {
            label,
            log,
            pre_pass: false,
        }
    }
}

#[async_trait]
impl Hooks for LabeledHooks {
    async fn pre_execution(&self, _ctx: &Context) -> Result<bool, Error> {
        self.log.lock().unwrap().push(format!("{}:pre", self.label));
        Ok(self.pre_pass)
    }

    async fn on_success(&self, _ctx: &Context) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:success", self.label));
    }

    async fn post_execution(&self, _ctx: &Context) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:post", self.label));
    }

    async fn on_error(&self, _ctx: &Context, _error: &Error) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:error", self.label));
    }
}
