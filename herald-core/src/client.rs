// File: herald-core/src/client.rs
//
// The dispatch core. A Client owns components, prefixes, and global
// checks, listens for message-create and lifecycle events, and routes
// each qualifying message to the first component that claims it.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use futures_util::future;
use futures_util::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use herald_common::models::{EventKind, GatewayEvent, Mention, MessageCreate};
use herald_common::traits::{
    CacheView, EventDispatcher, EventListener, PlatformClient, RestClient, ShardInfo,
};
use herald_common::Error;

use crate::checks::{gather_checks, EventCheck, HumanOnly};
use crate::component::{Component, FoundCommand};
use crate::context::Context;
use crate::hooks::Hooks;

/// Configuration block applications can deserialize and feed to the
/// builder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub prefixes: Vec<String>,
    #[serde(default)]
    pub accept_mention_prefix: bool,
}

/// The capability view handed to components and contexts. Carries no
/// component registry, so a component can hold its handle without
/// creating an ownership cycle.
#[derive(Clone)]
pub struct ClientHandle {
    pub rest: Arc<dyn RestClient>,
    pub shards: Arc<dyn ShardInfo>,
    pub cache: Option<Arc<dyn CacheView>>,
}

impl ClientHandle {
    pub fn new(
        rest: Arc<dyn RestClient>,
        shards: Arc<dyn ShardInfo>,
        cache: Option<Arc<dyn CacheView>>,
    ) -> Self {
        Self { rest, shards, cache }
    }

    /// True when no cache capability was available at build time.
    pub fn is_stateless(&self) -> bool {
        self.cache.is_none()
    }
}

struct ClientInner {
    dispatch: Arc<dyn EventDispatcher>,
    rest: Arc<dyn RestClient>,
    shards: Arc<dyn ShardInfo>,
    cache: Option<Arc<dyn CacheView>>,
    hooks: Option<Arc<dyn Hooks>>,
    listener: Arc<ClientListener>,
    components: RwLock<Vec<Arc<dyn Component>>>,
    checks: RwLock<Vec<Arc<dyn EventCheck>>>,
    prefixes: RwLock<BTreeSet<String>>,
    mention_prefixes: RwLock<Vec<String>>,
    accept_mention_prefix: bool,
    listening: AtomicBool,
}

/// The gateway subscription. Holds the client weakly so a dropped
/// client cannot be kept alive by its own subscription; dispatchers may
/// treat the resulting error as a cue to prune the listener.
struct ClientListener {
    id: String,
    client: Weak<ClientInner>,
}

#[async_trait]
impl EventListener for ClientListener {
    fn id(&self) -> &str {
        &self.id
    }

    async fn on_event(&self, event: GatewayEvent) -> Result<(), Error> {
        let Some(inner) = self.client.upgrade() else {
            return Err(Error::Dispatch(format!(
                "listener '{}' outlived its client",
                self.id
            )));
        };
        let client = Client { inner };
        match event {
            GatewayEvent::MessageCreate(ev) => client.on_message_create(ev).await,
            GatewayEvent::Starting => client.open(true).await,
            GatewayEvent::Stopping => client.close(true).await,
        }
    }
}

/// Cheap-clone handle over the shared dispatch state.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

/// Configures and builds a [`Client`].
pub struct ClientBuilder {
    platform: Arc<dyn PlatformClient>,
    rest: Option<Arc<dyn RestClient>>,
    shards: Option<Arc<dyn ShardInfo>>,
    cache: Option<Arc<dyn CacheView>>,
    hooks: Option<Arc<dyn Hooks>>,
    prefixes: BTreeSet<String>,
    accept_mention_prefix: bool,
}

impl ClientBuilder {
    fn new(platform: Arc<dyn PlatformClient>) -> Self {
        Self {
            platform,
            rest: None,
            shards: None,
            cache: None,
            hooks: None,
            prefixes: BTreeSet::new(),
            accept_mention_prefix: false,
        }
    }

    /// Override the REST capability instead of deriving it from the
    /// platform client.
    pub fn rest(mut self, rest: Arc<dyn RestClient>) -> Self {
        self.rest = Some(rest);
        self
    }

    /// Override the shard capability instead of deriving it from the
    /// platform client.
    pub fn shards(mut self, shards: Arc<dyn ShardInfo>) -> Self {
        self.shards = Some(shards);
        self
    }

    /// Override the cache capability instead of deriving it from the
    /// platform client.
    pub fn cache(mut self, cache: Arc<dyn CacheView>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Client-level hooks, run first at every execution stage.
    pub fn hooks(mut self, hooks: Arc<dyn Hooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.insert(prefix.into());
        self
    }

    pub fn prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes.extend(prefixes.into_iter().map(Into::into));
        self
    }

    /// Also accept a mention of the bot's own user as a prefix. The
    /// mention spellings are resolved at open(), cache first, then REST.
    pub fn accept_mention_prefix(mut self, accept: bool) -> Self {
        self.accept_mention_prefix = accept;
        self
    }

    /// Apply a deserialized [`ClientConfig`].
    pub fn configure(mut self, config: ClientConfig) -> Self {
        self.prefixes.extend(config.prefixes);
        self.accept_mention_prefix = config.accept_mention_prefix;
        self
    }

    /// Resolve the capability set, install the default check, and
    /// register the lifecycle listener with the dispatcher.
    pub async fn build(self) -> Result<Client, Error> {
        if self.prefixes.iter().any(|p| p.is_empty()) {
            return Err(Error::InvalidPrefix("prefixes must not be empty".to_string()));
        }

        let dispatch = self.platform.event_dispatcher();
        let rest = self
            .rest
            .or_else(|| self.platform.rest())
            .ok_or(Error::MissingCapability("rest"))?;
        let shards = self
            .shards
            .or_else(|| self.platform.shards())
            .ok_or(Error::MissingCapability("shards"))?;
        let cache = self.cache.or_else(|| self.platform.cache());
        if cache.is_none() {
            info!("no cache capability found; client runs stateless");
        }

        let default_check: Arc<dyn EventCheck> = Arc::new(HumanOnly);
        let inner = Arc::new_cyclic(|weak: &Weak<ClientInner>| ClientInner {
            dispatch,
            rest,
            shards,
            cache,
            hooks: self.hooks,
            listener: Arc::new(ClientListener {
                id: format!("herald-client-{}", Uuid::new_v4()),
                client: weak.clone(),
            }),
            components: RwLock::new(Vec::new()),
            checks: RwLock::new(vec![default_check]),
            prefixes: RwLock::new(self.prefixes),
            mention_prefixes: RwLock::new(Vec::new()),
            accept_mention_prefix: self.accept_mention_prefix,
            listening: AtomicBool::new(false),
        });
        let client = Client { inner };

        let listener: Arc<dyn EventListener> = client.inner.listener.clone();
        client
            .inner
            .dispatch
            .subscribe(EventKind::Starting, listener.clone())
            .await?;
        client
            .inner
            .dispatch
            .subscribe(EventKind::Stopping, listener)
            .await?;
        debug!("lifecycle listener '{}' registered", client.inner.listener.id);

        Ok(client)
    }
}

impl Client {
    /// Start configuring a client around a platform handle.
    pub fn builder(platform: Arc<dyn PlatformClient>) -> ClientBuilder {
        ClientBuilder::new(platform)
    }

    pub fn rest(&self) -> Arc<dyn RestClient> {
        self.inner.rest.clone()
    }

    pub fn shards(&self) -> Arc<dyn ShardInfo> {
        self.inner.shards.clone()
    }

    pub fn cache(&self) -> Option<Arc<dyn CacheView>> {
        self.inner.cache.clone()
    }

    pub fn dispatch(&self) -> Arc<dyn EventDispatcher> {
        self.inner.dispatch.clone()
    }

    pub fn hooks(&self) -> Option<Arc<dyn Hooks>> {
        self.inner.hooks.clone()
    }

    /// Snapshot of the registered components, in registration order.
    pub async fn components(&self) -> Vec<Arc<dyn Component>> {
        self.inner.components.read().await.clone()
    }

    /// Sorted snapshot of the declared prefixes. Resolved mention
    /// prefixes are not part of it.
    pub async fn prefixes(&self) -> Vec<String> {
        self.inner.prefixes.read().await.iter().cloned().collect()
    }

    /// The capability view given to components and contexts.
    pub fn handle(&self) -> ClientHandle {
        ClientHandle::new(
            self.inner.rest.clone(),
            self.inner.shards.clone(),
            self.inner.cache.clone(),
        )
    }

    /// Register a named client-level check. Every check must pass
    /// before a message is dispatched.
    pub async fn add_check(&self, check: Arc<dyn EventCheck>) -> Result<(), Error> {
        let mut checks = self.inner.checks.write().await;
        if checks.iter().any(|c| c.name() == check.name()) {
            return Err(Error::Check(format!(
                "check '{}' is already registered",
                check.name()
            )));
        }
        info!("registered client check '{}'", check.name());
        checks.push(check);
        Ok(())
    }

    pub async fn remove_check(&self, name: &str) -> Result<(), Error> {
        let mut checks = self.inner.checks.write().await;
        let before = checks.len();
        checks.retain(|c| c.name() != name);
        if checks.len() == before {
            return Err(Error::CheckNotFound(name.to_string()));
        }
        info!("removed client check '{}'", name);
        Ok(())
    }

    /// Run every client check against the event concurrently and AND
    /// the results. The first check error aborts the aggregation.
    pub async fn check(&self, event: &MessageCreate) -> Result<bool, Error> {
        let checks = self.inner.checks.read().await.clone();
        gather_checks(&checks, event).await
    }

    /// Register a component and bind the client's capability view into
    /// it. Component names must be unique.
    pub async fn add_component(&self, component: Arc<dyn Component>) -> Result<(), Error> {
        let mut components = self.inner.components.write().await;
        if components.iter().any(|c| c.name() == component.name()) {
            return Err(Error::Component(format!(
                "component '{}' is already registered",
                component.name()
            )));
        }
        component.bind_client(self.handle()).await?;
        info!("registered component '{}'", component.name());
        components.push(component);
        Ok(())
    }

    pub async fn remove_component(&self, name: &str) -> Result<(), Error> {
        let mut components = self.inner.components.write().await;
        let before = components.len();
        components.retain(|c| c.name() != name);
        if components.len() == before {
            return Err(Error::ComponentNotFound(name.to_string()));
        }
        info!("removed component '{}'", name);
        Ok(())
    }

    /// Declare a prefix. Re-declaring an existing prefix is a no-op.
    pub async fn add_prefix(&self, prefix: impl Into<String>) -> Result<(), Error> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(Error::InvalidPrefix("prefixes must not be empty".to_string()));
        }
        let mut prefixes = self.inner.prefixes.write().await;
        if prefixes.insert(prefix.clone()) {
            debug!("declared prefix '{}'", prefix);
        }
        Ok(())
    }

    pub async fn remove_prefix(&self, prefix: &str) -> Result<(), Error> {
        let mut prefixes = self.inner.prefixes.write().await;
        if !prefixes.remove(prefix) {
            return Err(Error::PrefixNotFound(prefix.to_string()));
        }
        debug!("removed prefix '{}'", prefix);
        Ok(())
    }

    /// The prefix `content` starts with, if any. The longest declared
    /// match wins, so "!!" beats "!" on "!!status". Mention prefixes
    /// participate once resolved at open().
    pub async fn check_prefix(&self, content: &str) -> Option<String> {
        let prefixes = self.inner.prefixes.read().await;
        let mentions = self.inner.mention_prefixes.read().await;
        prefixes
            .iter()
            .chain(mentions.iter())
            .filter(|p| content.starts_with(p.as_str()))
            .max_by_key(|p| p.len())
            .cloned()
    }

    /// Lazily yield every command match for the context, walking the
    /// components in registration order.
    pub async fn check_context(&self, ctx: &Context) -> BoxStream<'static, FoundCommand> {
        let components = self.components().await;
        let ctx = ctx.clone();
        stream::iter(components)
            .then(move |component| {
                let ctx = ctx.clone();
                async move { component.check_context(&ctx).await }
            })
            .flat_map(stream::iter)
            .boxed()
    }

    /// Lazily yield every command whose name matches `name`, walking
    /// the components in registration order.
    pub async fn check_name(&self, name: &str) -> Box<dyn Iterator<Item = FoundCommand> + Send> {
        let components = self.components().await;
        let name = name.to_string();
        Box::new(
            components
                .into_iter()
                .flat_map(move |component| component.check_name(&name)),
        )
    }

    /// Open every component, resolve mention prefixes when enabled, and
    /// start listening for message-create events.
    pub async fn open(&self, register_listener: bool) -> Result<(), Error> {
        let components = self.components().await;
        future::try_join_all(components.iter().map(|c| c.open())).await?;

        if self.inner.accept_mention_prefix {
            self.resolve_mention_prefixes().await?;
        }

        if register_listener && !self.inner.listening.swap(true, Ordering::SeqCst) {
            let listener: Arc<dyn EventListener> = self.inner.listener.clone();
            if let Err(e) = self
                .inner
                .dispatch
                .subscribe(EventKind::MessageCreate, listener)
                .await
            {
                self.inner.listening.store(false, Ordering::SeqCst);
                return Err(e);
            }
            debug!(
                "message-create listener '{}' subscribed",
                self.inner.listener.id
            );
        }

        info!("client opened with {} component(s)", components.len());
        Ok(())
    }

    /// Stop listening (when requested) and close every component.
    /// Component shutdown always runs; the flag only gates the
    /// unsubscription.
    pub async fn close(&self, deregister_listener: bool) -> Result<(), Error> {
        if deregister_listener && self.inner.listening.swap(false, Ordering::SeqCst) {
            if let Err(e) = self
                .inner
                .dispatch
                .unsubscribe(EventKind::MessageCreate, &self.inner.listener.id)
                .await
            {
                warn!("failed to unsubscribe message-create listener: {}", e);
            }
        }

        let components = self.components().await;
        let results = future::join_all(components.iter().map(|c| c.close())).await;
        let mut first_err = None;
        for (component, result) in components.iter().zip(results) {
            if let Err(e) = result {
                warn!("component '{}' failed to close: {}", component.name(), e);
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }

        info!("client closed");
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn resolve_mention_prefixes(&self) -> Result<(), Error> {
        let user = match self.inner.cache.as_ref().and_then(|c| c.current_user()) {
            Some(user) => user,
            None => self.inner.rest.current_user().await?,
        };
        // Trailing space included, so stripping the prefix leaves the
        // command name in first position.
        let mut mentions = self.inner.mention_prefixes.write().await;
        *mentions = vec![
            format!("{} ", Mention::user(user.id)),
            format!("{} ", Mention::user_nick(user.id)),
        ];
        debug!("mention prefixes resolved for user {}", user.id);
        Ok(())
    }

    /// The message-create pipeline: prefix, checks, context, then offer
    /// the context to each component until one claims it.
    async fn on_message_create(&self, event: MessageCreate) -> Result<(), Error> {
        let Some(content) = event.message.content.clone() else {
            return Ok(());
        };
        let Some(prefix) = self.check_prefix(&content).await else {
            return Ok(());
        };
        if !self.check(&event).await? {
            debug!("message {} rejected by client checks", event.message.id);
            return Ok(());
        }

        let stripped = content[prefix.len()..].to_string();
        let ctx = Context::new(self.handle(), event.message, stripped, prefix);
        let invocation_id = ctx.invocation_id();
        debug!(
            "invocation {} matched prefix '{}' in channel {}",
            invocation_id,
            ctx.triggering_prefix(),
            ctx.message().channel_id
        );

        let hooks = self.inner.hooks.clone();
        for component in self.components().await {
            if component.execute(ctx.clone(), hooks.clone()).await? {
                debug!(
                    "invocation {} claimed by component '{}'",
                    invocation_id,
                    component.name()
                );
                return Ok(());
            }
        }
        debug!("invocation {} not claimed by any component", invocation_id);
        Ok(())
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let components = self
            .inner
            .components
            .try_read()
            .map(|c| c.len())
            .unwrap_or_default();
        let prefixes = self
            .inner
            .prefixes
            .try_read()
            .map(|p| p.iter().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        f.debug_struct("Client")
            .field("components", &components)
            .field("prefixes", &prefixes)
            .finish()
    }
}
