// demos/demo_bot/src/main.rs
//
// Runs the dispatch layer against an in-process platform: a local
// dispatcher fans events out to subscribed listeners, REST calls print
// to stdout, and a scripted conversation walks the accepted, ignored,
// and check-filtered paths.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use clap::Parser;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use herald_common::models::{
    ChannelId, EventKind, GatewayEvent, GuildId, Mention, Message, MessageCreate, MessageId, User,
    UserId,
};
use herald_common::traits::{
    CacheView, EventDispatcher, EventListener, PlatformClient, RestClient, ShardInfo,
};
use herald_common::Error;
use herald_core::checks::RequireRole;
use herald_core::hooks::TracingHooks;
use herald_core::{Client, ClientConfig, Command, DefaultComponent};

const BOT_ID: UserId = UserId(100);
const CHANNEL: ChannelId = ChannelId(4242);

#[derive(Parser, Debug, Clone)]
#[command(name = "demo_bot")]
#[command(author, version, about = "Herald demo: scripted dispatch against an in-process platform")]
struct Args {
    /// Command prefix to declare
    #[arg(long, default_value = "!")]
    prefix: String,

    /// Do not accept mentioning the bot as a prefix
    #[arg(long, default_value = "false")]
    no_mention_prefix: bool,

    /// Optional JSON file holding a client configuration block
    #[arg(long)]
    config: Option<String>,
}

// ---------- in-process platform ----------

/// Subscription table plus publish fan-out. Listener errors are logged
/// and the listener is dropped from the table, which reaps listeners
/// whose client has gone away.
struct LocalDispatcher {
    listeners: RwLock<HashMap<EventKind, Vec<Arc<dyn EventListener>>>>,
}

impl LocalDispatcher {
    fn new() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
        }
    }

    async fn publish(&self, event: GatewayEvent) {
        let kind = event.kind();
        let targets = {
            let listeners = self.listeners.read().await;
            listeners.get(&kind).cloned().unwrap_or_default()
        };
        for listener in targets {
            if let Err(e) = listener.on_event(event.clone()).await {
                warn!("listener '{}' failed on {}: {}", listener.id(), kind, e);
                let mut listeners = self.listeners.write().await;
                if let Some(subs) = listeners.get_mut(&kind) {
                    subs.retain(|l| l.id() != listener.id());
                }
            }
        }
    }
}

#[async_trait]
impl EventDispatcher for LocalDispatcher {
    async fn subscribe(
        &self,
        kind: EventKind,
        listener: Arc<dyn EventListener>,
    ) -> Result<(), Error> {
        let mut listeners = self.listeners.write().await;
        listeners.entry(kind).or_default().push(listener);
        Ok(())
    }

    async fn unsubscribe(&self, kind: EventKind, listener_id: &str) -> Result<(), Error> {
        let mut listeners = self.listeners.write().await;
        if let Some(subs) = listeners.get_mut(&kind) {
            subs.retain(|l| l.id() != listener_id);
        }
        Ok(())
    }
}

/// REST capability that prints outbound messages instead of sending
/// them anywhere.
struct PrintingRest {
    bot: User,
    counter: Mutex<u64>,
}

#[async_trait]
impl RestClient for PrintingRest {
    async fn send_message(&self, channel_id: ChannelId, content: &str) -> Result<Message, Error> {
        println!("[bot -> #{}] {}", channel_id, content);
        let mut counter = self.counter.lock().await;
        *counter += 1;
        Ok(Message {
            id: MessageId(1_000_000 + *counter),
            channel_id,
            guild_id: None,
            author: self.bot.clone(),
            author_roles: vec![],
            webhook_id: None,
            content: Some(content.to_string()),
            timestamp: Utc::now(),
            platform_data: serde_json::Value::Null,
        })
    }

    async fn current_user(&self) -> Result<User, Error> {
        Ok(self.bot.clone())
    }
}

struct SingleShard;

impl ShardInfo for SingleShard {
    fn shard_count(&self) -> u32 {
        1
    }

    fn latency(&self, _shard_id: u32) -> Option<Duration> {
        Some(Duration::from_millis(42))
    }
}

struct LocalCache {
    bot: User,
}

impl CacheView for LocalCache {
    fn current_user(&self) -> Option<User> {
        Some(self.bot.clone())
    }

    fn user(&self, id: UserId) -> Option<User> {
        (id == self.bot.id).then(|| self.bot.clone())
    }

    fn message(&self, _id: MessageId) -> Option<Message> {
        None
    }
}

struct DemoPlatform {
    dispatch: Arc<LocalDispatcher>,
    rest: Arc<PrintingRest>,
    shards: Arc<SingleShard>,
    cache: Arc<LocalCache>,
}

impl PlatformClient for DemoPlatform {
    fn event_dispatcher(&self) -> Arc<dyn EventDispatcher> {
        self.dispatch.clone()
    }

    fn rest(&self) -> Option<Arc<dyn RestClient>> {
        Some(self.rest.clone())
    }

    fn shards(&self) -> Option<Arc<dyn ShardInfo>> {
        Some(self.shards.clone())
    }

    fn cache(&self) -> Option<Arc<dyn CacheView>> {
        Some(self.cache.clone())
    }
}

// ---------- the scripted conversation ----------

fn incoming(id: u64, author: &User, roles: &[&str], content: Option<&str>) -> GatewayEvent {
    GatewayEvent::MessageCreate(MessageCreate {
        message: Message {
            id: MessageId(id),
            channel_id: CHANNEL,
            guild_id: Some(GuildId(9000)),
            author: author.clone(),
            author_roles: roles.iter().map(|r| r.to_string()).collect(),
            webhook_id: None,
            content: content.map(str::to_string),
            timestamp: Utc::now(),
            platform_data: serde_json::Value::Null,
        },
        shard_id: Some(0),
    })
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("demo_bot=debug".parse().unwrap_or_default())
        .add_directive("herald_core=debug".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub).expect("Failed to set global subscriber");
}

fn build_component() -> anyhow::Result<DefaultComponent> {
    let ping = Command::from_fn("ping", |ctx| async move {
        let latency = ctx
            .client()
            .shards
            .latency(0)
            .map(|d| format!("{}ms", d.as_millis()))
            .unwrap_or_else(|| "unknown".to_string());
        ctx.respond(format!("pong! gateway latency {}", latency))
            .await?;
        Ok(())
    })
    .describe("Replies with pong and the shard latency");

    let echo = Command::from_fn("echo", |ctx| async move {
        let line = if ctx.content().is_empty() {
            "nothing to echo".to_string()
        } else {
            ctx.content().to_string()
        };
        ctx.respond(line).await?;
        Ok(())
    })
    .alias("say")
    .describe("Repeats the remaining text");

    let shutdown = Command::from_fn("shutdown", |ctx| async move {
        ctx.respond("acknowledged, shutting down").await?;
        Ok(())
    })
    .check(Arc::new(RequireRole::new("admin")))
    .describe("Admin-only: announces shutdown");

    Ok(DefaultComponent::new("general")
        .with_command(ping)?
        .with_command(echo)?
        .with_command(shutdown)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    info!(
        "demo_bot starting. prefix='{}', mention_prefix={}",
        args.prefix, !args.no_mention_prefix
    );

    let bot = User::new(BOT_ID, "herald", true);
    let dispatch = Arc::new(LocalDispatcher::new());
    let platform = Arc::new(DemoPlatform {
        dispatch: dispatch.clone(),
        rest: Arc::new(PrintingRest {
            bot: bot.clone(),
            counter: Mutex::new(0),
        }),
        shards: Arc::new(SingleShard),
        cache: Arc::new(LocalCache { bot }),
    });

    let mut builder = Client::builder(platform)
        .hooks(Arc::new(TracingHooks))
        .prefix(args.prefix.clone())
        .accept_mention_prefix(!args.no_mention_prefix);
    if let Some(path) = &args.config {
        let raw = std::fs::read_to_string(path)?;
        let config: ClientConfig = serde_json::from_str(&raw)?;
        builder = builder.configure(config);
    }
    let client = builder.build().await?;
    client.add_component(Arc::new(build_component()?)).await?;

    let alice = User::new(UserId(1), "alice", false);
    let mallory = User::new(UserId(2), "mallory-bot", true);
    let mod_user = User::new(UserId(3), "morgan", false);

    // Starting opens the client and hooks up the message listener.
    dispatch.publish(GatewayEvent::Starting).await;

    println!("--- scripted conversation ---");
    let script = vec![
        // claimed: prefix + name match
        incoming(1, &alice, &[], Some("!ping")),
        // dropped by the human_only client check
        incoming(2, &mallory, &[], Some("!ping")),
        // ignored: no declared prefix
        incoming(3, &alice, &[], Some("hello there")),
        // claimed, remaining text echoed back
        incoming(4, &alice, &[], Some("!echo hello world")),
        // ignored: embed-only payload without text
        incoming(5, &alice, &[], None),
        // mention prefix, resolved at open() from the cache
        incoming(6, &alice, &[], Some(&format!("{} ping", Mention::user(BOT_ID)))),
        // no command claims it
        incoming(7, &alice, &[], Some("!missing")),
        // skipped silently: require_role vetoes the match
        incoming(8, &alice, &[], Some("!shutdown")),
        // same command, author carries the role (case-insensitive)
        incoming(9, &mod_user, &["Admin"], Some("!shutdown")),
    ];
    for event in script {
        dispatch.publish(event).await;
    }

    // Stopping closes the client and detaches the message listener.
    dispatch.publish(GatewayEvent::Stopping).await;
    println!("--- done ---");

    Ok(())
}
