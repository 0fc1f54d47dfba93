// File: herald-core/src/component.rs
//
// Components own commands. The client offers each message context to
// its components in registration order; the first one to claim it ends
// the dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use herald_common::Error;

use crate::checks::{passes_command_checks, CommandCheck};
use crate::client::ClientHandle;
use crate::command::Command;
use crate::context::Context;
use crate::hooks::Hooks;

/// A command that matched, plus the name or alias it matched under.
#[derive(Clone)]
pub struct FoundCommand {
    pub name: String,
    pub command: Arc<Command>,
}

/// A pluggable unit of commands.
#[async_trait]
pub trait Component: Send + Sync {
    /// Unique name used for registration and removal.
    fn name(&self) -> &str;

    /// Called once when the component is added to a client.
    async fn bind_client(&self, client: ClientHandle) -> Result<(), Error>;

    /// Every command whose name or alias matches the start of `name`.
    /// No checks run here.
    fn check_name(&self, name: &str) -> Vec<FoundCommand>;

    /// Every command matching the context's content whose checks all
    /// pass, in declaration order.
    async fn check_context(&self, ctx: &Context) -> Vec<FoundCommand>;

    /// Offer the context. Returns true when the component claimed the
    /// message, whether or not the command body succeeded.
    async fn execute(
        &self,
        ctx: Context,
        client_hooks: Option<Arc<dyn Hooks>>,
    ) -> Result<bool, Error>;

    async fn open(&self) -> Result<(), Error>;

    async fn close(&self) -> Result<(), Error>;
}

/// The standard [`Component`] implementation.
pub struct DefaultComponent {
    name: String,
    commands: Vec<Arc<Command>>,
    checks: Vec<Arc<dyn CommandCheck>>,
    hooks: Option<Arc<dyn Hooks>>,
    client: RwLock<Option<ClientHandle>>,
}

impl DefaultComponent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
            checks: Vec::new(),
            hooks: None,
            client: RwLock::new(None),
        }
    }

    /// Add a command. Names and aliases must be unique within one
    /// component.
    pub fn with_command(mut self, command: Command) -> Result<Self, Error> {
        for name in command.names() {
            if self
                .commands
                .iter()
                .any(|existing| existing.names().any(|n| n == name))
            {
                return Err(Error::Component(format!(
                    "command name '{}' is already taken in component '{}'",
                    name, self.name
                )));
            }
        }
        self.commands.push(Arc::new(command));
        Ok(self)
    }

    /// Attach a check that applies to every command in this component.
    pub fn with_check(mut self, check: Arc<dyn CommandCheck>) -> Self {
        self.checks.push(check);
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn Hooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn commands(&self) -> &[Arc<Command>] {
        &self.commands
    }

    /// The capability view received at registration, if any.
    pub async fn client(&self) -> Option<ClientHandle> {
        self.client.read().await.clone()
    }

    /// First command whose name matches and whose checks pass. Stops
    /// evaluating checks as soon as one candidate qualifies.
    async fn first_match(&self, ctx: &Context) -> Option<FoundCommand> {
        for command in &self.commands {
            let Some(matched) = command.matching_name(ctx.content()) else {
                continue;
            };
            let checks: Vec<&Arc<dyn CommandCheck>> =
                self.checks.iter().chain(command.checks()).collect();
            if passes_command_checks(checks, ctx).await {
                return Some(FoundCommand {
                    name: matched.to_string(),
                    command: command.clone(),
                });
            }
        }
        None
    }
}

#[async_trait]
impl Component for DefaultComponent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn bind_client(&self, client: ClientHandle) -> Result<(), Error> {
        if client.is_stateless() {
            debug!("component '{}' bound to a stateless client", self.name);
        }
        *self.client.write().await = Some(client);
        Ok(())
    }

    fn check_name(&self, name: &str) -> Vec<FoundCommand> {
        self.commands
            .iter()
            .filter_map(|command| {
                command.matching_name(name).map(|matched| FoundCommand {
                    name: matched.to_string(),
                    command: command.clone(),
                })
            })
            .collect()
    }

    async fn check_context(&self, ctx: &Context) -> Vec<FoundCommand> {
        let mut found = Vec::new();
        for command in &self.commands {
            let Some(matched) = command.matching_name(ctx.content()) else {
                continue;
            };
            let checks: Vec<&Arc<dyn CommandCheck>> =
                self.checks.iter().chain(command.checks()).collect();
            if !passes_command_checks(checks, ctx).await {
                continue;
            }
            found.push(FoundCommand {
                name: matched.to_string(),
                command: command.clone(),
            });
        }
        found
    }

    async fn execute(
        &self,
        mut ctx: Context,
        client_hooks: Option<Arc<dyn Hooks>>,
    ) -> Result<bool, Error> {
        let Some(found) = self.first_match(&ctx).await else {
            return Ok(false);
        };

        ctx.set_triggering_name(found.name.clone());
        let remainder = &ctx.content()[found.name.len()..];
        let remainder = remainder.strip_prefix(' ').unwrap_or(remainder).to_string();
        ctx.set_content(remainder);

        let mut stack: Vec<Arc<dyn Hooks>> = Vec::new();
        if let Some(hooks) = client_hooks {
            stack.push(hooks);
        }
        if let Some(hooks) = &self.hooks {
            stack.push(hooks.clone());
        }
        if let Some(hooks) = found.command.hooks() {
            stack.push(hooks);
        }

        for hooks in &stack {
            if !hooks.pre_execution(&ctx).await? {
                debug!(
                    "invocation {} aborted by a pre-execution hook",
                    ctx.invocation_id()
                );
                return Ok(true);
            }
        }

        match found.command.run(ctx.clone()).await {
            Ok(()) => {
                for hooks in &stack {
                    hooks.on_success(&ctx).await;
                }
            }
            Err(e) => {
                warn!(
                    "command '{}' failed in component '{}': {}",
                    found.name, self.name, e
                );
                for hooks in &stack {
                    hooks.on_error(&ctx, &e).await;
                }
            }
        }
        for hooks in &stack {
            hooks.post_execution(&ctx).await;
        }

        Ok(true)
    }

    async fn open(&self) -> Result<(), Error> {
        debug!("component '{}' opened", self.name);
        Ok(())
    }

    async fn close(&self) -> Result<(), Error> {
        debug!("component '{}' closed", self.name);
        Ok(())
    }
}
