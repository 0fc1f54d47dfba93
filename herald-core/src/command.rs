// File: herald-core/src/command.rs

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use herald_common::Error;

use crate::checks::CommandCheck;
use crate::context::Context;
use crate::hooks::Hooks;

/// The executable body of a command. Implement it on a unit struct per
/// command, or wrap an async closure with [`Command::from_fn`].
#[async_trait]
pub trait CommandExec: Send + Sync {
    async fn run(&self, ctx: Context) -> Result<(), Error>;
}

struct FnExec<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> CommandExec for FnExec<F>
where
    F: Fn(Context) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), Error>> + Send,
{
    async fn run(&self, ctx: Context) -> Result<(), Error> {
        (self.f)(ctx).await
    }
}

/// One invocable command: a primary name, optional aliases, its own
/// checks and hooks, and the callback.
pub struct Command {
    name: String,
    aliases: Vec<String>,
    checks: Vec<Arc<dyn CommandCheck>>,
    hooks: Option<Arc<dyn Hooks>>,
    description: Option<String>,
    exec: Arc<dyn CommandExec>,
}

impl Command {
    pub fn new(name: impl Into<String>, exec: impl CommandExec + 'static) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            checks: Vec::new(),
            hooks: None,
            description: None,
            exec: Arc::new(exec),
        }
    }

    /// Build a command straight from an async closure.
    pub fn from_fn<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), Error>> + Send + 'static,
    {
        Self::new(name, FnExec { f })
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn check(mut self, check: Arc<dyn CommandCheck>) -> Self {
        self.checks.push(check);
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn Hooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Primary name first, then aliases in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub fn checks(&self) -> &[Arc<dyn CommandCheck>] {
        &self.checks
    }

    pub fn hooks(&self) -> Option<Arc<dyn Hooks>> {
        self.hooks.clone()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The name or alias `content` starts with, provided the match ends
    /// at a word boundary. "echo" matches "echo hi" and "echo", never
    /// "echoes".
    pub fn matching_name(&self, content: &str) -> Option<&str> {
        self.names().find(|name| {
            content.starts_with(name)
                && content[name.len()..]
                    .chars()
                    .next()
                    .map_or(true, char::is_whitespace)
        })
    }

    pub(crate) async fn run(&self, ctx: Context) -> Result<(), Error> {
        self.exec.run(ctx).await
    }
}
