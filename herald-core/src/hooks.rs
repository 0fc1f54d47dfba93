// File: herald-core/src/hooks.rs

use async_trait::async_trait;
use tracing::{debug, warn};

use herald_common::Error;

use crate::context::Context;

/// Lifecycle callbacks around command execution. When the client, the
/// component, and the command all carry hooks, the stack runs in that
/// order at every stage.
#[async_trait]
pub trait Hooks: Send + Sync {
    /// Runs before the command callback. Returning `Ok(false)` aborts
    /// the execution; the message still counts as claimed.
    async fn pre_execution(&self, _ctx: &Context) -> Result<bool, Error> {
        Ok(true)
    }

    /// Runs after the callback returned cleanly.
    async fn on_success(&self, _ctx: &Context) {}

    /// Runs once the callback finished, success or failure.
    async fn post_execution(&self, _ctx: &Context) {}

    /// Runs when the command callback failed.
    async fn on_error(&self, _ctx: &Context, _error: &Error) {}
}

/// Hooks that only log. A reasonable client-level default while wiring
/// up a new bot.
pub struct TracingHooks;

#[async_trait]
impl Hooks for TracingHooks {
    async fn pre_execution(&self, ctx: &Context) -> Result<bool, Error> {
        debug!(
            "invocation {} executing '{}'",
            ctx.invocation_id(),
            ctx.triggering_name().unwrap_or("?")
        );
        Ok(true)
    }

    async fn on_success(&self, ctx: &Context) {
        debug!("invocation {} succeeded", ctx.invocation_id());
    }

    async fn post_execution(&self, ctx: &Context) {
        debug!("invocation {} finished", ctx.invocation_id());
    }

    async fn on_error(&self, ctx: &Context, error: &Error) {
        warn!("invocation {} failed: {}", ctx.invocation_id(), error);
    }
}
