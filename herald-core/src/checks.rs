// File: herald-core/src/checks.rs
//
// Two layers of predicates guard dispatch: client-level checks over the
// raw event, and command-level checks over the built context.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future;
use tracing::warn;

use herald_common::models::MessageCreate;
use herald_common::Error;

use crate::context::Context;

/// A named client-level predicate. Every registered check must agree
/// before a message enters command dispatch.
#[async_trait]
pub trait EventCheck: Send + Sync {
    fn name(&self) -> &str;

    async fn check(&self, event: &MessageCreate) -> Result<bool, Error>;
}

/// The default client check: drop everything not written by a person.
pub struct HumanOnly;

#[async_trait]
impl EventCheck for HumanOnly {
    fn name(&self) -> &str {
        "human_only"
    }

    async fn check(&self, event: &MessageCreate) -> Result<bool, Error> {
        Ok(event.is_human())
    }
}

/// Run every client check concurrently and AND the results. The first
/// error aborts the aggregation.
pub async fn gather_checks(
    checks: &[Arc<dyn EventCheck>],
    event: &MessageCreate,
) -> Result<bool, Error> {
    let results = future::try_join_all(checks.iter().map(|c| c.check(event))).await?;
    Ok(results.into_iter().all(|passed| passed))
}

/// A named predicate over one command invocation, attached to a
/// component or an individual command.
#[async_trait]
pub trait CommandCheck: Send + Sync {
    fn name(&self) -> &str;

    async fn check(&self, ctx: &Context) -> Result<bool, Error>;
}

/// Passes only inside a guild channel.
pub struct GuildOnly;

#[async_trait]
impl CommandCheck for GuildOnly {
    fn name(&self) -> &str {
        "guild_only"
    }

    async fn check(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(ctx.message().guild_id.is_some())
    }
}

/// Passes only in direct messages.
pub struct DirectOnly;

#[async_trait]
impl CommandCheck for DirectOnly {
    fn name(&self) -> &str {
        "direct_only"
    }

    async fn check(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(ctx.message().guild_id.is_none())
    }
}

/// Passes when the author carries the given role. Role names compare
/// case-insensitively.
pub struct RequireRole {
    role: String,
}

impl RequireRole {
    pub fn new(role: impl Into<String>) -> Self {
        Self { role: role.into() }
    }
}

#[async_trait]
impl CommandCheck for RequireRole {
    fn name(&self) -> &str {
        "require_role"
    }

    async fn check(&self, ctx: &Context) -> Result<bool, Error> {
        let wanted = self.role.to_lowercase();
        Ok(ctx
            .message()
            .author_roles
            .iter()
            .any(|role| role.to_lowercase() == wanted))
    }
}

/// Evaluate command checks for one candidate, in order. `Ok(false)` and
/// errors both veto the match; errors are logged, never propagated.
pub(crate) async fn passes_command_checks<'a, I>(checks: I, ctx: &Context) -> bool
where
    I: IntoIterator<Item = &'a Arc<dyn CommandCheck>>,
{
    for check in checks {
        match check.check(ctx).await {
            Ok(true) => {}
            Ok(false) => return false,
            Err(e) => {
                warn!("command check '{}' errored: {}", check.name(), e);
                return false;
            }
        }
    }
    true
}
