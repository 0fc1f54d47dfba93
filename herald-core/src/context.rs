// File: herald-core/src/context.rs

use herald_common::models::Message;
use herald_common::Error;
use uuid::Uuid;

use crate::client::ClientHandle;

/// Per-invocation state handed to checks, hooks, and the command
/// callback. Cloning is cheap; every component offer gets its own copy
/// so a component that rewrites the content cannot leak that into the
/// next one.
#[derive(Clone)]
pub struct Context {
    client: ClientHandle,
    message: Message,
    content: String,
    triggering_prefix: String,
    triggering_name: Option<String>,
    invocation_id: Uuid,
}

impl Context {
    pub fn new(
        client: ClientHandle,
        message: Message,
        content: String,
        triggering_prefix: String,
    ) -> Self {
        Self {
            client,
            message,
            content,
            triggering_prefix,
            triggering_name: None,
            invocation_id: Uuid::new_v4(),
        }
    }

    pub fn client(&self) -> &ClientHandle {
        &self.client
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    /// The message content with the prefix stripped. Once a component
    /// picked a command, the triggering name is stripped too, leaving
    /// only the arguments.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn triggering_prefix(&self) -> &str {
        &self.triggering_prefix
    }

    /// The name or alias the command was invoked under. `None` until a
    /// component picked a command.
    pub fn triggering_name(&self) -> Option<&str> {
        self.triggering_name.as_deref()
    }

    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    pub fn set_content(&mut self, content: String) {
        self.content = content;
    }

    pub fn set_triggering_name(&mut self, name: impl Into<String>) {
        self.triggering_name = Some(name.into());
    }

    /// Reply in the channel the message came from.
    pub async fn respond(&self, content: impl Into<String>) -> Result<Message, Error> {
        self.client
            .rest
            .send_message(self.message.channel_id, &content.into())
            .await
    }
}
