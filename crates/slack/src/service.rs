use std::sync::Arc;

use tracing::{error, info};

use crate::commands::CommandInvocation;
use crate::registry::CommandRegistry;
use crate::responder::{ReplySender, ResponderError};

#[derive(Debug)]
pub enum ProcessOutcome {
    /// No handler matched; nothing was sent.
    Ignored,
    Delivered,
    DeliveryFailed(ResponderError),
}

/// Runs one verified invocation to completion: dispatch, then a single delivery
/// attempt. Runs after the webhook has been acknowledged, so failures are only logged.
pub struct SlashCommandService<S> {
    registry: Arc<CommandRegistry>,
    sender: S,
}

impl<S> SlashCommandService<S>
where
    S: ReplySender,
{
    pub fn new(registry: Arc<CommandRegistry>, sender: S) -> Self {
        Self { registry, sender }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub async fn process(&self, invocation: CommandInvocation) -> ProcessOutcome {
        let Some(reply) = self.registry.dispatch(&invocation).await else {
            info!(
                event_name = "slack.command.ignored",
                command = %invocation.command_name,
                user_id = %invocation.raw.user_id,
                "unrecognized command dropped without reply"
            );
            return ProcessOutcome::Ignored;
        };

        match self.sender.send(&invocation.raw.response_url, &reply).await {
            Ok(()) => {
                info!(
                    event_name = "slack.command.replied",
                    command = %invocation.command_name,
                    user_id = %invocation.raw.user_id,
                    response_type = ?reply.response_type,
                    "command reply delivered"
                );
                ProcessOutcome::Delivered
            }
            Err(delivery_error) => {
                error!(
                    event_name = "slack.command.reply_failed",
                    command = %invocation.command_name,
                    user_id = %invocation.raw.user_id,
                    error = %delivery_error,
                    "command reply could not be delivered"
                );
                ProcessOutcome::DeliveryFailed(delivery_error)
            }
        }
    }
}
