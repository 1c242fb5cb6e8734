use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::commands::{CommandInvocation, CommandReply, SlashCommand, HELP_COMMAND};
use crate::help::{HelpCommand, HelpEntry};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("command name must be a single non-empty word, got `{0}`")]
    InvalidName(String),
    #[error("command `{0}` is registered more than once")]
    DuplicateName(String),
}

/// Ordered, immutable handler set. `help` is always appended last.
pub struct CommandRegistry {
    commands: Vec<Arc<dyn SlashCommand>>,
}

impl CommandRegistry {
    pub fn new(commands: Vec<Arc<dyn SlashCommand>>) -> Result<Self, RegistryError> {
        let mut seen: Vec<&str> = Vec::with_capacity(commands.len() + 1);
        seen.push(HELP_COMMAND);

        for command in &commands {
            let name = command.name();
            if name.is_empty() || name.chars().any(char::is_whitespace) {
                return Err(RegistryError::InvalidName(name.to_owned()));
            }
            if seen.contains(&name) {
                return Err(RegistryError::DuplicateName(name.to_owned()));
            }
            seen.push(name);
        }

        let entries = commands
            .iter()
            .map(|command| HelpEntry::describe(command.as_ref()))
            .collect::<Vec<_>>();
        let mut commands = commands;
        commands.push(Arc::new(HelpCommand::new(&entries)));

        Ok(Self { commands })
    }

    /// First handler whose name matches, in registration order.
    pub fn find(&self, name: &str) -> Option<&Arc<dyn SlashCommand>> {
        self.commands.iter().find(|command| command.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.commands.iter().map(|command| command.name()).collect()
    }

    /// Runs the matching handler. Unknown commands yield `None` and must not be
    /// answered; handler failures become an ephemeral reply carrying the message.
    pub async fn dispatch(&self, invocation: &CommandInvocation) -> Option<CommandReply> {
        let Some(command) = self.find(&invocation.command_name) else {
            debug!(
                event_name = "slack.command.unknown",
                command = %invocation.command_name,
                "no handler registered for command"
            );
            return None;
        };

        match command.execute(&invocation.arguments, &invocation.raw).await {
            Ok(reply) => Some(reply),
            Err(error) => Some(CommandReply::ephemeral(error.to_string())),
        }
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry").field("commands", &self.names()).finish()
    }
}
