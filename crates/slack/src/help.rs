use async_trait::async_trait;

use crate::commands::{
    CommandError, CommandReply, SlashCommand, SlashCommandPayload, HELP_COMMAND,
};

const HELP_DESCRIPTION: &str =
    "Displays a list of the available commands, their arguments, and their description";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HelpEntry {
    pub name: String,
    pub arguments: String,
    pub description: String,
}

impl HelpEntry {
    pub fn describe(command: &dyn SlashCommand) -> Self {
        Self {
            name: command.name().to_owned(),
            arguments: command.arguments_description().to_owned(),
            description: command.description().to_owned(),
        }
    }
}

/// Lists every other registered command. The listing is rendered once, at
/// registry construction, and never includes `help` itself.
#[derive(Clone, Debug)]
pub struct HelpCommand {
    listing: String,
}

impl HelpCommand {
    pub fn new(entries: &[HelpEntry]) -> Self {
        Self { listing: render_listing(entries) }
    }

    pub fn listing(&self) -> &str {
        &self.listing
    }
}

#[async_trait]
impl SlashCommand for HelpCommand {
    fn name(&self) -> &str {
        HELP_COMMAND
    }

    fn arguments_description(&self) -> &str {
        ""
    }

    fn description(&self) -> &str {
        HELP_DESCRIPTION
    }

    async fn execute(
        &self,
        _arguments: &[String],
        _request: &SlashCommandPayload,
    ) -> Result<CommandReply, CommandError> {
        Ok(CommandReply::ephemeral(self.listing.clone()))
    }
}

fn render_listing(entries: &[HelpEntry]) -> String {
    if entries.is_empty() {
        return "No commands are registered.".to_owned();
    }

    entries
        .iter()
        .map(|entry| {
            let usage = if entry.arguments.is_empty() {
                entry.name.clone()
            } else {
                format!("{} {}", entry.name, entry.arguments)
            };
            format!("{usage}\n{}\n", entry.description)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
