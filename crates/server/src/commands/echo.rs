use async_trait::async_trait;
use slashbot_slack::commands::{CommandError, CommandReply, SlashCommand, SlashCommandPayload};

/// Repeats its arguments back to the channel.
#[derive(Clone, Copy, Debug, Default)]
pub struct EchoCommand;

#[async_trait]
impl SlashCommand for EchoCommand {
    fn name(&self) -> &str {
        "echo"
    }

    fn arguments_description(&self) -> &str {
        "[words...]"
    }

    fn description(&self) -> &str {
        "Accepts any number of arguments and echoes them back to the channel"
    }

    async fn execute(
        &self,
        arguments: &[String],
        _request: &SlashCommandPayload,
    ) -> Result<CommandReply, CommandError> {
        Ok(CommandReply::in_channel(arguments.join(" ")))
    }
}
