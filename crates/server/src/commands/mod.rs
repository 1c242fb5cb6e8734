pub mod echo;

use std::sync::Arc;

use slashbot_slack::commands::SlashCommand;

/// Handlers registered at startup, in the order `help` lists them.
pub fn builtin_commands() -> Vec<Arc<dyn SlashCommand>> {
    vec![Arc::new(echo::EchoCommand)]
}
