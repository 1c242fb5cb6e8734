use std::sync::Arc;
use std::time::Duration;

use slashbot_core::config::{AppConfig, ConfigError};
use slashbot_slack::commands::SlashCommand;
use slashbot_slack::registry::{CommandRegistry, RegistryError};
use slashbot_slack::responder::{HttpReplySender, ResponderError};
use slashbot_slack::service::SlashCommandService;
use slashbot_slack::verify::RequestVerifier;
use thiserror::Error;
use tokio_util::task::TaskTracker;
use tracing::info;

use crate::commands::builtin_commands;

pub struct Application {
    pub config: AppConfig,
    pub verifier: Arc<RequestVerifier>,
    pub service: Arc<SlashCommandService<HttpReplySender>>,
    /// Post-ack dispatch and reply tasks; drained on shutdown.
    pub deliveries: TaskTracker,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("command registry is invalid: {0}")]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    ReplyClient(#[from] ResponderError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    bootstrap_with_commands(config, builtin_commands())
}

pub fn bootstrap_with_commands(
    config: AppConfig,
    commands: Vec<Arc<dyn SlashCommand>>,
) -> Result<Application, BootstrapError> {
    config.validate()?;

    let registry = CommandRegistry::new(commands)?;
    info!(
        event_name = "system.bootstrap.commands_registered",
        correlation_id = "bootstrap",
        commands = ?registry.names(),
        "slash command registry built"
    );

    let sender = HttpReplySender::new(Duration::from_secs(config.slack.reply_timeout_secs))?;
    let verifier = RequestVerifier::new(config.slack.signing_secret.clone());
    let service = SlashCommandService::new(Arc::new(registry), sender);

    Ok(Application {
        config,
        verifier: Arc::new(verifier),
        service: Arc::new(service),
        deliveries: TaskTracker::new(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use slashbot_core::config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};

    use super::{bootstrap_with_commands, bootstrap_with_config, BootstrapError};
    use crate::commands::echo::EchoCommand;

    fn configured() -> AppConfig {
        let options = LoadOptions {
            overrides: ConfigOverrides {
                signing_secret: Some("bootstrap-secret".to_owned()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        };
        AppConfig::load(options).expect("config loads with signing secret override")
    }

    #[test]
    fn bootstrap_registers_builtin_commands_with_help_last() {
        let app = bootstrap_with_config(configured()).expect("bootstrap");

        assert_eq!(app.service.registry().names(), vec!["echo", "help"]);
    }

    #[test]
    fn bootstrap_rejects_missing_signing_secret() {
        let result = bootstrap_with_config(AppConfig::default());

        assert!(matches!(result, Err(BootstrapError::Config(ConfigError::Validation(_)))));
    }

    #[test]
    fn bootstrap_rejects_duplicate_command_names() {
        let result = bootstrap_with_commands(
            configured(),
            vec![Arc::new(EchoCommand), Arc::new(EchoCommand)],
        );

        assert!(matches!(result, Err(BootstrapError::Registry(_))));
    }
}
