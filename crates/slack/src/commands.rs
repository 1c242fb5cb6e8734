use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Command name used when the slash command carries no text.
pub const HELP_COMMAND: &str = "help";

/// Form fields Slack posts for a slash command invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SlashCommandPayload {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub response_url: String,
    #[serde(default)]
    pub trigger_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub api_app_id: String,
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub ssl_check: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("malformed form body: {0}")]
    MalformedForm(String),
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
}

impl SlashCommandPayload {
    pub fn from_form(body: &[u8]) -> Result<Self, CommandParseError> {
        serde_urlencoded::from_bytes(body)
            .map_err(|error| CommandParseError::MalformedForm(error.to_string()))
    }

    /// Slack's SSL certificate check: acknowledged, never dispatched.
    pub fn is_health_probe(&self) -> bool {
        self.ssl_check.as_deref() == Some("1")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandInvocation {
    pub command_name: String,
    pub arguments: Vec<String>,
    pub raw: SlashCommandPayload,
}

impl CommandInvocation {
    /// Splits `text` on whitespace runs. The first token selects the command
    /// (case-sensitive); blank text resolves to `help` with no arguments.
    pub fn from_payload(payload: SlashCommandPayload) -> Result<Self, CommandParseError> {
        if payload.response_url.trim().is_empty() {
            return Err(CommandParseError::MissingField("response_url"));
        }

        let mut parts = payload.text.split_whitespace();
        let command_name = parts.next().unwrap_or(HELP_COMMAND).to_owned();
        let arguments = parts.map(str::to_owned).collect();

        Ok(Self { command_name, arguments, raw: payload })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ResponseKind {
    /// Visible only to the invoking user.
    #[serde(rename = "ephemeral")]
    Ephemeral,
    /// Visible to the whole channel.
    #[serde(rename = "in_channel")]
    Broadcast,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommandReply {
    pub response_type: ResponseKind,
    pub text: String,
}

impl CommandReply {
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self { response_type: ResponseKind::Ephemeral, text: text.into() }
    }

    pub fn in_channel(text: impl Into<String>) -> Self {
        Self { response_type: ResponseKind::Broadcast, text: text.into() }
    }
}

/// A handler failure. The `Display` text is shown to the invoking user.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Failed(String),
}

#[async_trait]
pub trait SlashCommand: Send + Sync {
    /// Single word that selects this handler.
    fn name(&self) -> &str;

    fn arguments_description(&self) -> &str;

    fn description(&self) -> &str;

    async fn execute(
        &self,
        arguments: &[String],
        request: &SlashCommandPayload,
    ) -> Result<CommandReply, CommandError>;
}
