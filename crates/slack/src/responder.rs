use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::commands::CommandReply;

#[derive(Debug, Error)]
pub enum ResponderError {
    #[error("could not build reply client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("reply delivery failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("reply endpoint answered with status {0}")]
    Status(u16),
}

/// Delivers a reply to the `response_url` Slack supplied with the command.
/// One attempt; callers decide what to do with a failure.
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn send(&self, response_url: &str, reply: &CommandReply) -> Result<(), ResponderError>;
}

#[derive(Clone, Debug)]
pub struct HttpReplySender {
    client: Client,
}

impl HttpReplySender {
    pub fn new(timeout: Duration) -> Result<Self, ResponderError> {
        let client = Client::builder().timeout(timeout).build().map_err(ResponderError::Client)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ReplySender for HttpReplySender {
    async fn send(&self, response_url: &str, reply: &CommandReply) -> Result<(), ResponderError> {
        let response = self
            .client
            .post(response_url)
            .json(reply)
            .send()
            .await
            .map_err(ResponderError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResponderError::Status(status.as_u16()));
        }

        Ok(())
    }
}
