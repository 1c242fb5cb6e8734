use chrono::Utc;
use secrecy::ExposeSecret;
use serde_json::json;
use slashbot_core::config::{AppConfig, LoadOptions};
use slashbot_slack::verify::{compute_signature, SIGNATURE_HEADER, TIMESTAMP_HEADER};

use crate::commands::CommandResult;

/// Produces the two headers Slack would attach to `body`, so a local server can be
/// exercised with curl.
pub fn run(options: LoadOptions, body: &str, timestamp: Option<i64>) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("sign", "config_validation", error.to_string(), 2)
        }
    };

    let timestamp = timestamp.unwrap_or_else(|| Utc::now().timestamp()).to_string();
    let signature =
        compute_signature(config.slack.signing_secret.expose_secret(), &timestamp, body.as_bytes());

    CommandResult::success(
        "sign",
        format!("signed {} byte body at timestamp {timestamp}", body.len()),
        Some(json!({
            "headers": {
                TIMESTAMP_HEADER: timestamp,
                SIGNATURE_HEADER: signature,
            }
        })),
    )
}
