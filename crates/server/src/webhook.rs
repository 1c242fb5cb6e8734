use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    routing::any,
    Router,
};
use chrono::Utc;
use slashbot_core::errors::ApplicationError;
use slashbot_slack::commands::{CommandInvocation, SlashCommandPayload};
use slashbot_slack::responder::HttpReplySender;
use slashbot_slack::service::SlashCommandService;
use slashbot_slack::verify::RequestVerifier;
use tokio_util::task::TaskTracker;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::bootstrap::Application;

#[derive(Clone)]
pub struct WebhookState {
    verifier: Arc<RequestVerifier>,
    service: Arc<SlashCommandService<HttpReplySender>>,
    deliveries: TaskTracker,
}

impl WebhookState {
    pub fn from_application(app: &Application) -> Self {
        Self {
            verifier: app.verifier.clone(),
            service: app.service.clone(),
            deliveries: app.deliveries.clone(),
        }
    }
}

/// Slack posts every slash command to the same URL; any method reaches the handler
/// so that non-POST requests get a 405 from verification rather than routing.
pub fn router(state: WebhookState) -> Router {
    Router::new().route("/", any(receive_command)).with_state(state)
}

/// Acknowledges within the request; the reply is delivered later by a task on the
/// application's delivery tracker.
pub async fn receive_command(
    State(state): State<WebhookState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let correlation_id = Uuid::new_v4().to_string();
    let now = Utc::now().timestamp();

    let verified = match state.verifier.verify(&method, &headers, &body, now) {
        Ok(verified) => verified,
        Err(rejection) => {
            let rejection = ApplicationError::from(rejection).into_interface(correlation_id);
            warn!(
                event_name = "slack.webhook.rejected",
                correlation_id = %rejection.correlation_id(),
                status = rejection.status_code(),
                error = %rejection,
                "inbound webhook rejected"
            );
            return StatusCode::from_u16(rejection.status_code())
                .unwrap_or(StatusCode::UNAUTHORIZED);
        }
    };

    let payload = match SlashCommandPayload::from_form(verified) {
        Ok(payload) => payload,
        Err(parse_error) => {
            warn!(
                event_name = "slack.webhook.unparseable",
                correlation_id = %correlation_id,
                error = %parse_error,
                "verified webhook body could not be decoded"
            );
            return StatusCode::OK;
        }
    };

    if payload.is_health_probe() {
        info!(
            event_name = "slack.webhook.ssl_check",
            correlation_id = %correlation_id,
            "ssl check acknowledged"
        );
        return StatusCode::OK;
    }

    let invocation = match CommandInvocation::from_payload(payload) {
        Ok(invocation) => invocation,
        Err(parse_error) => {
            warn!(
                event_name = "slack.webhook.unparseable",
                correlation_id = %correlation_id,
                error = %parse_error,
                "verified webhook carried no usable command"
            );
            return StatusCode::OK;
        }
    };

    info!(
        event_name = "slack.webhook.accepted",
        correlation_id = %correlation_id,
        command = %invocation.command_name,
        argument_count = invocation.arguments.len(),
        "slash command acknowledged"
    );

    let span = info_span!(
        "slash_command",
        correlation_id = %correlation_id,
        command = %invocation.command_name
    );
    let service = state.service.clone();
    state.deliveries.spawn(
        async move {
            service.process(invocation).await;
        }
        .instrument(span),
    );

    StatusCode::OK
}
