mod bootstrap;
mod commands;
mod health;
mod webhook;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use slashbot_core::config::{AppConfig, LoadOptions};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio_util::task::TaskTracker;

fn init_logging(config: &AppConfig) {
    use slashbot_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;
    let routes = app_router(&app);

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = TcpListener::bind(&address).await?;
    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "slashbot-server listening"
    );

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    let shutdown = serve(listener, routes, app.deliveries.clone(), wait_for_shutdown(), grace);
    if let Shutdown::TimedOut { pending } = shutdown.await? {
        tracing::warn!(
            event_name = "system.server.shutdown_timeout",
            correlation_id = "shutdown",
            grace_secs = app.config.server.graceful_shutdown_secs,
            pending_deliveries = pending,
            "in-flight requests did not finish before the shutdown window closed"
        );
    }

    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Shutdown {
    Drained,
    TimedOut { pending: usize },
}

/// Serves until `stop` resolves, then stops accepting requests and waits up to
/// `grace` for open connections and acknowledged deliveries to finish.
async fn serve(
    listener: TcpListener,
    routes: Router,
    deliveries: TaskTracker,
    stop: impl Future<Output = Result<()>>,
    grace: Duration,
) -> Result<Shutdown> {
    let shutdown = Arc::new(Notify::new());
    let notified = shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, routes)
            .with_graceful_shutdown(async move { notified.notified().await })
            .await
    });

    tokio::select! {
        joined = &mut server => {
            joined??;
            return Ok(Shutdown::Drained);
        }
        signal = stop => signal?,
    }

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        pending_deliveries = deliveries.len(),
        "slashbot-server stopping"
    );
    shutdown.notify_one();
    deliveries.close();

    let drained = tokio::time::timeout(grace, async {
        let served = server.await;
        deliveries.wait().await;
        served
    })
    .await;

    match drained {
        Ok(joined) => {
            joined??;
            Ok(Shutdown::Drained)
        }
        Err(_) => Ok(Shutdown::TimedOut { pending: deliveries.len() }),
    }
}

fn app_router(app: &bootstrap::Application) -> Router {
    let command_names =
        app.service.registry().names().into_iter().map(str::to_owned).collect::<Vec<_>>();

    webhook::router(webhook::WebhookState::from_application(app))
        .merge(health::router(command_names))
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::time::Duration;

    use chrono::Utc;
    use slashbot_core::config::AppConfig;
    use slashbot_slack::verify::{
        compute_signature, FORM_CONTENT_TYPE, SIGNATURE_HEADER, TIMESTAMP_HEADER,
    };
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{app_router, serve, Shutdown};
    use crate::bootstrap::bootstrap_with_config;

    const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";

    async fn slow_reply_endpoint(delay: Duration) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(delay))
            .mount(&server)
            .await;
        server
    }

    async fn post_signed_echo(address: SocketAddr, response_url: &str) -> reqwest::StatusCode {
        let body = serde_urlencoded::to_string([
            ("command", "/bot"),
            ("text", "echo draining"),
            ("response_url", response_url),
        ])
        .expect("form encodes");
        let timestamp = Utc::now().timestamp().to_string();
        let signature = compute_signature(SECRET, &timestamp, body.as_bytes());

        reqwest::Client::new()
            .post(format!("http://{address}/"))
            .header("content-type", FORM_CONTENT_TYPE)
            .header(TIMESTAMP_HEADER, &timestamp)
            .header(SIGNATURE_HEADER, signature)
            .body(body)
            .send()
            .await
            .expect("webhook responds")
            .status()
    }

    /// Acknowledges one echo command against a reply endpoint that answers after
    /// `reply_delay`, then stops the server with the given grace window.
    async fn stop_after_one_delivery(
        reply_delay: Duration,
        grace: Duration,
    ) -> (Shutdown, MockServer) {
        let replies = slow_reply_endpoint(reply_delay).await;

        let mut config = AppConfig::default();
        config.slack.signing_secret = SECRET.to_owned().into();
        let app = bootstrap_with_config(config).expect("bootstrap");
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("local addr");

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let stop = async move {
            let _ = stop_rx.await;
            Ok::<(), anyhow::Error>(())
        };
        let server =
            tokio::spawn(serve(listener, app_router(&app), app.deliveries.clone(), stop, grace));

        let status = post_signed_echo(address, &replies.uri()).await;
        assert_eq!(status, reqwest::StatusCode::OK);

        stop_tx.send(()).expect("server is still waiting for the stop signal");
        let shutdown = server.await.expect("serve task joins").expect("serve succeeds");
        (shutdown, replies)
    }

    #[tokio::test]
    async fn shutdown_waits_for_acknowledged_reply_to_be_delivered() {
        let (shutdown, replies) =
            stop_after_one_delivery(Duration::from_millis(500), Duration::from_secs(5)).await;

        assert_eq!(shutdown, Shutdown::Drained);
        let received = replies.received_requests().await.unwrap_or_default();
        assert_eq!(received.len(), 1);
    }

    #[tokio::test]
    async fn shutdown_gives_up_on_deliveries_after_the_grace_window() {
        let (shutdown, _replies) =
            stop_after_one_delivery(Duration::from_secs(3), Duration::from_millis(100)).await;

        assert_eq!(shutdown, Shutdown::TimedOut { pending: 1 });
    }
}
