mod config;
mod error;
mod forward;
mod mqtt;
mod relay;
mod switch;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::{Config, ForwardConfig, MISSING};
use crate::error::RelayError;
use crate::forward::Forwarder;
use crate::relay::Relay;
use crate::switch::StateTracker;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                let level = std::env::var("LOG_LEVEL").unwrap_or_default();
                tracing_subscriber::EnvFilter::new(log_level_directive(&level))
            }),
        )
        .init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Starting switch-relay (mode={}, mqtt={}:{}, topic={}, initial state={:?})",
        config.forward.mode(),
        config.mqtt.broker_host,
        config.mqtt.broker_port,
        config.mqtt.topic,
        config.initial_state,
    );
    warn_on_placeholders(&config.forward);

    if let Err(e) = run(config).await {
        error!("Relay stopped: {}", e);
        std::process::exit(1);
    }
    info!("switch-relay stopped");
}

async fn run(config: Config) -> Result<(), RelayError> {
    let forwarder = Forwarder::from_config(&config.forward)?;
    let relay = Relay::new(StateTracker::new(config.initial_state), forwarder);

    let (event_tx, event_rx) = mpsc::channel(100);
    let mqtt_client = mqtt::client::MqttClient::new(&config.mqtt);
    let subscriber = tokio::spawn(mqtt_client.run(event_tx));

    let relay_result = tokio::select! {
        result = relay.run(event_rx) => Some(result),
        signal = shutdown_signal() => {
            info!("Received {}, shutting down", signal);
            None
        }
    };

    match relay_result {
        // The queue only closes when the subscriber has stopped.
        Some(Ok(())) => subscriber.await?,
        Some(Err(e)) => {
            subscriber.abort();
            Err(e)
        }
        None => {
            subscriber.abort();
            Ok(())
        }
    }
}

async fn shutdown_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => tokio::select! {
            _ = tokio::signal::ctrl_c() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        },
        Err(e) => {
            warn!("Failed to register SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            "SIGINT"
        }
    }
}

/// Map a `LOG_LEVEL` value (DEBUG, INFO, WARNING, ERROR, CRITICAL) to a
/// tracing directive.
fn log_level_directive(level: &str) -> &'static str {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "WARN" | "WARNING" => "warn",
        "ERROR" | "CRITICAL" | "FATAL" => "error",
        _ => "info",
    }
}

fn warn_on_placeholders(forward: &ForwardConfig) {
    match forward {
        ForwardConfig::Profile(profile) if profile.credentials.any_missing() => {
            warn!("Profile API credentials are not fully configured; updates will be rejected");
        }
        ForwardConfig::Switchifier(switchifier) if switchifier.secret == MISSING => {
            warn!("SWITCHIFIER_SECRET is not configured; updates will be rejected");
        }
        _ => {}
    }
}
