use thiserror::Error;

use crate::switch::SwitchState;

/// Everything that can stop the relay.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The broker could not be reached before the first CONNACK.
    #[error("MQTT connection failed: {0}")]
    Connect(#[from] rumqttc::ConnectionError),

    /// The MQTT client rejected a request (subscribe).
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    /// An inbound payload could not be turned into a switch state.
    #[error("invalid switch payload: {0}")]
    Decode(#[from] DecodeError),

    /// The state has no entry in the open/closed status table.
    #[error("switch state {0} has no status word (expected 0 or 1)")]
    UnsupportedState(SwitchState),

    /// Outbound call failed, or the profile API answered with an error status.
    #[error("forward request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// OAuth signing key was rejected.
    #[error("failed to sign request: {0}")]
    Signing(String),

    /// The subscriber task panicked or was cancelled.
    #[error("subscriber task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing 'value' field")]
    MissingValue,

    #[error("'value' must be a boolean or an integer, got {0}")]
    InvalidValue(serde_json::Value),
}
