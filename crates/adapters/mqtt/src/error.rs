//! MQTT adapter error types.

use mistguard_domain::error::MistguardError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// No ConnAck has been received since the last connection error.
    #[error("MQTT client not connected")]
    NotConnected,

    /// The rumqttc client returned an error.
    #[error("MQTT client error")]
    Client(#[from] rumqttc::ClientError),

    /// Failed to parse an incoming MQTT payload as JSON.
    #[error("failed to parse MQTT payload")]
    PayloadParse(#[from] serde_json::Error),

    /// A message arrived on a topic that does not follow `{base}/{room}/state`.
    #[error("unexpected MQTT topic {0}")]
    UnexpectedTopic(String),
}

impl From<MqttError> for MistguardError {
    fn from(err: MqttError) -> Self {
        Self::Platform(Box::new(err))
    }
}
