//! MQTT platform configuration.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the MQTT platform.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Topic prefix; state is read from `{base}/{room}/state` and commands
    /// go to `{base}/{device}/set`.
    pub base_topic: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// Cached readings older than this are reported as missing.
    pub max_reading_age_secs: u64,
    /// Pause before polling the event loop again after a connection error.
    pub reconnect_delay_secs: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "mistguard".to_string(),
            base_topic: "mistguard".to_string(),
            keep_alive_secs: 30,
            max_reading_age_secs: 300,
            reconnect_delay_secs: 5,
        }
    }
}

impl MqttConfig {
    #[must_use]
    pub fn max_reading_age(&self) -> chrono::TimeDelta {
        mistguard_domain::time::seconds(self.max_reading_age_secs)
    }

    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}
