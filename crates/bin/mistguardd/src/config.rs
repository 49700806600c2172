//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `mistguard.toml` in the working directory, or the file named by
//! `MISTGUARD_CONFIG`. Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values, and the
//! result is validated once before anything starts.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::Deserialize;

use mistguard_adapter_mqtt::MqttConfig;
use mistguard_app::services::bathroom_monitor::RoomSetup;
use mistguard_domain::error::ValidationError;
use mistguard_domain::id::{DeviceKey, RoomId};
use mistguard_domain::settings::AutomationSettings;

const DEFAULT_CONFIG_PATH: &str = "mistguard.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Thresholds, delays, learning gates, operating mode and safety rules.
    pub automation: AutomationSettings,
    /// Which home-automation platform to talk to.
    pub platform: PlatformConfig,
    /// Monitored rooms.
    pub rooms: Vec<RoomConfig>,
    /// Schedule of the threshold learner.
    pub learning: LearningConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    /// Simulated rooms and switches.
    #[default]
    Virtual,
    /// MQTT broker.
    Mqtt,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub kind: PlatformKind,
    /// Only read when `kind = "mqtt"`.
    pub mqtt: MqttConfig,
}

/// One `[[rooms]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomConfig {
    pub id: RoomId,
    /// Platform key of the dehumidifier switch.
    pub dehumidifier: DeviceKey,
    /// Seconds between two decision cycles.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    60
}

impl RoomConfig {
    #[must_use]
    pub fn setup(&self) -> RoomSetup {
        RoomSetup {
            room_id: self.id.clone(),
            dehumidifier: self.dehumidifier.clone(),
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Hours between two learning passes over every room.
    pub interval_hours: u64,
}

impl LearningConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_hours.saturating_mul(3600))
    }
}

impl Config {
    /// Load configuration from the config file (if present) then apply
    /// environment-variable overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, an
    /// override cannot be parsed, or a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("MISTGUARD_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = lookup("MISTGUARD_HOST") {
            self.server.host = val;
        }
        if let Some(val) = lookup("MISTGUARD_PORT") {
            self.server.port = val
                .parse()
                .map_err(|_| ConfigError::Override("MISTGUARD_PORT", val))?;
        }
        if let Some(val) = lookup("MISTGUARD_BIND") {
            let (host, port) = val
                .rsplit_once(':')
                .ok_or_else(|| ConfigError::Override("MISTGUARD_BIND", val.clone()))?;
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::Override("MISTGUARD_BIND", val.clone()))?;
            self.server.host = host.to_string();
        }
        if let Some(val) = lookup("MISTGUARD_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = lookup("MISTGUARD_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("MISTGUARD_MODE") {
            self.automation.operating_mode = val
                .parse()
                .map_err(|_| ConfigError::Override("MISTGUARD_MODE", val))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        self.automation.validate()?;
        if self.rooms.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [[rooms]] entry is required".to_string(),
            ));
        }
        let mut seen = BTreeSet::new();
        for room in &self.rooms {
            if !seen.insert(&room.id) {
                return Err(ValidationError::DuplicateRoom(room.id.to_string()).into());
            }
            if room.interval_secs == 0 {
                return Err(ValidationError::NotPositive {
                    field: "rooms.interval_secs",
                }
                .into());
            }
        }
        if self.learning.interval_hours == 0 {
            return Err(ValidationError::NotPositive {
                field: "learning.interval_hours",
            }
            .into());
        }
        if self.platform.kind == PlatformKind::Mqtt
            && self.platform.mqtt.max_reading_age_secs == 0
        {
            return Err(ValidationError::NotPositive {
                field: "platform.mqtt.max_reading_age_secs",
            }
            .into());
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Room ids in configuration order.
    #[must_use]
    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.iter().map(|room| room.id.clone()).collect()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:mistguard.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "mistguardd=info,mistguard=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self { interval_hours: 24 }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// An environment override could not be parsed.
    #[error("invalid value for {0}: {1}")]
    Override(&'static str, String),
    /// A domain setting is out of range.
    #[error("invalid automation settings")]
    Settings(#[from] ValidationError),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use mistguard_domain::decision::OperatingMode;
    use std::collections::HashMap;

    const ONE_ROOM: &str = "
        [[rooms]]
        id = 'bathroom'
        dehumidifier = 'switch.bathroom_dehumidifier'
    ";

    fn one_room() -> Config {
        toml::from_str(ONE_ROOM).unwrap()
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.url, "sqlite:mistguard.db?mode=rwc");
        assert_eq!(config.platform.kind, PlatformKind::Virtual);
        assert_eq!(config.automation.operating_mode, OperatingMode::Auto);
        assert_eq!(config.learning.interval(), Duration::from_secs(86_400));
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [server]
            host = '127.0.0.1'
            port = 9090

            [database]
            url = 'sqlite:test.db'

            [logging]
            filter = 'debug'

            [automation]
            humidity_threshold_high = 72.0
            operating_mode = 'manual'
            safety_rules = [{ rule = 'no_activation_while_window_open' }]

            [platform]
            kind = 'mqtt'

            [platform.mqtt]
            broker_host = 'broker.local'
            base_topic = 'home'

            [[rooms]]
            id = 'bathroom'
            dehumidifier = 'switch.bathroom_dehumidifier'
            interval_secs = 30

            [[rooms]]
            id = 'ensuite'
            dehumidifier = 'switch.ensuite_fan'

            [learning]
            interval_hours = 12
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.database.url, "sqlite:test.db");
        assert_eq!(config.logging.filter, "debug");
        assert!((config.automation.humidity_threshold_high - 72.0).abs() < f64::EPSILON);
        assert_eq!(config.automation.operating_mode, OperatingMode::Manual);
        assert_eq!(config.platform.kind, PlatformKind::Mqtt);
        assert_eq!(config.platform.mqtt.broker_host, "broker.local");
        assert_eq!(config.rooms.len(), 2);
        assert_eq!(config.rooms[0].interval(), Duration::from_secs(30));
        assert_eq!(config.rooms[1].interval_secs, 60);
        assert_eq!(config.learning.interval_hours, 12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_reject_blank_room_id() {
        let toml = "
            [[rooms]]
            id = ' '
            dehumidifier = 'switch.fan'
        ";
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_require_at_least_one_room() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = one_room();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_duplicate_rooms() {
        let mut config = one_room();
        config.rooms.push(config.rooms[0].clone());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Settings(ValidationError::DuplicateRoom(room))) if room == "bathroom"
        ));
    }

    #[test]
    fn should_reject_zero_intervals() {
        let mut config = one_room();
        config.rooms[0].interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = one_room();
        config.learning.interval_hours = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_inverted_thresholds() {
        let mut config = one_room();
        config.automation.humidity_threshold_low = 80.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Settings(ValidationError::ThresholdOrder { .. }))
        ));
    }

    #[test]
    fn should_apply_environment_overrides() {
        let mut config = one_room();
        config
            .apply_overrides(env(&[
                ("MISTGUARD_BIND", "127.0.0.1:8080"),
                ("MISTGUARD_DATABASE_URL", "sqlite::memory:"),
                ("MISTGUARD_LOG", "debug"),
                ("MISTGUARD_MODE", "Learning"),
            ]))
            .unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.database_url(), "sqlite::memory:");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.automation.operating_mode, OperatingMode::Learning);
    }

    #[test]
    fn should_prefer_rust_log_over_mistguard_log() {
        let mut config = one_room();
        config
            .apply_overrides(env(&[("MISTGUARD_LOG", "debug"), ("RUST_LOG", "trace")]))
            .unwrap();
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_reject_unknown_mode_override() {
        let mut config = one_room();
        let err = config
            .apply_overrides(env(&[("MISTGUARD_MODE", "turbo")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Override("MISTGUARD_MODE", _)));
    }

    #[test]
    fn should_reject_malformed_bind_override() {
        let mut config = one_room();
        assert!(
            config
                .apply_overrides(env(&[("MISTGUARD_BIND", "localhost")]))
                .is_err()
        );
    }

    #[test]
    fn should_format_bind_addr() {
        let config = Config::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
    }
}
