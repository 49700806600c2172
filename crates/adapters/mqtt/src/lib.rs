//! # mistguard-adapter-mqtt
//!
//! MQTT platform — reads room climate from state topics and switches devices
//! by publishing commands.
//!
//! ## Topics
//!
//! | Direction | Topic | Payload |
//! |-----------|-------|---------|
//! | in | `{base}/{room}/state` | `{"temperature": 21.5, "humidity": 64.0, "window_open": false}` |
//! | out | `{base}/{device}/set` | `ON` / `OFF` |
//!
//! The latest reading of each room is cached; a reading older than
//! `max_reading_age_secs` counts as missing. The platform is connected once
//! the broker has acknowledged the session and until the event loop reports
//! an error.
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `mistguard-app` and `mistguard-domain`.

pub mod config;
mod error;
mod state;
mod topic;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use mistguard_app::ports::Platform;
use mistguard_domain::error::MistguardError;
use mistguard_domain::id::{DeviceKey, RoomId};
use mistguard_domain::reading::SensorSnapshot;
use mistguard_domain::time::{Timestamp, now};

pub use config::MqttConfig;
pub use error::MqttError;

/// Capacity of the request channel between the client and the event loop.
const REQUEST_CAPACITY: usize = 32;

/// State shared by the platform handle and the event-loop task.
struct Shared {
    base_topic: String,
    readings: state::ReadingCache,
    connected: AtomicBool,
}

impl Shared {
    fn new(base_topic: String) -> Self {
        Self {
            base_topic,
            readings: state::ReadingCache::default(),
            connected: AtomicBool::new(false),
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn handle_publish(
        &self,
        topic: &str,
        payload: &[u8],
        received_at: Timestamp,
    ) -> Result<RoomId, MqttError> {
        let room_id = topic::room_from_state_topic(&self.base_topic, topic)?;
        let snapshot = state::parse_state(room_id.clone(), payload, received_at)?;
        self.readings.store(snapshot);
        Ok(room_id)
    }
}

/// Platform backed by an MQTT broker.
pub struct MqttPlatform {
    client: AsyncClient,
    shared: Arc<Shared>,
    max_reading_age: chrono::TimeDelta,
}

impl MqttPlatform {
    /// Create the client and spawn the task driving its event loop.
    ///
    /// The task subscribes to every room's state topic on each ConnAck and
    /// stops when `shutdown` flips.
    #[must_use]
    pub fn start(config: &MqttConfig, shutdown: watch::Receiver<bool>) -> (Self, JoinHandle<()>) {
        let mut options = MqttOptions::new(
            config.client_id.clone(),
            config.broker_host.clone(),
            config.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(u64::from(config.keep_alive_secs)));
        let (client, event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);

        let platform = Self::with_client(config, client.clone());
        let worker = EventLoopTask {
            client,
            shared: Arc::clone(&platform.shared),
            reconnect_delay: config.reconnect_delay(),
        };
        let handle = tokio::spawn(worker.run(event_loop, shutdown));
        (platform, handle)
    }

    fn with_client(config: &MqttConfig, client: AsyncClient) -> Self {
        Self {
            client,
            shared: Arc::new(Shared::new(config.base_topic.clone())),
            max_reading_age: config.max_reading_age(),
        }
    }

    fn ensure_connected(&self) -> Result<(), MqttError> {
        if self.shared.is_connected() {
            Ok(())
        } else {
            Err(MqttError::NotConnected)
        }
    }
}

impl Platform for MqttPlatform {
    fn name(&self) -> &'static str {
        "mqtt"
    }

    async fn read_sensor(
        &self,
        room_id: &RoomId,
    ) -> Result<Option<SensorSnapshot>, MistguardError> {
        Ok(self
            .shared
            .readings
            .fresh(room_id, now(), self.max_reading_age))
    }

    async fn set_device_state(
        &self,
        device_id: &DeviceKey,
        on: bool,
    ) -> Result<(), MistguardError> {
        self.ensure_connected()?;
        let topic = topic::command_topic(&self.shared.base_topic, device_id);
        let payload = if on { "ON" } else { "OFF" };
        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .await
            .map_err(MqttError::from)?;
        tracing::debug!(device_id = %device_id, payload, "command published");
        Ok(())
    }

    async fn test_connectivity(&self) -> Result<(), MistguardError> {
        self.ensure_connected()?;
        Ok(())
    }
}

/// Drives the rumqttc event loop: tracks the connection and feeds the cache.
struct EventLoopTask {
    client: AsyncClient,
    shared: Arc<Shared>,
    reconnect_delay: Duration,
}

impl EventLoopTask {
    async fn run(self, mut event_loop: EventLoop, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                event = event_loop.poll() => match event {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => self.on_connected(),
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        if let Err(err) =
                            self.shared.handle_publish(&publish.topic, &publish.payload, now())
                        {
                            tracing::warn!(
                                topic = %publish.topic,
                                error = %err,
                                "ignoring MQTT message"
                            );
                        }
                    }
                    Ok(_) => {}
                    Err(err) => {
                        if self.shared.connected.swap(false, Ordering::SeqCst) {
                            tracing::error!(error = %err, "MQTT connection lost");
                        } else {
                            tracing::warn!(error = %err, "MQTT connection attempt failed");
                        }
                        tokio::time::sleep(self.reconnect_delay).await;
                    }
                },
                _ = shutdown.changed() => break,
            }
        }
        self.shared.connected.store(false, Ordering::SeqCst);
        tracing::info!("MQTT event loop stopped");
    }

    fn on_connected(&self) {
        self.shared.connected.store(true, Ordering::SeqCst);
        let filter = topic::state_filter(&self.shared.base_topic);
        // try_subscribe: the request channel is drained by this very loop.
        match self.client.try_subscribe(filter.as_str(), QoS::AtLeastOnce) {
            Ok(()) => tracing::info!(filter = %filter, "MQTT connected, subscribed"),
            Err(err) => tracing::error!(filter = %filter, error = %err, "MQTT subscribe failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    /// The event loop is never polled, but must outlive the client for
    /// requests to be queued.
    fn platform() -> (MqttPlatform, EventLoop) {
        let config = MqttConfig {
            base_topic: "home".to_string(),
            ..MqttConfig::default()
        };
        let options = MqttOptions::new("test", "localhost", 1883);
        let (client, event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);
        (MqttPlatform::with_client(&config, client), event_loop)
    }

    fn room() -> RoomId {
        RoomId::new("bathroom").unwrap()
    }

    #[tokio::test]
    async fn should_return_mqtt_as_name() {
        let (platform, _event_loop) = platform();
        assert_eq!(platform.name(), "mqtt");
    }

    #[tokio::test]
    async fn should_serve_cached_reading_from_state_topic() {
        let (platform, _event_loop) = platform();
        let payload = br#"{"temperature": 22.0, "humidity": 77.5}"#;
        let room_id = platform
            .shared
            .handle_publish(&topic::state_topic("home", &room()), payload, now())
            .unwrap();
        assert_eq!(room_id, room());

        let snapshot = platform.read_sensor(&room()).await.unwrap().unwrap();
        assert!((snapshot.relative_humidity - 77.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn should_report_no_reading_when_cache_is_stale() {
        let (platform, _event_loop) = platform();
        let payload = br#"{"temperature": 22.0, "humidity": 77.5}"#;
        platform
            .shared
            .handle_publish(
                &topic::state_topic("home", &room()),
                payload,
                now() - TimeDelta::hours(1),
            )
            .unwrap();

        assert!(platform.read_sensor(&room()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_ignore_messages_on_foreign_topics() {
        let (platform, _event_loop) = platform();
        let payload = br#"{"temperature": 22.0, "humidity": 77.5}"#;
        let err = platform
            .shared
            .handle_publish("elsewhere/bathroom/state", payload, now())
            .unwrap_err();
        assert!(matches!(err, MqttError::UnexpectedTopic(_)));
        assert!(platform.read_sensor(&room()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_refuse_commands_before_connack() {
        let (platform, _event_loop) = platform();
        let device = DeviceKey::new("switch.dehumidifier").unwrap();

        assert!(platform.test_connectivity().await.is_err());
        let err = platform.set_device_state(&device, true).await.unwrap_err();
        assert!(matches!(err, MistguardError::Platform(_)));
    }

    #[tokio::test]
    async fn should_queue_command_once_connected() {
        let (platform, _event_loop) = platform();
        platform.shared.connected.store(true, Ordering::SeqCst);
        let device = DeviceKey::new("switch.dehumidifier").unwrap();

        assert!(platform.test_connectivity().await.is_ok());
        platform.set_device_state(&device, true).await.unwrap();
    }
}
