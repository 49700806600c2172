//! Runtime choice between the virtual and the MQTT platform.

use mistguard_adapter_mqtt::MqttPlatform;
use mistguard_adapter_virtual::VirtualPlatform;
use mistguard_app::ports::Platform;
use mistguard_domain::error::MistguardError;
use mistguard_domain::id::{DeviceKey, RoomId};
use mistguard_domain::reading::SensorSnapshot;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::{Config, PlatformKind};

/// The configured platform. The services are generic over [`Platform`], so
/// this enum is the only place the two implementations meet.
pub enum AnyPlatform {
    Virtual(VirtualPlatform),
    Mqtt(MqttPlatform),
}

impl AnyPlatform {
    /// Build the platform named by the configuration. The MQTT platform comes
    /// with the task driving its event loop.
    pub fn from_config(
        config: &Config,
        shutdown: watch::Receiver<bool>,
    ) -> (Self, Option<JoinHandle<()>>) {
        match config.platform.kind {
            PlatformKind::Virtual => {
                let platform = config
                    .rooms
                    .iter()
                    .fold(VirtualPlatform::default(), |platform, room| {
                        platform
                            .with_room(room.id.clone())
                            .with_switch(room.dehumidifier.clone())
                    });
                (Self::Virtual(platform), None)
            }
            PlatformKind::Mqtt => {
                let (platform, task) = MqttPlatform::start(&config.platform.mqtt, shutdown);
                (Self::Mqtt(platform), Some(task))
            }
        }
    }
}

impl Platform for AnyPlatform {
    fn name(&self) -> &'static str {
        match self {
            Self::Virtual(platform) => platform.name(),
            Self::Mqtt(platform) => platform.name(),
        }
    }

    async fn read_sensor(
        &self,
        room_id: &RoomId,
    ) -> Result<Option<SensorSnapshot>, MistguardError> {
        match self {
            Self::Virtual(platform) => platform.read_sensor(room_id).await,
            Self::Mqtt(platform) => platform.read_sensor(room_id).await,
        }
    }

    async fn set_device_state(
        &self,
        device_id: &DeviceKey,
        on: bool,
    ) -> Result<(), MistguardError> {
        match self {
            Self::Virtual(platform) => platform.set_device_state(device_id, on).await,
            Self::Mqtt(platform) => platform.set_device_state(device_id, on).await,
        }
    }

    async fn test_connectivity(&self) -> Result<(), MistguardError> {
        match self {
            Self::Virtual(platform) => platform.test_connectivity().await,
            Self::Mqtt(platform) => platform.test_connectivity().await,
        }
    }
}
