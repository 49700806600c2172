//! Platform port — the home-automation hub that reports readings and
//! switches devices.
//!
//! Two implementations exist (virtual and MQTT); which one runs is a matter
//! of configuration, and nothing in the core branches on it.

use std::future::Future;
use std::sync::Arc;

use mistguard_domain::error::MistguardError;
use mistguard_domain::id::{DeviceKey, RoomId};
use mistguard_domain::reading::SensorSnapshot;

/// Sensor and actuation capability of a home-automation platform.
pub trait Platform {
    /// Short name for logs (e.g. `"virtual"`).
    fn name(&self) -> &'static str;

    /// Current climate of a room. `None` when no fresh reading is available.
    fn read_sensor(
        &self,
        room_id: &RoomId,
    ) -> impl Future<Output = Result<Option<SensorSnapshot>, MistguardError>> + Send;

    /// Switch a device on or off.
    ///
    /// Returns [`MistguardError::Platform`] when the hub is unreachable or
    /// refused the command.
    fn set_device_state(
        &self,
        device_id: &DeviceKey,
        on: bool,
    ) -> impl Future<Output = Result<(), MistguardError>> + Send;

    /// Check that the hub can be reached.
    fn test_connectivity(&self) -> impl Future<Output = Result<(), MistguardError>> + Send;
}

impl<T: Platform + Send + Sync> Platform for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn read_sensor(
        &self,
        room_id: &RoomId,
    ) -> impl Future<Output = Result<Option<SensorSnapshot>, MistguardError>> + Send {
        (**self).read_sensor(room_id)
    }

    fn set_device_state(
        &self,
        device_id: &DeviceKey,
        on: bool,
    ) -> impl Future<Output = Result<(), MistguardError>> + Send {
        (**self).set_device_state(device_id, on)
    }

    fn test_connectivity(&self) -> impl Future<Output = Result<(), MistguardError>> + Send {
        (**self).test_connectivity()
    }
}
