//! # mistguard-adapter-virtual
//!
//! Simulated platform for demos and end-to-end tests. Rooms and switches are
//! registered up front; readings are dialled in through setters and switch
//! positions can be inspected afterwards.
//!
//! Failure modes can be toggled at runtime: [`VirtualPlatform::set_offline`]
//! makes every call fail, [`VirtualPlatform::set_reject_commands`] only
//! refuses actuation.
//!
//! ## Dependency rule
//!
//! Depends on `mistguard-app` (port traits) and `mistguard-domain` only.

mod devices;
mod error;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use mistguard_app::ports::Platform;
use mistguard_domain::error::MistguardError;
use mistguard_domain::id::{DeviceKey, RoomId};
use mistguard_domain::reading::SensorSnapshot;

pub use devices::{VirtualRoom, VirtualSwitch};
pub use error::VirtualError;

/// Resting climate of a freshly registered room.
const DEFAULT_TEMPERATURE: f64 = 21.0;
const DEFAULT_HUMIDITY: f64 = 55.0;

/// In-memory platform with simulated rooms and switches.
#[derive(Default)]
pub struct VirtualPlatform {
    rooms: HashMap<RoomId, VirtualRoom>,
    switches: HashMap<DeviceKey, VirtualSwitch>,
    offline: AtomicBool,
    reject_commands: AtomicBool,
}

impl VirtualPlatform {
    /// Register a room at a resting climate of 21 °C / 55 %.
    #[must_use]
    pub fn with_room(self, room_id: RoomId) -> Self {
        self.with_room_climate(room_id, DEFAULT_TEMPERATURE, DEFAULT_HUMIDITY)
    }

    #[must_use]
    pub fn with_room_climate(
        mut self,
        room_id: RoomId,
        temperature: f64,
        relative_humidity: f64,
    ) -> Self {
        self.rooms.insert(
            room_id.clone(),
            VirtualRoom::new(room_id, temperature, relative_humidity),
        );
        self
    }

    #[must_use]
    pub fn with_switch(mut self, device_id: DeviceKey) -> Self {
        self.switches
            .insert(device_id.clone(), VirtualSwitch::new(device_id));
        self
    }

    #[must_use]
    pub fn room(&self, room_id: &RoomId) -> Option<&VirtualRoom> {
        self.rooms.get(room_id)
    }

    #[must_use]
    pub fn switch(&self, device_id: &DeviceKey) -> Option<&VirtualSwitch> {
        self.switches.get(device_id)
    }

    /// Whether the switch is currently on; `None` for an unknown device.
    #[must_use]
    pub fn is_on(&self, device_id: &DeviceKey) -> Option<bool> {
        self.switch(device_id).map(VirtualSwitch::is_on)
    }

    /// Replace the reading of a registered room. Returns `false` if the room
    /// is unknown.
    pub fn set_snapshot(&self, snapshot: &SensorSnapshot) -> bool {
        let Some(room) = self.room(&snapshot.room_id) else {
            return false;
        };
        room.set_snapshot(snapshot);
        true
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_reject_commands(&self, reject: bool) {
        self.reject_commands.store(reject, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), VirtualError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(VirtualError::Offline)
        } else {
            Ok(())
        }
    }
}

impl Platform for VirtualPlatform {
    fn name(&self) -> &'static str {
        "virtual"
    }

    async fn read_sensor(
        &self,
        room_id: &RoomId,
    ) -> Result<Option<SensorSnapshot>, MistguardError> {
        self.ensure_online()?;
        Ok(self.rooms.get(room_id).map(VirtualRoom::read))
    }

    async fn set_device_state(
        &self,
        device_id: &DeviceKey,
        on: bool,
    ) -> Result<(), MistguardError> {
        self.ensure_online()?;
        if self.reject_commands.load(Ordering::SeqCst) {
            return Err(VirtualError::Rejected(device_id.clone()).into());
        }
        let switch = self
            .switches
            .get(device_id)
            .ok_or_else(|| VirtualError::UnknownDevice(device_id.clone()))?;
        switch.set(on);
        tracing::debug!(device_id = %device_id, on, "virtual switch set");
        Ok(())
    }

    async fn test_connectivity(&self) -> Result<(), MistguardError> {
        self.ensure_online()?;
        Ok(())
    }
}
