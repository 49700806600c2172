//! Status board — the latest known state of every room, for the dashboard.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use serde::Serialize;

use mistguard_domain::detector::DetectorState;
use mistguard_domain::id::{DeviceKey, EventId, RoomId};
use mistguard_domain::learning::ControlThresholds;
use mistguard_domain::mold::MoldRiskAssessment;
use mistguard_domain::reading::SensorSnapshot;

/// What the dashboard shows for one room.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomStatus {
    pub room_id: RoomId,
    pub dehumidifier: DeviceKey,
    pub reading: Option<SensorSnapshot>,
    pub risk: Option<MoldRiskAssessment>,
    pub detector: DetectorState,
    pub baseline_humidity: Option<f64>,
    pub open_event: Option<EventId>,
    pub device_on: bool,
    pub thresholds: ControlThresholds,
}

impl RoomStatus {
    /// Status of a room nothing has been read for yet.
    #[must_use]
    pub fn new(room_id: RoomId, dehumidifier: DeviceKey, thresholds: ControlThresholds) -> Self {
        Self {
            room_id,
            dehumidifier,
            reading: None,
            risk: None,
            detector: DetectorState::Idle,
            baseline_humidity: None,
            open_event: None,
            device_on: false,
            thresholds,
        }
    }
}

/// Shared, read-mostly map of room statuses.
#[derive(Debug, Default)]
pub struct StatusBoard {
    rooms: RwLock<BTreeMap<RoomId, RoomStatus>>,
}

impl StatusBoard {
    /// Insert or replace the status of a room.
    pub fn publish(&self, status: RoomStatus) {
        self.rooms
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(status.room_id.clone(), status);
    }

    /// Update the status of a known room in place.
    pub fn update(&self, room_id: &RoomId, apply: impl FnOnce(&mut RoomStatus)) {
        let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(status) = rooms.get_mut(room_id) {
            apply(status);
        }
    }

    #[must_use]
    pub fn get(&self, room_id: &RoomId) -> Option<RoomStatus> {
        self.rooms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(room_id)
            .cloned()
    }

    /// All rooms, ordered by id.
    #[must_use]
    pub fn list(&self) -> Vec<RoomStatus> {
        self.rooms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}
