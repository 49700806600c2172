//! Room state payloads and the cache of the latest reading per room.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::TimeDelta;
use serde::Deserialize;

use mistguard_domain::id::RoomId;
use mistguard_domain::reading::SensorSnapshot;
use mistguard_domain::time::Timestamp;

use crate::error::MqttError;

/// JSON published on `{base}/{room}/state`.
///
/// `timestamp` is optional; readings without one are stamped on receipt.
#[derive(Debug, Deserialize)]
struct StatePayload {
    temperature: f64,
    #[serde(alias = "relative_humidity")]
    humidity: f64,
    #[serde(default)]
    window_open: bool,
    #[serde(default)]
    timestamp: Option<Timestamp>,
}

/// Decode a state payload into a snapshot for `room_id`.
///
/// # Errors
///
/// Returns [`MqttError::PayloadParse`] for malformed JSON or missing fields.
pub fn parse_state(
    room_id: RoomId,
    payload: &[u8],
    received_at: Timestamp,
) -> Result<SensorSnapshot, MqttError> {
    let state: StatePayload = serde_json::from_slice(payload)?;
    Ok(SensorSnapshot {
        room_id,
        timestamp: state.timestamp.unwrap_or(received_at),
        temperature: state.temperature,
        relative_humidity: state.humidity,
        window_open: state.window_open,
    })
}

/// Latest reading per room.
#[derive(Default)]
pub struct ReadingCache {
    readings: Mutex<HashMap<RoomId, SensorSnapshot>>,
}

impl ReadingCache {
    /// Keep `snapshot` unless a newer reading is already cached.
    pub fn store(&self, snapshot: SensorSnapshot) {
        let mut readings = self.lock_readings();
        let newer = readings
            .get(&snapshot.room_id)
            .is_none_or(|cached| cached.timestamp <= snapshot.timestamp);
        if newer {
            readings.insert(snapshot.room_id.clone(), snapshot);
        }
    }

    /// The cached reading if it is no older than `max_age` at `now`.
    #[must_use]
    pub fn fresh(
        &self,
        room_id: &RoomId,
        now: Timestamp,
        max_age: TimeDelta,
    ) -> Option<SensorSnapshot> {
        self.lock_readings()
            .get(room_id)
            .filter(|snapshot| now - snapshot.timestamp <= max_age)
            .cloned()
    }

    fn lock_readings(&self) -> MutexGuard<'_, HashMap<RoomId, SensorSnapshot>> {
        self.readings.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
