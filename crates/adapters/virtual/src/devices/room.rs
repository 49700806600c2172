//! Virtual room sensor — holds the climate a test or demo has dialled in.

use std::sync::{Mutex, MutexGuard, PoisonError};

use mistguard_domain::id::RoomId;
use mistguard_domain::reading::SensorSnapshot;
use mistguard_domain::time::{Timestamp, now};

#[derive(Debug, Clone, Copy)]
struct Climate {
    temperature: f64,
    relative_humidity: f64,
    window_open: bool,
    /// Pinned reading time; `None` stamps each read with the wall clock.
    pinned_at: Option<Timestamp>,
}

/// A simulated room with a temperature/humidity sensor and a window contact.
pub struct VirtualRoom {
    room_id: RoomId,
    climate: Mutex<Climate>,
}

impl VirtualRoom {
    #[must_use]
    pub fn new(room_id: RoomId, temperature: f64, relative_humidity: f64) -> Self {
        Self {
            room_id,
            climate: Mutex::new(Climate {
                temperature,
                relative_humidity,
                window_open: false,
                pinned_at: None,
            }),
        }
    }

    #[must_use]
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Current reading of the room.
    #[must_use]
    pub fn read(&self) -> SensorSnapshot {
        let climate = *self.lock_climate();
        SensorSnapshot {
            room_id: self.room_id.clone(),
            timestamp: climate.pinned_at.unwrap_or_else(now),
            temperature: climate.temperature,
            relative_humidity: climate.relative_humidity,
            window_open: climate.window_open,
        }
    }

    pub fn set_climate(&self, temperature: f64, relative_humidity: f64) {
        let mut climate = self.lock_climate();
        climate.temperature = temperature;
        climate.relative_humidity = relative_humidity;
    }

    pub fn set_window(&self, open: bool) {
        self.lock_climate().window_open = open;
    }

    /// Replace the whole reading, timestamp included.
    pub fn set_snapshot(&self, snapshot: &SensorSnapshot) {
        *self.lock_climate() = Climate {
            temperature: snapshot.temperature,
            relative_humidity: snapshot.relative_humidity,
            window_open: snapshot.window_open,
            pinned_at: Some(snapshot.timestamp),
        };
    }

    fn lock_climate(&self) -> MutexGuard<'_, Climate> {
        self.climate.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
