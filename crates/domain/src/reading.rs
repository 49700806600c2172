//! Sensor readings — the per-tick snapshot and the persisted measurement.

use serde::{Deserialize, Serialize};

use crate::error::ReadingError;
use crate::id::{EventId, RoomId};
use crate::time::Timestamp;

/// Lowest temperature the analysis accepts, in °C.
pub const MIN_TEMPERATURE: f64 = -40.0;
/// Highest temperature the analysis accepts, in °C.
pub const MAX_TEMPERATURE: f64 = 60.0;

/// Climate of one room at one instant, as reported by the platform.
///
/// Snapshots are ephemeral: the core never stores them directly, only the
/// [`Measurement`]s and records derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub room_id: RoomId,
    pub timestamp: Timestamp,
    /// Air temperature in °C.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub relative_humidity: f64,
    pub window_open: bool,
}

impl SensorSnapshot {
    /// Check that the reading is physically plausible.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadingError`] when a value is not finite, the humidity is
    /// outside `(0, 100]` or the temperature is outside `[-40, 60]` °C.
    pub fn validate(&self) -> Result<(), ReadingError> {
        validate_climate(self.temperature, self.relative_humidity)
    }
}

/// Validate a temperature / relative humidity pair.
///
/// # Errors
///
/// See [`SensorSnapshot::validate`].
pub fn validate_climate(temperature: f64, relative_humidity: f64) -> Result<(), ReadingError> {
    if !temperature.is_finite() || !relative_humidity.is_finite() {
        return Err(ReadingError::NotFinite);
    }
    if relative_humidity <= 0.0 || relative_humidity > 100.0 {
        return Err(ReadingError::HumidityOutOfRange(relative_humidity));
    }
    if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&temperature) {
        return Err(ReadingError::TemperatureOutOfRange(temperature));
    }
    Ok(())
}

/// A persisted sample, attached to the open event of its room if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub room_id: RoomId,
    pub event_id: Option<EventId>,
    pub timestamp: Timestamp,
    pub temperature: f64,
    pub humidity: f64,
    pub dew_point: f64,
}
