//! Bathroom event — a humidity episode such as a shower.
//!
//! Created when the detector leaves `Idle`, peaks only ever grow while it is
//! open, and it is closed exactly once.

use serde::{Deserialize, Serialize};

use crate::id::{EventId, RoomId};
use crate::time::Timestamp;

/// What made the detector open the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTrigger {
    /// Humidity rose more than `delta_start` above the baseline.
    HumiditySpike,
    /// Mold risk reached HIGH/CRITICAL while humidity was rising.
    MoldRisk,
}

impl EventTrigger {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HumiditySpike => "humidity_spike",
            Self::MoldRisk => "mold_risk",
        }
    }
}

impl std::str::FromStr for EventTrigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "humidity_spike" => Ok(Self::HumiditySpike),
            "mold_risk" => Ok(Self::MoldRisk),
            other => Err(format!("unknown event trigger: {other}")),
        }
    }
}

/// A detected humidity episode in one room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BathroomEvent {
    pub id: EventId,
    pub room_id: RoomId,
    pub trigger: EventTrigger,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    /// Baseline humidity when the event opened.
    pub baseline_humidity: f64,
    pub peak_humidity: f64,
    pub peak_dew_point: f64,
    /// Whole seconds between start and end, once closed.
    pub duration_secs: Option<u64>,
}

impl BathroomEvent {
    /// Open a new event seeded from the current reading.
    #[must_use]
    pub fn open(
        room_id: RoomId,
        trigger: EventTrigger,
        start_time: Timestamp,
        baseline_humidity: f64,
        humidity: f64,
        dew_point: f64,
    ) -> Self {
        Self {
            id: EventId::new(),
            room_id,
            trigger,
            start_time,
            end_time: None,
            baseline_humidity,
            peak_humidity: humidity,
            peak_dew_point: dew_point,
            duration_secs: None,
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Raise the peaks to the given values; smaller values are ignored.
    ///
    /// Returns `true` when either peak changed.
    pub fn raise_peaks(&mut self, humidity: f64, dew_point: f64) -> bool {
        let mut changed = false;
        if humidity > self.peak_humidity {
            self.peak_humidity = humidity;
            changed = true;
        }
        if dew_point > self.peak_dew_point {
            self.peak_dew_point = dew_point;
            changed = true;
        }
        changed
    }

    /// Close the event at `end_time`, computing its duration.
    pub fn close(&mut self, end_time: Timestamp) {
        let secs = (end_time - self.start_time).num_seconds().max(0);
        self.end_time = Some(end_time);
        self.duration_secs = Some(u64::try_from(secs).unwrap_or_default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn event() -> BathroomEvent {
        BathroomEvent::open(
            RoomId::new("bathroom").unwrap(),
            EventTrigger::HumiditySpike,
            crate::time::now(),
            55.0,
            66.0,
            15.0,
        )
    }

    #[test]
    fn should_open_with_peaks_seeded_from_reading() {
        let e = event();
        assert!(e.is_open());
        assert!((e.peak_humidity - 66.0).abs() < f64::EPSILON);
        assert!((e.peak_dew_point - 15.0).abs() < f64::EPSILON);
        assert!(e.duration_secs.is_none());
    }

    #[test]
    fn should_only_raise_peaks() {
        let mut e = event();
        assert!(e.raise_peaks(70.0, 16.0));
        assert!(!e.raise_peaks(60.0, 12.0));
        assert!((e.peak_humidity - 70.0).abs() < f64::EPSILON);
        assert!((e.peak_dew_point - 16.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_compute_duration_on_close() {
        let mut e = event();
        let end = e.start_time + TimeDelta::minutes(12);
        e.close(end);
        assert!(!e.is_open());
        assert_eq!(e.duration_secs, Some(720));
    }

    #[test]
    fn should_parse_trigger_from_str() {
        assert_eq!(
            "mold_risk".parse::<EventTrigger>(),
            Ok(EventTrigger::MoldRisk)
        );
        assert!("bogus".parse::<EventTrigger>().is_err());
    }
}
