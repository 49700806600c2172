//! Event detector — per-room `Idle`/`Active` state machine.
//!
//! The detector is split into a pure [`RoomDetector::evaluate`] step that
//! computes a [`Transition`] and an [`RoomDetector::apply`] step that commits
//! it. Callers persist the transition in between, so the in-memory state is
//! only advanced once storage has seen it.

use std::collections::VecDeque;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::event::{BathroomEvent, EventTrigger};
use crate::id::EventId;
use crate::mold::MoldRiskAssessment;
use crate::reading::SensorSnapshot;
use crate::settings::DetectorConfig;
use crate::time::Timestamp;

/// Coarse detector state exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorState {
    Idle,
    Active,
}

/// Windowed average of resting humidity.
#[derive(Debug, Clone)]
pub struct BaselineTracker {
    window: TimeDelta,
    samples: VecDeque<(Timestamp, f64)>,
}

impl BaselineTracker {
    #[must_use]
    pub fn new(window: TimeDelta) -> Self {
        Self {
            window,
            samples: VecDeque::new(),
        }
    }

    /// Add a sample and drop those that fell out of the window.
    pub fn push(&mut self, at: Timestamp, humidity: f64) {
        self.samples.push_back((at, humidity));
        self.prune(at);
    }

    /// Drop samples older than the window relative to `now`.
    pub fn prune(&mut self, now: Timestamp) {
        // A window reaching past the start of time keeps every sample.
        let Some(horizon) = now.checked_sub_signed(self.window) else {
            return;
        };
        while self.samples.front().is_some_and(|(at, _)| *at < horizon) {
            self.samples.pop_front();
        }
    }

    /// Mean of the samples in the window, if any.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f64 = self.samples.iter().map(|(_, h)| h).sum();
        #[allow(clippy::cast_precision_loss)]
        Some(sum / self.samples.len() as f64)
    }
}

/// The outcome of feeding one reading to the detector.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// No event; the reading feeds the baseline.
    StayIdle,
    /// A new event must be opened.
    Open(BathroomEvent),
    /// The open event continues.
    Continue {
        event_id: EventId,
        /// Whether the reading exceeds a stored peak.
        peaks_raised: bool,
        humidity: f64,
        dew_point: f64,
        /// Since when humidity has been back inside the end band, if it is.
        settled_since: Option<Timestamp>,
    },
    /// The open event ends; carries the closed record.
    Close(BathroomEvent),
}

impl Transition {
    /// Id of the event the reading belongs to, if any.
    #[must_use]
    pub fn event_id(&self) -> Option<EventId> {
        match self {
            Self::StayIdle => None,
            Self::Open(event) | Self::Close(event) => Some(event.id),
            Self::Continue { event_id, .. } => Some(*event_id),
        }
    }
}

/// Detector state for one room.
#[derive(Debug, Clone)]
pub struct RoomDetector {
    config: DetectorConfig,
    baseline: BaselineTracker,
    open_event: Option<BathroomEvent>,
    settled_since: Option<Timestamp>,
}

impl RoomDetector {
    /// A fresh, idle detector with an empty baseline.
    #[must_use]
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            baseline: BaselineTracker::new(config.baseline_window),
            open_event: None,
            settled_since: None,
        }
    }

    /// Resume an event that was still open when the process stopped.
    #[must_use]
    pub fn resume(config: DetectorConfig, open_event: BathroomEvent) -> Self {
        let mut detector = Self::new(config);
        detector.open_event = Some(open_event);
        detector
    }

    #[must_use]
    pub fn state(&self) -> DetectorState {
        if self.open_event.is_some() {
            DetectorState::Active
        } else {
            DetectorState::Idle
        }
    }

    #[must_use]
    pub fn open_event(&self) -> Option<&BathroomEvent> {
        self.open_event.as_ref()
    }

    /// Reference humidity: frozen at open time while an event runs.
    #[must_use]
    pub fn baseline(&self) -> Option<f64> {
        match &self.open_event {
            Some(event) => Some(event.baseline_humidity),
            None => self.baseline.value(),
        }
    }

    /// Decide what the reading means without changing any state.
    #[must_use]
    pub fn evaluate(&self, reading: &SensorSnapshot, risk: &MoldRiskAssessment) -> Transition {
        let humidity = reading.relative_humidity;
        let at = reading.timestamp;

        let Some(event) = &self.open_event else {
            let Some(baseline) = self.baseline.value() else {
                return Transition::StayIdle;
            };
            let trigger = if humidity > baseline + self.config.delta_start {
                Some(EventTrigger::HumiditySpike)
            } else if risk.level.is_elevated() && humidity > baseline + self.config.end_margin {
                // Elevated risk alone is not enough: humidity must also be
                // rising off the baseline, otherwise a room resting at a humid
                // level would open and close events in a loop.
                Some(EventTrigger::MoldRisk)
            } else {
                None
            };
            return match trigger {
                Some(trigger) => Transition::Open(BathroomEvent::open(
                    reading.room_id.clone(),
                    trigger,
                    at,
                    baseline,
                    humidity,
                    risk.dew_point,
                )),
                None => Transition::StayIdle,
            };
        };

        // The settle timer starts at the first in-band reading after the last
        // one above the band; any reading above the band clears it.
        let settled = humidity <= event.baseline_humidity + self.config.end_margin;
        let settled_since = if settled {
            Some(self.settled_since.unwrap_or(at))
        } else {
            None
        };

        if let Some(since) = settled_since
            && at - since >= self.config.cooldown
        {
            let mut closed = event.clone();
            closed.raise_peaks(humidity, risk.dew_point);
            closed.close(at);
            return Transition::Close(closed);
        }

        Transition::Continue {
            event_id: event.id,
            peaks_raised: humidity > event.peak_humidity || risk.dew_point > event.peak_dew_point,
            humidity,
            dew_point: risk.dew_point,
            settled_since,
        }
    }

    /// Commit a transition previously returned by [`evaluate`](Self::evaluate)
    /// for the same reading.
    pub fn apply(&mut self, reading: &SensorSnapshot, transition: &Transition) {
        match transition {
            Transition::StayIdle => {
                self.baseline
                    .push(reading.timestamp, reading.relative_humidity);
            }
            Transition::Open(event) => {
                self.open_event = Some(event.clone());
                self.settled_since = None;
            }
            Transition::Continue {
                humidity,
                dew_point,
                settled_since,
                ..
            } => {
                if let Some(event) = &mut self.open_event {
                    event.raise_peaks(*humidity, *dew_point);
                }
                self.settled_since = *settled_since;
            }
            Transition::Close(_) => {
                self.open_event = None;
                self.settled_since = None;
                self.baseline.prune(reading.timestamp);
                if self.baseline.value().is_none() {
                    self.baseline
                        .push(reading.timestamp, reading.relative_humidity);
                }
            }
        }
    }
}
