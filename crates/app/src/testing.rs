//! In-memory fakes of every port, shared by the service tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::{TimeDelta, TimeZone, Utc};

use mistguard_domain::decision::{
    DecisionRecord, DecisionResult, DecisionType, PlannedAction, Prediction,
};
use mistguard_domain::device_action::DeviceActionRecord;
use mistguard_domain::error::{MistguardError, NotFoundError};
use mistguard_domain::event::BathroomEvent;
use mistguard_domain::id::{DeviceKey, EventId, RoomId};
use mistguard_domain::learning::LearnedParameters;
use mistguard_domain::reading::{Measurement, SensorSnapshot};
use mistguard_domain::time::Timestamp;

use crate::ports::{BathroomEventRepository, Journal, ParameterRepository, Platform, Predictor};

pub fn room() -> RoomId {
    RoomId::new("bathroom").unwrap()
}

pub fn device() -> DeviceKey {
    DeviceKey::new("switch.bathroom_dehumidifier").unwrap()
}

pub fn start() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 1, 10, 7, 0, 0).unwrap()
}

pub fn snapshot_at(minute: i64, humidity: f64) -> SensorSnapshot {
    SensorSnapshot {
        room_id: room(),
        timestamp: start() + TimeDelta::minutes(minute),
        temperature: 21.0,
        relative_humidity: humidity,
        window_open: false,
    }
}

/// Every storage port backed by vectors.
#[derive(Default)]
pub struct InMemoryStore {
    pub events: Mutex<Vec<BathroomEvent>>,
    pub measurements: Mutex<Vec<Measurement>>,
    pub actions: Mutex<Vec<DeviceActionRecord>>,
    pub decisions: Mutex<Vec<DecisionRecord>>,
    pub params: Mutex<HashMap<RoomId, LearnedParameters>>,
    /// Number of upcoming writes that fail.
    pub failing_writes: AtomicUsize,
}

impl InMemoryStore {
    fn check_write(&self) -> Result<(), MistguardError> {
        let remaining = self.failing_writes.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_writes.store(remaining - 1, Ordering::SeqCst);
            return Err(MistguardError::Storage("write refused".into()));
        }
        Ok(())
    }
}

impl BathroomEventRepository for InMemoryStore {
    async fn open_event(&self, event: BathroomEvent) -> Result<(), MistguardError> {
        self.check_write()?;
        self.events.lock().unwrap().push(event);
        Ok(())
    }

    async fn update_event_peak(
        &self,
        id: EventId,
        peak_humidity: f64,
        peak_dew_point: f64,
    ) -> Result<(), MistguardError> {
        self.check_write()?;
        let mut events = self.events.lock().unwrap();
        if let Some(event) = events.iter_mut().find(|e| e.id == id) {
            event.peak_humidity = event.peak_humidity.max(peak_humidity);
            event.peak_dew_point = event.peak_dew_point.max(peak_dew_point);
        }
        Ok(())
    }

    async fn close_event(&self, event: BathroomEvent) -> Result<(), MistguardError> {
        self.check_write()?;
        let mut events = self.events.lock().unwrap();
        let stored = events
            .iter_mut()
            .find(|e| e.id == event.id)
            .ok_or_else(|| NotFoundError {
                entity: "BathroomEvent",
                id: event.id.to_string(),
            })?;
        stored.end_time = event.end_time;
        stored.duration_secs = event.duration_secs;
        stored.peak_humidity = stored.peak_humidity.max(event.peak_humidity);
        stored.peak_dew_point = stored.peak_dew_point.max(event.peak_dew_point);
        Ok(())
    }

    async fn get_events(
        &self,
        room_id: &RoomId,
        since: Timestamp,
    ) -> Result<Vec<BathroomEvent>, MistguardError> {
        let mut events: Vec<_> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| &e.room_id == room_id && e.start_time >= since)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.start_time);
        Ok(events)
    }

    async fn latest_open_event(
        &self,
        room_id: &RoomId,
    ) -> Result<Option<BathroomEvent>, MistguardError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| &e.room_id == room_id && e.is_open())
            .max_by_key(|e| e.start_time)
            .cloned())
    }

    async fn recent_events(
        &self,
        room_id: &RoomId,
        limit: usize,
    ) -> Result<Vec<BathroomEvent>, MistguardError> {
        let mut events: Vec<_> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| &e.room_id == room_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| std::cmp::Reverse(e.start_time));
        events.truncate(limit);
        Ok(events)
    }
}

impl Journal for InMemoryStore {
    async fn append_measurement(&self, measurement: Measurement) -> Result<(), MistguardError> {
        self.check_write()?;
        self.measurements.lock().unwrap().push(measurement);
        Ok(())
    }

    async fn measurements_for_event(
        &self,
        event_id: EventId,
    ) -> Result<Vec<Measurement>, MistguardError> {
        Ok(self
            .measurements
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.event_id == Some(event_id))
            .cloned()
            .collect())
    }

    async fn append_device_action(
        &self,
        record: DeviceActionRecord,
    ) -> Result<(), MistguardError> {
        self.check_write()?;
        self.actions.lock().unwrap().push(record);
        Ok(())
    }

    async fn last_device_action(
        &self,
        device_id: &DeviceKey,
    ) -> Result<Option<DeviceActionRecord>, MistguardError> {
        Ok(self
            .actions
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|a| &a.device_id == device_id)
            .cloned())
    }

    async fn append_decision_record(&self, record: DecisionRecord) -> Result<(), MistguardError> {
        self.check_write()?;
        self.decisions.lock().unwrap().push(record);
        Ok(())
    }

    async fn recent_decisions(&self, limit: usize) -> Result<Vec<DecisionRecord>, MistguardError> {
        Ok(self
            .decisions
            .lock()
            .unwrap()
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}

impl ParameterRepository for InMemoryStore {
    async fn get_learned_parameters(
        &self,
        room_id: &RoomId,
    ) -> Result<Option<LearnedParameters>, MistguardError> {
        Ok(self.params.lock().unwrap().get(room_id).cloned())
    }

    async fn save_learned_parameters(
        &self,
        params: LearnedParameters,
    ) -> Result<(), MistguardError> {
        self.check_write()?;
        self.params
            .lock()
            .unwrap()
            .insert(params.room_id.clone(), params);
        Ok(())
    }
}

/// Platform with scripted readings that records every command.
#[derive(Default)]
pub struct FakePlatform {
    pub readings: Mutex<HashMap<RoomId, SensorSnapshot>>,
    pub commands: Mutex<Vec<(DeviceKey, bool)>>,
    pub reject_commands: AtomicBool,
}

impl FakePlatform {
    pub fn set_reading(&self, snapshot: SensorSnapshot) {
        self.readings
            .lock()
            .unwrap()
            .insert(snapshot.room_id.clone(), snapshot);
    }

    pub fn commands(&self) -> Vec<(DeviceKey, bool)> {
        self.commands.lock().unwrap().clone()
    }
}

impl Platform for FakePlatform {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn read_sensor(
        &self,
        room_id: &RoomId,
    ) -> Result<Option<SensorSnapshot>, MistguardError> {
        Ok(self.readings.lock().unwrap().get(room_id).cloned())
    }

    async fn set_device_state(
        &self,
        device_id: &DeviceKey,
        on: bool,
    ) -> Result<(), MistguardError> {
        if self.reject_commands.load(Ordering::SeqCst) {
            return Err(MistguardError::Platform("device unreachable".into()));
        }
        self.commands.lock().unwrap().push((device_id.clone(), on));
        Ok(())
    }

    async fn test_connectivity(&self) -> Result<(), MistguardError> {
        Ok(())
    }
}

/// Predictor that always proposes the same thing.
pub struct FixedPredictor {
    pub decision_type: DecisionType,
    pub prediction: Prediction,
    pub observed: Vec<DecisionResult>,
}

impl FixedPredictor {
    pub fn switch_on(confidence: f64) -> Self {
        Self {
            decision_type: DecisionType::Bathroom,
            prediction: Prediction {
                action: PlannedAction::Switch {
                    device_id: device(),
                    on: true,
                },
                confidence,
            },
            observed: Vec::new(),
        }
    }
}

impl Predictor for FixedPredictor {
    fn decision_type(&self) -> DecisionType {
        self.decision_type
    }

    async fn predict(&mut self, _snapshot: &SensorSnapshot) -> Result<Prediction, MistguardError> {
        Ok(self.prediction.clone())
    }

    async fn observe(
        &mut self,
        _snapshot: &SensorSnapshot,
        _action: &PlannedAction,
        result: &DecisionResult,
    ) {
        self.observed.push(result.clone());
    }
}
