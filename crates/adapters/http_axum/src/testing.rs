//! In-memory stand-ins for the storage ports, shared by the handler tests.

use std::sync::{Arc, Mutex};

use chrono::TimeDelta;
use mistguard_app::alerts::AlertLog;
use mistguard_app::ports::{BathroomEventRepository, Journal, ParameterRepository};
use mistguard_app::status::{RoomStatus, StatusBoard};
use mistguard_domain::decision::DecisionRecord;
use mistguard_domain::device_action::DeviceActionRecord;
use mistguard_domain::error::{MistguardError, NotFoundError};
use mistguard_domain::event::{BathroomEvent, EventTrigger};
use mistguard_domain::id::{DeviceKey, EventId, RoomId};
use mistguard_domain::learning::LearnedParameters;
use mistguard_domain::reading::Measurement;
use mistguard_domain::settings::AutomationSettings;
use mistguard_domain::time::{Timestamp, now};

use crate::state::AppState;

pub(crate) fn room() -> RoomId {
    RoomId::new("bathroom").unwrap()
}

pub(crate) fn device() -> DeviceKey {
    DeviceKey::new("switch.bathroom_dehumidifier").unwrap()
}

/// A 30 minute shower event from a 55 % baseline.
pub(crate) fn closed_event(days_ago: i64, peak: f64) -> BathroomEvent {
    let start = now() - TimeDelta::days(days_ago);
    let mut event = BathroomEvent::open(
        room(),
        EventTrigger::HumiditySpike,
        start,
        55.0,
        peak,
        16.0,
    );
    event.close(start + TimeDelta::minutes(30));
    event
}

/// State with the bathroom published at its default thresholds.
pub(crate) fn test_state(store: Arc<StubStore>) -> AppState<StubStore, StubStore, StubStore> {
    let settings = AutomationSettings::default();
    let status = Arc::new(StatusBoard::default());
    status.publish(RoomStatus::new(room(), device(), settings.default_thresholds()));
    AppState::new(
        status,
        Arc::new(AlertLog::default()),
        Arc::clone(&store),
        Arc::clone(&store),
        store,
        settings.learner(),
    )
}

#[derive(Default)]
pub(crate) struct StubStore {
    events: Mutex<Vec<BathroomEvent>>,
    decisions: Mutex<Vec<DecisionRecord>>,
    params: Mutex<Vec<LearnedParameters>>,
}

impl StubStore {
    pub(crate) fn push_event(&self, event: BathroomEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl BathroomEventRepository for StubStore {
    async fn open_event(&self, event: BathroomEvent) -> Result<(), MistguardError> {
        self.push_event(event);
        Ok(())
    }

    async fn update_event_peak(
        &self,
        _event_id: EventId,
        _humidity: f64,
        _dew_point: f64,
    ) -> Result<(), MistguardError> {
        Ok(())
    }

    async fn close_event(&self, event: BathroomEvent) -> Result<(), MistguardError> {
        let mut events = self.events.lock().unwrap();
        let stored = events
            .iter_mut()
            .find(|e| e.id == event.id)
            .ok_or_else(|| NotFoundError {
                entity: "BathroomEvent",
                id: event.id.to_string(),
            })?;
        *stored = event;
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

impl Journal for StubStore {
    async fn append_measurement(&self, _measurement: Measurement) -> Result<(), MistguardError> {
        Ok(())
    }

    async fn measurements_for_event(
        &self,
        _event_id: EventId,
    ) -> Result<Vec<Measurement>, MistguardError> {
        Ok(vec![])
    }

    async fn append_device_action(
        &self,
        _record: DeviceActionRecord,
    ) -> Result<(), MistguardError> {
        Ok(())
    }

    async fn last_device_action(
        &self,
        _device_id: &DeviceKey,
    ) -> Result<Option<DeviceActionRecord>, MistguardError> {
        Ok(None)
    }

    async fn append_decision_record(&self, record: DecisionRecord) -> Result<(), MistguardError> {
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

impl ParameterRepository for StubStore {
    async fn get_learned_parameters(
        &self,
        room_id: &RoomId,
    ) -> Result<Option<LearnedParameters>, MistguardError> {
        Ok(self
            .params
            .lock()
            .unwrap()
            .iter()
            .find(|p| &p.room_id == room_id)
            .cloned())
    }

    async fn save_learned_parameters(
        &self,
        params: LearnedParameters,
    ) -> Result<(), MistguardError> {
        let mut stored = self.params.lock().unwrap();
        stored.retain(|p| p.room_id != params.room_id);
        stored.push(params);
        Ok(())
    }
}
