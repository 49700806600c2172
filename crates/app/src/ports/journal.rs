//! Journal port — append-only logs of measurements, device actions and
//! decisions.

use std::future::Future;
use std::sync::Arc;

use mistguard_domain::decision::DecisionRecord;
use mistguard_domain::device_action::DeviceActionRecord;
use mistguard_domain::error::MistguardError;
use mistguard_domain::id::{DeviceKey, EventId};
use mistguard_domain::reading::Measurement;

/// Append-only storage for everything the cycle observes and does.
pub trait Journal {
    /// Append one valid reading.
    fn append_measurement(
        &self,
        measurement: Measurement,
    ) -> impl Future<Output = Result<(), MistguardError>> + Send;

    /// Measurements recorded while an event was open, oldest first.
    fn measurements_for_event(
        &self,
        event_id: EventId,
    ) -> impl Future<Output = Result<Vec<Measurement>, MistguardError>> + Send;

    /// Append one device state change.
    fn append_device_action(
        &self,
        record: DeviceActionRecord,
    ) -> impl Future<Output = Result<(), MistguardError>> + Send;

    /// The last recorded action for a device.
    fn last_device_action(
        &self,
        device_id: &DeviceKey,
    ) -> impl Future<Output = Result<Option<DeviceActionRecord>, MistguardError>> + Send;

    /// Append one decision record.
    fn append_decision_record(
        &self,
        record: DecisionRecord,
    ) -> impl Future<Output = Result<(), MistguardError>> + Send;

    /// The most recent decisions, newest first.
    fn recent_decisions(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<DecisionRecord>, MistguardError>> + Send;
}

impl<T: Journal + Send + Sync> Journal for Arc<T> {
    fn append_measurement(
        &self,
        measurement: Measurement,
    ) -> impl Future<Output = Result<(), MistguardError>> + Send {
        (**self).append_measurement(measurement)
    }

    fn measurements_for_event(
        &self,
        event_id: EventId,
    ) -> impl Future<Output = Result<Vec<Measurement>, MistguardError>> + Send {
        (**self).measurements_for_event(event_id)
    }

    fn append_device_action(
        &self,
        record: DeviceActionRecord,
    ) -> impl Future<Output = Result<(), MistguardError>> + Send {
        (**self).append_device_action(record)
    }

    fn last_device_action(
        &self,
        device_id: &DeviceKey,
    ) -> impl Future<Output = Result<Option<DeviceActionRecord>, MistguardError>> + Send {
        (**self).last_device_action(device_id)
    }

    fn append_decision_record(
        &self,
        record: DecisionRecord,
    ) -> impl Future<Output = Result<(), MistguardError>> + Send {
        (**self).append_decision_record(record)
    }

    fn recent_decisions(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<DecisionRecord>, MistguardError>> + Send {
        (**self).recent_decisions(limit)
    }
}
