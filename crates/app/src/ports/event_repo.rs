//! Bathroom event repository port — persistence for humidity episodes.

use std::future::Future;
use std::sync::Arc;

use mistguard_domain::error::MistguardError;
use mistguard_domain::event::BathroomEvent;
use mistguard_domain::id::{EventId, RoomId};
use mistguard_domain::time::Timestamp;

/// Repository for persisting and querying [`BathroomEvent`]s.
pub trait BathroomEventRepository {
    /// Persist a freshly opened event.
    fn open_event(
        &self,
        event: BathroomEvent,
    ) -> impl Future<Output = Result<(), MistguardError>> + Send;

    /// Raise the stored peaks of an event. Values not greater than the stored
    /// ones leave it untouched.
    fn update_event_peak(
        &self,
        id: EventId,
        peak_humidity: f64,
        peak_dew_point: f64,
    ) -> impl Future<Output = Result<(), MistguardError>> + Send;

    /// Store the end time, duration and final peaks of a closed event.
    ///
    /// Returns [`MistguardError::NotFound`] when the event was never stored.
    fn close_event(
        &self,
        event: BathroomEvent,
    ) -> impl Future<Output = Result<(), MistguardError>> + Send;

    /// Events of a room that started at or after `since`, oldest first.
    fn get_events(
        &self,
        room_id: &RoomId,
        since: Timestamp,
    ) -> impl Future<Output = Result<Vec<BathroomEvent>, MistguardError>> + Send;

    /// The most recent event of a room that has no end time yet.
    fn latest_open_event(
        &self,
        room_id: &RoomId,
    ) -> impl Future<Output = Result<Option<BathroomEvent>, MistguardError>> + Send;

    /// The most recent events of a room, newest first.
    fn recent_events(
        &self,
        room_id: &RoomId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<BathroomEvent>, MistguardError>> + Send;
}

impl<T: BathroomEventRepository + Send + Sync> BathroomEventRepository for Arc<T> {
    fn open_event(
        &self,
        event: BathroomEvent,
    ) -> impl Future<Output = Result<(), MistguardError>> + Send {
        (**self).open_event(event)
    }

    fn update_event_peak(
        &self,
        id: EventId,
        peak_humidity: f64,
        peak_dew_point: f64,
    ) -> impl Future<Output = Result<(), MistguardError>> + Send {
        (**self).update_event_peak(id, peak_humidity, peak_dew_point)
    }

    fn close_event(
        &self,
        event: BathroomEvent,
    ) -> impl Future<Output = Result<(), MistguardError>> + Send {
        (**self).close_event(event)
    }

    fn get_events(
        &self,
        room_id: &RoomId,
        since: Timestamp,
    ) -> impl Future<Output = Result<Vec<BathroomEvent>, MistguardError>> + Send {
        (**self).get_events(room_id, since)
    }

    fn latest_open_event(
        &self,
        room_id: &RoomId,
    ) -> impl Future<Output = Result<Option<BathroomEvent>, MistguardError>> + Send {
        (**self).latest_open_event(room_id)
    }

    fn recent_events(
        &self,
        room_id: &RoomId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<BathroomEvent>, MistguardError>> + Send {
        (**self).recent_events(room_id, limit)
    }
}
