//! Operator alerts — a bounded in-memory log of failures that need a human.
//!
//! Only two things end up here: persistence writes that failed twice and
//! actuation commands the platform did not carry out. Everything else is
//! ordinary logging.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use mistguard_domain::error::MistguardError;
use mistguard_domain::id::RoomId;
use mistguard_domain::time::{Timestamp, now};

/// Default number of alerts kept.
pub const DEFAULT_ALERT_CAPACITY: usize = 256;

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    PersistenceFailure,
    ActuationFailure,
}

/// One operator alert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub raised_at: Timestamp,
    pub kind: AlertKind,
    pub room_id: RoomId,
    /// The operation that failed (e.g. `append_measurement`).
    pub operation: String,
    pub message: String,
}

/// Ring buffer of the most recent alerts.
#[derive(Debug)]
pub struct AlertLog {
    capacity: usize,
    entries: Mutex<VecDeque<Alert>>,
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_CAPACITY)
    }
}

impl AlertLog {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
        }
    }

    /// Record an alert, evicting the oldest one when full.
    pub fn raise(&self, kind: AlertKind, room_id: &RoomId, operation: &str, message: String) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(Alert {
            raised_at: now(),
            kind,
            room_id: room_id.clone(),
            operation: operation.to_string(),
            message,
        });
    }

    /// Alerts, newest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<Alert> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.iter().rev().take(limit).cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Run a persistence write, retrying it once.
///
/// A second failure does not propagate: the caller's decision stands, the
/// failure is logged at error level and raised as an operator alert, and
/// `None` is returned.
pub async fn write_through<T, F, Fut>(
    alerts: &AlertLog,
    room_id: &RoomId,
    operation: &'static str,
    mut write: F,
) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, MistguardError>>,
{
    match write().await {
        Ok(value) => return Some(value),
        Err(err) => {
            tracing::warn!(
                %err,
                room_id = %room_id,
                operation,
                "persistence write failed, retrying once"
            );
        }
    }
    match write().await {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::error!(%err, room_id = %room_id, operation, "persistence write failed twice");
            alerts.raise(
                AlertKind::PersistenceFailure,
                room_id,
                operation,
                err.to_string(),
            );
            None
        }
    }
}
