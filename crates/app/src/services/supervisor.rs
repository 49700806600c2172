//! Supervisor — owns the per-room predictor map and drives the interval loops.
//!
//! Each room sits behind its own lock, so rooms never wait on each other. A
//! tick that finds its room still busy with the previous cycle is skipped
//! and logged, never queued.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use mistguard_domain::decision::DecisionRecord;
use mistguard_domain::id::RoomId;

use crate::ports::{Journal, Platform, Predictor};
use crate::services::decision_cycle::DecisionCycle;

/// What became of one scheduled tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The cycle ran; `None` when no usable reading was available.
    Completed(Option<DecisionRecord>),
    /// The previous cycle of the room was still running.
    Skipped,
    /// No predictor is registered for the room.
    UnknownRoom,
}

/// Per-room state map plus the shared decision cycle.
pub struct Supervisor<PL, J, P> {
    cycle: Arc<DecisionCycle<PL, J>>,
    rooms: BTreeMap<RoomId, Arc<Mutex<P>>>,
}

impl<PL, J, P> Supervisor<PL, J, P>
where
    PL: Platform + Send + Sync + 'static,
    J: Journal + Send + Sync + 'static,
    P: Predictor + Send + 'static,
{
    pub fn new(cycle: Arc<DecisionCycle<PL, J>>) -> Self {
        Self {
            cycle,
            rooms: BTreeMap::new(),
        }
    }

    /// Register the predictor of a room, replacing any previous one.
    pub fn add_room(&mut self, room_id: RoomId, predictor: P) {
        self.rooms.insert(room_id, Arc::new(Mutex::new(predictor)));
    }

    pub fn rooms(&self) -> impl Iterator<Item = &RoomId> {
        self.rooms.keys()
    }

    #[must_use]
    pub fn cycle(&self) -> &DecisionCycle<PL, J> {
        &self.cycle
    }

    /// Run one cycle for a room unless it is already running.
    pub async fn tick(&self, room_id: &RoomId) -> TickOutcome {
        let Some(slot) = self.rooms.get(room_id) else {
            tracing::warn!(room_id = %room_id, "tick for unknown room");
            return TickOutcome::UnknownRoom;
        };
        let Ok(mut predictor) = slot.try_lock() else {
            tracing::warn!(room_id = %room_id, "previous cycle still running, skipping tick");
            return TickOutcome::Skipped;
        };
        TickOutcome::Completed(self.cycle.run(room_id, &mut *predictor).await)
    }

    /// Start the interval loop of one room.
    ///
    /// Every period a cycle is spawned; the loop ends when `shutdown` flips.
    /// A cycle already in flight at that point runs to completion.
    pub fn spawn_room(
        self: &Arc<Self>,
        room_id: RoomId,
        period: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let supervisor = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::info!(room_id = %room_id, period_secs = period.as_secs(), "room loop started");
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let supervisor = Arc::clone(&supervisor);
                        let room_id = room_id.clone();
                        tokio::spawn(async move {
                            supervisor.tick(&room_id).await;
                        });
                    }
                    _ = shutdown.changed() => break,
                }
            }
            tracing::info!(room_id = %room_id, "room loop stopped");
        })
    }
}
