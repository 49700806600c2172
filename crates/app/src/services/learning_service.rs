//! Learning service — runs the threshold learner against stored events and
//! applies proposals that pass both gates.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use mistguard_domain::error::MistguardError;
use mistguard_domain::id::RoomId;
use mistguard_domain::learning::{self, LearningOutcome};
use mistguard_domain::settings::LearnerConfig;
use mistguard_domain::time::{Timestamp, now};

use crate::alerts::{AlertLog, write_through};
use crate::ports::{BathroomEventRepository, ParameterRepository};

/// Application service for threshold learning.
pub struct LearningService<E, P> {
    events: E,
    params: P,
    config: LearnerConfig,
    alerts: Arc<AlertLog>,
}

impl<E, P> LearningService<E, P>
where
    E: BathroomEventRepository + Send + Sync,
    P: ParameterRepository + Send + Sync,
{
    pub fn new(events: E, params: P, config: LearnerConfig, alerts: Arc<AlertLog>) -> Self {
        Self {
            events,
            params,
            config,
            alerts,
        }
    }

    /// Learn thresholds for one room from the events of the lookback window.
    ///
    /// Only an [`LearningOutcome::Accepted`] proposal is stored; the other
    /// outcomes leave the current parameters untouched. Saving is retried
    /// once; a second failure raises an operator alert and the outcome is
    /// still returned.
    ///
    /// # Errors
    ///
    /// Returns a storage error when events cannot be read.
    #[tracing::instrument(skip(self))]
    pub async fn learn_room(
        &self,
        room_id: &RoomId,
        now: Timestamp,
    ) -> Result<LearningOutcome, MistguardError> {
        let since = now
            .checked_sub_signed(self.config.lookback)
            .unwrap_or(Timestamp::MIN_UTC);
        let events = self.events.get_events(room_id, since).await?;
        let outcome = learning::propose(room_id, &events, &self.config, now);

        match &outcome {
            LearningOutcome::NotEnoughData { found, required } => {
                tracing::info!(found, required, "not enough events to learn thresholds");
            }
            LearningOutcome::BelowConfidence { proposal, floor } => {
                tracing::info!(
                    confidence = proposal.confidence,
                    floor,
                    high = proposal.humidity_threshold_high,
                    low = proposal.humidity_threshold_low,
                    "proposal below confidence floor, discarded"
                );
            }
            LearningOutcome::Accepted(params) => {
                let saved = write_through(&self.alerts, room_id, "save_learned_parameters", || {
                    self.params.save_learned_parameters(params.clone())
                })
                .await;
                if saved.is_none() {
                    return Ok(outcome);
                }
                tracing::info!(
                    confidence = params.confidence,
                    samples = params.sample_count,
                    high = params.humidity_threshold_high,
                    low = params.humidity_threshold_low,
                    delay_secs = params.dehumidifier_delay_secs,
                    "learned thresholds applied"
                );
            }
        }
        Ok(outcome)
    }

    /// Learn every room in turn. A failing room is logged and skipped.
    pub async fn learn_all(
        &self,
        rooms: &[RoomId],
        now: Timestamp,
    ) -> Vec<(RoomId, LearningOutcome)> {
        let mut outcomes = Vec::with_capacity(rooms.len());
        for room_id in rooms {
            match self.learn_room(room_id, now).await {
                Ok(outcome) => outcomes.push((room_id.clone(), outcome)),
                Err(err) => tracing::error!(%err, room_id = %room_id, "learning failed"),
            }
        }
        outcomes
    }
}

impl<E, P> LearningService<E, P>
where
    E: BathroomEventRepository + Send + Sync + 'static,
    P: ParameterRepository + Send + Sync + 'static,
{
    /// Learn every room once per `period`, the first pass one period after
    /// start. The loop ends when `shutdown` flips.
    pub fn spawn_periodic(
        self: &Arc<Self>,
        rooms: Vec<RoomId>,
        period: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(
                rooms = rooms.len(),
                period_secs = period.as_secs(),
                "learning loop started"
            );
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        service.learn_all(&rooms, now()).await;
                    }
                    _ = shutdown.changed() => break,
                }
            }
            tracing::info!("learning loop stopped");
        })
    }
}
