//! Decision cycle — `COLLECT → PREDICT → SAFETY_CHECK → (EXECUTE | SUPPRESS) → LOG`.
//!
//! One call to [`DecisionCycle::run`] is one tick for one room. The cycle is
//! the only place that talks to the platform's actuation side, and it writes
//! exactly one [`DecisionRecord`] for every tick whose reading was usable.

use std::sync::Arc;

use mistguard_domain::decision::{
    DecisionPolicy, DecisionRecord, DecisionResult, PlannedAction, Prediction, Verdict,
};
use mistguard_domain::id::{DecisionId, RoomId};
use mistguard_domain::reading::SensorSnapshot;

use crate::alerts::{AlertKind, AlertLog, write_through};
use crate::ports::{Journal, Platform, Predictor};

/// Orchestrator shared by every automation.
pub struct DecisionCycle<PL, J> {
    platform: PL,
    journal: J,
    policy: DecisionPolicy,
    alerts: Arc<AlertLog>,
}

impl<PL, J> DecisionCycle<PL, J>
where
    PL: Platform + Send + Sync,
    J: Journal + Send + Sync,
{
    pub fn new(platform: PL, journal: J, policy: DecisionPolicy, alerts: Arc<AlertLog>) -> Self {
        Self {
            platform,
            journal,
            policy,
            alerts,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &DecisionPolicy {
        &self.policy
    }

    #[must_use]
    pub fn platform(&self) -> &PL {
        &self.platform
    }

    /// Run one tick for `room_id`.
    ///
    /// Returns `None` when no usable reading could be collected; the tick is
    /// then skipped with a warning and nothing is recorded.
    #[tracing::instrument(skip_all, fields(room_id = %room_id))]
    pub async fn run<P>(&self, room_id: &RoomId, predictor: &mut P) -> Option<DecisionRecord>
    where
        P: Predictor + Send,
    {
        let snapshot = self.collect(room_id).await?;
        let decision_type = predictor.decision_type();

        let prediction = match predictor.predict(&snapshot).await {
            Ok(prediction) => prediction,
            Err(err) => {
                tracing::error!(%err, "prediction failed, holding");
                let record = DecisionRecord {
                    id: DecisionId::new(),
                    timestamp: snapshot.timestamp,
                    decision_type,
                    input_snapshot: snapshot,
                    predicted_action: PlannedAction::Hold,
                    confidence: None,
                    executed: false,
                    result: DecisionResult::Suppressed {
                        reason: format!("prediction failed: {err}"),
                    },
                };
                self.log(room_id, &record).await;
                return Some(record);
            }
        };

        let violation = self
            .policy
            .safety_check(decision_type, &snapshot, &prediction.action);
        if let Some(violation) = &violation {
            tracing::warn!(%violation, action = %prediction.action, "action vetoed");
        }

        let (executed, result) = match self.policy.verdict(&prediction, violation.as_ref()) {
            Verdict::Execute => (true, self.execute(room_id, &prediction).await),
            Verdict::Hold => (false, DecisionResult::NoAction),
            Verdict::Suppress(suppression) => {
                tracing::debug!(%suppression, action = %prediction.action, "execution suppressed");
                (
                    false,
                    DecisionResult::Suppressed {
                        reason: suppression.to_string(),
                    },
                )
            }
        };

        predictor
            .observe(&snapshot, &prediction.action, &result)
            .await;

        let record = DecisionRecord {
            id: DecisionId::new(),
            timestamp: snapshot.timestamp,
            decision_type,
            input_snapshot: snapshot,
            predicted_action: prediction.action,
            confidence: violation.is_none().then_some(prediction.confidence),
            executed,
            result,
        };
        self.log(room_id, &record).await;
        Some(record)
    }

    async fn collect(&self, room_id: &RoomId) -> Option<SensorSnapshot> {
        let snapshot = match self.platform.read_sensor(room_id).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                tracing::warn!(
                    platform = self.platform.name(),
                    "no reading available, skipping tick"
                );
                return None;
            }
            Err(err) => {
                tracing::warn!(
                    %err,
                    platform = self.platform.name(),
                    "sensor read failed, skipping tick"
                );
                return None;
            }
        };
        if let Err(err) = snapshot.validate() {
            tracing::warn!(%err, "invalid reading, skipping tick");
            return None;
        }
        Some(snapshot)
    }

    async fn execute(&self, room_id: &RoomId, prediction: &Prediction) -> DecisionResult {
        let PlannedAction::Switch { device_id, on } = &prediction.action else {
            return DecisionResult::NoAction;
        };
        match self.platform.set_device_state(device_id, *on).await {
            Ok(()) => {
                tracing::info!(device_id = %device_id, on, "device switched");
                DecisionResult::Executed
            }
            Err(err) => {
                tracing::error!(%err, device_id = %device_id, on, "actuation failed");
                self.alerts.raise(
                    AlertKind::ActuationFailure,
                    room_id,
                    "set_device_state",
                    format!("{}: {err}", prediction.action),
                );
                DecisionResult::Failed {
                    error: err.to_string(),
                }
            }
        }
    }

    async fn log(&self, room_id: &RoomId, record: &DecisionRecord) {
        write_through(&self.alerts, room_id, "append_decision_record", || {
            self.journal.append_decision_record(record.clone())
        })
        .await;
    }
}
