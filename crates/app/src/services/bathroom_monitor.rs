//! Bathroom monitor — event detection and dehumidifier control for one room.
//!
//! The monitor is the bathroom automation's [`Predictor`]: on every tick it
//! assesses the mold risk, advances the event detector (persisting each
//! transition before committing it) and asks the hysteresis controller
//! whether the dehumidifier has to move. When the decision cycle reports
//! back, the outcome is written to the device action log and the controller
//! state is settled.

use std::sync::Arc;

use mistguard_domain::controller::{self, ControlDecision, ControlInputs, ControlState};
use mistguard_domain::decision::{DecisionResult, DecisionType, PlannedAction, Prediction};
use mistguard_domain::detector::{RoomDetector, Transition};
use mistguard_domain::device_action::{ActionOutcome, DeviceActionRecord};
use mistguard_domain::error::MistguardError;
use mistguard_domain::id::{DeviceKey, RoomId};
use mistguard_domain::learning::ControlThresholds;
use mistguard_domain::mold::MoldRiskAnalyzer;
use mistguard_domain::reading::{Measurement, SensorSnapshot};
use mistguard_domain::settings::AutomationSettings;

use crate::alerts::{AlertLog, write_through};
use crate::ports::{BathroomEventRepository, Journal, ParameterRepository, Predictor};
use crate::status::{RoomStatus, StatusBoard};

/// A monitored room and the dehumidifier serving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSetup {
    pub room_id: RoomId,
    pub dehumidifier: DeviceKey,
}

/// Shared collaborators of every monitor.
pub struct MonitorContext<E, J, P> {
    pub events: E,
    pub journal: J,
    pub params: P,
    pub alerts: Arc<AlertLog>,
    pub status: Arc<StatusBoard>,
}

/// Detector and controller state of one room.
pub struct BathroomMonitor<E, J, P> {
    room: RoomSetup,
    ctx: MonitorContext<E, J, P>,
    analyzer: MoldRiskAnalyzer,
    detector: RoomDetector,
    control: ControlState,
    default_thresholds: ControlThresholds,
    thresholds: ControlThresholds,
    pending: Option<ControlDecision>,
}

impl<E, J, P> BathroomMonitor<E, J, P>
where
    E: BathroomEventRepository + Send + Sync,
    J: Journal + Send + Sync,
    P: ParameterRepository + Send + Sync,
{
    /// Build the monitor, resuming any event left open and the last known
    /// device position.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the recovery queries fail.
    #[tracing::instrument(skip_all, fields(room_id = %room.room_id))]
    pub async fn load(
        room: RoomSetup,
        settings: &AutomationSettings,
        ctx: MonitorContext<E, J, P>,
    ) -> Result<Self, MistguardError> {
        let detector_config = settings.detector();
        let detector = match ctx.events.latest_open_event(&room.room_id).await? {
            Some(event) => {
                tracing::info!(event_id = %event.id, "resuming open event");
                RoomDetector::resume(detector_config, event)
            }
            None => RoomDetector::new(detector_config),
        };
        let last_action = ctx.journal.last_device_action(&room.dehumidifier).await?;
        let control = ControlState::resume(last_action.as_ref());

        let default_thresholds = settings.default_thresholds();
        let thresholds = ctx
            .params
            .get_learned_parameters(&room.room_id)
            .await?
            .map_or(default_thresholds, |p| p.thresholds());

        let mut status =
            RoomStatus::new(room.room_id.clone(), room.dehumidifier.clone(), thresholds);
        status.detector = detector.state();
        status.open_event = detector.open_event().map(|e| e.id);
        status.device_on = control.device_on;
        ctx.status.publish(status);

        Ok(Self {
            room,
            ctx,
            analyzer: MoldRiskAnalyzer::default(),
            detector,
            control,
            default_thresholds,
            thresholds,
            pending: None,
        })
    }

    #[must_use]
    pub fn room(&self) -> &RoomSetup {
        &self.room
    }

    #[must_use]
    pub fn detector(&self) -> &RoomDetector {
        &self.detector
    }

    #[must_use]
    pub fn control_state(&self) -> &ControlState {
        &self.control
    }

    async fn refresh_thresholds(&mut self) {
        match self.ctx.params.get_learned_parameters(&self.room.room_id).await {
            Ok(Some(params)) => self.thresholds = params.thresholds(),
            Ok(None) => self.thresholds = self.default_thresholds,
            Err(err) => {
                tracing::warn!(
                    %err,
                    "could not load learned parameters, keeping current thresholds"
                );
            }
        }
    }

    async fn persist_transition(&self, transition: &Transition) {
        let ctx = &self.ctx;
        let room_id = &self.room.room_id;
        match transition {
            Transition::StayIdle => {}
            Transition::Open(event) => {
                tracing::info!(
                    event_id = %event.id,
                    trigger = event.trigger.as_str(),
                    baseline = event.baseline_humidity,
                    humidity = event.peak_humidity,
                    "bathroom event started"
                );
                write_through(&ctx.alerts, room_id, "open_event", || {
                    ctx.events.open_event(event.clone())
                })
                .await;
            }
            Transition::Continue {
                event_id,
                peaks_raised: true,
                humidity,
                dew_point,
                ..
            } => {
                write_through(&ctx.alerts, room_id, "update_event_peak", || {
                    ctx.events.update_event_peak(*event_id, *humidity, *dew_point)
                })
                .await;
            }
            Transition::Continue { .. } => {}
            Transition::Close(event) => {
                tracing::info!(
                    event_id = %event.id,
                    peak_humidity = event.peak_humidity,
                    duration_secs = event.duration_secs,
                    "bathroom event ended"
                );
                write_through(&ctx.alerts, room_id, "close_event", || {
                    ctx.events.close_event(event.clone())
                })
                .await;
            }
        }
    }
}

impl<E, J, P> Predictor for BathroomMonitor<E, J, P>
where
    E: BathroomEventRepository + Send + Sync,
    J: Journal + Send + Sync,
    P: ParameterRepository + Send + Sync,
{
    fn decision_type(&self) -> DecisionType {
        DecisionType::Bathroom
    }

    async fn predict(&mut self, snapshot: &SensorSnapshot) -> Result<Prediction, MistguardError> {
        let risk = self
            .analyzer
            .assess(snapshot.temperature, snapshot.relative_humidity)?;
        self.refresh_thresholds().await;

        let transition = self.detector.evaluate(snapshot, &risk);
        self.persist_transition(&transition).await;
        self.detector.apply(snapshot, &transition);

        let measurement = Measurement {
            room_id: self.room.room_id.clone(),
            event_id: transition.event_id(),
            timestamp: snapshot.timestamp,
            temperature: snapshot.temperature,
            humidity: snapshot.relative_humidity,
            dew_point: risk.dew_point,
        };
        let ctx = &self.ctx;
        write_through(&ctx.alerts, &self.room.room_id, "append_measurement", || {
            ctx.journal.append_measurement(measurement.clone())
        })
        .await;

        let decision = controller::evaluate(
            &self.control,
            &ControlInputs {
                reading: snapshot,
                detector: self.detector.state(),
                risk: &risk,
                thresholds: &self.thresholds,
            },
        );
        tracing::debug!(
            humidity = snapshot.relative_humidity,
            risk = %risk.level,
            detector = ?self.detector.state(),
            reason = %decision.reason,
            "controller evaluated"
        );

        let action = match &decision.command {
            Some(command) => PlannedAction::Switch {
                device_id: self.room.dehumidifier.clone(),
                on: command.action.is_on(),
            },
            None => PlannedAction::Hold,
        };
        self.pending = Some(decision);

        let thresholds = self.thresholds;
        let detector_state = self.detector.state();
        let baseline = self.detector.baseline();
        let open_event = self.detector.open_event().map(|e| e.id);
        let reading = snapshot.clone();
        self.ctx.status.update(&self.room.room_id, move |status| {
            status.reading = Some(reading);
            status.risk = Some(risk);
            status.detector = detector_state;
            status.baseline_humidity = baseline;
            status.open_event = open_event;
            status.thresholds = thresholds;
        });

        // The controller is a deterministic rule, so its confidence is total.
        Ok(Prediction {
            action,
            confidence: 1.0,
        })
    }

    async fn observe(
        &mut self,
        snapshot: &SensorSnapshot,
        _action: &PlannedAction,
        result: &DecisionResult,
    ) {
        let Some(decision) = self.pending.take() else {
            return;
        };
        let outcome = match result {
            DecisionResult::Executed => Some(ActionOutcome::Applied),
            DecisionResult::Failed { error } => Some(ActionOutcome::Failed {
                error: error.clone(),
            }),
            DecisionResult::Suppressed { reason } => Some(ActionOutcome::Suppressed {
                reason: reason.clone(),
            }),
            DecisionResult::NoAction => None,
        };

        if let (Some(command), Some(outcome)) = (&decision.command, &outcome) {
            let record = DeviceActionRecord {
                timestamp: snapshot.timestamp,
                room_id: self.room.room_id.clone(),
                device_id: self.room.dehumidifier.clone(),
                action: command.action,
                reason: command.describe(),
                result: outcome.clone(),
            };
            let ctx = &self.ctx;
            write_through(&ctx.alerts, &self.room.room_id, "append_device_action", || {
                ctx.journal.append_device_action(record.clone())
            })
            .await;
        }

        self.control = decision.settle(outcome.as_ref());
        let device_on = self.control.device_on;
        self.ctx
            .status
            .update(&self.room.room_id, |status| status.device_on = device_on);
    }
}
