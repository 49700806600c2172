//! Device controller — hysteresis policy for the dehumidifier.
//!
//! [`evaluate`] is pure: it looks at the reading, the detector state, the
//! mold risk and the active thresholds, and returns the next
//! [`ControlState`] together with a [`Command`] when the device has to move.
//! The caller settles the decision once the platform answered.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::detector::DetectorState;
use crate::device_action::{ActionOutcome, DeviceActionRecord, SwitchAction};
use crate::learning::ControlThresholds;
use crate::mold::{MoldRiskAssessment, RiskLevel};
use crate::reading::SensorSnapshot;
use crate::time::{Timestamp, seconds};

/// Why the controller wants the device in a given position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControlReason {
    WindowOpen,
    HumidityAboveThreshold { humidity: f64, threshold: f64 },
    EventActive,
    MoldRisk { level: RiskLevel },
    HumidityBelowThreshold { humidity: f64, threshold: f64 },
    /// Still on: inside the hysteresis band or the off-delay.
    Holding,
    /// Still off: nothing calls for dehumidification.
    Normal,
}

impl fmt::Display for ControlReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WindowOpen => f.write_str("window open, suppressing actuation"),
            Self::HumidityAboveThreshold {
                humidity,
                threshold,
            } => write!(f, "humidity above threshold ({humidity:.1}% > {threshold:.1}%)"),
            Self::EventActive => f.write_str("bathroom event active"),
            Self::MoldRisk { level } => write!(f, "mold risk {level}"),
            Self::HumidityBelowThreshold {
                humidity,
                threshold,
            } => write!(f, "humidity below threshold ({humidity:.1}% < {threshold:.1}%)"),
            Self::Holding => f.write_str("holding within hysteresis band"),
            Self::Normal => f.write_str("conditions normal"),
        }
    }
}

/// A switch command the controller wants sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub action: SwitchAction,
    pub reason: ControlReason,
    /// Re-sending a command the platform never confirmed.
    pub retry: bool,
}

impl Command {
    /// Human-readable reason for the audit log.
    #[must_use]
    pub fn describe(&self) -> String {
        if self.retry {
            format!("retry of unconfirmed command: {}", self.reason)
        } else {
            self.reason.to_string()
        }
    }
}

/// Controller memory for one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlState {
    /// Intended position.
    pub device_on: bool,
    /// `false` when the platform has not acknowledged the intended position.
    pub confirmed: bool,
    /// Last time an "on" condition held.
    pub last_on_condition_at: Option<Timestamp>,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            device_on: false,
            confirmed: true,
            last_on_condition_at: None,
        }
    }
}

impl ControlState {
    /// Rebuild controller memory from the last audited action, if any.
    ///
    /// Only an applied action is trusted after a restart. A failed or
    /// suppressed one leaves the state unconfirmed, so the first tick
    /// evaluates again and sends the command if the mode allows it.
    #[must_use]
    pub fn resume(last_action: Option<&DeviceActionRecord>) -> Self {
        let Some(record) = last_action else {
            return Self::default();
        };
        let device_on = record.action.is_on();
        Self {
            device_on,
            confirmed: matches!(record.result, ActionOutcome::Applied),
            last_on_condition_at: device_on.then_some(record.timestamp),
        }
    }
}

/// Everything the controller looks at on one tick.
#[derive(Debug, Clone, Copy)]
pub struct ControlInputs<'a> {
    pub reading: &'a SensorSnapshot,
    pub detector: DetectorState,
    pub risk: &'a MoldRiskAssessment,
    pub thresholds: &'a ControlThresholds,
}

/// The controller's verdict for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlDecision {
    pub command: Option<Command>,
    pub reason: ControlReason,
    next: ControlState,
}

impl ControlDecision {
    /// The state to keep once the command (if any) has been dealt with.
    ///
    /// A failed actuation keeps the intended position but marks it
    /// unconfirmed, so the next tick sends the command again.
    #[must_use]
    pub fn settle(self, outcome: Option<&ActionOutcome>) -> ControlState {
        let mut next = self.next;
        if self.command.is_some() {
            next.confirmed = outcome.is_none_or(ActionOutcome::is_settled);
        }
        next
    }

    /// Peek at the intended position.
    #[must_use]
    pub fn device_on(&self) -> bool {
        self.next.device_on
    }
}

/// Evaluate the hysteresis policy.
#[must_use]
pub fn evaluate(state: &ControlState, inputs: &ControlInputs<'_>) -> ControlDecision {
    let now = inputs.reading.timestamp;
    let humidity = inputs.reading.relative_humidity;
    let thresholds = inputs.thresholds;
    let mut next = state.clone();

    let (target, reason) = if inputs.reading.window_open {
        (false, ControlReason::WindowOpen)
    } else if let Some(reason) = on_condition(inputs) {
        next.last_on_condition_at = Some(now);
        (true, reason)
    } else if state.device_on {
        let delay_elapsed = state
            .last_on_condition_at
            .is_none_or(|at| now - at >= seconds(thresholds.dehumidifier_delay_secs));
        if humidity < thresholds.humidity_threshold_low
            && !inputs.risk.level.is_elevated()
            && delay_elapsed
        {
            (
                false,
                ControlReason::HumidityBelowThreshold {
                    humidity,
                    threshold: thresholds.humidity_threshold_low,
                },
            )
        } else {
            (true, ControlReason::Holding)
        }
    } else {
        (false, ControlReason::Normal)
    };

    let changed = target != state.device_on;
    let command = (changed || !state.confirmed).then_some(Command {
        action: SwitchAction::from_bool(target),
        reason,
        retry: !changed,
    });
    next.device_on = target;

    ControlDecision {
        command,
        reason,
        next,
    }
}

fn on_condition(inputs: &ControlInputs<'_>) -> Option<ControlReason> {
    let humidity = inputs.reading.relative_humidity;
    let threshold = inputs.thresholds.humidity_threshold_high;
    if humidity > threshold {
        Some(ControlReason::HumidityAboveThreshold {
            humidity,
            threshold,
        })
    } else if inputs.detector == DetectorState::Active {
        Some(ControlReason::EventActive)
    } else if inputs.risk.level.is_elevated() {
        Some(ControlReason::MoldRisk {
            level: inputs.risk.level,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{DeviceKey, RoomId};
    use crate::mold::MoldRiskAnalyzer;
    use chrono::{TimeDelta, TimeZone, Utc};

    fn thresholds() -> ControlThresholds {
        ControlThresholds {
            humidity_threshold_high: 70.0,
            humidity_threshold_low: 60.0,
            dehumidifier_delay_secs: 600,
        }
    }

    fn reading(minute: i64, humidity: f64, window_open: bool) -> SensorSnapshot {
        SensorSnapshot {
            room_id: RoomId::new("bathroom").unwrap(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 10, 7, 0, 0).unwrap()
                + TimeDelta::minutes(minute),
            temperature: 22.0,
            relative_humidity: humidity,
            window_open,
        }
    }

    fn decide(
        state: &ControlState,
        reading: &SensorSnapshot,
        detector: DetectorState,
    ) -> ControlDecision {
        let risk = MoldRiskAnalyzer::default()
            .assess(reading.temperature, reading.relative_humidity)
            .unwrap();
        let thresholds = thresholds();
        evaluate(
            state,
            &ControlInputs {
                reading,
                detector,
                risk: &risk,
                thresholds: &thresholds,
            },
        )
    }

    fn run(
        state: ControlState,
        minute: i64,
        humidity: f64,
        detector: DetectorState,
    ) -> (ControlState, Option<Command>) {
        let decision = decide(&state, &reading(minute, humidity, false), detector);
        let command = decision.command.clone();
        (decision.settle(Some(&ActionOutcome::Applied)), command)
    }

    #[test]
    fn should_turn_on_above_high_threshold() {
        let (state, command) = run(ControlState::default(), 0, 72.0, DetectorState::Idle);
        let command = command.unwrap();
        assert_eq!(command.action, SwitchAction::On);
        assert!(matches!(
            command.reason,
            ControlReason::HumidityAboveThreshold { .. }
        ));
        assert!(state.device_on);
    }

    #[test]
    fn should_turn_on_while_event_active() {
        let (_, command) = run(ControlState::default(), 0, 64.0, DetectorState::Active);
        assert_eq!(command.unwrap().reason, ControlReason::EventActive);
    }

    #[test]
    fn should_be_idempotent_for_unchanged_world() {
        let (state, first) = run(ControlState::default(), 0, 72.0, DetectorState::Idle);
        let (_, second) = run(state, 0, 72.0, DetectorState::Idle);
        assert!(first.is_some());
        assert!(second.is_none());
    }

    #[test]
    fn should_never_turn_on_with_window_open() {
        for humidity in [50.0, 72.0, 95.0] {
            for detector in [DetectorState::Idle, DetectorState::Active] {
                let decision = decide(
                    &ControlState::default(),
                    &reading(0, humidity, true),
                    detector,
                );
                assert!(decision.command.is_none());
                assert!(!decision.device_on());
            }
        }
    }

    #[test]
    fn should_turn_off_running_device_when_window_opens() {
        let (state, _) = run(ControlState::default(), 0, 80.0, DetectorState::Idle);
        let decision = decide(&state, &reading(1, 80.0, true), DetectorState::Idle);
        let command = decision.command.unwrap();
        assert_eq!(command.action, SwitchAction::Off);
        assert_eq!(command.reason, ControlReason::WindowOpen);
        assert_eq!(command.describe(), "window open, suppressing actuation");
    }

    #[test]
    fn should_hold_in_hysteresis_band() {
        let (state, _) = run(ControlState::default(), 0, 72.0, DetectorState::Idle);
        let (state, command) = run(state, 30, 65.0, DetectorState::Idle);
        assert!(command.is_none());
        assert!(state.device_on);
    }

    #[test]
    fn should_wait_for_off_delay_before_turning_off() {
        let (state, _) = run(ControlState::default(), 0, 72.0, DetectorState::Idle);
        let (state, command) = run(state, 5, 55.0, DetectorState::Idle);
        assert!(command.is_none(), "off-delay of 10 minutes not elapsed");
        let (state, command) = run(state, 10, 55.0, DetectorState::Idle);
        assert_eq!(command.unwrap().action, SwitchAction::Off);
        assert!(!state.device_on);
    }

    #[test]
    fn should_keep_running_while_risk_elevated() {
        let state = ControlState {
            device_on: true,
            confirmed: true,
            last_on_condition_at: None,
        };
        // 70 % is HIGH and not above the high threshold: risk keeps it on.
        let decision = decide(&state, &reading(0, 70.0, false), DetectorState::Idle);
        assert!(decision.command.is_none());
        assert!(decision.device_on());
    }

    #[test]
    fn should_retry_after_failed_actuation() {
        let decision = decide(
            &ControlState::default(),
            &reading(0, 75.0, false),
            DetectorState::Idle,
        );
        let state = decision.settle(Some(&ActionOutcome::Failed {
            error: "offline".to_string(),
        }));
        assert!(state.device_on);
        assert!(!state.confirmed);

        let retry = decide(&state, &reading(1, 75.0, false), DetectorState::Idle);
        let command = retry.command.clone().unwrap();
        assert!(command.retry);
        assert_eq!(command.action, SwitchAction::On);
        assert!(command.describe().starts_with("retry of unconfirmed command"));

        let state = retry.settle(Some(&ActionOutcome::Applied));
        assert!(state.confirmed);
    }

    #[test]
    fn should_resume_from_last_action() {
        let record = DeviceActionRecord {
            timestamp: Utc::now(),
            room_id: RoomId::new("bathroom").unwrap(),
            device_id: DeviceKey::new("switch.dehumidifier").unwrap(),
            action: SwitchAction::On,
            reason: "humidity above threshold".to_string(),
            result: ActionOutcome::Applied,
        };
        let state = ControlState::resume(Some(&record));
        assert!(state.device_on);
        assert!(state.confirmed);
        assert_eq!(state.last_on_condition_at, Some(record.timestamp));
        assert_eq!(ControlState::resume(None), ControlState::default());
    }

    #[test]
    fn should_resend_suppressed_command_after_restart() {
        let record = DeviceActionRecord {
            timestamp: reading(0, 80.0, false).timestamp,
            room_id: RoomId::new("bathroom").unwrap(),
            device_id: DeviceKey::new("switch.dehumidifier").unwrap(),
            action: SwitchAction::On,
            reason: "humidity above threshold".to_string(),
            result: ActionOutcome::Suppressed {
                reason: "manual mode".to_string(),
            },
        };
        let state = ControlState::resume(Some(&record));
        assert!(!state.confirmed);

        let decision = decide(&state, &reading(1, 80.0, false), DetectorState::Idle);
        let command = decision.command.clone().unwrap();
        assert_eq!(command.action, SwitchAction::On);
        let state = decision.settle(Some(&ActionOutcome::Applied));
        assert!(state.confirmed);

        let decision = decide(&state, &reading(2, 80.0, false), DetectorState::Idle);
        assert!(decision.command.is_none());
    }
}
