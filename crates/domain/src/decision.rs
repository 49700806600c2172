//! Decision — the gate between a prediction and an actuation.
//!
//! Every automation (lighting, heating, bathroom) runs the same cycle:
//! a predictor proposes a [`PlannedAction`] with a confidence, the
//! [`DecisionPolicy`] applies the safety rules and the operating mode, and a
//! [`DecisionRecord`] is written whatever the verdict.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{DecisionId, DeviceKey};
use crate::reading::{MAX_TEMPERATURE, MIN_TEMPERATURE, SensorSnapshot};
use crate::time::Timestamp;

/// How much authority the system has over the devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    /// Execute confident, safe predictions.
    #[default]
    Auto,
    /// Record suggestions, never actuate.
    Manual,
    /// Observe only.
    Learning,
}

impl OperatingMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
            Self::Learning => "learning",
        }
    }
}

impl FromStr for OperatingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "manual" => Ok(Self::Manual),
            "learning" => Ok(Self::Learning),
            other => Err(format!("unknown operating mode: {other}")),
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which automation produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionType {
    Lighting,
    Heating,
    Bathroom,
}

impl DecisionType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lighting => "lighting",
            Self::Heating => "heating",
            Self::Bathroom => "bathroom",
        }
    }
}

impl FromStr for DecisionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lighting" => Ok(Self::Lighting),
            "heating" => Ok(Self::Heating),
            "bathroom" => Ok(Self::Bathroom),
            other => Err(format!("unknown decision type: {other}")),
        }
    }
}

/// What a predictor wants done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlannedAction {
    /// Switch a device on or off.
    Switch { device_id: DeviceKey, on: bool },
    /// Leave everything as it is. Also the safe default.
    Hold,
}

impl PlannedAction {
    #[must_use]
    pub fn is_hold(&self) -> bool {
        matches!(self, Self::Hold)
    }

    /// Whether the action powers something up.
    #[must_use]
    pub fn activates(&self) -> bool {
        matches!(self, Self::Switch { on: true, .. })
    }
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Switch { device_id, on: true } => write!(f, "turn on {device_id}"),
            Self::Switch {
                device_id,
                on: false,
            } => write!(f, "turn off {device_id}"),
            Self::Hold => f.write_str("hold"),
        }
    }
}

/// Output of a prediction capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub action: PlannedAction,
    /// Score in `[0, 1]`.
    pub confidence: f64,
}

/// A configured veto on automated actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum SafetyRule {
    /// Nothing is switched on while a window of the room is open.
    NoActivationWhileWindowOpen,
    /// Heating is not switched on at or above this room temperature.
    MaxHeatingTemperature { celsius: f64 },
}

impl SafetyRule {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::NoActivationWhileWindowOpen => "no_activation_while_window_open",
            Self::MaxHeatingTemperature { .. } => "max_heating_temperature",
        }
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::TemperatureOutOfRange`] when a temperature
    /// limit cannot be reached by any valid reading.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::NoActivationWhileWindowOpen => Ok(()),
            Self::MaxHeatingTemperature { celsius } => {
                if (MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(celsius) {
                    Ok(())
                } else {
                    Err(ValidationError::TemperatureOutOfRange {
                        field: "max_heating_temperature.celsius",
                        value: *celsius,
                    })
                }
            }
        }
    }

    /// Check the rule against a proposed action.
    #[must_use]
    pub fn check(
        &self,
        decision_type: DecisionType,
        snapshot: &SensorSnapshot,
        action: &PlannedAction,
    ) -> Option<SafetyViolation> {
        if !action.activates() {
            return None;
        }
        let reason = match self {
            Self::NoActivationWhileWindowOpen if snapshot.window_open => {
                format!("{action} refused: window open")
            }
            Self::MaxHeatingTemperature { celsius }
                if decision_type == DecisionType::Heating && snapshot.temperature >= *celsius =>
            {
                format!(
                    "{action} refused: {:.1}°C at or above heating limit {celsius:.1}°C",
                    snapshot.temperature
                )
            }
            _ => return None,
        };
        Some(SafetyViolation {
            rule: self.name().to_string(),
            reason,
        })
    }
}

/// A safety rule that vetoed an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyViolation {
    pub rule: String,
    pub reason: String,
}

impl fmt::Display for SafetyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "safety rule {}: {}", self.rule, self.reason)
    }
}

/// Why an action was not executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Suppression {
    Manual,
    Learning,
    LowConfidence { confidence: f64, threshold: f64 },
    Safety(SafetyViolation),
}

impl fmt::Display for Suppression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => f.write_str("manual mode, suggestion only"),
            Self::Learning => f.write_str("learning mode, observing only"),
            Self::LowConfidence {
                confidence,
                threshold,
            } => write!(f, "confidence {confidence:.2} below {threshold:.2}"),
            Self::Safety(violation) => write!(f, "{violation}"),
        }
    }
}

/// Verdict of the policy on one prediction.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Execute,
    /// Nothing to do.
    Hold,
    Suppress(Suppression),
}

/// Mode, confidence threshold and safety rules in force.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionPolicy {
    pub mode: OperatingMode,
    pub confidence_threshold: f64,
    pub safety_rules: Vec<SafetyRule>,
}

impl DecisionPolicy {
    /// First violated rule, if any.
    #[must_use]
    pub fn safety_check(
        &self,
        decision_type: DecisionType,
        snapshot: &SensorSnapshot,
        action: &PlannedAction,
    ) -> Option<SafetyViolation> {
        self.safety_rules
            .iter()
            .find_map(|rule| rule.check(decision_type, snapshot, action))
    }

    /// Gate a prediction that passed (or failed) the safety check.
    #[must_use]
    pub fn verdict(&self, prediction: &Prediction, violation: Option<&SafetyViolation>) -> Verdict {
        if let Some(violation) = violation {
            return Verdict::Suppress(Suppression::Safety(violation.clone()));
        }
        if prediction.action.is_hold() {
            return Verdict::Hold;
        }
        match self.mode {
            OperatingMode::Manual => Verdict::Suppress(Suppression::Manual),
            OperatingMode::Learning => Verdict::Suppress(Suppression::Learning),
            OperatingMode::Auto if prediction.confidence < self.confidence_threshold => {
                Verdict::Suppress(Suppression::LowConfidence {
                    confidence: prediction.confidence,
                    threshold: self.confidence_threshold,
                })
            }
            OperatingMode::Auto => Verdict::Execute,
        }
    }
}

/// Final state of a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DecisionResult {
    /// The platform carried the action out.
    Executed,
    /// Execution was attempted and failed.
    Failed { error: String },
    /// Execution was withheld.
    Suppressed { reason: String },
    /// The prediction was to hold.
    NoAction,
}

/// One row per collected tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub id: DecisionId,
    pub timestamp: Timestamp,
    pub decision_type: DecisionType,
    pub input_snapshot: SensorSnapshot,
    /// The action the predictor proposed, before any veto.
    pub predicted_action: PlannedAction,
    /// `None` when a safety rule made the score moot.
    pub confidence: Option<f64>,
    /// Whether execution was attempted.
    pub executed: bool,
    pub result: DecisionResult,
}
