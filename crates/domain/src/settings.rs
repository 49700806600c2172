//! Automation settings — the validated configuration surface of the core.
//!
//! The struct is flat so it maps one-to-one onto the `[automation]` table of
//! the configuration file; the component-specific views ([`DetectorConfig`],
//! [`LearnerConfig`], [`DecisionPolicy`], [`ControlThresholds`]) are derived
//! from it after [`AutomationSettings::validate`] succeeded.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::decision::{DecisionPolicy, OperatingMode, SafetyRule};
use crate::error::ValidationError;
use crate::learning::ControlThresholds;
use crate::time::seconds;

/// Longest accepted off-delay, settle time or baseline window.
pub const MAX_DURATION_SECS: u64 = 24 * 60 * 60;
/// Longest accepted learning lookback.
pub const MAX_LOOKBACK_DAYS: u32 = 3650;

/// Every tunable of detection, control, learning and decision gating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationSettings {
    /// Humidity (%) above which the dehumidifier turns on.
    pub humidity_threshold_high: f64,
    /// Humidity (%) below which the dehumidifier may turn off.
    pub humidity_threshold_low: f64,
    /// Off-delay after the last "should stay on" condition, in seconds.
    pub dehumidifier_delay_secs: u64,
    /// Percentage points above baseline that open an event.
    pub delta_start: f64,
    /// Percentage points above baseline still considered "back to normal".
    pub event_end_margin: f64,
    /// How long humidity must stay back to normal before an event closes, in seconds.
    pub event_cooldown_secs: u64,
    /// Span of the rolling baseline average, in seconds.
    pub baseline_window_secs: u64,
    /// Closed events required before thresholds are learned.
    pub min_events_for_learning: usize,
    /// Minimum learning confidence for a proposal to be applied.
    pub confidence_floor: f64,
    /// How far back the learner looks, in days.
    pub learning_lookback_days: u32,
    /// Minimum prediction confidence for automatic execution.
    pub decision_confidence_threshold: f64,
    pub operating_mode: OperatingMode,
    pub safety_rules: Vec<SafetyRule>,
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            humidity_threshold_high: 70.0,
            humidity_threshold_low: 60.0,
            dehumidifier_delay_secs: 600,
            delta_start: 10.0,
            event_end_margin: 3.0,
            event_cooldown_secs: 300,
            baseline_window_secs: 1800,
            min_events_for_learning: 3,
            confidence_floor: 0.70,
            learning_lookback_days: 30,
            decision_confidence_threshold: 0.70,
            operating_mode: OperatingMode::Auto,
            safety_rules: vec![SafetyRule::NoActivationWhileWindowOpen],
        }
    }
}

impl AutomationSettings {
    /// Check every range constraint once, at startup.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_percent("humidity_threshold_high", self.humidity_threshold_high)?;
        check_percent("humidity_threshold_low", self.humidity_threshold_low)?;
        if self.humidity_threshold_low >= self.humidity_threshold_high {
            return Err(ValidationError::ThresholdOrder {
                low: self.humidity_threshold_low,
                high: self.humidity_threshold_high,
            });
        }
        if !(self.delta_start.is_finite() && self.delta_start > 0.0) {
            return Err(ValidationError::NotPositive {
                field: "delta_start",
            });
        }
        if !(self.event_end_margin >= 0.0 && self.event_end_margin < self.delta_start) {
            return Err(ValidationError::MarginOutOfRange {
                margin: self.event_end_margin,
                delta: self.delta_start,
            });
        }
        if self.baseline_window_secs == 0 {
            return Err(ValidationError::NotPositive {
                field: "baseline_window_secs",
            });
        }
        check_duration("baseline_window_secs", self.baseline_window_secs)?;
        check_duration("event_cooldown_secs", self.event_cooldown_secs)?;
        check_duration("dehumidifier_delay_secs", self.dehumidifier_delay_secs)?;
        if self.min_events_for_learning == 0 {
            return Err(ValidationError::NotPositive {
                field: "min_events_for_learning",
            });
        }
        if self.learning_lookback_days == 0 {
            return Err(ValidationError::NotPositive {
                field: "learning_lookback_days",
            });
        }
        if self.learning_lookback_days > MAX_LOOKBACK_DAYS {
            return Err(ValidationError::AboveMaximum {
                field: "learning_lookback_days",
                value: u64::from(self.learning_lookback_days),
                max: u64::from(MAX_LOOKBACK_DAYS),
            });
        }
        check_ratio("confidence_floor", self.confidence_floor)?;
        check_ratio(
            "decision_confidence_threshold",
            self.decision_confidence_threshold,
        )?;
        for rule in &self.safety_rules {
            rule.validate()?;
        }
        Ok(())
    }

    /// Configuration of the event detector.
    #[must_use]
    pub fn detector(&self) -> DetectorConfig {
        DetectorConfig {
            delta_start: self.delta_start,
            end_margin: self.event_end_margin,
            cooldown: seconds(self.event_cooldown_secs),
            baseline_window: seconds(self.baseline_window_secs),
        }
    }

    /// Thresholds used until something better has been learned.
    #[must_use]
    pub fn default_thresholds(&self) -> ControlThresholds {
        ControlThresholds {
            humidity_threshold_high: self.humidity_threshold_high,
            humidity_threshold_low: self.humidity_threshold_low,
            dehumidifier_delay_secs: self.dehumidifier_delay_secs,
        }
    }

    /// Configuration of the threshold learner.
    #[must_use]
    pub fn learner(&self) -> LearnerConfig {
        LearnerConfig {
            min_events: self.min_events_for_learning,
            confidence_floor: self.confidence_floor,
            lookback: TimeDelta::days(i64::from(self.learning_lookback_days)),
        }
    }

    /// Gating policy of the decision cycle.
    #[must_use]
    pub fn decision_policy(&self) -> DecisionPolicy {
        DecisionPolicy {
            mode: self.operating_mode,
            confidence_threshold: self.decision_confidence_threshold,
            safety_rules: self.safety_rules.clone(),
        }
    }
}

fn check_percent(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value > 0.0 && value <= 100.0 {
        Ok(())
    } else {
        Err(ValidationError::PercentOutOfRange { field, value })
    }
}

fn check_duration(field: &'static str, value: u64) -> Result<(), ValidationError> {
    if value <= MAX_DURATION_SECS {
        Ok(())
    } else {
        Err(ValidationError::AboveMaximum {
            field,
            value,
            max: MAX_DURATION_SECS,
        })
    }
}

fn check_ratio(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::RatioOutOfRange { field, value })
    }
}

/// Event detector tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    pub delta_start: f64,
    pub end_margin: f64,
    pub cooldown: TimeDelta,
    pub baseline_window: TimeDelta,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        AutomationSettings::default().detector()
    }
}

/// Threshold learner gates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LearnerConfig {
    pub min_events: usize,
    pub confidence_floor: f64,
    pub lookback: TimeDelta,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        AutomationSettings::default().learner()
    }
}
