//! Threshold learning — derive control thresholds from past events.
//!
//! [`propose`] is a pure function of the closed events it is given. It never
//! stores anything; the application layer decides whether a proposal is
//! applied, based on [`LearningOutcome`].
//!
//! # Rule
//!
//! With `n` closed events, their peak humidities `p`, baselines `b` and
//! durations `d`:
//!
//! - `high  = clamp(P25(p) - 5, 40, 90)`: three out of four past events
//!   would have crossed it.
//! - `low   = clamp(mean(b) + 5, 40, 90)`, lowered to `high - 5` if needed:
//!   the room is considered dry again a little above its resting level.
//! - `delay = clamp(median(d) / 2, 5 min, 60 min)`.
//! - `confidence = n / (n + 1) * exp(-var(p) / 200)`.

use serde::{Deserialize, Serialize};

use crate::event::BathroomEvent;
use crate::id::RoomId;
use crate::settings::LearnerConfig;
use crate::time::Timestamp;

const HIGH_MARGIN: f64 = 5.0;
const LOW_MARGIN: f64 = 5.0;
const MIN_BAND: f64 = 5.0;
const THRESHOLD_FLOOR: f64 = 40.0;
const THRESHOLD_CEILING: f64 = 90.0;
const MIN_DELAY_SECS: u64 = 5 * 60;
const MAX_DELAY_SECS: u64 = 60 * 60;
const VARIANCE_SCALE: f64 = 200.0;

/// The three numbers the device controller needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlThresholds {
    pub humidity_threshold_high: f64,
    pub humidity_threshold_low: f64,
    pub dehumidifier_delay_secs: u64,
}

/// Thresholds learned for one room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedParameters {
    pub room_id: RoomId,
    pub humidity_threshold_high: f64,
    pub humidity_threshold_low: f64,
    pub dehumidifier_delay_secs: u64,
    pub learned_at: Timestamp,
    pub confidence: f64,
    pub sample_count: usize,
}

impl LearnedParameters {
    #[must_use]
    pub fn thresholds(&self) -> ControlThresholds {
        ControlThresholds {
            humidity_threshold_high: self.humidity_threshold_high,
            humidity_threshold_low: self.humidity_threshold_low,
            dehumidifier_delay_secs: self.dehumidifier_delay_secs,
        }
    }
}

/// Result of a learning pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LearningOutcome {
    /// Too few closed events to say anything.
    NotEnoughData { found: usize, required: usize },
    /// A proposal whose confidence is below the floor; must not be applied.
    BelowConfidence {
        proposal: LearnedParameters,
        floor: f64,
    },
    /// A proposal that passed both gates.
    Accepted(LearnedParameters),
}

/// Derive a proposal from closed events. Open events are ignored.
#[must_use]
pub fn propose(
    room_id: &RoomId,
    events: &[BathroomEvent],
    config: &LearnerConfig,
    now: Timestamp,
) -> LearningOutcome {
    let closed: Vec<&BathroomEvent> = events.iter().filter(|e| !e.is_open()).collect();
    if closed.len() < config.min_events {
        return LearningOutcome::NotEnoughData {
            found: closed.len(),
            required: config.min_events,
        };
    }

    let mut peaks: Vec<f64> = closed.iter().map(|e| e.peak_humidity).collect();
    peaks.sort_by(f64::total_cmp);
    let baselines: Vec<f64> = closed.iter().map(|e| e.baseline_humidity).collect();
    let mut durations: Vec<u64> = closed.iter().filter_map(|e| e.duration_secs).collect();
    durations.sort_unstable();

    let high = (percentile(&peaks, 0.25) - HIGH_MARGIN).clamp(THRESHOLD_FLOOR, THRESHOLD_CEILING);
    let low = (mean(&baselines) + LOW_MARGIN)
        .clamp(THRESHOLD_FLOOR, THRESHOLD_CEILING)
        .min(high - MIN_BAND);
    let delay = durations
        .get(durations.len() / 2)
        .map_or(MIN_DELAY_SECS, |median| median / 2)
        .clamp(MIN_DELAY_SECS, MAX_DELAY_SECS);

    let proposal = LearnedParameters {
        room_id: room_id.clone(),
        humidity_threshold_high: high,
        humidity_threshold_low: low,
        dehumidifier_delay_secs: delay,
        learned_at: now,
        confidence: confidence(&peaks),
        sample_count: closed.len(),
    };

    if proposal.confidence >= config.confidence_floor {
        LearningOutcome::Accepted(proposal)
    } else {
        LearningOutcome::BelowConfidence {
            proposal,
            floor: config.confidence_floor,
        }
    }
}

/// Confidence in `[0, 1)`: grows with the sample count, shrinks with the
/// spread of the peaks.
#[must_use]
pub fn confidence(peaks: &[f64]) -> f64 {
    if peaks.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = peaks.len() as f64;
    let size = n / (n + 1.0);
    let consistency = (-variance(peaks) / VARIANCE_SCALE).exp();
    size * consistency
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[allow(clippy::cast_precision_loss)]
fn variance(values: &[f64]) -> f64 {
    let m = mean(values);
    mean(&values.iter().map(|v| (v - m).powi(2)).collect::<Vec<_>>())
}

/// Linear-interpolated percentile of sorted values, `q` in `[0, 1]`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted {
        [] => 0.0,
        [only] => *only,
        _ => {
            let rank = q * (sorted.len() - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let weight = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * weight
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventTrigger;
    use chrono::{TimeDelta, TimeZone, Utc};

    fn room() -> RoomId {
        RoomId::new("bathroom").unwrap()
    }

    fn closed_event(day: u32, baseline: f64, peak: f64, minutes: i64) -> BathroomEvent {
        let start = Utc.with_ymd_and_hms(2026, 1, day, 7, 0, 0).unwrap();
        let mut event = BathroomEvent::open(
            room(),
            EventTrigger::HumiditySpike,
            start,
            baseline,
            peak,
            15.0,
        );
        event.close(start + TimeDelta::minutes(minutes));
        event
    }

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn should_report_not_enough_data_below_min_events() {
        let events = vec![
            closed_event(1, 55.0, 80.0, 30),
            closed_event(2, 55.0, 81.0, 30),
        ];
        let outcome = propose(&room(), &events, &LearnerConfig::default(), now());
        assert_eq!(
            outcome,
            LearningOutcome::NotEnoughData {
                found: 2,
                required: 3
            }
        );
    }

    #[test]
    fn should_ignore_open_events() {
        let mut open = closed_event(3, 55.0, 80.0, 30);
        open.end_time = None;
        let events = vec![
            closed_event(1, 55.0, 80.0, 30),
            closed_event(2, 55.0, 81.0, 30),
            open,
        ];
        let outcome = propose(&room(), &events, &LearnerConfig::default(), now());
        assert!(matches!(
            outcome,
            LearningOutcome::NotEnoughData { found: 2, .. }
        ));
    }

    #[test]
    fn should_accept_consistent_history() {
        let events = vec![
            closed_event(1, 54.0, 80.0, 30),
            closed_event(2, 56.0, 82.0, 40),
            closed_event(3, 55.0, 81.0, 50),
            closed_event(4, 55.0, 83.0, 40),
        ];
        let LearningOutcome::Accepted(params) =
            propose(&room(), &events, &LearnerConfig::default(), now())
        else {
            panic!("expected accepted proposal");
        };
        // P25 of [80, 81, 82, 83] is 80.75.
        assert!((params.humidity_threshold_high - 75.75).abs() < 1e-9);
        assert!((params.humidity_threshold_low - 60.0).abs() < 1e-9);
        // Median of [30, 40, 40, 50] minutes (upper middle) is 40 → 20 minutes.
        assert_eq!(params.dehumidifier_delay_secs, 20 * 60);
        assert_eq!(params.sample_count, 4);
        assert!(params.confidence >= 0.7);
        assert_eq!(params.learned_at, now());
    }

    #[test]
    fn should_reject_noisy_history_below_confidence_floor() {
        let events = vec![
            closed_event(1, 55.0, 66.0, 30),
            closed_event(2, 55.0, 95.0, 30),
            closed_event(3, 55.0, 70.0, 30),
        ];
        let outcome = propose(&room(), &events, &LearnerConfig::default(), now());
        assert!(matches!(
            outcome,
            LearningOutcome::BelowConfidence { floor, .. } if (floor - 0.7).abs() < f64::EPSILON
        ));
    }

    #[test]
    fn should_keep_low_threshold_below_high() {
        let events = vec![
            closed_event(1, 70.0, 78.0, 30),
            closed_event(2, 70.0, 78.0, 30),
            closed_event(3, 70.0, 78.0, 30),
        ];
        let outcome = propose(&room(), &events, &LearnerConfig::default(), now());
        let params = match outcome {
            LearningOutcome::Accepted(p)
            | LearningOutcome::BelowConfidence { proposal: p, .. } => p,
            LearningOutcome::NotEnoughData { .. } => panic!("expected a proposal"),
        };
        assert!(params.humidity_threshold_low <= params.humidity_threshold_high - 5.0);
    }

    #[test]
    fn should_clamp_delay_to_bounds() {
        let events = vec![
            closed_event(1, 55.0, 80.0, 2),
            closed_event(2, 55.0, 80.0, 2),
            closed_event(3, 55.0, 80.0, 2),
        ];
        let outcome = propose(&room(), &events, &LearnerConfig::default(), now());
        let LearningOutcome::Accepted(params) = outcome else {
            panic!("expected accepted proposal");
        };
        assert_eq!(params.dehumidifier_delay_secs, 5 * 60);
    }

    #[test]
    fn should_increase_confidence_with_sample_count() {
        let few = confidence(&[80.0, 82.0, 81.0]);
        let many = confidence(&[80.0, 82.0, 81.0, 80.0, 82.0, 81.0]);
        assert!(many > few);
    }

    #[test]
    fn should_decrease_confidence_with_variance() {
        let tight = confidence(&[80.0, 81.0, 82.0]);
        let loose = confidence(&[70.0, 81.0, 92.0]);
        assert!(tight > loose);
    }

    #[test]
    fn should_interpolate_percentile() {
        assert!((percentile(&[10.0, 20.0], 0.5) - 15.0).abs() < 1e-9);
        assert!((percentile(&[42.0], 0.9) - 42.0).abs() < 1e-9);
    }
}
