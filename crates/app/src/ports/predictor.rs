//! Predictor port — the capability that proposes what to do next.
//!
//! The decision cycle treats predictors as black boxes: a learned model, a
//! fixed schedule or the bathroom hysteresis policy all fit behind it.

use std::future::Future;

use mistguard_domain::decision::{DecisionResult, DecisionType, PlannedAction, Prediction};
use mistguard_domain::error::MistguardError;
use mistguard_domain::reading::SensorSnapshot;

/// Proposes an action for a snapshot and learns how it went.
pub trait Predictor {
    /// Which automation this predictor drives.
    fn decision_type(&self) -> DecisionType;

    /// Propose an action with a confidence in `[0, 1]`.
    fn predict(
        &mut self,
        snapshot: &SensorSnapshot,
    ) -> impl Future<Output = Result<Prediction, MistguardError>> + Send;

    /// Told what became of the last prediction. Stateful predictors use it
    /// to keep track of the device position; the default does nothing.
    fn observe(
        &mut self,
        _snapshot: &SensorSnapshot,
        _action: &PlannedAction,
        _result: &DecisionResult,
    ) -> impl Future<Output = ()> + Send {
        async {}
    }
}
