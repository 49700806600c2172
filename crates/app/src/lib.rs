//! # mistguard-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `BathroomEventRepository` — open, update, close and query events
//!   - `Journal` — append & query measurements, device actions, decisions
//!   - `ParameterRepository` — learned thresholds per room
//!   - `Platform` — read sensors, switch devices
//!   - `Predictor` — propose the next action
//! - Define **driving/inbound** use-cases:
//!   - `DecisionCycle` — collect, predict, safety check, execute, log
//!   - `BathroomMonitor` — detector + controller for one room
//!   - `LearningService` — derive and apply thresholds
//!   - `Supervisor` — per-room state map and interval loops
//! - Provide **in-process infrastructure** that doesn't need IO
//!   (operator alerts, status board)
//!
//! ## Dependency rule
//! Depends on `mistguard-domain` only (plus `tokio` for locks and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod alerts;
pub mod ports;
pub mod services;
pub mod status;

#[cfg(test)]
pub(crate) mod testing;
