//! Application services — use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod bathroom_monitor;
pub mod decision_cycle;
pub mod learning_service;
pub mod supervisor;
