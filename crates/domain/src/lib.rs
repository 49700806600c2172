//! # mistguard-domain
//!
//! Pure domain model for the mistguard bathroom automation.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Sensor readings and their validation
//! - Mold risk analysis (dew point, absolute humidity, risk tiers)
//! - The per-room **event detector** state machine
//! - The hysteresis **device controller** policy
//! - The **threshold learner** rule
//! - The **decision** gate (operating mode, confidence, safety rules)
//! - Validated automation settings
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod controller;
pub mod decision;
pub mod detector;
pub mod device_action;
pub mod event;
pub mod learning;
pub mod mold;
pub mod reading;
pub mod settings;
