//! # mistguard-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the **JSON API** the dashboard polls: room status, events,
//!   learned parameters, decisions and operator alerts
//! - Expose the mold-risk analysis as a stateless calculator
//! - Trigger threshold learning for one room on demand
//!
//! The API never actuates anything; device commands only come from the
//! decision cycle.
//!
//! ## Dependency rule
//! Depends on `mistguard-app` (for port traits and services) and
//! `mistguard-domain` (for the types serialised in responses). Never leaks
//! axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
