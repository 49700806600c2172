//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod event_repo;
pub mod journal;
pub mod parameter_repo;
pub mod platform;
pub mod predictor;

pub use event_repo::BathroomEventRepository;
pub use journal::Journal;
pub use parameter_repo::ParameterRepository;
pub use platform::Platform;
pub use predictor::Predictor;
