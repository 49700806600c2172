//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`MistguardError`] via `From`, so port boundaries only ever see one type.

/// Top-level error shared by every port and service.
#[derive(Debug, thiserror::Error)]
pub enum MistguardError {
    /// A domain invariant or configuration constraint was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A referenced record does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// A sensor reading is physically implausible.
    #[error("invalid input")]
    InvalidInput(#[from] ReadingError),

    /// The persistence collaborator failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The home-automation platform failed or rejected a command.
    #[error("platform error")]
    Platform(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Violated invariant on a domain value or on the configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// An identifier or name was empty.
    #[error("name must not be empty")]
    EmptyName,

    /// A percentage value lies outside `(0, 100]`.
    #[error("{field} must be within (0, 100], got {value}")]
    PercentOutOfRange { field: &'static str, value: f64 },

    /// A ratio (confidence, floor, threshold) lies outside `[0, 1]`.
    #[error("{field} must be within [0, 1], got {value}")]
    RatioOutOfRange { field: &'static str, value: f64 },

    /// The low humidity threshold is not strictly below the high one.
    #[error("humidity_threshold_low ({low}) must be below humidity_threshold_high ({high})")]
    ThresholdOrder { low: f64, high: f64 },

    /// A value that must be strictly positive is not.
    #[error("{field} must be positive")]
    NotPositive { field: &'static str },

    /// A duration or span is longer than the supported maximum.
    #[error("{field} must be at most {max}, got {value}")]
    AboveMaximum {
        field: &'static str,
        value: u64,
        max: u64,
    },

    /// `event_end_margin` must stay below `delta_start`, otherwise an event
    /// could close on the very reading that opened it.
    #[error("event_end_margin ({margin}) must be within [0, delta_start = {delta})")]
    MarginOutOfRange { margin: f64, delta: f64 },

    /// A configured temperature lies outside the supported sensor range.
    #[error("{field} must be within [-40, 60] °C, got {value}")]
    TemperatureOutOfRange { field: &'static str, value: f64 },

    /// The same room was configured twice.
    #[error("room {0} is configured more than once")]
    DuplicateRoom(String),
}

/// A referenced record could not be found.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// A sensor reading that cannot be analysed.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ReadingError {
    /// Relative humidity must be within `(0, 100]`.
    #[error("relative humidity {0}% is outside (0, 100]")]
    HumidityOutOfRange(f64),

    /// Temperature must be within the supported physical range.
    #[error("temperature {0}°C is outside [-40, 60]")]
    TemperatureOutOfRange(f64),

    /// `NaN` or infinite input.
    #[error("reading is not a finite number")]
    NotFinite,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_validation_error_into_top_level_error() {
        let err: MistguardError = ValidationError::EmptyName.into();
        assert!(matches!(
            err,
            MistguardError::Validation(ValidationError::EmptyName)
        ));
    }

    #[test]
    fn should_convert_reading_error_into_invalid_input() {
        let err: MistguardError = ReadingError::HumidityOutOfRange(120.0).into();
        assert!(matches!(err, MistguardError::InvalidInput(_)));
    }

    #[test]
    fn should_display_not_found_error() {
        let err = NotFoundError {
            entity: "Room",
            id: "bathroom".to_string(),
        };
        assert_eq!(err.to_string(), "Room bathroom not found");
    }

    #[test]
    fn should_display_threshold_order_error() {
        let err = ValidationError::ThresholdOrder {
            low: 70.0,
            high: 60.0,
        };
        assert!(err.to_string().contains("must be below"));
    }
}
