//! Device action — append-only audit of dehumidifier state changes.

use serde::{Deserialize, Serialize};

use crate::id::{DeviceKey, RoomId};
use crate::time::Timestamp;

/// Requested switch position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchAction {
    On,
    Off,
}

impl SwitchAction {
    #[must_use]
    pub fn from_bool(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }

    #[must_use]
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }
}

impl std::str::FromStr for SwitchAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            other => Err(format!("unknown switch action: {other}")),
        }
    }
}

impl std::fmt::Display for SwitchAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened when a command was handed to the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The platform accepted the command.
    Applied,
    /// The platform rejected the command or could not be reached.
    Failed { error: String },
    /// The command was not sent (operating mode, safety rule, low confidence).
    Suppressed { reason: String },
}

impl ActionOutcome {
    /// Whether the intended state can be considered reached or deliberately
    /// withheld; only failures call for a retry.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// One dehumidifier state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceActionRecord {
    pub timestamp: Timestamp,
    pub room_id: RoomId,
    pub device_id: DeviceKey,
    pub action: SwitchAction,
    pub reason: String,
    pub result: ActionOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_map_bool_to_switch_action() {
        assert_eq!(SwitchAction::from_bool(true), SwitchAction::On);
        assert_eq!(SwitchAction::from_bool(false), SwitchAction::Off);
        assert!(SwitchAction::On.is_on());
    }

    #[test]
    fn should_treat_only_failures_as_unsettled() {
        assert!(ActionOutcome::Applied.is_settled());
        assert!(
            ActionOutcome::Suppressed {
                reason: "manual mode".to_string()
            }
            .is_settled()
        );
        assert!(
            !ActionOutcome::Failed {
                error: "timeout".to_string()
            }
            .is_settled()
        );
    }

    #[test]
    fn should_serialize_outcome_with_status_tag() {
        let json = serde_json::to_value(ActionOutcome::Failed {
            error: "offline".to_string(),
        })
        .unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "offline");
    }
}
