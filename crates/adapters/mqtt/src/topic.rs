//! Topic layout: `{base}/{room}/state` in, `{base}/{device}/set` out.

use mistguard_domain::id::{DeviceKey, RoomId};

use crate::error::MqttError;

const STATE_SUFFIX: &str = "/state";
const COMMAND_SUFFIX: &str = "/set";

/// Wildcard filter matching the state topic of every room.
#[must_use]
pub fn state_filter(base: &str) -> String {
    format!("{base}/+{STATE_SUFFIX}")
}

/// State topic of one room, as published by the sensors.
#[cfg(test)]
#[must_use]
pub(crate) fn state_topic(base: &str, room_id: &RoomId) -> String {
    format!("{base}/{room_id}{STATE_SUFFIX}")
}

#[must_use]
pub fn command_topic(base: &str, device_id: &DeviceKey) -> String {
    format!("{base}/{device_id}{COMMAND_SUFFIX}")
}

/// Extract the room from a state topic.
///
/// # Errors
///
/// Returns [`MqttError::UnexpectedTopic`] when the topic does not have the
/// `{base}/{room}/state` shape.
pub fn room_from_state_topic(base: &str, topic: &str) -> Result<RoomId, MqttError> {
    let unexpected = || MqttError::UnexpectedTopic(topic.to_string());
    let room = topic
        .strip_prefix(base)
        .and_then(|rest| rest.strip_prefix('/'))
        .and_then(|rest| rest.strip_suffix(STATE_SUFFIX))
        .filter(|room| !room.contains('/'))
        .ok_or_else(unexpected)?;
    RoomId::new(room).map_err(|_| unexpected())
}
