//! Wire protocol for the robot command channel.
//!
//! Commands arrive as JSON text; acknowledgments and the hello handshake go
//! back the same way. Unknown fields are ignored, a missing `action` is a
//! no-op, and non-JSON input degrades to an empty command rather than
//! aborting the receive loop.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Fixed command vocabulary understood by the actuation handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Stop,
}

impl Action {
    /// Parse one action token. Anything outside the vocabulary is `None`.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "up" => Some(Action::Up),
            "down" => Some(Action::Down),
            "left" => Some(Action::Left),
            "right" => Some(Action::Right),
            "stop" => Some(Action::Stop),
            _ => None,
        }
    }

    /// Wire spelling of this action.
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Up => "up",
            Action::Down => "down",
            Action::Left => "left",
            Action::Right => "right",
            Action::Stop => "stop",
        }
    }
}

/// Inbound command message.
///
/// `action` is kept as raw text so the acknowledgment can echo exactly what
/// was received, even when it falls outside the vocabulary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Command {
    #[serde(default)]
    pub action: Option<String>,

    #[serde(default)]
    pub speed: Option<f64>,
}

impl Command {
    /// Parse raw message text. Malformed input degrades to an empty command.
    pub fn parse(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    /// The recognized action, if the raw token is in the vocabulary.
    pub fn action(&self) -> Option<Action> {
        self.action.as_deref().and_then(Action::parse)
    }

    /// Intensity clamped to the 0..=100 wire range.
    pub fn speed(&self) -> Option<u8> {
        self.speed.map(|s| s.clamp(0.0, 100.0) as u8)
    }
}

/// Acknowledgment sent exactly once per received command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    #[serde(rename = "type")]
    pub kind: String,
    pub action: Option<String>,
    pub ts: f64,
}

impl Ack {
    /// Acknowledgment echoing the received action, stamped now.
    pub fn for_action(action: Option<String>) -> Self {
        Self { kind: "ack".to_string(), action, ts: unix_now() }
    }

    /// Serialize for the wire.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("ack is serializable")
    }
}

/// One-time handshake announcing the robot after connect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hello {
    #[serde(rename = "type")]
    pub kind: String,
    pub robot_id: String,
    pub ts: f64,
}

impl Hello {
    /// Handshake for the given robot, stamped now.
    pub fn new(robot_id: impl Into<String>) -> Self {
        Self { kind: "hello".to_string(), robot_id: robot_id.into(), ts: unix_now() }
    }

    /// Serialize for the wire.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("hello is serializable")
    }
}

/// Wall-clock seconds since the Unix epoch, as the wire format expects.
fn unix_now() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_command_parses() {
        let cmd = Command::parse(r#"{"action":"stop","speed":40}"#);
        assert_eq!(cmd.action(), Some(Action::Stop));
        assert_eq!(cmd.speed(), Some(40));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let cmd = Command::parse(r#"{"action":"left","speed":10,"seq":7,"extra":"x"}"#);
        assert_eq!(cmd.action(), Some(Action::Left));
    }

    #[test]
    fn missing_action_is_a_no_op() {
        let cmd = Command::parse(r#"{"speed":50}"#);
        assert_eq!(cmd.action, None);
        assert_eq!(cmd.action(), None);
        assert_eq!(cmd.speed(), Some(50));
    }

    #[test]
    fn malformed_input_degrades_to_empty_command() {
        let cmd = Command::parse("{not json at all");
        assert_eq!(cmd.action, None);
        assert_eq!(cmd.speed, None);
    }

    #[test]
    fn out_of_vocabulary_action_is_kept_raw_but_unrecognized() {
        let cmd = Command::parse(r#"{"action":"warp"}"#);
        assert_eq!(cmd.action.as_deref(), Some("warp"));
        assert_eq!(cmd.action(), None);
    }

    #[test]
    fn speed_is_clamped_to_wire_range() {
        assert_eq!(Command::parse(r#"{"speed":250}"#).speed(), Some(100));
        assert_eq!(Command::parse(r#"{"speed":-3}"#).speed(), Some(0));
    }

    #[test]
    fn ack_shape_matches_wire_format() {
        let ack = Ack::for_action(Some("stop".to_string()));
        let value: serde_json::Value = serde_json::from_str(&ack.to_json()).expect("json");
        assert_eq!(value["type"], "ack");
        assert_eq!(value["action"], "stop");
        assert!(value["ts"].is_number());
    }

    #[test]
    fn ack_for_unknown_action_carries_null() {
        let ack = Ack::for_action(None);
        let value: serde_json::Value = serde_json::from_str(&ack.to_json()).expect("json");
        assert_eq!(value["type"], "ack");
        assert!(value["action"].is_null());
    }

    #[test]
    fn hello_shape_matches_wire_format() {
        let hello = Hello::new("r1");
        let value: serde_json::Value = serde_json::from_str(&hello.to_json()).expect("json");
        assert_eq!(value["type"], "hello");
        assert_eq!(value["robot_id"], "r1");
        assert!(value["ts"].is_number());
    }
}
