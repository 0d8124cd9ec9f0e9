//! Control-plane message bodies.
//!
//! `CONFIG` and `COMMAND` frame bodies are JSON records. This module defines
//! their shapes and the flow-control command names.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Flow-control command: stop transmitting data-plane chunks.
pub const CMD_PAUSE: &str = "pause";

/// Flow-control command: resume transmitting data-plane chunks.
pub const CMD_RESUME: &str = "resume";

/// Stream format description carried in the `CONFIG` frame body.
///
/// Sent once by the initiator immediately after connecting. Advisory only:
/// the receiver is not required to validate it before accepting data frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Samples per second for audio payloads.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u8,
    /// Encoding tag, e.g. `"pcm_16bit_le"`.
    pub encoding: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            channels: 1,
            encoding: "pcm_16bit_le".to_string(),
        }
    }
}

/// Structured key/value payload of a `COMMAND` frame.
///
/// At minimum a `cmd` string; the messaging variant additionally stamps a
/// millisecond timestamp, a sender tag, and free-form arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Command name. `"pause"` and `"resume"` are reserved for flow control.
    pub cmd: String,

    /// Millisecond timestamp at send time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<u64>,

    /// Sender tag, e.g. `"linux"` or `"glass"`.
    #[serde(default, rename = "from", skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,

    /// Free-form command arguments.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub args: Map<String, Value>,
}

impl Command {
    /// Create a bare command with no metadata.
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            ts: None,
            sender: None,
            args: Map::new(),
        }
    }

    /// The `pause` flow-control command.
    pub fn pause() -> Self {
        Self::new(CMD_PAUSE)
    }

    /// The `resume` flow-control command.
    pub fn resume() -> Self {
        Self::new(CMD_RESUME)
    }

    /// Whether this is one of the two flow-control commands.
    pub fn is_flow_control(&self) -> bool {
        self.cmd == CMD_PAUSE || self.cmd == CMD_RESUME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_audio_variant() {
        let config = StreamConfig::default();
        assert_eq!(config.sample_rate, 22050);
        assert_eq!(config.channels, 1);
        assert_eq!(config.encoding, "pcm_16bit_le");
    }

    #[test]
    fn test_config_json_field_names() {
        let json = serde_json::to_value(StreamConfig::default()).unwrap();
        assert_eq!(json["sample_rate"], 22050);
        assert_eq!(json["channels"], 1);
        assert_eq!(json["encoding"], "pcm_16bit_le");
    }

    #[test]
    fn test_flow_control_commands_are_bare() {
        // Pause/resume carry no additional fields on the wire.
        let json = serde_json::to_string(&Command::pause()).unwrap();
        assert_eq!(json, r#"{"cmd":"pause"}"#);

        let json = serde_json::to_string(&Command::resume()).unwrap();
        assert_eq!(json, r#"{"cmd":"resume"}"#);
    }

    #[test]
    fn test_command_roundtrip_with_metadata() {
        let mut cmd = Command::new("brightness");
        cmd.ts = Some(1_700_000_000_000);
        cmd.sender = Some("linux".to_string());
        cmd.args.insert("level".to_string(), 7.into());

        let json = serde_json::to_string(&cmd).unwrap();
        let parsed: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cmd);
        assert!(json.contains(r#""from":"linux""#));
    }

    #[test]
    fn test_command_tolerates_missing_metadata() {
        let parsed: Command = serde_json::from_str(r#"{"cmd":"pause"}"#).unwrap();
        assert!(parsed.is_flow_control());
        assert!(parsed.ts.is_none());
        assert!(parsed.args.is_empty());
    }
}
