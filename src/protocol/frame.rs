//! Frame struct and frame type enumeration.

use bytes::{BufMut, Bytes, BytesMut};

use super::wire::LEN_PREFIX_SIZE;
use crate::error::Result;
use crate::message::{Command, StreamConfig};

/// The closed set of wire frame types.
///
/// One type byte per frame, directly after the length prefix. `Data` is the
/// payload stream (raw PCM for the audio link, text/JSON chunks for the
/// messaging link); the other three are control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameType {
    /// Stream format description, sent once by the initiator right after
    /// connecting. Advisory only.
    Config = 0x01,
    /// An opaque chunk of the payload stream. Ordering comes solely from the
    /// transport; there are no sequence numbers.
    Data = 0x02,
    /// Structured key/value command, bidirectional. Carries application
    /// commands and the `pause`/`resume` flow-control signals.
    Command = 0x03,
    /// Empty-body liveness probe. Receipt confirms the link and is otherwise
    /// discarded.
    Heartbeat = 0x04,
}

impl FrameType {
    /// Decode a type tag. Returns `None` for tags outside the closed set.
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(FrameType::Config),
            0x02 => Some(FrameType::Data),
            0x03 => Some(FrameType::Command),
            0x04 => Some(FrameType::Heartbeat),
            _ => None,
        }
    }

    /// The wire tag for this frame type.
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for FrameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FrameType::Config => "CONFIG",
            FrameType::Data => "DATA",
            FrameType::Command => "COMMAND",
            FrameType::Heartbeat => "HEARTBEAT",
        };
        f.write_str(name)
    }
}

/// One length-prefixed, typed unit of the wire protocol.
///
/// The body is opaque at this layer. Invariant (caller-validated on encode,
/// enforced on decode): type byte + body never exceeds
/// [`MAX_FRAME_LEN`](super::MAX_FRAME_LEN) bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame type tag.
    pub frame_type: FrameType,
    /// Opaque body, 0..=65535 bytes.
    pub body: Bytes,
}

impl Frame {
    /// Create a frame from a type and body.
    pub fn new(frame_type: FrameType, body: Bytes) -> Self {
        Self { frame_type, body }
    }

    /// Build a `CONFIG` frame from a stream format description.
    pub fn config(config: &StreamConfig) -> Result<Self> {
        let body = serde_json::to_vec(config)?;
        Ok(Self::new(FrameType::Config, Bytes::from(body)))
    }

    /// Build a `COMMAND` frame from a structured command.
    pub fn command(command: &Command) -> Result<Self> {
        let body = serde_json::to_vec(command)?;
        Ok(Self::new(FrameType::Command, Bytes::from(body)))
    }

    /// Build a `DATA` frame carrying one payload chunk.
    #[inline]
    pub fn data(chunk: Bytes) -> Self {
        Self::new(FrameType::Data, chunk)
    }

    /// Build an empty `HEARTBEAT` frame.
    #[inline]
    pub fn heartbeat() -> Self {
        Self::new(FrameType::Heartbeat, Bytes::new())
    }

    /// Total encoded size (length prefix + type byte + body).
    #[inline]
    pub fn encoded_len(&self) -> usize {
        LEN_PREFIX_SIZE + 1 + self.body.len()
    }

    /// Encode to wire bytes: `BE-u32(1 + body.len()) || type || body`.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_u32(1 + self.body.len() as u32);
        buf.put_u8(self.frame_type.as_u8());
        buf.extend_from_slice(&self.body);
        buf.freeze()
    }
}
