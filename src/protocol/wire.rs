//! Wire format decoding.
//!
//! Frame layout, all multi-byte integers Big Endian:
//!
//! ```text
//! ┌────────────┬────────┬────────────────┐
//! │ Length     │ Type   │ Body           │
//! │ 4 bytes    │ 1 byte │ length-1 bytes │
//! │ uint32 BE  │        │                │
//! └────────────┴────────┴────────────────┘
//! ```
//!
//! `length` counts the type byte plus the body, so the valid range is
//! `1..=65536`. A declared length of 0 or above the maximum means the stream
//! is corrupted: the decoder reports a protocol error and the caller tears
//! the connection down. There is no mid-stream resynchronization.

use tokio::io::{AsyncRead, AsyncReadExt};

use super::frame::{Frame, FrameType};
use crate::error::{LinkError, Result};

/// Size of the length prefix in bytes (fixed, exactly 4).
pub const LEN_PREFIX_SIZE: usize = 4;

/// Maximum declared frame length (type byte + body).
pub const MAX_FRAME_LEN: usize = 65536;

/// Maximum body size (everything after the type byte).
pub const MAX_BODY_LEN: usize = MAX_FRAME_LEN - 1;

/// Read one complete frame from `reader`.
///
/// Decoding is atomic with respect to the caller: either a complete, valid
/// frame comes back, or a terminal error. Partial reads from the transport
/// are absorbed internally by `read_exact`.
///
/// # Errors
///
/// - [`LinkError::TransportClosed`] if the stream ends before the length
///   prefix or mid-frame.
/// - [`LinkError::Protocol`] if the declared length is 0 or greater than
///   [`MAX_FRAME_LEN`], or the type tag is outside the closed set.
/// - [`LinkError::Transport`] on any other I/O failure.
pub async fn read_frame<R>(reader: &mut R) -> Result<Frame>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; LEN_PREFIX_SIZE];
    reader
        .read_exact(&mut prefix)
        .await
        .map_err(LinkError::from_io)?;

    let length = u32::from_be_bytes(prefix) as usize;
    if length == 0 || length > MAX_FRAME_LEN {
        return Err(LinkError::Protocol(format!("invalid frame length: {length}")));
    }

    let mut tag = [0u8; 1];
    reader
        .read_exact(&mut tag)
        .await
        .map_err(LinkError::from_io)?;
    let frame_type = FrameType::from_u8(tag[0])
        .ok_or_else(|| LinkError::Protocol(format!("unknown frame type: 0x{:02X}", tag[0])))?;

    let mut body = vec![0u8; length - 1];
    reader
        .read_exact(&mut body)
        .await
        .map_err(LinkError::from_io)?;

    Ok(Frame::new(frame_type, body.into()))
}
