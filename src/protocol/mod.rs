//! Protocol module - wire format, framing, and frame types.
//!
//! This module implements the binary framing shared by all link variants:
//! - Frame type enumeration and the [`Frame`] struct
//! - Length-prefixed encoding to bytes
//! - Atomic frame decoding from any `AsyncRead`

mod frame;
mod wire;

pub use frame::{Frame, FrameType};
pub use wire::{read_frame, LEN_PREFIX_SIZE, MAX_BODY_LEN, MAX_FRAME_LEN};
