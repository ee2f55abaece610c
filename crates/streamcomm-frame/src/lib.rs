//! Fixed-header tagged frame codec for length-prefixed stream messaging.
//!
//! Every message on the wire is a fixed 8-byte header followed by exactly
//! `payload_size` payload bytes:
//! - A 2-byte big-endian routing tag
//! - A 2-byte big-endian message type
//! - A 4-byte big-endian payload length
//!
//! The header carries no magic bytes and no checksum; stream integrity and
//! ordering come from the underlying transport (TCP).

pub mod codec;
pub mod error;

pub use codec::{encode_frame, FrameHeader, HEADER_SIZE};
pub use error::{FrameError, Result};
