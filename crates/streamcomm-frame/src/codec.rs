use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: routing tag (2) + message type (2) + payload length (4) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// The fixed wire header preceding every payload.
///
/// All fields are big-endian on the wire. `payload_size` is the exact byte
/// length of the payload that immediately follows; a receiver must read that
/// many bytes before interpreting them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Routing tag addressing a component on the peer.
    pub routing_tag: u16,
    /// Numeric message type within the routing tag's namespace.
    pub msg_type: u16,
    /// Exact byte length of the payload following the header.
    pub payload_size: u32,
}

impl FrameHeader {
    /// Create a header with an explicit payload size.
    pub fn new(routing_tag: u16, msg_type: u16, payload_size: u32) -> Self {
        Self {
            routing_tag,
            msg_type,
            payload_size,
        }
    }

    /// Create a header for a payload of `len` bytes, rejecting lengths that
    /// do not fit the 4-byte wire field.
    pub fn for_payload(routing_tag: u16, msg_type: u16, len: usize) -> Result<Self> {
        if len > u32::MAX as usize {
            return Err(FrameError::PayloadTooLarge {
                size: len,
                max: u32::MAX as usize,
            });
        }
        Ok(Self::new(routing_tag, msg_type, len as u32))
    }

    /// Encode into wire order.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..2].copy_from_slice(&self.routing_tag.to_be_bytes());
        out[2..4].copy_from_slice(&self.msg_type.to_be_bytes());
        out[4..8].copy_from_slice(&self.payload_size.to_be_bytes());
        out
    }

    /// Decode from wire order. Any 8 bytes form a structurally valid header.
    pub fn decode(bytes: &[u8; HEADER_SIZE]) -> Self {
        Self {
            routing_tag: u16::from_be_bytes([bytes[0], bytes[1]]),
            msg_type: u16::from_be_bytes([bytes[2], bytes[3]]),
            payload_size: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    /// The total wire size of a frame with this header.
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload_size as usize
    }
}

/// Encode a complete frame into the wire format.
///
/// Wire format (all multi-byte fields big-endian):
/// ```text
/// ┌───────────────┬──────────────┬──────────────────┬──────────────────┐
/// │ routing_tag   │ msg_type     │ payload_size      │ Payload          │
/// │ (2B BE)       │ (2B BE)      │ (4B BE)           │ (payload_size B) │
/// └───────────────┴──────────────┴──────────────────┴──────────────────┘
/// ```
pub fn encode_frame(
    routing_tag: u16,
    msg_type: u16,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    let header = FrameHeader::for_payload(routing_tag, msg_type, payload.len())?;
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&header.encode());
    dst.put_slice(payload);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrip() {
        let header = FrameHeader::new(7, 42, 1234);
        let decoded = FrameHeader::decode(&header.encode());
        assert_eq!(decoded, header);
    }

    #[test]
    fn header_wire_layout_is_big_endian() {
        let header = FrameHeader::new(1, 2, 5);
        assert_eq!(header.encode(), [0, 1, 0, 2, 0, 0, 0, 5]);
    }

    #[test]
    fn header_wire_layout_high_bytes() {
        let header = FrameHeader::new(0x1234, 0xABCD, 0x0102_0304);
        assert_eq!(
            header.encode(),
            [0x12, 0x34, 0xAB, 0xCD, 0x01, 0x02, 0x03, 0x04]
        );
    }

    #[test]
    fn encode_frame_produces_header_then_payload() {
        let mut buf = BytesMut::new();
        encode_frame(1, 2, b"hello", &mut buf).unwrap();

        assert_eq!(buf.len(), HEADER_SIZE + 5);
        assert_eq!(&buf[..HEADER_SIZE], &[0, 1, 0, 2, 0, 0, 0, 5]);
        assert_eq!(&buf[HEADER_SIZE..], b"hello");
    }

    #[test]
    fn empty_payload() {
        let mut buf = BytesMut::new();
        encode_frame(3, 0, b"", &mut buf).unwrap();

        assert_eq!(buf.len(), HEADER_SIZE);
        let mut header = [0u8; HEADER_SIZE];
        header.copy_from_slice(&buf[..]);
        assert_eq!(FrameHeader::decode(&header).payload_size, 0);
    }

    #[test]
    fn oversized_payload_rejected() {
        let err = FrameHeader::for_payload(1, 1, u32::MAX as usize + 1).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
    }

    #[test]
    fn wire_size_includes_header() {
        let header = FrameHeader::new(1, 1, 100);
        assert_eq!(header.wire_size(), HEADER_SIZE + 100);
    }
}
