use bytes::Bytes;

use streamcomm_frame::{FrameError, FrameHeader, HEADER_SIZE};

/// One encoded outgoing message: the pre-encoded wire header plus the payload
/// bytes produced by the codec.
///
/// Created on the caller's thread inside `send`, owned by the outbound queue
/// while waiting, consumed by the write that transmits it.
#[derive(Debug)]
pub(crate) struct OutboundEntry {
    pub(crate) header: [u8; HEADER_SIZE],
    pub(crate) payload: Bytes,
}

impl OutboundEntry {
    pub(crate) fn new(
        routing_tag: u16,
        msg_type: u16,
        payload: Bytes,
    ) -> Result<Self, FrameError> {
        let header = FrameHeader::for_payload(routing_tag, msg_type, payload.len())?;
        Ok(Self {
            header: header.encode(),
            payload,
        })
    }

    #[cfg(test)]
    pub(crate) fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_carries_encoded_header() {
        let entry = OutboundEntry::new(1, 2, Bytes::from_static(b"hello")).unwrap();

        assert_eq!(entry.header, [0, 1, 0, 2, 0, 0, 0, 5]);
        assert_eq!(entry.payload.as_ref(), b"hello");
        assert_eq!(entry.wire_size(), HEADER_SIZE + 5);
    }

    #[test]
    fn empty_payload_entry() {
        let entry = OutboundEntry::new(4, 9, Bytes::new()).unwrap();

        assert_eq!(entry.header, [0, 4, 0, 9, 0, 0, 0, 0]);
        assert!(entry.payload.is_empty());
    }
}
