//! The message codec seam and the registry implementation behind it.
//!
//! The transport core never interprets payload bytes itself. A
//! [`MessageCodec`] turns an outgoing message into payload bytes and a
//! received `(routing_tag, msg_type, payload)` triple back into a message.
//! Ship-your-own codecs plug in here; [`BytesCodec`] and [`MessageRegistry`]
//! cover the common cases.

use std::collections::HashMap;

use bytes::Bytes;

use crate::error::CodecError;

/// Serialize/deserialize contract between the transport and the schema layer.
///
/// Codec failures are per-message: the client reports them on the event
/// channel and keeps the connection alive.
pub trait MessageCodec: Send + Sync + 'static {
    /// The decoded message type moved through events and `send`.
    type Message: Send + 'static;

    /// Encode an outgoing message into payload bytes.
    fn encode(
        &self,
        routing_tag: u16,
        msg_type: u16,
        message: &Self::Message,
    ) -> Result<Bytes, CodecError>;

    /// Decode a received payload into a message.
    fn decode(
        &self,
        routing_tag: u16,
        msg_type: u16,
        payload: &[u8],
    ) -> Result<Self::Message, CodecError>;
}

/// Passthrough codec: messages are the raw payload bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct BytesCodec;

impl MessageCodec for BytesCodec {
    type Message = Bytes;

    fn encode(
        &self,
        _routing_tag: u16,
        _msg_type: u16,
        message: &Bytes,
    ) -> Result<Bytes, CodecError> {
        Ok(message.clone())
    }

    fn decode(&self, _routing_tag: u16, _msg_type: u16, payload: &[u8]) -> Result<Bytes, CodecError> {
        Ok(Bytes::copy_from_slice(payload))
    }
}

/// Decoder factory registered for one `(routing_tag, msg_type)` pair.
pub type DecodeFn<M> = Box<dyn Fn(&[u8]) -> Result<M, CodecError> + Send + Sync>;

/// Encoder shared by every message the registry sends.
pub type EncodeFn<M> = Box<dyn Fn(&M) -> Result<Bytes, CodecError> + Send + Sync>;

/// Schema lookup keyed by the two header tags.
///
/// Decoding a pair that was never registered fails with
/// [`CodecError::UnknownType`]. Encoding goes through one registry-wide
/// encode function: outgoing messages already know how to serialize
/// themselves, the lookup is only needed to pick a decoder.
pub struct MessageRegistry<M> {
    decoders: HashMap<(u16, u16), DecodeFn<M>>,
    encode: EncodeFn<M>,
}

impl<M> MessageRegistry<M> {
    /// Create a registry with the encode function used for every send.
    pub fn new<E>(encode: E) -> Self
    where
        E: Fn(&M) -> Result<Bytes, CodecError> + Send + Sync + 'static,
    {
        Self {
            decoders: HashMap::new(),
            encode: Box::new(encode),
        }
    }

    /// Register a decoder factory for a `(routing_tag, msg_type)` pair.
    /// A later registration for the same pair replaces the earlier one.
    pub fn register<D>(&mut self, routing_tag: u16, msg_type: u16, decode: D)
    where
        D: Fn(&[u8]) -> Result<M, CodecError> + Send + Sync + 'static,
    {
        self.decoders
            .insert((routing_tag, msg_type), Box::new(decode));
    }

    /// Look up the decoder registered for a pair, if any.
    pub fn lookup(&self, routing_tag: u16, msg_type: u16) -> Option<&DecodeFn<M>> {
        self.decoders.get(&(routing_tag, msg_type))
    }

    /// True if a decoder is registered for the pair.
    pub fn is_registered(&self, routing_tag: u16, msg_type: u16) -> bool {
        self.decoders.contains_key(&(routing_tag, msg_type))
    }
}

impl<M: Send + 'static> MessageCodec for MessageRegistry<M> {
    type Message = M;

    fn encode(&self, _routing_tag: u16, _msg_type: u16, message: &M) -> Result<Bytes, CodecError> {
        (self.encode)(message)
    }

    fn decode(&self, routing_tag: u16, msg_type: u16, payload: &[u8]) -> Result<M, CodecError> {
        let decode = self
            .lookup(routing_tag, msg_type)
            .ok_or(CodecError::UnknownType {
                routing_tag,
                msg_type,
            })?;
        decode(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_codec_roundtrip() {
        let codec = BytesCodec;
        let message = Bytes::from_static(b"payload");

        let encoded = codec.encode(1, 2, &message).unwrap();
        assert_eq!(encoded, message);

        let decoded = codec.decode(1, 2, &encoded).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn registry_dispatches_to_registered_decoder() {
        let mut registry: MessageRegistry<String> =
            MessageRegistry::new(|m: &String| Ok(Bytes::copy_from_slice(m.as_bytes())));
        registry.register(1, 2, |payload| {
            String::from_utf8(payload.to_vec())
                .map_err(|e| CodecError::Decode(Box::new(e)))
        });

        assert!(registry.is_registered(1, 2));
        let decoded = registry.decode(1, 2, b"hello").unwrap();
        assert_eq!(decoded, "hello");
    }

    #[test]
    fn registry_rejects_unknown_pair() {
        let registry: MessageRegistry<String> =
            MessageRegistry::new(|m: &String| Ok(Bytes::copy_from_slice(m.as_bytes())));

        assert!(registry.lookup(9, 9).is_none());
        let err = registry.decode(9, 9, b"x").unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnknownType {
                routing_tag: 9,
                msg_type: 9
            }
        ));
    }

    #[test]
    fn registry_later_registration_replaces() {
        let mut registry: MessageRegistry<u32> = MessageRegistry::new(|m: &u32| {
            Ok(Bytes::copy_from_slice(&m.to_be_bytes()))
        });
        registry.register(1, 1, |_| Ok(1));
        registry.register(1, 1, |_| Ok(2));

        assert_eq!(registry.decode(1, 1, b"").unwrap(), 2);
    }

    #[test]
    fn registry_encode_uses_shared_encoder() {
        let registry: MessageRegistry<u32> = MessageRegistry::new(|m: &u32| {
            Ok(Bytes::copy_from_slice(&m.to_be_bytes()))
        });

        let encoded = registry.encode(1, 1, &0x0102_0304).unwrap();
        assert_eq!(encoded.as_ref(), &[1, 2, 3, 4]);
    }

    #[test]
    fn registry_decode_error_propagates() {
        let mut registry: MessageRegistry<String> =
            MessageRegistry::new(|m: &String| Ok(Bytes::copy_from_slice(m.as_bytes())));
        registry.register(1, 2, |payload| {
            String::from_utf8(payload.to_vec())
                .map_err(|e| CodecError::Decode(Box::new(e)))
        });

        let err = registry.decode(1, 2, &[0xFF, 0xFE]).unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }
}
