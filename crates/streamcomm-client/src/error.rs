/// Transport-level errors. Each of these is locally terminal for the
/// connection: it is surfaced once via a `Disconnected` event and never
/// retried by the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Host name resolution failed or produced no candidates.
    #[error("address resolution failed: {0}")]
    Resolution(#[source] std::io::Error),

    /// Every resolved address candidate refused the connection.
    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),

    /// A header or payload read failed mid-stream.
    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),

    /// A frame write failed; queued entries after it are discarded.
    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),

    /// Growing the receive buffer to hold a declared payload failed.
    /// The payload length is already committed on the wire, so the frame
    /// cannot be salvaged.
    #[error("receive buffer growth to {requested} bytes failed")]
    BufferExhausted { requested: usize },

    /// A send was issued while no connection was active.
    #[error("not connected")]
    NotConnected,
}

/// Per-message codec errors. These never terminate the connection; they are
/// reported on the event channel and the read/write loops continue.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// No decoder is registered for this `(routing_tag, msg_type)` pair.
    #[error("unknown message type (routing_tag {routing_tag}, msg_type {msg_type})")]
    UnknownType { routing_tag: u16, msg_type: u16 },

    /// The codec could not encode the outgoing message.
    #[error("message encode failed: {0}")]
    Encode(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The codec could not decode the received payload.
    #[error("message decode failed: {0}")]
    Decode(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, ClientError>;
