//! Connection events delivered to the caller.
//!
//! The client reports everything that happens asynchronously through one
//! channel: connection establishment, disconnects with their reason, received
//! messages, and per-message codec failures. The caller polls the [`Events`]
//! handle from whatever thread it likes.

use std::sync::mpsc;
use std::time::Duration;

use crate::error::{ClientError, CodecError};

/// Why the connection ended.
#[derive(Debug)]
pub enum DisconnectReason {
    /// The caller asked for the disconnect. Repeated `disconnect()` calls
    /// each produce one of these.
    Requested,
    /// A transport failure forced the disconnect.
    Error(ClientError),
}

impl DisconnectReason {
    /// True when the disconnect was caller-requested rather than an error.
    pub fn is_requested(&self) -> bool {
        matches!(self, DisconnectReason::Requested)
    }
}

/// An observable client event.
#[derive(Debug)]
pub enum Event<M> {
    /// The connection is established; the frame reader is armed.
    Connected,
    /// The connection ended, with the reason. Emitted exactly once per
    /// transport failure, and once per explicit `disconnect()` call.
    Disconnected(DisconnectReason),
    /// A complete frame arrived and decoded successfully.
    Received {
        routing_tag: u16,
        msg_type: u16,
        message: M,
    },
    /// A message failed to encode or decode. The connection stays up.
    CodecError(CodecError),
}

/// Receiving side of the event channel.
///
/// Returned alongside the client; owns the only receiver. All methods return
/// `None` once the client (and its worker) are gone and the channel drained.
pub struct Events<M> {
    rx: mpsc::Receiver<Event<M>>,
}

impl<M> Events<M> {
    pub(crate) fn new(rx: mpsc::Receiver<Event<M>>) -> Self {
        Self { rx }
    }

    /// Block until the next event.
    pub fn recv(&self) -> Option<Event<M>> {
        self.rx.recv().ok()
    }

    /// Block until the next event or the timeout elapses.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Event<M>> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Return the next event if one is already queued.
    pub fn try_recv(&self) -> Option<Event<M>> {
        self.rx.try_recv().ok()
    }

    /// Iterate over events, blocking between them, until the client is gone.
    pub fn iter(&self) -> impl Iterator<Item = Event<M>> + '_ {
        self.rx.iter()
    }
}
