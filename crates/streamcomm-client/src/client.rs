//! The caller-facing client handle.
//!
//! [`Client`] owns one background reactor thread and exposes non-blocking
//! `connect`/`send`/`disconnect` plus a lock-free connected query. Outcomes
//! arrive on the [`Events`] channel returned next to the client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tracing::warn;

use crate::codec::MessageCodec;
use crate::error::CodecError;
use crate::event::{Event, Events};
use crate::queue::OutboundEntry;
use crate::worker::{run_reactor, Command};

/// Default receive buffer capacity in bytes.
pub const DEFAULT_RECV_CAPACITY: usize = 1024;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Initial capacity of the receive buffer. The buffer grows to the
    /// largest payload seen and never shrinks.
    pub initial_recv_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            initial_recv_capacity: DEFAULT_RECV_CAPACITY,
        }
    }
}

/// Single-connection asynchronous message client.
///
/// All operations take `&self` and never block the caller; the reactor
/// thread performs the actual I/O. Dropping the client stops the reactor and
/// joins its thread.
pub struct Client<C: MessageCodec> {
    codec: Arc<C>,
    commands: UnboundedSender<Command>,
    connected: Arc<AtomicBool>,
    events: mpsc::Sender<Event<C::Message>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
}

impl<C: MessageCodec> Client<C> {
    /// Create a client with default configuration. Returns the client and
    /// the receiving side of its event channel.
    pub fn new(codec: C) -> (Self, Events<C::Message>) {
        Self::with_config(codec, ClientConfig::default())
    }

    /// Create a client with explicit configuration.
    pub fn with_config(codec: C, config: ClientConfig) -> (Self, Events<C::Message>) {
        let codec = Arc::new(codec);
        let (event_tx, event_rx) = mpsc::channel();
        let (cmd_tx, cmd_rx) = unbounded_channel();
        let connected = Arc::new(AtomicBool::new(false));

        let worker = thread::spawn({
            let codec = Arc::clone(&codec);
            let events = event_tx.clone();
            let connected = Arc::clone(&connected);
            move || run_reactor(codec, cmd_rx, events, connected, config)
        });

        let client = Self {
            codec,
            commands: cmd_tx,
            connected,
            events: event_tx,
            worker: Mutex::new(Some(worker)),
        };
        (client, Events::new(event_rx))
    }

    /// Begin an asynchronous connect. Returns immediately; the outcome is
    /// reported as `Connected` or `Disconnected(..)` on the event channel.
    /// Connecting while already connected replaces the connection.
    pub fn connect(&self, host: &str, port: u16) {
        let _ = self.commands.send(Command::Connect {
            host: host.to_owned(),
            port,
        });
    }

    /// Encode and enqueue a message for transmission. Callable concurrently
    /// from any number of threads; write order is queue submission order.
    /// Encode failures surface as a `CodecError` event and nothing is queued.
    pub fn send(&self, routing_tag: u16, msg_type: u16, message: &C::Message) {
        let payload = match self.codec.encode(routing_tag, msg_type, message) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(%error, routing_tag, msg_type, "failed to encode outgoing message");
                let _ = self.events.send(Event::CodecError(error));
                return;
            }
        };
        let entry = match OutboundEntry::new(routing_tag, msg_type, payload) {
            Ok(entry) => entry,
            Err(error) => {
                let _ = self
                    .events
                    .send(Event::CodecError(CodecError::Encode(Box::new(error))));
                return;
            }
        };
        let _ = self.commands.send(Command::Send(entry));
    }

    /// Tear down the active connection. Always produces one
    /// `Disconnected(Requested)` event, even when already disconnected.
    pub fn disconnect(&self) {
        let _ = self.commands.send(Command::Disconnect);
    }

    /// Whether a connection is currently established. Lock-free; written
    /// only by the reactor thread.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

impl<C: MessageCodec> Drop for Client<C> {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Ok(mut worker) = self.worker.lock() {
            if let Some(handle) = worker.take() {
                let _ = handle.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::codec::BytesCodec;
    use crate::error::ClientError;
    use crate::event::DisconnectReason;

    #[test]
    fn starts_disconnected_and_joins_on_drop() {
        let (client, _events) = Client::new(BytesCodec);
        assert!(!client.is_connected());
        drop(client);
    }

    #[test]
    fn send_without_connection_reports_not_connected() {
        let (client, events) = Client::new(BytesCodec);
        client.send(1, 1, &bytes::Bytes::from_static(b"x"));

        match events.recv_timeout(Duration::from_secs(5)) {
            Some(Event::Disconnected(DisconnectReason::Error(ClientError::NotConnected))) => {}
            other => panic!("expected NotConnected disconnect, got {other:?}"),
        }
    }

    #[test]
    fn disconnect_is_idempotent() {
        let (client, events) = Client::new(BytesCodec);
        client.disconnect();
        client.disconnect();

        for _ in 0..2 {
            match events.recv_timeout(Duration::from_secs(5)) {
                Some(Event::Disconnected(reason)) => assert!(reason.is_requested()),
                other => panic!("expected requested disconnect, got {other:?}"),
            }
        }
        assert!(!client.is_connected());
    }

    #[test]
    fn empty_host_resolution_fails() {
        let (client, events) = Client::new(BytesCodec);
        client.connect("", 4444);

        match events.recv_timeout(Duration::from_secs(5)) {
            Some(Event::Disconnected(DisconnectReason::Error(ClientError::Resolution(_)))) => {}
            other => panic!("expected resolution failure, got {other:?}"),
        }
        assert!(!client.is_connected());
    }
}
