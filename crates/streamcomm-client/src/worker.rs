//! The reactor worker: one background thread driving all connection I/O.
//!
//! Every state transition and every I/O completion (resolve, connect, read,
//! write) happens on this thread. Connect attempts run as their own local
//! task so the command loop stays responsive while the OS dials; caller
//! threads only touch the command channel and the connected flag.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::LocalSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use streamcomm_frame::{FrameHeader, HEADER_SIZE};

use crate::buffer::RecvBuffer;
use crate::client::ClientConfig;
use crate::codec::MessageCodec;
use crate::error::ClientError;
use crate::event::{DisconnectReason, Event};
use crate::queue::OutboundEntry;

/// Requests from caller threads to the reactor.
pub(crate) enum Command {
    Connect { host: String, port: u16 },
    Send(OutboundEntry),
    Disconnect,
    Shutdown,
}

/// Failure report from a per-connection reader or writer task.
struct Failure {
    generation: u64,
    error: ClientError,
}

/// Progress report from a spawned connect attempt.
enum ConnectEvent {
    /// Resolution produced at least one candidate; dialing has started.
    Resolved { attempt: u64 },
    /// The attempt finished, one way or the other.
    Done {
        attempt: u64,
        result: Result<TcpStream, ClientError>,
    },
}

/// An in-flight connect attempt, cancellable from the reactor.
struct Pending {
    attempt: u64,
    cancel: CancellationToken,
    /// Sends issued while the attempt is in flight. Written in submission
    /// order once the connection attaches, discarded if the attempt fails.
    queued: Vec<OutboundEntry>,
}

/// Connection lifecycle state, owned by the reactor thread.
///
/// `Disconnected` is both initial and re-enterable; any state collapses back
/// to it on error or explicit disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    Disconnected,
    Resolving,
    Connecting,
    Connected,
}

/// Live connection state held by the reactor.
struct Conn {
    generation: u64,
    outbound: UnboundedSender<OutboundEntry>,
    cancel: CancellationToken,
}

/// Thread entry point: build a current-thread runtime and drive the reactor
/// until shutdown.
pub(crate) fn run_reactor<C: MessageCodec>(
    codec: Arc<C>,
    commands: UnboundedReceiver<Command>,
    events: mpsc::Sender<Event<C::Message>>,
    connected: Arc<AtomicBool>,
    config: ClientConfig,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()
    {
        Ok(rt) => rt,
        Err(error) => {
            warn!(%error, "failed to build reactor runtime");
            return;
        }
    };

    let local = LocalSet::new();
    local.block_on(&runtime, async move {
        let (fail_tx, fail_rx) = unbounded_channel();
        let (connect_tx, connect_rx) = unbounded_channel();
        let reactor = Reactor {
            codec,
            events,
            connected,
            initial_recv_capacity: config.initial_recv_capacity,
            state: ConnectionState::Disconnected,
            pending: None,
            attempt: 0,
            conn: None,
            generation: 0,
            connect_tx,
            fail_tx,
        };
        reactor.run(commands, connect_rx, fail_rx).await;
    });
    debug!("reactor thread exiting");
}

struct Reactor<C: MessageCodec> {
    codec: Arc<C>,
    events: mpsc::Sender<Event<C::Message>>,
    connected: Arc<AtomicBool>,
    initial_recv_capacity: usize,
    state: ConnectionState,
    pending: Option<Pending>,
    attempt: u64,
    conn: Option<Conn>,
    generation: u64,
    connect_tx: UnboundedSender<ConnectEvent>,
    fail_tx: UnboundedSender<Failure>,
}

impl<C: MessageCodec> Reactor<C> {
    async fn run(
        mut self,
        mut commands: UnboundedReceiver<Command>,
        mut connects: UnboundedReceiver<ConnectEvent>,
        mut failures: UnboundedReceiver<Failure>,
    ) {
        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(Command::Connect { host, port }) => self.handle_connect(host, port),
                    Some(Command::Send(entry)) => self.handle_send(entry),
                    Some(Command::Disconnect) => self.handle_disconnect(),
                    Some(Command::Shutdown) | None => break,
                },
                Some(event) = connects.recv() => self.handle_connect_event(event),
                Some(failure) = failures.recv() => self.handle_failure(failure),
            }
        }
        // Client teardown: close the socket without a notification. The
        // event receiver belongs to the caller that initiated the drop.
        self.teardown();
    }

    fn handle_connect(&mut self, host: String, port: u16) {
        // A connect over a live connection or a still-pending attempt
        // replaces it silently.
        self.teardown();

        if host.is_empty() {
            self.disconnected(ClientError::Resolution(io::Error::new(
                io::ErrorKind::InvalidInput,
                "empty host",
            )));
            return;
        }

        // The attempt runs as its own task so Disconnect and Shutdown can
        // preempt a dial stuck in the OS connect timeout.
        self.attempt += 1;
        let attempt = self.attempt;
        let cancel = CancellationToken::new();
        tokio::task::spawn_local(connect_attempt(
            host,
            port,
            attempt,
            cancel.clone(),
            self.connect_tx.clone(),
        ));
        self.pending = Some(Pending {
            attempt,
            cancel,
            queued: Vec::new(),
        });
        self.transition(ConnectionState::Resolving);
    }

    fn handle_connect_event(&mut self, event: ConnectEvent) {
        let current = self.pending.as_ref().map(|pending| pending.attempt);
        match event {
            ConnectEvent::Resolved { attempt } if current == Some(attempt) => {
                self.transition(ConnectionState::Connecting);
            }
            ConnectEvent::Done { attempt, result } if current == Some(attempt) => {
                let queued = self
                    .pending
                    .take()
                    .map(|pending| pending.queued)
                    .unwrap_or_default();
                match result {
                    Ok(stream) => {
                        if let Ok(addr) = stream.peer_addr() {
                            debug!(%addr, "connected");
                        }
                        self.attach(stream, queued);
                        let _ = self.events.send(Event::Connected);
                    }
                    Err(error) => {
                        self.transition(ConnectionState::Disconnected);
                        self.disconnected(error);
                    }
                }
            }
            // Late reports from a replaced or abandoned attempt.
            _ => {}
        }
    }

    /// Arm the frame reader and the outbound writer for a fresh connection.
    fn attach(&mut self, stream: TcpStream, queued: Vec<OutboundEntry>) {
        self.generation += 1;
        let generation = self.generation;
        let (read_half, write_half) = stream.into_split();
        let cancel = CancellationToken::new();
        let (out_tx, out_rx) = unbounded_channel();

        tokio::task::spawn_local(read_loop(
            read_half,
            Arc::clone(&self.codec),
            self.events.clone(),
            self.fail_tx.clone(),
            cancel.clone(),
            generation,
            self.initial_recv_capacity,
        ));
        tokio::task::spawn_local(write_loop(
            write_half,
            out_rx,
            self.fail_tx.clone(),
            cancel.clone(),
            generation,
        ));

        // Sends queued behind the attempt go out first, in submission order.
        for entry in queued {
            let _ = out_tx.send(entry);
        }
        self.conn = Some(Conn {
            generation,
            outbound: out_tx,
            cancel,
        });
        self.connected.store(true, Ordering::Release);
        self.transition(ConnectionState::Connected);
    }

    fn handle_send(&mut self, entry: OutboundEntry) {
        if let Some(conn) = &self.conn {
            // Submission order on the channel is the write order.
            let _ = conn.outbound.send(entry);
        } else if let Some(pending) = &mut self.pending {
            pending.queued.push(entry);
        } else {
            self.disconnected(ClientError::NotConnected);
        }
    }

    fn handle_disconnect(&mut self) {
        self.teardown();
        // Always observable, even when already disconnected.
        let _ = self
            .events
            .send(Event::Disconnected(DisconnectReason::Requested));
    }

    fn handle_failure(&mut self, failure: Failure) {
        // Reader and writer can fail for the same underlying cause; only the
        // first report for the live generation is surfaced.
        let Some(conn) = &self.conn else { return };
        if conn.generation != failure.generation {
            return;
        }
        self.teardown();
        warn!(error = %failure.error, "connection failed");
        self.disconnected(failure.error);
    }

    /// Drop the socket, abandon any pending attempt, and clear the flag
    /// without emitting an event (the internal no-signal disconnect).
    fn teardown(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.cancel.cancel();
            debug!(attempt = pending.attempt, "connect attempt abandoned");
        }
        if let Some(conn) = self.conn.take() {
            conn.cancel.cancel();
            debug!(generation = conn.generation, "connection torn down");
        }
        self.connected.store(false, Ordering::Release);
        self.transition(ConnectionState::Disconnected);
    }

    fn transition(&mut self, next: ConnectionState) {
        if self.state != next {
            trace!(from = ?self.state, to = ?next, "state transition");
            self.state = next;
        }
    }

    fn disconnected(&self, error: ClientError) {
        let _ = self
            .events
            .send(Event::Disconnected(DisconnectReason::Error(error)));
    }
}

/// Resolve and dial off the reactor loop. Reports progress over the connect
/// channel; a cancelled attempt reports nothing.
async fn connect_attempt(
    host: String,
    port: u16,
    attempt: u64,
    cancel: CancellationToken,
    outcomes: UnboundedSender<ConnectEvent>,
) {
    tokio::select! {
        _ = cancel.cancelled() => {}
        result = establish(&host, port, attempt, &outcomes) => {
            let _ = outcomes.send(ConnectEvent::Done { attempt, result });
        }
    }
}

async fn establish(
    host: &str,
    port: u16,
    attempt: u64,
    outcomes: &UnboundedSender<ConnectEvent>,
) -> Result<TcpStream, ClientError> {
    debug!(%host, port, "resolving");
    let addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(ClientError::Resolution)?;
    let _ = outcomes.send(ConnectEvent::Resolved { attempt });

    // First-success over the candidates, in resolver order.
    let mut last_err = None;
    for addr in addrs {
        trace!(%addr, "trying candidate");
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(error) => last_err = Some(error),
        }
    }
    Err(ClientError::Connect(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "resolver returned no addresses")
    })))
}

/// Receive cycle: header, payload, dispatch, re-arm. Runs until cancelled or
/// the first read error; header and payload failures behave identically.
async fn read_loop<C: MessageCodec>(
    mut read_half: OwnedReadHalf,
    codec: Arc<C>,
    events: mpsc::Sender<Event<C::Message>>,
    failures: UnboundedSender<Failure>,
    cancel: CancellationToken,
    generation: u64,
    initial_capacity: usize,
) {
    let mut buf = RecvBuffer::with_capacity(initial_capacity);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            result = read_cycle(&mut read_half, &mut buf, &*codec, &events) => {
                if let Err(error) = result {
                    let _ = failures.send(Failure { generation, error });
                    return;
                }
            }
        }
    }
}

async fn read_cycle<C: MessageCodec>(
    read_half: &mut OwnedReadHalf,
    buf: &mut RecvBuffer,
    codec: &C,
    events: &mpsc::Sender<Event<C::Message>>,
) -> Result<(), ClientError> {
    let mut header_bytes = [0u8; HEADER_SIZE];
    read_half
        .read_exact(&mut header_bytes)
        .await
        .map_err(ClientError::Read)?;
    let header = FrameHeader::decode(&header_bytes);

    // The payload length is committed; grow or give up before reading.
    let payload = buf.ensure_capacity(header.payload_size as usize)?;
    read_half
        .read_exact(payload)
        .await
        .map_err(ClientError::Read)?;

    trace!(
        routing_tag = header.routing_tag,
        msg_type = header.msg_type,
        payload_size = header.payload_size,
        "frame received"
    );
    match codec.decode(header.routing_tag, header.msg_type, payload) {
        Ok(message) => {
            let _ = events.send(Event::Received {
                routing_tag: header.routing_tag,
                msg_type: header.msg_type,
                message,
            });
        }
        Err(error) => {
            // Per-message failure: report and keep the connection.
            warn!(%error, "failed to decode received frame");
            let _ = events.send(Event::CodecError(error));
        }
    }
    Ok(())
}

/// Drain the outbound queue one entry at a time. The single consumer makes
/// "at most one write in flight" structural: a frame is fully on the wire
/// before the next entry is popped.
async fn write_loop(
    mut write_half: OwnedWriteHalf,
    mut outbound: UnboundedReceiver<OutboundEntry>,
    failures: UnboundedSender<Failure>,
    cancel: CancellationToken,
    generation: u64,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            entry = outbound.recv() => {
                let Some(entry) = entry else { return };
                if let Err(error) = write_entry(&mut write_half, &entry).await {
                    // Stop draining; remaining entries are discarded.
                    let _ = failures.send(Failure {
                        generation,
                        error: ClientError::Write(error),
                    });
                    return;
                }
            }
        }
    }
}

async fn write_entry(write_half: &mut OwnedWriteHalf, entry: &OutboundEntry) -> io::Result<()> {
    write_half.write_all(&entry.header).await?;
    if !entry.payload.is_empty() {
        write_half.write_all(&entry.payload).await?;
    }
    write_half.flush().await
}
