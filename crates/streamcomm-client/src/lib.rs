//! Asynchronous single-connection TCP client for tagged length-prefixed
//! messages.
//!
//! The client opens one TCP connection, frames discrete binary messages with
//! the fixed 8-byte header from `streamcomm-frame`, and moves messages both
//! ways without blocking the caller:
//! - `connect`/`send`/`disconnect` return immediately; one background
//!   reactor thread performs all I/O and state transitions.
//! - Outcomes arrive on an event channel: `Connected`,
//!   `Disconnected(reason)`, `Received`, and non-fatal `CodecError`s.
//! - Payload bytes are interpreted only by a pluggable [`MessageCodec`];
//!   the transport core never looks inside them.
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use streamcomm_client::{BytesCodec, Client, Event};
//!
//! let (client, events) = Client::new(BytesCodec);
//! client.connect("127.0.0.1", 4444);
//!
//! for event in events.iter() {
//!     match event {
//!         Event::Connected => client.send(1, 2, &Bytes::from_static(b"hello")),
//!         Event::Received { routing_tag, msg_type, message } => {
//!             println!("{routing_tag}/{msg_type}: {message:?}");
//!         }
//!         Event::Disconnected(reason) => {
//!             eprintln!("disconnected: {reason:?}");
//!             break;
//!         }
//!         Event::CodecError(error) => eprintln!("codec: {error}"),
//!     }
//! }
//! ```

pub mod client;
pub mod codec;
pub mod error;
pub mod event;

mod buffer;
mod queue;
mod worker;

pub use client::{Client, ClientConfig, DEFAULT_RECV_CAPACITY};
pub use codec::{BytesCodec, MessageCodec, MessageRegistry};
pub use error::{ClientError, CodecError, Result};
pub use event::{DisconnectReason, Event, Events};
