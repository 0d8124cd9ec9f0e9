//! # glasslink
//!
//! Framed duplex streaming session engine for wearable display companion
//! links.
//!
//! The companion tools all talk to the device over one stream socket
//! (Bluetooth RFCOMM or TCP) using the same length-prefixed binary protocol,
//! multiplexing control and data messages:
//!
//! ```text
//! [4 bytes: uint32 BE length] [1 byte: type] [length-1 bytes: body]
//! ```
//!
//! This crate is the shared engine behind those tools:
//!
//! - **Frame codec** ([`protocol`]): encode/decode with strict length
//!   validation; a corrupt length tears the connection down.
//! - **Connection** ([`connection`]): exclusive socket owner with
//!   whole-frame send/receive primitives.
//! - **Session** ([`session`]): reader, data pump, and heartbeat running
//!   concurrently over one connection, with a broadcast stop signal and a
//!   pause flag that gates only the outbound data plane.
//! - **Reconnect loop** ([`reconnect`]): fixed-delay, unbounded retry driver
//!   for a link whose remote end may be absent for long stretches.
//!
//! The data producer ([`source::ByteSource`]), inbound message consumer
//! ([`sink::CommandSink`]), transport ([`reconnect::Connector`]), and
//! channel discovery ([`discovery::ChannelResolver`]) are pluggable per
//! tool.
//!
//! ## Example
//!
//! ```ignore
//! use glasslink::{ChannelSource, LogSink, ReconnectLoop, StreamConfig, TcpConnector};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (chunks, source) = ChannelSource::new(8);
//!     // ... feed capture output into `chunks` ...
//!     # drop(chunks);
//!     let mut sources = Some(source);
//!
//!     ReconnectLoop::new(
//!         TcpConnector::new("192.168.1.20:5000"),
//!         move || sources.take().expect("single attempt in this example"),
//!         LogSink::new(),
//!     )
//!     .stream_config(StreamConfig::default())
//!     .run(CancellationToken::new())
//!     .await;
//! }
//! ```

pub mod connection;
pub mod discovery;
pub mod error;
pub mod message;
pub mod protocol;
pub mod reconnect;
pub mod session;
pub mod sink;
pub mod source;

mod writer;

pub use connection::{Connection, ConnectionReader, ConnectionWriter};
pub use discovery::{ChannelResolver, FixedChannel};
pub use error::{LinkError, Result};
pub use message::{Command, StreamConfig, CMD_PAUSE, CMD_RESUME};
pub use protocol::{Frame, FrameType, MAX_BODY_LEN, MAX_FRAME_LEN};
pub use reconnect::{Connector, ReconnectLoop, TcpConnector, DEFAULT_RETRY_DELAY};
pub use session::{Session, SessionConfig, SessionEnd, SessionState};
pub use sink::{CommandSink, LogSink};
pub use source::{ByteSource, ChannelSource, DEFAULT_CHUNK_SIZE};
pub use writer::FrameSender;
