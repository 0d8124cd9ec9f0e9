//! Session - the concurrent activities and shared state bound to one
//! connection.
//!
//! A session owns its [`Connection`] exclusively and drives three activities
//! as tokio tasks, plus the dedicated writer task that owns the outbound
//! socket direction:
//!
//! ```text
//!            ┌─► Reader ────► recv_frame ──► CommandSink / pause flag
//! Session ───┼─► Data pump ─► ByteSource ──► FrameSender ─┐
//!            ├─► Heartbeat ─► sleep ───────► FrameSender ─┼─► writer task
//!            └─────────────────────────────────────────────┘
//! ```
//!
//! Any one activity failing tears the whole session down: the three share
//! one socket and one logical connection, so failure is never isolated
//! per-activity. The first failure records the end reason and fires the
//! broadcast stop token; every suspension point sits under `select!` on
//! that token, so teardown completes within a bounded time. Socket halves
//! are dropped exactly once, by the task that owns them.
//!
//! There is no way back from [`SessionState::Closed`]; the reconnect loop
//! constructs a fresh session for every attempt.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::connection::{Connection, ConnectionReader};
use crate::error::LinkError;
use crate::message::{Command, CMD_PAUSE, CMD_RESUME};
use crate::protocol::{Frame, FrameType};
use crate::sink::CommandSink;
use crate::source::ByteSource;
use crate::writer::{spawn_writer_task, FrameSender, DEFAULT_QUEUE_CAPACITY};

/// Default heartbeat interval.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// How long the writer task gets to drain its queue after the activities
/// have stopped, before it is aborted outright.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Interval between outbound `HEARTBEAT` frames.
    pub heartbeat_interval: Duration,
    /// Outbound frame queue depth (writer task channel capacity).
    pub queue_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Observable session lifecycle.
///
/// `Paused` is a sub-state of streaming entered and exited purely by
/// `pause`/`resume` command receipt; it gates only outbound data chunks.
/// Inbound commands, heartbeats, and the reader keep running while paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connection established, CONFIG not yet on the wire.
    Connecting,
    /// Data plane open.
    Streaming,
    /// Data plane gated by the peer; control plane unaffected.
    Paused,
    /// Stop signal fanned out, waiting for activities to finish.
    Closing,
    /// All activities joined, socket closed. Terminal.
    Closed,
}

/// Why a session ended.
///
/// This is all the reconnect loop ever sees: no typed error crosses the
/// session boundary, and every outcome gets the same retry-after-delay
/// treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// External stop signal.
    Stopped,
    /// The byte source reported end of stream.
    SourceDrained,
    /// The peer closed the connection.
    TransportClosed,
    /// OS-level I/O failure on read or write.
    TransportError,
    /// Corrupted framing on the inbound stream.
    ProtocolError,
}

impl SessionEnd {
    fn from_error(err: &LinkError) -> Self {
        match err {
            LinkError::TransportClosed => SessionEnd::TransportClosed,
            LinkError::Protocol(_) => SessionEnd::ProtocolError,
            _ => SessionEnd::TransportError,
        }
    }
}

impl std::fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            SessionEnd::Stopped => "stopped",
            SessionEnd::SourceDrained => "source drained",
            SessionEnd::TransportClosed => "connection closed by peer",
            SessionEnd::TransportError => "transport error",
            SessionEnd::ProtocolError => "protocol error",
        };
        f.write_str(reason)
    }
}

/// State shared by the session's activities.
#[derive(Clone)]
struct Shared {
    /// Broadcast stop signal. Idempotent; observed by every suspension point.
    stop: CancellationToken,
    /// Data-plane gate, written by the reader, read by the data pump. A
    /// transiently stale read (one chunk either way across a transition) is
    /// acceptable.
    paused: Arc<AtomicBool>,
    /// First recorded end reason wins.
    end: Arc<OnceLock<SessionEnd>>,
}

impl Shared {
    fn fail(&self, end: SessionEnd) {
        let _ = self.end.set(end);
        self.stop.cancel();
    }

    fn end_reason(&self) -> SessionEnd {
        self.end.get().copied().unwrap_or(SessionEnd::Stopped)
    }
}

/// One logical connection's lifetime: connection, stop signal, pause flag,
/// and the three concurrent activities.
pub struct Session<S, B, K> {
    conn: Connection<S>,
    source: B,
    sink: K,
    config: SessionConfig,
    stop: CancellationToken,
    state_tx: watch::Sender<SessionState>,
}

impl<S, B, K> Session<S, B, K>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    B: ByteSource,
    K: CommandSink,
{
    /// Create a session over an established connection.
    ///
    /// `stop` is the external stop signal; cancelling it (or any clone of
    /// it) closes the session. The initiator sends its `CONFIG` frame on the
    /// connection before constructing the session.
    pub fn new(
        conn: Connection<S>,
        source: B,
        sink: K,
        config: SessionConfig,
        stop: CancellationToken,
    ) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Connecting);
        Self {
            conn,
            source,
            sink,
            config,
            stop,
            state_tx,
        }
    }

    /// Watch lifecycle transitions.
    pub fn state(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Run the session to completion.
    ///
    /// Blocks until every activity has finished and the socket is closed,
    /// then reports why. Never returns an error: all failures are folded
    /// into the [`SessionEnd`] reason.
    pub async fn run(self) -> SessionEnd {
        let Session {
            conn,
            source,
            sink,
            config,
            stop,
            state_tx,
        } = self;

        // Child token: internal failures cancel the session without
        // cancelling the caller's token; external cancellation propagates.
        let shared = Shared {
            stop: stop.child_token(),
            paused: Arc::new(AtomicBool::new(false)),
            end: Arc::new(OnceLock::new()),
        };

        let (reader_half, writer_half) = conn.into_split();
        let (frames, mut writer_task) = spawn_writer_task(writer_half, config.queue_capacity);

        state_tx.send_replace(SessionState::Streaming);

        let reader = tokio::spawn(reader_task(
            reader_half,
            sink,
            shared.clone(),
            state_tx.clone(),
        ));
        let pump = tokio::spawn(pump_task(source, frames.clone(), shared.clone()));
        let heartbeat = tokio::spawn(heartbeat_task(
            frames,
            config.heartbeat_interval,
            shared.clone(),
        ));

        // Supervise the writer: a write failure must tear the session down
        // just like a failure in any activity.
        let mut writer_done = false;
        tokio::select! {
            res = &mut writer_task => {
                writer_done = true;
                match res {
                    Ok(Err(err)) => shared.fail(SessionEnd::from_error(&err)),
                    // Clean writer exit only happens once all senders are
                    // gone, i.e. the session is already ending.
                    _ => shared.stop.cancel(),
                }
            }
            _ = shared.stop.cancelled() => {}
        }

        state_tx.send_replace(SessionState::Closing);
        shared.stop.cancel();

        let _ = tokio::join!(reader, pump, heartbeat);

        if !writer_done {
            // All senders are dropped by now; give the writer a moment to
            // flush the queue, then cut it off.
            if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer_task)
                .await
                .is_err()
            {
                writer_task.abort();
                let _ = writer_task.await;
            }
        }

        state_tx.send_replace(SessionState::Closed);
        shared.end_reason()
    }
}

/// Reader activity: decode inbound frames until failure or stop.
async fn reader_task<S, K>(
    mut reader: ConnectionReader<S>,
    mut sink: K,
    shared: Shared,
    state: watch::Sender<SessionState>,
) where
    S: AsyncRead + AsyncWrite,
    K: CommandSink,
{
    loop {
        let frame = tokio::select! {
            _ = shared.stop.cancelled() => return,
            res = reader.recv_frame() => res,
        };

        match frame {
            Ok(frame) => dispatch_inbound(frame, &mut sink, &shared, &state),
            Err(err) => {
                if !shared.stop.is_cancelled() {
                    tracing::info!("connection lost (reader): {err}");
                }
                shared.fail(SessionEnd::from_error(&err));
                return;
            }
        }
    }
}

/// Route one inbound frame.
///
/// `pause`/`resume` toggle the session's own flag and are not forwarded;
/// heartbeats are discarded; everything else goes to the sink. A malformed
/// `COMMAND` body is an application-level problem: logged and swallowed, it
/// never tears the session down.
fn dispatch_inbound<K: CommandSink>(
    frame: Frame,
    sink: &mut K,
    shared: &Shared,
    state: &watch::Sender<SessionState>,
) {
    match frame.frame_type {
        FrameType::Heartbeat => {
            tracing::trace!("heartbeat from peer");
        }
        FrameType::Command => match serde_json::from_slice::<Command>(&frame.body) {
            Ok(cmd) if cmd.cmd == CMD_PAUSE => {
                tracing::info!("peer paused the stream");
                shared.paused.store(true, Ordering::Relaxed);
                state.send_replace(SessionState::Paused);
            }
            Ok(cmd) if cmd.cmd == CMD_RESUME => {
                tracing::info!("peer resumed the stream");
                shared.paused.store(false, Ordering::Relaxed);
                state.send_replace(SessionState::Streaming);
            }
            Ok(cmd) => sink.on_command(cmd),
            Err(err) => {
                tracing::warn!("discarding malformed COMMAND body: {err}");
            }
        },
        other => sink.on_message(other, frame.body),
    }
}

/// Data pump activity: pull chunks and send them as `DATA` frames.
///
/// While paused, chunks are dropped rather than buffered: for a live stream,
/// bounded staleness beats unbounded memory growth or backpressure on the
/// capture pipeline.
async fn pump_task<B: ByteSource>(mut source: B, frames: FrameSender, shared: Shared) {
    loop {
        let chunk = tokio::select! {
            _ = shared.stop.cancelled() => return,
            chunk = source.next_chunk() => chunk,
        };

        let Some(chunk) = chunk else {
            shared.fail(SessionEnd::SourceDrained);
            return;
        };

        if shared.paused.load(Ordering::Relaxed) {
            tracing::trace!("paused, dropping {} byte chunk", chunk.len());
            continue;
        }

        let sent = tokio::select! {
            _ = shared.stop.cancelled() => return,
            res = frames.send(Frame::data(chunk)) => res,
        };
        if sent.is_err() {
            // The queue only closes when the writer task has died; its
            // supervisor records the writer's own end reason.
            return;
        }
    }
}

/// Heartbeat activity: periodic liveness probes on the control plane.
async fn heartbeat_task(frames: FrameSender, interval: Duration, shared: Shared) {
    loop {
        tokio::select! {
            _ = shared.stop.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }

        let sent = tokio::select! {
            _ = shared.stop.cancelled() => return,
            res = frames.send(Frame::heartbeat()) => res,
        };
        if sent.is_err() {
            // Same as the pump: the writer supervisor owns this reason.
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_reason_mapping() {
        assert_eq!(
            SessionEnd::from_error(&LinkError::TransportClosed),
            SessionEnd::TransportClosed
        );
        assert_eq!(
            SessionEnd::from_error(&LinkError::Protocol("bad".into())),
            SessionEnd::ProtocolError
        );
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        assert_eq!(
            SessionEnd::from_error(&LinkError::Transport(io)),
            SessionEnd::TransportError
        );
    }

    #[test]
    fn test_first_failure_wins() {
        let shared = Shared {
            stop: CancellationToken::new(),
            paused: Arc::new(AtomicBool::new(false)),
            end: Arc::new(OnceLock::new()),
        };

        shared.fail(SessionEnd::TransportClosed);
        shared.fail(SessionEnd::ProtocolError);

        assert_eq!(shared.end_reason(), SessionEnd::TransportClosed);
        assert!(shared.stop.is_cancelled());
    }

    #[test]
    fn test_end_reason_defaults_to_stopped() {
        let shared = Shared {
            stop: CancellationToken::new(),
            paused: Arc::new(AtomicBool::new(false)),
            end: Arc::new(OnceLock::new()),
        };
        assert_eq!(shared.end_reason(), SessionEnd::Stopped);
    }

    #[test]
    fn test_default_config_matches_link_constants() {
        let config = SessionConfig::default();
        assert_eq!(config.heartbeat_interval, Duration::from_secs(15));
    }
}
