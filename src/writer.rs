//! Dedicated writer task - single owner of the outbound socket direction.
//!
//! Two activities produce outbound frames (the data pump and the heartbeat),
//! but one socket can only be written by one owner. Instead of a mutex around
//! the write half, frames flow through an mpsc channel into a dedicated task:
//!
//! ```text
//! Data pump ──┐
//!             ├─► mpsc::Sender<Frame> ─► writer task ─► socket
//! Heartbeat ──┘
//! ```
//!
//! The bounded channel doubles as the outbound backpressure limit, and the
//! task batches whatever is already queued into a single vectored write.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::connection::ConnectionWriter;
use crate::error::{LinkError, Result};
use crate::protocol::Frame;

/// Default frame queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Maximum frames folded into a single vectored write.
const MAX_BATCH_SIZE: usize = 16;

/// Handle for queueing frames to the writer task.
///
/// Cheaply cloneable; one clone per sending activity.
#[derive(Clone)]
pub struct FrameSender {
    tx: mpsc::Sender<Frame>,
}

impl FrameSender {
    /// Queue a frame for transmission.
    ///
    /// Waits if the queue is full. Fails with
    /// [`LinkError::TransportClosed`] once the writer task has exited, which
    /// only happens when the connection is already dead or closing.
    pub async fn send(&self, frame: Frame) -> Result<()> {
        self.tx
            .send(frame)
            .await
            .map_err(|_| LinkError::TransportClosed)
    }
}

/// Spawn the writer task owning `writer`.
///
/// The task runs until every [`FrameSender`] clone is dropped (clean
/// shutdown, queue drained) or a write fails (the error is returned through
/// the join handle).
pub fn spawn_writer_task<S>(
    writer: ConnectionWriter<S>,
    queue_capacity: usize,
) -> (FrameSender, JoinHandle<Result<()>>)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (tx, rx) = mpsc::channel(queue_capacity);
    let task = tokio::spawn(writer_loop(rx, writer));
    (FrameSender { tx }, task)
}

/// Receive frames, batch, encode, write.
async fn writer_loop<S>(
    mut rx: mpsc::Receiver<Frame>,
    mut writer: ConnectionWriter<S>,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite,
{
    let mut encoded = Vec::with_capacity(MAX_BATCH_SIZE);

    loop {
        let first = match rx.recv().await {
            Some(frame) => frame,
            // All senders dropped: clean shutdown.
            None => return Ok(()),
        };

        encoded.clear();
        encoded.push(first.encode());
        while encoded.len() < MAX_BATCH_SIZE {
            match rx.try_recv() {
                Ok(frame) => encoded.push(frame.encode()),
                Err(_) => break,
            }
        }

        writer.send_batch(&encoded).await?;
    }
}
