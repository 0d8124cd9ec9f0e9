//! Connection - exclusive owner of one stream socket.
//!
//! A [`Connection`] wraps a connected stream (RFCOMM socket, TCP socket,
//! in-memory duplex in tests) and exposes blocking-style frame primitives:
//! [`send_frame`](Connection::send_frame) writes a whole encoded frame, and
//! [`recv_frame`](Connection::recv_frame) reads a whole one, absorbing
//! partial reads and writes internally. Both fail with a fatal
//! [`LinkError`](crate::error::LinkError) on I/O or framing trouble; callers
//! must treat any error as "this connection is dead."
//!
//! A session splits the connection into a [`ConnectionReader`] and a
//! [`ConnectionWriter`] so the reader activity and the writer task can run
//! concurrently. The halves keep exclusive ownership of their direction; the
//! socket closes when both are dropped.

use std::io::IoSlice;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};

use crate::error::{LinkError, Result};
use crate::protocol::{read_frame, Frame};

/// A connected stream with frame-level send/receive primitives.
pub struct Connection<S> {
    stream: S,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a connected stream.
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Serialize and write one frame, flushing afterwards.
    ///
    /// Short writes are retried internally until the OS accepts every byte
    /// or the write fails.
    pub async fn send_frame(&mut self, frame: &Frame) -> Result<()> {
        self.stream
            .write_all(&frame.encode())
            .await
            .map_err(LinkError::from_io)?;
        self.stream.flush().await.map_err(LinkError::from_io)
    }

    /// Read one complete frame.
    pub async fn recv_frame(&mut self) -> Result<Frame> {
        read_frame(&mut self.stream).await
    }

    /// Split into independently owned read and write halves.
    pub fn into_split(self) -> (ConnectionReader<S>, ConnectionWriter<S>) {
        let (read, write) = tokio::io::split(self.stream);
        (ConnectionReader { read }, ConnectionWriter { write })
    }

    /// Get a mutable reference to the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Consume the connection, returning the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

/// Read half of a split [`Connection`].
pub struct ConnectionReader<S> {
    read: ReadHalf<S>,
}

impl<S> ConnectionReader<S>
where
    S: AsyncRead + AsyncWrite,
{
    /// Read one complete frame.
    pub async fn recv_frame(&mut self) -> Result<Frame> {
        read_frame(&mut self.read).await
    }
}

/// Write half of a split [`Connection`].
pub struct ConnectionWriter<S> {
    write: WriteHalf<S>,
}

impl<S> ConnectionWriter<S>
where
    S: AsyncRead + AsyncWrite,
{
    /// Serialize and write one frame, flushing afterwards.
    pub async fn send_frame(&mut self, frame: &Frame) -> Result<()> {
        self.send_batch(&[frame.encode()]).await
    }

    /// Write several pre-encoded frames with one vectored write, then flush.
    ///
    /// Falls back to a continuation loop on partial writes so every byte of
    /// every frame reaches the OS in order.
    pub(crate) async fn send_batch(&mut self, encoded: &[Bytes]) -> Result<()> {
        if encoded.is_empty() {
            return Ok(());
        }

        let total: usize = encoded.iter().map(Bytes::len).sum();
        let mut written = 0;

        while written < total {
            let slices = remaining_slices(encoded, written);
            let n = self
                .write
                .write_vectored(&slices)
                .await
                .map_err(LinkError::from_io)?;
            if n == 0 {
                return Err(LinkError::Transport(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "write_vectored returned 0",
                )));
            }
            written += n;
        }

        self.write.flush().await.map_err(LinkError::from_io)
    }
}

/// Build the IoSlice array covering everything after `skip_bytes`.
fn remaining_slices(encoded: &[Bytes], skip_bytes: usize) -> Vec<IoSlice<'_>> {
    let mut slices = Vec::with_capacity(encoded.len());
    let mut offset = 0;

    for frame in encoded {
        let end = offset + frame.len();
        if skip_bytes < end {
            let start = skip_bytes.saturating_sub(offset);
            slices.push(IoSlice::new(&frame[start..]));
        }
        offset = end;
    }

    slices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::FrameType;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_send_recv_over_duplex() {
        let (client, server) = tokio::io::duplex(4096);
        let mut client = Connection::new(client);
        let mut server = Connection::new(server);

        let frame = Frame::data(Bytes::from_static(b"chunk"));
        client.send_frame(&frame).await.unwrap();

        let received = server.recv_frame().await.unwrap();
        assert_eq!(received, frame);
    }

    #[tokio::test]
    async fn test_recv_after_peer_drop_is_transport_closed() {
        let (client, server) = tokio::io::duplex(4096);
        let mut server = Connection::new(server);

        drop(client);

        let err = server.recv_frame().await.unwrap_err();
        assert!(matches!(err, LinkError::TransportClosed));
    }

    #[tokio::test]
    async fn test_split_halves_work_independently() {
        let (near, far) = tokio::io::duplex(4096);
        let (mut reader, mut writer) = Connection::new(near).into_split();
        let mut far = Connection::new(far);

        writer.send_frame(&Frame::heartbeat()).await.unwrap();
        let got = far.recv_frame().await.unwrap();
        assert_eq!(got.frame_type, FrameType::Heartbeat);

        far.send_frame(&Frame::data(Bytes::from_static(b"x")))
            .await
            .unwrap();
        let got = reader.recv_frame().await.unwrap();
        assert_eq!(got.frame_type, FrameType::Data);
    }

    #[tokio::test]
    async fn test_send_batch_preserves_order_and_bytes() {
        let (near, far) = tokio::io::duplex(64 * 1024);
        let (_reader, mut writer) = Connection::new(near).into_split();

        let frames: Vec<Frame> = (0..5u8)
            .map(|i| Frame::data(Bytes::from(vec![i; 100])))
            .collect();
        let encoded: Vec<Bytes> = frames.iter().map(Frame::encode).collect();
        writer.send_batch(&encoded).await.unwrap();
        drop(writer);

        let mut far = Connection::new(far);
        for frame in &frames {
            assert_eq!(&far.recv_frame().await.unwrap(), frame);
        }
    }

    #[tokio::test]
    async fn test_send_batch_through_tiny_pipe() {
        // A 7-byte duplex buffer forces repeated partial writes; the
        // continuation loop must still deliver every byte in order.
        let (near, far) = tokio::io::duplex(7);
        let (_reader, mut writer) = Connection::new(near).into_split();

        let frames: Vec<Frame> = (0..3u8)
            .map(|i| Frame::data(Bytes::from(vec![0x40 + i; 50])))
            .collect();
        let encoded: Vec<Bytes> = frames.iter().map(Frame::encode).collect();
        let expected: Vec<u8> = encoded.iter().flat_map(|b| b.to_vec()).collect();

        let reader_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let (mut far_read, _far_write) = tokio::io::split(far);
            far_read.read_to_end(&mut buf).await.unwrap();
            buf
        });

        writer.send_batch(&encoded).await.unwrap();
        drop(writer);
        drop(_reader);

        let got = reader_task.await.unwrap();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_remaining_slices_skips_whole_and_partial_frames() {
        let encoded = vec![Bytes::from_static(b"aaaa"), Bytes::from_static(b"bbbb")];

        let slices = remaining_slices(&encoded, 0);
        assert_eq!(slices.len(), 2);

        // Skip half of the first frame
        let slices = remaining_slices(&encoded, 2);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].len(), 2);

        // Skip the first frame entirely
        let slices = remaining_slices(&encoded, 4);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].len(), 4);

        // Skip everything
        let slices = remaining_slices(&encoded, 8);
        assert!(slices.is_empty());
    }
}
