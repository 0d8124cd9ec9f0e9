//! Byte source - external producer of outbound data-plane chunks.
//!
//! Each tool plugs its own producer into the session: audio capture, screen
//! text, pre-formed JSON events. The session only sees an async stream of
//! opaque chunks.

use std::future::Future;

use bytes::Bytes;
use tokio::sync::mpsc;

/// Chunk size used by the audio capture pipeline (~93 ms at 22.05 kHz mono
/// 16-bit). Small chunks keep the stream responsive to pause/resume.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// External producer of outbound data-plane chunks.
///
/// `next_chunk` blocks until a chunk is available and returns `None` at end
/// of stream. The session wraps every call in a cancellable wait, so
/// implementations do not need their own shutdown handling.
pub trait ByteSource: Send + 'static {
    /// Pull the next chunk, or `None` when the source is exhausted.
    fn next_chunk(&mut self) -> impl Future<Output = Option<Bytes>> + Send;
}

/// A [`ByteSource`] fed through an mpsc channel.
///
/// The common adapter: a capture task pushes chunks into the sender half and
/// the session pulls from the receiver half. Dropping the sender ends the
/// stream.
pub struct ChannelSource {
    rx: mpsc::Receiver<Bytes>,
}

impl ChannelSource {
    /// Create a source and its feeding half with the given queue depth.
    pub fn new(capacity: usize) -> (mpsc::Sender<Bytes>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }

    /// Wrap an existing receiver.
    pub fn from_receiver(rx: mpsc::Receiver<Bytes>) -> Self {
        Self { rx }
    }
}

impl ByteSource for ChannelSource {
    async fn next_chunk(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_source_delivers_in_order() {
        let (tx, mut source) = ChannelSource::new(4);

        tx.send(Bytes::from_static(b"one")).await.unwrap();
        tx.send(Bytes::from_static(b"two")).await.unwrap();

        assert_eq!(source.next_chunk().await.unwrap(), "one");
        assert_eq!(source.next_chunk().await.unwrap(), "two");
    }

    #[tokio::test]
    async fn test_channel_source_ends_on_sender_drop() {
        let (tx, mut source) = ChannelSource::new(1);
        drop(tx);
        assert!(source.next_chunk().await.is_none());
    }
}
