//! Reconnect loop - the top-level driver that repeatedly establishes and
//! runs sessions.
//!
//! The remote device is a wearable that may be legitimately absent for long
//! stretches, so the loop retries forever with a fixed delay: no exponential
//! backoff, no attempt limit. Connection-establishment failures get the same
//! treatment as in-session failures — log a status line, wait, try again.
//!
//! Each attempt gets a wholesale fresh [`Session`] with a fresh byte source;
//! nothing carries over from one session to the next.

use std::future::Future;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

use crate::connection::Connection;
use crate::error::Result;
use crate::message::StreamConfig;
use crate::protocol::Frame;
use crate::session::{Session, SessionConfig};
use crate::sink::CommandSink;
use crate::source::ByteSource;

/// Default delay between reconnect attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Opens the stream to the remote device.
///
/// Abstracts the transport (RFCOMM socket, TCP socket, in-memory pair in
/// tests). Target resolution and validation live inside the connector; the
/// loop only sees connected-or-failed.
pub trait Connector: Send + 'static {
    /// The connected stream type.
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Open a new connection to the target.
    fn connect(&mut self) -> impl Future<Output = Result<Self::Stream>> + Send;

    /// Human-readable target description for status lines.
    fn target(&self) -> String;
}

/// TCP transport for the socket-attached tools.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    addr: String,
}

impl TcpConnector {
    /// Connector for a `host:port` target.
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&mut self) -> Result<TcpStream> {
        Ok(TcpStream::connect(&self.addr).await?)
    }

    fn target(&self) -> String {
        self.addr.clone()
    }
}

/// Long-lived control loop: connect, run a session, wait, repeat.
pub struct ReconnectLoop<C, F, K> {
    connector: C,
    make_source: F,
    sink: K,
    session_config: SessionConfig,
    stream_config: Option<StreamConfig>,
    retry_delay: Duration,
}

impl<C, F, B, K> ReconnectLoop<C, F, K>
where
    C: Connector,
    F: FnMut() -> B + Send,
    B: ByteSource,
    K: CommandSink + Clone,
{
    /// Create a loop over `connector`.
    ///
    /// `make_source` is called once per established connection; every
    /// session streams from its own fresh byte source.
    pub fn new(connector: C, make_source: F, sink: K) -> Self {
        Self {
            connector,
            make_source,
            sink,
            session_config: SessionConfig::default(),
            stream_config: None,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Act as the initiator: send this `CONFIG` right after every connect.
    pub fn stream_config(mut self, config: StreamConfig) -> Self {
        self.stream_config = Some(config);
        self
    }

    /// Override the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Override the fixed retry delay.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Run until `stop` is cancelled.
    ///
    /// Never returns early on failure: transport errors, protocol errors,
    /// and refused connections all turn into a status line and another
    /// attempt after the fixed delay.
    pub async fn run(mut self, stop: CancellationToken) {
        loop {
            if stop.is_cancelled() {
                return;
            }

            tracing::info!("connecting to {}...", self.connector.target());
            let connected = tokio::select! {
                _ = stop.cancelled() => return,
                res = self.connector.connect() => res,
            };

            match connected {
                Ok(stream) => {
                    let conn = Connection::new(stream);
                    if let Some(conn) = self.send_config(conn).await {
                        tracing::info!("connected");
                        let session = Session::new(
                            conn,
                            (self.make_source)(),
                            self.sink.clone(),
                            self.session_config.clone(),
                            stop.child_token(),
                        );
                        let end = session.run().await;
                        tracing::info!("session ended: {end}");
                    }
                }
                Err(err) => {
                    tracing::warn!("connection failed: {err}");
                }
            }

            if stop.is_cancelled() {
                return;
            }
            tracing::info!("reconnecting in {:?}...", self.retry_delay);
            tokio::select! {
                _ = stop.cancelled() => return,
                _ = tokio::time::sleep(self.retry_delay) => {}
            }
        }
    }

    /// Send the initial `CONFIG` frame when acting as the initiator.
    ///
    /// Returns `None` when the send fails; the connection is then abandoned
    /// and the loop falls through to the retry delay.
    async fn send_config(&self, mut conn: Connection<C::Stream>) -> Option<Connection<C::Stream>> {
        let Some(config) = &self.stream_config else {
            return Some(conn);
        };

        let frame = match Frame::config(config) {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!("failed to encode CONFIG: {err}");
                return None;
            }
        };
        if let Err(err) = conn.send_frame(&frame).await {
            tracing::warn!("failed to send CONFIG: {err}");
            return None;
        }
        Some(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tcp_connector_refused() {
        // Port 1 is essentially never listening.
        let mut connector = TcpConnector::new("127.0.0.1:1");
        assert_eq!(connector.target(), "127.0.0.1:1");
        assert!(connector.connect().await.is_err());
    }

    #[tokio::test]
    async fn test_tcp_connector_connects() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut connector = TcpConnector::new(addr.to_string());
        let (stream, accepted) = tokio::join!(connector.connect(), listener.accept());
        assert!(stream.is_ok());
        assert!(accepted.is_ok());
    }
}
