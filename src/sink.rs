//! Command sink - application-level consumer of inbound control messages.
//!
//! The session's reader activity decodes frames and hands everything that is
//! not flow control to a [`CommandSink`]. Sink methods run inline in the
//! reader loop and must not block significantly; errors inside a sink are the
//! application's problem and never tear down the session.

use bytes::Bytes;

use crate::message::Command;
use crate::protocol::FrameType;

/// Receiver for decoded inbound messages.
pub trait CommandSink: Send + 'static {
    /// An inbound `COMMAND` other than `pause`/`resume` (those are consumed
    /// by the session itself).
    fn on_command(&mut self, command: Command);

    /// Any other inbound frame, forwarded as a generic message.
    fn on_message(&mut self, frame_type: FrameType, body: Bytes);
}

/// A sink that renders inbound traffic as human-readable log lines.
///
/// Mirrors what the interactive messaging client prints: text messages as
/// `[sender] text`, notifications as `[app] title: text`, everything else by
/// command name.
#[derive(Debug, Clone, Default)]
pub struct LogSink;

impl LogSink {
    /// Create a new logging sink.
    pub fn new() -> Self {
        Self
    }
}

impl CommandSink for LogSink {
    fn on_command(&mut self, command: Command) {
        let sender = command.sender.as_deref().unwrap_or("?");
        match command.cmd.as_str() {
            "text" => {
                let text = command
                    .args
                    .get("text")
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                tracing::info!("[{sender}] {text}");
            }
            "notification" => {
                let app = command
                    .args
                    .get("app")
                    .and_then(|v| v.as_str())
                    .unwrap_or("?");
                let title = command
                    .args
                    .get("title")
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                let text = command
                    .args
                    .get("text")
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                tracing::info!("[{app}] {title}: {text}");
            }
            other => {
                tracing::info!(
                    "[{sender}] cmd: {other} {}",
                    serde_json::Value::Object(command.args.clone())
                );
            }
        }
    }

    fn on_message(&mut self, frame_type: FrameType, body: Bytes) {
        tracing::info!("[?] {frame_type} frame, {} bytes", body.len());
    }
}
