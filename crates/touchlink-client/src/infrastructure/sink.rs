//! CommandSink implementations.
//!
//! The gesture engine only knows the [`CommandSink`] trait; these adapters
//! connect it to the outside world. `FramedChannelSink` encodes commands
//! into wire frames and hands them to the transport task over an unbounded
//! channel. `RecordingSink` buffers typed commands for tests and for the
//! headless demo binary.

use std::sync::Mutex;

use tokio::sync::mpsc::UnboundedSender;

use touchlink_core::protocol::codec::encode_command;
use touchlink_core::protocol::commands::ClientCommand;

use crate::application::emitter::{CommandSink, SinkError};

/// Encodes each command and forwards the frame to the transport task.
///
/// The channel is unbounded: gesture handlers must never block, and the
/// transport side is responsible for its own backpressure policy.
pub struct FramedChannelSink {
    tx: UnboundedSender<Vec<u8>>,
}

impl FramedChannelSink {
    pub fn new(tx: UnboundedSender<Vec<u8>>) -> Self {
        Self { tx }
    }
}

impl CommandSink for FramedChannelSink {
    fn deliver(&self, command: ClientCommand, sequence: u64) -> Result<(), SinkError> {
        let frame = encode_command(&command, sequence);
        self.tx.send(frame).map_err(|_| SinkError::Closed)
    }
}

/// Buffers delivered commands in memory.
///
/// Used by integration tests to assert on the exact outbound stream, and by
/// the demo binary in place of a real transport.
#[derive(Default)]
pub struct RecordingSink {
    delivered: Mutex<Vec<(ClientCommand, u64)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything delivered so far.
    pub fn delivered(&self) -> Vec<(ClientCommand, u64)> {
        self.delivered.lock().unwrap().clone()
    }

    /// Returns the commands only, without sequence numbers.
    pub fn commands(&self) -> Vec<ClientCommand> {
        self.delivered.lock().unwrap().iter().map(|(c, _)| c.clone()).collect()
    }

    /// Number of commands delivered so far.
    pub fn len(&self) -> usize {
        self.delivered.lock().unwrap().len()
    }

    /// Whether nothing has been delivered yet.
    pub fn is_empty(&self) -> bool {
        self.delivered.lock().unwrap().is_empty()
    }
}

impl CommandSink for RecordingSink {
    fn deliver(&self, command: ClientCommand, sequence: u64) -> Result<(), SinkError> {
        self.delivered.lock().unwrap().push((command, sequence));
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
