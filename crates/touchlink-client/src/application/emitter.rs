//! CommandEmitter: the single choke point between gesture interpretation and
//! the transport.
//!
//! Every command a gesture machine decides on goes through here. The emitter
//! stamps sequence numbers, owns the deferred-delivery queue that implements
//! the "button down, short hold, button up" shape of a tap, and guarantees on
//! flush that no half of a press/release pair is left dangling.
//!
//! Delivery failures are a transport concern: they are logged and counted,
//! never allowed to wedge a state machine mid-gesture.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::error;

use touchlink_core::domain::geometry::RemotePoint;
use touchlink_core::protocol::commands::{
    ClientCommand, InputMode, KeyCommand, ModeChangedCommand, PointerButton,
    PointerButtonCommand, PointerMoveAbsoluteCommand, PointerMoveRelativeCommand, PressAction,
    ScrollCommand, StickId, StickVectorCommand,
};

/// Error type a [`CommandSink`] may report on delivery.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The transport channel is gone (disconnect, shutdown).
    #[error("command channel closed")]
    Closed,
    /// Any other transport-side failure.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Trait for handing finished commands to the transport collaborator.
///
/// Infrastructure implementations frame and forward; test implementations
/// record calls.
pub trait CommandSink: Send + Sync {
    /// Delivers one sequenced command.
    fn deliver(&self, command: ClientCommand, sequence: u64) -> Result<(), SinkError>;
}

/// A command scheduled for later delivery (the release half of a tap).
#[derive(Debug)]
struct DeferredCommand {
    due: Instant,
    command: ClientCommand,
}

/// The command emitter.
///
/// Owns the outbound sequence counter and the deferred queue. All gesture
/// machines share one emitter per session.
pub struct CommandEmitter {
    sink: Arc<dyn CommandSink>,
    sequence: u64,
    deferred: VecDeque<DeferredCommand>,
    dropped: u64,
}

impl CommandEmitter {
    /// Creates an emitter wrapping the given sink.
    pub fn new(sink: Arc<dyn CommandSink>) -> Self {
        Self {
            sink,
            sequence: 0,
            deferred: VecDeque::new(),
            dropped: 0,
        }
    }

    // ── Immediate commands ────────────────────────────────────────────────────

    /// Emits a relative pointer move.
    pub fn pointer_move_relative(&mut self, dx: f64, dy: f64, raw: bool) {
        self.send_now(ClientCommand::PointerMoveRelative(PointerMoveRelativeCommand {
            dx: dx as f32,
            dy: dy as f32,
            raw,
        }));
    }

    /// Emits an absolute pointer move (interaction-start calibration).
    pub fn pointer_move_absolute(&mut self, point: RemotePoint) {
        self.send_now(ClientCommand::PointerMoveAbsolute(PointerMoveAbsoluteCommand {
            x: point.x,
            y: point.y,
        }));
    }

    /// Emits one half of a button press.
    pub fn button(&mut self, button: PointerButton, action: PressAction) {
        self.send_now(ClientCommand::PointerButton(PointerButtonCommand { button, action }));
    }

    /// Emits a tap: button down now, button up after `hold`.
    ///
    /// The deferred up is guaranteed to go out – either when due via
    /// [`flush_due`](Self::flush_due) or immediately on
    /// [`flush_all`](Self::flush_all) (mode switch).
    pub fn tap(&mut self, button: PointerButton, now: Instant, hold: Duration) {
        self.button(button, PressAction::Down);
        self.deferred.push_back(DeferredCommand {
            due: now + hold,
            command: ClientCommand::PointerButton(PointerButtonCommand {
                button,
                action: PressAction::Up,
            }),
        });
    }

    /// Emits a two-axis scroll.
    pub fn scroll(&mut self, dx: i32, dy: i32) {
        self.send_now(ClientCommand::Scroll(ScrollCommand { dx, dy }));
    }

    /// Emits one half of a key press.
    pub fn key(&mut self, key: &str, action: PressAction) {
        self.send_now(ClientCommand::Key(KeyCommand {
            key: key.to_string(),
            action,
        }));
    }

    /// Schedules a key-up for later delivery, ordered after anything already
    /// queued for the same deadline.
    pub fn key_up_after(&mut self, key: &str, now: Instant, delay: Duration) {
        self.deferred.push_back(DeferredCommand {
            due: now + delay,
            command: ClientCommand::Key(KeyCommand {
                key: key.to_string(),
                action: PressAction::Up,
            }),
        });
    }

    /// Emits a normalized stick vector.
    pub fn stick_vector(&mut self, stick: StickId, x: f64, y: f64) {
        self.send_now(ClientCommand::StickVector(StickVectorCommand {
            stick,
            x: x as f32,
            y: y as f32,
        }));
    }

    /// Notifies the remote side of a mode switch.
    pub fn mode_changed(&mut self, mode: InputMode) {
        self.send_now(ClientCommand::ModeChanged(ModeChangedCommand { mode }));
    }

    // ── Deferred queue ────────────────────────────────────────────────────────

    /// Delivers every deferred command whose deadline has passed, preserving
    /// scheduling order.
    pub fn flush_due(&mut self, now: Instant) {
        let mut remaining = VecDeque::with_capacity(self.deferred.len());
        while let Some(entry) = self.deferred.pop_front() {
            if entry.due <= now {
                self.send_now(entry.command);
            } else {
                remaining.push_back(entry);
            }
        }
        self.deferred = remaining;
    }

    /// Delivers every deferred command immediately, regardless of deadline.
    ///
    /// Called on mode switch so that no button-down is ever left without its
    /// matching up.
    pub fn flush_all(&mut self) {
        while let Some(entry) = self.deferred.pop_front() {
            self.send_now(entry.command);
        }
    }

    /// Whether any deferred command is still queued.
    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Number of commands the sink refused since construction.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn send_now(&mut self, command: ClientCommand) {
        let sequence = self.next_sequence();
        if let Err(e) = self.sink.deliver(command, sequence) {
            self.dropped += 1;
            error!(sequence, dropped = self.dropped, "command delivery failed: {e}");
        }
    }

    fn next_sequence(&mut self) -> u64 {
        let seq = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);
        seq
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
