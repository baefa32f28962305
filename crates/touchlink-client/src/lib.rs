//! touchlink-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/` and
//! the binary entry point in `main.rs` share the same module tree.
//!
//! The client is the touch-surface side of Touchlink: it interprets raw
//! multi-contact pointer streams into remote-input commands. The pipeline:
//!
//! 1. The surface layer (external) delivers contact lifecycle events and
//!    server reports as [`application::session::SessionEvent`]s.
//! 2. The [`application::session::InputSession`] routes each event to the
//!    machine selected by the exclusive input mode.
//! 3. The gesture machines update their state, consult the shared
//!    [`touchlink_core::CursorPositionModel`], and hand decisions to the
//!    [`application::emitter::CommandEmitter`].
//! 4. The emitter stamps sequence numbers and delivers commands through a
//!    [`application::emitter::CommandSink`] to the transport collaborator.

/// Application layer: gesture machines, mode controller, command emitter.
pub mod application;

/// Infrastructure layer: config persistence and sink adapters.
pub mod infrastructure;
