//! # touchlink-core
//!
//! Shared library for Touchlink containing the outbound command records with
//! their binary codec, and the pure domain entities of the gesture engine.
//!
//! Touchlink is the input side of a remote-desktop control client: a touch
//! surface (tablet or phone) drives a remote machine's pointer, keyboard, and
//! analog-stick inputs. The client keeps a locally predicted cursor position
//! so gestures feel immediate, and reconciles it against the authoritative
//! server position under network delay.
//!
//! This crate is the shared foundation. It defines:
//!
//! - **`protocol`** – the command vocabulary the gesture engine emits
//!   (pointer moves, buttons, scroll, keys, stick vectors, mode changes),
//!   the two inbound server reports the session consumes, and a compact
//!   binary codec (16-byte header + payload).
//!
//! - **`domain`** – pure gesture/position logic with no OS dependencies:
//!   the surface-to-remote coordinate transform, the reconciled cursor
//!   position model, contact lifecycle types, and the virtual analog stick.
//!
//! It has zero dependencies on OS APIs, UI frameworks, or network sockets.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `touchlink_core::CursorPositionModel` instead of the full path.
pub use domain::contact::{ContactEvent, ContactId, TrackedContact};
pub use domain::cursor::{CursorPositionModel, ReconcileOutcome};
pub use domain::geometry::{
    map_to_remote, RemotePoint, RemoteScreenGeometry, SurfacePoint, SurfaceRect,
};
pub use domain::stick::{PointerEcho, StickOutput, VirtualStick};
pub use protocol::codec::{decode_command, encode_command, CodecError};
pub use protocol::commands::ClientCommand;
