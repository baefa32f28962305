//! Application layer: the gesture interpretation engine.
//!
//! - **`touchpad`** – trackpad semantics: move, deferred single click,
//!   double-tap drag, two-finger right click and scroll.
//! - **`gamepad`** – full-surface swipe/pinch with the pointer-active
//!   modifier redirecting pans between camera look and cursor movement.
//! - **`emitter`** – the single choke point turning gesture decisions into
//!   sequenced outbound commands, with the deferred tap machinery.
//! - **`session`** – the per-session context object and mode controller
//!   that owns all of the above.

pub mod emitter;
pub mod gamepad;
pub mod session;
pub mod touchpad;
