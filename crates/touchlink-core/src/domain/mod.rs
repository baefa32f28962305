//! Domain entities for Touchlink.
//!
//! Pure gesture/position logic with no infrastructure dependencies: no OS
//! APIs, no network sockets, no UI framework. Everything here compiles and
//! tests on any platform. The application layer in `touchlink-client` builds
//! the stateful gesture machines on top of these types.

/// Contact identity and lifecycle events.
pub mod contact;

/// Client-side pointer position prediction and reconciliation.
pub mod cursor;

/// Surface-to-remote coordinate mapping.
pub mod geometry;

/// Virtual analog stick with circular clamp and deadzone.
pub mod stick;
