//! Surface-to-remote coordinate mapping.
//!
//! The touch surface displays the remote screen scaled into some on-screen
//! rectangle. To interpret a tap the client needs exactly one transform: from
//! a contact position in display-surface space to remote-screen pixels, using
//! independent linear scale factors per axis. Pure functions, no state.

use serde::{Deserialize, Serialize};

/// A position in display-surface coordinates (CSS-pixel-like, fractional).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfacePoint {
    pub x: f64,
    pub y: f64,
}

impl SurfacePoint {
    /// Midpoint between two surface points (the tracking point of a
    /// two-contact gesture).
    pub fn midpoint(a: SurfacePoint, b: SurfacePoint) -> SurfacePoint {
        SurfacePoint {
            x: (a.x + b.x) / 2.0,
            y: (a.y + b.y) / 2.0,
        }
    }

    /// Euclidean distance to another point (pinch span).
    pub fn distance_to(&self, other: SurfacePoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// The on-screen bounding rectangle the remote picture is rendered into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Remote screen dimensions reported by the session handshake.
///
/// Set once per session; a new handshake replaces it wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteScreenGeometry {
    pub width: u32,
    pub height: u32,
}

/// An integer pixel position in remote-screen space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemotePoint {
    pub x: i32,
    pub y: i32,
}

/// Maps a surface position to remote-screen pixels.
///
/// Applies independent X/Y scale factors `geometry.width / rect.width` (and
/// the Y analogue) and rounds to integer remote pixels.
///
/// Callers must not invoke this before a session-established report has
/// provided the geometry; machine activation is gated on geometry presence,
/// so there is no runtime error path here.
pub fn map_to_remote(
    point: SurfacePoint,
    rect: &SurfaceRect,
    geometry: RemoteScreenGeometry,
) -> RemotePoint {
    let scale_x = geometry.width as f64 / rect.width;
    let scale_y = geometry.height as f64 / rect.height;
    RemotePoint {
        x: ((point.x - rect.left) * scale_x).round() as i32,
        y: ((point.y - rect.top) * scale_y).round() as i32,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
