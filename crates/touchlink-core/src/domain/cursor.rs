//! Client-side belief about the remote pointer position.
//!
//! The remote pointer is the server's to command; the client only *predicts*
//! where it is so that the local cursor overlay and relative-move arithmetic
//! feel immediate. The prediction is reconciled against the authoritative
//! server position on a fixed poll cadence. Two rules keep this stable:
//!
//! - When no interaction is live, the server value overwrites the local
//!   belief unconditionally.
//! - Mid-interaction, snapping would visibly teleport the pointer, so a
//!   large divergence is only flagged; correction waits for the next idle
//!   reconciliation or the calibration at the start of the next interaction.

use tracing::{debug, warn};

use crate::domain::geometry::{RemotePoint, RemoteScreenGeometry};

/// Outcome of a [`CursorPositionModel::reconcile`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Idle: the server value replaced the local belief.
    Applied,
    /// Interaction live, divergence within the drift threshold: no change.
    Held,
    /// Interaction live, divergence beyond the drift threshold: flagged for
    /// diagnostics, position left alone.
    Flagged,
}

/// The single authoritative client-side pointer position.
///
/// Mutated only through this model; always within
/// `[0, width] × [0, height]` of the current geometry. There is exactly one
/// writer per phase: the reconciliation poll while idle, the active gesture
/// machine while an interaction is live. The session enforces this by owning
/// both paths.
#[derive(Debug)]
pub struct CursorPositionModel {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    geometry: Option<RemoteScreenGeometry>,
    positioned: bool,
    interaction_active: bool,
    drift_flagged: bool,
    drift_threshold: f64,
}

impl CursorPositionModel {
    /// Creates a model with no geometry yet. Until a session-established
    /// report arrives the position is pinned to the origin and the gesture
    /// machines must not be armed.
    pub fn new(drift_threshold: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            geometry: None,
            positioned: false,
            interaction_active: false,
            drift_flagged: false,
            drift_threshold,
        }
    }

    /// Installs geometry from a session handshake, replacing any previous
    /// value wholesale. Centers the cursor if it was never positioned.
    pub fn set_geometry(&mut self, geometry: RemoteScreenGeometry) {
        self.width = geometry.width as f64;
        self.height = geometry.height as f64;
        self.geometry = Some(geometry);
        if !self.positioned {
            self.x = self.width / 2.0;
            self.y = self.height / 2.0;
            self.positioned = true;
        } else {
            // Geometry change with a live position: re-clamp into new bounds.
            self.x = self.x.clamp(0.0, self.width);
            self.y = self.y.clamp(0.0, self.height);
        }
    }

    /// Returns `true` once a session-established report has been applied.
    pub fn has_geometry(&self) -> bool {
        self.geometry.is_some()
    }

    /// The current geometry, if set.
    pub fn geometry(&self) -> Option<RemoteScreenGeometry> {
        self.geometry
    }

    /// Current belief, rounded to remote pixels.
    pub fn position(&self) -> RemotePoint {
        RemotePoint {
            x: self.x.round() as i32,
            y: self.y.round() as i32,
        }
    }

    /// Applies a relative delta, clamps to bounds, and returns the new
    /// position. Always succeeds.
    pub fn nudge(&mut self, dx: f64, dy: f64) -> RemotePoint {
        self.x = (self.x + dx).clamp(0.0, self.width);
        self.y = (self.y + dy).clamp(0.0, self.height);
        self.position()
    }

    /// Clamps and sets an absolute position (interaction-start calibration).
    pub fn set_absolute(&mut self, x: f64, y: f64) -> RemotePoint {
        self.x = x.clamp(0.0, self.width);
        self.y = y.clamp(0.0, self.height);
        self.positioned = true;
        self.position()
    }

    /// Marks the start of a gesture interaction. While active, reconciliation
    /// will not overwrite the position.
    pub fn begin_interaction(&mut self) {
        self.interaction_active = true;
    }

    /// Marks the end of a gesture interaction.
    pub fn end_interaction(&mut self) {
        self.interaction_active = false;
    }

    /// Whether a gesture interaction is currently live.
    pub fn interaction_active(&self) -> bool {
        self.interaction_active
    }

    /// Whether a mid-interaction drift beyond the threshold has been observed
    /// and not yet corrected.
    pub fn drift_flagged(&self) -> bool {
        self.drift_flagged
    }

    /// Feeds one periodic server position report into the model.
    ///
    /// Idle: the server is authoritative and the local belief is overwritten
    /// unconditionally. Mid-interaction: a divergence beyond the drift
    /// threshold is logged and flagged but the position is left alone.
    pub fn reconcile(&mut self, server_x: i32, server_y: i32) -> ReconcileOutcome {
        if !self.interaction_active {
            self.x = (server_x as f64).clamp(0.0, self.width);
            self.y = (server_y as f64).clamp(0.0, self.height);
            self.positioned = true;
            self.drift_flagged = false;
            return ReconcileOutcome::Applied;
        }

        let dx = (self.x - server_x as f64).abs();
        let dy = (self.y - server_y as f64).abs();
        if dx > self.drift_threshold || dy > self.drift_threshold {
            warn!(dx, dy, "pointer drift beyond threshold mid-interaction; correction deferred");
            self.drift_flagged = true;
            ReconcileOutcome::Flagged
        } else {
            debug!(dx, dy, "reconcile held during interaction");
            ReconcileOutcome::Held
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
