//! Contact identity and lifecycle types.
//!
//! A contact is one tracked finger with a stable identity for its lifetime.
//! The surface layer delivers lifecycle events in platform order; the gesture
//! machines own the mapping from volatile contact ids to logical roles and
//! must clear it deterministically on every release or cancel. A contact id
//! must never be referenced after its release event has been processed.

use std::time::Instant;

use crate::domain::geometry::SurfacePoint;

/// Stable per-touch identifier assigned by the surface layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContactId(pub u64);

impl std::fmt::Display for ContactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "contact#{}", self.0)
    }
}

/// A raw contact lifecycle event delivered to the active gesture machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactEvent {
    /// A new contact touched the surface.
    Down {
        id: ContactId,
        position: SurfacePoint,
        at: Instant,
    },
    /// An existing contact moved.
    Move {
        id: ContactId,
        position: SurfacePoint,
        at: Instant,
    },
    /// A contact lifted off the surface.
    Up {
        id: ContactId,
        position: SurfacePoint,
        at: Instant,
    },
    /// The platform aborted the contact (palm rejection, app switch, …).
    /// Treated like an `Up` without gesture completion semantics.
    Cancel { id: ContactId, at: Instant },
}

impl ContactEvent {
    /// Returns the id of the contact this event belongs to.
    pub fn contact_id(&self) -> ContactId {
        match self {
            ContactEvent::Down { id, .. }
            | ContactEvent::Move { id, .. }
            | ContactEvent::Up { id, .. }
            | ContactEvent::Cancel { id, .. } => *id,
        }
    }
}

/// Bookkeeping for one contact a machine is currently tracking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedContact {
    pub id: ContactId,
    /// Where the contact first touched down.
    pub start: SurfacePoint,
    /// Most recently observed position.
    pub position: SurfacePoint,
    /// When the contact touched down.
    pub pressed_at: Instant,
}

impl TrackedContact {
    /// Starts tracking a contact at its touch-down position.
    pub fn new(id: ContactId, position: SurfacePoint, at: Instant) -> Self {
        Self {
            id,
            start: position,
            position,
            pressed_at: at,
        }
    }

    /// Records a new observed position and returns the delta since the last one.
    pub fn advance(&mut self, position: SurfacePoint) -> (f64, f64) {
        let dx = position.x - self.position.x;
        let dy = position.y - self.position.y;
        self.position = position;
        (dx, dy)
    }

    /// Largest per-axis displacement from the touch-down position.
    pub fn displacement_from_start(&self) -> f64 {
        let dx = (self.position.x - self.start.x).abs();
        let dy = (self.position.y - self.start.y).abs();
        dx.max(dy)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> SurfacePoint {
        SurfacePoint { x, y }
    }

    #[test]
    fn test_advance_returns_delta_since_last_position() {
        // Arrange
        let mut c = TrackedContact::new(ContactId(1), pt(10.0, 20.0), Instant::now());

        // Act
        let (dx, dy) = c.advance(pt(13.0, 18.0));

        // Assert
        assert_eq!((dx, dy), (3.0, -2.0));
        assert_eq!(c.position, pt(13.0, 18.0));
    }

    #[test]
    fn test_displacement_from_start_uses_largest_axis() {
        let mut c = TrackedContact::new(ContactId(1), pt(0.0, 0.0), Instant::now());
        c.advance(pt(2.0, -7.0));
        assert_eq!(c.displacement_from_start(), 7.0);
    }

    #[test]
    fn test_displacement_survives_multiple_advances() {
        // The start anchor must not move as the contact does.
        let mut c = TrackedContact::new(ContactId(4), pt(100.0, 100.0), Instant::now());
        c.advance(pt(101.0, 100.0));
        c.advance(pt(104.0, 100.0));
        assert_eq!(c.displacement_from_start(), 4.0);
    }

    #[test]
    fn test_contact_event_exposes_its_id() {
        let ev = ContactEvent::Cancel { id: ContactId(9), at: Instant::now() };
        assert_eq!(ev.contact_id(), ContactId(9));
    }
}
