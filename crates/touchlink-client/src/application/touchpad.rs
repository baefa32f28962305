//! TouchPadGestureMachine: laptop-trackpad semantics on a touch surface.
//!
//! One or two simultaneous contacts are interpreted as:
//!
//! - one finger moving      → pointer move (never a drag by itself)
//! - one finger tapping     → left click, deferred until the double-tap
//!                            window has ruled out a drag
//! - double-tap-and-hold    → drag (button held until the second contact
//!                            releases)
//! - two fingers tapping    → right click
//! - two fingers panning    → two-axis scroll, vertical inverted
//!
//! The deferred click is a cancellable deadline polled by the session tick;
//! movement past the threshold, a superseding contact, or a mode switch
//! cancels it. No two timers for the same logical click can fire.

use std::time::{Duration, Instant};

use tracing::debug;

use touchlink_core::domain::contact::{ContactEvent, ContactId, TrackedContact};
use touchlink_core::domain::cursor::CursorPositionModel;
use touchlink_core::domain::geometry::SurfacePoint;
use touchlink_core::protocol::commands::{PointerButton, PressAction};

use crate::application::emitter::CommandEmitter;

/// Tunable thresholds for the touchpad machine. Defaults match the shipped
/// configuration; every value is independently overridable from the config
/// file.
#[derive(Debug, Clone)]
pub struct TouchpadTuning {
    /// Multiplier from surface-pixel deltas to remote-pixel deltas.
    pub pointer_sensitivity: f64,
    /// Multiplier from midpoint deltas to scroll units.
    pub scroll_sensitivity: f64,
    /// Second tap within this window of the previous tap counts as a double-tap.
    pub double_tap_window: Duration,
    /// … and within this distance (per axis) of the previous tap's release point.
    pub double_tap_distance: f64,
    /// How long a deferred click waits for a possible second tap.
    pub click_confirm_delay: Duration,
    /// Delay between the down and up halves of a synthesized tap.
    pub click_hold: Duration,
    /// A release at or past this duration fires an unresolved click immediately.
    pub long_press: Duration,
    /// Two-contact releases faster than this (and unmoved) are a right click.
    pub two_finger_tap: Duration,
    /// Per-axis displacement past which a contact counts as moved.
    pub move_threshold: f64,
}

impl Default for TouchpadTuning {
    fn default() -> Self {
        Self {
            pointer_sensitivity: 1.5,
            scroll_sensitivity: 3.0,
            double_tap_window: Duration::from_millis(800),
            double_tap_distance: 100.0,
            click_confirm_delay: Duration::from_millis(200),
            click_hold: Duration::from_millis(50),
            long_press: Duration::from_millis(300),
            two_finger_tap: Duration::from_millis(300),
            move_threshold: 3.0,
        }
    }
}

/// A deferred single-click decision, alive between a tap-shaped down and
/// either the confirming deadline or a superseding event.
#[derive(Debug, Clone, Copy)]
struct PendingClick {
    deadline: Instant,
}

/// Release point and time of the last short tap, kept for double-tap detection.
#[derive(Debug, Clone, Copy)]
struct TapMemory {
    at: Instant,
    position: SurfacePoint,
}

/// One-contact interaction state.
#[derive(Debug)]
struct OneFingerState {
    contact: TrackedContact,
    /// Set once displacement passes the move threshold.
    moved: bool,
    /// Button held from a confirmed double-tap.
    dragging: bool,
}

/// Two-contact interaction state. The tracking point is the midpoint.
#[derive(Debug)]
struct TwoFingerState {
    first: TrackedContact,
    second: TrackedContact,
    start_midpoint: SurfacePoint,
    last_midpoint: SurfacePoint,
    started: Instant,
    moved: bool,
}

#[derive(Debug)]
enum TouchpadPhase {
    Idle,
    OneFinger(OneFingerState),
    TwoFinger(TwoFingerState),
}

/// The touchpad gesture machine.
pub struct TouchpadMachine {
    tuning: TouchpadTuning,
    phase: TouchpadPhase,
    pending_click: Option<PendingClick>,
    last_tap: Option<TapMemory>,
}

impl TouchpadMachine {
    pub fn new(tuning: TouchpadTuning) -> Self {
        Self {
            tuning,
            phase: TouchpadPhase::Idle,
            pending_click: None,
            last_tap: None,
        }
    }

    /// Feeds one contact lifecycle event through the machine.
    pub fn handle_event(
        &mut self,
        event: ContactEvent,
        cursor: &mut CursorPositionModel,
        emitter: &mut CommandEmitter,
    ) {
        match event {
            ContactEvent::Down { id, position, at } => self.on_down(id, position, at, cursor, emitter),
            ContactEvent::Move { id, position, .. } => self.on_move(id, position, cursor, emitter),
            ContactEvent::Up { id, position, at } => self.on_up(id, position, at, cursor, emitter),
            ContactEvent::Cancel { id, .. } => self.on_cancel(id, cursor, emitter),
        }
    }

    /// Fires the deferred click when its deadline has passed.
    ///
    /// Called from the session tick. Resolving here is the only way a pending
    /// click becomes a tap besides the long-press release shortcut, so the
    /// click can never fire twice.
    pub fn on_tick(&mut self, now: Instant, emitter: &mut CommandEmitter) {
        if let Some(pending) = self.pending_click {
            if now >= pending.deadline {
                self.pending_click = None;
                emitter.tap(PointerButton::Left, now, self.tuning.click_hold);
            }
        }
    }

    /// Forces the machine to a clean terminal state (mode switch).
    ///
    /// Releases a held drag button, cancels any pending click, and ends the
    /// cursor interaction phase. Idempotent.
    pub fn deactivate(&mut self, cursor: &mut CursorPositionModel, emitter: &mut CommandEmitter) {
        if let TouchpadPhase::OneFinger(state) = &self.phase {
            if state.dragging {
                emitter.button(PointerButton::Left, PressAction::Up);
            }
        }
        self.pending_click = None;
        self.last_tap = None;
        self.phase = TouchpadPhase::Idle;
        cursor.end_interaction();
    }

    /// Whether the machine is between interactions.
    pub fn is_idle(&self) -> bool {
        matches!(self.phase, TouchpadPhase::Idle)
    }

    // ── Contact down ──────────────────────────────────────────────────────────

    fn on_down(
        &mut self,
        id: ContactId,
        position: SurfacePoint,
        at: Instant,
        cursor: &mut CursorPositionModel,
        emitter: &mut CommandEmitter,
    ) {
        let double_tap = self.is_double_tap(position, at);
        match &mut self.phase {
            TouchpadPhase::Idle => {
                cursor.begin_interaction();
                // Absolute resend before the interaction: some remote windows
                // capture or reset the pointer out of band, so the belief is
                // re-asserted at every interaction start.
                emitter.pointer_move_absolute(cursor.position());

                if double_tap {
                    // Second tap of a double-tap: the first tap's deferred
                    // click dies here and the button goes down immediately.
                    self.pending_click = None;
                    emitter.button(PointerButton::Left, PressAction::Down);
                    self.phase = TouchpadPhase::OneFinger(OneFingerState {
                        contact: TrackedContact::new(id, position, at),
                        moved: false,
                        dragging: true,
                    });
                } else {
                    // A fresh tap supersedes any unresolved click from the
                    // previous interaction: one logical click, one timer.
                    if self.pending_click.take().is_some() {
                        debug!("pending click superseded by a new contact");
                    }
                    self.pending_click = Some(PendingClick {
                        deadline: at + self.tuning.click_confirm_delay,
                    });
                    self.phase = TouchpadPhase::OneFinger(OneFingerState {
                        contact: TrackedContact::new(id, position, at),
                        moved: false,
                        dragging: false,
                    });
                }
            }

            TouchpadPhase::OneFinger(state) => {
                // Second finger: never a click anymore.
                self.pending_click = None;
                if state.dragging {
                    // A drag cannot continue into a two-finger gesture.
                    emitter.button(PointerButton::Left, PressAction::Up);
                    state.dragging = false;
                }
                let first = state.contact;
                let second = TrackedContact::new(id, position, at);
                let midpoint = SurfacePoint::midpoint(first.position, second.position);
                self.phase = TouchpadPhase::TwoFinger(TwoFingerState {
                    first,
                    second,
                    start_midpoint: midpoint,
                    last_midpoint: midpoint,
                    started: at,
                    moved: false,
                });
            }

            TouchpadPhase::TwoFinger(_) => {
                // Extra contacts during a two-finger gesture are ignored; the
                // tracked pair keeps the gesture.
                debug!(%id, "third contact ignored during two-finger gesture");
            }
        }
    }

    // ── Contact move ──────────────────────────────────────────────────────────

    fn on_move(
        &mut self,
        id: ContactId,
        position: SurfacePoint,
        cursor: &mut CursorPositionModel,
        emitter: &mut CommandEmitter,
    ) {
        match &mut self.phase {
            TouchpadPhase::OneFinger(state) if state.contact.id == id => {
                let (raw_dx, raw_dy) = state.contact.advance(position);

                if !state.moved
                    && state.contact.displacement_from_start() > self.tuning.move_threshold
                {
                    state.moved = true;
                    // Movement rules out a tap. It never starts a drag either:
                    // dragging is only entered via a confirmed double-tap.
                    self.pending_click = None;
                }

                let dx = (raw_dx * self.tuning.pointer_sensitivity).round();
                let dy = (raw_dy * self.tuning.pointer_sensitivity).round();
                cursor.nudge(dx, dy);
                emitter.pointer_move_relative(dx, dy, false);
            }

            TouchpadPhase::TwoFinger(state) if state.first.id == id || state.second.id == id => {
                if state.first.id == id {
                    state.first.advance(position);
                } else {
                    state.second.advance(position);
                }

                let midpoint = SurfacePoint::midpoint(state.first.position, state.second.position);
                if !state.moved {
                    let dx = (midpoint.x - state.start_midpoint.x).abs();
                    let dy = (midpoint.y - state.start_midpoint.y).abs();
                    if dx.max(dy) > self.tuning.move_threshold {
                        state.moved = true;
                    }
                }

                if state.moved {
                    let delta_x = midpoint.x - state.last_midpoint.x;
                    let delta_y = midpoint.y - state.last_midpoint.y;
                    // Vertical pan scrolls in the natural direction: content
                    // follows the fingers, so the wheel delta is inverted.
                    emitter.scroll(
                        (delta_x * self.tuning.scroll_sensitivity).round() as i32,
                        (-delta_y * self.tuning.scroll_sensitivity).round() as i32,
                    );
                }
                state.last_midpoint = midpoint;
            }

            _ => {
                debug!(%id, "move for untracked contact ignored");
            }
        }
    }

    // ── Contact up ────────────────────────────────────────────────────────────

    fn on_up(
        &mut self,
        id: ContactId,
        position: SurfacePoint,
        at: Instant,
        cursor: &mut CursorPositionModel,
        emitter: &mut CommandEmitter,
    ) {
        match &mut self.phase {
            TouchpadPhase::OneFinger(state) if state.contact.id == id => {
                let duration = at.duration_since(state.contact.pressed_at);

                if state.dragging {
                    // Drag ends with the button release. The double-tap memory
                    // is cleared so a third rapid tap cannot be misread as a
                    // new double-tap start.
                    emitter.button(PointerButton::Left, PressAction::Up);
                    self.last_tap = None;
                } else if self.pending_click.is_some() {
                    if !state.moved && duration >= self.tuning.long_press {
                        // The confirm deadline should have fired already; the
                        // release arrived first, so the tap fires now instead.
                        self.pending_click = None;
                        emitter.tap(PointerButton::Left, at, self.tuning.click_hold);
                    } else if !state.moved {
                        // Short clean tap: leave the deferred click running and
                        // remember the release point for double-tap detection.
                        self.last_tap = Some(TapMemory { at, position });
                    } else {
                        self.pending_click = None;
                    }
                }
                // No pending click and no drag: a plain swipe ends without a
                // command.

                self.phase = TouchpadPhase::Idle;
                cursor.end_interaction();
            }

            TouchpadPhase::TwoFinger(state) if state.first.id == id || state.second.id == id => {
                let duration = at.duration_since(state.started);
                if !state.moved && duration < self.tuning.two_finger_tap {
                    emitter.tap(PointerButton::Right, at, self.tuning.click_hold);
                }

                // The remaining contact becomes a brand-new one-finger
                // interaction started now; it is not spliced into the finger
                // that was already tracked.
                let remaining = if state.first.id == id { state.second } else { state.first };
                self.phase = TouchpadPhase::OneFinger(OneFingerState {
                    contact: TrackedContact::new(remaining.id, remaining.position, at),
                    moved: false,
                    dragging: false,
                });
            }

            _ => {
                debug!(%id, "release for untracked contact ignored");
            }
        }
    }

    // ── Contact cancel ────────────────────────────────────────────────────────

    fn on_cancel(
        &mut self,
        id: ContactId,
        cursor: &mut CursorPositionModel,
        emitter: &mut CommandEmitter,
    ) {
        match &mut self.phase {
            TouchpadPhase::OneFinger(state) if state.contact.id == id => {
                if state.dragging {
                    emitter.button(PointerButton::Left, PressAction::Up);
                    self.last_tap = None;
                }
                self.pending_click = None;
                self.phase = TouchpadPhase::Idle;
                cursor.end_interaction();
            }
            TouchpadPhase::TwoFinger(state) if state.first.id == id || state.second.id == id => {
                // No tap semantics on a platform abort; the survivor restarts.
                let remaining = if state.first.id == id { state.second } else { state.first };
                let restarted = TrackedContact::new(
                    remaining.id,
                    remaining.position,
                    state.started,
                );
                self.phase = TouchpadPhase::OneFinger(OneFingerState {
                    contact: restarted,
                    moved: true,
                    dragging: false,
                });
            }
            _ => {
                debug!(%id, "cancel for untracked contact ignored");
            }
        }
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn is_double_tap(&self, position: SurfacePoint, at: Instant) -> bool {
        let Some(last) = self.last_tap else {
            return false;
        };
        at.duration_since(last.at) < self.tuning.double_tap_window
            && (position.x - last.position.x).abs() < self.tuning.double_tap_distance
            && (position.y - last.position.y).abs() < self.tuning.double_tap_distance
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::emitter::{CommandSink, SinkError};
    use std::sync::{Arc, Mutex};
    use touchlink_core::domain::geometry::RemoteScreenGeometry;
    use touchlink_core::protocol::commands::ClientCommand;

    // ── Test doubles ──────────────────────────────────────────────────────────

    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<ClientCommand>>,
    }

    impl CommandSink for RecordingSink {
        fn deliver(&self, command: ClientCommand, _sequence: u64) -> Result<(), SinkError> {
            self.delivered.lock().unwrap().push(command);
            Ok(())
        }
    }

    struct Fixture {
        machine: TouchpadMachine,
        cursor: CursorPositionModel,
        emitter: CommandEmitter,
        sink: Arc<RecordingSink>,
        epoch: Instant,
        next_id: u64,
    }

    impl Fixture {
        fn new() -> Self {
            let sink = Arc::new(RecordingSink::default());
            let emitter = CommandEmitter::new(Arc::clone(&sink) as Arc<dyn CommandSink>);
            let mut cursor = CursorPositionModel::new(100.0);
            cursor.set_geometry(RemoteScreenGeometry { width: 1920, height: 1080 });
            Self {
                machine: TouchpadMachine::new(TouchpadTuning::default()),
                cursor,
                emitter,
                sink,
                epoch: Instant::now(),
                next_id: 0,
            }
        }

        fn at(&self, ms: u64) -> Instant {
            self.epoch + Duration::from_millis(ms)
        }

        fn fresh_id(&mut self) -> ContactId {
            self.next_id += 1;
            ContactId(self.next_id)
        }

        fn down(&mut self, id: ContactId, x: f64, y: f64, ms: u64) {
            let event = ContactEvent::Down {
                id,
                position: SurfacePoint { x, y },
                at: self.at(ms),
            };
            self.machine.handle_event(event, &mut self.cursor, &mut self.emitter);
        }

        fn mv(&mut self, id: ContactId, x: f64, y: f64, ms: u64) {
            let event = ContactEvent::Move {
                id,
                position: SurfacePoint { x, y },
                at: self.at(ms),
            };
            self.machine.handle_event(event, &mut self.cursor, &mut self.emitter);
        }

        fn up(&mut self, id: ContactId, x: f64, y: f64, ms: u64) {
            let event = ContactEvent::Up {
                id,
                position: SurfacePoint { x, y },
                at: self.at(ms),
            };
            self.machine.handle_event(event, &mut self.cursor, &mut self.emitter);
        }

        /// Advances the deferred-click and deferred-up machinery to `ms`.
        fn tick(&mut self, ms: u64) {
            let now = self.at(ms);
            self.machine.on_tick(now, &mut self.emitter);
            self.emitter.flush_due(now);
        }

        fn commands(&self) -> Vec<ClientCommand> {
            self.sink.delivered.lock().unwrap().clone()
        }

        fn button_events(&self) -> Vec<(PointerButton, PressAction)> {
            self.commands()
                .iter()
                .filter_map(|c| match c {
                    ClientCommand::PointerButton(b) => Some((b.button, b.action)),
                    _ => None,
                })
                .collect()
        }

        fn scrolls(&self) -> Vec<(i32, i32)> {
            self.commands()
                .iter()
                .filter_map(|c| match c {
                    ClientCommand::Scroll(s) => Some((s.dx, s.dy)),
                    _ => None,
                })
                .collect()
        }
    }

    // ── Single tap ────────────────────────────────────────────────────────────

    #[test]
    fn test_short_tap_emits_exactly_one_down_up_pair_after_confirm_delay() {
        // Arrange
        let mut f = Fixture::new();
        let id = f.fresh_id();

        // Act – 80 ms tap, no movement, then let the confirm window expire
        f.down(id, 200.0, 200.0, 0);
        f.up(id, 200.0, 200.0, 80);
        f.tick(150); // before the 200 ms deadline: nothing yet
        assert!(f.button_events().is_empty());
        f.tick(200); // deadline: down fires
        f.tick(250); // hold elapsed: up fires

        // Assert
        assert_eq!(
            f.button_events(),
            vec![
                (PointerButton::Left, PressAction::Down),
                (PointerButton::Left, PressAction::Up),
            ]
        );
    }

    #[test]
    fn test_tap_never_fires_twice_when_timer_fires_before_release() {
        // Hold longer than the confirm delay: the deferred click fires while
        // the finger is still down, and the later release must not re-fire.
        let mut f = Fixture::new();
        let id = f.fresh_id();

        f.down(id, 200.0, 200.0, 0);
        f.tick(210); // confirm deadline passes mid-hold – tap fires
        f.up(id, 200.0, 200.0, 400); // long-press release
        f.tick(500);

        assert_eq!(
            f.button_events(),
            vec![
                (PointerButton::Left, PressAction::Down),
                (PointerButton::Left, PressAction::Up),
            ]
        );
    }

    #[test]
    fn test_long_press_release_before_tick_fires_tap_immediately() {
        // Release arrives after the long-press threshold but before any tick
        // could resolve the deferred click.
        let mut f = Fixture::new();
        let id = f.fresh_id();

        f.down(id, 200.0, 200.0, 0);
        f.up(id, 200.0, 200.0, 320);
        f.tick(400);

        assert_eq!(
            f.button_events(),
            vec![
                (PointerButton::Left, PressAction::Down),
                (PointerButton::Left, PressAction::Up),
            ]
        );
    }

    #[test]
    fn test_movement_cancels_pending_click_and_emits_no_button() {
        // Arrange
        let mut f = Fixture::new();
        let id = f.fresh_id();

        // Act – swipe well past the 3 px threshold, then release
        f.down(id, 200.0, 200.0, 0);
        f.mv(id, 240.0, 200.0, 50);
        f.up(id, 240.0, 200.0, 90);
        f.tick(400);

        // Assert – moves only, no click
        assert!(f.button_events().is_empty());
        assert!(f
            .commands()
            .iter()
            .any(|c| matches!(c, ClientCommand::PointerMoveRelative(_))));
    }

    #[test]
    fn test_moves_are_scaled_and_nudge_the_cursor_model() {
        let mut f = Fixture::new();
        let id = f.fresh_id();
        let before = f.cursor.position();

        f.down(id, 200.0, 200.0, 0);
        f.mv(id, 210.0, 200.0, 30); // 10 px * 1.5 sensitivity

        let moves: Vec<(f32, f32)> = f
            .commands()
            .iter()
            .filter_map(|c| match c {
                ClientCommand::PointerMoveRelative(m) => Some((m.dx, m.dy)),
                _ => None,
            })
            .collect();
        assert_eq!(moves, vec![(15.0, 0.0)]);
        assert_eq!(f.cursor.position().x, before.x + 15);
    }

    #[test]
    fn test_interaction_start_recalibrates_with_absolute_resend() {
        let mut f = Fixture::new();
        let id = f.fresh_id();

        f.down(id, 200.0, 200.0, 0);

        assert!(matches!(
            f.commands().first(),
            Some(ClientCommand::PointerMoveAbsolute(_))
        ));
        assert!(f.cursor.interaction_active());
    }

    // ── Double-tap drag ───────────────────────────────────────────────────────

    #[test]
    fn test_double_tap_suppresses_first_click_and_holds_button_until_release() {
        // Arrange
        let mut f = Fixture::new();
        let first = f.fresh_id();
        let second = f.fresh_id();

        // Act – tap, then a second tap 300 ms later at the same spot,
        // hold and drag it, release at 900 ms.
        f.down(first, 300.0, 300.0, 0);
        f.up(first, 300.0, 300.0, 60);
        f.down(second, 305.0, 300.0, 300); // inside 800 ms / 100 px windows
        f.mv(second, 380.0, 300.0, 500);
        f.up(second, 380.0, 300.0, 900);
        f.tick(1200);

        // Assert – exactly one down (at the second tap-down) and one up (at
        // its release); the first tap's deferred click never fired.
        assert_eq!(
            f.button_events(),
            vec![
                (PointerButton::Left, PressAction::Down),
                (PointerButton::Left, PressAction::Up),
            ]
        );
    }

    #[test]
    fn test_drag_release_clears_double_tap_memory() {
        // A third rapid tap right after a drag must start a fresh pending
        // click, not another drag.
        let mut f = Fixture::new();
        let (a, b, c) = (f.fresh_id(), f.fresh_id(), f.fresh_id());

        f.down(a, 300.0, 300.0, 0);
        f.up(a, 300.0, 300.0, 60);
        f.down(b, 300.0, 300.0, 200); // double-tap: drag
        f.up(b, 300.0, 300.0, 400);
        f.down(c, 300.0, 300.0, 500); // would be inside the window if memory leaked
        f.up(c, 300.0, 300.0, 550);
        f.tick(1000);

        // Drag pair from b, then a plain tap pair from c: four button events,
        // never a down without a matching up in between.
        assert_eq!(
            f.button_events(),
            vec![
                (PointerButton::Left, PressAction::Down),
                (PointerButton::Left, PressAction::Up),
                (PointerButton::Left, PressAction::Down),
                (PointerButton::Left, PressAction::Up),
            ]
        );
    }

    #[test]
    fn test_far_away_second_tap_is_not_a_double_tap() {
        let mut f = Fixture::new();
        let (a, b) = (f.fresh_id(), f.fresh_id());

        f.down(a, 100.0, 100.0, 0);
        f.up(a, 100.0, 100.0, 50);
        // 400 px away: outside the 100 px distance window. The first pending
        // click is superseded, the second runs its own confirm window.
        f.down(b, 500.0, 100.0, 200);
        f.up(b, 500.0, 100.0, 260);
        f.tick(600); // second confirm deadline fires the down
        f.tick(700); // hold elapses, up follows

        assert_eq!(
            f.button_events(),
            vec![
                (PointerButton::Left, PressAction::Down),
                (PointerButton::Left, PressAction::Up),
            ]
        );
    }

    // ── Two-finger gestures ───────────────────────────────────────────────────

    #[test]
    fn test_two_finger_tap_emits_right_click_and_no_left_events() {
        // Arrange
        let mut f = Fixture::new();
        let (a, b) = (f.fresh_id(), f.fresh_id());

        // Act – both fingers down and up within 300 ms, no movement
        f.down(a, 400.0, 400.0, 0);
        f.down(b, 460.0, 400.0, 30);
        f.up(a, 400.0, 400.0, 150);
        f.up(b, 460.0, 400.0, 170);
        f.tick(600);

        // Assert
        let events = f.button_events();
        assert_eq!(
            events,
            vec![
                (PointerButton::Right, PressAction::Down),
                (PointerButton::Right, PressAction::Up),
            ]
        );
        assert!(events.iter().all(|(b, _)| *b == PointerButton::Right));
    }

    #[test]
    fn test_two_finger_pan_scrolls_with_inverted_vertical_sign() {
        // Arrange
        let mut f = Fixture::new();
        let (a, b) = (f.fresh_id(), f.fresh_id());

        // Act – pan both fingers down-right
        f.down(a, 400.0, 400.0, 0);
        f.down(b, 460.0, 400.0, 10);
        f.mv(a, 410.0, 420.0, 60);
        f.mv(b, 470.0, 420.0, 70);
        f.up(a, 410.0, 420.0, 400);
        f.up(b, 470.0, 420.0, 410);
        f.tick(800);

        // Assert – horizontal keeps the raw sign, vertical is negated
        let scrolls = f.scrolls();
        assert!(!scrolls.is_empty());
        for (dx, dy) in &scrolls {
            assert!(*dx >= 0, "horizontal must follow raw delta sign, got {dx}");
            assert!(*dy <= 0, "vertical must be inverted, got {dy}");
        }
        assert!(scrolls.iter().any(|(_, dy)| *dy < 0));
        // A moved pan never right-clicks.
        assert!(f.button_events().is_empty());
    }

    #[test]
    fn test_second_finger_releases_a_held_drag_button_first() {
        // Drag in progress, then a second finger lands: the held button must
        // be released before the scroll gesture starts.
        let mut f = Fixture::new();
        let (a, b, c) = (f.fresh_id(), f.fresh_id(), f.fresh_id());

        f.down(a, 300.0, 300.0, 0);
        f.up(a, 300.0, 300.0, 50);
        f.down(b, 300.0, 300.0, 200); // drag start
        f.down(c, 360.0, 300.0, 400); // second finger
        f.up(b, 300.0, 300.0, 800);
        f.up(c, 360.0, 300.0, 810);
        f.tick(1200);

        assert_eq!(
            f.button_events(),
            vec![
                (PointerButton::Left, PressAction::Down),
                (PointerButton::Left, PressAction::Up),
            ]
        );
    }

    #[test]
    fn test_survivor_of_two_finger_gesture_starts_a_fresh_interaction() {
        // Right-click fires for the tap, then the remaining finger moves the
        // pointer as a new one-finger interaction (no splice).
        let mut f = Fixture::new();
        let (a, b) = (f.fresh_id(), f.fresh_id());

        f.down(a, 400.0, 400.0, 0);
        f.down(b, 460.0, 400.0, 20);
        f.up(a, 400.0, 400.0, 100); // right-click, b survives
        f.mv(b, 500.0, 400.0, 200);
        f.up(b, 500.0, 400.0, 260);
        f.tick(700);

        assert_eq!(
            f.button_events(),
            vec![
                (PointerButton::Right, PressAction::Down),
                (PointerButton::Right, PressAction::Up),
            ]
        );
        // The survivor's movement produced pointer moves, not scrolls.
        assert!(f
            .commands()
            .iter()
            .any(|c| matches!(c, ClientCommand::PointerMoveRelative(_))));
    }

    #[test]
    fn test_third_contact_during_two_finger_gesture_is_ignored() {
        let mut f = Fixture::new();
        let (a, b, c) = (f.fresh_id(), f.fresh_id(), f.fresh_id());

        f.down(a, 400.0, 400.0, 0);
        f.down(b, 460.0, 400.0, 10);
        f.down(c, 500.0, 500.0, 20); // palm edge
        f.mv(a, 410.0, 410.0, 60);
        f.mv(b, 470.0, 410.0, 70);
        f.up(c, 500.0, 500.0, 90); // orphan release, also ignored
        f.up(a, 410.0, 410.0, 400);
        f.up(b, 470.0, 410.0, 420);
        f.tick(900);

        // The pan still worked and nothing clicked.
        assert!(!f.scrolls().is_empty());
        assert!(f.button_events().is_empty());
    }

    // ── State-consistency faults ──────────────────────────────────────────────

    #[test]
    fn test_orphaned_contact_events_are_ignored() {
        let mut f = Fixture::new();
        let ghost = f.fresh_id();

        f.mv(ghost, 100.0, 100.0, 10);
        f.up(ghost, 100.0, 100.0, 20);
        f.tick(500);

        assert!(f.commands().is_empty());
        assert!(f.machine.is_idle());
    }

    #[test]
    fn test_deactivate_releases_held_drag_and_cancels_pending_click() {
        // Arrange – enter a drag
        let mut f = Fixture::new();
        let (a, b) = (f.fresh_id(), f.fresh_id());
        f.down(a, 300.0, 300.0, 0);
        f.up(a, 300.0, 300.0, 50);
        f.down(b, 300.0, 300.0, 200);

        // Act – mode switch mid-drag
        f.machine.deactivate(&mut f.cursor, &mut f.emitter);
        f.tick(2000);

        // Assert – the held button was released exactly once, no stray click
        assert_eq!(
            f.button_events(),
            vec![
                (PointerButton::Left, PressAction::Down),
                (PointerButton::Left, PressAction::Up),
            ]
        );
        assert!(f.machine.is_idle());
        assert!(!f.cursor.interaction_active());
    }

    #[test]
    fn test_cancel_mid_drag_releases_button_without_tap() {
        let mut f = Fixture::new();
        let (a, b) = (f.fresh_id(), f.fresh_id());
        f.down(a, 300.0, 300.0, 0);
        f.up(a, 300.0, 300.0, 50);
        f.down(b, 300.0, 300.0, 200); // drag

        let event = ContactEvent::Cancel { id: b, at: f.at(400) };
        f.machine.handle_event(event, &mut f.cursor, &mut f.emitter);
        f.tick(900);

        assert_eq!(
            f.button_events(),
            vec![
                (PointerButton::Left, PressAction::Down),
                (PointerButton::Left, PressAction::Up),
            ]
        );
    }
}
