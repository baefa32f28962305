//! GamepadInputMachine: full-surface swipe/pinch interpretation for games.
//!
//! One contact pans; what the pan *means* depends on the pointer-active
//! modifier: camera-look deltas (raw, remote applies its own look curve) when
//! inactive, absolute-cursor movement when active. Two contacts pinch, which
//! the remote UI consumes as a zoom scroll axis. Two sticky toggles – a
//! look-lock modifier and a wheel-select modifier – hold their key down
//! across gestures until toggled off or until the mode switch cleanup
//! force-releases them.
//!
//! Swipe output is rate-limited to a minimum inter-send interval; samples
//! arriving faster update the tracked position without emitting, so
//! intra-window movement is dropped rather than accumulated.

use std::time::{Duration, Instant};

use tracing::debug;

use touchlink_core::domain::contact::{ContactEvent, ContactId, TrackedContact};
use touchlink_core::domain::cursor::CursorPositionModel;
use touchlink_core::domain::geometry::SurfacePoint;
use touchlink_core::protocol::commands::{PointerButton, PressAction};

use crate::application::emitter::CommandEmitter;

/// Baseline the camera sensitivity setting is expressed against: a setting of
/// 30 means raw deltas pass through unscaled.
const CAMERA_SENSITIVITY_BASELINE: f64 = 30.0;

/// Tunable thresholds for the gamepad machine.
#[derive(Debug, Clone)]
pub struct GamepadTuning {
    /// Multiplier for pointer-active swipe deltas.
    pub pointer_sensitivity: f64,
    /// Camera-look sensitivity; scaled against [`CAMERA_SENSITIVITY_BASELINE`].
    pub camera_sensitivity: f64,
    /// Multiplier from pinch-distance deltas to zoom scroll units.
    pub pinch_sensitivity: f64,
    /// Delay between the down and up halves of a synthesized tap.
    pub click_hold: Duration,
    /// Pointer-active releases faster than this (and unmoved) are a tap.
    pub tap_window: Duration,
    /// Total displacement past which a swipe counts as moved.
    pub move_threshold: f64,
    /// Deltas smaller than this on both axes are not worth sending.
    pub min_move_output: f64,
    /// Minimum interval between outbound move/zoom samples.
    pub min_send_interval: Duration,
    /// Per-sample clamp for the zoom scroll axis.
    pub zoom_step_limit: i32,
    /// Key held by the look-lock toggle.
    pub look_lock_key: String,
    /// Key held by the wheel-select toggle.
    pub wheel_select_key: String,
}

impl Default for GamepadTuning {
    fn default() -> Self {
        Self {
            pointer_sensitivity: 1.5,
            camera_sensitivity: 30.0,
            pinch_sensitivity: 0.25,
            click_hold: Duration::from_millis(50),
            tap_window: Duration::from_millis(350),
            move_threshold: 6.0,
            min_move_output: 0.2,
            min_send_interval: Duration::from_millis(8),
            zoom_step_limit: 80,
            look_lock_key: "Alt".to_string(),
            wheel_select_key: "Tab".to_string(),
        }
    }
}

/// One-contact pan state.
#[derive(Debug)]
struct SwipeState {
    contact: TrackedContact,
    /// Set once total displacement passes the move threshold; gates the
    /// tap-on-release detector.
    moved: bool,
    last_send: Option<Instant>,
}

/// Two-contact pinch state.
#[derive(Debug)]
struct PinchState {
    first: TrackedContact,
    second: TrackedContact,
    last_distance: f64,
    last_send: Option<Instant>,
}

#[derive(Debug)]
enum GamepadPhase {
    Idle,
    Swipe(SwipeState),
    Pinch(PinchState),
}

/// The gamepad gesture machine.
pub struct GamepadMachine {
    tuning: GamepadTuning,
    phase: GamepadPhase,
    look_lock: bool,
    wheel_select: bool,
}

impl GamepadMachine {
    pub fn new(tuning: GamepadTuning) -> Self {
        Self {
            tuning,
            phase: GamepadPhase::Idle,
            look_lock: false,
            wheel_select: false,
        }
    }

    /// Whether swipe output currently drives the cursor rather than the camera.
    pub fn pointer_active(&self) -> bool {
        self.look_lock || self.wheel_select
    }

    /// Whether the look-lock modifier is held.
    pub fn look_lock(&self) -> bool {
        self.look_lock
    }

    /// Whether the wheel-select modifier is held.
    pub fn wheel_select(&self) -> bool {
        self.wheel_select
    }

    /// Flips the look-lock modifier, emitting the matching key half.
    pub fn toggle_look_lock(&mut self, emitter: &mut CommandEmitter) {
        self.look_lock = !self.look_lock;
        let action = if self.look_lock { PressAction::Down } else { PressAction::Up };
        let key = self.tuning.look_lock_key.clone();
        emitter.key(&key, action);
    }

    /// Flips the wheel-select modifier, emitting the matching key half.
    pub fn toggle_wheel_select(&mut self, emitter: &mut CommandEmitter) {
        self.wheel_select = !self.wheel_select;
        let action = if self.wheel_select { PressAction::Down } else { PressAction::Up };
        let key = self.tuning.wheel_select_key.clone();
        emitter.key(&key, action);
    }

    /// Feeds one contact lifecycle event through the machine.
    pub fn handle_event(
        &mut self,
        event: ContactEvent,
        cursor: &mut CursorPositionModel,
        emitter: &mut CommandEmitter,
    ) {
        match event {
            ContactEvent::Down { id, position, at } => self.on_down(id, position, at, cursor),
            ContactEvent::Move { id, position, at } => {
                self.on_move(id, position, at, cursor, emitter)
            }
            ContactEvent::Up { id, at, .. } => self.on_up(id, at, cursor, emitter),
            ContactEvent::Cancel { id, at } => self.on_cancel(id, at, cursor),
        }
    }

    /// Forces the machine to a clean terminal state (mode switch).
    ///
    /// Releases both sticky toggles with exactly one key-up each; calling it
    /// again is a no-op. Deferred button-ups are the emitter's to flush.
    pub fn deactivate(&mut self, cursor: &mut CursorPositionModel, emitter: &mut CommandEmitter) {
        if self.look_lock {
            self.look_lock = false;
            let key = self.tuning.look_lock_key.clone();
            emitter.key(&key, PressAction::Up);
        }
        if self.wheel_select {
            self.wheel_select = false;
            let key = self.tuning.wheel_select_key.clone();
            emitter.key(&key, PressAction::Up);
        }
        self.phase = GamepadPhase::Idle;
        cursor.end_interaction();
    }

    /// Whether the machine is between interactions.
    pub fn is_idle(&self) -> bool {
        matches!(self.phase, GamepadPhase::Idle)
    }

    // ── Contact down ──────────────────────────────────────────────────────────

    fn on_down(
        &mut self,
        id: ContactId,
        position: SurfacePoint,
        at: Instant,
        cursor: &mut CursorPositionModel,
    ) {
        match &mut self.phase {
            GamepadPhase::Idle => {
                cursor.begin_interaction();
                self.phase = GamepadPhase::Swipe(SwipeState {
                    contact: TrackedContact::new(id, position, at),
                    moved: false,
                    last_send: None,
                });
            }
            GamepadPhase::Swipe(state) => {
                // Promote to pinch. The swipe tracking is abandoned without a
                // release: a pan is not a button gesture.
                let first = state.contact;
                let second = TrackedContact::new(id, position, at);
                let distance = first.position.distance_to(second.position);
                self.phase = GamepadPhase::Pinch(PinchState {
                    first,
                    second,
                    last_distance: distance,
                    last_send: None,
                });
            }
            GamepadPhase::Pinch(_) => {
                debug!(%id, "third contact ignored during pinch");
            }
        }
    }

    // ── Contact move ──────────────────────────────────────────────────────────

    fn on_move(
        &mut self,
        id: ContactId,
        position: SurfacePoint,
        at: Instant,
        cursor: &mut CursorPositionModel,
        emitter: &mut CommandEmitter,
    ) {
        let pointer_active = self.pointer_active();
        match &mut self.phase {
            GamepadPhase::Swipe(state) if state.contact.id == id => {
                let throttled = state
                    .last_send
                    .is_some_and(|t| at.duration_since(t) < self.tuning.min_send_interval);
                if throttled {
                    // Track the position but drop the movement; the next
                    // unthrottled sample computes its delta from here.
                    state.contact.advance(position);
                    return;
                }
                state.last_send = Some(at);

                let (raw_dx, raw_dy) = state.contact.advance(position);
                if !state.moved
                    && state.contact.displacement_from_start() > self.tuning.move_threshold
                {
                    state.moved = true;
                }

                if pointer_active {
                    let dx = raw_dx * self.tuning.pointer_sensitivity;
                    let dy = raw_dy * self.tuning.pointer_sensitivity;
                    if dx.abs() > self.tuning.min_move_output
                        || dy.abs() > self.tuning.min_move_output
                    {
                        cursor.nudge(dx, dy);
                        // Pre-scaled screen-space delta: not raw-filtered.
                        emitter.pointer_move_relative(dx, dy, false);
                    }
                } else {
                    let scale = self.tuning.camera_sensitivity / CAMERA_SENSITIVITY_BASELINE;
                    let dx = raw_dx * scale;
                    let dy = raw_dy * scale;
                    if dx.abs() > self.tuning.min_move_output
                        || dy.abs() > self.tuning.min_move_output
                    {
                        // Raw device delta: the remote side applies its own
                        // look curve.
                        emitter.pointer_move_relative(dx, dy, true);
                    }
                }
            }

            GamepadPhase::Pinch(state) if state.first.id == id || state.second.id == id => {
                if state.first.id == id {
                    state.first.advance(position);
                } else {
                    state.second.advance(position);
                }
                let distance = state.first.position.distance_to(state.second.position);

                let throttled = state
                    .last_send
                    .is_some_and(|t| at.duration_since(t) < self.tuning.min_send_interval);
                if throttled {
                    // Re-anchor so throttled spread is dropped, not banked.
                    state.last_distance = distance;
                    return;
                }
                state.last_send = Some(at);

                let delta = distance - state.last_distance;
                state.last_distance = distance;

                // While pointer-active, pinch motion is suppressed so zoom
                // cannot be conflated with cursor placement.
                if !pointer_active {
                    let limit = self.tuning.zoom_step_limit;
                    let zoom = ((delta * self.tuning.pinch_sensitivity).round() as i32)
                        .clamp(-limit, limit);
                    if zoom != 0 {
                        emitter.scroll(0, zoom);
                    }
                }
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
        at: Instant,
        cursor: &mut CursorPositionModel,
        emitter: &mut CommandEmitter,
    ) {
        let pointer_active = self.pointer_active();
        match &mut self.phase {
            GamepadPhase::Swipe(state) if state.contact.id == id => {
                let duration = at.duration_since(state.contact.pressed_at);
                if pointer_active && !state.moved && duration < self.tuning.tap_window {
                    emitter.tap(PointerButton::Left, at, self.tuning.click_hold);
                    if self.wheel_select {
                        // Clicking with the wheel selector open commits the
                        // selection: the toggle's key follows the button up.
                        self.wheel_select = false;
                        let key = self.tuning.wheel_select_key.clone();
                        emitter.key_up_after(&key, at, self.tuning.click_hold);
                    }
                }
                self.phase = GamepadPhase::Idle;
                cursor.end_interaction();
            }

            GamepadPhase::Pinch(state) if state.first.id == id || state.second.id == id => {
                // Demote to swipe, re-anchored at the survivor's current
                // position and marked moved so the release cannot read as a tap.
                let remaining = if state.first.id == id { state.second } else { state.first };
                self.phase = GamepadPhase::Swipe(SwipeState {
                    contact: TrackedContact::new(remaining.id, remaining.position, at),
                    moved: true,
                    last_send: None,
                });
            }

            _ => {
                debug!(%id, "release for untracked contact ignored");
            }
        }
    }

    // ── Contact cancel ────────────────────────────────────────────────────────

    fn on_cancel(&mut self, id: ContactId, at: Instant, cursor: &mut CursorPositionModel) {
        match &mut self.phase {
            GamepadPhase::Swipe(state) if state.contact.id == id => {
                self.phase = GamepadPhase::Idle;
                cursor.end_interaction();
            }
            GamepadPhase::Pinch(state) if state.first.id == id || state.second.id == id => {
                let remaining = if state.first.id == id { state.second } else { state.first };
                self.phase = GamepadPhase::Swipe(SwipeState {
                    contact: TrackedContact::new(remaining.id, remaining.position, at),
                    moved: true,
                    last_send: None,
                });
            }
            _ => {
                debug!(%id, "cancel for untracked contact ignored");
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::emitter::{CommandSink, SinkError};
    use std::sync::{Arc, Mutex};
    use touchlink_core::domain::geometry::RemoteScreenGeometry;
    use touchlink_core::protocol::commands::{ClientCommand, KeyCommand};

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
        machine: GamepadMachine,
        cursor: CursorPositionModel,
        emitter: CommandEmitter,
        sink: Arc<RecordingSink>,
        epoch: Instant,
    }

    impl Fixture {
        fn new() -> Self {
            let sink = Arc::new(RecordingSink::default());
            let emitter = CommandEmitter::new(Arc::clone(&sink) as Arc<dyn CommandSink>);
            let mut cursor = CursorPositionModel::new(100.0);
            cursor.set_geometry(RemoteScreenGeometry { width: 1920, height: 1080 });
            Self {
                machine: GamepadMachine::new(GamepadTuning::default()),
                cursor,
                emitter,
                sink,
                epoch: Instant::now(),
            }
        }

        fn at(&self, ms: u64) -> Instant {
            self.epoch + Duration::from_millis(ms)
        }

        fn down(&mut self, id: u64, x: f64, y: f64, ms: u64) {
            let event = ContactEvent::Down {
                id: ContactId(id),
                position: SurfacePoint { x, y },
                at: self.at(ms),
            };
            self.machine.handle_event(event, &mut self.cursor, &mut self.emitter);
        }

        fn mv(&mut self, id: u64, x: f64, y: f64, ms: u64) {
            let event = ContactEvent::Move {
                id: ContactId(id),
                position: SurfacePoint { x, y },
                at: self.at(ms),
            };
            self.machine.handle_event(event, &mut self.cursor, &mut self.emitter);
        }

        fn up(&mut self, id: u64, x: f64, y: f64, ms: u64) {
            let event = ContactEvent::Up {
                id: ContactId(id),
                position: SurfacePoint { x, y },
                at: self.at(ms),
            };
            self.machine.handle_event(event, &mut self.cursor, &mut self.emitter);
        }

        fn flush(&mut self, ms: u64) {
            self.emitter.flush_due(self.at(ms));
        }

        fn commands(&self) -> Vec<ClientCommand> {
            self.sink.delivered.lock().unwrap().clone()
        }

        fn relative_moves(&self) -> Vec<(f32, f32, bool)> {
            self.commands()
                .iter()
                .filter_map(|c| match c {
                    ClientCommand::PointerMoveRelative(m) => Some((m.dx, m.dy, m.raw)),
                    _ => None,
                })
                .collect()
        }

        fn key_events(&self) -> Vec<(String, PressAction)> {
            self.commands()
                .iter()
                .filter_map(|c| match c {
                    ClientCommand::Key(KeyCommand { key, action }) => {
                        Some((key.clone(), *action))
                    }
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

    // ── Camera swipe ──────────────────────────────────────────────────────────

    #[test]
    fn test_swipe_without_pointer_active_sends_raw_camera_deltas() {
        // Arrange
        let mut f = Fixture::new();
        let before = f.cursor.position();

        // Act
        f.down(1, 500.0, 300.0, 0);
        f.mv(1, 520.0, 310.0, 20);
        f.up(1, 520.0, 310.0, 400);

        // Assert – raw flag set, cursor untouched
        assert_eq!(f.relative_moves(), vec![(20.0, 10.0, true)]);
        assert_eq!(f.cursor.position(), before);
    }

    #[test]
    fn test_camera_sensitivity_scales_against_baseline() {
        let mut f = Fixture::new();
        f.machine.tuning.camera_sensitivity = 15.0; // half the baseline

        f.down(1, 500.0, 300.0, 0);
        f.mv(1, 520.0, 300.0, 20);

        assert_eq!(f.relative_moves(), vec![(10.0, 0.0, true)]);
    }

    #[test]
    fn test_swipe_with_look_lock_drives_the_cursor_instead() {
        // Arrange
        let mut f = Fixture::new();
        f.machine.toggle_look_lock(&mut f.emitter);
        let before = f.cursor.position();

        // Act – 20 px right at 1.5 sensitivity
        f.down(1, 500.0, 300.0, 0);
        f.mv(1, 520.0, 300.0, 20);

        // Assert – scaled, not raw, and the model moved
        assert_eq!(f.relative_moves(), vec![(30.0, 0.0, false)]);
        assert_eq!(f.cursor.position().x, before.x + 30);
    }

    #[test]
    fn test_sub_threshold_deltas_are_not_sent() {
        let mut f = Fixture::new();

        f.down(1, 500.0, 300.0, 0);
        f.mv(1, 500.1, 300.0, 20); // 0.1 px, below min_move_output

        assert!(f.relative_moves().is_empty());
    }

    #[test]
    fn test_rate_gate_drops_intra_window_movement() {
        // Arrange
        let mut f = Fixture::new();

        // Act – two samples inside one 8 ms window, then one outside it
        f.down(1, 500.0, 300.0, 0);
        f.mv(1, 510.0, 300.0, 10); // first sample always passes
        f.mv(1, 530.0, 300.0, 12); // throttled: tracked, not sent
        f.mv(1, 540.0, 300.0, 30); // delta measured from 530, not 510

        // Assert
        assert_eq!(f.relative_moves(), vec![(10.0, 0.0, true), (10.0, 0.0, true)]);
    }

    // ── Tap detection ─────────────────────────────────────────────────────────

    #[test]
    fn test_pointer_active_short_unmoved_release_is_a_tap() {
        // Arrange
        let mut f = Fixture::new();
        f.machine.toggle_look_lock(&mut f.emitter);

        // Act
        f.down(1, 500.0, 300.0, 0);
        f.up(1, 500.0, 300.0, 100);
        f.flush(200);

        // Assert
        let buttons: Vec<_> = f
            .commands()
            .iter()
            .filter_map(|c| match c {
                ClientCommand::PointerButton(b) => Some((b.button, b.action)),
                _ => None,
            })
            .collect();
        assert_eq!(
            buttons,
            vec![
                (PointerButton::Left, PressAction::Down),
                (PointerButton::Left, PressAction::Up),
            ]
        );
    }

    #[test]
    fn test_no_tap_without_pointer_active() {
        let mut f = Fixture::new();

        f.down(1, 500.0, 300.0, 0);
        f.up(1, 500.0, 300.0, 100);
        f.flush(300);

        assert!(f
            .commands()
            .iter()
            .all(|c| !matches!(c, ClientCommand::PointerButton(_))));
    }

    #[test]
    fn test_no_tap_after_significant_movement() {
        let mut f = Fixture::new();
        f.machine.toggle_look_lock(&mut f.emitter);

        f.down(1, 500.0, 300.0, 0);
        f.mv(1, 540.0, 300.0, 30); // 40 px, past the 6 px threshold
        f.up(1, 540.0, 300.0, 100);
        f.flush(300);

        assert!(f
            .commands()
            .iter()
            .all(|c| !matches!(c, ClientCommand::PointerButton(_))));
    }

    #[test]
    fn test_slow_release_is_not_a_tap() {
        let mut f = Fixture::new();
        f.machine.toggle_look_lock(&mut f.emitter);

        f.down(1, 500.0, 300.0, 0);
        f.up(1, 500.0, 300.0, 500); // past the 350 ms window
        f.flush(700);

        assert!(f
            .commands()
            .iter()
            .all(|c| !matches!(c, ClientCommand::PointerButton(_))));
    }

    #[test]
    fn test_tap_with_wheel_select_active_commits_and_releases_the_toggle() {
        // Arrange
        let mut f = Fixture::new();
        f.machine.toggle_wheel_select(&mut f.emitter); // Tab down

        // Act – tap while the wheel selector is open
        f.down(1, 500.0, 300.0, 0);
        f.up(1, 500.0, 300.0, 100);
        f.flush(200);

        // Assert – Tab down, then after the click completes Tab up, toggle clear
        assert_eq!(
            f.key_events(),
            vec![
                ("Tab".to_string(), PressAction::Down),
                ("Tab".to_string(), PressAction::Up),
            ]
        );
        assert!(!f.machine.wheel_select());
    }

    // ── Pinch ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_pinch_spread_emits_clamped_zoom_scroll() {
        // Arrange – two contacts 100 px apart
        let mut f = Fixture::new();
        f.down(1, 400.0, 300.0, 0);
        f.down(2, 500.0, 300.0, 5);

        // Act – spread to 180 px: delta 80 * 0.25 = 20
        f.mv(1, 360.0, 300.0, 30);

        // Assert
        assert_eq!(f.scrolls(), vec![(0, 10)]);
        f.mv(2, 540.0, 300.0, 60);
        assert_eq!(f.scrolls(), vec![(0, 10), (0, 10)]);
    }

    #[test]
    fn test_pinch_zoom_is_clamped_to_step_limit() {
        let mut f = Fixture::new();
        f.down(1, 400.0, 300.0, 0);
        f.down(2, 500.0, 300.0, 5);

        // Violent 1000 px spread in one sample: 1000 * 0.25 = 250 → clamp 80.
        f.mv(1, -600.0, 300.0, 30);

        assert_eq!(f.scrolls(), vec![(0, 80)]);
    }

    #[test]
    fn test_pinch_is_suppressed_while_pointer_active() {
        let mut f = Fixture::new();
        f.machine.toggle_look_lock(&mut f.emitter);

        f.down(1, 400.0, 300.0, 0);
        f.down(2, 500.0, 300.0, 5);
        f.mv(1, 300.0, 300.0, 30);

        assert!(f.scrolls().is_empty());
    }

    #[test]
    fn test_pinch_promotion_abandons_swipe_without_button_release() {
        let mut f = Fixture::new();

        f.down(1, 400.0, 300.0, 0);
        f.mv(1, 420.0, 300.0, 20);
        f.down(2, 500.0, 300.0, 40); // promote
        f.mv(1, 380.0, 300.0, 60);   // pinch motion, not camera

        // One camera move from the swipe phase, then only scrolls.
        assert_eq!(f.relative_moves().len(), 1);
        assert!(f
            .commands()
            .iter()
            .all(|c| !matches!(c, ClientCommand::PointerButton(_))));
    }

    #[test]
    fn test_pinch_demotes_to_moved_swipe_and_never_taps() {
        // Arrange – pinch, release one finger, then quickly release the other
        let mut f = Fixture::new();
        f.machine.toggle_look_lock(&mut f.emitter);

        f.down(1, 400.0, 300.0, 0);
        f.down(2, 500.0, 300.0, 5);
        f.up(1, 400.0, 300.0, 50);
        f.up(2, 500.0, 300.0, 120); // short and unmoved, but post-pinch
        f.flush(400);

        // Assert – no synthesized click after a pinch
        assert!(f
            .commands()
            .iter()
            .all(|c| !matches!(c, ClientCommand::PointerButton(_))));
        assert!(f.machine.is_idle());
    }

    // ── Toggles and cleanup ───────────────────────────────────────────────────

    #[test]
    fn test_toggle_look_lock_emits_key_down_then_up() {
        let mut f = Fixture::new();

        f.machine.toggle_look_lock(&mut f.emitter);
        f.machine.toggle_look_lock(&mut f.emitter);

        assert_eq!(
            f.key_events(),
            vec![
                ("Alt".to_string(), PressAction::Down),
                ("Alt".to_string(), PressAction::Up),
            ]
        );
    }

    #[test]
    fn test_deactivate_releases_active_toggles_exactly_once() {
        // Arrange – both toggles held
        let mut f = Fixture::new();
        f.machine.toggle_look_lock(&mut f.emitter);
        f.machine.toggle_wheel_select(&mut f.emitter);

        // Act – cleanup twice in a row
        f.machine.deactivate(&mut f.cursor, &mut f.emitter);
        f.machine.deactivate(&mut f.cursor, &mut f.emitter);

        // Assert – one up per key despite the double call
        let ups: Vec<_> = f
            .key_events()
            .into_iter()
            .filter(|(_, a)| *a == PressAction::Up)
            .collect();
        assert_eq!(
            ups,
            vec![
                ("Alt".to_string(), PressAction::Up),
                ("Tab".to_string(), PressAction::Up),
            ]
        );
        assert!(!f.machine.pointer_active());
    }

    #[test]
    fn test_deactivate_with_no_toggles_emits_nothing() {
        let mut f = Fixture::new();
        f.machine.deactivate(&mut f.cursor, &mut f.emitter);
        assert!(f.commands().is_empty());
    }

    #[test]
    fn test_orphaned_events_are_ignored() {
        let mut f = Fixture::new();
        f.mv(9, 100.0, 100.0, 10);
        f.up(9, 100.0, 100.0, 20);
        assert!(f.commands().is_empty());
        assert!(f.machine.is_idle());
    }
}
