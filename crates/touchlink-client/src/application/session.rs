//! InputSession: per-session context object and mode controller.
//!
//! One session owns everything one connected surface needs: the exclusive
//! input mode, both gesture machines, the reconciled cursor model, the
//! virtual sticks, and the command emitter. Nothing here is process-global,
//! so several sessions can coexist without cross-talk.
//!
//! The session is also where the concurrency discipline lives: contact
//! events, timer ticks, and server reports all pass through `&mut self`
//! methods, giving the cursor model a single writer per phase – the
//! reconciliation poll while idle, the active gesture machine while an
//! interaction is live.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};
use uuid::Uuid;

use touchlink_core::domain::contact::ContactEvent;
use touchlink_core::domain::cursor::CursorPositionModel;
use touchlink_core::domain::geometry::{RemotePoint, SurfacePoint};
use touchlink_core::domain::stick::{PointerEcho, VirtualStick};
use touchlink_core::protocol::commands::{
    InputMode, PositionReport, PressAction, SessionEstablished, StickId,
};

use crate::application::emitter::{CommandEmitter, CommandSink};
use crate::application::gamepad::{GamepadMachine, GamepadTuning};
use crate::application::touchpad::{TouchpadMachine, TouchpadTuning};

/// Everything tunable about a session, assembled from the config file.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub touchpad: TouchpadTuning,
    pub gamepad: GamepadTuning,
    /// Surface-space displacement mapping to full stick deflection.
    pub stick_max_radius: f64,
    /// Deadzone fraction shared by all sticks.
    pub stick_deadzone: f64,
    /// Remote pixels per sample at full deflection for the pointer stick echo.
    pub pointer_stick_gain: f64,
    /// Reconciliation drift threshold in remote pixels.
    pub drift_threshold: f64,
    /// The caps-lock-style key that toggles instead of emitting up halves.
    pub sticky_key: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            touchpad: TouchpadTuning::default(),
            gamepad: GamepadTuning::default(),
            stick_max_radius: 90.0,
            stick_deadzone: 0.2,
            pointer_stick_gain: 12.0,
            drift_threshold: 100.0,
            sticky_key: "CapsLock".to_string(),
        }
    }
}

/// The inbound event vocabulary the session consumes. The surface layer and
/// the transport collaborator both feed this through one queue so handlers
/// run to completion in arrival order.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Raw contact lifecycle event for the active gesture machine.
    Contact(ContactEvent),
    /// Contact lifecycle event bound to a named virtual stick.
    Stick { stick: StickId, event: ContactEvent },
    /// Key press/release from the surface (keyboard mode or gamepad buttons).
    Key { key: String, action: PressAction },
    /// Exclusive mode switch.
    SetMode(InputMode),
    /// Look-lock modifier toggle (gamepad mode).
    ToggleLookLock,
    /// Wheel-select modifier toggle (gamepad mode).
    ToggleWheelSelect,
    /// Places a stick base at a surface position (UI layout).
    ArmStick { stick: StickId, center: SurfacePoint },
    /// Server handshake with remote screen dimensions.
    SessionEstablished(SessionEstablished),
    /// Periodic authoritative pointer position.
    PositionReport(PositionReport),
}

/// One connected control session.
pub struct InputSession {
    id: Uuid,
    mode: InputMode,
    cursor: CursorPositionModel,
    emitter: CommandEmitter,
    touchpad: TouchpadMachine,
    gamepad: GamepadMachine,
    movement_stick: Option<VirtualStick>,
    pointer_stick: Option<VirtualStick>,
    pointer_echo: Option<PointerEcho>,
    stick_max_radius: f64,
    stick_deadzone: f64,
    pointer_stick_gain: f64,
    sticky_key: String,
    sticky_latched: bool,
}

impl InputSession {
    /// Creates a session in touchpad mode. Gesture machines stay unarmed
    /// until a session-established report provides screen geometry.
    pub fn new(sink: Arc<dyn CommandSink>, settings: SessionSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode: InputMode::Touchpad,
            cursor: CursorPositionModel::new(settings.drift_threshold),
            emitter: CommandEmitter::new(sink),
            touchpad: TouchpadMachine::new(settings.touchpad),
            gamepad: GamepadMachine::new(settings.gamepad),
            movement_stick: None,
            pointer_stick: None,
            pointer_echo: None,
            stick_max_radius: settings.stick_max_radius,
            stick_deadzone: settings.stick_deadzone,
            pointer_stick_gain: settings.pointer_stick_gain,
            sticky_key: settings.sticky_key,
            sticky_latched: false,
        }
    }

    /// Unique id of this session.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Currently active input mode.
    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// Current predicted cursor position (for the display layer).
    pub fn cursor_position(&self) -> RemotePoint {
        self.cursor.position()
    }

    /// Whether an uncorrected mid-interaction drift has been observed.
    pub fn drift_flagged(&self) -> bool {
        self.cursor.drift_flagged()
    }

    /// Whether the position poll should run: only between interactions, so
    /// the poll never writes the cursor model while a gesture owns it.
    pub fn should_poll_position(&self) -> bool {
        !self.cursor.interaction_active()
    }

    /// Dispatches one inbound event.
    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Contact(contact) => self.handle_contact(contact),
            SessionEvent::Stick { stick, event } => self.handle_stick(stick, event),
            SessionEvent::Key { key, action } => self.handle_key(&key, action),
            SessionEvent::SetMode(mode) => self.set_mode(mode),
            SessionEvent::ToggleLookLock => self.toggle_look_lock(),
            SessionEvent::ToggleWheelSelect => self.toggle_wheel_select(),
            SessionEvent::ArmStick { stick, center } => self.arm_stick(stick, center),
            SessionEvent::SessionEstablished(report) => self.handle_session_established(report),
            SessionEvent::PositionReport(report) => self.handle_position_report(report),
        }
    }

    /// Routes a raw contact event to the active gesture machine.
    ///
    /// Contacts arriving before the session-established report are dropped:
    /// no machine may run without screen geometry.
    pub fn handle_contact(&mut self, event: ContactEvent) {
        if !self.cursor.has_geometry() {
            warn!(session = %self.id, "contact before session established; dropped");
            return;
        }
        match self.mode {
            InputMode::Touchpad => {
                self.touchpad.handle_event(event, &mut self.cursor, &mut self.emitter)
            }
            InputMode::Gamepad => {
                self.gamepad.handle_event(event, &mut self.cursor, &mut self.emitter)
            }
            InputMode::Keyboard => {
                // Keyboard mode has no gesture machine.
                debug!(session = %self.id, "contact ignored in keyboard mode");
            }
        }
    }

    /// Forwards a key press 1:1, except the sticky key, which toggles local
    /// state, emits a key-down per press, and never emits an up.
    pub fn handle_key(&mut self, key: &str, action: PressAction) {
        if key == self.sticky_key {
            match action {
                PressAction::Down => {
                    self.sticky_latched = !self.sticky_latched;
                    self.emitter.key(key, PressAction::Down);
                }
                PressAction::Up => { /* the sticky key holds its state */ }
            }
            return;
        }
        self.emitter.key(key, action);
    }

    /// Whether the sticky key is currently latched.
    pub fn sticky_latched(&self) -> bool {
        self.sticky_latched
    }

    /// Switches the exclusive input mode.
    ///
    /// The previous machine is forced to a clean terminal state before the
    /// new one becomes reachable, and the deferred queue is flushed so no
    /// button-down survives the switch without its up.
    pub fn set_mode(&mut self, mode: InputMode) {
        if mode == self.mode {
            return;
        }
        match self.mode {
            InputMode::Touchpad => self.touchpad.deactivate(&mut self.cursor, &mut self.emitter),
            InputMode::Gamepad => {
                self.gamepad.deactivate(&mut self.cursor, &mut self.emitter);
                self.release_sticks();
            }
            InputMode::Keyboard => {}
        }
        self.emitter.flush_all();
        self.mode = mode;
        self.emitter.mode_changed(mode);
        info!(session = %self.id, ?mode, "input mode changed");
    }

    /// Toggles the look-lock modifier. Only meaningful in gamepad mode.
    pub fn toggle_look_lock(&mut self) {
        if self.mode != InputMode::Gamepad {
            debug!(session = %self.id, "look-lock toggle outside gamepad mode ignored");
            return;
        }
        self.gamepad.toggle_look_lock(&mut self.emitter);
    }

    /// Toggles the wheel-select modifier. Only meaningful in gamepad mode.
    pub fn toggle_wheel_select(&mut self) {
        if self.mode != InputMode::Gamepad {
            debug!(session = %self.id, "wheel-select toggle outside gamepad mode ignored");
            return;
        }
        self.gamepad.toggle_wheel_select(&mut self.emitter);
    }

    /// Places (or re-places) a stick base at a surface position.
    pub fn arm_stick(&mut self, stick: StickId, center: SurfacePoint) {
        let instance = VirtualStick::new(center, self.stick_max_radius, self.stick_deadzone);
        match stick {
            StickId::Movement => self.movement_stick = Some(instance),
            StickId::Pointer => {
                self.pointer_stick = Some(instance);
                self.pointer_echo = self
                    .cursor
                    .geometry()
                    .map(|g| PointerEcho::new(g, self.pointer_stick_gain));
            }
        }
    }

    /// Routes a contact event bound to a named stick.
    pub fn handle_stick(&mut self, stick: StickId, event: ContactEvent) {
        if self.mode != InputMode::Gamepad {
            debug!(session = %self.id, "stick event outside gamepad mode ignored");
            return;
        }
        if !self.cursor.has_geometry() {
            warn!(session = %self.id, "stick event before session established; dropped");
            return;
        }
        let instance = match stick {
            StickId::Movement => self.movement_stick.as_mut(),
            StickId::Pointer => self.pointer_stick.as_mut(),
        };
        let Some(instance) = instance else {
            debug!(session = %self.id, ?stick, "event for unarmed stick ignored");
            return;
        };

        let output = match event {
            ContactEvent::Down { id, position, .. } => instance.engage(id, position),
            ContactEvent::Move { id, position, .. } => instance.update(id, position),
            ContactEvent::Up { id, .. } | ContactEvent::Cancel { id, .. } => instance.release(id),
        };
        if let Some(output) = output {
            self.emitter.stick_vector(stick, output.x, output.y);
            if stick == StickId::Pointer {
                if let Some(echo) = self.pointer_echo.as_mut() {
                    echo.apply(output);
                }
            }
        }
    }

    /// Display feedback position of the pointer stick, if armed.
    pub fn pointer_echo_position(&self) -> Option<RemotePoint> {
        self.pointer_echo.as_ref().map(|e| e.position())
    }

    /// Advances deferred work: the touchpad's pending click and the
    /// emitter's deferred button-ups.
    pub fn on_tick(&mut self, now: Instant) {
        if self.mode == InputMode::Touchpad {
            self.touchpad.on_tick(now, &mut self.emitter);
        }
        self.emitter.flush_due(now);
    }

    /// Applies a session-established report: installs geometry and arms the
    /// gesture machines.
    pub fn handle_session_established(&mut self, report: SessionEstablished) {
        info!(
            session = %self.id,
            width = report.screen_width,
            height = report.screen_height,
            "session established"
        );
        self.cursor.set_geometry(touchlink_core::domain::geometry::RemoteScreenGeometry {
            width: report.screen_width,
            height: report.screen_height,
        });
    }

    /// Feeds a periodic server position report into reconciliation.
    pub fn handle_position_report(&mut self, report: PositionReport) {
        if !self.cursor.has_geometry() {
            debug!(session = %self.id, "position report before session established; dropped");
            return;
        }
        self.cursor.reconcile(report.x, report.y);
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    /// Emits one neutral vector for every engaged stick so nothing keeps
    /// "walking" after the mode switch. The instances are dropped; the UI
    /// re-arms sticks when it lays out gamepad mode again.
    fn release_sticks(&mut self) {
        if self.movement_stick.as_ref().is_some_and(VirtualStick::is_engaged) {
            self.emitter.stick_vector(StickId::Movement, 0.0, 0.0);
            self.movement_stick = None;
        }
        if self.pointer_stick.as_ref().is_some_and(VirtualStick::is_engaged) {
            self.emitter.stick_vector(StickId::Pointer, 0.0, 0.0);
            self.pointer_stick = None;
            self.pointer_echo = None;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
