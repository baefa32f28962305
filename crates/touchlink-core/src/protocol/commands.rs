//! Outbound command records and inbound server reports.
//!
//! Commands are the whole vocabulary the gesture engine is allowed to speak:
//! everything a gesture machine decides is eventually expressed as exactly one
//! of these records and handed to the transport. Inbound traffic is limited to
//! the two reports the session core consumes; the rest of the wire catalog
//! belongs to the transport collaborator.

use serde::{Deserialize, Serialize};

// ── Protocol constants ────────────────────────────────────────────────────────

/// Current command-stream version byte.
pub const COMMAND_VERSION: u8 = 0x01;

/// Total size of the common command header in bytes.
pub const HEADER_SIZE: usize = 16;

// ── Command type codes ────────────────────────────────────────────────────────

/// All command type codes carried in the header's type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum CommandType {
    PointerMoveRelative = 0x01,
    PointerMoveAbsolute = 0x02,
    PointerButton = 0x03,
    Scroll = 0x04,
    Key = 0x05,
    StickVector = 0x06,
    ModeChanged = 0x07,
}

impl TryFrom<u8> for CommandType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(CommandType::PointerMoveRelative),
            0x02 => Ok(CommandType::PointerMoveAbsolute),
            0x03 => Ok(CommandType::PointerButton),
            0x04 => Ok(CommandType::Scroll),
            0x05 => Ok(CommandType::Key),
            0x06 => Ok(CommandType::StickVector),
            0x07 => Ok(CommandType::ModeChanged),
            _ => Err(()),
        }
    }
}

// ── Field enums ───────────────────────────────────────────────────────────────

/// Pointer button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum PointerButton {
    Left = 0x01,
    Right = 0x02,
    Middle = 0x03,
}

impl TryFrom<u8> for PointerButton {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(PointerButton::Left),
            0x02 => Ok(PointerButton::Right),
            0x03 => Ok(PointerButton::Middle),
            _ => Err(()),
        }
    }
}

/// Press or release half of a button/key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum PressAction {
    Down = 0x01,
    Up = 0x02,
}

impl TryFrom<u8> for PressAction {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(PressAction::Down),
            0x02 => Ok(PressAction::Up),
            _ => Err(()),
        }
    }
}

/// The exclusive input interpretation modes the client can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum InputMode {
    Touchpad = 0x01,
    Gamepad = 0x02,
    Keyboard = 0x03,
}

impl TryFrom<u8> for InputMode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(InputMode::Touchpad),
            0x02 => Ok(InputMode::Gamepad),
            0x03 => Ok(InputMode::Keyboard),
            _ => Err(()),
        }
    }
}

/// Names the virtual stick a vector belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum StickId {
    /// Movement stick (WASD-style on the remote side).
    Movement = 0x01,
    /// Pointer-emulating stick.
    Pointer = 0x02,
}

impl TryFrom<u8> for StickId {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(StickId::Movement),
            0x02 => Ok(StickId::Pointer),
            _ => Err(()),
        }
    }
}

// ── Per-command payload structs ───────────────────────────────────────────────

/// POINTER_MOVE_RELATIVE (0x01): relative pointer delta.
///
/// `raw` distinguishes camera-look deltas (the remote side applies its own
/// look curve) from already-scaled screen-space deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerMoveRelativeCommand {
    /// Horizontal delta. Positive is rightward.
    pub dx: f32,
    /// Vertical delta. Positive is downward.
    pub dy: f32,
    /// `true` when the delta is a raw device delta for the remote look curve;
    /// `false` when it is a pre-scaled screen-space delta.
    pub raw: bool,
}

/// POINTER_MOVE_ABSOLUTE (0x02): absolute pointer position in remote-screen space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerMoveAbsoluteCommand {
    pub x: i32,
    pub y: i32,
}

/// POINTER_BUTTON (0x03): pointer button press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerButtonCommand {
    pub button: PointerButton,
    pub action: PressAction,
}

/// SCROLL (0x04): two-axis wheel scroll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollCommand {
    /// Horizontal scroll amount (signed; positive = right).
    pub dx: i32,
    /// Vertical scroll amount (signed; positive = up/away from user).
    pub dy: i32,
}

/// KEY (0x05): keyboard press or release, key carried by name.
///
/// Key enumeration/layout lives entirely in the surface layer; the gesture
/// core only needs stable names (the sticky toggles reference keys by the
/// same names the surface sends).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCommand {
    pub key: String,
    pub action: PressAction,
}

/// STICK_VECTOR (0x06): normalized analog stick vector, one per named stick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickVectorCommand {
    pub stick: StickId,
    /// Normalized horizontal axis in `[-1, 1]`.
    pub x: f32,
    /// Normalized vertical axis in `[-1, 1]`.
    pub y: f32,
}

/// MODE_CHANGED (0x07): notifies the remote side of an input-mode switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeChangedCommand {
    pub mode: InputMode,
}

// ── Top-level command enum ────────────────────────────────────────────────────

/// All outbound commands, discriminated by type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientCommand {
    PointerMoveRelative(PointerMoveRelativeCommand),
    PointerMoveAbsolute(PointerMoveAbsoluteCommand),
    PointerButton(PointerButtonCommand),
    Scroll(ScrollCommand),
    Key(KeyCommand),
    StickVector(StickVectorCommand),
    ModeChanged(ModeChangedCommand),
}

impl ClientCommand {
    /// Returns the [`CommandType`] discriminant for this command.
    pub fn command_type(&self) -> CommandType {
        match self {
            ClientCommand::PointerMoveRelative(_) => CommandType::PointerMoveRelative,
            ClientCommand::PointerMoveAbsolute(_) => CommandType::PointerMoveAbsolute,
            ClientCommand::PointerButton(_) => CommandType::PointerButton,
            ClientCommand::Scroll(_) => CommandType::Scroll,
            ClientCommand::Key(_) => CommandType::Key,
            ClientCommand::StickVector(_) => CommandType::StickVector,
            ClientCommand::ModeChanged(_) => CommandType::ModeChanged,
        }
    }
}

// ── Inbound server reports ────────────────────────────────────────────────────

/// Session-established report: the server handshake announcing remote screen
/// dimensions. Arrives once per session; a repeat replaces the geometry
/// wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEstablished {
    pub screen_width: u32,
    pub screen_height: u32,
}

/// Periodic authoritative pointer position report from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionReport {
    pub x: i32,
    pub y: i32,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
