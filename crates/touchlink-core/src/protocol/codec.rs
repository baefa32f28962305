//! Binary codec for the outbound command stream.
//!
//! Wire format:
//! ```text
//! [version:1][cmd_type:1][reserved:2][payload_len:4][sequence:8][payload:N]
//! ```
//! Total header size: 16 bytes. All multi-byte integers are big-endian.

use crate::protocol::commands::{
    ClientCommand, CommandType, InputMode, KeyCommand, ModeChangedCommand, PointerButton,
    PointerButtonCommand, PointerMoveAbsoluteCommand, PointerMoveRelativeCommand, PressAction,
    ScrollCommand, StickId, StickVectorCommand, COMMAND_VERSION, HEADER_SIZE,
};
use thiserror::Error;

/// Errors that can occur during command encoding or decoding.
#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    /// The byte slice is shorter than the minimum required length.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The command type byte in the header is not a recognized value.
    #[error("unknown command type: 0x{0:02X}")]
    UnknownCommandType(u8),

    /// The version in the header is not supported.
    #[error("unsupported command-stream version: {0}")]
    UnsupportedVersion(u8),

    /// The payload could not be parsed (field value out of range, UTF-8 error, etc.).
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The encoded payload length field does not match the actual data available.
    #[error("payload length mismatch: header says {declared}, available is {available}")]
    PayloadLengthMismatch { declared: usize, available: usize },
}

/// A command decoded from the wire, together with its header fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCommand {
    pub command: ClientCommand,
    /// Sequence number stamped by the sender's emitter.
    pub sequence: u64,
    /// Total bytes consumed (header + payload), so the caller can advance.
    pub consumed: usize,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`ClientCommand`] into a byte vector including the 16-byte header.
///
/// The sequence number is stamped by the emitter, not generated here.
///
/// # Examples
///
/// ```rust
/// use touchlink_core::protocol::codec::{decode_command, encode_command};
/// use touchlink_core::protocol::commands::{ClientCommand, ScrollCommand};
///
/// let cmd = ClientCommand::Scroll(ScrollCommand { dx: 0, dy: 40 });
/// let bytes = encode_command(&cmd, 7);
/// let decoded = decode_command(&bytes).unwrap();
/// assert_eq!(decoded.command, cmd);
/// assert_eq!(decoded.sequence, 7);
/// assert_eq!(decoded.consumed, bytes.len());
/// ```
pub fn encode_command(cmd: &ClientCommand, sequence: u64) -> Vec<u8> {
    let payload = encode_payload(cmd);
    let payload_len = payload.len() as u32;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.push(COMMAND_VERSION);
    buf.push(cmd.command_type() as u8);
    buf.push(0x00); // reserved
    buf.push(0x00); // reserved
    buf.extend_from_slice(&payload_len.to_be_bytes());
    buf.extend_from_slice(&sequence.to_be_bytes());
    buf.extend_from_slice(&payload);
    buf
}

/// Decodes one command from the beginning of `bytes`.
///
/// # Errors
///
/// Returns [`CodecError`] if the bytes are malformed.
pub fn decode_command(bytes: &[u8]) -> Result<DecodedCommand, CodecError> {
    if bytes.len() < HEADER_SIZE {
        return Err(CodecError::InsufficientData {
            needed: HEADER_SIZE,
            available: bytes.len(),
        });
    }

    let version = bytes[0];
    if version != COMMAND_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let type_byte = bytes[1];
    let cmd_type =
        CommandType::try_from(type_byte).map_err(|_| CodecError::UnknownCommandType(type_byte))?;

    // bytes[2..4] are reserved – ignored on decode

    let payload_len = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    let sequence = u64::from_be_bytes([
        bytes[8], bytes[9], bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15],
    ]);

    let total_needed = HEADER_SIZE + payload_len;
    if bytes.len() < total_needed {
        return Err(CodecError::PayloadLengthMismatch {
            declared: payload_len,
            available: bytes.len() - HEADER_SIZE,
        });
    }

    let payload = &bytes[HEADER_SIZE..total_needed];
    let command = decode_payload(cmd_type, payload)?;
    Ok(DecodedCommand {
        command,
        sequence,
        consumed: total_needed,
    })
}

// ── Payload encoding ──────────────────────────────────────────────────────────

fn encode_payload(cmd: &ClientCommand) -> Vec<u8> {
    let mut buf = Vec::new();
    match cmd {
        ClientCommand::PointerMoveRelative(c) => {
            buf.extend_from_slice(&c.dx.to_be_bytes());
            buf.extend_from_slice(&c.dy.to_be_bytes());
            buf.push(c.raw as u8);
        }
        ClientCommand::PointerMoveAbsolute(c) => {
            buf.extend_from_slice(&c.x.to_be_bytes());
            buf.extend_from_slice(&c.y.to_be_bytes());
        }
        ClientCommand::PointerButton(c) => {
            buf.push(c.button as u8);
            buf.push(c.action as u8);
        }
        ClientCommand::Scroll(c) => {
            buf.extend_from_slice(&c.dx.to_be_bytes());
            buf.extend_from_slice(&c.dy.to_be_bytes());
        }
        ClientCommand::Key(c) => {
            let name = c.key.as_bytes();
            buf.extend_from_slice(&(name.len() as u16).to_be_bytes());
            buf.extend_from_slice(name);
            buf.push(c.action as u8);
        }
        ClientCommand::StickVector(c) => {
            buf.push(c.stick as u8);
            buf.extend_from_slice(&c.x.to_be_bytes());
            buf.extend_from_slice(&c.y.to_be_bytes());
        }
        ClientCommand::ModeChanged(c) => {
            buf.push(c.mode as u8);
        }
    }
    buf
}

// ── Payload decoding ──────────────────────────────────────────────────────────

fn decode_payload(cmd_type: CommandType, payload: &[u8]) -> Result<ClientCommand, CodecError> {
    match cmd_type {
        CommandType::PointerMoveRelative => {
            require_len(payload, 9, "PointerMoveRelative")?;
            Ok(ClientCommand::PointerMoveRelative(PointerMoveRelativeCommand {
                dx: read_f32(payload, 0)?,
                dy: read_f32(payload, 4)?,
                raw: payload[8] != 0,
            }))
        }
        CommandType::PointerMoveAbsolute => {
            require_len(payload, 8, "PointerMoveAbsolute")?;
            Ok(ClientCommand::PointerMoveAbsolute(PointerMoveAbsoluteCommand {
                x: read_i32(payload, 0)?,
                y: read_i32(payload, 4)?,
            }))
        }
        CommandType::PointerButton => {
            require_len(payload, 2, "PointerButton")?;
            let button = PointerButton::try_from(payload[0]).map_err(|_| {
                CodecError::MalformedPayload(format!("unknown pointer button: {}", payload[0]))
            })?;
            let action = PressAction::try_from(payload[1]).map_err(|_| {
                CodecError::MalformedPayload(format!("unknown press action: {}", payload[1]))
            })?;
            Ok(ClientCommand::PointerButton(PointerButtonCommand { button, action }))
        }
        CommandType::Scroll => {
            require_len(payload, 8, "Scroll")?;
            Ok(ClientCommand::Scroll(ScrollCommand {
                dx: read_i32(payload, 0)?,
                dy: read_i32(payload, 4)?,
            }))
        }
        CommandType::Key => {
            require_len(payload, 3, "Key")?;
            let name_len = u16::from_be_bytes([payload[0], payload[1]]) as usize;
            require_len(payload, 2 + name_len + 1, "Key")?;
            let key = std::str::from_utf8(&payload[2..2 + name_len])
                .map_err(|e| CodecError::MalformedPayload(format!("key name not UTF-8: {e}")))?
                .to_string();
            let action = PressAction::try_from(payload[2 + name_len]).map_err(|_| {
                CodecError::MalformedPayload(format!(
                    "unknown press action: {}",
                    payload[2 + name_len]
                ))
            })?;
            Ok(ClientCommand::Key(KeyCommand { key, action }))
        }
        CommandType::StickVector => {
            require_len(payload, 9, "StickVector")?;
            let stick = StickId::try_from(payload[0]).map_err(|_| {
                CodecError::MalformedPayload(format!("unknown stick id: {}", payload[0]))
            })?;
            Ok(ClientCommand::StickVector(StickVectorCommand {
                stick,
                x: read_f32(payload, 1)?,
                y: read_f32(payload, 5)?,
            }))
        }
        CommandType::ModeChanged => {
            require_len(payload, 1, "ModeChanged")?;
            let mode = InputMode::try_from(payload[0]).map_err(|_| {
                CodecError::MalformedPayload(format!("unknown input mode: {}", payload[0]))
            })?;
            Ok(ClientCommand::ModeChanged(ModeChangedCommand { mode }))
        }
    }
}

// ── Read helpers ──────────────────────────────────────────────────────────────

fn require_len(payload: &[u8], needed: usize, what: &str) -> Result<(), CodecError> {
    if payload.len() < needed {
        return Err(CodecError::MalformedPayload(format!(
            "{what} payload too short: need {needed}, got {}",
            payload.len()
        )));
    }
    Ok(())
}

fn read_i32(payload: &[u8], offset: usize) -> Result<i32, CodecError> {
    let bytes: [u8; 4] = payload
        .get(offset..offset + 4)
        .and_then(|s| s.try_into().ok())
        .ok_or(CodecError::InsufficientData {
            needed: offset + 4,
            available: payload.len(),
        })?;
    Ok(i32::from_be_bytes(bytes))
}

fn read_f32(payload: &[u8], offset: usize) -> Result<f32, CodecError> {
    let bytes: [u8; 4] = payload
        .get(offset..offset + 4)
        .and_then(|s| s.try_into().ok())
        .ok_or(CodecError::InsufficientData {
            needed: offset + 4,
            available: payload.len(),
        })?;
    Ok(f32::from_be_bytes(bytes))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
