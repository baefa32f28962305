//! Protocol module containing command records and the binary codec.

pub mod codec;
pub mod commands;

pub use codec::{decode_command, encode_command, CodecError, DecodedCommand};
pub use commands::*;
