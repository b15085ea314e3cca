//! MySQL wire protocol: constants, message types, framing and codecs
//!
//! Packets are framed with a 3-byte little-endian payload length and a
//! 1-byte sequence id. All multi-byte integers on the wire are little-endian;
//! the binlog time types are the one big-endian exception and are handled in
//! `crate::binlog`.

pub mod constants;
mod decode;
mod encode;
mod message;

pub use decode::{decode_frame, decode_handshake, decode_response};
pub use encode::encode_message;
pub use message::{ClientMessage, Frame, Handshake, OkPacket, ServerError, ServerMessage};

pub(crate) use decode::Reader;
