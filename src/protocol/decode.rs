//! Protocol frame and payload decoding

use super::constants::{auth_plugin, capability, response};
use super::message::{Frame, Handshake, OkPacket, ServerError, ServerMessage};
use crate::{Error, Result};
use bytes::{Bytes, BytesMut};
use std::io;

/// Maximum frame payload (16 MB - 1), the hard limit of the 3-byte length field.
///
/// A length above this in the header means the buffer is corrupt, not that a
/// larger message is in flight.
const MAX_FRAME_LENGTH: usize = 0x00FF_FFFF;

/// Decode one frame from the read buffer without copying the payload.
///
/// Returns the frame and the number of bytes consumed; the caller must
/// advance the buffer. `ErrorKind::UnexpectedEof` means more bytes are
/// needed, any other error is fatal.
pub fn decode_frame(data: &mut BytesMut) -> io::Result<(Frame, usize)> {
    if data.len() < 4 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "incomplete frame header",
        ));
    }

    let len = u32::from_le_bytes([data[0], data[1], data[2], 0]) as usize;
    let sequence = data[3];

    if len > MAX_FRAME_LENGTH {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame length {} exceeds protocol maximum", len),
        ));
    }

    if data.len() < 4 + len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "incomplete frame body",
        ));
    }

    let payload = Bytes::copy_from_slice(&data[4..4 + len]);
    Ok((Frame { sequence, payload }, 4 + len))
}

/// Cursor over a frame payload with bounds-checked reads
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn u8(&mut self) -> Result<u8> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or_else(|| Error::Protocol("unexpected end of packet".into()))?;
        self.pos += 1;
        Ok(b)
    }

    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(Error::Protocol("unexpected end of packet".into()));
        }
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    pub fn rest(&mut self) -> &'a [u8] {
        let out = &self.data[self.pos..];
        self.pos = self.data.len();
        out
    }

    pub fn u16_le(&mut self) -> Result<u16> {
        let b = self.bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn u24_le(&mut self) -> Result<u32> {
        let b = self.bytes(3)?;
        Ok(u32::from(b[0]) | u32::from(b[1]) << 8 | u32::from(b[2]) << 16)
    }

    pub fn u32_le(&mut self) -> Result<u32> {
        let b = self.bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn u48_le(&mut self) -> Result<u64> {
        let b = self.bytes(6)?;
        Ok(u64::from(b[0])
            | u64::from(b[1]) << 8
            | u64::from(b[2]) << 16
            | u64::from(b[3]) << 24
            | u64::from(b[4]) << 32
            | u64::from(b[5]) << 40)
    }

    pub fn u64_le(&mut self) -> Result<u64> {
        let b = self.bytes(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// NUL-terminated string
    pub fn cstr(&mut self) -> Result<String> {
        let start = self.pos;
        let end = self.data[start..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::Protocol("unterminated string".into()))?;
        self.pos = start + end + 1;
        Ok(String::from_utf8_lossy(&self.data[start..start + end]).into_owned())
    }

    /// Length-encoded integer
    pub fn lenenc_int(&mut self) -> Result<u64> {
        let first = self.u8()?;
        match first {
            0..=0xFA => Ok(u64::from(first)),
            0xFC => Ok(u64::from(self.u16_le()?)),
            0xFD => {
                let b = self.bytes(3)?;
                Ok(u64::from(b[0]) | u64::from(b[1]) << 8 | u64::from(b[2]) << 16)
            }
            0xFE => self.u64_le(),
            other => Err(Error::Protocol(format!(
                "invalid length-encoded int prefix: 0x{:02X}",
                other
            ))),
        }
    }
}

/// Decode the initial HandshakeV10 greeting
pub fn decode_handshake(payload: &[u8]) -> Result<Handshake> {
    let mut r = Reader::new(payload);

    let protocol_version = r.u8()?;
    if protocol_version == response::ERR {
        // Servers may refuse the connection before greeting (e.g. host blocked)
        let err = decode_err_payload(payload, true)?;
        return Err(err.into());
    }
    if protocol_version != super::constants::PROTOCOL_VERSION {
        return Err(Error::Protocol(format!(
            "unsupported protocol version: {}",
            protocol_version
        )));
    }

    let server_version = r.cstr()?;
    let connection_id = r.u32_le()?;

    // Scramble part 1 and filler
    let mut scramble = r.bytes(8)?.to_vec();
    let _filler = r.u8()?;

    let cap_lower = r.u16_le()?;
    let charset = r.u8()?;
    let status_flags = r.u16_le()?;
    let cap_upper = r.u16_le()?;
    let capabilities = u32::from(cap_lower) | u32::from(cap_upper) << 16;

    let scramble_len = r.u8()?;
    let _reserved = r.bytes(10)?;

    if capabilities & capability::CLIENT_SECURE_CONNECTION != 0 {
        let part2_len = usize::max(13, scramble_len.saturating_sub(8) as usize);
        let part2 = r.bytes(part2_len.min(r.remaining()))?;
        scramble.extend(part2.iter().copied().take_while(|&b| b != 0));
    }

    let auth_plugin = if capabilities & capability::CLIENT_PLUGIN_AUTH != 0 && r.remaining() > 0 {
        r.cstr()?
    } else {
        auth_plugin::NATIVE_PASSWORD.to_string()
    };

    Ok(Handshake {
        protocol_version,
        server_version,
        connection_id,
        scramble,
        capabilities,
        charset,
        status_flags,
        auth_plugin,
    })
}

/// Decode a generic server response during or after authentication.
///
/// `protocol_41` controls ERR packet SQLSTATE parsing and is taken from the
/// negotiated capabilities.
pub fn decode_response(payload: &[u8], protocol_41: bool) -> Result<ServerMessage> {
    let first = *payload
        .first()
        .ok_or_else(|| Error::Protocol("empty packet".into()))?;

    match first {
        response::OK => Ok(ServerMessage::Ok(decode_ok_payload(&payload[1..])?)),
        response::ERR => Ok(ServerMessage::Err(decode_err_payload(payload, protocol_41)?)),
        response::AUTH_MORE_DATA => Ok(ServerMessage::AuthMoreData(payload[1..].to_vec())),
        response::EOF => {
            if payload.len() < 6 {
                // Old-style EOF packet: 0xFE with at most warning count + status
                return Ok(ServerMessage::Eof);
            }
            let mut r = Reader::new(&payload[1..]);
            let plugin = r.cstr()?;
            let mut data = r.rest().to_vec();
            // Scramble in AuthSwitchRequest carries a trailing NUL
            if data.last() == Some(&0) {
                data.pop();
            }
            Ok(ServerMessage::AuthSwitch { plugin, data })
        }
        other => Err(Error::Protocol(format!(
            "unexpected response header byte: 0x{:02X}",
            other
        ))),
    }
}

fn decode_ok_payload(rest: &[u8]) -> Result<OkPacket> {
    let mut r = Reader::new(rest);
    let affected_rows = r.lenenc_int()?;
    let last_insert_id = r.lenenc_int()?;
    // Status and warnings are absent on very old servers; default them
    let status_flags = if r.remaining() >= 2 { r.u16_le()? } else { 0 };
    let warnings = if r.remaining() >= 2 { r.u16_le()? } else { 0 };
    Ok(OkPacket {
        affected_rows,
        last_insert_id,
        status_flags,
        warnings,
    })
}

fn decode_err_payload(payload: &[u8], protocol_41: bool) -> Result<ServerError> {
    let mut r = Reader::new(&payload[1..]);
    let code = r.u16_le()?;

    let sql_state = if protocol_41 && r.remaining() >= 6 && r.data[r.pos] == b'#' {
        let _marker = r.u8()?;
        String::from_utf8_lossy(r.bytes(5)?).into_owned()
    } else {
        "HY000".to_string()
    };

    let message = String::from_utf8_lossy(r.rest()).into_owned();
    Ok(ServerError {
        code,
        sql_state,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(seq: u8, payload: &[u8]) -> BytesMut {
        let mut buf = BytesMut::new();
        let len = payload.len() as u32;
        buf.extend_from_slice(&len.to_le_bytes()[..3]);
        buf.extend_from_slice(&[seq]);
        buf.extend_from_slice(payload);
        buf
    }

    #[test]
    fn test_decode_frame() {
        let mut data = frame(2, b"\x00abc");
        let (f, consumed) = decode_frame(&mut data).unwrap();
        assert_eq!(f.sequence, 2);
        assert_eq!(&f.payload[..], b"\x00abc");
        assert_eq!(consumed, 8);
    }

    #[test]
    fn test_decode_frame_incomplete() {
        let mut data = BytesMut::from(&[5u8, 0, 0][..]);
        let err = decode_frame(&mut data).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        let mut data = frame(0, b"xy");
        data.truncate(5);
        let err = decode_frame(&mut data).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_decode_handshake_v10() {
        let mut payload = vec![10u8];
        payload.extend_from_slice(b"8.0.36\0");
        payload.extend_from_slice(&42u32.to_le_bytes()); // connection id
        payload.extend_from_slice(b"abcdefgh"); // scramble part 1
        payload.push(0); // filler
        let caps =
            capability::CLIENT_PROTOCOL_41 | capability::CLIENT_SECURE_CONNECTION | capability::CLIENT_PLUGIN_AUTH;
        payload.extend_from_slice(&(caps as u16).to_le_bytes());
        payload.push(45); // charset
        payload.extend_from_slice(&2u16.to_le_bytes()); // status
        payload.extend_from_slice(&((caps >> 16) as u16).to_le_bytes());
        payload.push(21); // scramble length
        payload.extend_from_slice(&[0u8; 10]); // reserved
        payload.extend_from_slice(b"ijklmnopqrst\0"); // scramble part 2 (12 + NUL)
        payload.extend_from_slice(b"mysql_native_password\0");

        let hs = decode_handshake(&payload).unwrap();
        assert_eq!(hs.server_version, "8.0.36");
        assert_eq!(hs.connection_id, 42);
        assert_eq!(hs.scramble, b"abcdefghijklmnopqrst");
        assert_eq!(hs.auth_plugin, "mysql_native_password");
        assert_eq!(hs.capabilities, caps);
    }

    #[test]
    fn test_decode_err_with_sqlstate() {
        let mut payload = vec![0xFFu8];
        payload.extend_from_slice(&1045u16.to_le_bytes());
        payload.extend_from_slice(b"#28000");
        payload.extend_from_slice(b"Access denied for user 'fudd'@'localhost'");

        let msg = decode_response(&payload, true).unwrap();
        match msg {
            ServerMessage::Err(err) => {
                assert_eq!(err.code, 1045);
                assert_eq!(err.sql_state, "28000");
                assert_eq!(err.message, "Access denied for user 'fudd'@'localhost'");
            }
            other => panic!("expected Err packet, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_ok() {
        let payload = [0x00u8, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00];
        let msg = decode_response(&payload, true).unwrap();
        match msg {
            ServerMessage::Ok(ok) => {
                assert_eq!(ok.affected_rows, 1);
                assert_eq!(ok.last_insert_id, 0);
                assert_eq!(ok.status_flags, 2);
            }
            other => panic!("expected Ok packet, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_auth_switch() {
        let mut payload = vec![0xFEu8];
        payload.extend_from_slice(b"mysql_native_password\0");
        payload.extend_from_slice(b"01234567890123456789\0");

        let msg = decode_response(&payload, true).unwrap();
        match msg {
            ServerMessage::AuthSwitch { plugin, data } => {
                assert_eq!(plugin, "mysql_native_password");
                assert_eq!(data, b"01234567890123456789");
            }
            other => panic!("expected AuthSwitch, got {:?}", other),
        }
    }

    #[test]
    fn test_lenenc_int() {
        let mut r = Reader::new(&[0xFA]);
        assert_eq!(r.lenenc_int().unwrap(), 250);

        let mut r = Reader::new(&[0xFC, 0x10, 0x27]);
        assert_eq!(r.lenenc_int().unwrap(), 10000);

        let mut r = Reader::new(&[0xFD, 0x01, 0x00, 0x01]);
        assert_eq!(r.lenenc_int().unwrap(), 65537);

        let mut r = Reader::new(&[0xFE, 1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(r.lenenc_int().unwrap(), 1);

        // 0xFB is the NULL marker, invalid in an integer position
        let mut r = Reader::new(&[0xFB]);
        assert!(r.lenenc_int().is_err());
    }
}
