//! Protocol frame and payload encoding

use super::constants::{capability, command, MAX_PACKET_SIZE};
use super::message::ClientMessage;
use bytes::{BufMut, BytesMut};

/// Encode a client message as a single framed packet with the given sequence id
pub fn encode_message(msg: &ClientMessage, sequence: u8) -> BytesMut {
    let mut payload = BytesMut::new();

    match msg {
        ClientMessage::HandshakeResponse {
            capabilities,
            charset,
            user,
            auth_response,
            database,
            auth_plugin,
        } => {
            payload.put_u32_le(*capabilities);
            payload.put_u32_le(MAX_PACKET_SIZE);
            payload.put_u8(*charset);
            payload.put_bytes(0, 23); // reserved

            payload.put(user.as_bytes());
            payload.put_u8(0);

            if *capabilities & capability::CLIENT_PLUGIN_AUTH_LENENC_CLIENT_DATA != 0 {
                put_lenenc_int(&mut payload, auth_response.len() as u64);
            } else {
                payload.put_u8(auth_response.len() as u8);
            }
            payload.put_slice(auth_response);

            if let Some(db) = database {
                payload.put(db.as_bytes());
                payload.put_u8(0);
            }

            if *capabilities & capability::CLIENT_PLUGIN_AUTH != 0 {
                payload.put(auth_plugin.as_bytes());
                payload.put_u8(0);
            }
        }
        ClientMessage::AuthData(data) => {
            payload.put_slice(data);
        }
        ClientMessage::Ping => {
            payload.put_u8(command::COM_PING);
        }
        ClientMessage::Quit => {
            payload.put_u8(command::COM_QUIT);
        }
    }

    frame(&payload, sequence)
}

/// Wrap a payload in the 4-byte frame header (3-byte LE length + sequence id)
fn frame(payload: &[u8], sequence: u8) -> BytesMut {
    let mut buf = BytesMut::with_capacity(4 + payload.len());
    let len = payload.len() as u32;
    buf.put_slice(&len.to_le_bytes()[..3]);
    buf.put_u8(sequence);
    buf.put_slice(payload);
    buf
}

/// Write a length-encoded integer
fn put_lenenc_int(buf: &mut BytesMut, v: u64) {
    if v < 251 {
        buf.put_u8(v as u8);
    } else if v < 65_536 {
        buf.put_u8(0xFC);
        buf.put_u16_le(v as u16);
    } else if v < 16_777_216 {
        buf.put_u8(0xFD);
        buf.put_slice(&v.to_le_bytes()[..3]);
    } else {
        buf.put_u8(0xFE);
        buf.put_u64_le(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::auth_plugin;

    #[test]
    fn test_encode_ping() {
        let buf = encode_message(&ClientMessage::Ping, 0);
        assert_eq!(&buf[..], &[1, 0, 0, 0, command::COM_PING]);
    }

    #[test]
    fn test_encode_quit() {
        let buf = encode_message(&ClientMessage::Quit, 0);
        assert_eq!(&buf[..], &[1, 0, 0, 0, command::COM_QUIT]);
    }

    #[test]
    fn test_frame_header() {
        let buf = encode_message(&ClientMessage::AuthData(vec![0xAB; 300]), 3);
        // 300 = 0x012C little-endian in the 3-byte length
        assert_eq!(&buf[..4], &[0x2C, 0x01, 0x00, 3]);
        assert_eq!(buf.len(), 304);
    }

    #[test]
    fn test_encode_handshake_response_layout() {
        let caps = capability::CLIENT_PROTOCOL_41
            | capability::CLIENT_SECURE_CONNECTION
            | capability::CLIENT_PLUGIN_AUTH;
        let msg = ClientMessage::HandshakeResponse {
            capabilities: caps,
            charset: 45,
            user: "fudd".to_string(),
            auth_response: vec![0xAA; 20],
            database: None,
            auth_plugin: auth_plugin::NATIVE_PASSWORD.to_string(),
        };
        let buf = encode_message(&msg, 1);

        assert_eq!(buf[3], 1); // sequence
        let payload = &buf[4..];
        assert_eq!(&payload[..4], &caps.to_le_bytes());
        assert_eq!(payload[8], 45);
        assert_eq!(&payload[9..32], &[0u8; 23]);
        assert_eq!(&payload[32..37], b"fudd\0");
        assert_eq!(payload[37], 20); // u8-prefixed auth response
        assert_eq!(&payload[38..58], &[0xAA; 20]);
        assert_eq!(&payload[58..], b"mysql_native_password\0");
    }

    #[test]
    fn test_put_lenenc_int_boundaries() {
        let mut buf = BytesMut::new();
        put_lenenc_int(&mut buf, 250);
        assert_eq!(&buf[..], &[250]);

        let mut buf = BytesMut::new();
        put_lenenc_int(&mut buf, 251);
        assert_eq!(&buf[..], &[0xFC, 0xFB, 0x00]);

        let mut buf = BytesMut::new();
        put_lenenc_int(&mut buf, 16_777_216);
        assert_eq!(&buf[..], &[0xFE, 0, 0, 0, 1, 0, 0, 0, 0]);
    }
}
