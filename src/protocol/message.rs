//! Protocol message types

use bytes::Bytes;

/// Client message (client → server)
#[derive(Debug, Clone)]
pub enum ClientMessage {
    /// Handshake response (reply to the server greeting)
    HandshakeResponse {
        /// Client capability flags
        capabilities: u32,
        /// Charset byte
        charset: u8,
        /// Username
        user: String,
        /// Scrambled password (may be empty)
        auth_response: Vec<u8>,
        /// Initial database, if any
        database: Option<String>,
        /// Auth plugin the response was computed for
        auth_plugin: String,
    },

    /// Raw auth data (reply to AuthSwitchRequest)
    AuthData(Vec<u8>),

    /// COM_PING
    Ping,

    /// COM_QUIT
    Quit,
}

/// Server message (server → client)
#[derive(Debug, Clone)]
pub enum ServerMessage {
    /// Initial HandshakeV10 greeting
    Handshake(Handshake),

    /// OK packet
    Ok(OkPacket),

    /// ERR packet
    Err(ServerError),

    /// Authentication plugin switch request
    AuthSwitch {
        /// Plugin to switch to
        plugin: String,
        /// Fresh scramble for the new plugin
        data: Vec<u8>,
    },

    /// Extra auth data (caching_sha2_password status bytes)
    AuthMoreData(Vec<u8>),

    /// EOF packet (pre-DEPRECATE_EOF servers)
    Eof,
}

/// Parsed HandshakeV10 greeting
#[derive(Debug, Clone)]
pub struct Handshake {
    /// Protocol version (always 10 for supported servers)
    pub protocol_version: u8,
    /// Server version string, e.g. "8.0.36"
    pub server_version: String,
    /// Connection (thread) id
    pub connection_id: u32,
    /// Full 20-byte auth scramble (parts 1 and 2 joined, trailing NUL stripped)
    pub scramble: Vec<u8>,
    /// Server capability flags (lower and upper halves joined)
    pub capabilities: u32,
    /// Server default charset
    pub charset: u8,
    /// Server status flags
    pub status_flags: u16,
    /// Default auth plugin announced by the server
    pub auth_plugin: String,
}

/// OK packet fields
#[derive(Debug, Clone, Default)]
pub struct OkPacket {
    /// Rows affected by the last command
    pub affected_rows: u64,
    /// Last insert id
    pub last_insert_id: u64,
    /// Server status flags
    pub status_flags: u16,
    /// Warning count
    pub warnings: u16,
}

/// ERR packet fields
#[derive(Debug, Clone)]
pub struct ServerError {
    /// MySQL error code, e.g. 1045
    pub code: u16,
    /// Five-character SQLSTATE ("HY000" when the server sent none)
    pub sql_state: String,
    /// Human-readable message
    pub message: String,
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if self.code != 0 {
            write!(f, " ({})", self.code)?;
        }
        Ok(())
    }
}

impl From<ServerError> for crate::Error {
    fn from(err: ServerError) -> Self {
        crate::Error::Server {
            code: err.code,
            sql_state: err.sql_state,
            message: err.message,
        }
    }
}

/// A raw protocol frame: sequence id plus payload, framing stripped
#[derive(Debug, Clone)]
pub struct Frame {
    /// Packet sequence id
    pub sequence: u8,
    /// Payload bytes
    pub payload: Bytes,
}
