//! MySQL client/server protocol constants

/// Protocol version announced in the server greeting
pub const PROTOCOL_VERSION: u8 = 10;

/// Default port for TCP connections
pub const DEFAULT_PORT: u16 = 3306;

/// Default charset sent in the handshake response (utf8mb4_general_ci)
pub const DEFAULT_CHARSET: u8 = 45;

/// Max packet size advertised to the server (16 MB - 1, the protocol frame limit)
pub const MAX_PACKET_SIZE: u32 = 0x00FF_FFFF;

/// Capability flags
pub mod capability {
    /// Use the 4.1 protocol (longer scramble, SQLSTATE in errors)
    pub const CLIENT_PROTOCOL_41: u32 = 512;

    /// Longer column flags
    pub const CLIENT_LONG_FLAG: u32 = 4;

    /// A database name follows the auth response
    pub const CLIENT_CONNECT_WITH_DB: u32 = 8;

    /// Transaction status in OK packets
    pub const CLIENT_TRANSACTIONS: u32 = 8192;

    /// 4.1-style password scramble
    pub const CLIENT_SECURE_CONNECTION: u32 = 32768;

    /// Auth plugin name follows the database name
    pub const CLIENT_PLUGIN_AUTH: u32 = 1 << 19;

    /// Auth response is length-encoded rather than u8-prefixed
    pub const CLIENT_PLUGIN_AUTH_LENENC_CLIENT_DATA: u32 = 1 << 21;

    /// OK packet replaces the trailing EOF in result sets
    pub const CLIENT_DEPRECATE_EOF: u32 = 1 << 24;
}

/// Command bytes for the first payload byte of a client command packet
pub mod command {
    /// Close the session
    pub const COM_QUIT: u8 = 0x01;

    /// Liveness check
    pub const COM_PING: u8 = 0x0E;
}

/// First payload byte of generic server responses
pub mod response {
    /// OK packet
    pub const OK: u8 = 0x00;

    /// AuthMoreData packet (caching_sha2_password)
    pub const AUTH_MORE_DATA: u8 = 0x01;

    /// EOF packet, or AuthSwitchRequest during authentication
    pub const EOF: u8 = 0xFE;

    /// ERR packet
    pub const ERR: u8 = 0xFF;
}

/// Authentication plugin names
pub mod auth_plugin {
    /// SHA-1 challenge/response (pre-8.0 default)
    pub const NATIVE_PASSWORD: &str = "mysql_native_password";

    /// SHA-256 challenge/response (8.0 default)
    pub const CACHING_SHA2_PASSWORD: &str = "caching_sha2_password";
}

/// caching_sha2_password fast-auth status bytes carried in AuthMoreData
pub mod sha2_status {
    /// Scramble matched the server cache; an OK packet follows
    pub const FAST_AUTH_SUCCESS: u8 = 0x03;

    /// Server wants the full (RSA or TLS) exchange
    pub const FULL_AUTH_REQUIRED: u8 = 0x04;
}

/// Column type codes as they appear in result sets and binlog table maps
#[allow(missing_docs)]
pub mod column_type {
    pub const MYSQL_TYPE_DECIMAL: u8 = 0;
    pub const MYSQL_TYPE_TINY: u8 = 1;
    pub const MYSQL_TYPE_SHORT: u8 = 2;
    pub const MYSQL_TYPE_LONG: u8 = 3;
    pub const MYSQL_TYPE_FLOAT: u8 = 4;
    pub const MYSQL_TYPE_DOUBLE: u8 = 5;
    pub const MYSQL_TYPE_NULL: u8 = 6;
    pub const MYSQL_TYPE_TIMESTAMP: u8 = 7;
    pub const MYSQL_TYPE_LONGLONG: u8 = 8;
    pub const MYSQL_TYPE_INT24: u8 = 9;
    pub const MYSQL_TYPE_DATE: u8 = 10;
    pub const MYSQL_TYPE_TIME: u8 = 11;
    pub const MYSQL_TYPE_DATETIME: u8 = 12;
    pub const MYSQL_TYPE_YEAR: u8 = 13;
    pub const MYSQL_TYPE_VARCHAR: u8 = 15;
    pub const MYSQL_TYPE_BIT: u8 = 16;
    pub const MYSQL_TYPE_TIMESTAMP2: u8 = 17;
    pub const MYSQL_TYPE_DATETIME2: u8 = 18;
    pub const MYSQL_TYPE_TIME2: u8 = 19;
    pub const MYSQL_TYPE_JSON: u8 = 245;
    pub const MYSQL_TYPE_NEWDECIMAL: u8 = 246;
    pub const MYSQL_TYPE_ENUM: u8 = 247;
    pub const MYSQL_TYPE_SET: u8 = 248;
    pub const MYSQL_TYPE_TINY_BLOB: u8 = 249;
    pub const MYSQL_TYPE_MEDIUM_BLOB: u8 = 250;
    pub const MYSQL_TYPE_LONG_BLOB: u8 = 251;
    pub const MYSQL_TYPE_BLOB: u8 = 252;
    pub const MYSQL_TYPE_VAR_STRING: u8 = 253;
    pub const MYSQL_TYPE_STRING: u8 = 254;
    pub const MYSQL_TYPE_GEOMETRY: u8 = 255;
}
