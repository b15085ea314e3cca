//! Password scramble computation for MySQL authentication plugins

mod scramble;

pub use scramble::{caching_sha2_response, native_password_response};

use crate::protocol::constants::auth_plugin;
use crate::{Error, Result};

/// Compute the auth response for `plugin` given the server scramble.
///
/// Plugins other than `mysql_native_password` and `caching_sha2_password`
/// are rejected; there is no fallback negotiation beyond the server's own
/// auth-switch mechanism.
pub fn scramble_password(plugin: &str, password: &str, nonce: &[u8]) -> Result<Vec<u8>> {
    match plugin {
        auth_plugin::NATIVE_PASSWORD => Ok(native_password_response(password, nonce)),
        auth_plugin::CACHING_SHA2_PASSWORD => Ok(caching_sha2_response(password, nonce)),
        other => Err(Error::Unsupported(format!(
            "authentication plugin '{}' is not supported",
            other
        ))),
    }
}
