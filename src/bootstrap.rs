//! Connection smoke check
//!
//! Acquires a client handle, attempts one connection with fixed local
//! credentials, reports any failure on the error stream, and releases the
//! handle. The driver seam keeps the sequencing testable without a server.

use crate::client::MySqlClient;
use crate::connection::ConnectionConfig;
use crate::protocol::constants::DEFAULT_PORT;
use std::io::Write;

/// Fixed connection parameters for the smoke check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    /// Target host
    pub host: String,
    /// Username
    pub user: String,
    /// Password
    pub password: String,
    /// Database to select, none by default
    pub database: Option<String>,
    /// TCP port
    pub port: u16,
}

impl Default for ConnectParams {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            user: "fudd".into(),
            password: "wabbit-season".into(),
            database: None,
            port: DEFAULT_PORT,
        }
    }
}

/// Client lifecycle as the smoke check consumes it: acquire a handle,
/// connect it once, read back the latest error text, release it.
pub trait ClientDriver {
    /// Opaque client handle
    type Handle;

    /// Acquire a handle, or `None` when the client context cannot be created
    fn initialize(&mut self) -> Option<Self::Handle>;

    /// Attempt one blocking connection; `false` on failure
    fn connect(&mut self, handle: &mut Self::Handle, params: &ConnectParams) -> bool;

    /// Human-readable text of the most recent error
    fn last_error(&mut self) -> String;

    /// Release the handle's resources
    fn release(&mut self, handle: Self::Handle);
}

/// Run the smoke check: returns the process exit status.
///
/// Failure at either stage writes the driver's error text to `stderr` and
/// returns 1. An acquired handle is released on every path out, including
/// the successful one.
pub fn run<D: ClientDriver, W: Write>(driver: &mut D, stderr: &mut W) -> u8 {
    let mut handle = match driver.initialize() {
        Some(handle) => handle,
        None => {
            let _ = writeln!(stderr, "{}", driver.last_error());
            return 1;
        }
    };

    let params = ConnectParams::default();
    if !driver.connect(&mut handle, &params) {
        let _ = writeln!(stderr, "{}", driver.last_error());
        driver.release(handle);
        return 1;
    }

    driver.release(handle);
    0
}

/// Driver backed by the real wire client
#[derive(Default)]
pub struct WireDriver {
    last_error: String,
}

/// Runtime plus the connected client, if any
pub struct WireHandle {
    runtime: tokio::runtime::Runtime,
    client: Option<MySqlClient>,
}

impl ClientDriver for WireDriver {
    type Handle = WireHandle;

    fn initialize(&mut self) -> Option<Self::Handle> {
        match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => Some(WireHandle {
                runtime,
                client: None,
            }),
            Err(e) => {
                self.last_error = format!("could not create client context: {}", e);
                None
            }
        }
    }

    fn connect(&mut self, handle: &mut Self::Handle, params: &ConnectParams) -> bool {
        let mut config = ConnectionConfig::new(&params.user).password(&params.password);
        if let Some(ref database) = params.database {
            config = config.database(database);
        }

        let result = handle
            .runtime
            .block_on(MySqlClient::connect_with_config(&params.host, params.port, config));

        match result {
            Ok(client) => {
                handle.client = Some(client);
                true
            }
            Err(e) => {
                self.last_error = e.to_string();
                false
            }
        }
    }

    fn last_error(&mut self) -> String {
        self.last_error.clone()
    }

    fn release(&mut self, handle: Self::Handle) {
        if let Some(client) = handle.client {
            // Best-effort graceful close
            let _ = handle.runtime.block_on(client.close());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = ConnectParams::default();
        assert_eq!(params.host, "localhost");
        assert_eq!(params.user, "fudd");
        assert_eq!(params.password, "wabbit-season");
        assert_eq!(params.database, None);
        assert_eq!(params.port, 3306);
    }
}
