//! Core connection type

use super::state::ConnectionState;
use super::transport::Transport;
use crate::auth::scramble_password;
use crate::protocol::constants::{auth_plugin, capability, sha2_status, DEFAULT_CHARSET};
use crate::protocol::{
    decode_frame, decode_handshake, decode_response, encode_message, ClientMessage, Frame,
    Handshake, ServerMessage,
};
use crate::{Error, Result};
use bytes::{Buf, BytesMut};
use std::time::Duration;
use tracing::Instrument;

/// Connection configuration
///
/// Stores credentials and session parameters for the handshake. Use
/// `ConnectionConfig::builder()` when a connect timeout is needed.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Username
    pub user: String,
    /// Password (optional, empty sends an empty auth response)
    pub password: Option<String>,
    /// Initial database (optional)
    pub database: Option<String>,
    /// Charset byte sent in the handshake response
    pub charset: u8,
    /// TCP connection timeout
    pub connect_timeout: Option<Duration>,
}

impl ConnectionConfig {
    /// Create new configuration with defaults for the given user
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: None,
            database: None,
            charset: DEFAULT_CHARSET,
            connect_timeout: None,
        }
    }

    /// Create a builder for advanced configuration
    pub fn builder(user: impl Into<String>) -> ConnectionConfigBuilder {
        ConnectionConfigBuilder {
            config: Self::new(user),
        }
    }

    /// Set password
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set initial database
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }
}

/// Builder for creating `ConnectionConfig` with advanced options
#[derive(Debug, Clone)]
pub struct ConnectionConfigBuilder {
    config: ConnectionConfig,
}

impl ConnectionConfigBuilder {
    /// Set the password
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(password.into());
        self
    }

    /// Set the initial database
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.config.database = Some(database.into());
        self
    }

    /// Set the charset byte
    pub fn charset(mut self, charset: u8) -> Self {
        self.config.charset = charset;
        self
    }

    /// Set TCP connection timeout
    pub fn connect_timeout(mut self, duration: Duration) -> Self {
        self.config.connect_timeout = Some(duration);
        self
    }

    /// Build the configuration
    pub fn build(self) -> ConnectionConfig {
        self.config
    }
}

/// MySQL connection
pub struct Connection {
    transport: Option<Transport>,
    state: ConnectionState,
    read_buf: BytesMut,
    sequence: u8,
    capabilities: u32,
    connection_id: Option<u32>,
    server_version: Option<String>,
}

impl Connection {
    /// Create connection from transport
    pub fn new(transport: Transport) -> Self {
        Self {
            transport: Some(transport),
            state: ConnectionState::Initial,
            read_buf: BytesMut::with_capacity(8192),
            sequence: 0,
            capabilities: 0,
            connection_id: None,
            server_version: None,
        }
    }

    /// Get current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Server version string from the greeting, once connected
    pub fn server_version(&self) -> Option<&str> {
        self.server_version.as_deref()
    }

    /// Connection (thread) id assigned by the server, once connected
    pub fn connection_id(&self) -> Option<u32> {
        self.connection_id
    }

    /// Perform the greeting/handshake-response/auth exchange
    pub async fn handshake(&mut self, config: &ConnectionConfig) -> Result<()> {
        let result = async {
            let handshake_start = std::time::Instant::now();

            self.state.transition(ConnectionState::AwaitingHandshake)?;

            let greeting_frame = self.receive_frame().await?;
            let greeting = decode_handshake(&greeting_frame.payload)?;
            tracing::debug!(
                server_version = %greeting.server_version,
                connection_id = greeting.connection_id,
                auth_plugin = %greeting.auth_plugin,
                "received server greeting"
            );

            if greeting.capabilities & capability::CLIENT_PROTOCOL_41 == 0 {
                return Err(Error::Unsupported(
                    "server does not speak the 4.1 protocol".into(),
                ));
            }

            self.connection_id = Some(greeting.connection_id);
            self.server_version = Some(greeting.server_version.clone());
            self.capabilities = self.client_capabilities(&greeting, config);

            self.state.transition(ConnectionState::Authenticating)?;
            self.authenticate(config, &greeting).await?;

            self.state.transition(ConnectionState::Idle)?;
            crate::metrics::counters::connect_succeeded();
            crate::metrics::histograms::handshake_duration(
                handshake_start.elapsed().as_millis() as u64
            );
            tracing::info!("handshake complete");
            Ok(())
        }
        .instrument(tracing::info_span!("handshake", user = %config.user))
        .await;

        if let Err(e) = &result {
            crate::metrics::counters::connect_failed(failure_label(e));
        }
        result
    }

    /// Capability flags to request, limited to what the server offers
    fn client_capabilities(&self, greeting: &Handshake, config: &ConnectionConfig) -> u32 {
        let mut caps = capability::CLIENT_PROTOCOL_41
            | capability::CLIENT_LONG_FLAG
            | capability::CLIENT_SECURE_CONNECTION
            | capability::CLIENT_TRANSACTIONS
            | capability::CLIENT_PLUGIN_AUTH
            | capability::CLIENT_PLUGIN_AUTH_LENENC_CLIENT_DATA
            | capability::CLIENT_DEPRECATE_EOF;

        if config.database.is_some() {
            caps |= capability::CLIENT_CONNECT_WITH_DB;
        }

        caps & greeting.capabilities | capability::CLIENT_PROTOCOL_41
    }

    /// Handle the authentication exchange after the greeting
    async fn authenticate(&mut self, config: &ConnectionConfig, greeting: &Handshake) -> Result<()> {
        let auth_start = std::time::Instant::now();
        let mut plugin = greeting.auth_plugin.clone();
        let password = config.password.as_deref().unwrap_or("");

        crate::metrics::counters::auth_attempted(&plugin);
        let auth_response = scramble_password(&plugin, password, &greeting.scramble)?;

        let response = ClientMessage::HandshakeResponse {
            capabilities: self.capabilities,
            charset: config.charset,
            user: config.user.clone(),
            auth_response,
            database: config.database.clone(),
            auth_plugin: plugin.clone(),
        };
        self.send_message(&response).await?;

        loop {
            let frame = self.receive_frame().await?;
            let msg = decode_response(&frame.payload, true)?;

            match msg {
                ServerMessage::Ok(_) => {
                    crate::metrics::counters::auth_successful(&plugin);
                    crate::metrics::histograms::auth_duration(
                        &plugin,
                        auth_start.elapsed().as_millis() as u64,
                    );
                    tracing::debug!(plugin = %plugin, "authentication successful");
                    return Ok(());
                }
                ServerMessage::Err(err) => {
                    crate::metrics::counters::auth_failed(&plugin, "server_rejected");
                    return Err(Error::Authentication(err.to_string()));
                }
                ServerMessage::AuthSwitch {
                    plugin: next_plugin,
                    data,
                } => {
                    tracing::debug!(from = %plugin, to = %next_plugin, "auth plugin switch");
                    plugin = next_plugin;
                    crate::metrics::counters::auth_attempted(&plugin);
                    let scrambled = scramble_password(&plugin, password, &data)?;
                    self.send_message(&ClientMessage::AuthData(scrambled)).await?;
                }
                ServerMessage::AuthMoreData(data) => {
                    self.handle_auth_more_data(&plugin, &data)?;
                }
                ServerMessage::Eof => {
                    crate::metrics::counters::auth_failed(&plugin, "old_auth_requested");
                    return Err(Error::Unsupported(
                        "server requested pre-4.1 password authentication".into(),
                    ));
                }
                other => {
                    return Err(Error::Protocol(format!(
                        "unexpected message during auth: {:?}",
                        other
                    )));
                }
            }
        }
    }

    /// caching_sha2_password status bytes after the fast-path scramble
    fn handle_auth_more_data(&self, plugin: &str, data: &[u8]) -> Result<()> {
        if plugin != auth_plugin::CACHING_SHA2_PASSWORD {
            return Err(Error::Protocol(format!(
                "unexpected AuthMoreData for plugin '{}'",
                plugin
            )));
        }

        match data.first() {
            Some(&sha2_status::FAST_AUTH_SUCCESS) => {
                // OK packet follows; keep looping
                tracing::debug!("caching_sha2 fast auth accepted");
                Ok(())
            }
            Some(&sha2_status::FULL_AUTH_REQUIRED) => {
                crate::metrics::counters::auth_failed(plugin, "full_auth_required");
                Err(Error::Unsupported(
                    "caching_sha2_password full authentication requires a secure channel".into(),
                ))
            }
            other => Err(Error::Protocol(format!(
                "unexpected caching_sha2 status byte: {:?}",
                other
            ))),
        }
    }

    /// Liveness check (COM_PING)
    pub async fn ping(&mut self) -> Result<()> {
        if self.state != ConnectionState::Idle {
            return Err(Error::InvalidState {
                expected: "idle".into(),
                actual: self.state.to_string(),
            });
        }

        self.state.transition(ConnectionState::CommandInProgress)?;

        // Command packets restart the sequence counter
        self.sequence = 0;
        self.send_message(&ClientMessage::Ping).await?;

        let frame = self.receive_frame().await?;
        let msg = decode_response(&frame.payload, true)?;
        self.state.transition(ConnectionState::Idle)?;

        match msg {
            ServerMessage::Ok(_) => Ok(()),
            ServerMessage::Err(err) => Err(err.into()),
            other => Err(Error::Protocol(format!(
                "unexpected response to ping: {:?}",
                other
            ))),
        }
    }

    /// Close the connection (best-effort COM_QUIT, then shutdown)
    pub async fn close(mut self) -> Result<()> {
        self.state.transition(ConnectionState::Closed)?;
        self.sequence = 0;
        let _ = self.send_message(&ClientMessage::Quit).await;
        if let Some(transport) = self.transport.as_mut() {
            transport.shutdown().await?;
        }
        Ok(())
    }

    /// Send a client message as one framed packet
    async fn send_message(&mut self, msg: &ClientMessage) -> Result<()> {
        let buf = encode_message(msg, self.sequence);
        self.sequence = self.sequence.wrapping_add(1);
        let transport = self
            .transport
            .as_mut()
            .ok_or(Error::ConnectionClosed)?;
        transport.write_all(&buf).await?;
        transport.flush().await?;
        Ok(())
    }

    /// Receive one framed packet
    async fn receive_frame(&mut self) -> Result<Frame> {
        loop {
            match decode_frame(&mut self.read_buf) {
                Ok((frame, consumed)) => {
                    self.read_buf.advance(consumed);
                    self.sequence = frame.sequence.wrapping_add(1);
                    return Ok(frame);
                }
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    // Need more data
                }
                Err(e) => return Err(e.into()),
            }

            let transport = self
                .transport
                .as_mut()
                .ok_or(Error::ConnectionClosed)?;
            let n = transport.read_buf(&mut self.read_buf).await?;
            if n == 0 {
                return Err(Error::ConnectionClosed);
            }
        }
    }
}

/// Short label for connect-failure metrics
fn failure_label(err: &Error) -> &'static str {
    match err {
        Error::Io(_) => "io",
        Error::Authentication(_) | Error::Server { .. } => "auth",
        Error::Protocol(_) => "protocol",
        Error::ConnectionClosed => "closed",
        Error::Unsupported(_) => "unsupported",
        _ => "other",
    }
}
