//! Connection management for MySQL protocol

mod conn;
mod state;
mod transport;

pub use conn::{Connection, ConnectionConfig, ConnectionConfigBuilder};
pub use state::ConnectionState;
pub use transport::Transport;
