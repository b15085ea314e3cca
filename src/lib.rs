//! Async MySQL wire-protocol client and binlog reader.
//!
//! The crate has two halves:
//!
//! * a client stack (`client`, `connection`, `protocol`, `auth`) that speaks
//!   the MySQL client/server protocol over TCP or a Unix socket: greeting,
//!   handshake response, password-scramble authentication, ping and clean
//!   shutdown;
//! * a binlog half (`binlog`) that reads v4 binary log files and decodes
//!   table-map and rows events into typed values.
//!
//! The `bootstrap` module and the `mysql-smoke` binary provide a minimal
//! connect-and-exit smoke test over the client stack.

pub mod auth;
pub mod binlog;
pub mod bootstrap;
pub mod client;
pub mod connection;
pub mod error;
pub mod metrics;
pub mod protocol;

pub use client::MySqlClient;
pub use error::{Error, Result};
