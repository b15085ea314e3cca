//! Connection smoke check binary
//!
//! Connects once to the local server with fixed credentials and reports the
//! outcome through the exit status: 0 on success, 1 on failure with the
//! error text on stderr.

use mysql_wire::bootstrap::{self, WireDriver};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut driver = WireDriver::default();
    ExitCode::from(bootstrap::run(&mut driver, &mut std::io::stderr()))
}
