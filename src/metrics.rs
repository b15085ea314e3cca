//! Metrics facade
//!
//! Thin wrappers over the `metrics` crate so call sites stay one-liners and
//! metric names live in a single place. All metrics are no-ops unless the
//! embedding application installs a recorder.

/// Counter metrics
pub mod counters {
    /// A TCP/Unix connect was attempted
    pub fn connect_attempted(transport: &str) {
        metrics::counter!("mysql_wire_connect_attempted_total", "transport" => transport.to_string())
            .increment(1);
    }

    /// Handshake and authentication completed
    pub fn connect_succeeded() {
        metrics::counter!("mysql_wire_connect_succeeded_total").increment(1);
    }

    /// Connect failed before the connection reached idle
    pub fn connect_failed(reason: &str) {
        metrics::counter!("mysql_wire_connect_failed_total", "reason" => reason.to_string())
            .increment(1);
    }

    /// An authentication exchange started for the given plugin
    pub fn auth_attempted(plugin: &str) {
        metrics::counter!("mysql_wire_auth_attempted_total", "plugin" => plugin.to_string())
            .increment(1);
    }

    /// Server accepted the credentials
    pub fn auth_successful(plugin: &str) {
        metrics::counter!("mysql_wire_auth_successful_total", "plugin" => plugin.to_string())
            .increment(1);
    }

    /// Server rejected the credentials or the exchange broke down
    pub fn auth_failed(plugin: &str, reason: &str) {
        metrics::counter!(
            "mysql_wire_auth_failed_total",
            "plugin" => plugin.to_string(),
            "reason" => reason.to_string()
        )
        .increment(1);
    }

    /// A binlog event was decoded
    pub fn binlog_event_read(event_type: &str) {
        metrics::counter!("mysql_wire_binlog_events_total", "type" => event_type.to_string())
            .increment(1);
    }
}

/// Histogram metrics
pub mod histograms {
    /// Full greeting-to-idle handshake duration
    pub fn handshake_duration(millis: u64) {
        metrics::histogram!("mysql_wire_handshake_duration_ms").record(millis as f64);
    }

    /// Authentication exchange duration for the given plugin
    pub fn auth_duration(plugin: &str, millis: u64) {
        metrics::histogram!("mysql_wire_auth_duration_ms", "plugin" => plugin.to_string())
            .record(millis as f64);
    }
}
