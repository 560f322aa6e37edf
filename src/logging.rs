//! Federate-level log gating. The original C++ `logMessage`/`loggerFunction`
//! pair is replaced by `tracing` events: the federate still gates on its own
//! `log_level` (read under the registries' mutex, per spec §5) but emission
//! itself goes straight to whatever `tracing` subscriber the application has
//! installed, with no locking on the hot path.

/// Mirrors HELICS's numeric log levels (`0` error .. `4` trace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Normal = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    pub fn from_u8(level: u8) -> LogLevel {
        match level {
            0 => LogLevel::Error,
            1 => LogLevel::Warning,
            2 => LogLevel::Normal,
            3 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

/// Emit a federate log message if `level` is within the federate's configured
/// `log_level` gate.
pub fn log(federate_name: &str, configured_level: u8, level: LogLevel, message: &str) {
    if (level as u8) > configured_level {
        return;
    }
    match level {
        LogLevel::Error => tracing::error!(federate = federate_name, "{message}"),
        LogLevel::Warning => tracing::warn!(federate = federate_name, "{message}"),
        LogLevel::Normal => tracing::info!(federate = federate_name, "{message}"),
        LogLevel::Debug => tracing::debug!(federate = federate_name, "{message}"),
        LogLevel::Trace => tracing::trace!(federate = federate_name, "{message}"),
    }
}
