//! Structured log events published through the process-wide sink.
//!
//! A [`LogEvent`] is an immutable value created at the logging call site and
//! handed to every subscriber of the sink. Subscribers receive a shared
//! reference and may observe the same event concurrently; nothing mutates an
//! event after construction.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

/// Severity of a [`LogEvent`].
///
/// Five levels, ordered from most to least verbose. The default level is
/// `Info`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Very low priority, extremely verbose information.
    Trace,
    /// Lower priority information useful for debugging.
    Debug,
    /// Useful information about normal operations. This is the **default**.
    #[default]
    Info,
    /// Hazardous situations that may lead to errors.
    Warn,
    /// Very serious errors that prevent normal operation.
    Error,
}

/// Provides string representation of log levels in uppercase format.
impl AsRef<str> for LogLevel {
    fn as_ref(&self) -> &str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Parses log levels from strings with case-insensitive matching.
///
/// # Errors
///
/// Returns an error string describing the invalid input and listing valid
/// options.
impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!(
                "Invalid log level: '{s}'. Valid levels are: trace, debug, info, warn, error",
            )),
        }
    }
}

/// One structured log record.
///
/// Events carry an ordered property list rather than a map: insertion order
/// is part of the rendering contract downstream.
#[derive(Debug, Clone)]
pub struct LogEvent {
    /// Severity of the record.
    pub level: LogLevel,
    /// Identifies the logging subsystem.
    pub component: String,
    /// Free-form source-location or context string.
    pub caller_info: String,
    /// Wall-clock instant captured when the event was constructed.
    pub timestamp: DateTime<Utc>,
    /// The log message.
    pub message: String,
    /// Ordered key/value pairs, insertion order preserved.
    pub properties: Vec<(String, String)>,
}

impl LogEvent {
    /// Creates a new event stamped with the current wall-clock time.
    #[must_use]
    pub fn new(
        level: LogLevel,
        component: impl Into<String>,
        caller_info: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            component: component.into(),
            caller_info: caller_info.into(),
            timestamp: Utc::now(),
            message: message.into(),
            properties: Vec::new(),
        }
    }

    /// Appends a property, preserving insertion order.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push((key.into(), value.into()));
        self
    }

    /// Replaces the timestamp. Used where the instant must be fixed, e.g.
    /// in rendering tests.
    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_event(message: &str) -> LogEvent {
        LogEvent::new(LogLevel::Info, "host", "event.rs", message)
    }

    #[test]
    fn test_log_event_creation() {
        let event = create_test_event("test message");
        assert_eq!(event.message, "test message");
        assert_eq!(event.level, LogLevel::Info);
        assert_eq!(event.component, "host");
        assert!(event.properties.is_empty());
        assert!(event.timestamp <= Utc::now());
    }

    #[test]
    fn test_log_event_clone() {
        let event = create_test_event("test message").with_property("k", "v");
        let cloned = event.clone();
        assert_eq!(event.message, cloned.message);
        assert_eq!(event.timestamp, cloned.timestamp);
        assert_eq!(event.properties, cloned.properties);
    }

    #[test]
    fn test_properties_preserve_insertion_order() {
        let event = create_test_event("ordered")
            .with_property("b", "2")
            .with_property("a", "1")
            .with_property("c", "3");
        let keys: Vec<&str> = event.properties.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_level_from_str_case_insensitive() {
        assert_eq!(LogLevel::from_str("debug").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("DEBUG").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("DeBuG").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("error").unwrap(), LogLevel::Error);
    }

    #[test]
    fn test_level_from_str_invalid() {
        let err = LogLevel::from_str("loud").unwrap_err();
        assert!(err.contains("Invalid log level"));
        assert!(err.contains("loud"));
    }

    #[test]
    fn test_level_display() {
        assert_eq!(LogLevel::Warn.to_string(), "WARN");
        assert_eq!(LogLevel::Trace.to_string(), "TRACE");
    }

    #[test]
    fn test_level_default() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }
}
