/// Structured logging for the address grouping service
///
/// Provides context-rich logging with component and request identifiers,
/// timestamps, and severity levels. Supports both console output
/// and file-based logging for daemon operations.

use chrono::Utc;
use serde::Deserialize;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::model::{AddressError, ErrorKind};

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    Parser,
    Report,
    Server,
    Client,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Parser => write!(f, "PARSE"),
            Component::Report => write!(f, "REPORT"),
            Component::Server => write!(f, "HTTP"),
            Component::Client => write!(f, "CLIENT"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - the caller sent input the service rejects
    Expected,
    /// Unexpected failure - indicates a service-side fault
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn log(&self, level: LogLevel, component: &Component, context: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = format_entry(level, component, context, message);
        let context_part = context.map(|c| format!(" [{}]", c)).unwrap_or_default();

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error => eprintln!("{}", log_entry),
                LogLevel::Warning => eprintln!("   {}", log_entry),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", component, context_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", component, context_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => {} // Skip debug in non-timestamp mode
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

/// Formats one log line: `<timestamp> <LEVEL> <COMPONENT>[ [context]]: <message>`.
pub fn format_entry(level: LogLevel, component: &Component, context: Option<&str>, message: &str) -> String {
    let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    let context_part = context.map(|c| format!(" [{}]", c)).unwrap_or_default();
    format!("{} {} {}{}: {}", timestamp, level, component, context_part, message)
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn dispatch(level: LogLevel, component: Component, context: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, &component, context, message);
        }
    }
}

/// Log a general informational message
pub fn info(component: Component, context: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, component, context, message);
}

/// Log a warning message
pub fn warn(component: Component, context: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, component, context, message);
}

/// Log an error message
pub fn error(component: Component, context: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, component, context, message);
}

/// Log a debug message
pub fn debug(component: Component, context: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, component, context, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a rejected request by its error kind.
///
/// All three kinds are the caller's input being refused, which the service
/// handles routinely.
pub fn classify_failure(kind: ErrorKind) -> FailureType {
    match kind {
        ErrorKind::UnsupportedOperation | ErrorKind::MalformedItem | ErrorKind::UnknownState => {
            FailureType::Expected
        }
    }
}

/// Classify a transport-level failure from its message.
pub fn classify_transport_failure(error_message: &str) -> FailureType {
    if error_message.contains("Broken pipe") || error_message.contains("Connection reset") {
        // peer hung up; routine for a one-shot client
        FailureType::Expected
    } else if error_message.contains("timed out")
        || error_message.contains("temporarily unavailable")
    {
        // idle or stalled peer, or a slow network
        FailureType::Unknown
    } else {
        FailureType::Unexpected
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a rejected request with automatic classification
pub fn log_request_failure(context: Option<&str>, err: &AddressError) {
    let failure_type = classify_failure(err.kind());
    let message = format!("request rejected [{}] {:?}: {}", failure_type, err.kind(), err);

    match failure_type {
        FailureType::Expected => warn(Component::Parser, context, &message),
        FailureType::Unexpected => error(Component::Parser, context, &message),
        FailureType::Unknown => debug(Component::Parser, context, &message),
    }
}

/// Log a connection-level I/O failure with classification
pub fn log_transport_failure(peer: &str, operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_transport_failure(&error_msg);

    let message = format!("{} failed [{}]: {}", operation, failure_type, error_msg);

    match failure_type {
        FailureType::Expected => debug(Component::Server, Some(peer), &message),
        FailureType::Unexpected => error(Component::Server, Some(peer), &message),
        FailureType::Unknown => warn(Component::Server, Some(peer), &message),
    }
}

// ---------------------------------------------------------------------------
// Batch Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of one successfully parsed batch
pub fn log_batch_summary(total: usize, records: usize, skipped: usize) {
    let message = format!(
        "Batch complete: {}/{} items parsed, {} blank skipped",
        records, total, skipped
    );

    if records == 0 && total > 0 {
        warn(Component::Report, None, &message);
    } else {
        info(Component::Report, None, &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_log_level_from_str_accepts_aliases() {
        assert_eq!("WARN".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_failure_classification() {
        assert_eq!(classify_failure(ErrorKind::UnknownState), FailureType::Expected);
        assert_eq!(classify_failure(ErrorKind::MalformedItem), FailureType::Expected);

        assert_eq!(
            classify_transport_failure("Connection reset by peer (os error 104)"),
            FailureType::Expected
        );
        assert_eq!(
            classify_transport_failure("write response: Broken pipe (os error 32)"),
            FailureType::Expected
        );
        assert_eq!(
            classify_transport_failure("read timed out: Resource temporarily unavailable (os error 11)"),
            FailureType::Unknown
        );
        assert_eq!(
            classify_transport_failure("Address already in use"),
            FailureType::Unexpected
        );
    }

    #[test]
    fn test_format_entry_includes_context() {
        let entry = format_entry(LogLevel::Warning, &Component::Parser, Some("item 3"), "bad");
        assert!(entry.ends_with("WARN PARSE [item 3]: bad"), "got: {}", entry);

        let entry = format_entry(LogLevel::Info, &Component::System, None, "up");
        assert!(entry.ends_with("INFO SYS: up"), "got: {}", entry);
    }
}
