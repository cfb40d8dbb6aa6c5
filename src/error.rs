//! Error types for record decoding and session data handling.
//!
//! All fallible operations of the crate return [`TelemetryError`]. The variants
//! follow the failure taxonomy of the update pipeline:
//!
//! - **Layout errors**: a record layout declares more bytes than its buffer
//!   holds. Raised once, when the record is constructed.
//! - **Incomplete reads**: a stream ended before a record buffer was filled.
//!   Raised for a single tick; the previous buffer contents stay intact.
//! - **File / parse / version errors**: capture files, cache files and the
//!   configuration file.
//!
//! Listener failures and cache problems never surface as errors. They are
//! logged and the affected feature degrades to "no data".
//!
//! ```rust
//! use pitboard::TelemetryError;
//!
//! let error = TelemetryError::incomplete_read("scoring", 1024, 312);
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for telemetry operations.
pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;

/// Main error type for telemetry operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("Incomplete {record} record: expected {expected} bytes, read {read}")]
    IncompleteRead { record: &'static str, expected: usize, read: usize },

    #[error("Layout of {record} record spans {span} bytes but the buffer holds {capacity}")]
    Layout { record: &'static str, span: usize, capacity: usize },

    #[error("File error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported version: supported up to {supported}, found {found}")]
    Version { supported: String, found: String },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Game version {game} has no record formats")]
    UnsupportedGame { game: String },
}

impl TelemetryError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            TelemetryError::IncompleteRead { .. } => true,
            TelemetryError::Layout { .. } => false,
            TelemetryError::File { .. } => false,
            TelemetryError::Version { .. } => false,
            TelemetryError::Parse { .. } => false,
            TelemetryError::Config { .. } => false,
            TelemetryError::UnsupportedGame { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TelemetryError::IncompleteRead { .. } => vec![
                "Retry on the next tick",
                "Check that the producer writes whole records",
                "Verify the configured game version matches the running game",
            ],
            TelemetryError::Layout { .. } => vec![
                "Check the record layout against the game's structure definitions",
                "Verify the configured game version",
            ],
            TelemetryError::File { .. } => vec![
                "Check file exists and is readable",
                "Check file permissions",
                "Ensure sufficient disk space",
            ],
            TelemetryError::Version { .. } => vec![
                "Update the plugin to a version that knows this file format",
                "Delete the outdated file to start from scratch",
            ],
            TelemetryError::Parse { .. } => vec![
                "Check data format compatibility",
                "Verify source data integrity",
            ],
            TelemetryError::Config { .. } => vec![
                "Check the configuration file syntax",
                "Remove unknown or misspelled keys",
            ],
            TelemetryError::UnsupportedGame { .. } => vec![
                "Select a supported game version in the configuration",
            ],
        }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        TelemetryError::File { path, source }
    }

    /// Helper constructor for short reads.
    pub fn incomplete_read(record: &'static str, expected: usize, read: usize) -> Self {
        TelemetryError::IncompleteRead { record, expected, read }
    }

    /// Helper constructor for parse errors.
    pub fn parse(context: impl Into<String>, details: impl Into<String>) -> Self {
        TelemetryError::Parse { context: context.into(), details: details.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        TelemetryError::Config { reason: reason.into() }
    }
}

impl From<std::io::Error> for TelemetryError {
    fn from(err: std::io::Error) -> Self {
        TelemetryError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
          #[test]
          fn io_errors_convert_to_file_errors(reason in ".*") {
            let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, reason.clone());
            let converted: TelemetryError = io_err.into();
            match converted {
              TelemetryError::File { source, .. } => {
                prop_assert_eq!(source.to_string(), reason);
              }
              _ => prop_assert!(false, "Expected File error from io::Error conversion"),
            }
          }

          #[test]
          fn error_messages_carry_their_context(
            expected in 1usize..100_000usize,
            read in 0usize..100_000usize,
            context in "\\w+",
            details in ".*",
            reason in ".*"
          ) {
            let short = TelemetryError::incomplete_read("telemetry", expected, read);
            let msg = short.to_string();
            prop_assert!(msg.contains("telemetry"));
            prop_assert!(msg.contains(&expected.to_string()));
            prop_assert!(msg.contains(&read.to_string()));

            let layout = TelemetryError::Layout { record: "scoring", span: expected, capacity: read };
            prop_assert!(layout.to_string().contains(&expected.to_string()));

            let parse = TelemetryError::parse(context.clone(), details.clone());
            let parse_msg = parse.to_string();
            prop_assert!(parse_msg.contains(&context));
            prop_assert!(parse_msg.contains(&details));

            let config = TelemetryError::config(reason.clone());
            prop_assert!(config.to_string().contains(&reason));
          }
        }
    }

    #[test]
    fn error_constructors_validation() {
        let file_error = TelemetryError::file_error(
            PathBuf::from("/test"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "test"),
        );
        assert!(matches!(file_error, TelemetryError::File { .. }));

        let short = TelemetryError::incomplete_read("graphics", 64, 10);
        assert!(matches!(short, TelemetryError::IncompleteRead { expected: 64, read: 10, .. }));
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<TelemetryError>();

        let error = TelemetryError::config("test");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn recovery_methods_work() {
        let short = TelemetryError::incomplete_read("telemetry", 10, 2);
        let layout = TelemetryError::Layout { record: "telemetry", span: 20, capacity: 10 };
        let version = TelemetryError::Version { supported: "1.2.0".into(), found: "2.0.0".into() };

        assert!(short.is_retryable());
        assert!(!layout.is_retryable());
        assert!(!version.is_retryable());

        for error in [&short, &layout, &version] {
            let suggestions = error.recovery_suggestions();
            assert!(!suggestions.is_empty());
            for suggestion in &suggestions {
                assert!(suggestion.len() > 5);
            }
        }
    }
}
