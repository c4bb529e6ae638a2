use std::error;
use std::fmt;

/// Convenient result type for SDK operations using [`OutpostError`] as the error type.
pub type OutpostResult<T> = Result<T, OutpostError>;

/// Error type for SDK operations.
///
/// Every error carries an [`ErrorKind`] for programmatic matching, a static
/// message naming what went wrong, and optionally a detail string holding the
/// offending input or the rendered underlying error. Task failures never
/// reach submitters through this type; it surfaces only from construction,
/// parsing, and transport code.
#[derive(Debug, Clone)]
pub struct OutpostError {
    kind: ErrorKind,
    message: &'static str,
    detail: Option<String>,
}

/// Specific categories of errors that can occur during SDK operations.
///
/// Error kinds are organized by functional area and failure mode.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    // Configuration errors
    ConfigError,
    InvalidDsn,
    ValidationError,

    // Dispatch errors
    TaskFailed,
    TransportError,
    ExecutorShutdown,

    // IO & serialization errors
    IoError,
    SerializationError,
    DeserializationError,

    // State errors
    InvalidState,

    // Unknown / uncategorized
    Unknown,
}

impl OutpostError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: &'static str) -> Self {
        Self {
            kind,
            message,
            detail: None,
        }
    }

    /// Attaches a detail string, replacing any previous one.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the static message naming what went wrong.
    pub fn message(&self) -> &'static str {
        self.message
    }

    /// Returns the detail string, if one was attached.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl fmt::Display for OutpostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }

        Ok(())
    }
}

impl error::Error for OutpostError {}

/// Converts [`std::io::Error`] to [`OutpostError`] with [`ErrorKind::IoError`].
impl From<std::io::Error> for OutpostError {
    fn from(err: std::io::Error) -> OutpostError {
        OutpostError::new(ErrorKind::IoError, "I/O operation failed").with_detail(err.to_string())
    }
}

/// Converts [`serde_json::Error`] to [`OutpostError`].
///
/// I/O failures keep [`ErrorKind::IoError`]; everything else (syntax, data,
/// unexpected end of input) is a malformed payload and maps to
/// [`ErrorKind::DeserializationError`].
impl From<serde_json::Error> for OutpostError {
    fn from(err: serde_json::Error) -> OutpostError {
        let kind = match err.classify() {
            serde_json::error::Category::Io => ErrorKind::IoError,
            _ => ErrorKind::DeserializationError,
        };

        OutpostError::new(kind, "JSON handling failed").with_detail(err.to_string())
    }
}

/// Converts configuration validation failures to [`OutpostError`] with
/// [`ErrorKind::ValidationError`].
impl From<outpost_config::shared::ValidationError> for OutpostError {
    fn from(err: outpost_config::shared::ValidationError) -> OutpostError {
        OutpostError::new(ErrorKind::ValidationError, "Invalid configuration")
            .with_detail(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bail;

    #[test]
    fn kind_and_message_are_preserved() {
        let err = OutpostError::new(ErrorKind::TransportError, "Event submission failed");
        assert_eq!(err.kind(), ErrorKind::TransportError);
        assert_eq!(err.message(), "Event submission failed");
        assert_eq!(err.detail(), None);
    }

    #[test]
    fn detail_is_attached_and_replaceable() {
        let err = OutpostError::new(ErrorKind::InvalidDsn, "DSN parsing failed")
            .with_detail("missing project id")
            .with_detail("missing public key");
        assert_eq!(err.detail(), Some("missing public key"));
    }

    #[test]
    fn display_appends_the_detail() {
        let plain = OutpostError::new(ErrorKind::TaskFailed, "Task execution failed");
        assert_eq!(plain.to_string(), "Task execution failed");

        let detailed = plain.with_detail("connection refused");
        assert_eq!(
            detailed.to_string(),
            "Task execution failed (connection refused)"
        );
    }

    #[test]
    fn bail_returns_early_with_the_error() {
        fn plain() -> OutpostResult<i32> {
            bail!(ErrorKind::ValidationError, "Invalid option");
        }

        fn detailed() -> OutpostResult<i32> {
            bail!(
                ErrorKind::ConfigError,
                "Bad configuration",
                "queue size is zero"
            );
        }

        let err = plain().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert_eq!(err.detail(), None);

        let err = detailed().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigError);
        assert_eq!(err.detail(), Some("queue size is zero"));
    }

    #[test]
    fn io_errors_convert_with_their_rendering() {
        let err = OutpostError::from(std::io::Error::other("disk gone"));
        assert_eq!(err.kind(), ErrorKind::IoError);
        assert!(err.detail().unwrap().contains("disk gone"));
    }

    #[test]
    fn json_errors_classify_by_category() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = OutpostError::from(json_err);
        assert_eq!(err.kind(), ErrorKind::DeserializationError);
        assert!(err.detail().is_some());
    }

    #[test]
    fn validation_errors_convert() {
        let config = outpost_config::shared::ExecutorConfig {
            core_pool_size: 0,
            ..outpost_config::shared::ExecutorConfig::default()
        };
        let err = OutpostError::from(config.validate().unwrap_err());
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert!(err.detail().unwrap().contains("core_pool_size"));
    }
}
