//! Error types and handling for packing operations

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for packing operations
#[derive(Debug, Error)]
pub enum PackError {
    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Processor ordering contains a cycle
    #[error("Cyclic processor ordering: {}", .processors.join(" -> "))]
    CyclicOrdering { processors: Vec<String> },

    /// A processor declares a relation to a processor that is not registered
    #[error("Processor '{processor}' declares an ordering relation to unknown processor '{target}'")]
    UnresolvedOrdering { processor: String, target: String },

    /// Source documents contain error diagnostics
    #[error("{} error(s) in project:\n{}", .diagnostics.len(), render_diagnostics(.diagnostics))]
    Diagnostics {
        diagnostics: Vec<crate::diagnostics::Diagnostic>,
    },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A processor failed
    #[error("Processor '{processor}' failed: {message}")]
    Processor { processor: String, message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Ordering,
    Diagnostics,
    Io,
    Processor,
    Internal,
}

fn render_diagnostics(diagnostics: &[crate::diagnostics::Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl PackError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            PackError::Config { .. } => ErrorKind::Config,
            PackError::CyclicOrdering { .. } | PackError::UnresolvedOrdering { .. } => {
                ErrorKind::Ordering
            }
            PackError::Diagnostics { .. } => ErrorKind::Diagnostics,
            PackError::Io { .. } => ErrorKind::Io,
            PackError::Processor { .. } => ErrorKind::Processor,
            PackError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a processor error
    pub fn processor_error(processor: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Processor {
            processor: processor.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for PackError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_names_processors() {
        let error = PackError::CyclicOrdering {
            processors: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(error.to_string(), "Cyclic processor ordering: a -> b -> a");
        assert_eq!(error.kind(), ErrorKind::Ordering);
    }

    #[test]
    fn test_io_error_keeps_path() {
        let error = PackError::io_error(
            "out/Script.cs",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked"),
        );
        assert!(error.to_string().contains("out/Script.cs"));
        assert_eq!(error.kind(), ErrorKind::Io);
    }
}
