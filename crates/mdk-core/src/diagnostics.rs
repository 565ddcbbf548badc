//! Diagnostics reported while loading and parsing source documents

use std::fmt;

use serde::Serialize;

use crate::cst::{CstSpan, ParseError};

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => f.write_str("info"),
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// One-based line/column position plus the byte span it came from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
    pub span: CstSpan,
}

impl Location {
    /// Compute the line and column of `span.start` in `source`
    pub fn from_span(source: &str, span: CstSpan) -> Self {
        let offset = span.start.min(source.len());
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |index| index + 1);
        let column = before[line_start..].chars().count() + 1;
        Self { line, column, span }
    }
}

/// A diagnostic attached to a source document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Name of the document the diagnostic belongs to
    pub document: String,
    pub location: Location,
}

impl Diagnostic {
    pub fn error(document: impl Into<String>, message: impl Into<String>, location: Location) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            document: document.into(),
            location,
        }
    }

    pub fn from_parse_error(document: &str, source: &str, error: &ParseError) -> Self {
        Self::error(
            document,
            error.message.clone(),
            Location::from_span(source, error.span.clone()),
        )
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({},{}): {}: {}",
            self.document, self.location.line, self.location.column, self.severity, self.message
        )
    }
}
