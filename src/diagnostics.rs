//! Non-fatal style observations emitted while formatting.
//!
//! These never abort a run; they are collected by the per-file
//! [`Context`](crate::formatter::Context) and surfaced to the caller
//! alongside the formatted text.

use std::fmt;

/// A line/column pair in the original source, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourcePosition {
    pub line: usize,
    pub column: usize,
}

impl SourcePosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A single style observation tied to a source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub position: SourcePosition,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {} at {}", self.severity, self.message, self.position)
    }
}

/// Message used when a trailing comment does not fit the line budget.
pub const END_OF_LINE_COMMENT_TOO_LONG: &str = "End-of-line comment exceeds the line length";
