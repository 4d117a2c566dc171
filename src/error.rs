//! Error types for declfmt

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for declfmt operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for declfmt
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Parse error: {message}")]
    #[diagnostic(code(declfmt::parse_error))]
    ParseError {
        message: String,
        #[label("here")]
        span: Option<(usize, usize)>,
    },

    #[error("IO error: {0}")]
    #[diagnostic(code(declfmt::io_error))]
    IoError(#[from] std::io::Error),

    #[error("Config error: {message}")]
    #[diagnostic(code(declfmt::config_error))]
    ConfigError { message: String },
}

/// Build a parse error message that points at the offending line.
pub fn format_parse_error(input: &str, offset: usize, message: &str) -> String {
    let offset = offset.min(input.len());
    let before = &input[..offset];
    let line = before.chars().filter(|c| *c == '\n').count() + 1;
    let column = before.chars().rev().take_while(|c| *c != '\n').count() + 1;
    format!("{message} (line {line}, column {column})")
}
