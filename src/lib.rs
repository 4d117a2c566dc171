//! declfmt - An opinionated formatter for Swift-style declaration files
//!
//! This library provides the core formatting functionality for the declfmt
//! CLI: a two-pass, width-aware pretty printer driven by a token stream
//! lowered from the parsed declaration tree.

pub mod ast;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod formatter;
pub mod parser;

pub use config::Configuration;
pub use diagnostics::{Diagnostic, Severity};
pub use error::{Error, Result};
pub use formatter::{format_source, ApplicationRange, FormatResult};

/// Format declaration source with the default configuration and return the
/// formatted result
pub fn format(input: &str) -> Result<String> {
    Ok(format_source(input, &Configuration::default(), None)?.text)
}

/// Format declaration source with an explicit configuration
pub fn format_with(input: &str, config: &Configuration) -> Result<FormatResult> {
    format_source(input, config, None)
}

/// Format only the lines inside `range`, leaving the rest untouched
pub fn format_range(
    input: &str,
    config: &Configuration,
    range: ApplicationRange,
) -> Result<FormatResult> {
    format_source(input, config, Some(range))
}

/// Check if declaration source is already formatted
pub fn check(input: &str) -> Result<bool> {
    let formatted = format(input)?;
    Ok(formatted == input)
}
