//! Declaration formatting / pretty-printing logic

pub mod builder;
pub mod comment;
pub mod context;
pub mod indent;
pub mod lengths;
pub mod printer;
pub mod reflow;
pub mod token;

use tracing::debug;

use crate::config::Configuration;
use crate::diagnostics::Diagnostic;
use crate::error::Result;
use crate::parser;

pub use context::{ApplicationRange, Context};

/// Formatted text plus any style observations made along the way.
#[derive(Debug)]
pub struct FormatResult {
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Format declaration source
pub fn format_source(
    input: &str,
    config: &Configuration,
    range: Option<ApplicationRange>,
) -> Result<FormatResult> {
    // Step 1: Parse
    let file = parser::parse(input)?;

    // Step 2: Lower the tree to the engine's token stream
    let stream = builder::build(&file, input, config);

    // Step 3: Print
    let mut context = Context::new(config.clone(), input, range);
    let text = printer::PrettyPrinter::new(&mut context, stream).pretty_print();
    let diagnostics = context.into_diagnostics();
    debug!(
        bytes = text.len(),
        diagnostics = diagnostics.len(),
        "formatted"
    );

    Ok(FormatResult { text, diagnostics })
}
