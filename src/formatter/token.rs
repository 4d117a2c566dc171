//! The intermediate token stream the pretty-printing engine consumes.
//!
//! Breaks can be consistent or inconsistent. In a consistent group, once
//! one break fires every break in the group fires; in an inconsistent
//! group each break decides for itself. A consistent group is preferred
//! where vertical alignment matters more than packing.

use crate::config::Configuration;
use crate::formatter::comment::Comment;
use crate::formatter::indent::{Indent, Indentation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBreakStyle {
    Consistent,
    Inconsistent,
}

/// What firing a given break means for indentation and continuation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakKind {
    /// Pushes one level of indentation; pairs with a `Close` break.
    Open,
    /// Pops the matching `Open` break. When `must_break` is set the break
    /// is forced whenever the open fired on a different line.
    Close { must_break: bool },
    /// If fired, the next line is a continuation line.
    Continue,
    /// If fired, produces a newline at the scope's own indentation.
    Same,
    /// Fires exactly when the current line is a continuation line, ending
    /// the continuation.
    Reset,
}

/// A pre-rendered block pasted into the output without reflow. The block's
/// own leading indentation is stripped on construction and replaced by the
/// printer's indentation at the paste site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verbatim {
    lines: Vec<String>,
}

impl Verbatim {
    pub fn new(text: &str) -> Self {
        let lines: Vec<&str> = text.split('\n').collect();
        let margin = lines
            .iter()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.len() - line.trim_start_matches([' ', '\t']).len())
            .min()
            .unwrap_or(0);
        let lines = lines
            .iter()
            .map(|line| {
                if line.trim().is_empty() {
                    String::new()
                } else {
                    line[margin.min(line.len())..].trim_end().to_string()
                }
            })
            .collect();
        Self { lines }
    }

    pub fn is_multiline(&self) -> bool {
        self.lines.len() > 1
    }

    /// Width of the block when it occupies a single line.
    pub fn single_line_width(&self) -> usize {
        self.lines.first().map_or(0, |line| line.chars().count())
    }

    /// Render with every line after the first prefixed by `indent`; the
    /// printer indents the first line the way it indents any other write.
    pub fn print(&self, indent: &[Indent], _config: &Configuration) -> String {
        let rendered = indent.render();
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                if i == 0 || line.is_empty() {
                    line.clone()
                } else {
                    format!("{rendered}{line}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Literal text of a lexical token.
    Syntax(String),
    /// Begins a group.
    Open(GroupBreakStyle),
    /// Ends the nearest open group.
    Close,
    /// A point where the printer may insert a newline; otherwise it emits
    /// `size` spaces. `ignores_discretionary` suppresses user line breaks
    /// immediately after this break.
    Break {
        kind: BreakKind,
        size: usize,
        ignores_discretionary: bool,
    },
    /// Mandatory horizontal spacing; never becomes a newline.
    Space { size: usize, flexible: bool },
    /// Forces `count` newlines, subject to the blank-line cap.
    Newlines { count: usize, discretionary: bool },
    /// A formatted comment. End-of-line comments are not charged to the
    /// line budget.
    Comment {
        comment: Comment,
        was_end_of_line: bool,
    },
    /// Pasted without reflow.
    Verbatim(Verbatim),
}

impl Token {
    /// Shorthand for a plain continuation break of one space.
    pub fn cont() -> Self {
        Token::Break {
            kind: BreakKind::Continue,
            size: 1,
            ignores_discretionary: false,
        }
    }

    pub fn space(size: usize) -> Self {
        Token::Space {
            size,
            flexible: false,
        }
    }
}

/// Where a token came from in the original source. `raw` holds the exact
/// bytes the token stands for (possibly empty for tokens whose bytes are
/// carried by a neighbour), so a window of unformatted tokens reproduces
/// the input slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub line: usize,
    pub raw: String,
}

/// The flat token sequence plus per-token origins, produced once per file
/// and never mutated afterwards.
#[derive(Debug, Default)]
pub struct TokenStream {
    tokens: Vec<Token>,
    origins: Vec<Option<Origin>>,
}

impl TokenStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: Token) {
        self.push_with_origin(token, None);
    }

    pub fn push_with_origin(&mut self, token: Token, origin: Option<Origin>) {
        self.tokens.push(token);
        self.origins.push(origin);
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn origin(&self, index: usize) -> Option<&Origin> {
        self.origins.get(index).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl From<Vec<Token>> for TokenStream {
    fn from(tokens: Vec<Token>) -> Self {
        let origins = vec![None; tokens.len()];
        Self { tokens, origins }
    }
}
