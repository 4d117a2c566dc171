//! Comment classification and rendering.

use crate::config::Configuration;
use crate::diagnostics::SourcePosition;
use crate::formatter::indent::{Indent, Indentation};
use crate::formatter::reflow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    /// `// …`
    Line,
    /// `/// …`
    DocLine,
    /// `/* … */`
    Block,
    /// `/** … */`
    DocBlock,
}

impl CommentKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Line => "//",
            Self::DocLine => "///",
            Self::Block => "/*",
            Self::DocBlock => "/**",
        }
    }

    /// Classify raw comment text by its prefix. `////` is an ordinary line
    /// comment and `/**/` an ordinary (empty) block comment.
    pub fn classify(text: &str) -> Self {
        if text.starts_with("///") && !text.starts_with("////") {
            Self::DocLine
        } else if text.starts_with("//") {
            Self::Line
        } else if text.starts_with("/**") && text.len() > 4 {
            Self::DocBlock
        } else {
            Self::Block
        }
    }
}

/// A comment lifted out of trivia: its kind, its body split into lines
/// (prefix characters stripped), and its precomputed visual length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub kind: CommentKind,
    pub lines: Vec<String>,
    pub length: usize,
    pub position: SourcePosition,
}

impl Comment {
    /// Build a comment from raw source text (prefix included).
    pub fn new(text: &str, position: SourcePosition) -> Self {
        let kind = CommentKind::classify(text);
        match kind {
            CommentKind::Line | CommentKind::DocLine => {
                let body = text[kind.prefix().len()..].to_string();
                Self {
                    kind,
                    length: text.chars().count(),
                    lines: vec![body],
                    position,
                }
            }
            CommentKind::Block | CommentKind::DocBlock => {
                let body = &text[kind.prefix().len()..text.len().saturating_sub(2).max(kind.prefix().len())];
                let lines: Vec<String> = body.split('\n').map(str::to_string).collect();
                // Prefix, terminator, and one separator per line break.
                let length = lines.iter().map(|l| l.chars().count()).sum::<usize>()
                    + kind.prefix().len()
                    + 2
                    + lines.len().saturating_sub(1);
                Self {
                    kind,
                    lines,
                    length,
                    position,
                }
            }
        }
    }

    /// Fold another doc line into this comment. Used when consecutive `///`
    /// lines are merged for Markdown reflow.
    pub fn absorb_doc_line(&mut self, other: &Comment) {
        debug_assert_eq!(self.kind, CommentKind::DocLine);
        self.lines.extend(other.lines.iter().cloned());
        self.length += other.length + 1;
    }

    /// Render the comment at the given indentation. Multi-line renderings
    /// embed the indentation themselves; the printer only indents the first
    /// line.
    pub fn print(&self, indent: &[Indent], config: &Configuration) -> String {
        match self.kind {
            CommentKind::Line => self.print_prefixed(indent, CommentKind::Line.prefix()),
            CommentKind::DocLine => {
                if config.reflow_doc_comments {
                    self.print_reflowed(indent, config)
                } else {
                    self.print_prefixed(indent, CommentKind::DocLine.prefix())
                }
            }
            CommentKind::Block | CommentKind::DocBlock => {
                format!("{}{}*/", self.kind.prefix(), self.lines.join("\n"))
            }
        }
    }

    fn print_prefixed(&self, indent: &[Indent], prefix: &str) -> String {
        let separator = format!("\n{}{}", indent.render(), prefix);
        format!("{prefix}{}", self.lines.join(&separator))
    }

    fn print_reflowed(&self, indent: &[Indent], config: &Configuration) -> String {
        let body: Vec<String> = self
            .lines
            .iter()
            .map(|line| trimming_leading_whitespace(line).to_string())
            .collect();
        let width = config
            .line_length
            .saturating_sub(indent.width(config))
            .saturating_sub(4);
        let wrapped = reflow::wrap_markdown(&body, width);
        let rendered: Vec<String> = wrapped
            .iter()
            .map(|line| {
                let line = reflow::normalize_quotes(line);
                format!("/// {line}").trim_end().to_string()
            })
            .collect();
        rendered.join(&format!("\n{}", indent.render()))
    }
}

/// Trim whitespace from the start of a string slice.
pub fn trimming_leading_whitespace(text: &str) -> &str {
    text.trim_start()
}

/// Trim whitespace from the end of a string slice.
pub fn trimming_trailing_whitespace(text: &str) -> &str {
    text.trim_end()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(line: usize) -> SourcePosition {
        SourcePosition::new(line, 1)
    }

    #[test]
    fn classify_kinds() {
        assert_eq!(CommentKind::classify("// c"), CommentKind::Line);
        assert_eq!(CommentKind::classify("/// d"), CommentKind::DocLine);
        assert_eq!(CommentKind::classify("//// banner"), CommentKind::Line);
        assert_eq!(CommentKind::classify("/* b */"), CommentKind::Block);
        assert_eq!(CommentKind::classify("/** d */"), CommentKind::DocBlock);
        assert_eq!(CommentKind::classify("/**/"), CommentKind::Block);
    }

    #[test]
    fn line_comment_length_counts_prefix() {
        let comment = Comment::new("// hello", at(1));
        assert_eq!(comment.length, 8);
        assert_eq!(comment.lines, vec![" hello"]);
    }

    #[test]
    fn line_comment_prints_with_prefix() {
        let config = Configuration::default();
        let comment = Comment::new("// hello", at(1));
        assert_eq!(comment.print(&[], &config), "// hello");
    }

    #[test]
    fn multi_line_line_comment_indents_continuations() {
        let config = Configuration::default();
        let mut comment = Comment::new("// one", at(1));
        comment.lines.push(" two".to_string());
        assert_eq!(
            comment.print(&[Indent::Spaces(2)], &config),
            "// one\n  // two"
        );
    }

    #[test]
    fn block_comment_round_trips_lines() {
        let config = Configuration::default();
        let comment = Comment::new("/* a\n   b */", at(1));
        assert_eq!(comment.lines, vec![" a", "   b "]);
        assert_eq!(comment.print(&[], &config), "/* a\n   b */");
    }

    #[test]
    fn doc_line_without_reflow_keeps_text() {
        let config = Configuration::default();
        let comment = Comment::new("/// Summary.", at(1));
        assert_eq!(comment.print(&[], &config), "/// Summary.");
    }

    #[test]
    fn doc_line_reflow_rewraps_and_prefixes() {
        let config = Configuration {
            reflow_doc_comments: true,
            line_length: 24,
            ..Configuration::default()
        };
        let mut comment = Comment::new("/// alpha beta gamma", at(1));
        comment.absorb_doc_line(&Comment::new("/// delta", at(2)));
        assert_eq!(
            comment.print(&[], &config),
            "/// alpha beta gamma\n/// delta"
        );
    }

    #[test]
    fn reflow_normalizes_typographic_quotes() {
        let config = Configuration {
            reflow_doc_comments: true,
            ..Configuration::default()
        };
        let comment = Comment::new("/// uses \u{201C}smart\u{201D} quotes", at(1));
        assert_eq!(comment.print(&[], &config), "/// uses \"smart\" quotes");
    }

    #[test]
    fn leading_trim_trims_the_start() {
        assert_eq!(trimming_leading_whitespace("  x "), "x ");
        assert_eq!(trimming_trailing_whitespace("  x "), "  x");
    }
}
