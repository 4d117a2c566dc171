//! Second pass of the engine: the printer.
//!
//! Consumes the token stream in order, deciding for each break whether it
//! fires by comparing the token's lookahead length against the space left
//! on the current line. Indentation is a stack of units fed by open breaks
//! and continuations; open/close break scopes and syntactic groups are
//! tracked on separate stacks because the two structures need not nest
//! inside one another.

use tracing::debug;

use crate::diagnostics::{Severity, SourcePosition, END_OF_LINE_COMMENT_TOO_LONG};
use crate::formatter::comment::Comment;
use crate::formatter::context::Context;
use crate::formatter::indent::{Indent, Indentation};
use crate::formatter::lengths::{scan, ScanResult};
use crate::formatter::token::{BreakKind, GroupBreakStyle, Token, TokenStream, Verbatim};

/// One fired open break whose close has not been seen yet.
#[derive(Debug, Clone, Copy)]
struct ActiveOpenBreak {
    /// Line number the open break was processed on.
    open_line: usize,
    /// Whether this scope currently owns a unit on the indentation stack.
    did_indent: bool,
}

pub struct PrettyPrinter<'a> {
    context: &'a mut Context,
    stream: TokenStream,
    lengths: Vec<isize>,
    line_of_origin: Vec<usize>,

    output: String,
    line_number: usize,
    is_at_start_of_line: bool,
    consecutive_newline_count: usize,
    pending_spaces: usize,
    space_remaining: isize,

    indent_stack: Vec<Indent>,
    continuation_stack: Vec<bool>,
    active_open_breaks: Vec<ActiveOpenBreak>,
    force_break_stack: Vec<bool>,

    current_line_is_continuation: bool,
    last_break_kind: BreakKind,
    last_break: bool,
}

impl<'a> PrettyPrinter<'a> {
    pub fn new(context: &'a mut Context, stream: TokenStream) -> Self {
        let max_line_length = context.config.line_length;
        let ScanResult {
            lengths,
            line_of_origin,
        } = scan(&stream, max_line_length);
        Self {
            context,
            stream,
            lengths,
            line_of_origin,
            output: String::new(),
            line_number: 1,
            is_at_start_of_line: true,
            consecutive_newline_count: 0,
            pending_spaces: 0,
            space_remaining: max_line_length as isize,
            indent_stack: Vec::new(),
            continuation_stack: Vec::new(),
            active_open_breaks: Vec::new(),
            force_break_stack: Vec::new(),
            current_line_is_continuation: false,
            last_break_kind: BreakKind::Same,
            last_break: false,
        }
    }

    /// Run the printer over the whole stream and return the output text.
    pub fn pretty_print(mut self) -> String {
        debug!(tokens = self.stream.len(), "pretty printing");
        for index in 0..self.stream.len() {
            if self.should_format(index) {
                self.print_token(index);
            } else {
                self.skip_token(index);
            }
        }
        assert!(
            self.active_open_breaks.is_empty(),
            "at least one open break was not matched by a close break"
        );
        assert!(
            self.continuation_stack.is_empty(),
            "continuation state leaked past the end of the stream"
        );
        self.output
    }

    fn should_format(&self, index: usize) -> bool {
        match self.context.range {
            None => true,
            Some(range) => range.contains(self.line_of_origin[index]),
        }
    }

    fn print_token(&mut self, index: usize) {
        let token = self.stream.tokens()[index].clone();
        match token {
            Token::Open(style) => {
                let length = self.lengths[index];
                let force = style == GroupBreakStyle::Consistent
                    && (length > self.space_remaining || self.last_break);
                self.force_break_stack.push(force);
            }

            Token::Close => {
                self.force_break_stack
                    .pop()
                    .unwrap_or_else(|| panic!("unmatched close group at token {index}"));
            }

            Token::Break { kind, size, .. } => self.print_break(index, kind, size),

            Token::Space { size, .. } => self.enqueue_spaces(size),

            Token::Newlines {
                count,
                discretionary,
            } => {
                self.current_line_is_continuation = self.last_break_kind == BreakKind::Continue;
                self.write_newlines(count, discretionary);
                self.last_break = true;
            }

            Token::Syntax(text) => {
                if !text.is_empty() {
                    self.write(&text);
                    self.space_remaining -= text.chars().count() as isize;
                    self.last_break = false;
                }
            }

            Token::Comment {
                comment,
                was_end_of_line,
            } => self.print_comment(index, &comment, was_end_of_line),

            Token::Verbatim(verbatim) => self.print_verbatim(index, &verbatim),
        }
    }

    fn print_break(&mut self, index: usize, kind: BreakKind, size: usize) {
        self.last_break_kind = kind;
        let mut must_break = self.force_break_stack.last().copied().unwrap_or(false);
        let mut continuation_if_fires = false;

        match kind {
            BreakKind::Open => {
                let open_line = self.open_close_compensating_line_number();
                let folds_into_previous = self
                    .active_open_breaks
                    .last()
                    .is_some_and(|active| active.open_line == open_line);
                if folds_into_previous {
                    // Same line as the previous open: its indentation unit
                    // is taken over by this scope.
                    self.active_open_breaks.last_mut().unwrap().did_indent = false;
                } else {
                    self.indent_stack.push(self.context.config.indentation);
                    if self.current_line_is_continuation {
                        // Continuation indentation persists into the new
                        // scope.
                        self.indent_stack.push(self.context.config.indentation);
                    }
                }
                self.continuation_stack
                    .push(self.current_line_is_continuation);
                self.active_open_breaks.push(ActiveOpenBreak {
                    open_line,
                    did_indent: true,
                });
                self.current_line_is_continuation = false;
            }

            BreakKind::Close {
                must_break: close_must_break,
            } => {
                let matched = self.active_open_breaks.pop().unwrap_or_else(|| {
                    panic!("unmatched close break at token {index}")
                });
                let close_line = self.open_close_compensating_line_number();
                if matched.did_indent {
                    let transfers_outward = matched.open_line == close_line
                        && self
                            .active_open_breaks
                            .last()
                            .is_some_and(|outer| !outer.did_indent);
                    if transfers_outward {
                        // Indentation ownership moves back to the scope it
                        // was folded out of.
                        self.active_open_breaks.last_mut().unwrap().did_indent = true;
                    } else {
                        self.indent_stack.pop();
                    }
                }
                let was_continuation = self.continuation_stack.pop().unwrap_or_else(|| {
                    panic!("unmatched close break at token {index}")
                });
                if was_continuation {
                    self.indent_stack.pop();
                }

                if close_must_break {
                    must_break = matched.open_line != close_line;
                } else if self.space_remaining == 0 {
                    must_break = true;
                } else if matched.open_line != close_line {
                    self.current_line_is_continuation = matched.did_indent;
                }
                self.current_line_is_continuation |= was_continuation;
                continuation_if_fires = was_continuation;
            }

            BreakKind::Continue => continuation_if_fires = true,

            BreakKind::Same => {}

            BreakKind::Reset => must_break = self.current_line_is_continuation,
        }

        if self.lengths[index] > self.space_remaining || must_break {
            self.write_newlines(1, false);
            self.current_line_is_continuation = continuation_if_fires;
            self.last_break = true;
        } else {
            self.enqueue_spaces(size);
            if self.is_at_start_of_line {
                self.current_line_is_continuation = continuation_if_fires;
            }
            self.last_break = false;
        }
    }

    fn print_comment(&mut self, index: usize, comment: &Comment, was_end_of_line: bool) {
        let indent = self.current_indentation();
        let rendered = comment.print(&indent, &self.context.config);
        self.write(&rendered);
        self.line_number += rendered.matches('\n').count();
        if was_end_of_line {
            if comment.length as isize > self.space_remaining {
                let position = self.comment_position(index, comment);
                self.context
                    .diagnose(Severity::Warning, END_OF_LINE_COMMENT_TOO_LONG, position);
            }
        } else {
            self.space_remaining -= comment.length as isize;
        }
    }

    fn comment_position(&self, index: usize, comment: &Comment) -> SourcePosition {
        if comment.position != SourcePosition::default() {
            comment.position
        } else {
            SourcePosition::new(self.line_of_origin[index], 1)
        }
    }

    fn print_verbatim(&mut self, index: usize, verbatim: &Verbatim) {
        let indent = self.current_indentation();
        let rendered = verbatim.print(&indent, &self.context.config);
        self.write(&rendered);
        self.line_number += rendered.matches('\n').count();
        self.consecutive_newline_count = 0;
        self.space_remaining -= self.lengths[index];
    }

    /// Emit a token outside the application window: raw origin bytes only,
    /// with scope bookkeeping kept alive so balance survives the window
    /// seams.
    fn skip_token(&mut self, index: usize) {
        let token = self.stream.tokens()[index].clone();
        match token {
            Token::Open(_) => self.force_break_stack.push(false),
            Token::Close => {
                self.force_break_stack
                    .pop()
                    .unwrap_or_else(|| panic!("unmatched close group at token {index}"));
            }
            Token::Break { kind, .. } => self.track_break_outside_window(index, kind),
            _ => {
                if let Some(origin) = self.stream.origin(index) {
                    let raw = origin.raw.clone();
                    self.write_raw(&raw);
                }
            }
        }
    }

    fn track_break_outside_window(&mut self, index: usize, kind: BreakKind) {
        self.last_break_kind = kind;
        match kind {
            BreakKind::Open => {
                self.continuation_stack
                    .push(self.current_line_is_continuation);
                self.active_open_breaks.push(ActiveOpenBreak {
                    open_line: self.open_close_compensating_line_number(),
                    did_indent: false,
                });
            }
            BreakKind::Close { .. } => {
                let matched = self.active_open_breaks.pop().unwrap_or_else(|| {
                    panic!("unmatched close break at token {index}")
                });
                if matched.did_indent {
                    self.indent_stack.pop();
                }
                let was_continuation = self.continuation_stack.pop().unwrap_or_else(|| {
                    panic!("unmatched close break at token {index}")
                });
                if was_continuation {
                    self.indent_stack.pop();
                }
            }
            _ => {}
        }
    }

    /// The line used to pair open and close breaks. Immediately after a
    /// newline nothing has been written yet, so for pairing purposes we
    /// are still on the previous line.
    fn open_close_compensating_line_number(&self) -> usize {
        if self.is_at_start_of_line {
            self.line_number - 1
        } else {
            self.line_number
        }
    }

    /// The indentation of the line being written: the stack plus one unit
    /// when the line is a continuation line.
    fn current_indentation(&self) -> Vec<Indent> {
        let mut indentation = self.indent_stack.clone();
        if self.current_line_is_continuation {
            indentation.push(self.context.config.indentation);
        }
        indentation
    }

    fn enqueue_spaces(&mut self, count: usize) {
        self.pending_spaces += count;
        self.space_remaining -= count as isize;
    }

    fn write(&mut self, text: &str) {
        if self.is_at_start_of_line {
            let indentation = self.current_indentation();
            self.output.push_str(&indentation.render());
            self.space_remaining = self.context.config.line_length as isize
                - indentation.width(&self.context.config) as isize;
            self.is_at_start_of_line = false;
        } else if self.pending_spaces > 0 {
            self.output.push_str(&" ".repeat(self.pending_spaces));
        }
        self.output.push_str(text);
        self.consecutive_newline_count = 0;
        self.pending_spaces = 0;
    }

    fn write_newlines(&mut self, count: usize, discretionary: bool) {
        let cap = self.context.config.maximum_blank_lines + 1;
        let to_write = count.min(cap) as isize - self.consecutive_newline_count as isize;
        // Non-discretionary breaks never pile newlines onto blank lines
        // the user already has.
        if to_write > 0 && (discretionary || self.consecutive_newline_count == 0) {
            let to_write = to_write as usize;
            self.output.push_str(&"\n".repeat(to_write));
            self.line_number += to_write;
            self.is_at_start_of_line = true;
            self.consecutive_newline_count += to_write;
            self.pending_spaces = 0;
        }
    }

    /// Append original source bytes untouched, keeping the line counters
    /// coherent for the formatted region that follows.
    fn write_raw(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.output.push_str(text);
        let newlines = text.matches('\n').count();
        self.line_number += newlines;
        self.pending_spaces = 0;
        match text.rsplit_once('\n') {
            Some((_, tail)) if tail.is_empty() => {
                self.is_at_start_of_line = true;
                self.consecutive_newline_count = text
                    .chars()
                    .rev()
                    .take_while(|c| *c == '\n')
                    .count();
            }
            Some((_, tail)) => {
                self.is_at_start_of_line = false;
                self.consecutive_newline_count = 0;
                self.space_remaining =
                    self.context.config.line_length as isize - tail.chars().count() as isize;
            }
            None => {
                self.is_at_start_of_line = false;
                self.consecutive_newline_count = 0;
                self.space_remaining -= text.chars().count() as isize;
            }
        }
    }
}
