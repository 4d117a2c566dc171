//! First pass of the engine: lookahead lengths.
//!
//! Every token is assigned the number of columns the printer must be able
//! to place before the next viable break point. Group and break lengths
//! start as a negative running total and are resolved when the matching
//! close (or the next break) is seen, so a single left-to-right walk
//! suffices.

use crate::formatter::token::{Token, TokenStream};

/// Output of the length scan: per-token lookahead lengths and the source
/// line each token originates from (synthesised tokens inherit the line of
/// the nearest preceding originating token).
#[derive(Debug)]
pub struct ScanResult {
    pub lengths: Vec<isize>,
    pub line_of_origin: Vec<usize>,
}

pub fn scan(stream: &TokenStream, max_line_length: usize) -> ScanResult {
    let tokens = stream.tokens();
    let max_line_length = max_line_length as isize;
    let mut lengths: Vec<isize> = Vec::with_capacity(tokens.len());
    let mut line_of_origin: Vec<usize> = Vec::with_capacity(tokens.len());
    let mut total: isize = 0;
    let mut delim_index_stack: Vec<usize> = Vec::new();
    let mut current_line = 1;

    for (i, token) in tokens.iter().enumerate() {
        if let Some(origin) = stream.origin(i) {
            current_line = origin.line;
        }
        line_of_origin.push(current_line);

        match token {
            Token::Syntax(text) => {
                let width = text.chars().count() as isize;
                lengths.push(width);
                total += width;
            }

            Token::Open(_) => {
                lengths.push(-total);
                delim_index_stack.push(i);
            }

            Token::Close => {
                lengths.push(0);
                let index = delim_index_stack
                    .pop()
                    .unwrap_or_else(|| panic!("unmatched close group at token {i}"));
                lengths[index] += total;
                // A break immediately preceding the close never fires into
                // the whitespace trailing the group; resolve the group it
                // covered for as well.
                if matches!(tokens[index], Token::Break { .. }) {
                    let open_index = delim_index_stack
                        .pop()
                        .unwrap_or_else(|| panic!("unmatched close group at token {i}"));
                    lengths[open_index] += total;
                }
            }

            Token::Break { size, .. } => {
                if let Some(&index) = delim_index_stack.last() {
                    if matches!(tokens[index], Token::Break { .. }) {
                        lengths[index] += total;
                        delim_index_stack.pop();
                    }
                }
                lengths.push(-total);
                delim_index_stack.push(i);
                total += *size as isize;
            }

            Token::Newlines { .. } => {
                if let Some(&index) = delim_index_stack.last() {
                    if matches!(tokens[index], Token::Break { .. }) {
                        lengths[index] += total;
                        delim_index_stack.pop();
                    }
                }
                // A hard newline makes every enclosing group too wide to
                // fit, so containing groups must break.
                lengths.push(max_line_length);
                total += max_line_length;
            }

            Token::Comment {
                comment,
                was_end_of_line,
            } => {
                lengths.push(comment.length as isize);
                if !was_end_of_line {
                    total += comment.length as isize;
                }
            }

            Token::Verbatim(verbatim) => {
                let length = if verbatim.is_multiline() {
                    max_line_length
                } else {
                    verbatim.single_line_width() as isize
                };
                lengths.push(length);
                total += length;
            }

            Token::Space { size, .. } => {
                lengths.push(*size as isize);
                total += *size as isize;
            }
        }
    }

    while let Some(index) = delim_index_stack.pop() {
        match tokens[index] {
            Token::Break { .. } => lengths[index] += total,
            _ => panic!(
                "unclosed open group at token {index}: {:?}",
                tokens[index]
            ),
        }
    }

    ScanResult {
        lengths,
        line_of_origin,
    }
}
