//! Markdown-aware re-wrapping for doc comment bodies.
//!
//! The wrap is a greedy fill over words, with two Markdown concessions:
//! inline code spans are never split across lines, and structural lines
//! (fences, headings, bullets, tables) pass through untouched. Widths are
//! display widths, not byte counts.

use std::sync::LazyLock;

use regex::Regex;
use unicode_width::UnicodeWidthStr;

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(```|~~~)").unwrap());

static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*(?:[-*+]|\d+[.)])\s+)(.*)$").unwrap());

/// Split a paragraph into wrap-atomic chunks: whitespace runs, code spans
/// delimited by matching backtick runs, and plain words.
fn split_chunks(text: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let len = if rest.starts_with(char::is_whitespace) {
            rest.find(|c: char| !c.is_whitespace()).unwrap_or(rest.len())
        } else if rest.starts_with('`') {
            code_span_len(rest)
        } else {
            rest.find(|c: char| c.is_whitespace() || c == '`')
                .unwrap_or(rest.len())
        };
        chunks.push(&rest[..len]);
        rest = &rest[len..];
    }
    chunks
}

/// Length of the code span opening at the start of `text`, or the length of
/// the bare delimiter when it is never closed.
fn code_span_len(text: &str) -> usize {
    let delim = text.len() - text.trim_start_matches('`').len();
    let body = &text[delim..];
    let mut searched = 0;
    while let Some(pos) = body[searched..].find('`') {
        let run_start = searched + pos;
        let run = body[run_start..].len() - body[run_start..].trim_start_matches('`').len();
        if run == delim {
            return delim + run_start + run;
        }
        searched = run_start + run;
    }
    delim
}

/// Greedy fill of one paragraph to `width` columns.
fn fill_paragraph(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for chunk in split_chunks(text) {
        if chunk.chars().all(char::is_whitespace) {
            if !current.is_empty() {
                current.push(' ');
            }
            continue;
        }
        let candidate = current.width() + chunk.width();
        if !current.trim_end().is_empty() && candidate > width {
            lines.push(current.trim_end().to_string());
            current.clear();
        }
        current.push_str(chunk);
    }
    if !current.trim_end().is_empty() {
        lines.push(current.trim_end().to_string());
    }
    lines
}

/// Re-wrap a doc comment body to `width` columns, preserving Markdown
/// structure line-by-line. Paragraph text is joined and refilled; blank
/// lines, fenced code, headings, bullets and tables survive as-is.
pub fn wrap_markdown(lines: &[String], width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    let mut paragraph: Vec<String> = Vec::new();
    let mut in_fence = false;

    let flush = |paragraph: &mut Vec<String>, out: &mut Vec<String>| {
        if !paragraph.is_empty() {
            out.extend(fill_paragraph(&paragraph.join(" "), width));
            paragraph.clear();
        }
    };

    for line in lines {
        let trimmed = line.trim();
        if FENCE_RE.is_match(trimmed) {
            flush(&mut paragraph, &mut out);
            in_fence = !in_fence;
            out.push(line.trim_end().to_string());
            continue;
        }
        if in_fence {
            out.push(line.trim_end().to_string());
            continue;
        }
        if trimmed.is_empty() {
            flush(&mut paragraph, &mut out);
            out.push(String::new());
            continue;
        }
        if trimmed.starts_with('#') || trimmed.starts_with('|') || trimmed.starts_with('>') {
            flush(&mut paragraph, &mut out);
            out.push(line.trim_end().to_string());
            continue;
        }
        if let Some(cap) = BULLET_RE.captures(line) {
            flush(&mut paragraph, &mut out);
            let prefix = cap.get(1).unwrap().as_str();
            let rest = cap.get(2).unwrap().as_str();
            let hang = " ".repeat(prefix.width());
            let wrapped = fill_paragraph(rest, width.saturating_sub(prefix.width()).max(1));
            for (i, wrapped_line) in wrapped.iter().enumerate() {
                if i == 0 {
                    out.push(format!("{prefix}{wrapped_line}"));
                } else {
                    out.push(format!("{hang}{wrapped_line}"));
                }
            }
            continue;
        }
        paragraph.push(trimmed.to_string());
    }
    flush(&mut paragraph, &mut out);
    out
}

/// Replace typographic quotes with their ASCII forms.
pub fn normalize_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(input: &[&str]) -> Vec<String> {
        input.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn refills_a_paragraph() {
        let wrapped = wrap_markdown(&lines(&["A paragraph that is", "rewrapped wider."]), 40);
        assert_eq!(wrapped, vec!["A paragraph that is rewrapped wider."]);
    }

    #[test]
    fn splits_long_lines_at_word_boundaries() {
        let wrapped = wrap_markdown(&lines(&["one two three four five"]), 10);
        assert_eq!(wrapped, vec!["one two", "three four", "five"]);
    }

    #[test]
    fn code_spans_are_not_split() {
        let wrapped = wrap_markdown(&lines(&["use `a b c d` to do things"]), 12);
        assert_eq!(wrapped, vec!["use", "`a b c d` to", "do things"]);
    }

    #[test]
    fn fenced_code_passes_through() {
        let input = lines(&["before", "```", "let x = 1    ", "```", "after"]);
        let wrapped = wrap_markdown(&input, 80);
        assert_eq!(wrapped, vec!["before", "```", "let x = 1", "```", "after"]);
    }

    #[test]
    fn blank_lines_separate_paragraphs() {
        let wrapped = wrap_markdown(&lines(&["one", "", "two"]), 80);
        assert_eq!(wrapped, vec!["one", "", "two"]);
    }

    #[test]
    fn bullets_keep_prefix_and_hang_indent() {
        let wrapped = wrap_markdown(&lines(&["- alpha beta gamma delta"]), 14);
        assert_eq!(wrapped, vec!["- alpha beta", "  gamma delta"]);
    }

    #[test]
    fn quotes_normalize_to_ascii() {
        assert_eq!(normalize_quotes("\u{201C}hi\u{201D} it\u{2019}s"), "\"hi\" it's");
    }
}
