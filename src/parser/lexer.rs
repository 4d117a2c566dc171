//! Tokenization of declaration source.
//!
//! The lexer produces syntax tokens that carry their exact source text,
//! byte span, line/column position, and the trivia (newline runs and
//! comments) that precedes them. Trivia pieces keep their raw bytes so a
//! partially formatted file can reproduce untouched regions exactly.

use winnow::ascii::digit1;
use winnow::combinator::{alt, opt, preceded};
use winnow::error::{ContextError, ErrMode, ModalResult};
use winnow::prelude::*;
use winnow::token::{literal, one_of, take_while};

use crate::diagnostics::SourcePosition;
use crate::error::{format_parse_error, Error, Result};

/// Token types for the declaration lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    Extension,
    Struct,
    Func,
    Let,
    Var,
    Where,
    If,
    Else,
    Return,
    Public,
    Private,
    Internal,
    Fileprivate,
    Static,
    Final,

    // Identifiers and literals
    Identifier,
    IntegerLiteral,
    FloatLiteral,
    StringLiteral,

    // Punctuation
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,
    Equals,
    Arrow,
    Dot,
    Question,

    /// `+`, `==`, `&&` and friends
    Operator,

    /// End of input; carries the file's trailing trivia
    Eof,
}

impl TokenKind {
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            Self::Public | Self::Private | Self::Internal | Self::Fileprivate | Self::Static | Self::Final
        )
    }
}

/// A byte span in the source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriviaKind {
    /// A run of line terminators (horizontal whitespace in between is kept
    /// in the raw bytes only).
    Newlines { count: usize },
    /// One comment, text as written, prefix included.
    Comment {
        text: String,
        position: SourcePosition,
    },
}

/// One piece of trivia with the exact bytes it stands for, including any
/// horizontal whitespace that preceded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriviaPiece {
    pub kind: TriviaKind,
    pub raw: String,
    pub line: usize,
}

/// A lexed token with position, span and leading trivia.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxToken {
    pub kind: TokenKind,
    /// Exact source text of the token itself.
    pub text: String,
    /// Horizontal whitespace between the last trivia piece (or previous
    /// token) and this token's text.
    pub prefix: String,
    pub leading_trivia: Vec<TriviaPiece>,
    pub position: SourcePosition,
    pub span: Span,
}

impl SyntaxToken {
    /// The bytes this token stands for when emitted unformatted.
    pub fn raw(&self) -> String {
        format!("{}{}", self.prefix, self.text)
    }
}

/// Tokenize declaration source into syntax tokens; the final token is
/// always `Eof` and carries the file's trailing trivia.
pub fn tokenize(input: &str) -> Result<Vec<SyntaxToken>> {
    Lexer::new(input).run()
}

struct Lexer<'s> {
    input: &'s str,
    pos: usize,
    line: usize,
    line_start: usize,
}

impl<'s> Lexer<'s> {
    fn new(input: &'s str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            line_start: 0,
        }
    }

    fn run(mut self) -> Result<Vec<SyntaxToken>> {
        let mut tokens = Vec::new();
        loop {
            let trivia = self.consume_trivia()?;
            let prefix_start = self.pos;
            self.consume_horizontal_whitespace();
            let prefix = self.input[prefix_start..self.pos].to_string();

            if self.pos >= self.input.len() {
                tokens.push(SyntaxToken {
                    kind: TokenKind::Eof,
                    text: String::new(),
                    prefix,
                    leading_trivia: trivia,
                    position: self.position(),
                    span: Span::new(self.pos, self.pos),
                });
                return Ok(tokens);
            }

            let start = self.pos;
            let position = self.position();
            let mut remaining = &self.input[self.pos..];
            let kind = match parse_token(&mut remaining) {
                Ok(kind) => kind,
                Err(_) => {
                    let preview: String = self.input[self.pos..].chars().take(20).collect();
                    let message = format_parse_error(
                        self.input,
                        self.pos,
                        &format!("Unexpected character near: {preview}"),
                    );
                    return Err(Error::ParseError {
                        message,
                        span: Some((self.pos, 1)),
                    });
                }
            };
            self.pos = self.input.len() - remaining.len();
            let text = self.input[start..self.pos].to_string();
            let kind = if kind == TokenKind::Identifier {
                keyword_kind(&text).unwrap_or(TokenKind::Identifier)
            } else {
                kind
            };
            tokens.push(SyntaxToken {
                kind,
                text,
                prefix,
                leading_trivia: trivia,
                position,
                span: Span::new(start, self.pos),
            });
        }
    }

    fn position(&self) -> SourcePosition {
        SourcePosition::new(self.line, self.pos - self.line_start + 1)
    }

    fn consume_horizontal_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        let trimmed = rest.trim_start_matches([' ', '\t', '\r']);
        self.pos += rest.len() - trimmed.len();
    }

    /// Consume newline runs and comments up to the next token, keeping the
    /// exact bytes of each piece.
    fn consume_trivia(&mut self) -> Result<Vec<TriviaPiece>> {
        let mut pieces = Vec::new();
        loop {
            let piece_start = self.pos;
            self.consume_horizontal_whitespace();
            let rest = &self.input[self.pos..];
            if rest.starts_with('\n') {
                let line = self.line;
                let mut count = 0;
                while self.input[self.pos..].starts_with('\n')
                    || self.input[self.pos..].starts_with(['\r', ' ', '\t'])
                {
                    if self.input.as_bytes()[self.pos] == b'\n' {
                        count += 1;
                        self.line += 1;
                        self.line_start = self.pos + 1;
                        if !has_more_newlines(&self.input[self.pos + 1..]) {
                            self.pos += 1;
                            break;
                        }
                    }
                    self.pos += 1;
                }
                pieces.push(TriviaPiece {
                    kind: TriviaKind::Newlines { count },
                    raw: self.input[piece_start..self.pos].to_string(),
                    line,
                });
            } else if rest.starts_with("//") {
                let position = self.position();
                let line = self.line;
                let end = rest.find('\n').map_or(self.input.len(), |i| self.pos + i);
                let text = self.input[self.pos..end].to_string();
                self.pos = end;
                pieces.push(TriviaPiece {
                    kind: TriviaKind::Comment { text, position },
                    raw: self.input[piece_start..self.pos].to_string(),
                    line,
                });
            } else if rest.starts_with("/*") {
                let position = self.position();
                let line = self.line;
                let text = self.consume_block_comment()?;
                pieces.push(TriviaPiece {
                    kind: TriviaKind::Comment { text, position },
                    raw: self.input[piece_start..self.pos].to_string(),
                    line,
                });
            } else {
                // Unread the horizontal whitespace; it belongs to the next
                // token's prefix.
                self.pos = piece_start;
                return Ok(pieces);
            }
        }
    }

    fn consume_block_comment(&mut self) -> Result<String> {
        let start = self.pos;
        let mut depth = 0usize;
        while self.pos < self.input.len() {
            let rest = &self.input[self.pos..];
            if rest.starts_with("/*") {
                depth += 1;
                self.pos += 2;
            } else if rest.starts_with("*/") {
                depth -= 1;
                self.pos += 2;
                if depth == 0 {
                    return Ok(self.input[start..self.pos].to_string());
                }
            } else {
                if self.input.as_bytes()[self.pos] == b'\n' {
                    self.line += 1;
                    self.line_start = self.pos + 1;
                }
                let c = rest.chars().next().unwrap();
                self.pos += c.len_utf8();
            }
        }
        let message = format_parse_error(self.input, start, "Unterminated block comment");
        Err(Error::ParseError {
            message,
            span: Some((start, 2)),
        })
    }
}

/// Whether another newline occurs before the next non-whitespace byte.
fn has_more_newlines(rest: &str) -> bool {
    rest.trim_start_matches([' ', '\t', '\r']).starts_with('\n')
}

fn parse_token(input: &mut &str) -> ModalResult<TokenKind> {
    alt((
        parse_string_literal,
        parse_number,
        parse_punctuation,
        parse_operator,
        parse_keyword_or_identifier,
    ))
    .parse_next(input)
}

fn parse_string_literal(input: &mut &str) -> ModalResult<TokenKind> {
    let _ = literal("\"").parse_next(input)?;
    loop {
        if input.is_empty() || input.starts_with('\n') {
            return Err(ErrMode::Cut(ContextError::new()));
        }
        if input.starts_with("\\\"") || input.starts_with("\\\\") {
            *input = &input[2..];
        } else if input.starts_with('"') {
            *input = &input[1..];
            return Ok(TokenKind::StringLiteral);
        } else {
            let c = input.chars().next().unwrap();
            *input = &input[c.len_utf8()..];
        }
    }
}

fn parse_number(input: &mut &str) -> ModalResult<TokenKind> {
    if !input.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    let _ = digit1.parse_next(input)?;
    let fraction: Option<&str> = opt(preceded(".", digit1)).parse_next(input)?;
    if fraction.is_some() {
        Ok(TokenKind::FloatLiteral)
    } else {
        Ok(TokenKind::IntegerLiteral)
    }
}

fn parse_punctuation(input: &mut &str) -> ModalResult<TokenKind> {
    alt((
        literal("->").map(|_| TokenKind::Arrow),
        literal("{").map(|_| TokenKind::LBrace),
        literal("}").map(|_| TokenKind::RBrace),
        literal("(").map(|_| TokenKind::LParen),
        literal(")").map(|_| TokenKind::RParen),
        literal("[").map(|_| TokenKind::LBracket),
        literal("]").map(|_| TokenKind::RBracket),
        literal(",").map(|_| TokenKind::Comma),
        literal(":").map(|_| TokenKind::Colon),
        literal(";").map(|_| TokenKind::Semicolon),
        literal(".").map(|_| TokenKind::Dot),
        literal("?").map(|_| TokenKind::Question),
    ))
    .parse_next(input)
}

fn parse_operator(input: &mut &str) -> ModalResult<TokenKind> {
    alt((
        alt((
            literal("=="),
            literal("!="),
            literal("<="),
            literal(">="),
            literal("&&"),
            literal("||"),
        ))
        .map(|_| TokenKind::Operator),
        literal("=").map(|_| TokenKind::Equals),
        one_of(['+', '-', '*', '/', '%', '<', '>', '!', '&', '|']).map(|_| TokenKind::Operator),
    ))
    .parse_next(input)
}

fn parse_keyword_or_identifier(input: &mut &str) -> ModalResult<TokenKind> {
    let _ = one_of(|c: char| c.is_alphabetic() || c == '_').parse_next(input)?;
    let _ = take_while(0.., |c: char| c.is_alphanumeric() || c == '_').parse_next(input)?;
    Ok(TokenKind::Identifier)
}

/// Resolve identifiers that are keywords. Done on the consumed text so the
/// identifier parser stays trivial.
pub fn keyword_kind(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "extension" => TokenKind::Extension,
        "struct" => TokenKind::Struct,
        "func" => TokenKind::Func,
        "let" => TokenKind::Let,
        "var" => TokenKind::Var,
        "where" => TokenKind::Where,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "return" => TokenKind::Return,
        "public" => TokenKind::Public,
        "private" => TokenKind::Private,
        "internal" => TokenKind::Internal,
        "fileprivate" => TokenKind::Fileprivate,
        "static" => TokenKind::Static,
        "final" => TokenKind::Final,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenize_keywords_and_identifiers() {
        assert_eq!(
            kinds("extension Foo"),
            vec![TokenKind::Extension, TokenKind::Identifier, TokenKind::Eof]
        );
    }

    #[test]
    fn tokenize_punctuation() {
        assert_eq!(
            kinds("{ } ( ) : , ; . ? ->"),
            vec![
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Colon,
                TokenKind::Comma,
                TokenKind::Semicolon,
                TokenKind::Dot,
                TokenKind::Question,
                TokenKind::Arrow,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tokenize_literals() {
        assert_eq!(
            kinds("42 3.25 \"hi \\\" there\""),
            vec![
                TokenKind::IntegerLiteral,
                TokenKind::FloatLiteral,
                TokenKind::StringLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tokenize_operators() {
        assert_eq!(
            kinds("== != = < + &&"),
            vec![
                TokenKind::Operator,
                TokenKind::Operator,
                TokenKind::Equals,
                TokenKind::Operator,
                TokenKind::Operator,
                TokenKind::Operator,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tokens_carry_text_and_span() {
        let tokens = tokenize("let abc").unwrap();
        assert_eq!(tokens[1].text, "abc");
        assert_eq!(tokens[1].span, Span::new(4, 7));
        assert_eq!(tokens[1].position, SourcePosition::new(1, 5));
        assert_eq!(tokens[1].prefix, " ");
    }

    #[test]
    fn newline_trivia_counts_terminators() {
        let tokens = tokenize("a\n\n\nb").unwrap();
        let trivia = &tokens[1].leading_trivia;
        assert_eq!(trivia.len(), 1);
        assert_eq!(trivia[0].kind, TriviaKind::Newlines { count: 3 });
        assert_eq!(trivia[0].raw, "\n\n\n");
    }

    #[test]
    fn comment_trivia_keeps_text_and_position() {
        let tokens = tokenize("let a\n// note\nlet b").unwrap();
        let trivia = &tokens[2].leading_trivia;
        assert_eq!(trivia.len(), 3);
        assert_eq!(trivia[0].kind, TriviaKind::Newlines { count: 1 });
        assert_eq!(
            trivia[1].kind,
            TriviaKind::Comment {
                text: "// note".to_string(),
                position: SourcePosition::new(2, 1),
            }
        );
        assert_eq!(trivia[2].kind, TriviaKind::Newlines { count: 1 });
    }

    #[test]
    fn end_of_line_comment_precedes_newline_piece() {
        let tokens = tokenize("let a // note\nlet b").unwrap();
        let trivia = &tokens[2].leading_trivia;
        assert_eq!(
            trivia[0].kind,
            TriviaKind::Comment {
                text: "// note".to_string(),
                position: SourcePosition::new(1, 7),
            }
        );
        assert_eq!(trivia[0].raw, " // note");
        assert_eq!(trivia[1].kind, TriviaKind::Newlines { count: 1 });
    }

    #[test]
    fn nested_block_comment() {
        let tokens = tokenize("/* outer /* inner */ still */ let").unwrap();
        match &tokens[0].leading_trivia[0].kind {
            TriviaKind::Comment { text, .. } => {
                assert_eq!(text, "/* outer /* inner */ still */");
            }
            other => panic!("expected comment, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_block_comment_is_an_error() {
        assert!(tokenize("/* never closed").is_err());
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(tokenize("\"open").is_err());
    }

    #[test]
    fn raw_bytes_round_trip() {
        let input = "  let a = 1  // note\n\n  let b = 2\n";
        let tokens = tokenize(input).unwrap();
        let mut rebuilt = String::new();
        for token in &tokens {
            for piece in &token.leading_trivia {
                rebuilt.push_str(&piece.raw);
            }
            rebuilt.push_str(&token.prefix);
            rebuilt.push_str(&token.text);
        }
        assert_eq!(rebuilt, input);
    }
}
