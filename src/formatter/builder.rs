//! Lowering of the syntax tree into the engine's token stream.
//!
//! Each construct emits its tokens in source order, interleaved with the
//! grouping and break tokens that encode how it may wrap. Trivia is walked
//! alongside: comments become comment tokens, newline runs become
//! discretionary newline tokens, and everything keeps its original bytes
//! for the partial-formatting window.

use tracing::debug;

use crate::ast::*;
use crate::config::Configuration;
use crate::formatter::comment::{Comment, CommentKind};
use crate::formatter::token::{BreakKind, GroupBreakStyle, Origin, Token, TokenStream, Verbatim};
use crate::parser::lexer::{SyntaxToken, TokenKind, TriviaKind, TriviaPiece};

/// Comment text that exempts the following declaration from formatting.
pub const IGNORE_DIRECTIVE: &str = "declfmt-ignore";

pub fn build(file: &SourceFile, source: &str, config: &Configuration) -> TokenStream {
    let mut builder = Builder {
        config,
        source,
        stream: TokenStream::new(),
        last_line: 0,
        pending_skip: 0,
        has_content: false,
    };
    builder.source_file(file);
    debug!(tokens = builder.stream.len(), "token stream built");
    builder.stream
}

/// A trivia piece after comment construction and doc-line merging.
#[derive(Debug)]
enum Prepared {
    Newlines {
        count: usize,
        line: usize,
        raw: String,
    },
    Comment {
        comment: Comment,
        raw: String,
        end_line: usize,
    },
}

struct Builder<'a> {
    config: &'a Configuration,
    source: &'a str,
    stream: TokenStream,
    /// Line of the most recently emitted syntax text; used to spot
    /// comments that trail code on the same line.
    last_line: usize,
    /// Trivia pieces of the next token already emitted by a separator.
    pending_skip: usize,
    /// Whether any printable token has been emitted yet. Leading blank
    /// lines are dropped until this flips.
    has_content: bool,
}

impl<'a> Builder<'a> {
    fn push(&mut self, token: Token) {
        self.stream.push(token);
    }

    fn source_file(&mut self, file: &SourceFile) {
        self.items(&file.items);
        self.eof(&file.eof);
    }

    fn items(&mut self, items: &[Item]) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.separate(item.node.first_token());
            }
            self.item(item);
        }
    }

    /// Between two statements: keep a trailing comment on the earlier line,
    /// then guarantee at least one line break.
    fn separate(&mut self, next_first: &SyntaxToken) {
        let consumed = self.consume_end_of_line_comment(next_first);
        let skip = usize::from(consumed);
        self.push(Token::Break {
            kind: BreakKind::Same,
            size: 1,
            ignores_discretionary: false,
        });
        let has_newline = self.config.respects_existing_line_breaks
            && matches!(
                next_first.leading_trivia.get(skip).map(|p| &p.kind),
                Some(TriviaKind::Newlines { .. })
            );
        if !has_newline {
            self.push(Token::Newlines {
                count: 1,
                discretionary: false,
            });
        }
        self.pending_skip = skip;
    }

    fn item(&mut self, item: &Item) {
        if self.has_ignore_directive(item) {
            self.leading_trivia(item.node.first_token());
            let first = item.node.first_token();
            let last = item.node.last_token();
            let text = &self.source[first.span.start..last.span.end];
            self.stream.push_with_origin(
                Token::Verbatim(Verbatim::new(text)),
                Some(Origin {
                    line: first.position.line,
                    raw: format!("{}{}", first.prefix, text),
                }),
            );
            self.last_line = last.position.line;
            self.has_content = true;
        } else {
            // Each statement gets its own group so the consistency of an
            // enclosing block does not force breaks inside it.
            self.push(Token::Open(GroupBreakStyle::Inconsistent));
            self.node(&item.node);
            self.push(Token::Close);
        }
        if let Some(semicolon) = &item.semicolon {
            self.leading_trivia(semicolon);
        }
    }

    fn has_ignore_directive(&self, item: &Item) -> bool {
        item.node.first_token().leading_trivia.iter().any(|piece| {
            matches!(
                &piece.kind,
                TriviaKind::Comment { text, .. }
                    if text.strip_prefix("//").map(str::trim) == Some(IGNORE_DIRECTIVE)
            )
        })
    }

    fn node(&mut self, node: &Node) {
        match node {
            Node::Extension(decl) => self.extension_decl(decl),
            Node::Struct(decl) => self.struct_decl(decl),
            Node::Variable(decl) => self.variable_decl(decl),
            Node::Function(decl) => self.function_decl(decl),
            Node::If(stmt) => self.if_stmt(stmt),
            Node::Return(stmt) => self.return_stmt(stmt),
            Node::Expression(expr) => self.expr(expr),
        }
    }

    // The header group spans from after the introducing keyword through the
    // opening brace, so the brace drops to column zero exactly when the
    // header wraps. With a where clause, the name stays outside the group
    // and only the clause wraps.
    fn extension_decl(&mut self, decl: &ExtensionDecl) {
        self.modifiers(&decl.modifiers);
        self.token(&decl.keyword);
        if let Some(clause) = &decl.where_clause {
            self.push(Token::cont());
            self.type_expr(&decl.name);
            self.header_seam_break();
            self.push(Token::Open(GroupBreakStyle::Consistent));
            self.push(Token::cont());
            self.where_clause(clause);
        } else {
            self.push(Token::Open(GroupBreakStyle::Consistent));
            self.push(Token::cont());
            self.type_expr(&decl.name);
        }
        self.brace_reset_break();
        self.block(&decl.body, true);
    }

    fn struct_decl(&mut self, decl: &StructDecl) {
        self.modifiers(&decl.modifiers);
        self.token(&decl.keyword);
        if let Some(clause) = &decl.where_clause {
            self.push(Token::cont());
            self.token(&decl.name);
            self.header_seam_break();
            self.push(Token::Open(GroupBreakStyle::Consistent));
            self.push(Token::cont());
            self.where_clause(clause);
        } else {
            self.push(Token::Open(GroupBreakStyle::Consistent));
            self.push(Token::cont());
            self.token(&decl.name);
        }
        self.brace_reset_break();
        self.block(&decl.body, true);
    }

    fn where_clause(&mut self, clause: &WhereClause) {
        let style = if self.config.line_break_before_each_generic_requirement {
            GroupBreakStyle::Consistent
        } else {
            GroupBreakStyle::Inconsistent
        };
        self.push(Token::Open(style));
        self.token(&clause.keyword);
        self.push(Token::Break {
            kind: BreakKind::Open,
            size: 1,
            ignores_discretionary: false,
        });
        for (i, requirement) in clause.requirements.iter().enumerate() {
            if i > 0 {
                self.push(Token::Break {
                    kind: BreakKind::Same,
                    size: 1,
                    ignores_discretionary: false,
                });
            }
            self.type_expr(&requirement.subject);
            if requirement.relation.kind == TokenKind::Colon {
                self.token(&requirement.relation);
                self.push(Token::space(1));
            } else {
                self.push(Token::space(1));
                self.token(&requirement.relation);
                self.push(Token::space(1));
            }
            self.type_expr(&requirement.constraint);
            if let Some(comma) = &requirement.comma {
                self.token(comma);
            }
        }
        self.push(Token::Break {
            kind: BreakKind::Close { must_break: false },
            size: 0,
            ignores_discretionary: false,
        });
        self.push(Token::Close);
    }

    fn variable_decl(&mut self, decl: &VariableDecl) {
        self.modifiers(&decl.modifiers);
        self.token(&decl.keyword);
        self.push(Token::cont());
        self.token(&decl.name);
        if let Some(annotation) = &decl.annotation {
            self.token(&annotation.colon);
            self.push(Token::cont());
            self.type_expr(&annotation.ty);
        }
        if let Some(initializer) = &decl.initializer {
            self.push(Token::space(1));
            self.token(&initializer.equals);
            self.push(Token::cont());
            self.expr(&initializer.value);
        }
    }

    fn function_decl(&mut self, decl: &FunctionDecl) {
        self.modifiers(&decl.modifiers);
        self.token(&decl.keyword);
        self.push(Token::space(1));
        self.token(&decl.name);
        self.token(&decl.lparen);
        self.push(Token::Open(self.argument_style()));
        self.push(Token::Break {
            kind: BreakKind::Open,
            size: 0,
            ignores_discretionary: false,
        });
        for parameter in &decl.parameters {
            self.token(&parameter.name);
            self.token(&parameter.colon);
            self.push(Token::space(1));
            self.type_expr(&parameter.ty);
            if let Some(default) = &parameter.default {
                self.push(Token::space(1));
                self.token(&default.equals);
                self.push(Token::space(1));
                self.expr(&default.value);
            }
            if let Some(comma) = &parameter.comma {
                self.token(comma);
                self.push(Token::Break {
                    kind: BreakKind::Same,
                    size: 1,
                    ignores_discretionary: false,
                });
            }
        }
        self.push(Token::Break {
            kind: BreakKind::Close { must_break: false },
            size: 0,
            ignores_discretionary: false,
        });
        self.push(Token::Close);
        self.token(&decl.rparen);
        if let Some(output) = &decl.output {
            self.push(Token::cont());
            self.token(&output.arrow);
            self.push(Token::space(1));
            self.type_expr(&output.ty);
        }
        if let Some(body) = &decl.body {
            self.brace_reset_break();
            self.block(body, false);
        }
    }

    fn if_stmt(&mut self, stmt: &IfStmt) {
        self.token(&stmt.keyword);
        self.push(Token::space(1));
        self.expr(&stmt.condition);
        self.brace_reset_break();
        self.block(&stmt.body, false);
        if let Some(clause) = &stmt.else_clause {
            if self.config.line_break_before_control_flow_keywords {
                self.push(Token::Newlines {
                    count: 1,
                    discretionary: false,
                });
            } else {
                self.push(Token::space(1));
            }
            self.token(&clause.keyword);
            match &clause.body {
                ElseBody::Block(block) => {
                    self.brace_reset_break();
                    self.block(block, false);
                }
                ElseBody::If(nested) => {
                    self.push(Token::space(1));
                    self.if_stmt(nested);
                }
            }
        }
    }

    fn return_stmt(&mut self, stmt: &ReturnStmt) {
        self.token(&stmt.keyword);
        if let Some(value) = &stmt.value {
            self.push(Token::cont());
            self.expr(value);
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Identifier(token) | Expr::Literal(token) => self.token(token),
            Expr::Member { base, dot, name } => {
                self.expr(base);
                self.push(Token::Break {
                    kind: BreakKind::Continue,
                    size: 0,
                    ignores_discretionary: false,
                });
                self.token(dot);
                self.token(name);
            }
            Expr::Call {
                callee,
                lparen,
                arguments,
                rparen,
            } => {
                self.expr(callee);
                self.token(lparen);
                self.push(Token::Open(self.argument_style()));
                self.push(Token::Break {
                    kind: BreakKind::Open,
                    size: 0,
                    ignores_discretionary: false,
                });
                for argument in arguments {
                    if let Some(label) = &argument.label {
                        self.token(&label.name);
                        self.token(&label.colon);
                        self.push(Token::space(1));
                    }
                    self.expr(&argument.value);
                    if let Some(comma) = &argument.comma {
                        self.token(comma);
                        self.push(Token::Break {
                            kind: BreakKind::Same,
                            size: 1,
                            ignores_discretionary: false,
                        });
                    }
                }
                self.push(Token::Break {
                    kind: BreakKind::Close { must_break: false },
                    size: 0,
                    ignores_discretionary: false,
                });
                self.push(Token::Close);
                self.token(rparen);
            }
            Expr::Binary { lhs, operator, rhs } => {
                self.expr(lhs);
                self.push(Token::cont());
                self.token(operator);
                self.push(Token::space(1));
                self.expr(rhs);
            }
            Expr::Paren {
                lparen,
                value,
                rparen,
            } => {
                self.token(lparen);
                self.expr(value);
                self.token(rparen);
            }
        }
    }

    fn type_expr(&mut self, ty: &TypeExpr) {
        for token in &ty.tokens {
            self.token(token);
        }
    }

    fn modifiers(&mut self, modifiers: &[SyntaxToken]) {
        for modifier in modifiers {
            self.token(modifier);
            self.push(Token::space(1));
        }
    }

    fn argument_style(&self) -> GroupBreakStyle {
        if self.config.line_break_before_each_argument {
            GroupBreakStyle::Consistent
        } else {
            GroupBreakStyle::Inconsistent
        }
    }

    /// An invisible zero-size break between the declared name and the
    /// header group. It settles the lookahead length of the break before
    /// the name, and its own length spans the rest of the header, so the
    /// line drops after the name exactly when the clause group will not
    /// fit.
    fn header_seam_break(&mut self) {
        self.push(Token::Break {
            kind: BreakKind::Same,
            size: 0,
            ignores_discretionary: false,
        });
    }

    fn brace_reset_break(&mut self) {
        self.push(Token::Break {
            kind: BreakKind::Reset,
            size: 1,
            ignores_discretionary: true,
        });
    }

    fn block(&mut self, block: &Block, closes_header_group: bool) {
        self.token(&block.lbrace);
        if closes_header_group {
            self.push(Token::Close);
        }
        if block.items.is_empty() {
            self.push(Token::Break {
                kind: BreakKind::Open,
                size: 0,
                ignores_discretionary: false,
            });
            self.leading_trivia(&block.rbrace);
            self.push(Token::Break {
                kind: BreakKind::Close { must_break: false },
                size: 0,
                ignores_discretionary: false,
            });
            self.token_text(&block.rbrace);
        } else {
            // The open break precedes the group so its lookahead length
            // spans the whole body; a multi-line body always fires it.
            self.push(Token::Break {
                kind: BreakKind::Open,
                size: 1,
                ignores_discretionary: false,
            });
            self.push(Token::Open(GroupBreakStyle::Consistent));
            self.items(&block.items);
            self.leading_trivia(&block.rbrace);
            self.push(Token::Break {
                kind: BreakKind::Close { must_break: true },
                size: 1,
                ignores_discretionary: false,
            });
            self.push(Token::Close);
            self.token_text(&block.rbrace);
        }
    }

    fn eof(&mut self, eof: &SyntaxToken) {
        let prepared = self.prepare(&eof.leading_trivia);
        // Trailing blank lines collapse; newline runs survive only when a
        // comment still follows.
        let keep = prepared
            .iter()
            .rposition(|p| matches!(p, Prepared::Comment { .. }))
            .map_or(0, |i| i + 1);
        self.emit_prepared(&prepared[..keep]);
        if self.has_content {
            self.push(Token::Newlines {
                count: 1,
                discretionary: false,
            });
        }
    }

    fn token(&mut self, token: &SyntaxToken) {
        self.leading_trivia(token);
        self.token_text(token);
    }

    fn token_text(&mut self, token: &SyntaxToken) {
        self.stream.push_with_origin(
            Token::Syntax(token.text.clone()),
            Some(Origin {
                line: token.position.line,
                raw: token.raw(),
            }),
        );
        self.last_line = token.position.line;
        self.has_content = true;
    }

    fn leading_trivia(&mut self, token: &SyntaxToken) {
        let prepared = self.prepare(&token.leading_trivia);
        self.emit_prepared(&prepared);
    }

    /// Emit a comment that trails the previous statement on its own line.
    /// Returns whether the first trivia piece was consumed.
    fn consume_end_of_line_comment(&mut self, token: &SyntaxToken) -> bool {
        let Some(piece) = token.leading_trivia.first() else {
            return false;
        };
        let TriviaKind::Comment { text, position } = &piece.kind else {
            return false;
        };
        if !self.has_content || position.line != self.last_line {
            return false;
        }
        self.push(Token::space(2));
        self.stream.push_with_origin(
            Token::Comment {
                comment: Comment::new(text, *position),
                was_end_of_line: true,
            },
            Some(Origin {
                line: position.line,
                raw: piece.raw.clone(),
            }),
        );
        self.has_content = true;
        true
    }

    /// Build comments from trivia and merge runs of `///` lines when doc
    /// reflow is on, so the whole body re-wraps as one Markdown document.
    fn prepare(&mut self, pieces: &[TriviaPiece]) -> Vec<Prepared> {
        let skip = std::mem::take(&mut self.pending_skip);
        let mut out: Vec<Prepared> = Vec::new();
        for piece in pieces.iter().skip(skip) {
            match &piece.kind {
                TriviaKind::Newlines { count } => out.push(Prepared::Newlines {
                    count: *count,
                    line: piece.line,
                    raw: piece.raw.clone(),
                }),
                TriviaKind::Comment { text, position } => {
                    let comment = Comment::new(text, *position);
                    let end_line = position.line + text.matches('\n').count();
                    if self.config.reflow_doc_comments
                        && comment.kind == CommentKind::DocLine
                        && Self::merge_doc_line(&mut out, &comment, &piece.raw)
                    {
                        continue;
                    }
                    out.push(Prepared::Comment {
                        comment,
                        raw: piece.raw.clone(),
                        end_line,
                    });
                }
            }
        }
        out
    }

    /// Fold `comment` into a `///` run ending just before it. The run ends
    /// with the previous doc line and a single newline.
    fn merge_doc_line(out: &mut Vec<Prepared>, comment: &Comment, raw: &str) -> bool {
        let n = out.len();
        if n < 2 {
            return false;
        }
        let joins = matches!(
            (&out[n - 2], &out[n - 1]),
            (
                Prepared::Comment { comment: prev, .. },
                Prepared::Newlines { count: 1, .. },
            ) if prev.kind == CommentKind::DocLine
        );
        if !joins {
            return false;
        }
        let Some(Prepared::Newlines { raw: newline_raw, .. }) = out.pop() else {
            unreachable!();
        };
        let Some(Prepared::Comment {
            comment: mut merged,
            raw: mut merged_raw,
            ..
        }) = out.pop()
        else {
            unreachable!();
        };
        merged.absorb_doc_line(comment);
        merged_raw.push_str(&newline_raw);
        merged_raw.push_str(raw);
        out.push(Prepared::Comment {
            comment: merged,
            raw: merged_raw,
            end_line: comment.position.line,
        });
        true
    }

    fn emit_prepared(&mut self, prepared: &[Prepared]) {
        for (i, item) in prepared.iter().enumerate() {
            match item {
                Prepared::Newlines { count, line, raw } => {
                    if self.after_line_comment() {
                        // A line comment must be terminated no matter what
                        // the surrounding breaks say.
                        let (count, discretionary) =
                            if self.config.respects_existing_line_breaks {
                                (*count, true)
                            } else {
                                (1, false)
                            };
                        self.stream.push_with_origin(
                            Token::Newlines {
                                count,
                                discretionary,
                            },
                            Some(Origin {
                                line: *line,
                                raw: raw.clone(),
                            }),
                        );
                        continue;
                    }
                    if !self.has_content
                        || !self.config.respects_existing_line_breaks
                        || self.last_break_ignores_discretionary()
                    {
                        continue;
                    }
                    self.stream.push_with_origin(
                        Token::Newlines {
                            count: *count,
                            discretionary: true,
                        },
                        Some(Origin {
                            line: *line,
                            raw: raw.clone(),
                        }),
                    );
                }
                Prepared::Comment {
                    comment,
                    raw,
                    end_line,
                } => {
                    let was_end_of_line =
                        i == 0 && self.has_content && comment.position.line == self.last_line;
                    if was_end_of_line {
                        self.push(Token::space(2));
                    }
                    let is_line_style =
                        matches!(comment.kind, CommentKind::Line | CommentKind::DocLine);
                    self.stream.push_with_origin(
                        Token::Comment {
                            comment: comment.clone(),
                            was_end_of_line,
                        },
                        Some(Origin {
                            line: comment.position.line,
                            raw: raw.clone(),
                        }),
                    );
                    self.has_content = true;
                    let next_is_newline =
                        matches!(prepared.get(i + 1), Some(Prepared::Newlines { .. }));
                    if !next_is_newline {
                        if is_line_style && !was_end_of_line {
                            self.push(Token::Newlines {
                                count: 1,
                                discretionary: false,
                            });
                        } else if !is_line_style {
                            self.push(Token::space(1));
                        }
                    }
                    self.last_line = *end_line;
                }
            }
        }
    }

    fn after_line_comment(&self) -> bool {
        matches!(
            self.stream.tokens().last(),
            Some(Token::Comment { comment, was_end_of_line: _ })
                if matches!(comment.kind, CommentKind::Line | CommentKind::DocLine)
        )
    }

    fn last_break_ignores_discretionary(&self) -> bool {
        matches!(
            self.stream.tokens().last(),
            Some(Token::Break {
                ignores_discretionary: true,
                ..
            })
        )
    }
}
