//! Parsing of declaration source into the syntax tree.
//!
//! A plain recursive descent over the lexed tokens. The parser never
//! backtracks; each construct is committed by its leading keyword.

pub mod lexer;

use crate::ast::*;
use crate::error::{format_parse_error, Error, Result};
use lexer::{tokenize, SyntaxToken, TokenKind};

/// Parse a whole file.
pub fn parse(input: &str) -> Result<SourceFile> {
    let tokens = tokenize(input)?;
    Parser::new(input, tokens).source_file()
}

struct Parser<'s> {
    source: &'s str,
    tokens: Vec<SyntaxToken>,
    pos: usize,
}

impl<'s> Parser<'s> {
    fn new(source: &'s str, tokens: Vec<SyntaxToken>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
        }
    }

    fn peek(&self) -> &SyntaxToken {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn advance(&mut self) -> SyntaxToken {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> Option<SyntaxToken> {
        (self.peek_kind() == kind).then(|| self.advance())
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<SyntaxToken> {
        if self.peek_kind() == kind {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(&format!("expected {what}")))
        }
    }

    fn error_at_current(&self, message: &str) -> Error {
        let token = self.peek();
        let found = if token.kind == TokenKind::Eof {
            "end of input".to_string()
        } else {
            format!("`{}`", token.text)
        };
        let message = format_parse_error(
            self.source,
            token.span.start,
            &format!("{message}, found {found}"),
        );
        Error::ParseError {
            message,
            span: Some((token.span.start, (token.span.end - token.span.start).max(1))),
        }
    }

    fn source_file(mut self) -> Result<SourceFile> {
        let items = self.items_until(TokenKind::Eof)?;
        let eof = self.advance();
        Ok(SourceFile { items, eof })
    }

    fn items_until(&mut self, end: TokenKind) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        while self.peek_kind() != end && self.peek_kind() != TokenKind::Eof {
            items.push(self.item()?);
        }
        Ok(items)
    }

    fn item(&mut self) -> Result<Item> {
        let node = self.node()?;
        let semicolon = self.eat(TokenKind::Semicolon);
        Ok(Item { node, semicolon })
    }

    fn node(&mut self) -> Result<Node> {
        let mut modifiers = Vec::new();
        while self.peek_kind().is_modifier() {
            modifiers.push(self.advance());
        }
        match self.peek_kind() {
            TokenKind::Extension => self.extension_decl(modifiers).map(Node::Extension),
            TokenKind::Struct => self.struct_decl(modifiers).map(Node::Struct),
            TokenKind::Let | TokenKind::Var => self.variable_decl(modifiers).map(Node::Variable),
            TokenKind::Func => self.function_decl(modifiers).map(Node::Function),
            TokenKind::If if modifiers.is_empty() => self.if_stmt().map(Node::If),
            TokenKind::Return if modifiers.is_empty() => self.return_stmt().map(Node::Return),
            TokenKind::Identifier
            | TokenKind::IntegerLiteral
            | TokenKind::FloatLiteral
            | TokenKind::StringLiteral
            | TokenKind::LParen
                if modifiers.is_empty() =>
            {
                self.expr().map(Node::Expression)
            }
            _ => Err(self.error_at_current("expected a declaration")),
        }
    }

    fn extension_decl(&mut self, modifiers: Vec<SyntaxToken>) -> Result<ExtensionDecl> {
        let keyword = self.advance();
        let name = self.type_expr()?;
        let where_clause = self.where_clause()?;
        let body = self.block()?;
        Ok(ExtensionDecl {
            modifiers,
            keyword,
            name,
            where_clause,
            body,
        })
    }

    fn struct_decl(&mut self, modifiers: Vec<SyntaxToken>) -> Result<StructDecl> {
        let keyword = self.advance();
        let name = self.expect(TokenKind::Identifier, "a struct name")?;
        let where_clause = self.where_clause()?;
        let body = self.block()?;
        Ok(StructDecl {
            modifiers,
            keyword,
            name,
            where_clause,
            body,
        })
    }

    fn where_clause(&mut self) -> Result<Option<WhereClause>> {
        let Some(keyword) = self.eat(TokenKind::Where) else {
            return Ok(None);
        };
        let mut requirements = Vec::new();
        loop {
            let subject = self.type_expr()?;
            let relation = match self.peek_kind() {
                TokenKind::Colon => self.advance(),
                TokenKind::Operator if self.peek().text == "==" => self.advance(),
                _ => return Err(self.error_at_current("expected `:` or `==` in requirement")),
            };
            let constraint = self.type_expr()?;
            let comma = self.eat(TokenKind::Comma);
            let done = comma.is_none();
            requirements.push(Requirement {
                subject,
                relation,
                constraint,
                comma,
            });
            if done {
                break;
            }
        }
        Ok(Some(WhereClause {
            keyword,
            requirements,
        }))
    }

    fn block(&mut self) -> Result<Block> {
        let lbrace = self.expect(TokenKind::LBrace, "`{`")?;
        let items = self.items_until(TokenKind::RBrace)?;
        let rbrace = self.expect(TokenKind::RBrace, "`}`")?;
        Ok(Block {
            lbrace,
            items,
            rbrace,
        })
    }

    fn variable_decl(&mut self, modifiers: Vec<SyntaxToken>) -> Result<VariableDecl> {
        let keyword = self.advance();
        let name = self.expect(TokenKind::Identifier, "a binding name")?;
        let annotation = match self.eat(TokenKind::Colon) {
            Some(colon) => Some(TypeAnnotation {
                colon,
                ty: self.type_expr()?,
            }),
            None => None,
        };
        let initializer = self.initializer()?;
        Ok(VariableDecl {
            modifiers,
            keyword,
            name,
            annotation,
            initializer,
        })
    }

    fn initializer(&mut self) -> Result<Option<Initializer>> {
        match self.eat(TokenKind::Equals) {
            Some(equals) => Ok(Some(Initializer {
                equals,
                value: self.expr()?,
            })),
            None => Ok(None),
        }
    }

    fn function_decl(&mut self, modifiers: Vec<SyntaxToken>) -> Result<FunctionDecl> {
        let keyword = self.advance();
        let name = self.expect(TokenKind::Identifier, "a function name")?;
        let lparen = self.expect(TokenKind::LParen, "`(`")?;
        let mut parameters = Vec::new();
        while self.peek_kind() != TokenKind::RParen {
            let name = self.expect(TokenKind::Identifier, "a parameter name")?;
            let colon = self.expect(TokenKind::Colon, "`:`")?;
            let ty = self.type_expr()?;
            let default = self.initializer()?;
            let comma = self.eat(TokenKind::Comma);
            let done = comma.is_none();
            parameters.push(Parameter {
                name,
                colon,
                ty,
                default,
                comma,
            });
            if done {
                break;
            }
        }
        let rparen = self.expect(TokenKind::RParen, "`)`")?;
        let output = match self.eat(TokenKind::Arrow) {
            Some(arrow) => Some(ReturnType {
                arrow,
                ty: self.type_expr()?,
            }),
            None => None,
        };
        let body = if self.peek_kind() == TokenKind::LBrace {
            Some(self.block()?)
        } else {
            None
        };
        Ok(FunctionDecl {
            modifiers,
            keyword,
            name,
            lparen,
            parameters,
            rparen,
            output,
            body,
        })
    }

    fn if_stmt(&mut self) -> Result<IfStmt> {
        let keyword = self.advance();
        let condition = self.expr()?;
        let body = self.block()?;
        let else_clause = match self.eat(TokenKind::Else) {
            Some(else_keyword) => {
                let body = if self.peek_kind() == TokenKind::If {
                    ElseBody::If(Box::new(self.if_stmt()?))
                } else {
                    ElseBody::Block(self.block()?)
                };
                Some(ElseClause {
                    keyword: else_keyword,
                    body,
                })
            }
            None => None,
        };
        Ok(IfStmt {
            keyword,
            condition,
            body,
            else_clause,
        })
    }

    fn return_stmt(&mut self) -> Result<ReturnStmt> {
        let keyword = self.advance();
        let value = match self.peek_kind() {
            TokenKind::Identifier
            | TokenKind::IntegerLiteral
            | TokenKind::FloatLiteral
            | TokenKind::StringLiteral
            | TokenKind::LParen => Some(self.expr()?),
            _ => None,
        };
        Ok(ReturnStmt { keyword, value })
    }

    /// A type is a token run: identifier segments joined by dots, optional
    /// `?` suffixes, or a bracketed element type.
    fn type_expr(&mut self) -> Result<TypeExpr> {
        let mut tokens = Vec::new();
        if let Some(lbracket) = self.eat(TokenKind::LBracket) {
            tokens.push(lbracket);
            let element = self.type_expr()?;
            tokens.extend(element.tokens);
            tokens.push(self.expect(TokenKind::RBracket, "`]`")?);
        } else {
            tokens.push(self.expect(TokenKind::Identifier, "a type name")?);
            while let Some(dot) = self.eat(TokenKind::Dot) {
                tokens.push(dot);
                tokens.push(self.expect(TokenKind::Identifier, "a type name")?);
            }
        }
        while let Some(question) = self.eat(TokenKind::Question) {
            tokens.push(question);
        }
        Ok(TypeExpr { tokens })
    }

    fn expr(&mut self) -> Result<Expr> {
        let mut lhs = self.postfix_expr()?;
        while self.peek_kind() == TokenKind::Operator {
            let operator = self.advance();
            let rhs = self.postfix_expr()?;
            lhs = Expr::Binary {
                lhs: Box::new(lhs),
                operator,
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn postfix_expr(&mut self) -> Result<Expr> {
        let mut expr = self.primary_expr()?;
        loop {
            if let Some(dot) = self.eat(TokenKind::Dot) {
                let name = self.expect(TokenKind::Identifier, "a member name")?;
                expr = Expr::Member {
                    base: Box::new(expr),
                    dot,
                    name,
                };
            } else if self.peek_kind() == TokenKind::LParen {
                let lparen = self.advance();
                let arguments = self.arguments()?;
                let rparen = self.expect(TokenKind::RParen, "`)`")?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    lparen,
                    arguments,
                    rparen,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn arguments(&mut self) -> Result<Vec<Argument>> {
        let mut arguments = Vec::new();
        while self.peek_kind() != TokenKind::RParen {
            let label = if self.peek_kind() == TokenKind::Identifier
                && self.tokens.get(self.pos + 1).map(|t| t.kind) == Some(TokenKind::Colon)
            {
                let name = self.advance();
                let colon = self.advance();
                Some(ArgumentLabel { name, colon })
            } else {
                None
            };
            let value = self.expr()?;
            let comma = self.eat(TokenKind::Comma);
            let done = comma.is_none();
            arguments.push(Argument {
                label,
                value,
                comma,
            });
            if done {
                break;
            }
        }
        Ok(arguments)
    }

    fn primary_expr(&mut self) -> Result<Expr> {
        match self.peek_kind() {
            TokenKind::Identifier => Ok(Expr::Identifier(self.advance())),
            TokenKind::IntegerLiteral | TokenKind::FloatLiteral | TokenKind::StringLiteral => {
                Ok(Expr::Literal(self.advance()))
            }
            TokenKind::LParen => {
                let lparen = self.advance();
                let value = self.expr()?;
                let rparen = self.expect(TokenKind::RParen, "`)`")?;
                Ok(Expr::Paren {
                    lparen,
                    value: Box::new(value),
                    rparen,
                })
            }
            _ => Err(self.error_at_current("expected an expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_extension_with_members() {
        let file = parse("extension Foo {\n  let a: Int\n  let b: Bool\n}\n").unwrap();
        assert_eq!(file.items.len(), 1);
        match &file.items[0].node {
            Node::Extension(decl) => {
                assert_eq!(decl.name.tokens[0].text, "Foo");
                assert_eq!(decl.body.items.len(), 2);
            }
            other => panic!("expected extension, got {other:?}"),
        }
    }

    #[test]
    fn parses_where_clause() {
        let file = parse("extension Foo where S: Collection, T == U {}").unwrap();
        match &file.items[0].node {
            Node::Extension(decl) => {
                let clause = decl.where_clause.as_ref().unwrap();
                assert_eq!(clause.requirements.len(), 2);
                assert_eq!(clause.requirements[1].relation.text, "==");
            }
            other => panic!("expected extension, got {other:?}"),
        }
    }

    #[test]
    fn parses_function_with_parameters() {
        let file = parse("func add(a: Int, b: Int) -> Int { return a + b }").unwrap();
        match &file.items[0].node {
            Node::Function(decl) => {
                assert_eq!(decl.parameters.len(), 2);
                assert!(decl.output.is_some());
                assert_eq!(decl.body.as_ref().unwrap().items.len(), 1);
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn parses_semicolon_separated_members() {
        let file = parse("extension E { let a: Int; let b: Double }").unwrap();
        match &file.items[0].node {
            Node::Extension(decl) => {
                assert_eq!(decl.body.items.len(), 2);
                assert!(decl.body.items[0].semicolon.is_some());
            }
            other => panic!("expected extension, got {other:?}"),
        }
    }

    #[test]
    fn rejects_missing_brace() {
        assert!(parse("extension Foo").is_err());
    }

    #[test]
    fn rejects_unclosed_block() {
        assert!(parse("struct S { let a: Int").is_err());
    }

    #[test]
    fn rejects_stray_token() {
        assert!(parse("???").is_err());
    }
}
