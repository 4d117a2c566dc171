//! Syntax tree for declaration files.
//!
//! Nodes own their lexed tokens, so trivia, raw text and positions stay
//! attached to the constructs they belong to all the way into the
//! formatter.

use crate::parser::lexer::SyntaxToken;

#[derive(Debug)]
pub struct SourceFile {
    pub items: Vec<Item>,
    pub eof: SyntaxToken,
}

/// One statement or declaration, with the semicolon that followed it in
/// the source (dropped on output, kept so its bytes are not lost).
#[derive(Debug)]
pub struct Item {
    pub node: Node,
    pub semicolon: Option<SyntaxToken>,
}

#[derive(Debug)]
pub enum Node {
    Extension(ExtensionDecl),
    Struct(StructDecl),
    Variable(VariableDecl),
    Function(FunctionDecl),
    If(IfStmt),
    Return(ReturnStmt),
    Expression(Expr),
}

#[derive(Debug)]
pub struct ExtensionDecl {
    pub modifiers: Vec<SyntaxToken>,
    pub keyword: SyntaxToken,
    pub name: TypeExpr,
    pub where_clause: Option<WhereClause>,
    pub body: Block,
}

#[derive(Debug)]
pub struct StructDecl {
    pub modifiers: Vec<SyntaxToken>,
    pub keyword: SyntaxToken,
    pub name: SyntaxToken,
    pub where_clause: Option<WhereClause>,
    pub body: Block,
}

#[derive(Debug)]
pub struct Block {
    pub lbrace: SyntaxToken,
    pub items: Vec<Item>,
    pub rbrace: SyntaxToken,
}

#[derive(Debug)]
pub struct WhereClause {
    pub keyword: SyntaxToken,
    pub requirements: Vec<Requirement>,
}

/// `S: Collection` or `S == T`.
#[derive(Debug)]
pub struct Requirement {
    pub subject: TypeExpr,
    pub relation: SyntaxToken,
    pub constraint: TypeExpr,
    pub comma: Option<SyntaxToken>,
}

#[derive(Debug)]
pub struct VariableDecl {
    pub modifiers: Vec<SyntaxToken>,
    pub keyword: SyntaxToken,
    pub name: SyntaxToken,
    pub annotation: Option<TypeAnnotation>,
    pub initializer: Option<Initializer>,
}

#[derive(Debug)]
pub struct TypeAnnotation {
    pub colon: SyntaxToken,
    pub ty: TypeExpr,
}

#[derive(Debug)]
pub struct Initializer {
    pub equals: SyntaxToken,
    pub value: Expr,
}

#[derive(Debug)]
pub struct FunctionDecl {
    pub modifiers: Vec<SyntaxToken>,
    pub keyword: SyntaxToken,
    pub name: SyntaxToken,
    pub lparen: SyntaxToken,
    pub parameters: Vec<Parameter>,
    pub rparen: SyntaxToken,
    pub output: Option<ReturnType>,
    pub body: Option<Block>,
}

#[derive(Debug)]
pub struct Parameter {
    pub name: SyntaxToken,
    pub colon: SyntaxToken,
    pub ty: TypeExpr,
    pub default: Option<Initializer>,
    pub comma: Option<SyntaxToken>,
}

#[derive(Debug)]
pub struct ReturnType {
    pub arrow: SyntaxToken,
    pub ty: TypeExpr,
}

#[derive(Debug)]
pub struct IfStmt {
    pub keyword: SyntaxToken,
    pub condition: Expr,
    pub body: Block,
    pub else_clause: Option<ElseClause>,
}

#[derive(Debug)]
pub struct ElseClause {
    pub keyword: SyntaxToken,
    pub body: ElseBody,
}

#[derive(Debug)]
pub enum ElseBody {
    Block(Block),
    If(Box<IfStmt>),
}

#[derive(Debug)]
pub struct ReturnStmt {
    pub keyword: SyntaxToken,
    pub value: Option<Expr>,
}

/// A type reference kept as its token run (`Foo`, `Foo.Bar?`, `[Int]`).
/// Types print tightly, so no further structure is needed.
#[derive(Debug)]
pub struct TypeExpr {
    pub tokens: Vec<SyntaxToken>,
}

#[derive(Debug)]
pub struct Argument {
    pub label: Option<ArgumentLabel>,
    pub value: Expr,
    pub comma: Option<SyntaxToken>,
}

#[derive(Debug)]
pub struct ArgumentLabel {
    pub name: SyntaxToken,
    pub colon: SyntaxToken,
}

#[derive(Debug)]
pub enum Expr {
    Identifier(SyntaxToken),
    Literal(SyntaxToken),
    Member {
        base: Box<Expr>,
        dot: SyntaxToken,
        name: SyntaxToken,
    },
    Call {
        callee: Box<Expr>,
        lparen: SyntaxToken,
        arguments: Vec<Argument>,
        rparen: SyntaxToken,
    },
    Binary {
        lhs: Box<Expr>,
        operator: SyntaxToken,
        rhs: Box<Expr>,
    },
    Paren {
        lparen: SyntaxToken,
        value: Box<Expr>,
        rparen: SyntaxToken,
    },
}

impl Node {
    pub fn first_token(&self) -> &SyntaxToken {
        match self {
            Node::Extension(d) => d.modifiers.first().unwrap_or(&d.keyword),
            Node::Struct(d) => d.modifiers.first().unwrap_or(&d.keyword),
            Node::Variable(d) => d.modifiers.first().unwrap_or(&d.keyword),
            Node::Function(d) => d.modifiers.first().unwrap_or(&d.keyword),
            Node::If(s) => &s.keyword,
            Node::Return(s) => &s.keyword,
            Node::Expression(e) => e.first_token(),
        }
    }

    pub fn last_token(&self) -> &SyntaxToken {
        match self {
            Node::Extension(d) => &d.body.rbrace,
            Node::Struct(d) => &d.body.rbrace,
            Node::Variable(d) => {
                if let Some(init) = &d.initializer {
                    init.value.last_token()
                } else if let Some(annotation) = &d.annotation {
                    annotation.ty.last_token()
                } else {
                    &d.name
                }
            }
            Node::Function(d) => match (&d.body, &d.output) {
                (Some(body), _) => &body.rbrace,
                (None, Some(output)) => output.ty.last_token(),
                (None, None) => &d.rparen,
            },
            Node::If(s) => match &s.else_clause {
                Some(clause) => match &clause.body {
                    ElseBody::Block(block) => &block.rbrace,
                    ElseBody::If(nested) => Node::last_if_token(nested),
                },
                None => &s.body.rbrace,
            },
            Node::Return(s) => match &s.value {
                Some(value) => value.last_token(),
                None => &s.keyword,
            },
            Node::Expression(e) => e.last_token(),
        }
    }

    fn last_if_token(stmt: &IfStmt) -> &SyntaxToken {
        match &stmt.else_clause {
            Some(clause) => match &clause.body {
                ElseBody::Block(block) => &block.rbrace,
                ElseBody::If(nested) => Node::last_if_token(nested),
            },
            None => &stmt.body.rbrace,
        }
    }
}

impl TypeExpr {
    pub fn last_token(&self) -> &SyntaxToken {
        self.tokens.last().expect("type has at least one token")
    }
}

impl Expr {
    pub fn first_token(&self) -> &SyntaxToken {
        match self {
            Expr::Identifier(token) | Expr::Literal(token) => token,
            Expr::Member { base, .. } => base.first_token(),
            Expr::Call { callee, .. } => callee.first_token(),
            Expr::Binary { lhs, .. } => lhs.first_token(),
            Expr::Paren { lparen, .. } => lparen,
        }
    }

    pub fn last_token(&self) -> &SyntaxToken {
        match self {
            Expr::Identifier(token) | Expr::Literal(token) => token,
            Expr::Member { name, .. } => name,
            Expr::Call { rparen, .. } => rparen,
            Expr::Binary { rhs, .. } => rhs.last_token(),
            Expr::Paren { rparen, .. } => rparen,
        }
    }
}
