//! Statement AST nodes

use crate::lexer::Span;

use super::{Block, Expr, Ident, Spanned};

/// A statement with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    #[must_use]
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }

    #[must_use]
    pub fn synthetic(kind: StmtKind) -> Self {
        Self::new(kind, Span::synthetic())
    }

    /// Expression statement created by a rewrite
    #[must_use]
    pub fn expr(expr: Expr) -> Self {
        Self::synthetic(StmtKind::Expression(expr))
    }

    #[must_use]
    pub fn flow(flow: InstructionFlow) -> Self {
        Self::synthetic(StmtKind::Flow(flow))
    }

    /// `if condition { then }` created by a rewrite
    #[must_use]
    pub fn if_then(condition: Expr, then_branch: Vec<Stmt>) -> Self {
        Self::synthetic(StmtKind::If {
            condition,
            then_branch: Block::synthetic(then_branch),
            else_branch: None,
        })
    }

    /// True for `break`, `continue`, `return` and `throw`
    #[must_use]
    pub fn is_jump(&self) -> bool {
        matches!(self.kind, StmtKind::Flow(_))
    }
}

impl Spanned for Stmt {
    fn span(&self) -> Span {
        self.span
    }
}

/// The kind of statement
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Class(ClassDecl),

    Function(FunctionDecl),

    /// `var`/`const` with one or more declarators
    Variable(DeclarationBlock),

    Expression(Expr),

    If {
        condition: Expr,
        then_branch: Block,
        else_branch: Option<Block>,
    },

    While {
        condition: Expr,
        body: Block,
    },

    DoWhile {
        body: Block,
        condition: Expr,
    },

    /// C-style `for (init; condition; update)`
    For {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        update: Option<Expr>,
        body: Block,
    },

    /// `for (k in object)`
    ForIn {
        binding: ForInBinding,
        object: Expr,
        body: Block,
    },

    Switch {
        subject: Expr,
        cases: Vec<SwitchCase>,
    },

    TryCatch {
        body: Block,
        catch: Option<CatchClause>,
        finally: Option<Block>,
    },

    With {
        object: Expr,
        body: Block,
    },

    Flow(InstructionFlow),

    /// Nested braces
    Block(Block),

    /// A construct with no mapping; its inner statements are kept
    Unknown { construct: String, body: Vec<Stmt> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: Ident,
    pub extends: Option<Ident>,
    pub members: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Ident,
    pub params: Vec<Ident>,
    pub body: Block,
    pub is_static: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclMode {
    Var,
    Const,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclarationBlock {
    pub mode: DeclMode,
    pub vars: Vec<Variable>,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: Ident,
    pub init: Option<Expr>,
}

/// Left side of a `for-in` header
#[derive(Debug, Clone, PartialEq)]
pub enum ForInBinding {
    /// `for (var k in o)`
    Declare(Ident),
    /// `for (k in o)`, `for (this.k in o)`
    Target(Expr),
}

/// One `case` or the `default` clause
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// `None` for `default`
    pub test: Option<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub binding: Option<Ident>,
    pub body: Block,
}

/// Statements that transfer control
#[derive(Debug, Clone, PartialEq)]
pub enum InstructionFlow {
    Return(Option<Expr>),
    Break,
    Continue,
    Throw(Expr),
}
