//! Concrete syntax tree produced by the QS parser
//!
//! The tree keeps every significant token of a production, in source order,
//! under a node tagged with the production's [`SyntaxKind`]. Trivia is not
//! stored. The AST builder turns this tree into the typed AST.

use crate::lexer::{Span, Token, TokenKind};

/// The grammar production a [`SyntaxNode`] was parsed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    Source,

    // ========== Declarations ==========
    ClassDecl,
    FunctionDecl,
    ParamList,
    Param,
    TypeAnnotation,

    // ========== Statements ==========
    Block,
    VarStmt,
    VarDeclarator,
    ExprStmt,
    EmptyStmt,
    IfStmt,
    ElseClause,
    WhileStmt,
    DoWhileStmt,
    ForStmt,
    ForInit,
    ForCond,
    ForUpdate,
    ForInStmt,
    SwitchStmt,
    CaseClause,
    DefaultClause,
    TryStmt,
    CatchClause,
    FinallyClause,
    WithStmt,
    ReturnStmt,
    BreakStmt,
    ContinueStmt,
    ThrowStmt,
    LabeledStmt,

    // ========== Expressions ==========
    Literal,
    RegexLiteral,
    NameRef,
    ThisExpr,
    ParenExpr,
    ArrayLiteral,
    ObjectLiteral,
    PropertyAssign,
    FunctionExpr,
    MemberExpr,
    IndexExpr,
    CallExpr,
    ArgList,
    NewExpr,
    PostfixExpr,
    PrefixExpr,
    BinaryExpr,
    AssignExpr,
    ConditionalExpr,
    SequenceExpr,

    /// Tokens the parser could not place
    Error,
}

impl SyntaxKind {
    /// Productions that can appear in expression position
    #[must_use]
    pub const fn is_expression(&self) -> bool {
        matches!(
            self,
            Self::Literal
                | Self::RegexLiteral
                | Self::NameRef
                | Self::ThisExpr
                | Self::ParenExpr
                | Self::ArrayLiteral
                | Self::ObjectLiteral
                | Self::FunctionExpr
                | Self::MemberExpr
                | Self::IndexExpr
                | Self::CallExpr
                | Self::NewExpr
                | Self::PostfixExpr
                | Self::PrefixExpr
                | Self::BinaryExpr
                | Self::AssignExpr
                | Self::ConditionalExpr
                | Self::SequenceExpr
        )
    }
}

/// A child of a syntax node
#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxElement {
    Node(SyntaxNode),
    Token(Token),
}

impl SyntaxElement {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Node(node) => node.span,
            Self::Token(token) => token.span,
        }
    }

    #[must_use]
    pub fn as_node(&self) -> Option<&SyntaxNode> {
        match self {
            Self::Node(node) => Some(node),
            Self::Token(_) => None,
        }
    }

    #[must_use]
    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Self::Token(token) => Some(token),
            Self::Node(_) => None,
        }
    }
}

/// A node of the concrete syntax tree
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxNode {
    pub kind: SyntaxKind,
    pub span: Span,
    pub children: Vec<SyntaxElement>,
}

impl SyntaxNode {
    /// Create a node; the span is computed from the children
    #[must_use]
    pub fn new(kind: SyntaxKind, children: Vec<SyntaxElement>) -> Self {
        let span = children
            .iter()
            .map(SyntaxElement::span)
            .filter(|s| !s.is_synthetic())
            .reduce(Span::merge)
            .unwrap_or_default();
        Self {
            kind,
            span,
            children,
        }
    }

    /// Child nodes in order
    pub fn nodes(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.children.iter().filter_map(SyntaxElement::as_node)
    }

    /// Child tokens in order
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.children.iter().filter_map(SyntaxElement::as_token)
    }

    /// First child node of the given kind
    #[must_use]
    pub fn child(&self, kind: SyntaxKind) -> Option<&SyntaxNode> {
        self.nodes().find(|n| n.kind == kind)
    }

    /// Child node at `index` among child nodes
    #[must_use]
    pub fn nth_node(&self, index: usize) -> Option<&SyntaxNode> {
        self.nodes().nth(index)
    }

    /// First child token of the given kind
    #[must_use]
    pub fn token(&self, kind: TokenKind) -> Option<&Token> {
        self.tokens().find(|t| t.kind == kind)
    }

    /// True if a direct child token has the given kind
    #[must_use]
    pub fn has_token(&self, kind: TokenKind) -> bool {
        self.token(kind).is_some()
    }

    /// First identifier token among the direct children
    #[must_use]
    pub fn ident(&self) -> Option<&Token> {
        self.tokens()
            .find(|t| matches!(t.kind, TokenKind::Ident | TokenKind::UnicodeIdent))
    }

    /// Child nodes that are expressions
    pub fn expressions(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.nodes().filter(|n| n.kind.is_expression())
    }

    /// First significant token of this subtree
    #[must_use]
    pub fn first_token(&self) -> Option<&Token> {
        self.children.iter().find_map(|child| match child {
            SyntaxElement::Token(token) => Some(token),
            SyntaxElement::Node(node) => node.first_token(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(kind: TokenKind, start: u32, text: &str) -> SyntaxElement {
        SyntaxElement::Token(Token::new(
            kind,
            Span::new(start, start + text.len() as u32),
            text,
        ))
    }

    #[test]
    fn span_covers_children() {
        let name = SyntaxNode::new(SyntaxKind::NameRef, vec![tok(TokenKind::Ident, 4, "abc")]);
        let node = SyntaxNode::new(
            SyntaxKind::PostfixExpr,
            vec![SyntaxElement::Node(name), tok(TokenKind::PlusPlus, 7, "++")],
        );
        assert_eq!(node.span, Span::new(4, 9));
        assert_eq!(node.first_token().map(|t| t.lexeme.as_str()), Some("abc"));
    }

    #[test]
    fn accessors_find_children() {
        let node = SyntaxNode::new(
            SyntaxKind::VarDeclarator,
            vec![tok(TokenKind::Ident, 0, "x"), tok(TokenKind::Eq, 2, "=")],
        );
        assert_eq!(node.ident().map(|t| t.lexeme.as_str()), Some("x"));
        assert!(node.has_token(TokenKind::Eq));
        assert!(node.child(SyntaxKind::TypeAnnotation).is_none());
    }
}
