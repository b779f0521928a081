//! Typed AST for QS scripts
//!
//! Produced from the concrete syntax tree by [`build_source`], rewritten by
//! the polisher and consumed by the emitter. Every node carries a [`Span`];
//! nodes synthesized by rewrites carry [`Span::synthetic`].

mod builder;
mod expr;
mod stmt;
mod xml;

pub use builder::build_source;
pub use expr::*;
pub use stmt::*;
pub use xml::{to_xml, XmlNode};

pub use crate::lexer::Span;

/// A trait for AST nodes that have associated source location information
pub trait Spanned {
    fn span(&self) -> Span;
}

/// An identifier with its source location
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    #[must_use]
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }

    /// An identifier created by a rewrite
    #[must_use]
    pub fn synthetic(name: impl Into<String>) -> Self {
        Self::new(name, Span::synthetic())
    }
}

impl Spanned for Ident {
    fn span(&self) -> Span {
        self.span
    }
}

/// A braced list of statements
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

impl Block {
    #[must_use]
    pub fn new(stmts: Vec<Stmt>, span: Span) -> Self {
        Self { stmts, span }
    }

    #[must_use]
    pub fn synthetic(stmts: Vec<Stmt>) -> Self {
        Self::new(stmts, Span::synthetic())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }
}

impl Spanned for Block {
    fn span(&self) -> Span {
        self.span
    }
}

/// A whole translation unit
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl Source {
    #[must_use]
    pub fn new(body: Vec<Stmt>, span: Span) -> Self {
        Self { body, span }
    }
}

impl Spanned for Source {
    fn span(&self) -> Span {
        self.span
    }
}
