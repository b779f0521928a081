//! `with` flattening
//!
//! `with (obj) { f(); }` binds `obj` to a private temporary, routes bare
//! calls in the body through it and deletes it afterwards.

use crate::ast::{Block, Expr, ExprKind, Span, Stmt, StmtKind, UnaryOp};
use crate::names::map_member;

use super::{LexicalContext, Polisher};

/// Callees that stay global inside `with`
const GLOBAL_FUNCTIONS: &[&str] = &[
    "parseInt",
    "parseFloat",
    "isNaN",
    "isFinite",
    "String",
    "Number",
    "Boolean",
    "Array",
    "Object",
    "Date",
    "Math",
    "RegExp",
    "Error",
    "eval",
    "escape",
    "unescape",
    "encodeURIComponent",
    "decodeURIComponent",
    "debug",
    "print",
    "connect",
    "disconnect",
    "startTimer",
    "killTimer",
    "killTimers",
];

impl Polisher<'_> {
    pub(super) fn with(
        &mut self,
        object: Expr,
        body: Block,
        ctx: &LexicalContext,
        span: Span,
    ) -> Vec<Stmt> {
        let temp = format!("_with_obj_{}", self.fresh());
        let inner = ctx.enter_with(&temp);

        let mut out = vec![Stmt::new(
            StmtKind::Expression(Expr::assign(Expr::ident(&temp), object)),
            span,
        )];
        out.extend(self.stmts(body.stmts, &inner));
        out.push(Stmt::expr(Expr::synthetic(ExprKind::Unary {
            op: UnaryOp::Delete,
            operand: Box::new(Expr::ident(temp)),
        })));
        out
    }

    /// Callee for a bare call `name(...)` inside `with`
    ///
    /// `None` when there is no enclosing `with` or the name resolves without it.
    pub(super) fn with_callee(&self, name: &str, ctx: &LexicalContext) -> Option<Expr> {
        let temp = ctx.with_object()?;
        if ctx.is_local(name)
            || self.globals.contains(name)
            || self.known.contains_key(name)
            || GLOBAL_FUNCTIONS.contains(&name)
        {
            return None;
        }
        Some(Expr::member(Expr::ident(temp), map_member(name)))
    }
}

#[cfg(test)]
mod tests {
    use crate::polish::polished_xml;

    #[test]
    fn bare_calls_go_through_temporary() {
        let xml = polished_xml("function f(cursor) { with (cursor) { setValueBuffer(\"f\", 1); } }");
        let flat = xml.split_whitespace().collect::<Vec<_>>().join(" ");
        assert!(flat.contains(
            "<Member name=\"setValueBuffer\"> <Identifier name=\"_with_obj_0\"/> </Member>"
        ));
        assert!(xml.contains("<Unary type=\"delete\">"));
        assert!(!xml.contains("<With>"));
    }

    #[test]
    fn locals_and_globals_are_not_routed() {
        let xml = polished_xml(
            "function helper() {}\n\
             function f(o, cb) { with (o) { cb(); helper(); parseInt(\"1\"); run(); } }",
        );
        assert_eq!(xml.matches("<Member ").count(), 1);
        assert!(xml.contains("<Member name=\"run\">"));
    }

    #[test]
    fn sibling_withs_use_distinct_temporaries() {
        let xml = polished_xml("function f(a, b) { with (a) { x(); } with (b) { y(); } }");
        assert!(xml.contains("_with_obj_0"));
        assert!(xml.contains("_with_obj_1"));
        let flat = xml.split_whitespace().collect::<Vec<_>>().join(" ");
        assert!(flat.contains("<Member name=\"y\"> <Identifier name=\"_with_obj_1\"/>"));
    }

    #[test]
    fn member_calls_are_untouched() {
        let xml = polished_xml("with (o) { this.g(); q.h(); }");
        // assignment and delete only
        assert_eq!(xml.matches("_with_obj_0").count(), 2);
        assert!(xml.contains("<Identifier name=\"self\"/>"));
        assert!(xml.contains("<Identifier name=\"q\"/>"));
    }
}
