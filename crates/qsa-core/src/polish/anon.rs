//! Function literals in expression position
//!
//! Python lambdas cannot hold statements. A literal is compiled as method
//! `anon` of a synthetic class declared just before the statement that uses
//! it; the expression becomes a bound reference to that method.

use crate::ast::{ClassDecl, Expr, ExprKind, FunctionDecl, Ident, Span, Stmt, StmtKind};

use super::{LexicalContext, Polisher};

impl Polisher<'_> {
    pub(super) fn anonymous_function(
        &mut self,
        decl: FunctionDecl,
        ctx: &LexicalContext,
        span: Span,
        pre: &mut Vec<Stmt>,
    ) -> Expr {
        let class_name = format!("AnonFunction_{}", self.fresh());
        let scope = ctx.enter_class(&class_name, None);
        let decl = FunctionDecl {
            name: Ident::new("anon", decl.name.span),
            ..decl
        };
        let mut method = self.function(decl, &scope, true);
        method.params.insert(0, Ident::synthetic("self"));

        let class = ClassDecl {
            name: Ident::synthetic(&class_name),
            extends: None,
            members: vec![Stmt::synthetic(StmtKind::Function(method))],
        };
        pre.push(Stmt::new(StmtKind::Class(class), span));

        Expr::new(
            ExprKind::Member {
                object: Box::new(Expr::call(Expr::ident(class_name), vec![])),
                property: Ident::synthetic("anon"),
            },
            span,
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::polish::polished_xml;

    #[test]
    fn literal_is_hoisted_into_class() {
        let xml = polished_xml("function f() { connect(a, \"s()\", function(x) { return x + 1; }); }");
        let class = xml.find("<Class name=\"AnonFunction_0\">").unwrap();
        let call = xml.find("<Identifier name=\"connect\"/>").unwrap();
        assert!(class < call);
        let flat = xml.split_whitespace().collect::<Vec<_>>().join(" ");
        assert!(flat.contains(
            "<Function name=\"anon\"> <Arguments> <Variable name=\"self\"/> <Variable name=\"x\"/>"
        ));
        assert!(flat.contains(
            "<Member name=\"anon\"> <FunctionCall> <Identifier name=\"AnonFunction_0\"/>"
        ));
    }

    #[test]
    fn literals_get_distinct_classes() {
        let xml = polished_xml("var a = function() {}; var b = function() {};");
        assert!(xml.contains("AnonFunction_0"));
        assert!(xml.contains("AnonFunction_1"));
        assert_eq!(xml.matches("<Variable name=\"self\"/>").count(), 2);
    }
}
