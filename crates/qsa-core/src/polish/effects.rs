//! Side-effect normalisation
//!
//! Python has no `++`/`--` and no comma operator. Updates that stand alone
//! become compound assignments, comma expressions become separate statements
//! and control statements whose operand writes after reading are captured
//! into a temporary first.

use crate::ast::{Block, Expr, ExprKind, InstructionFlow, Span, Stmt, StmtKind};

use super::{LexicalContext, Polisher};

/// Split an expression statement into host statements
pub(super) fn expression_stmt(expr: Expr, span: Span) -> Vec<Stmt> {
    let Expr {
        kind,
        span: expr_span,
    } = expr;
    match kind {
        ExprKind::Sequence(items) => items
            .into_iter()
            .flat_map(|item| {
                let span = item.span;
                expression_stmt(item, span)
            })
            .collect(),
        ExprKind::OpUpdate { op, target, .. } => {
            let assign = ExprKind::Assign {
                target,
                op: op.as_assign(),
                value: Box::new(Expr::int(1)),
            };
            vec![Stmt::new(
                StmtKind::Expression(Expr::new(assign, expr_span)),
                span,
            )]
        }
        kind => vec![Stmt::new(
            StmtKind::Expression(Expr::new(kind, expr_span)),
            span,
        )],
    }
}

impl Polisher<'_> {
    pub(super) fn if_stmt(
        &mut self,
        condition: Expr,
        then_branch: Block,
        else_branch: Option<Block>,
        span: Span,
    ) -> Vec<Stmt> {
        let mut out = Vec::new();
        let condition = if condition.has_post_update() {
            let (assign, reference) = self.capture("cond", condition);
            out.push(assign);
            reference
        } else {
            condition
        };
        out.push(Stmt::new(
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            },
            span,
        ));
        out
    }

    pub(super) fn flow(
        &mut self,
        flow: InstructionFlow,
        ctx: &LexicalContext,
        pre: &mut Vec<Stmt>,
        span: Span,
    ) -> Vec<Stmt> {
        let mut out = Vec::new();
        let flow = match flow {
            InstructionFlow::Return(Some(value)) => {
                let value = self.expr(value, ctx, pre);
                InstructionFlow::Return(Some(self.settle(value, "ret", &mut out)))
            }
            InstructionFlow::Throw(value) => {
                let value = self.expr(value, ctx, pre);
                InstructionFlow::Throw(self.settle(value, "exc", &mut out))
            }
            other => other,
        };
        out.push(Stmt::new(StmtKind::Flow(flow), span));
        out
    }

    /// Capture `value` if its deferred updates would otherwise run after the jump
    fn settle(&mut self, value: Expr, prefix: &str, out: &mut Vec<Stmt>) -> Expr {
        if !value.has_post_update() {
            return value;
        }
        let (assign, reference) = self.capture(prefix, value);
        out.push(assign);
        reference
    }
}

#[cfg(test)]
mod tests {
    use crate::polish::polished_xml;

    #[test]
    fn standalone_update_becomes_compound_assignment() {
        let xml = polished_xml("i++; --j;");
        assert_eq!(xml.matches("<Assign type=\"+=\">").count(), 1);
        assert_eq!(xml.matches("<Assign type=\"-=\">").count(), 1);
        assert!(!xml.contains("OpUpdate"));
    }

    #[test]
    fn comma_statement_is_split() {
        let xml = polished_xml("a = 1, b = 2, f();");
        assert_eq!(xml.matches("<Expression>").count(), 3);
        assert!(!xml.contains("Sequence"));
    }

    #[test]
    fn post_update_in_condition_is_captured() {
        let xml = polished_xml("if (i++ > 3) { f(); }");
        let capture = xml.find("<Identifier name=\"_cond_0\"/>").unwrap();
        let branch = xml.find("<If>").unwrap();
        assert!(capture < branch);
    }

    #[test]
    fn prefix_update_in_condition_is_left_for_the_emitter() {
        let xml = polished_xml("if (++i > 3) { f(); }");
        assert!(!xml.contains("_cond_"));
    }

    #[test]
    fn return_value_with_post_update() {
        let xml = polished_xml("function f() { return i++; }");
        assert!(xml.contains("_ret_0"));
        let xml = polished_xml("function f() { return i; }");
        assert!(!xml.contains("_ret_"));
    }
}
