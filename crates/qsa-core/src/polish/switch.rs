//! `switch` desugaring
//!
//! ```text
//! _switch_N_value = subject
//! _switch_N_exec = False      # a matched or fallen-through case is running
//! _switch_N_done = False      # some case already fired
//! if _switch_N_exec or not _switch_N_done and _switch_N_value == test:
//!     _switch_N_exec = True
//!     _switch_N_done = True
//!     body
//! ```
//!
//! `break` clears the executing flag. `default` fires when nothing fired
//! before it and no later case matches.

use crate::ast::{
    CompareOp, Expr, InstructionFlow, LogicalOp, Span, Stmt, StmtKind, SwitchCase,
};

use super::{map_nested_lists, Polisher};

impl Polisher<'_> {
    pub(super) fn switch(&mut self, subject: Expr, cases: Vec<SwitchCase>, span: Span) -> Vec<Stmt> {
        let n = self.fresh();
        let value = format!("_switch_{n}_value");
        let exec = format!("_switch_{n}_exec");
        let done = format!("_switch_{n}_done");

        let mut out = vec![
            Stmt::new(
                StmtKind::Expression(Expr::assign(Expr::ident(&value), subject)),
                span,
            ),
            set_flag(&exec, false),
            set_flag(&done, false),
        ];

        let tests: Vec<Option<Expr>> = cases.iter().map(|case| case.test.clone()).collect();
        for (i, case) in cases.into_iter().enumerate() {
            let unfired = Expr::not(Expr::ident(&done));
            let fires = match case.test {
                Some(test) => Expr::logical(unfired, LogicalOp::And, matches_value(&value, test)),
                None => {
                    let later = tests[i + 1..]
                        .iter()
                        .flatten()
                        .map(|test| matches_value(&value, test.clone()))
                        .reduce(|a, b| Expr::logical(a, LogicalOp::Or, b));
                    match later {
                        Some(later) => Expr::logical(unfired, LogicalOp::And, Expr::not(later)),
                        None => unfired,
                    }
                }
            };
            let condition = Expr::logical(Expr::ident(&exec), LogicalOp::Or, fires);
            let mut body = vec![set_flag(&exec, true), set_flag(&done, true)];
            body.extend(rewrite_breaks(case.body, &exec).0);
            out.push(Stmt::if_then(condition, body));
        }
        out
    }
}

fn matches_value(value: &str, test: Expr) -> Expr {
    Expr::compare(Expr::ident(value), CompareOp::StrictEq, test)
}

fn set_flag(name: &str, value: bool) -> Stmt {
    Stmt::expr(Expr::assign(Expr::ident(name), Expr::bool(value)))
}

/// Replace the breaks of one case body with `exec = False`
///
/// Statements after a direct `break` are unreachable and dropped. Statements
/// after one that breaks somewhere inside are guarded with `if exec:`.
/// Returns whether any break was found.
fn rewrite_breaks(stmts: Vec<Stmt>, exec: &str) -> (Vec<Stmt>, bool) {
    let mut out = Vec::with_capacity(stmts.len());
    let mut iter = stmts.into_iter();
    while let Some(stmt) = iter.next() {
        if matches!(stmt.kind, StmtKind::Flow(InstructionFlow::Break)) {
            out.push(set_flag(exec, false));
            return (out, true);
        }
        let mut broke = false;
        out.push(map_nested_lists(stmt, &mut |list| {
            let (list, found) = rewrite_breaks(list, exec);
            broke |= found;
            list
        }));
        if broke {
            let (rest, _) = rewrite_breaks(iter.collect(), exec);
            if !rest.is_empty() {
                out.push(Stmt::if_then(Expr::ident(exec), rest));
            }
            return (out, true);
        }
    }
    (out, false)
}

#[cfg(test)]
mod tests {
    use crate::polish::polished_xml;

    #[test]
    fn cases_become_ifs() {
        let xml = polished_xml("switch (x) { case 1: a(); case 2: b(); break; default: c(); }");
        assert!(!xml.contains("<Switch>"));
        assert_eq!(xml.matches("<If>").count(), 3);
        assert!(xml.contains("<Identifier name=\"_switch_0_value\"/>"));
        // the break only clears the executing flag
        assert!(!xml.contains("type=\"break\""));
    }

    #[test]
    fn case_tests_are_guarded_by_done_flag() {
        let xml = polished_xml("switch (true) { case x > 5: a(); break; case x > 2: b(); break; }");
        let flat = xml.split_whitespace().collect::<Vec<_>>().join(" ");
        let guard = "<Identifier name=\"_switch_0_done\"/>";
        // set in both bodies, tested in both conditions
        assert_eq!(flat.matches(guard).count(), 5);
    }

    #[test]
    fn default_excludes_later_cases() {
        let xml = polished_xml("switch (x) { default: c(); case 1: a(); }");
        let default_if = xml.find("<Identifier name=\"c\"/>").unwrap();
        let later_test = xml.find("<Constant type=\"Number\" value=\"1\"/>").unwrap();
        // the default condition mentions the later test before the default body
        assert!(later_test < default_if);
    }

    #[test]
    fn nested_break_guards_rest_of_case() {
        let xml = polished_xml("switch (x) { case 1: if (y) { break; } a(); break; }");
        // flag cleared by both breaks, rest guarded by the exec flag
        assert_eq!(
            xml.matches("<Constant type=\"Boolean\" value=\"false\"/>").count(),
            4
        );
        let flat = xml.split_whitespace().collect::<Vec<_>>().join(" ");
        assert!(flat.contains("<Condition> <Identifier name=\"_switch_0_exec\"/> </Condition>"));
    }

    #[test]
    fn break_inside_loop_in_case_is_kept() {
        let xml = polished_xml("switch (x) { case 1: while (y) { break; } a(); }");
        assert_eq!(xml.matches("type=\"break\"").count(), 1);
    }

    #[test]
    fn sibling_switches_get_distinct_names() {
        let xml = polished_xml("switch (a) { case 1: f(); } switch (b) { case 2: g(); }");
        assert!(xml.contains("_switch_0_value"));
        assert!(xml.contains("_switch_1_value"));
    }
}
