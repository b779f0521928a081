//! Loop desugaring
//!
//! C-style `for` becomes `init; while cond: body; update`, with the update
//! replayed before every `continue` of the loop. `do/while` becomes
//! `while True` with the condition checked at the bottom and before every
//! `continue`. Loop conditions that need side effects hoisted are evaluated
//! at the top of a `while True` body instead.

use crate::ast::{Block, Expr, ForInBinding, InstructionFlow, Span, Stmt, StmtKind};

use super::effects::expression_stmt;
use super::{map_nested_lists, Polisher};

impl Polisher<'_> {
    pub(super) fn while_loop(&mut self, condition: Expr, body: Block, span: Span) -> Vec<Stmt> {
        if !condition.needs_hoisting() {
            return vec![Stmt::new(StmtKind::While { condition, body }, span)];
        }
        let mut stmts = self.loop_check(condition);
        stmts.extend(body.stmts);
        vec![forever(stmts, body.span, span)]
    }

    pub(super) fn do_while(&mut self, body: Block, condition: Expr, span: Span) -> Vec<Stmt> {
        let check = if condition.needs_hoisting() {
            self.loop_check(condition)
        } else {
            vec![exit_unless(condition)]
        };
        let mut stmts = replay_before_continue(body.stmts, &check);
        stmts.extend(check);
        vec![forever(stmts, body.span, span)]
    }

    pub(super) fn for_loop(
        &mut self,
        init: Vec<Stmt>,
        condition: Option<Expr>,
        update: Option<Expr>,
        body: Block,
        span: Span,
    ) -> Vec<Stmt> {
        let update = update.map_or_else(Vec::new, |update| {
            let span = update.span;
            expression_stmt(update, span)
        });
        let (condition, mut stmts) = match condition {
            Some(condition) if !condition.needs_hoisting() => (condition, Vec::new()),
            Some(condition) => (Expr::bool(true), self.loop_check(condition)),
            None => (Expr::bool(true), Vec::new()),
        };
        stmts.extend(replay_before_continue(body.stmts, &update));
        stmts.extend(update);

        let mut out = init;
        out.push(Stmt::new(
            StmtKind::While {
                condition,
                body: Block::new(stmts, body.span),
            },
            span,
        ));
        out
    }

    pub(super) fn for_in(
        &mut self,
        binding: ForInBinding,
        object: Expr,
        body: Block,
        span: Span,
    ) -> Vec<Stmt> {
        let mut out = Vec::new();
        let object = if object.needs_hoisting() {
            let (assign, reference) = self.capture("iter", object);
            out.push(assign);
            reference
        } else {
            object
        };
        out.push(Stmt::new(
            StmtKind::ForIn {
                binding,
                object,
                body,
            },
            span,
        ));
        out
    }

    /// `_cond_N = condition` followed by `if not _cond_N: break`
    fn loop_check(&mut self, condition: Expr) -> Vec<Stmt> {
        let (assign, reference) = self.capture("cond", condition);
        vec![assign, exit_unless(reference)]
    }
}

fn exit_unless(condition: Expr) -> Stmt {
    Stmt::if_then(Expr::not(condition), vec![Stmt::flow(InstructionFlow::Break)])
}

fn forever(stmts: Vec<Stmt>, body_span: Span, span: Span) -> Stmt {
    Stmt::new(
        StmtKind::While {
            condition: Expr::bool(true),
            body: Block::new(stmts, body_span),
        },
        span,
    )
}

/// Insert `tail` before every `continue` that belongs to this loop
fn replay_before_continue(stmts: Vec<Stmt>, tail: &[Stmt]) -> Vec<Stmt> {
    if tail.is_empty() {
        return stmts;
    }
    let mut out = Vec::with_capacity(stmts.len());
    for stmt in stmts {
        if matches!(stmt.kind, StmtKind::Flow(InstructionFlow::Continue)) {
            out.extend_from_slice(tail);
            out.push(stmt);
        } else {
            out.push(map_nested_lists(stmt, &mut |list| {
                replay_before_continue(list, tail)
            }));
        }
    }
    out
}
