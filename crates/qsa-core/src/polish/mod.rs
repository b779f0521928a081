//! Post-parser rewrites
//!
//! The polisher bridges QS constructs that have no direct Python equivalent.
//! It is a pure fold over the AST: every statement is rewritten into zero or
//! more statements, children first, with a [`LexicalContext`] describing the
//! enclosing class, function and `with` scopes.
//!
//! Rewrites that need a private name draw it from a per-unit counter that
//! starts at zero, so polishing the same AST twice gives the same result.

mod anon;
mod class;
mod context;
mod effects;
mod loops;
mod switch;
mod trycatch;
mod with;

pub use context::{collect_declared, LexicalContext};

use std::collections::BTreeSet;

use crate::ast::{
    Block, DeclarationBlock, Expr, ExprKind, ForInBinding, FunctionDecl, Ident, Source, Stmt,
    StmtKind, SwitchCase, Variable,
};
use crate::config::KnownSymbols;
use crate::names::{map_identifier, map_member};

/// Rewrite a parsed unit into a shape the emitter can translate directly
#[must_use]
pub fn polish(source: Source, known: &KnownSymbols) -> Source {
    let mut polisher = Polisher::new(known, &source.body);
    let body = polisher.stmts(source.body, &LexicalContext::default());
    Source::new(body, source.span)
}

struct Polisher<'a> {
    counter: u32,
    known: &'a KnownSymbols,
    /// Names the unit declares at top level; these shadow known symbols
    globals: BTreeSet<String>,
}

impl<'a> Polisher<'a> {
    fn new(known: &'a KnownSymbols, body: &[Stmt]) -> Self {
        let mut globals = BTreeSet::new();
        collect_declared(body, &mut globals);
        Self {
            counter: 0,
            known,
            globals,
        }
    }

    fn fresh(&mut self) -> u32 {
        let n = self.counter;
        self.counter += 1;
        n
    }

    /// `_<prefix>_N = value`, returning the assignment and a reference to the temporary
    fn capture(&mut self, prefix: &str, value: Expr) -> (Stmt, Expr) {
        let name = format!("_{prefix}_{}", self.fresh());
        (
            Stmt::expr(Expr::assign(Expr::ident(&name), value)),
            Expr::ident(name),
        )
    }

    // ==================== Statements ====================

    fn stmts(&mut self, stmts: Vec<Stmt>, ctx: &LexicalContext) -> Vec<Stmt> {
        let mut out = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            out.extend(self.stmt(stmt, ctx));
        }
        out
    }

    fn block(&mut self, block: Block, ctx: &LexicalContext) -> Block {
        Block::new(self.stmts(block.stmts, ctx), block.span)
    }

    fn stmt(&mut self, stmt: Stmt, ctx: &LexicalContext) -> Vec<Stmt> {
        let span = stmt.span;
        let mut pre = Vec::new();
        let out = match stmt.kind {
            StmtKind::Class(decl) => vec![self.class(decl, ctx, span)],
            StmtKind::Function(decl) => {
                let decl = self.function(decl, ctx, false);
                vec![Stmt::new(StmtKind::Function(decl), span)]
            }
            StmtKind::Variable(decl) => {
                let decl = self.declaration(decl, ctx, &mut pre);
                vec![Stmt::new(StmtKind::Variable(decl), span)]
            }
            StmtKind::Expression(expr) => {
                let expr = self.expr(expr, ctx, &mut pre);
                effects::expression_stmt(expr, span)
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.expr(condition, ctx, &mut pre);
                let then_branch = self.block(then_branch, ctx);
                let else_branch = else_branch.map(|block| self.block(block, ctx));
                self.if_stmt(condition, then_branch, else_branch, span)
            }
            StmtKind::While { condition, body } => {
                let condition = self.expr(condition, ctx, &mut pre);
                let body = self.block(body, ctx);
                self.while_loop(condition, body, span)
            }
            StmtKind::DoWhile { body, condition } => {
                let body = self.block(body, ctx);
                let condition = self.expr(condition, ctx, &mut pre);
                self.do_while(body, condition, span)
            }
            StmtKind::For {
                init,
                condition,
                update,
                body,
            } => {
                let init = match init {
                    Some(init) => self.stmt(*init, ctx),
                    None => Vec::new(),
                };
                let condition = condition.map(|c| self.expr(c, ctx, &mut pre));
                let update = update.map(|u| self.expr(u, ctx, &mut pre));
                let body = self.block(body, ctx);
                self.for_loop(init, condition, update, body, span)
            }
            StmtKind::ForIn {
                binding,
                object,
                body,
            } => {
                let binding = match binding {
                    ForInBinding::Declare(name) => ForInBinding::Declare(mapped(name)),
                    ForInBinding::Target(target) => {
                        ForInBinding::Target(self.expr(target, ctx, &mut pre))
                    }
                };
                let object = self.expr(object, ctx, &mut pre);
                let body = self.block(body, ctx);
                self.for_in(binding, object, body, span)
            }
            StmtKind::Switch { subject, cases } => {
                let subject = self.expr(subject, ctx, &mut pre);
                let mut polished = Vec::with_capacity(cases.len());
                for case in cases {
                    let test = case.test.map(|t| self.expr(t, ctx, &mut pre));
                    let body = self.stmts(case.body, ctx);
                    polished.push(SwitchCase { test, body });
                }
                self.switch(subject, polished, span)
            }
            StmtKind::TryCatch {
                body,
                catch,
                finally,
            } => self.try_catch(body, catch, finally, ctx, span),
            StmtKind::With { object, body } => {
                let object = self.expr(object, ctx, &mut pre);
                self.with(object, body, ctx, span)
            }
            StmtKind::Flow(flow) => self.flow(flow, ctx, &mut pre, span),
            // Python has no block scope
            StmtKind::Block(block) => self.stmts(block.stmts, ctx),
            StmtKind::Unknown { construct, body } => vec![Stmt::new(
                StmtKind::Unknown {
                    construct,
                    body: self.stmts(body, ctx),
                },
                span,
            )],
        };
        pre.extend(out);
        pre
    }

    /// Polish a function declaration; `member` marks class methods
    fn function(&mut self, decl: FunctionDecl, ctx: &LexicalContext, member: bool) -> FunctionDecl {
        let inner = ctx.enter_function(&decl, member);
        FunctionDecl {
            name: mapped(decl.name),
            params: decl.params.into_iter().map(mapped).collect(),
            body: self.block(decl.body, &inner),
            is_static: decl.is_static,
        }
    }

    fn declaration(
        &mut self,
        decl: DeclarationBlock,
        ctx: &LexicalContext,
        pre: &mut Vec<Stmt>,
    ) -> DeclarationBlock {
        let vars = decl
            .vars
            .into_iter()
            .map(|var| Variable {
                name: mapped(var.name),
                init: var.init.map(|init| self.expr(init, ctx, pre)),
            })
            .collect();
        DeclarationBlock {
            mode: decl.mode,
            vars,
            is_static: decl.is_static,
        }
    }

    // ==================== Expressions ====================

    fn exprs(&mut self, exprs: Vec<Expr>, ctx: &LexicalContext, pre: &mut Vec<Stmt>) -> Vec<Expr> {
        exprs.into_iter().map(|e| self.expr(e, ctx, pre)).collect()
    }

    fn boxed(&mut self, expr: Box<Expr>, ctx: &LexicalContext, pre: &mut Vec<Stmt>) -> Box<Expr> {
        Box::new(self.expr(*expr, ctx, pre))
    }

    /// Polish an expression; statements it needs hoisted land in `pre`
    fn expr(&mut self, expr: Expr, ctx: &LexicalContext, pre: &mut Vec<Stmt>) -> Expr {
        let span = expr.span;
        let kind = match expr.kind {
            ExprKind::Constant(constant) => ExprKind::Constant(constant),
            ExprKind::Identifier(name) => ExprKind::Identifier(self.identifier(&name, ctx)),
            ExprKind::This => ExprKind::Identifier(map_identifier("this")),
            ExprKind::FunctionCall { callee, args } => {
                let routed = match &callee.kind {
                    ExprKind::Identifier(name) => class::super_constructor(name, ctx)
                        .or_else(|| self.with_callee(name, ctx)),
                    _ => None,
                };
                let callee = match routed {
                    Some(routed) => Box::new(routed),
                    None => self.boxed(callee, ctx, pre),
                };
                ExprKind::FunctionCall {
                    callee,
                    args: self.exprs(args, ctx, pre),
                }
            }
            ExprKind::New { callee, args } => ExprKind::New {
                callee: self.boxed(callee, ctx, pre),
                args: self.exprs(args, ctx, pre),
            },
            ExprKind::Member { object, property } => ExprKind::Member {
                object: self.boxed(object, ctx, pre),
                property: Ident::new(map_member(&property.name), property.span),
            },
            ExprKind::ArrayMember { object, index } => ExprKind::ArrayMember {
                object: self.boxed(object, ctx, pre),
                index: self.boxed(index, ctx, pre),
            },
            ExprKind::OpMath { left, op, right } => ExprKind::OpMath {
                left: self.boxed(left, ctx, pre),
                op,
                right: self.boxed(right, ctx, pre),
            },
            ExprKind::Compare { left, op, right } => ExprKind::Compare {
                left: self.boxed(left, ctx, pre),
                op,
                right: self.boxed(right, ctx, pre),
            },
            ExprKind::Logical { left, op, right } => ExprKind::Logical {
                left: self.boxed(left, ctx, pre),
                op,
                right: self.boxed(right, ctx, pre),
            },
            ExprKind::Unary { op, operand } => ExprKind::Unary {
                op,
                operand: self.boxed(operand, ctx, pre),
            },
            ExprKind::OpUpdate { op, prefix, target } => ExprKind::OpUpdate {
                op,
                prefix,
                target: self.boxed(target, ctx, pre),
            },
            ExprKind::Assign { target, op, value } => ExprKind::Assign {
                target: self.boxed(target, ctx, pre),
                op,
                value: self.boxed(value, ctx, pre),
            },
            ExprKind::Ternary {
                condition,
                then_value,
                else_value,
            } => ExprKind::Ternary {
                condition: self.boxed(condition, ctx, pre),
                then_value: self.boxed(then_value, ctx, pre),
                else_value: self.boxed(else_value, ctx, pre),
            },
            ExprKind::Array(items) => ExprKind::Array(self.exprs(items, ctx, pre)),
            ExprKind::Object(props) => ExprKind::Object(
                props
                    .into_iter()
                    .map(|(key, value)| (key, self.expr(value, ctx, pre)))
                    .collect(),
            ),
            ExprKind::Function(decl) => return self.anonymous_function(*decl, ctx, span, pre),
            ExprKind::Sequence(items) => ExprKind::Sequence(self.exprs(items, ctx, pre)),
            ExprKind::Unknown(construct) => ExprKind::Unknown(construct),
        };
        Expr::new(kind, span)
    }

    /// Host spelling of a bare name
    fn identifier(&self, name: &str, ctx: &LexicalContext) -> String {
        if !ctx.is_local(name) && !self.globals.contains(name) {
            if let Some(host) = self.known.get(name) {
                return host.clone();
            }
        }
        map_identifier(name)
    }
}

fn mapped(ident: Ident) -> Ident {
    Ident::new(map_identifier(&ident.name), ident.span)
}

/// Apply `f` to every statement list nested in `stmt` that runs at the same
/// loop level
///
/// Loops, switches, functions and classes are left alone: a `break` or
/// `continue` inside them belongs to them.
fn map_nested_lists(stmt: Stmt, f: &mut dyn FnMut(Vec<Stmt>) -> Vec<Stmt>) -> Stmt {
    let kind = match stmt.kind {
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            let then_branch = map_block(then_branch, f);
            StmtKind::If {
                condition,
                then_branch,
                else_branch: else_branch.map(|block| map_block(block, f)),
            }
        }
        StmtKind::TryCatch {
            body,
            catch,
            finally,
        } => {
            let body = map_block(body, f);
            let catch = catch.map(|mut clause| {
                clause.body = map_block(clause.body, f);
                clause
            });
            StmtKind::TryCatch {
                body,
                catch,
                finally: finally.map(|block| map_block(block, f)),
            }
        }
        StmtKind::With { object, body } => StmtKind::With {
            object,
            body: map_block(body, f),
        },
        StmtKind::Block(body) => StmtKind::Block(map_block(body, f)),
        StmtKind::Unknown { construct, body } => StmtKind::Unknown {
            construct,
            body: f(body),
        },
        other => other,
    };
    Stmt::new(kind, stmt.span)
}

fn map_block(block: Block, f: &mut dyn FnMut(Vec<Stmt>) -> Vec<Stmt>) -> Block {
    Block::new(f(block.stmts), block.span)
}

#[cfg(test)]
pub(crate) fn polish_script(source: &str, known: &KnownSymbols) -> Source {
    let tree = crate::parser::Parser::parse_source(source).unwrap_or_else(|errors| {
        panic!("parse failed: {errors:?}");
    });
    polish(crate::ast::build_source(&tree), known)
}

#[cfg(test)]
pub(crate) fn polished_xml(source: &str) -> String {
    crate::ast::to_xml(&polish_script(source, &KnownSymbols::new())).to_xml_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn this_becomes_self() {
        let xml = polished_xml("this.x = 1;");
        assert!(xml.contains("<Identifier name=\"self\"/>"));
        assert!(!xml.contains("\"this\""));
    }

    #[test]
    fn names_are_mapped() {
        let xml = polished_xml("var class = a.startsWith(b); lambda(unknown);");
        assert!(xml.contains("<Variable name=\"class_\">"));
        assert!(xml.contains("<Member name=\"startswith\">"));
        assert!(xml.contains("<Identifier name=\"lambda_\"/>"));
        assert!(xml.contains("<Identifier name=\"None\"/>"));
    }

    #[test]
    fn known_symbols_unless_shadowed() {
        let mut known = KnownSymbols::new();
        known.insert("flfactppal".into(), "qsa.from_project(\"flfactppal\")".into());
        let source = polish_script(
            "function a() { return flfactppal.iface; }\n\
             function b(flfactppal) { return flfactppal.iface; }",
            &known,
        );
        let xml = crate::ast::to_xml(&source).to_xml_string();
        assert_eq!(xml.matches("qsa.from_project").count(), 1);
        assert!(xml.contains("<Identifier name=\"flfactppal\"/>"));
    }

    #[test]
    fn nested_blocks_are_flattened() {
        let source = polish_script("{ a(); { b(); } }", &KnownSymbols::new());
        assert_eq!(source.body.len(), 2);
        assert!(source
            .body
            .iter()
            .all(|s| matches!(s.kind, StmtKind::Expression(_))));
    }

    #[test]
    fn polishing_is_deterministic() {
        let text = "function f(o) { with (o) { a(); } switch (o) { case 1: b(); } }";
        assert_eq!(polished_xml(text), polished_xml(text));
    }

    #[test]
    fn unknown_bodies_are_polished() {
        let source = Source::new(
            vec![Stmt::synthetic(StmtKind::Unknown {
                construct: "LabeledStmt".into(),
                body: vec![Stmt::expr(Expr::synthetic(ExprKind::This))],
            })],
            crate::ast::Span::synthetic(),
        );
        let polished = polish(source, &KnownSymbols::new());
        let xml = crate::ast::to_xml(&polished).to_xml_string();
        assert!(xml.contains("<Unknown construct=\"LabeledStmt\">"));
        assert!(xml.contains("name=\"self\""));
    }
}
