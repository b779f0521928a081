//! `try`/`catch`
//!
//! The catch variable holds the formatted traceback text rather than the
//! exception object; legacy scripts treat it as a message string.

use crate::ast::{Block, CatchClause, Expr, ExprKind, Span, Stmt, StmtKind};
use crate::names::map_identifier;

use super::{LexicalContext, Polisher};

impl Polisher<'_> {
    pub(super) fn try_catch(
        &mut self,
        body: Block,
        catch: Option<CatchClause>,
        finally: Option<Block>,
        ctx: &LexicalContext,
        span: Span,
    ) -> Vec<Stmt> {
        let body = self.block(body, ctx);
        let catch = catch.map(|clause| self.catch_clause(clause, ctx));
        let finally = finally.map(|block| self.block(block, ctx));
        vec![Stmt::new(
            StmtKind::TryCatch {
                body,
                catch,
                finally,
            },
            span,
        )]
    }

    fn catch_clause(&mut self, clause: CatchClause, ctx: &LexicalContext) -> CatchClause {
        let Some(binding) = clause.binding else {
            return CatchClause {
                binding: None,
                body: self.block(clause.body, ctx),
            };
        };
        let inner = ctx.with_local(&binding.name);
        let target = Expr::new(
            ExprKind::Identifier(map_identifier(&binding.name)),
            binding.span,
        );
        let mut stmts = vec![Stmt::new(
            StmtKind::Expression(Expr::assign(target, formatted_traceback())),
            binding.span,
        )];
        stmts.extend(self.stmts(clause.body.stmts, &inner));
        CatchClause {
            binding: None,
            body: Block::new(stmts, clause.body.span),
        }
    }
}

fn formatted_traceback() -> Expr {
    Expr::call(Expr::member(Expr::ident("traceback"), "format_exc"), vec![])
}

#[cfg(test)]
mod tests {
    use crate::polish::polished_xml;

    #[test]
    fn binding_receives_traceback_text() {
        let xml = polished_xml("try { f(); } catch (e) { debug(e); }");
        let flat = xml.split_whitespace().collect::<Vec<_>>().join(" ");
        assert!(flat.contains("<Catch> <Expression> <Assign type=\"=\"> <Identifier name=\"e\"/>"));
        assert!(xml.contains("<Member name=\"format_exc\">"));
        assert!(!xml.contains("<Catch name="));
    }

    #[test]
    fn catch_without_binding_and_finally() {
        let xml = polished_xml("try { f(); } catch { g(); } finally { h(); }");
        assert!(!xml.contains("format_exc"));
        assert!(xml.contains("<Finally>"));
    }

    #[test]
    fn reserved_binding_is_escaped() {
        let xml = polished_xml("try { f(); } catch (except) { g(except); }");
        assert_eq!(xml.matches("<Identifier name=\"except_\"/>").count(), 2);
    }
}
