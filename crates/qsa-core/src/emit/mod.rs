//! Python code generation
//!
//! [`emit_source`] walks a polished AST and produces a flat stream of
//! [`EmitToken`]s; [`write_tokens`] turns the stream into indented source.
//! Every statement kind has a rendering. Constructs the polisher normally
//! removes still get a best-effort rendering behind a `debug` marker.

mod expr;
mod token;
mod writer;

pub use token::{BlockTag, EmitToken};
pub use writer::{write_tokens, Writer, WriterError};

use crate::ast::{
    Block, Expr, ForInBinding, FunctionDecl, InstructionFlow, Source, Stmt, StmtKind,
};
use crate::config::TranspileConfig;

use expr::ExprWriter;

/// Token stream for one translation unit, header lines first
#[must_use]
pub fn emit_source(source: &Source, config: &TranspileConfig) -> Vec<EmitToken> {
    let mut emitter = Emitter::new(&config.runtime_module);
    for line in &config.header {
        emitter.push(EmitToken::Line(line.clone()));
    }
    if !config.header.is_empty() {
        emitter.push(EmitToken::Break);
    }
    emitter.stmts(&source.body);
    emitter.tokens
}

/// Emits statements into a token stream
struct Emitter<'a> {
    runtime: &'a str,
    tokens: Vec<EmitToken>,
    next_id: u32,
    depth: usize,
}

impl<'a> Emitter<'a> {
    fn new(runtime: &'a str) -> Self {
        Self {
            runtime,
            tokens: Vec::new(),
            next_id: 0,
            depth: 0,
        }
    }

    fn push(&mut self, token: EmitToken) {
        self.tokens.push(token);
    }

    fn begin(&mut self, kind: &'static str, header: String) -> BlockTag {
        let tag = BlockTag {
            kind,
            id: self.next_id,
        };
        self.next_id += 1;
        self.depth += 1;
        self.push(EmitToken::Begin { tag, header });
        tag
    }

    fn end(&mut self, tag: BlockTag) {
        self.depth -= 1;
        self.push(EmitToken::End(tag));
    }

    fn block(&mut self, kind: &'static str, header: String, stmts: &[Stmt]) {
        let tag = self.begin(kind, header);
        self.stmts(stmts);
        self.end(tag);
    }

    fn writer(&self) -> ExprWriter<'a> {
        ExprWriter::new(self.runtime)
    }

    /// Push what an expression lifted out, ahead of its statement
    fn prelude(&mut self, writer: ExprWriter<'_>) {
        for note in writer.notes {
            tracing::debug!("untranslated expression: {note}");
            self.push(EmitToken::Debug(note));
        }
        for line in writer.pre {
            self.push(EmitToken::Line(line));
        }
        for line in writer.post {
            self.push(EmitToken::LineDeferred(line));
        }
    }

    /// Render one expression for a statement header, pushing its prelude
    fn header_expr(&mut self, expr: &Expr) -> String {
        let mut writer = self.writer();
        let text = writer.render(expr);
        self.prelude(writer);
        text
    }

    fn stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Class(decl) => {
                self.separate_definition();
                let base = decl
                    .extends
                    .as_ref()
                    .map_or("object", |base| base.name.as_str());
                let tag = self.begin("class", format!("class {}({base}):", decl.name.name));
                for member in &decl.members {
                    match &member.kind {
                        StmtKind::Function(method) if method.is_static => {
                            self.push(EmitToken::Line("@staticmethod".into()));
                            self.function(method);
                        }
                        _ => self.stmt(member),
                    }
                }
                self.end(tag);
                self.separate_definition();
            }
            StmtKind::Function(decl) => {
                self.separate_definition();
                self.function(decl);
                self.separate_definition();
            }
            StmtKind::Variable(decl) => {
                for var in &decl.vars {
                    let mut writer = self.writer();
                    let value = var
                        .init
                        .as_ref()
                        .map_or_else(|| "None".to_string(), |init| writer.render(init));
                    self.prelude(writer);
                    self.push(EmitToken::Line(format!("{} = {value}", var.name.name)));
                }
            }
            StmtKind::Expression(expr) => {
                let mut writer = self.writer();
                let text = writer.statement(expr);
                self.prelude(writer);
                self.push(EmitToken::Expr(text));
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => self.if_chain("if", condition, then_branch, else_branch.as_ref()),
            StmtKind::While { condition, body } => {
                let condition = self.header_expr(condition);
                self.block("while", format!("while {condition}:"), &body.stmts);
            }
            StmtKind::DoWhile { body, condition } => {
                self.debug("do-while");
                let exit = Stmt::if_then(
                    Expr::not(condition.clone()),
                    vec![Stmt::flow(InstructionFlow::Break)],
                );
                let tag = self.begin("while", "while True:".into());
                self.stmts(&body.stmts);
                self.stmt(&exit);
                self.end(tag);
            }
            StmtKind::For {
                init,
                condition,
                update,
                body,
            } => {
                self.debug("for");
                if let Some(init) = init {
                    self.stmt(init);
                }
                let condition = match condition {
                    Some(condition) => self.header_expr(condition),
                    None => "True".to_string(),
                };
                let tag = self.begin("while", format!("while {condition}:"));
                self.stmts(&body.stmts);
                if let Some(update) = update {
                    self.stmt(&Stmt::expr(update.clone()));
                }
                self.end(tag);
            }
            StmtKind::ForIn {
                binding,
                object,
                body,
            } => {
                let mut writer = self.writer();
                let target = match binding {
                    ForInBinding::Declare(name) => name.name.clone(),
                    ForInBinding::Target(target) => writer.render(target),
                };
                let object = writer.render(object);
                self.prelude(writer);
                self.block("for", format!("for {target} in {object}:"), &body.stmts);
            }
            StmtKind::Switch { subject, cases } => {
                self.debug("switch");
                let mut writer = self.writer();
                let subject = writer.render(subject);
                self.prelude(writer);
                self.push(EmitToken::Debug(format!("switch on {subject}")));
                for case in cases {
                    self.stmts(&case.body);
                }
            }
            StmtKind::TryCatch {
                body,
                catch,
                finally,
            } => {
                self.block("try", "try:".into(), &body.stmts);
                match (catch, finally) {
                    (Some(clause), _) => {
                        let header = match &clause.binding {
                            Some(name) => format!("except Exception as {}:", name.name),
                            None => "except Exception:".to_string(),
                        };
                        self.block("except", header, &clause.body.stmts);
                    }
                    (None, None) => {
                        let tag = self.begin("except", "except Exception:".into());
                        self.push(EmitToken::Line("raise".into()));
                        self.end(tag);
                    }
                    (None, Some(_)) => {}
                }
                if let Some(block) = finally {
                    self.block("finally", "finally:".into(), &block.stmts);
                }
            }
            StmtKind::With { object, body } => {
                self.debug("with");
                let object = self.header_expr(object);
                self.push(EmitToken::Debug(format!("with {object}")));
                self.stmts(&body.stmts);
            }
            StmtKind::Flow(flow) => self.flow(flow),
            StmtKind::Block(block) => self.stmts(&block.stmts),
            StmtKind::Unknown { construct, body } => {
                self.debug(construct);
                self.stmts(body);
            }
        }
    }

    fn function(&mut self, decl: &FunctionDecl) {
        let params: Vec<&str> = decl.params.iter().map(|p| p.name.as_str()).collect();
        self.block(
            "def",
            format!("def {}({}):", decl.name.name, params.join(", ")),
            &decl.body.stmts,
        );
    }

    fn if_chain(
        &mut self,
        keyword: &'static str,
        condition: &Expr,
        then_branch: &Block,
        else_branch: Option<&Block>,
    ) {
        let condition = self.header_expr(condition);
        self.block(keyword, format!("{keyword} {condition}:"), &then_branch.stmts);
        let Some(else_branch) = else_branch else {
            return;
        };
        match else_branch.stmts.as_slice() {
            // `elif` only when nothing has to run between the two branches
            [Stmt {
                kind:
                    StmtKind::If {
                        condition,
                        then_branch,
                        else_branch,
                    },
                ..
            }] if !condition.needs_hoisting() => {
                self.if_chain("elif", condition, then_branch, else_branch.as_ref());
            }
            stmts => self.block("else", "else:".into(), stmts),
        }
    }

    fn flow(&mut self, flow: &InstructionFlow) {
        let line = match flow {
            InstructionFlow::Return(None) => "return".to_string(),
            InstructionFlow::Return(Some(value)) => format!("return {}", self.header_expr(value)),
            InstructionFlow::Break => "break".to_string(),
            InstructionFlow::Continue => "continue".to_string(),
            InstructionFlow::Throw(value) => {
                format!("raise Exception({})", self.header_expr(value))
            }
        };
        self.push(EmitToken::Line(line));
    }

    fn debug(&mut self, construct: &str) {
        tracing::debug!("emitting untranslated construct: {construct}");
        self.push(EmitToken::Debug(construct.to_string()));
    }

    /// Blank line around top-level definitions
    fn separate_definition(&mut self) {
        if self.depth == 0 {
            self.push(EmitToken::Break);
        }
    }
}
