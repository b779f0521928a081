//! Lexical context threaded through the polisher

use std::collections::BTreeSet;

use crate::ast::{FunctionDecl, ForInBinding, Stmt, StmtKind};

/// What encloses the node being rewritten
///
/// Contexts are immutable; entering a scope derives a new one.
#[derive(Debug, Clone, Default)]
pub struct LexicalContext {
    pub class_name: Option<String>,
    pub superclass: Option<String>,
    /// Inside a function declared as a class member
    pub in_method: bool,
    /// QS names declared by the enclosing function
    pub locals: BTreeSet<String>,
    /// Temporaries of enclosing `with` statements, innermost last
    pub with_objects: Vec<String>,
}

impl LexicalContext {
    #[must_use]
    pub fn enter_class(&self, name: &str, superclass: Option<&str>) -> Self {
        Self {
            class_name: Some(name.to_string()),
            superclass: superclass.map(str::to_string),
            in_method: false,
            locals: BTreeSet::new(),
            with_objects: Vec::new(),
        }
    }

    /// Scope of a function body; `member` marks class methods
    #[must_use]
    pub fn enter_function(&self, decl: &FunctionDecl, member: bool) -> Self {
        let mut locals: BTreeSet<String> = decl.params.iter().map(|p| p.name.clone()).collect();
        collect_declared(&decl.body.stmts, &mut locals);
        Self {
            class_name: self.class_name.clone(),
            superclass: self.superclass.clone(),
            in_method: member || self.in_method,
            locals,
            with_objects: Vec::new(),
        }
    }

    #[must_use]
    pub fn enter_with(&self, temp: &str) -> Self {
        let mut ctx = self.clone();
        ctx.with_objects.push(temp.to_string());
        ctx
    }

    #[must_use]
    pub fn with_local(&self, name: &str) -> Self {
        let mut ctx = self.clone();
        ctx.locals.insert(name.to_string());
        ctx
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.locals.contains(name)
    }

    /// Innermost `with` temporary, if any
    pub fn with_object(&self) -> Option<&str> {
        self.with_objects.last().map(String::as_str)
    }
}

/// Names a statement list declares in its own function scope
///
/// Declarations are hoisted: nested blocks count, nested functions and
/// classes do not (only their own name does).
pub fn collect_declared(stmts: &[Stmt], names: &mut BTreeSet<String>) {
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::Variable(decl) => {
                names.extend(decl.vars.iter().map(|v| v.name.name.clone()));
            }
            StmtKind::Function(decl) => {
                names.insert(decl.name.name.clone());
            }
            StmtKind::Class(decl) => {
                names.insert(decl.name.name.clone());
            }
            StmtKind::If {
                then_branch,
                else_branch,
                ..
            } => {
                collect_declared(&then_branch.stmts, names);
                if let Some(block) = else_branch {
                    collect_declared(&block.stmts, names);
                }
            }
            StmtKind::While { body, .. }
            | StmtKind::DoWhile { body, .. }
            | StmtKind::With { body, .. }
            | StmtKind::Block(body) => collect_declared(&body.stmts, names),
            StmtKind::For { init, body, .. } => {
                if let Some(init) = init {
                    collect_declared(std::slice::from_ref(init.as_ref()), names);
                }
                collect_declared(&body.stmts, names);
            }
            StmtKind::ForIn { binding, body, .. } => {
                if let ForInBinding::Declare(ident) = binding {
                    names.insert(ident.name.clone());
                }
                collect_declared(&body.stmts, names);
            }
            StmtKind::Switch { cases, .. } => {
                for case in cases {
                    collect_declared(&case.body, names);
                }
            }
            StmtKind::TryCatch {
                body,
                catch,
                finally,
            } => {
                collect_declared(&body.stmts, names);
                if let Some(clause) = catch {
                    if let Some(binding) = &clause.binding {
                        names.insert(binding.name.clone());
                    }
                    collect_declared(&clause.body.stmts, names);
                }
                if let Some(block) = finally {
                    collect_declared(&block.stmts, names);
                }
            }
            StmtKind::Unknown { body, .. } => collect_declared(body, names),
            StmtKind::Expression(_) | StmtKind::Flow(_) => {}
        }
    }
}
