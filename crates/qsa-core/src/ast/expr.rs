//! Expression AST nodes

use crate::lexer::Span;

use super::{FunctionDecl, Ident, Spanned};

/// Arithmetic and bitwise operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MathOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    /// `>>>`
    UShr,
}

impl MathOp {
    /// QS spelling of the operator
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            MathOp::Add => "+",
            MathOp::Sub => "-",
            MathOp::Mul => "*",
            MathOp::Div => "/",
            MathOp::Mod => "%",
            MathOp::BitAnd => "&",
            MathOp::BitOr => "|",
            MathOp::BitXor => "^",
            MathOp::Shl => "<<",
            MathOp::Shr => ">>",
            MathOp::UShr => ">>>",
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    Lt,
    Le,
    Gt,
    Ge,
    Instanceof,
    In,
}

impl CompareOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::StrictEq => "===",
            CompareOp::StrictNe => "!==",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Instanceof => "instanceof",
            CompareOp::In => "in",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    BitNot,
    Typeof,
    Void,
    Delete,
}

impl UnaryOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::BitNot => "~",
            UnaryOp::Typeof => "typeof",
            UnaryOp::Void => "void",
            UnaryOp::Delete => "delete",
        }
    }
}

/// `++` and `--`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

impl UpdateOp {
    /// The equivalent compound assignment
    #[must_use]
    pub const fn as_assign(self) -> AssignOp {
        match self {
            UpdateOp::Increment => AssignOp::Compound(MathOp::Add),
            UpdateOp::Decrement => AssignOp::Compound(MathOp::Sub),
        }
    }
}

/// `=` or a compound assignment such as `+=`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    Compound(MathOp),
}

/// Literal values, kept in source spelling so no precision is lost
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Decimal or hex integer text
    Int(String),
    /// Float text
    Float(String),
    /// String body between the quotes, escapes untouched
    Str { raw: String, quote: char },
    Bool(bool),
    Null,
    Undefined,
    Regex { body: String, flags: String },
}

/// An expression with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    #[must_use]
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// An expression created by a rewrite
    #[must_use]
    pub fn synthetic(kind: ExprKind) -> Self {
        Self::new(kind, Span::synthetic())
    }

    #[must_use]
    pub fn ident(name: impl Into<String>) -> Self {
        Self::synthetic(ExprKind::Identifier(name.into()))
    }

    #[must_use]
    pub fn bool(value: bool) -> Self {
        Self::synthetic(ExprKind::Constant(Constant::Bool(value)))
    }

    #[must_use]
    pub fn int(value: u32) -> Self {
        Self::synthetic(ExprKind::Constant(Constant::Int(value.to_string())))
    }

    #[must_use]
    pub fn not(operand: Expr) -> Self {
        Self::synthetic(ExprKind::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        })
    }

    #[must_use]
    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Self::synthetic(ExprKind::FunctionCall {
            callee: Box::new(callee),
            args,
        })
    }

    #[must_use]
    pub fn member(object: Expr, property: impl Into<String>) -> Self {
        Self::synthetic(ExprKind::Member {
            object: Box::new(object),
            property: Ident::synthetic(property),
        })
    }

    #[must_use]
    pub fn assign(target: Expr, value: Expr) -> Self {
        Self::synthetic(ExprKind::Assign {
            target: Box::new(target),
            op: AssignOp::Assign,
            value: Box::new(value),
        })
    }

    #[must_use]
    pub fn compare(left: Expr, op: CompareOp, right: Expr) -> Self {
        Self::synthetic(ExprKind::Compare {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    #[must_use]
    pub fn logical(left: Expr, op: LogicalOp, right: Expr) -> Self {
        Self::synthetic(ExprKind::Logical {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    /// True for a string literal
    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self.kind, ExprKind::Constant(Constant::Str { .. }))
    }

    /// Visit this expression and every nested one, not entering function literals
    pub fn walk(&self, f: &mut impl FnMut(&Expr)) {
        f(self);
        match &self.kind {
            ExprKind::Constant(_)
            | ExprKind::Identifier(_)
            | ExprKind::This
            | ExprKind::Function(_)
            | ExprKind::Unknown(_) => {}
            ExprKind::FunctionCall { callee, args } | ExprKind::New { callee, args } => {
                callee.walk(f);
                for arg in args {
                    arg.walk(f);
                }
            }
            ExprKind::Member { object, .. } => object.walk(f),
            ExprKind::ArrayMember { object, index } => {
                object.walk(f);
                index.walk(f);
            }
            ExprKind::OpMath { left, right, .. }
            | ExprKind::Compare { left, right, .. }
            | ExprKind::Logical { left, right, .. } => {
                left.walk(f);
                right.walk(f);
            }
            ExprKind::Unary { operand, .. } => operand.walk(f),
            ExprKind::OpUpdate { target, .. } => target.walk(f),
            ExprKind::Assign { target, value, .. } => {
                target.walk(f);
                value.walk(f);
            }
            ExprKind::Ternary {
                condition,
                then_value,
                else_value,
            } => {
                condition.walk(f);
                then_value.walk(f);
                else_value.walk(f);
            }
            ExprKind::Array(items) | ExprKind::Sequence(items) => {
                for item in items {
                    item.walk(f);
                }
            }
            ExprKind::Object(props) => {
                for (_, value) in props {
                    value.walk(f);
                }
            }
        }
    }

    /// True if any nested node matches `pred`
    #[must_use]
    pub fn any(&self, pred: impl Fn(&Expr) -> bool) -> bool {
        let mut found = false;
        self.walk(&mut |e| found = found || pred(e));
        found
    }

    /// Contains `x++` or `x--` whose write happens after the read
    #[must_use]
    pub fn has_post_update(&self) -> bool {
        self.any(|e| matches!(e.kind, ExprKind::OpUpdate { prefix: false, .. }))
    }

    /// Contains an assignment, update or delete, which the emitter lifts into
    /// separate lines
    #[must_use]
    pub fn needs_hoisting(&self) -> bool {
        self.any(|e| {
            matches!(
                e.kind,
                ExprKind::Assign { .. }
                    | ExprKind::OpUpdate { .. }
                    | ExprKind::Unary {
                        op: UnaryOp::Delete,
                        ..
                    }
            ) || matches!(&e.kind, ExprKind::Sequence(items) if items.len() > 1)
        })
    }
}

impl Spanned for Expr {
    fn span(&self) -> Span {
        self.span
    }
}

/// The kind of expression
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Constant(Constant),

    /// A name; after polishing, the host spelling
    Identifier(String),

    This,

    FunctionCall {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },

    New {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },

    /// `object.property`
    Member {
        object: Box<Expr>,
        property: Ident,
    },

    /// `object[index]`
    ArrayMember {
        object: Box<Expr>,
        index: Box<Expr>,
    },

    OpMath {
        left: Box<Expr>,
        op: MathOp,
        right: Box<Expr>,
    },

    Compare {
        left: Box<Expr>,
        op: CompareOp,
        right: Box<Expr>,
    },

    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },

    /// `++x`, `x--`
    OpUpdate {
        op: UpdateOp,
        prefix: bool,
        target: Box<Expr>,
    },

    Assign {
        target: Box<Expr>,
        op: AssignOp,
        value: Box<Expr>,
    },

    /// `condition ? then_value : else_value`
    Ternary {
        condition: Box<Expr>,
        then_value: Box<Expr>,
        else_value: Box<Expr>,
    },

    Array(Vec<Expr>),

    /// Object literal; keys are plain strings
    Object(Vec<(String, Expr)>),

    /// Function literal in expression position
    Function(Box<FunctionDecl>),

    /// Comma operator
    Sequence(Vec<Expr>),

    /// A construct with no mapping, named by its production
    Unknown(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(prefix: bool) -> Expr {
        Expr::synthetic(ExprKind::OpUpdate {
            op: UpdateOp::Increment,
            prefix,
            target: Box::new(Expr::ident("i")),
        })
    }

    #[test]
    fn post_update_detection() {
        let cond = Expr::compare(update(false), CompareOp::Lt, Expr::int(3));
        assert!(cond.has_post_update());
        assert!(cond.needs_hoisting());

        let pre = Expr::compare(update(true), CompareOp::Lt, Expr::int(3));
        assert!(!pre.has_post_update());
        assert!(pre.needs_hoisting());
    }

    #[test]
    fn calls_do_not_need_hoisting() {
        let call = Expr::call(Expr::member(Expr::ident("q"), "next"), vec![]);
        assert!(!call.needs_hoisting());
    }

    #[test]
    fn walk_skips_function_literals() {
        let body = super::super::Block::default();
        let literal = Expr::synthetic(ExprKind::Function(Box::new(FunctionDecl {
            name: Ident::synthetic("anon"),
            params: vec![],
            body,
            is_static: false,
        })));
        let mut count = 0;
        literal.walk(&mut |_| count += 1);
        assert_eq!(count, 1);
    }
}
