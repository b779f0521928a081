//! Expression rendering
//!
//! Python has no assignment or update expressions. When one appears inside
//! a larger expression it is lifted out: assignments and prefix updates run
//! before the statement, postfix updates right after it. Lifted code loses
//! short-circuit evaluation.

use crate::ast::{AssignOp, CompareOp, Constant, Expr, ExprKind, LogicalOp, MathOp, UnaryOp, UpdateOp};
use crate::names::map_identifier;

// Python binding strength, loosest first
const TERNARY: u8 = 2;
const OR: u8 = 3;
const AND: u8 = 4;
const NOT: u8 = 5;
const COMPARE: u8 = 6;
const BIT_OR: u8 = 7;
const BIT_XOR: u8 = 8;
const BIT_AND: u8 = 9;
const SHIFT: u8 = 10;
const ADDITIVE: u8 = 11;
const MULTIPLICATIVE: u8 = 12;
const UNARY: u8 = 13;
const ATOM: u8 = 16;

/// Renders expressions of one statement, collecting lifted side effects
pub(super) struct ExprWriter<'a> {
    runtime: &'a str,
    /// Lines to run before the statement
    pub pre: Vec<String>,
    /// Lines to run right after the statement
    pub post: Vec<String>,
    /// Constructs that could not be rendered
    pub notes: Vec<String>,
}

impl<'a> ExprWriter<'a> {
    pub fn new(runtime: &'a str) -> Self {
        Self {
            runtime,
            pre: Vec::new(),
            post: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Render an expression in value position
    pub fn render(&mut self, expr: &Expr) -> String {
        self.at(expr, 0)
    }

    /// Render an expression used as a statement
    pub fn statement(&mut self, expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Assign { target, op, value } => self.assignment(target, *op, value),
            ExprKind::OpUpdate { op, target, .. } => self.update(*op, target),
            ExprKind::Unary {
                op: UnaryOp::Delete,
                operand,
            } => format!("del {}", self.render(operand)),
            ExprKind::Sequence(items) => match items.split_last() {
                Some((last, rest)) => {
                    for item in rest {
                        let line = self.statement(item);
                        self.pre.push(line);
                    }
                    self.statement(last)
                }
                None => "None".to_string(),
            },
            _ => self.render(expr),
        }
    }

    fn at(&mut self, expr: &Expr, min: u8) -> String {
        let (text, prec) = self.expr(expr);
        if prec < min {
            format!("({text})")
        } else {
            text
        }
    }

    fn expr(&mut self, expr: &Expr) -> (String, u8) {
        match &expr.kind {
            ExprKind::Constant(constant) => (self.constant(constant), ATOM),
            ExprKind::Identifier(name) => (name.clone(), ATOM),
            ExprKind::This => (map_identifier("this"), ATOM),
            ExprKind::FunctionCall { callee, args } => {
                let callee = match &callee.kind {
                    // `.length` stays an attribute when called
                    ExprKind::Member { object, property } => {
                        format!("{}.{}", self.at(object, ATOM), property.name)
                    }
                    _ => self.at(callee, ATOM),
                };
                (format!("{callee}({})", self.list(args)), ATOM)
            }
            ExprKind::New { callee, args } => (self.new_object(callee, args), ATOM),
            ExprKind::Member { object, property } => {
                if property.name == "length" {
                    (format!("len({})", self.render(object)), ATOM)
                } else {
                    (format!("{}.{}", self.at(object, ATOM), property.name), ATOM)
                }
            }
            ExprKind::ArrayMember { object, index } => (
                format!("{}[{}]", self.at(object, ATOM), self.render(index)),
                ATOM,
            ),
            ExprKind::OpMath {
                op: MathOp::Add, ..
            } if is_concatenation(expr) => {
                let mut operands = Vec::new();
                concat_operands(expr, &mut operands);
                let parts: Vec<String> = operands.into_iter().map(|e| self.render(e)).collect();
                let runtime = self.runtime;
                (format!("{runtime}.ustr({})", parts.join(", ")), ATOM)
            }
            ExprKind::OpMath { left, op, right } => {
                let prec = math_precedence(*op);
                (self.binary(left, python_math(*op), right, prec), prec)
            }
            ExprKind::Compare {
                left,
                op: CompareOp::Instanceof,
                right,
            } => (
                format!("isinstance({}, {})", self.render(left), self.render(right)),
                ATOM,
            ),
            ExprKind::Compare { left, op, right } => {
                // both sides bind tighter so Python never chains comparisons
                let text = format!(
                    "{} {} {}",
                    self.at(left, COMPARE + 1),
                    python_compare(*op),
                    self.at(right, COMPARE + 1)
                );
                (text, COMPARE)
            }
            ExprKind::Logical { left, op, right } => {
                let (word, prec) = match op {
                    LogicalOp::And => ("and", AND),
                    LogicalOp::Or => ("or", OR),
                };
                (self.binary(left, word, right, prec), prec)
            }
            ExprKind::Unary { op, operand } => self.unary(*op, operand),
            ExprKind::OpUpdate { op, prefix, target } => {
                let line = self.update(*op, target);
                if *prefix {
                    self.pre.push(line);
                } else {
                    self.post.push(line);
                }
                self.expr(target)
            }
            ExprKind::Assign { target, op, value } => {
                let line = self.assignment(target, *op, value);
                self.pre.push(line);
                self.expr(target)
            }
            ExprKind::Ternary {
                condition,
                then_value,
                else_value,
            } => {
                let text = format!(
                    "({} if {} else {})",
                    self.at(then_value, OR),
                    self.at(condition, OR),
                    self.at(else_value, TERNARY)
                );
                (text, ATOM)
            }
            ExprKind::Array(items) => (format!("[{}]", self.list(items)), ATOM),
            ExprKind::Object(props) => {
                let entries: Vec<String> = props
                    .iter()
                    .map(|(key, value)| format!("{}: {}", quote(key), self.render(value)))
                    .collect();
                (format!("{{{}}}", entries.join(", ")), ATOM)
            }
            ExprKind::Sequence(items) => match items.split_last() {
                Some((last, rest)) => {
                    for item in rest {
                        let line = self.statement(item);
                        self.pre.push(line);
                    }
                    self.expr(last)
                }
                None => ("None".to_string(), ATOM),
            },
            ExprKind::Function(decl) => {
                self.notes.push(format!("function literal {}", decl.name.name));
                ("None".to_string(), ATOM)
            }
            ExprKind::Unknown(construct) => {
                self.notes.push(construct.clone());
                ("None".to_string(), ATOM)
            }
        }
    }

    fn binary(&mut self, left: &Expr, op: &str, right: &Expr, prec: u8) -> String {
        format!("{} {op} {}", self.at(left, prec), self.at(right, prec + 1))
    }

    fn unary(&mut self, op: UnaryOp, operand: &Expr) -> (String, u8) {
        match op {
            UnaryOp::Not => (format!("not {}", self.at(operand, NOT)), NOT),
            UnaryOp::Neg => (format!("-{}", self.at(operand, UNARY)), UNARY),
            UnaryOp::Plus => (format!("+{}", self.at(operand, UNARY)), UNARY),
            UnaryOp::BitNot => (format!("~{}", self.at(operand, UNARY)), UNARY),
            UnaryOp::Typeof => {
                let runtime = self.runtime;
                (format!("{runtime}.typeof({})", self.render(operand)), ATOM)
            }
            UnaryOp::Void => {
                if operand.needs_hoisting() || matches!(operand.kind, ExprKind::FunctionCall { .. }) {
                    let line = self.statement(operand);
                    self.pre.push(line);
                }
                ("None".to_string(), ATOM)
            }
            UnaryOp::Delete => {
                let line = format!("del {}", self.render(operand));
                self.pre.push(line);
                ("True".to_string(), ATOM)
            }
        }
    }

    fn assignment(&mut self, target: &Expr, op: AssignOp, value: &Expr) -> String {
        if let Some(list) = length_of(target) {
            // Python lists only shrink through slicing
            let list = self.at(list, ATOM);
            let value = match op {
                AssignOp::Assign => self.render(value),
                AssignOp::Compound(math) => format!(
                    "len({list}) {} {}",
                    python_math(math),
                    self.at(value, math_precedence(math) + 1)
                ),
            };
            return format!("del {list}[{value}:]");
        }
        let value = self.render(value);
        let target = self.render(target);
        match op {
            AssignOp::Assign => format!("{target} = {value}"),
            AssignOp::Compound(math) => format!("{target} {}= {value}", python_math(math)),
        }
    }

    fn update(&mut self, op: UpdateOp, target: &Expr) -> String {
        if let Some(list) = length_of(target) {
            let list = self.at(list, ATOM);
            return match op {
                UpdateOp::Increment => format!("{list}.append(None)"),
                UpdateOp::Decrement => format!("del {list}[-1:]"),
            };
        }
        let target = self.render(target);
        match op {
            UpdateOp::Increment => format!("{target} += 1"),
            UpdateOp::Decrement => format!("{target} -= 1"),
        }
    }

    fn new_object(&mut self, callee: &Expr, args: &[Expr]) -> String {
        match &callee.kind {
            ExprKind::Identifier(name) if name == "Array" => {
                let runtime = self.runtime;
                format!("{runtime}.Array({})", self.list(args))
            }
            ExprKind::Identifier(name) if name == "Object" && args.is_empty() => "{}".to_string(),
            _ => format!("{}({})", self.at(callee, ATOM), self.list(args)),
        }
    }

    fn list(&mut self, items: &[Expr]) -> String {
        let parts: Vec<String> = items.iter().map(|item| self.render(item)).collect();
        parts.join(", ")
    }

    fn constant(&self, constant: &Constant) -> String {
        match constant {
            Constant::Int(text) => int_literal(text),
            Constant::Float(text) => float_literal(text),
            Constant::Str { raw, .. } => python_string(raw),
            Constant::Bool(true) => map_identifier("true"),
            Constant::Bool(false) => map_identifier("false"),
            Constant::Null | Constant::Undefined => map_identifier("null"),
            Constant::Regex { body, flags } => {
                format!("{}.RegExp({}, {})", self.runtime, quote(body), quote(flags))
            }
        }
    }
}

/// The list of an `x.length` target
fn length_of(target: &Expr) -> Option<&Expr> {
    match &target.kind {
        ExprKind::Member { object, property } if property.name == "length" => Some(object),
        _ => None,
    }
}

/// A `+` chain with a string literal among its left-spine operands
fn is_concatenation(expr: &Expr) -> bool {
    let mut operands = Vec::new();
    concat_operands(expr, &mut operands);
    operands.iter().any(|e| e.is_string())
}

fn concat_operands<'e>(expr: &'e Expr, out: &mut Vec<&'e Expr>) {
    match &expr.kind {
        ExprKind::OpMath {
            left,
            op: MathOp::Add,
            right,
        } => {
            concat_operands(left, out);
            out.push(right);
        }
        _ => out.push(expr),
    }
}

const fn math_precedence(op: MathOp) -> u8 {
    match op {
        MathOp::Add | MathOp::Sub => ADDITIVE,
        MathOp::Mul | MathOp::Div | MathOp::Mod => MULTIPLICATIVE,
        MathOp::BitAnd => BIT_AND,
        MathOp::BitOr => BIT_OR,
        MathOp::BitXor => BIT_XOR,
        MathOp::Shl | MathOp::Shr | MathOp::UShr => SHIFT,
    }
}

const fn python_math(op: MathOp) -> &'static str {
    match op {
        MathOp::UShr => ">>",
        other => other.as_str(),
    }
}

const fn python_compare(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq | CompareOp::StrictEq => "==",
        CompareOp::Ne | CompareOp::StrictNe => "!=",
        other => other.as_str(),
    }
}

fn int_literal(text: &str) -> String {
    if text.starts_with("0x") || text.starts_with("0X") {
        return text.to_string();
    }
    let digits = text.trim_start_matches('0');
    if digits.is_empty() {
        "0".to_string()
    } else if digits.len() < text.len() && digits.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
        // legacy octal, as QS reads it
        format!("0o{digits}")
    } else {
        digits.to_string()
    }
}

/// Python spelling of a QS float, digits untouched
fn float_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    if text.starts_with('.') {
        out.push('0');
    }
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if c == '.' && !chars.peek().is_some_and(char::is_ascii_digit) {
            out.push('0');
        }
    }
    out
}

/// Double-quoted Python string with the same value as a QS string body
fn python_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(
                    e @ ('\\' | '"' | 'b' | 'f' | 'n' | 'r' | 't' | 'v' | 'x' | 'u' | '0'..='7'
                    | '\n' | '\r'),
                ) => {
                    out.push('\\');
                    out.push(e);
                }
                // other escapes are the character itself in QS
                Some(other) => out.push(other),
                None => out.push_str("\\\\"),
            },
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Double-quoted Python string of literal text
fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}
