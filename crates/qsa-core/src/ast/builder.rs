//! Concrete syntax tree to typed AST
//!
//! The mapping is structural: each [`SyntaxKind`] yields one node kind.
//! Shapes with no mapping become `Unknown` nodes instead of failing, so a
//! parsed script always produces an AST.

use crate::lexer::{Token, TokenKind};
use crate::parser::{SyntaxKind, SyntaxNode};

use super::{
    AssignOp, Block, CatchClause, ClassDecl, CompareOp, Constant, DeclMode, DeclarationBlock,
    Expr, ExprKind, ForInBinding, FunctionDecl, Ident, InstructionFlow, LogicalOp, MathOp,
    Source, Stmt, StmtKind, SwitchCase, UnaryOp, UpdateOp, Variable,
};

/// Build the AST of a parsed script
#[must_use]
pub fn build_source(tree: &SyntaxNode) -> Source {
    let body = tree.nodes().filter_map(build_stmt).collect();
    Source::new(body, tree.span)
}

fn ident(token: &Token) -> Ident {
    Ident::new(token.lexeme.clone(), token.span)
}

fn unknown_stmt(node: &SyntaxNode, body: Vec<Stmt>) -> Stmt {
    tracing::debug!("no AST mapping for {:?} at {}", node.kind, node.span);
    Stmt::new(
        StmtKind::Unknown {
            construct: format!("{:?}", node.kind),
            body,
        },
        node.span,
    )
}

fn unknown_expr(node: &SyntaxNode) -> Expr {
    tracing::debug!("no AST mapping for {:?} at {}", node.kind, node.span);
    Expr::new(ExprKind::Unknown(format!("{:?}", node.kind)), node.span)
}

// ==================== Statements ====================

fn build_stmt(node: &SyntaxNode) -> Option<Stmt> {
    let kind = match node.kind {
        SyntaxKind::EmptyStmt => return None,
        SyntaxKind::Block => StmtKind::Block(build_block(node)),
        SyntaxKind::VarStmt => StmtKind::Variable(build_declaration(node)),
        SyntaxKind::FunctionDecl => StmtKind::Function(build_function(node)),
        SyntaxKind::ClassDecl => StmtKind::Class(build_class(node)),
        SyntaxKind::ExprStmt => StmtKind::Expression(nth_expr(node, 0)),
        SyntaxKind::IfStmt => StmtKind::If {
            condition: nth_expr(node, 0),
            then_branch: node.nth_node(1).map(build_body).unwrap_or_default(),
            else_branch: node
                .child(SyntaxKind::ElseClause)
                .and_then(|clause| clause.nth_node(0))
                .map(build_body),
        },
        SyntaxKind::WhileStmt => StmtKind::While {
            condition: nth_expr(node, 0),
            body: node.nth_node(1).map(build_body).unwrap_or_default(),
        },
        SyntaxKind::DoWhileStmt => StmtKind::DoWhile {
            body: node.nth_node(0).map(build_body).unwrap_or_default(),
            condition: nth_expr(node, 1),
        },
        SyntaxKind::ForStmt => build_for(node),
        SyntaxKind::ForInStmt => build_for_in(node),
        SyntaxKind::SwitchStmt => StmtKind::Switch {
            subject: nth_expr(node, 0),
            cases: node.nodes().skip(1).filter_map(build_case).collect(),
        },
        SyntaxKind::TryStmt => StmtKind::TryCatch {
            body: node.child(SyntaxKind::Block).map(build_block).unwrap_or_default(),
            catch: node.child(SyntaxKind::CatchClause).map(|clause| CatchClause {
                binding: clause.ident().map(ident),
                body: clause
                    .child(SyntaxKind::Block)
                    .map(build_block)
                    .unwrap_or_default(),
            }),
            finally: node
                .child(SyntaxKind::FinallyClause)
                .and_then(|clause| clause.child(SyntaxKind::Block))
                .map(build_block),
        },
        SyntaxKind::WithStmt => StmtKind::With {
            object: nth_expr(node, 0),
            body: node.nth_node(1).map(build_body).unwrap_or_default(),
        },
        SyntaxKind::ReturnStmt => {
            StmtKind::Flow(InstructionFlow::Return(node.expressions().next().map(build_expr)))
        }
        SyntaxKind::BreakStmt | SyntaxKind::ContinueStmt => {
            if let Some(label) = node.ident() {
                tracing::debug!("dropping jump label '{}' at {}", label.lexeme, label.span);
            }
            if node.kind == SyntaxKind::BreakStmt {
                StmtKind::Flow(InstructionFlow::Break)
            } else {
                StmtKind::Flow(InstructionFlow::Continue)
            }
        }
        SyntaxKind::ThrowStmt => StmtKind::Flow(InstructionFlow::Throw(nth_expr(node, 0))),
        _ => {
            let body = node.nodes().filter_map(build_stmt).collect();
            return Some(unknown_stmt(node, body));
        }
    };
    Some(Stmt::new(kind, node.span))
}

fn build_block(node: &SyntaxNode) -> Block {
    Block::new(node.nodes().filter_map(build_stmt).collect(), node.span)
}

/// Body of a compound statement; a single statement becomes a one-element block
fn build_body(node: &SyntaxNode) -> Block {
    if node.kind == SyntaxKind::Block {
        build_block(node)
    } else {
        Block::new(build_stmt(node).into_iter().collect(), node.span)
    }
}

fn build_declaration(node: &SyntaxNode) -> DeclarationBlock {
    let mode = if node.has_token(TokenKind::Const) {
        DeclMode::Const
    } else {
        DeclMode::Var
    };
    let vars = node
        .nodes()
        .filter(|n| n.kind == SyntaxKind::VarDeclarator)
        .filter_map(|declarator| {
            Some(Variable {
                name: ident(declarator.ident()?),
                init: declarator.expressions().next().map(build_expr),
            })
        })
        .collect();
    DeclarationBlock {
        mode,
        vars,
        is_static: node.has_token(TokenKind::Static),
    }
}

fn build_function(node: &SyntaxNode) -> FunctionDecl {
    let name = node
        .ident()
        .map_or_else(|| Ident::new("anon", node.span), ident);
    let params = node
        .child(SyntaxKind::ParamList)
        .map(|list| {
            list.nodes()
                .filter_map(|param| param.ident().map(ident))
                .collect()
        })
        .unwrap_or_default();
    FunctionDecl {
        name,
        params,
        body: node.child(SyntaxKind::Block).map(build_block).unwrap_or_default(),
        is_static: node.has_token(TokenKind::Static),
    }
}

fn build_class(node: &SyntaxNode) -> ClassDecl {
    let mut names = node
        .tokens()
        .filter(|t| matches!(t.kind, TokenKind::Ident | TokenKind::UnicodeIdent));
    let name = names
        .next()
        .map_or_else(|| Ident::new("", node.span), ident);
    let extends = if node.has_token(TokenKind::Extends) {
        names.next().map(ident)
    } else {
        None
    };
    ClassDecl {
        name,
        extends,
        members: node
            .child(SyntaxKind::Block)
            .map(|body| body.nodes().filter_map(build_stmt).collect())
            .unwrap_or_default(),
    }
}

fn build_for(node: &SyntaxNode) -> StmtKind {
    let init = node
        .child(SyntaxKind::ForInit)
        .and_then(|init| init.nth_node(0))
        .map(|inner| {
            let kind = if inner.kind == SyntaxKind::VarStmt {
                StmtKind::Variable(build_declaration(inner))
            } else {
                StmtKind::Expression(build_expr(inner))
            };
            Stmt::new(kind, inner.span)
        })
        .map(Box::new);
    let clause_expr = |kind| {
        node.child(kind)
            .and_then(|clause| clause.nth_node(0))
            .map(build_expr)
    };
    StmtKind::For {
        init,
        condition: clause_expr(SyntaxKind::ForCond),
        update: clause_expr(SyntaxKind::ForUpdate),
        body: node.nodes().last().map(build_body).unwrap_or_default(),
    }
}

fn build_for_in(node: &SyntaxNode) -> StmtKind {
    let mut nodes = node.nodes();
    let binding = match nodes.next() {
        Some(target) if target.kind == SyntaxKind::VarStmt => target
            .nth_node(0)
            .and_then(SyntaxNode::ident)
            .map_or_else(|| ForInBinding::Target(unknown_expr(target)), |t| {
                ForInBinding::Declare(ident(t))
            }),
        Some(target) => ForInBinding::Target(build_expr(target)),
        None => ForInBinding::Target(unknown_expr(node)),
    };
    let object = nodes.next().map_or_else(|| unknown_expr(node), build_expr);
    let body = nodes.next().map(build_body).unwrap_or_default();
    StmtKind::ForIn {
        binding,
        object,
        body,
    }
}

fn build_case(node: &SyntaxNode) -> Option<SwitchCase> {
    match node.kind {
        SyntaxKind::CaseClause => Some(SwitchCase {
            test: node.nth_node(0).map(build_expr),
            body: node.nodes().skip(1).filter_map(build_stmt).collect(),
        }),
        SyntaxKind::DefaultClause => Some(SwitchCase {
            test: None,
            body: node.nodes().filter_map(build_stmt).collect(),
        }),
        _ => None,
    }
}

// ==================== Expressions ====================

fn nth_expr(node: &SyntaxNode, index: usize) -> Expr {
    node.nth_node(index)
        .map_or_else(|| unknown_expr(node), build_expr)
}

fn build_expr(node: &SyntaxNode) -> Expr {
    let kind = match node.kind {
        SyntaxKind::Literal => match node.first_token() {
            Some(token) => ExprKind::Constant(build_constant(token)),
            None => return unknown_expr(node),
        },
        SyntaxKind::RegexLiteral => match node.first_token() {
            Some(token) => ExprKind::Constant(build_regex(&token.lexeme)),
            None => return unknown_expr(node),
        },
        SyntaxKind::NameRef => match node.first_token() {
            Some(token) => ExprKind::Identifier(token.lexeme.clone()),
            None => return unknown_expr(node),
        },
        SyntaxKind::ThisExpr => ExprKind::This,
        SyntaxKind::ParenExpr => nth_expr(node, 0).kind,
        SyntaxKind::ArrayLiteral => ExprKind::Array(node.expressions().map(build_expr).collect()),
        SyntaxKind::ObjectLiteral => ExprKind::Object(
            node.nodes()
                .filter(|n| n.kind == SyntaxKind::PropertyAssign)
                .filter_map(|prop| {
                    let key = prop.first_token()?;
                    Some((property_key(key), nth_expr(prop, 0)))
                })
                .collect(),
        ),
        SyntaxKind::FunctionExpr => ExprKind::Function(Box::new(build_function(node))),
        SyntaxKind::MemberExpr => match node.tokens().last() {
            Some(name) => ExprKind::Member {
                object: Box::new(nth_expr(node, 0)),
                property: ident(name),
            },
            None => return unknown_expr(node),
        },
        SyntaxKind::IndexExpr => ExprKind::ArrayMember {
            object: Box::new(nth_expr(node, 0)),
            index: Box::new(nth_expr(node, 1)),
        },
        SyntaxKind::CallExpr => ExprKind::FunctionCall {
            callee: Box::new(nth_expr(node, 0)),
            args: build_args(node),
        },
        SyntaxKind::NewExpr => ExprKind::New {
            callee: Box::new(
                node.expressions()
                    .next()
                    .map_or_else(|| unknown_expr(node), build_expr),
            ),
            args: build_args(node),
        },
        SyntaxKind::PostfixExpr => match node.tokens().next() {
            Some(op) => ExprKind::OpUpdate {
                op: update_op(op.kind),
                prefix: false,
                target: Box::new(nth_expr(node, 0)),
            },
            None => return unknown_expr(node),
        },
        SyntaxKind::PrefixExpr => match node.tokens().next() {
            Some(op) => build_prefix(op.kind, nth_expr(node, 0)),
            None => return unknown_expr(node),
        },
        SyntaxKind::BinaryExpr => match node.tokens().next() {
            Some(op) => build_binary(op.kind, nth_expr(node, 0), nth_expr(node, 1)),
            None => return unknown_expr(node),
        },
        SyntaxKind::AssignExpr => match node.tokens().next() {
            Some(op) => ExprKind::Assign {
                target: Box::new(nth_expr(node, 0)),
                op: assign_op(op.kind),
                value: Box::new(nth_expr(node, 1)),
            },
            None => return unknown_expr(node),
        },
        SyntaxKind::ConditionalExpr => ExprKind::Ternary {
            condition: Box::new(nth_expr(node, 0)),
            then_value: Box::new(nth_expr(node, 1)),
            else_value: Box::new(nth_expr(node, 2)),
        },
        SyntaxKind::SequenceExpr => ExprKind::Sequence(node.expressions().map(build_expr).collect()),
        _ => return unknown_expr(node),
    };
    Expr::new(kind, node.span)
}

fn build_args(node: &SyntaxNode) -> Vec<Expr> {
    node.child(SyntaxKind::ArgList)
        .map(|args| args.expressions().map(build_expr).collect())
        .unwrap_or_default()
}

fn build_constant(token: &Token) -> Constant {
    match token.kind {
        TokenKind::Float => Constant::Float(token.lexeme.clone()),
        TokenKind::DoubleString | TokenKind::SingleString => Constant::Str {
            raw: strip_quotes(&token.lexeme).to_string(),
            quote: if token.kind == TokenKind::DoubleString {
                '"'
            } else {
                '\''
            },
        },
        TokenKind::True => Constant::Bool(true),
        TokenKind::False => Constant::Bool(false),
        TokenKind::Null => Constant::Null,
        TokenKind::Undefined => Constant::Undefined,
        _ => Constant::Int(token.lexeme.clone()),
    }
}

fn strip_quotes(lexeme: &str) -> &str {
    lexeme
        .get(1..lexeme.len().saturating_sub(1))
        .unwrap_or_default()
}

fn property_key(token: &Token) -> String {
    match token.kind {
        TokenKind::DoubleString | TokenKind::SingleString => strip_quotes(&token.lexeme).to_string(),
        _ => token.lexeme.clone(),
    }
}

/// Split `/body/flags`
fn build_regex(lexeme: &str) -> Constant {
    let close = lexeme.rfind('/').unwrap_or(lexeme.len());
    Constant::Regex {
        body: lexeme.get(1..close).unwrap_or_default().to_string(),
        flags: lexeme.get(close + 1..).unwrap_or_default().to_string(),
    }
}

fn update_op(kind: TokenKind) -> UpdateOp {
    if kind == TokenKind::MinusMinus {
        UpdateOp::Decrement
    } else {
        UpdateOp::Increment
    }
}

fn build_prefix(kind: TokenKind, operand: Expr) -> ExprKind {
    let op = match kind {
        TokenKind::PlusPlus | TokenKind::MinusMinus => {
            return ExprKind::OpUpdate {
                op: update_op(kind),
                prefix: true,
                target: Box::new(operand),
            }
        }
        TokenKind::Minus => UnaryOp::Neg,
        TokenKind::Plus => UnaryOp::Plus,
        TokenKind::Tilde => UnaryOp::BitNot,
        TokenKind::Typeof => UnaryOp::Typeof,
        TokenKind::Void => UnaryOp::Void,
        TokenKind::Delete => UnaryOp::Delete,
        _ => UnaryOp::Not,
    };
    ExprKind::Unary {
        op,
        operand: Box::new(operand),
    }
}

fn math_op(kind: TokenKind) -> Option<MathOp> {
    Some(match kind {
        TokenKind::Plus | TokenKind::PlusEq => MathOp::Add,
        TokenKind::Minus | TokenKind::MinusEq => MathOp::Sub,
        TokenKind::Star | TokenKind::StarEq => MathOp::Mul,
        TokenKind::Slash | TokenKind::SlashEq => MathOp::Div,
        TokenKind::Percent | TokenKind::PercentEq => MathOp::Mod,
        TokenKind::Amp | TokenKind::AmpEq => MathOp::BitAnd,
        TokenKind::Pipe | TokenKind::PipeEq => MathOp::BitOr,
        TokenKind::Caret | TokenKind::CaretEq => MathOp::BitXor,
        TokenKind::Shl | TokenKind::ShlEq => MathOp::Shl,
        TokenKind::Shr | TokenKind::ShrEq => MathOp::Shr,
        TokenKind::UShr | TokenKind::UShrEq => MathOp::UShr,
        _ => return None,
    })
}

fn assign_op(kind: TokenKind) -> AssignOp {
    math_op(kind).map_or(AssignOp::Assign, AssignOp::Compound)
}

fn build_binary(kind: TokenKind, left: Expr, right: Expr) -> ExprKind {
    let (left, right) = (Box::new(left), Box::new(right));
    if let Some(op) = math_op(kind) {
        return ExprKind::OpMath { left, op, right };
    }
    let op = match kind {
        TokenKind::AndAnd => {
            return ExprKind::Logical {
                left,
                op: LogicalOp::And,
                right,
            }
        }
        TokenKind::OrOr => {
            return ExprKind::Logical {
                left,
                op: LogicalOp::Or,
                right,
            }
        }
        TokenKind::EqEq => CompareOp::Eq,
        TokenKind::NotEq => CompareOp::Ne,
        TokenKind::EqEqEq => CompareOp::StrictEq,
        TokenKind::NotEqEq => CompareOp::StrictNe,
        TokenKind::Lt => CompareOp::Lt,
        TokenKind::LtEq => CompareOp::Le,
        TokenKind::Gt => CompareOp::Gt,
        TokenKind::GtEq => CompareOp::Ge,
        TokenKind::Instanceof => CompareOp::Instanceof,
        _ => CompareOp::In,
    };
    ExprKind::Compare { left, op, right }
}
