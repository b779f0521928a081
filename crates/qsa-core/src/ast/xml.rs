//! XML-shaped view of the AST
//!
//! Each node becomes an element named after its kind with string
//! attributes and ordered children. Used for `dump_ast` output and in tests
//! to compare tree shapes.

use sxd_document::dom::{Document, Element};
use sxd_document::writer::Writer;
use sxd_document::Package;

use super::{
    AssignOp, Block, Constant, DeclMode, Expr, ExprKind, ForInBinding, FunctionDecl,
    InstructionFlow, Source, Stmt, StmtKind,
};

const INDENT: &str = "  ";

/// A tagged node with attributes and ordered children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNode {
    pub kind: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.push((name.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = XmlNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Value of an attribute
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Indented XML document text
    #[must_use]
    pub fn to_xml_string(&self) -> String {
        let package = Package::new();
        let doc = package.as_document();
        doc.root().append_child(self.element(doc, 0));

        let mut out = Vec::new();
        // writing into a Vec cannot fail
        let _ = Writer::new()
            .set_single_quotes(false)
            .format_document(&doc, &mut out);
        out.push(b'\n');
        String::from_utf8_lossy(&out).into_owned()
    }

    fn element<'d>(&self, doc: Document<'d>, depth: usize) -> Element<'d> {
        let element = doc.create_element(self.kind.as_str());
        for (key, value) in &self.attrs {
            element.set_attribute_value(key.as_str(), value);
        }
        if self.children.is_empty() {
            return element;
        }
        let inner = format!("\n{}", INDENT.repeat(depth + 1));
        for child in &self.children {
            element.append_child(doc.create_text(&inner));
            element.append_child(child.element(doc, depth + 1));
        }
        element.append_child(doc.create_text(&format!("\n{}", INDENT.repeat(depth))));
        element
    }
}

/// Convert a translation unit to its XML view
#[must_use]
pub fn to_xml(source: &Source) -> XmlNode {
    XmlNode::new("Source").children(source.body.iter().map(stmt_xml))
}

fn block_xml(kind: &str, block: &Block) -> XmlNode {
    XmlNode::new(kind).children(block.stmts.iter().map(stmt_xml))
}

fn function_xml(func: &FunctionDecl) -> XmlNode {
    let mut node = XmlNode::new("Function").attr("name", &func.name.name);
    if func.is_static {
        node = node.attr("static", "true");
    }
    node.child(
        XmlNode::new("Arguments").children(
            func.params
                .iter()
                .map(|p| XmlNode::new("Variable").attr("name", &p.name)),
        ),
    )
    .child(block_xml("Source", &func.body))
}

fn stmt_xml(stmt: &Stmt) -> XmlNode {
    match &stmt.kind {
        StmtKind::Class(class) => {
            let mut node = XmlNode::new("Class").attr("name", &class.name.name);
            if let Some(base) = &class.extends {
                node = node.attr("extends", &base.name);
            }
            node.children(class.members.iter().map(stmt_xml))
        }
        StmtKind::Function(func) => function_xml(func),
        StmtKind::Variable(decl) => {
            let mode = match decl.mode {
                DeclMode::Var => "var",
                DeclMode::Const => "const",
            };
            XmlNode::new("DeclarationBlock")
                .attr("mode", mode)
                .children(decl.vars.iter().map(|var| {
                    XmlNode::new("Variable")
                        .attr("name", &var.name.name)
                        .children(var.init.iter().map(expr_xml))
                }))
        }
        StmtKind::Expression(expr) => XmlNode::new("Expression").child(expr_xml(expr)),
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            let node = XmlNode::new("If")
                .child(XmlNode::new("Condition").child(expr_xml(condition)))
                .child(block_xml("Source", then_branch));
            match else_branch {
                Some(block) => node.child(block_xml("Else", block)),
                None => node,
            }
        }
        StmtKind::While { condition, body } => XmlNode::new("While")
            .child(XmlNode::new("Condition").child(expr_xml(condition)))
            .child(block_xml("Source", body)),
        StmtKind::DoWhile { body, condition } => XmlNode::new("DoWhile")
            .child(block_xml("Source", body))
            .child(XmlNode::new("Condition").child(expr_xml(condition))),
        StmtKind::For {
            init,
            condition,
            update,
            body,
        } => XmlNode::new("For")
            .child(XmlNode::new("ForInitialize").children(init.iter().map(|s| stmt_xml(s))))
            .child(XmlNode::new("ForCompare").children(condition.iter().map(expr_xml)))
            .child(XmlNode::new("ForIncrement").children(update.iter().map(expr_xml)))
            .child(block_xml("Source", body)),
        StmtKind::ForIn {
            binding,
            object,
            body,
        } => {
            let target = match binding {
                ForInBinding::Declare(name) => XmlNode::new("Variable").attr("name", &name.name),
                ForInBinding::Target(expr) => expr_xml(expr),
            };
            XmlNode::new("ForIn")
                .child(target)
                .child(expr_xml(object))
                .child(block_xml("Source", body))
        }
        StmtKind::Switch { subject, cases } => XmlNode::new("Switch")
            .child(XmlNode::new("Value").child(expr_xml(subject)))
            .children(cases.iter().map(|case| match &case.test {
                Some(test) => XmlNode::new("Case")
                    .child(XmlNode::new("Value").child(expr_xml(test)))
                    .child(XmlNode::new("Source").children(case.body.iter().map(stmt_xml))),
                None => XmlNode::new("CaseDefault")
                    .child(XmlNode::new("Source").children(case.body.iter().map(stmt_xml))),
            })),
        StmtKind::TryCatch {
            body,
            catch,
            finally,
        } => {
            let mut node = XmlNode::new("TryCatch").child(block_xml("Source", body));
            if let Some(catch) = catch {
                let mut clause = block_xml("Catch", &catch.body);
                if let Some(binding) = &catch.binding {
                    clause = clause.attr("name", &binding.name);
                }
                node = node.child(clause);
            }
            if let Some(finally) = finally {
                node = node.child(block_xml("Finally", finally));
            }
            node
        }
        StmtKind::With { object, body } => XmlNode::new("With")
            .child(expr_xml(object))
            .child(block_xml("Source", body)),
        StmtKind::Flow(flow) => {
            let (name, value) = match flow {
                InstructionFlow::Return(value) => ("return", value.as_ref()),
                InstructionFlow::Break => ("break", None),
                InstructionFlow::Continue => ("continue", None),
                InstructionFlow::Throw(value) => ("throw", Some(value)),
            };
            XmlNode::new("InstructionFlow")
                .attr("type", name)
                .children(value.map(expr_xml))
        }
        StmtKind::Block(block) => block_xml("Source", block),
        StmtKind::Unknown { construct, body } => XmlNode::new("Unknown")
            .attr("construct", construct)
            .children(body.iter().map(stmt_xml)),
    }
}

fn expr_xml(expr: &Expr) -> XmlNode {
    match &expr.kind {
        ExprKind::Constant(constant) => constant_xml(constant),
        ExprKind::Identifier(name) => XmlNode::new("Identifier").attr("name", name),
        ExprKind::This => XmlNode::new("Identifier").attr("name", "this"),
        ExprKind::FunctionCall { callee, args } => XmlNode::new("FunctionCall")
            .child(expr_xml(callee))
            .child(XmlNode::new("CallArguments").children(args.iter().map(expr_xml))),
        ExprKind::New { callee, args } => XmlNode::new("New")
            .child(expr_xml(callee))
            .child(XmlNode::new("CallArguments").children(args.iter().map(expr_xml))),
        ExprKind::Member { object, property } => XmlNode::new("Member")
            .attr("name", &property.name)
            .child(expr_xml(object)),
        ExprKind::ArrayMember { object, index } => XmlNode::new("ArrayMember")
            .child(expr_xml(object))
            .child(expr_xml(index)),
        ExprKind::OpMath { left, op, right } => binary_xml("OpMath", op.as_str(), left, right),
        ExprKind::Compare { left, op, right } => binary_xml("Compare", op.as_str(), left, right),
        ExprKind::Logical { left, op, right } => binary_xml("Logical", op.as_str(), left, right),
        ExprKind::Unary { op, operand } => XmlNode::new("Unary")
            .attr("type", op.as_str())
            .child(expr_xml(operand)),
        ExprKind::OpUpdate { op, prefix, target } => XmlNode::new("OpUpdate")
            .attr("type", format!("{op:?}").to_lowercase())
            .attr("mode", if *prefix { "prefix" } else { "postfix" })
            .child(expr_xml(target)),
        ExprKind::Assign { target, op, value } => {
            let op = match op {
                AssignOp::Assign => "=".to_string(),
                AssignOp::Compound(math) => format!("{}=", math.as_str()),
            };
            XmlNode::new("Assign")
                .attr("type", op)
                .child(expr_xml(target))
                .child(expr_xml(value))
        }
        ExprKind::Ternary {
            condition,
            then_value,
            else_value,
        } => XmlNode::new("Ternary")
            .child(expr_xml(condition))
            .child(expr_xml(then_value))
            .child(expr_xml(else_value)),
        ExprKind::Array(items) => XmlNode::new("Array").children(items.iter().map(expr_xml)),
        ExprKind::Object(props) => {
            XmlNode::new("Object").children(props.iter().map(|(key, value)| {
                XmlNode::new("Property")
                    .attr("name", key)
                    .child(expr_xml(value))
            }))
        }
        ExprKind::Function(func) => function_xml(func),
        ExprKind::Sequence(items) => {
            XmlNode::new("Sequence").children(items.iter().map(expr_xml))
        }
        ExprKind::Unknown(construct) => XmlNode::new("Unknown").attr("construct", construct),
    }
}

fn binary_xml(kind: &str, op: &str, left: &Expr, right: &Expr) -> XmlNode {
    XmlNode::new(kind)
        .attr("type", op)
        .child(expr_xml(left))
        .child(expr_xml(right))
}

fn constant_xml(constant: &Constant) -> XmlNode {
    let node = XmlNode::new("Constant");
    match constant {
        Constant::Int(text) | Constant::Float(text) => node.attr("type", "Number").attr("value", text),
        Constant::Str { raw, .. } => node.attr("type", "String").attr("value", raw),
        Constant::Bool(value) => node.attr("type", "Boolean").attr("value", value.to_string()),
        Constant::Null => node.attr("type", "null"),
        Constant::Undefined => node.attr("type", "undefined"),
        Constant::Regex { body, flags } => node
            .attr("type", "Regex")
            .attr("value", body)
            .attr("flags", flags),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build_source;
    use crate::parser::Parser;

    fn xml(source: &str) -> XmlNode {
        let tree = Parser::parse_source(source).unwrap();
        to_xml(&build_source(&tree))
    }

    #[test]
    fn node_kinds_and_attributes() {
        let root = xml("var x = a.b(1);");
        let decl = &root.children[0];
        assert_eq!(decl.kind, "DeclarationBlock");
        assert_eq!(decl.get("mode"), Some("var"));
        let call = &decl.children[0].children[0];
        assert_eq!(call.kind, "FunctionCall");
        assert_eq!(call.children[0].kind, "Member");
        assert_eq!(call.children[0].get("name"), Some("b"));
    }

    #[test]
    fn rendering_escapes_attributes() {
        let root = xml("s = \"<a & b>\";");
        let text = root.to_xml_string();
        assert!(text.contains("value=\"&lt;a &amp; b"));
        assert!(text.starts_with("<?xml"));
        assert!(text.contains("<Source>\n  <Expression>\n"));
        assert!(text.ends_with("\n</Source>\n"));
    }

    #[test]
    fn empty_elements_self_close() {
        assert!(XmlNode::new("Source").to_xml_string().ends_with("<Source/>\n"));
    }
}
