//! Class rewrites
//!
//! A method named after its class is the constructor. Calling the
//! superclass by name from a method invokes the parent constructor.

use crate::ast::{ClassDecl, Expr, Ident, Span, Stmt, StmtKind};
use crate::names::map_identifier;

use super::{mapped, LexicalContext, Polisher};

const CONSTRUCTOR: &str = "__init__";

impl Polisher<'_> {
    pub(super) fn class(&mut self, decl: ClassDecl, ctx: &LexicalContext, span: Span) -> Stmt {
        let scope = ctx.enter_class(
            &decl.name.name,
            decl.extends.as_ref().map(|base| base.name.as_str()),
        );
        let class_name = map_identifier(&decl.name.name);

        let mut members = Vec::with_capacity(decl.members.len());
        for member in decl.members {
            let member_span = member.span;
            match member.kind {
                StmtKind::Function(func) => {
                    let mut method = self.function(func, &scope, true);
                    if method.name.name == class_name {
                        method.name.name = CONSTRUCTOR.to_string();
                    }
                    if !method.is_static {
                        method.params.insert(0, Ident::synthetic("self"));
                    }
                    members.push(Stmt::new(StmtKind::Function(method), member_span));
                }
                kind => members.extend(self.stmt(Stmt::new(kind, member_span), &scope)),
            }
        }

        Stmt::new(
            StmtKind::Class(ClassDecl {
                name: Ident::new(class_name, decl.name.span),
                extends: decl.extends.map(mapped),
                members,
            }),
            span,
        )
    }
}

/// Callee replacing `Base(...)` inside a method of a class extending `Base`
pub(super) fn super_constructor(name: &str, ctx: &LexicalContext) -> Option<Expr> {
    if !ctx.in_method || ctx.superclass.as_deref() != Some(name) {
        return None;
    }
    Some(Expr::member(Expr::call(Expr::ident("super"), vec![]), CONSTRUCTOR))
}

#[cfg(test)]
mod tests {
    use crate::polish::polished_xml;

    const SCRIPT: &str = "class interna { var ctx; function interna(context) { this.ctx = context; } }\n\
        class oficial extends interna { function oficial(context) { interna(context); } \
        function valor() { return this.ctx; } static function crear() { return 1; } }";

    #[test]
    fn constructor_is_renamed() {
        let xml = polished_xml(SCRIPT);
        assert_eq!(xml.matches("<Function name=\"__init__\">").count(), 2);
        assert!(!xml.contains("<Function name=\"interna\">"));
    }

    #[test]
    fn superclass_call_becomes_super_init() {
        let xml = polished_xml(SCRIPT);
        let flat = xml.split_whitespace().collect::<Vec<_>>().join(" ");
        assert!(flat.contains(
            "<Member name=\"__init__\"> <FunctionCall> <Identifier name=\"super\"/>"
        ));
        assert!(!xml.contains("<Identifier name=\"interna\"/>"));
    }

    #[test]
    fn methods_receive_self() {
        let xml = polished_xml(SCRIPT);
        // two constructors and `valor`; the static method has none
        assert_eq!(xml.matches("<Variable name=\"self\"/>").count(), 3);
        assert!(xml.contains("<Function name=\"crear\" static=\"true\">"));
    }

    #[test]
    fn class_members_keep_declarations() {
        let xml = polished_xml(SCRIPT);
        assert!(xml.contains("<DeclarationBlock mode=\"var\">"));
        assert!(xml.contains("<Class name=\"oficial\" extends=\"interna\">"));
    }

    #[test]
    fn superclass_name_outside_methods_is_a_plain_call() {
        let xml = polished_xml("class a {} class b extends a {} a();");
        assert!(xml.contains("<Identifier name=\"a\"/>"));
    }
}
