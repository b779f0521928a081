//! Parser for QS scripts
//!
//! A recursive-descent parser with precedence climbing for binary operators.
//! It produces a concrete syntax tree ([`SyntaxNode`]) where every grammar
//! production maps to one [`SyntaxKind`].
//!
//! # Example
//!
//! ```
//! use qsa_core::parser::{Parser, SyntaxKind};
//!
//! let tree = Parser::parse_source("function main() { var x = 1 }").unwrap();
//! assert_eq!(tree.kind, SyntaxKind::Source);
//! ```

mod error;
mod syntax;

pub use error::{ExpectedToken, ParseError, ParseErrorKind};
pub use syntax::{SyntaxElement, SyntaxKind, SyntaxNode};

use crate::lexer::{Lexer, Span, SpannedError, Token, TokenKind};

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// The QS parser
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    errors: Vec<ParseError>,
    lex_errors: Vec<SpannedError>,
    /// Returned when reading past the end of the token stream
    eof: Token,
    /// Set while parsing a `for` header, where `in` is not a binary operator
    no_in: bool,
}

impl Parser {
    #[must_use]
    pub fn new(source: &str) -> Self {
        let (tokens, lex_errors) = Lexer::tokenize(source);
        let end = source.len() as u32;
        let mut parser = Self {
            tokens,
            position: 0,
            errors: Vec::new(),
            lex_errors,
            eof: Token::new(TokenKind::Eof, Span::new(end, end), ""),
            no_in: false,
        };
        parser.skip_trivia();
        parser
    }

    /// Parse a complete script
    pub fn parse_source(source: &str) -> Result<SyntaxNode, Vec<ParseError>> {
        let mut parser = Parser::new(source);
        let tree = parser.source();
        let errors = parser.all_errors();
        if errors.is_empty() {
            Ok(tree)
        } else {
            Err(errors)
        }
    }

    /// Parse a single expression
    pub fn parse_expression(source: &str) -> Result<SyntaxNode, Vec<ParseError>> {
        let mut parser = Parser::new(source);
        let result = parser.expression();
        if !parser.is_eof() {
            parser.error(parser.unexpected(ExpectedToken::Token(TokenKind::Eof)));
        }
        match result {
            Ok(expr) if parser.errors.is_empty() && parser.lex_errors.is_empty() => Ok(expr),
            Ok(_) => Err(parser.all_errors()),
            Err(e) => {
                parser.errors.push(e);
                Err(parser.all_errors())
            }
        }
    }

    /// All errors (lexical and syntactic), ordered by position
    #[must_use]
    pub fn all_errors(&self) -> Vec<ParseError> {
        let mut errors: Vec<ParseError> = self
            .lex_errors
            .iter()
            .map(|e| ParseError::new(ParseErrorKind::Lexical(e.error.to_string()), e.span))
            .collect();
        errors.extend(self.errors.iter().cloned());
        errors.sort_by_key(|e| e.span.start);
        errors
    }

    // ==================== Token Management ====================

    fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&self.eof)
    }

    fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    fn is_eof(&self) -> bool {
        self.current_kind() == TokenKind::Eof
    }

    /// Advance to the next significant token, returning the current one
    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.position < self.tokens.len() {
            self.position += 1;
        }
        self.skip_trivia();
        token
    }

    fn skip_trivia(&mut self) {
        while self.position < self.tokens.len() && self.current().kind.is_trivia() {
            self.position += 1;
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    fn check_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.iter().any(|k| self.check(*k))
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(ExpectedToken::Token(kind)))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<Token> {
        if self.check_any(&[TokenKind::Ident, TokenKind::UnicodeIdent]) {
            Ok(self.advance())
        } else {
            Err(ParseError::new(
                ParseErrorKind::ExpectedIdentifier(self.current_kind()),
                self.current().span,
            ))
        }
    }

    /// Declared names (`var`, parameters, `catch`) may reuse reserved words
    ///
    /// The token is retagged as an identifier so later passes see a name.
    fn binding_name(&mut self) -> ParseResult<Token> {
        let kind = self.current_kind();
        let literal = matches!(
            kind,
            TokenKind::This
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::Undefined
        );
        if !kind.is_keyword() || literal {
            return self.expect_ident();
        }
        let mut token = self.advance();
        token.kind = TokenKind::Ident;
        Ok(token)
    }

    /// Kind of the next significant token after the current one
    fn peek(&self) -> TokenKind {
        self.tokens[self.position.saturating_add(1).min(self.tokens.len())..]
            .iter()
            .find(|t| !t.kind.is_trivia())
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    /// True if a line break separates the current token from the previous one
    fn newline_before(&self) -> bool {
        self.tokens[..self.position.min(self.tokens.len())]
            .iter()
            .rev()
            .take_while(|t| t.kind.is_trivia())
            .any(|t| t.kind == TokenKind::Newline || t.lexeme.contains('\n'))
    }

    fn unexpected(&self, expected: ExpectedToken) -> ParseError {
        ParseError::new(
            ParseErrorKind::UnexpectedToken {
                found: self.current_kind(),
                expected,
            },
            self.current().span,
        )
    }

    fn error(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    /// Statement terminator with lenient semicolon insertion
    fn expect_semicolon(&mut self, children: &mut Vec<SyntaxElement>) -> ParseResult<()> {
        if let Some(semi) = self.eat(TokenKind::Semicolon) {
            children.push(SyntaxElement::Token(semi));
            return Ok(());
        }
        if self.check_any(&[TokenKind::RBrace, TokenKind::Eof]) || self.newline_before() {
            return Ok(());
        }
        Err(ParseError::new(
            ParseErrorKind::MissingSemicolon(self.current_kind()),
            self.current().span,
        ))
    }

    fn push_token(&mut self, children: &mut Vec<SyntaxElement>) {
        let token = self.advance();
        children.push(SyntaxElement::Token(token));
    }

    fn push_expect(
        &mut self,
        children: &mut Vec<SyntaxElement>,
        kind: TokenKind,
    ) -> ParseResult<()> {
        let token = self.expect(kind)?;
        children.push(SyntaxElement::Token(token));
        Ok(())
    }

    // ==================== Statements ====================

    fn source(&mut self) -> SyntaxNode {
        let mut children = Vec::new();
        while !self.is_eof() {
            if let Some(stmt) = self.statement_recovering() {
                children.push(SyntaxElement::Node(stmt));
            }
        }
        SyntaxNode::new(SyntaxKind::Source, children)
    }

    /// Parse one statement; on failure record the error and skip ahead
    fn statement_recovering(&mut self) -> Option<SyntaxNode> {
        let start = self.position;
        match self.statement() {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                self.error(e);
                self.synchronize();
                if self.position == start {
                    self.advance();
                }
                None
            }
        }
    }

    fn statement(&mut self) -> ParseResult<SyntaxNode> {
        match self.current_kind() {
            TokenKind::LBrace => self.block(),
            TokenKind::Var | TokenKind::Const => self.var_stmt(Vec::new()),
            TokenKind::Static => {
                let modifiers = vec![SyntaxElement::Token(self.advance())];
                match self.current_kind() {
                    TokenKind::Function => self.function_decl(modifiers),
                    TokenKind::Var | TokenKind::Const => self.var_stmt(modifiers),
                    _ => Err(ParseError::new(
                        ParseErrorKind::ExpectedStatement,
                        self.current().span,
                    )
                    .with_hint("'static' applies to class functions and variables")),
                }
            }
            TokenKind::Function
                if matches!(self.peek(), TokenKind::Ident | TokenKind::UnicodeIdent) =>
            {
                self.function_decl(Vec::new())
            }
            TokenKind::Class => self.class_decl(),
            TokenKind::If => self.if_stmt(),
            TokenKind::While => self.while_stmt(),
            TokenKind::Do => self.do_while_stmt(),
            TokenKind::For => self.for_stmt(),
            TokenKind::Switch => self.switch_stmt(),
            TokenKind::Try => self.try_stmt(),
            TokenKind::With => self.with_stmt(),
            TokenKind::Return => self.return_stmt(),
            TokenKind::Break => self.jump_stmt(SyntaxKind::BreakStmt),
            TokenKind::Continue => self.jump_stmt(SyntaxKind::ContinueStmt),
            TokenKind::Throw => self.throw_stmt(),
            TokenKind::Semicolon => Ok(SyntaxNode::new(
                SyntaxKind::EmptyStmt,
                vec![SyntaxElement::Token(self.advance())],
            )),
            TokenKind::Ident | TokenKind::UnicodeIdent if self.peek() == TokenKind::Colon => {
                self.labeled_stmt()
            }
            _ => self.expr_stmt(),
        }
    }

    fn block(&mut self) -> ParseResult<SyntaxNode> {
        let mut children = Vec::new();
        self.push_expect(&mut children, TokenKind::LBrace)?;
        while !self.check(TokenKind::RBrace) && !self.is_eof() {
            if let Some(stmt) = self.statement_recovering() {
                children.push(SyntaxElement::Node(stmt));
            }
        }
        self.push_expect(&mut children, TokenKind::RBrace)?;
        Ok(SyntaxNode::new(SyntaxKind::Block, children))
    }

    fn class_decl(&mut self) -> ParseResult<SyntaxNode> {
        let mut children = Vec::new();
        self.push_expect(&mut children, TokenKind::Class)?;
        children.push(SyntaxElement::Token(self.expect_ident()?));
        if self.check(TokenKind::Extends) {
            self.push_token(&mut children);
            children.push(SyntaxElement::Token(self.expect_ident()?));
        }
        children.push(SyntaxElement::Node(self.class_body()?));
        Ok(SyntaxNode::new(SyntaxKind::ClassDecl, children))
    }

    /// Class block; accessors are kept as `Error` nodes instead of failing
    fn class_body(&mut self) -> ParseResult<SyntaxNode> {
        let mut children = Vec::new();
        self.push_expect(&mut children, TokenKind::LBrace)?;
        while !self.check(TokenKind::RBrace) && !self.is_eof() {
            let member = if self.at_accessor() {
                Some(self.unmapped_member())
            } else {
                self.statement_recovering()
            };
            if let Some(member) = member {
                children.push(SyntaxElement::Node(member));
            }
        }
        self.push_expect(&mut children, TokenKind::RBrace)?;
        Ok(SyntaxNode::new(SyntaxKind::Block, children))
    }

    /// `get name(...)` or `set name(...)`
    fn at_accessor(&self) -> bool {
        let current = self.current();
        let next = self.peek();
        current.kind == TokenKind::Ident
            && matches!(current.lexeme.as_str(), "get" | "set")
            && (matches!(next, TokenKind::Ident | TokenKind::UnicodeIdent) || next.is_keyword())
    }

    /// Take tokens up to the end of the member: a `;` or a closed `{}` body
    fn unmapped_member(&mut self) -> SyntaxNode {
        let mut children = Vec::new();
        let mut depth = 0_usize;
        while !self.is_eof() {
            let kind = self.current_kind();
            if depth == 0 && kind == TokenKind::RBrace {
                break;
            }
            self.push_token(&mut children);
            match kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket => depth = depth.saturating_sub(1),
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                TokenKind::Semicolon if depth == 0 => break,
                _ => {}
            }
        }
        SyntaxNode::new(SyntaxKind::Error, children)
    }

    fn function_decl(&mut self, mut children: Vec<SyntaxElement>) -> ParseResult<SyntaxNode> {
        self.push_expect(&mut children, TokenKind::Function)?;
        children.push(SyntaxElement::Token(self.expect_ident()?));
        self.function_rest(&mut children)?;
        Ok(SyntaxNode::new(SyntaxKind::FunctionDecl, children))
    }

    /// Parameter list, optional return type and body
    fn function_rest(&mut self, children: &mut Vec<SyntaxElement>) -> ParseResult<()> {
        children.push(SyntaxElement::Node(self.param_list()?));
        if let Some(annotation) = self.type_annotation()? {
            children.push(SyntaxElement::Node(annotation));
        }
        let saved = std::mem::replace(&mut self.no_in, false);
        let body = self.block();
        self.no_in = saved;
        children.push(SyntaxElement::Node(body?));
        Ok(())
    }

    fn param_list(&mut self) -> ParseResult<SyntaxNode> {
        let mut children = Vec::new();
        self.push_expect(&mut children, TokenKind::LParen)?;
        while !self.check(TokenKind::RParen) {
            let mut param = vec![SyntaxElement::Token(self.binding_name()?)];
            if let Some(annotation) = self.type_annotation()? {
                param.push(SyntaxElement::Node(annotation));
            }
            children.push(SyntaxElement::Node(SyntaxNode::new(SyntaxKind::Param, param)));
            if self.check(TokenKind::Comma) {
                self.push_token(&mut children);
            } else {
                break;
            }
        }
        self.push_expect(&mut children, TokenKind::RParen)?;
        Ok(SyntaxNode::new(SyntaxKind::ParamList, children))
    }

    /// `: Type` or `: pkg.Type`, discarded by the builder
    fn type_annotation(&mut self) -> ParseResult<Option<SyntaxNode>> {
        if !self.check(TokenKind::Colon) {
            return Ok(None);
        }
        let mut children = vec![SyntaxElement::Token(self.advance())];
        if self.check(TokenKind::Void) {
            self.push_token(&mut children);
        } else {
            children.push(SyntaxElement::Token(self.expect_ident()?));
            while self.check(TokenKind::Dot) {
                self.push_token(&mut children);
                children.push(SyntaxElement::Token(self.expect_ident()?));
            }
        }
        Ok(Some(SyntaxNode::new(SyntaxKind::TypeAnnotation, children)))
    }

    fn var_stmt(&mut self, modifiers: Vec<SyntaxElement>) -> ParseResult<SyntaxNode> {
        let mut children = self.var_declaration(modifiers)?;
        self.expect_semicolon(&mut children)?;
        Ok(SyntaxNode::new(SyntaxKind::VarStmt, children))
    }

    /// `var a = 1, b` without the terminator
    fn var_declaration(
        &mut self,
        mut children: Vec<SyntaxElement>,
    ) -> ParseResult<Vec<SyntaxElement>> {
        if !self.check_any(&[TokenKind::Var, TokenKind::Const]) {
            return Err(self.unexpected(ExpectedToken::OneOf(vec![
                TokenKind::Var,
                TokenKind::Const,
            ])));
        }
        self.push_token(&mut children);
        loop {
            let mut declarator = vec![SyntaxElement::Token(self.binding_name()?)];
            if let Some(annotation) = self.type_annotation()? {
                declarator.push(SyntaxElement::Node(annotation));
            }
            if self.check(TokenKind::Eq) {
                self.push_token(&mut declarator);
                declarator.push(SyntaxElement::Node(self.assignment_expr()?));
            }
            children.push(SyntaxElement::Node(SyntaxNode::new(
                SyntaxKind::VarDeclarator,
                declarator,
            )));
            if self.check(TokenKind::Comma) {
                self.push_token(&mut children);
            } else {
                break;
            }
        }
        Ok(children)
    }

    fn expr_stmt(&mut self) -> ParseResult<SyntaxNode> {
        let mut children = vec![SyntaxElement::Node(self.expression()?)];
        self.expect_semicolon(&mut children)?;
        Ok(SyntaxNode::new(SyntaxKind::ExprStmt, children))
    }

    /// `( expression )` as used by statement headers
    fn paren_header(&mut self, children: &mut Vec<SyntaxElement>) -> ParseResult<()> {
        self.push_expect(children, TokenKind::LParen)?;
        children.push(SyntaxElement::Node(self.expression()?));
        self.push_expect(children, TokenKind::RParen)
    }

    fn if_stmt(&mut self) -> ParseResult<SyntaxNode> {
        let mut children = vec![SyntaxElement::Token(self.advance())];
        self.paren_header(&mut children)?;
        children.push(SyntaxElement::Node(self.statement()?));
        if self.check(TokenKind::Else) {
            let mut else_children = vec![SyntaxElement::Token(self.advance())];
            else_children.push(SyntaxElement::Node(self.statement()?));
            children.push(SyntaxElement::Node(SyntaxNode::new(
                SyntaxKind::ElseClause,
                else_children,
            )));
        }
        Ok(SyntaxNode::new(SyntaxKind::IfStmt, children))
    }

    fn while_stmt(&mut self) -> ParseResult<SyntaxNode> {
        let mut children = vec![SyntaxElement::Token(self.advance())];
        self.paren_header(&mut children)?;
        children.push(SyntaxElement::Node(self.statement()?));
        Ok(SyntaxNode::new(SyntaxKind::WhileStmt, children))
    }

    fn do_while_stmt(&mut self) -> ParseResult<SyntaxNode> {
        let mut children = vec![SyntaxElement::Token(self.advance())];
        children.push(SyntaxElement::Node(self.statement()?));
        self.push_expect(&mut children, TokenKind::While)?;
        self.paren_header(&mut children)?;
        if let Some(semi) = self.eat(TokenKind::Semicolon) {
            children.push(SyntaxElement::Token(semi));
        }
        Ok(SyntaxNode::new(SyntaxKind::DoWhileStmt, children))
    }

    fn for_stmt(&mut self) -> ParseResult<SyntaxNode> {
        let mut children = vec![SyntaxElement::Token(self.advance())];
        self.push_expect(&mut children, TokenKind::LParen)?;

        let saved = std::mem::replace(&mut self.no_in, true);
        let init = if self.check_any(&[TokenKind::Var, TokenKind::Const]) {
            self.var_declaration(Vec::new())
                .map(|c| Some(SyntaxNode::new(SyntaxKind::VarStmt, c)))
        } else if self.check(TokenKind::Semicolon) {
            Ok(None)
        } else {
            self.expression().map(Some)
        };
        self.no_in = saved;
        let init = init?;

        if let Some(target) = init.as_ref().filter(|_| self.check(TokenKind::In)) {
            if !is_for_in_target(target) {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidAssignmentTarget,
                    target.span,
                ));
            }
            children.push(SyntaxElement::Node(target.clone()));
            self.push_token(&mut children);
            children.push(SyntaxElement::Node(self.expression()?));
            self.push_expect(&mut children, TokenKind::RParen)?;
            children.push(SyntaxElement::Node(self.statement()?));
            return Ok(SyntaxNode::new(SyntaxKind::ForInStmt, children));
        }

        let init_children = init.map(SyntaxElement::Node).into_iter().collect();
        children.push(SyntaxElement::Node(SyntaxNode::new(
            SyntaxKind::ForInit,
            init_children,
        )));
        self.push_expect(&mut children, TokenKind::Semicolon)?;

        let cond = if self.check(TokenKind::Semicolon) {
            Vec::new()
        } else {
            vec![SyntaxElement::Node(self.expression()?)]
        };
        children.push(SyntaxElement::Node(SyntaxNode::new(SyntaxKind::ForCond, cond)));
        self.push_expect(&mut children, TokenKind::Semicolon)?;

        let update = if self.check(TokenKind::RParen) {
            Vec::new()
        } else {
            vec![SyntaxElement::Node(self.expression()?)]
        };
        children.push(SyntaxElement::Node(SyntaxNode::new(
            SyntaxKind::ForUpdate,
            update,
        )));
        self.push_expect(&mut children, TokenKind::RParen)?;
        children.push(SyntaxElement::Node(self.statement()?));
        Ok(SyntaxNode::new(SyntaxKind::ForStmt, children))
    }

    fn switch_stmt(&mut self) -> ParseResult<SyntaxNode> {
        let mut children = vec![SyntaxElement::Token(self.advance())];
        self.paren_header(&mut children)?;
        self.push_expect(&mut children, TokenKind::LBrace)?;
        while !self.check(TokenKind::RBrace) && !self.is_eof() {
            let (kind, mut clause) = match self.current_kind() {
                TokenKind::Case => {
                    let mut clause = vec![SyntaxElement::Token(self.advance())];
                    clause.push(SyntaxElement::Node(self.expression()?));
                    (SyntaxKind::CaseClause, clause)
                }
                TokenKind::Default => (
                    SyntaxKind::DefaultClause,
                    vec![SyntaxElement::Token(self.advance())],
                ),
                _ => {
                    return Err(self.unexpected(ExpectedToken::OneOf(vec![
                        TokenKind::Case,
                        TokenKind::Default,
                        TokenKind::RBrace,
                    ])))
                }
            };
            self.push_expect(&mut clause, TokenKind::Colon)?;
            while !self.check_any(&[
                TokenKind::Case,
                TokenKind::Default,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]) {
                if let Some(stmt) = self.statement_recovering() {
                    clause.push(SyntaxElement::Node(stmt));
                }
            }
            children.push(SyntaxElement::Node(SyntaxNode::new(kind, clause)));
        }
        self.push_expect(&mut children, TokenKind::RBrace)?;
        Ok(SyntaxNode::new(SyntaxKind::SwitchStmt, children))
    }

    fn try_stmt(&mut self) -> ParseResult<SyntaxNode> {
        let mut children = vec![SyntaxElement::Token(self.advance())];
        children.push(SyntaxElement::Node(self.block()?));

        if self.check(TokenKind::Catch) {
            let mut clause = vec![SyntaxElement::Token(self.advance())];
            if self.check(TokenKind::LParen) {
                self.push_token(&mut clause);
                clause.push(SyntaxElement::Token(self.binding_name()?));
                if let Some(annotation) = self.type_annotation()? {
                    clause.push(SyntaxElement::Node(annotation));
                }
                self.push_expect(&mut clause, TokenKind::RParen)?;
            }
            clause.push(SyntaxElement::Node(self.block()?));
            children.push(SyntaxElement::Node(SyntaxNode::new(
                SyntaxKind::CatchClause,
                clause,
            )));
        }

        if self.check(TokenKind::Finally) {
            let mut clause = vec![SyntaxElement::Token(self.advance())];
            clause.push(SyntaxElement::Node(self.block()?));
            children.push(SyntaxElement::Node(SyntaxNode::new(
                SyntaxKind::FinallyClause,
                clause,
            )));
        }

        if children.len() == 2 {
            return Err(self.unexpected(ExpectedToken::OneOf(vec![
                TokenKind::Catch,
                TokenKind::Finally,
            ])));
        }
        Ok(SyntaxNode::new(SyntaxKind::TryStmt, children))
    }

    fn with_stmt(&mut self) -> ParseResult<SyntaxNode> {
        let mut children = vec![SyntaxElement::Token(self.advance())];
        self.paren_header(&mut children)?;
        children.push(SyntaxElement::Node(self.statement()?));
        Ok(SyntaxNode::new(SyntaxKind::WithStmt, children))
    }

    /// True when the current token can start a value on the same line
    fn has_operand(&self) -> bool {
        !self.check_any(&[TokenKind::Semicolon, TokenKind::RBrace, TokenKind::Eof])
            && !self.newline_before()
    }

    fn return_stmt(&mut self) -> ParseResult<SyntaxNode> {
        let mut children = vec![SyntaxElement::Token(self.advance())];
        if self.has_operand() {
            children.push(SyntaxElement::Node(self.expression()?));
        }
        self.expect_semicolon(&mut children)?;
        Ok(SyntaxNode::new(SyntaxKind::ReturnStmt, children))
    }

    fn jump_stmt(&mut self, kind: SyntaxKind) -> ParseResult<SyntaxNode> {
        let mut children = vec![SyntaxElement::Token(self.advance())];
        if self.check_any(&[TokenKind::Ident, TokenKind::UnicodeIdent]) && !self.newline_before()
        {
            self.push_token(&mut children);
        }
        self.expect_semicolon(&mut children)?;
        Ok(SyntaxNode::new(kind, children))
    }

    fn throw_stmt(&mut self) -> ParseResult<SyntaxNode> {
        let mut children = vec![SyntaxElement::Token(self.advance())];
        children.push(SyntaxElement::Node(self.expression()?));
        self.expect_semicolon(&mut children)?;
        Ok(SyntaxNode::new(SyntaxKind::ThrowStmt, children))
    }

    fn labeled_stmt(&mut self) -> ParseResult<SyntaxNode> {
        let mut children = vec![SyntaxElement::Token(self.advance())];
        self.push_expect(&mut children, TokenKind::Colon)?;
        children.push(SyntaxElement::Node(self.statement()?));
        Ok(SyntaxNode::new(SyntaxKind::LabeledStmt, children))
    }

    // ==================== Expressions ====================

    /// Parse a full expression, including the comma operator
    pub fn expression(&mut self) -> ParseResult<SyntaxNode> {
        let first = self.assignment_expr()?;
        if !self.check(TokenKind::Comma) {
            return Ok(first);
        }
        let mut children = vec![SyntaxElement::Node(first)];
        while self.check(TokenKind::Comma) {
            self.push_token(&mut children);
            children.push(SyntaxElement::Node(self.assignment_expr()?));
        }
        Ok(SyntaxNode::new(SyntaxKind::SequenceExpr, children))
    }

    fn assignment_expr(&mut self) -> ParseResult<SyntaxNode> {
        let target = self.conditional_expr()?;
        if !self.current_kind().is_assignment() {
            return Ok(target);
        }
        if !is_assignable(&target) {
            return Err(ParseError::new(
                ParseErrorKind::InvalidAssignmentTarget,
                target.span,
            ));
        }
        let op = self.advance();
        let value = self.assignment_expr()?;
        Ok(SyntaxNode::new(
            SyntaxKind::AssignExpr,
            vec![
                SyntaxElement::Node(target),
                SyntaxElement::Token(op),
                SyntaxElement::Node(value),
            ],
        ))
    }

    fn conditional_expr(&mut self) -> ParseResult<SyntaxNode> {
        let condition = self.binary_expr(0)?;
        if !self.check(TokenKind::Question) {
            return Ok(condition);
        }
        let mut children = vec![SyntaxElement::Node(condition), SyntaxElement::Token(self.advance())];
        let saved = std::mem::replace(&mut self.no_in, false);
        let then_value = self.assignment_expr();
        self.no_in = saved;
        children.push(SyntaxElement::Node(then_value?));
        self.push_expect(&mut children, TokenKind::Colon)?;
        children.push(SyntaxElement::Node(self.assignment_expr()?));
        Ok(SyntaxNode::new(SyntaxKind::ConditionalExpr, children))
    }

    /// Precedence climbing over the left-associative binary operators
    fn binary_expr(&mut self, min_prec: u8) -> ParseResult<SyntaxNode> {
        let mut left = self.unary_expr()?;
        while let Some(prec) = self.infix_precedence() {
            if prec < min_prec {
                break;
            }
            let op = self.advance();
            let right = self.binary_expr(prec + 1)?;
            left = SyntaxNode::new(
                SyntaxKind::BinaryExpr,
                vec![
                    SyntaxElement::Node(left),
                    SyntaxElement::Token(op),
                    SyntaxElement::Node(right),
                ],
            );
        }
        Ok(left)
    }

    fn infix_precedence(&self) -> Option<u8> {
        let prec = match self.current_kind() {
            TokenKind::OrOr => 1,
            TokenKind::AndAnd => 2,
            TokenKind::Pipe => 3,
            TokenKind::Caret => 4,
            TokenKind::Amp => 5,
            TokenKind::EqEq | TokenKind::NotEq | TokenKind::EqEqEq | TokenKind::NotEqEq => 6,
            TokenKind::Lt
            | TokenKind::Gt
            | TokenKind::LtEq
            | TokenKind::GtEq
            | TokenKind::Instanceof => 7,
            TokenKind::In if !self.no_in => 7,
            TokenKind::Shl | TokenKind::Shr | TokenKind::UShr => 8,
            TokenKind::Plus | TokenKind::Minus => 9,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => 10,
            _ => return None,
        };
        Some(prec)
    }

    fn unary_expr(&mut self) -> ParseResult<SyntaxNode> {
        match self.current_kind() {
            TokenKind::Not
            | TokenKind::Minus
            | TokenKind::Plus
            | TokenKind::Tilde
            | TokenKind::Typeof
            | TokenKind::Void
            | TokenKind::Delete
            | TokenKind::PlusPlus
            | TokenKind::MinusMinus => {
                let op = self.advance();
                let operand = self.unary_expr()?;
                if matches!(op.kind, TokenKind::PlusPlus | TokenKind::MinusMinus)
                    && !is_assignable(&operand)
                {
                    return Err(ParseError::new(
                        ParseErrorKind::InvalidAssignmentTarget,
                        operand.span,
                    ));
                }
                Ok(SyntaxNode::new(
                    SyntaxKind::PrefixExpr,
                    vec![SyntaxElement::Token(op), SyntaxElement::Node(operand)],
                ))
            }
            _ => self.postfix_expr(),
        }
    }

    fn postfix_expr(&mut self) -> ParseResult<SyntaxNode> {
        let expr = self.lhs_expr()?;
        if self.check_any(&[TokenKind::PlusPlus, TokenKind::MinusMinus]) && !self.newline_before()
        {
            if !is_assignable(&expr) {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidAssignmentTarget,
                    expr.span,
                ));
            }
            let op = self.advance();
            return Ok(SyntaxNode::new(
                SyntaxKind::PostfixExpr,
                vec![SyntaxElement::Node(expr), SyntaxElement::Token(op)],
            ));
        }
        Ok(expr)
    }

    /// Calls, member access and indexing
    fn lhs_expr(&mut self) -> ParseResult<SyntaxNode> {
        let mut expr = if self.check(TokenKind::New) {
            self.new_expr()?
        } else {
            self.primary_expr()?
        };
        loop {
            expr = match self.current_kind() {
                TokenKind::Dot | TokenKind::LBracket => self.member_access(expr)?,
                TokenKind::LParen => SyntaxNode::new(
                    SyntaxKind::CallExpr,
                    vec![
                        SyntaxElement::Node(expr),
                        SyntaxElement::Node(self.arg_list()?),
                    ],
                ),
                _ => return Ok(expr),
            };
        }
    }

    /// One `.name` or `[index]` suffix applied to `object`
    fn member_access(&mut self, object: SyntaxNode) -> ParseResult<SyntaxNode> {
        let mut children = vec![SyntaxElement::Node(object)];
        if self.check(TokenKind::Dot) {
            self.push_token(&mut children);
            children.push(SyntaxElement::Token(self.property_name()?));
            return Ok(SyntaxNode::new(SyntaxKind::MemberExpr, children));
        }
        self.push_expect(&mut children, TokenKind::LBracket)?;
        let saved = std::mem::replace(&mut self.no_in, false);
        let index = self.expression();
        self.no_in = saved;
        children.push(SyntaxElement::Node(index?));
        self.push_expect(&mut children, TokenKind::RBracket)?;
        Ok(SyntaxNode::new(SyntaxKind::IndexExpr, children))
    }

    fn new_expr(&mut self) -> ParseResult<SyntaxNode> {
        let mut children = vec![SyntaxElement::Token(self.advance())];
        let mut callee = if self.check(TokenKind::New) {
            self.new_expr()?
        } else {
            self.primary_expr()?
        };
        while self.check_any(&[TokenKind::Dot, TokenKind::LBracket]) {
            callee = self.member_access(callee)?;
        }
        children.push(SyntaxElement::Node(callee));
        if self.check(TokenKind::LParen) {
            children.push(SyntaxElement::Node(self.arg_list()?));
        }
        Ok(SyntaxNode::new(SyntaxKind::NewExpr, children))
    }

    /// Member names accept keywords (`obj.default`, `cursor.delete`)
    fn property_name(&mut self) -> ParseResult<Token> {
        let kind = self.current_kind();
        if matches!(kind, TokenKind::Ident | TokenKind::UnicodeIdent) || kind.is_keyword() {
            Ok(self.advance())
        } else {
            Err(ParseError::new(
                ParseErrorKind::ExpectedIdentifier(kind),
                self.current().span,
            ))
        }
    }

    fn arg_list(&mut self) -> ParseResult<SyntaxNode> {
        let mut children = Vec::new();
        self.push_expect(&mut children, TokenKind::LParen)?;
        let saved = std::mem::replace(&mut self.no_in, false);
        let result = self.comma_list(&mut children, TokenKind::RParen, Self::assignment_expr);
        self.no_in = saved;
        result?;
        self.push_expect(&mut children, TokenKind::RParen)?;
        Ok(SyntaxNode::new(SyntaxKind::ArgList, children))
    }

    /// Comma separated items up to (not including) `close`; a trailing comma is allowed
    fn comma_list(
        &mut self,
        children: &mut Vec<SyntaxElement>,
        close: TokenKind,
        mut item: impl FnMut(&mut Self) -> ParseResult<SyntaxNode>,
    ) -> ParseResult<()> {
        while !self.check(close) {
            children.push(SyntaxElement::Node(item(self)?));
            if self.check(TokenKind::Comma) {
                self.push_token(children);
            } else {
                break;
            }
        }
        Ok(())
    }

    fn primary_expr(&mut self) -> ParseResult<SyntaxNode> {
        let kind = self.current_kind();
        let node_kind = match kind {
            TokenKind::Int
            | TokenKind::Float
            | TokenKind::DoubleString
            | TokenKind::SingleString
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null
            | TokenKind::Undefined => SyntaxKind::Literal,
            TokenKind::HexInt => {
                let digits = self.current().lexeme.get(2..).unwrap_or_default();
                if u64::from_str_radix(digits, 16).is_err() {
                    return Err(ParseError::new(
                        ParseErrorKind::InvalidNumber(self.current().lexeme.clone()),
                        self.current().span,
                    ));
                }
                SyntaxKind::Literal
            }
            TokenKind::Regex => SyntaxKind::RegexLiteral,
            TokenKind::Ident | TokenKind::UnicodeIdent => SyntaxKind::NameRef,
            TokenKind::This => SyntaxKind::ThisExpr,
            TokenKind::LParen => return self.paren_expr(),
            TokenKind::LBracket => return self.array_literal(),
            TokenKind::LBrace => return self.object_literal(),
            TokenKind::Function => return self.function_expr(),
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::ExpectedExpression(kind),
                    self.current().span,
                ))
            }
        };
        Ok(SyntaxNode::new(
            node_kind,
            vec![SyntaxElement::Token(self.advance())],
        ))
    }

    fn paren_expr(&mut self) -> ParseResult<SyntaxNode> {
        let mut children = vec![SyntaxElement::Token(self.advance())];
        let saved = std::mem::replace(&mut self.no_in, false);
        let inner = self.expression();
        self.no_in = saved;
        children.push(SyntaxElement::Node(inner?));
        self.push_expect(&mut children, TokenKind::RParen)?;
        Ok(SyntaxNode::new(SyntaxKind::ParenExpr, children))
    }

    fn array_literal(&mut self) -> ParseResult<SyntaxNode> {
        let mut children = vec![SyntaxElement::Token(self.advance())];
        let saved = std::mem::replace(&mut self.no_in, false);
        let result = self.comma_list(&mut children, TokenKind::RBracket, Self::assignment_expr);
        self.no_in = saved;
        result?;
        self.push_expect(&mut children, TokenKind::RBracket)?;
        Ok(SyntaxNode::new(SyntaxKind::ArrayLiteral, children))
    }

    fn object_literal(&mut self) -> ParseResult<SyntaxNode> {
        let mut children = vec![SyntaxElement::Token(self.advance())];
        let saved = std::mem::replace(&mut self.no_in, false);
        let result = self.comma_list(&mut children, TokenKind::RBrace, Self::property_assign);
        self.no_in = saved;
        result?;
        self.push_expect(&mut children, TokenKind::RBrace)?;
        Ok(SyntaxNode::new(SyntaxKind::ObjectLiteral, children))
    }

    fn property_assign(&mut self) -> ParseResult<SyntaxNode> {
        let key = match self.current_kind() {
            TokenKind::DoubleString
            | TokenKind::SingleString
            | TokenKind::Int
            | TokenKind::Float => self.advance(),
            _ => self.property_name()?,
        };
        let mut children = vec![SyntaxElement::Token(key)];
        self.push_expect(&mut children, TokenKind::Colon)?;
        children.push(SyntaxElement::Node(self.assignment_expr()?));
        Ok(SyntaxNode::new(SyntaxKind::PropertyAssign, children))
    }

    fn function_expr(&mut self) -> ParseResult<SyntaxNode> {
        let mut children = vec![SyntaxElement::Token(self.advance())];
        if self.check_any(&[TokenKind::Ident, TokenKind::UnicodeIdent]) {
            self.push_token(&mut children);
        }
        self.function_rest(&mut children)?;
        Ok(SyntaxNode::new(SyntaxKind::FunctionExpr, children))
    }

    // ==================== Error Recovery ====================

    /// Skip to the next statement boundary inside the current block
    fn synchronize(&mut self) {
        while !self.is_eof() && !self.check(TokenKind::RBrace) {
            if self.eat(TokenKind::Semicolon).is_some() {
                return;
            }
            match self.current_kind() {
                TokenKind::Var
                | TokenKind::Const
                | TokenKind::Function
                | TokenKind::Class
                | TokenKind::If
                | TokenKind::For
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::Switch
                | TokenKind::Try
                | TokenKind::With
                | TokenKind::Return => return,
                _ => {}
            }
            self.advance();
        }
    }
}

/// Targets accepted on the left of `=` and by `++`/`--`
fn is_assignable(node: &SyntaxNode) -> bool {
    match node.kind {
        SyntaxKind::NameRef | SyntaxKind::MemberExpr | SyntaxKind::IndexExpr => true,
        SyntaxKind::ParenExpr => node.nth_node(0).is_some_and(is_assignable),
        _ => false,
    }
}

/// `for (x in o)` and `for (var x in o)` heads
fn is_for_in_target(node: &SyntaxNode) -> bool {
    if node.kind == SyntaxKind::VarStmt {
        let declarators: Vec<_> = node.nodes().collect();
        return declarators.len() == 1 && !declarators[0].has_token(TokenKind::Eq);
    }
    is_assignable(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> SyntaxNode {
        match Parser::parse_source(source) {
            Ok(tree) => tree,
            Err(errors) => panic!("unexpected errors: {errors:?}"),
        }
    }

    fn first_stmt(source: &str) -> SyntaxNode {
        parse(source)
            .nth_node(0)
            .cloned()
            .unwrap_or_else(|| panic!("no statement in {source:?}"))
    }

    fn parse_errors(source: &str) -> Vec<ParseError> {
        match Parser::parse_source(source) {
            Ok(_) => panic!("expected errors for {source:?}"),
            Err(errors) => errors,
        }
    }

    #[test]
    fn var_with_multiple_declarators() {
        let stmt = first_stmt("var a = 1, b: Number, c = a + 2;");
        assert_eq!(stmt.kind, SyntaxKind::VarStmt);
        let declarators: Vec<_> = stmt.nodes().collect();
        assert_eq!(declarators.len(), 3);
        assert!(declarators[1].child(SyntaxKind::TypeAnnotation).is_some());
        assert_eq!(
            declarators[2].nth_node(0).map(|n| n.kind),
            Some(SyntaxKind::BinaryExpr)
        );
    }

    #[test]
    fn function_with_typed_params() {
        let stmt = first_stmt("function f(a: String, b): Boolean { return a == b; }");
        assert_eq!(stmt.kind, SyntaxKind::FunctionDecl);
        let params = stmt.child(SyntaxKind::ParamList).map(|p| p.nodes().count());
        assert_eq!(params, Some(2));
        assert!(stmt.child(SyntaxKind::TypeAnnotation).is_some());
        assert!(stmt.child(SyntaxKind::Block).is_some());
    }

    #[test]
    fn class_with_extends_and_members() {
        let stmt = first_stmt(
            "class oficial extends interna { var ctx; static function f() {} function oficial(c) { interna(c); } }",
        );
        assert_eq!(stmt.kind, SyntaxKind::ClassDecl);
        assert!(stmt.has_token(TokenKind::Extends));
        let body = stmt.child(SyntaxKind::Block).map(|b| b.nodes().count());
        assert_eq!(body, Some(3));
    }

    #[test]
    fn accessors_become_error_nodes() {
        let stmt = first_stmt(
            "class A { function A() {} get x() { return 1; } set x(v) { this._x = v; } var y; }",
        );
        let body: Vec<_> = stmt
            .child(SyntaxKind::Block)
            .map(|b| b.nodes().map(|n| n.kind).collect())
            .unwrap_or_default();
        assert_eq!(
            body,
            vec![
                SyntaxKind::FunctionDecl,
                SyntaxKind::Error,
                SyntaxKind::Error,
                SyntaxKind::VarStmt,
            ]
        );
    }

    #[test]
    fn get_and_set_stay_usable_as_names() {
        let stmt = first_stmt("class A { function f() { get(1); set = 2; } }");
        assert!(stmt.child(SyntaxKind::Block).is_some());
        assert!(Parser::parse_source("var get = 1; set(get);").is_ok());
    }

    #[test]
    fn reserved_words_as_declared_names() {
        let stmt = first_stmt("var class = 1, default;");
        let names: Vec<_> = stmt
            .nodes()
            .filter_map(|d| d.ident().map(|t| t.lexeme.clone()))
            .collect();
        assert_eq!(names, vec!["class", "default"]);
        let stmt = first_stmt("function f(in, from) {}");
        assert_eq!(stmt.child(SyntaxKind::ParamList).map(|p| p.nodes().count()), Some(2));
        assert!(Parser::parse_source("try { f(); } catch (function) { g(); }").is_ok());
    }

    #[test]
    fn semicolons_are_optional_at_line_end() {
        let tree = parse("var a = 1\nvar b = 2\nfoo()\n");
        assert_eq!(tree.nodes().count(), 3);
    }

    #[test]
    fn missing_semicolon_on_same_line_fails() {
        let errors = parse_errors("var a = 1 var b = 2;");
        assert!(matches!(
            errors[0].kind,
            ParseErrorKind::MissingSemicolon(TokenKind::Var)
        ));
    }

    #[test]
    fn precedence_of_binary_operators() {
        let expr = Parser::parse_expression("a || b && c == d + e * f").unwrap();
        assert_eq!(expr.kind, SyntaxKind::BinaryExpr);
        assert_eq!(expr.token(TokenKind::OrOr).map(|t| t.kind), Some(TokenKind::OrOr));
        let right = expr.nth_node(1).unwrap();
        assert!(right.has_token(TokenKind::AndAnd));
    }

    #[test]
    fn assignment_is_right_associative() {
        let expr = Parser::parse_expression("a = b += 1").unwrap();
        assert_eq!(expr.kind, SyntaxKind::AssignExpr);
        assert_eq!(expr.nth_node(1).map(|n| n.kind), Some(SyntaxKind::AssignExpr));
    }

    #[test]
    fn member_call_chain() {
        let expr = Parser::parse_expression("this.cursor().valueBuffer(\"x\").length").unwrap();
        assert_eq!(expr.kind, SyntaxKind::MemberExpr);
        assert_eq!(expr.nth_node(0).map(|n| n.kind), Some(SyntaxKind::CallExpr));
    }

    #[test]
    fn keywords_are_property_names() {
        let expr = Parser::parse_expression("cursor.delete(obj.default)").unwrap();
        assert_eq!(expr.kind, SyntaxKind::CallExpr);
    }

    #[test]
    fn new_with_and_without_arguments() {
        let with_args = Parser::parse_expression("new FLSqlCursor(\"t\")").unwrap();
        assert_eq!(with_args.kind, SyntaxKind::NewExpr);
        assert!(with_args.child(SyntaxKind::ArgList).is_some());

        let bare = Parser::parse_expression("new Date").unwrap();
        assert!(bare.child(SyntaxKind::ArgList).is_none());

        let chained = Parser::parse_expression("new Date().getTime()").unwrap();
        assert_eq!(chained.kind, SyntaxKind::CallExpr);
    }

    #[test]
    fn for_and_for_in_are_distinguished() {
        let classic = first_stmt("for (var i = 0; i < n; i++) {}");
        assert_eq!(classic.kind, SyntaxKind::ForStmt);
        assert_eq!(
            classic.child(SyntaxKind::ForUpdate).and_then(|u| u.nth_node(0)).map(|n| n.kind),
            Some(SyntaxKind::PostfixExpr)
        );

        let for_in = first_stmt("for (var k in obj) {}");
        assert_eq!(for_in.kind, SyntaxKind::ForInStmt);

        let empty = first_stmt("for (;;) { break; }");
        assert_eq!(empty.kind, SyntaxKind::ForStmt);
        assert_eq!(empty.child(SyntaxKind::ForCond).map(|c| c.children.len()), Some(0));
    }

    #[test]
    fn in_operator_inside_for_init_parens() {
        let stmt = first_stmt("for (var x = (a in b); x; ) {}");
        assert_eq!(stmt.kind, SyntaxKind::ForStmt);
    }

    #[test]
    fn switch_clauses() {
        let stmt = first_stmt("switch (x) { case 1: a(); case 2: b(); break; default: c(); }");
        let kinds: Vec<_> = stmt.nodes().skip(1).map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::CaseClause,
                SyntaxKind::CaseClause,
                SyntaxKind::DefaultClause
            ]
        );
    }

    #[test]
    fn try_catch_finally() {
        let stmt = first_stmt("try { a(); } catch (e) { b(); } finally { c(); }");
        assert!(stmt.child(SyntaxKind::CatchClause).is_some());
        assert!(stmt.child(SyntaxKind::FinallyClause).is_some());
    }

    #[test]
    fn try_without_handler_fails() {
        let errors = parse_errors("try { a(); }");
        assert!(matches!(errors[0].kind, ParseErrorKind::UnexpectedToken { .. }));
    }

    #[test]
    fn object_and_array_literals() {
        let expr = Parser::parse_expression("[1, {a: 2, \"b\": [3,]}, x]").unwrap();
        assert_eq!(expr.kind, SyntaxKind::ArrayLiteral);
        assert_eq!(expr.nodes().count(), 3);
    }

    #[test]
    fn regex_literal_in_call() {
        let expr = Parser::parse_expression("s.replace(/a+/g, \"b\")").unwrap();
        let args = expr.child(SyntaxKind::ArgList).unwrap();
        assert_eq!(args.nth_node(0).map(|n| n.kind), Some(SyntaxKind::RegexLiteral));
    }

    #[test]
    fn return_value_must_start_on_same_line() {
        let stmt = first_stmt("return\nx;");
        assert_eq!(stmt.kind, SyntaxKind::ReturnStmt);
        assert_eq!(stmt.nodes().count(), 0);
    }

    #[test]
    fn labeled_statement_is_parsed() {
        let stmt = first_stmt("outer: while (true) { break outer; }");
        assert_eq!(stmt.kind, SyntaxKind::LabeledStmt);
    }

    #[test]
    fn invalid_assignment_target() {
        let errors = parse_errors("1 = x;");
        assert_eq!(errors[0].kind, ParseErrorKind::InvalidAssignmentTarget);
        let errors = parse_errors("f()++;");
        assert_eq!(errors[0].kind, ParseErrorKind::InvalidAssignmentTarget);
    }

    #[test]
    fn lexical_errors_fail_the_parse() {
        let errors = parse_errors("var a = #;");
        assert!(matches!(errors[0].kind, ParseErrorKind::Lexical(_)));
    }

    #[test]
    fn errors_report_location() {
        let source = "var a = 1;\nvar b = ;\n";
        let errors = parse_errors(source);
        let index = crate::lexer::LineIndex::new(source);
        assert_eq!(errors[0].location(&index), crate::lexer::Location::new(2, 9));
    }

    #[test]
    fn recovery_continues_after_error() {
        let errors = parse_errors("var = 1;\nfunction f() { return ) }\nvar ok = 2;");
        assert_eq!(errors.len(), 2);
    }
}
