//! Hierarchical parser for C# declarations
//!
//! Builds a structured CST from the lexer's token stream. Declarations
//! (namespaces, types, members, parameters) get their own nodes; statement and
//! expression bodies are kept as flat token runs with a nested `Block` node for
//! every brace pair.
//!
//! Trivia placement: trivia preceding a declaration belongs to the enclosing
//! node, so region directives and blank lines are siblings of the members they
//! surround. Trivia up to and including the first line break after a
//! declaration belongs to that declaration.

use rowan::{Checkpoint, GreenNode};

use super::lexer::{CstSpan, LexerError, lex_with_trivia};
use super::preprocessor::PreprocessorSymbols;
use super::{CsSyntaxKind, CsSyntaxNode, CstBuilder, CstToken};

/// Parse error kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Raised by the lexer (unterminated literal, bad directive, ...)
    Lexer,
    /// Raised by the parser
    Syntax,
}

/// A parse error with its byte span in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub span: CstSpan,
}

impl From<LexerError> for ParseError {
    fn from(error: LexerError) -> Self {
        Self {
            kind: ParseErrorKind::Lexer,
            message: error.message,
            span: error.span,
        }
    }
}

/// Result of parsing one source file
#[derive(Debug, Clone)]
pub struct Parse {
    green: GreenNode,
    errors: Vec<ParseError>,
}

impl Parse {
    pub fn green(&self) -> &GreenNode {
        &self.green
    }

    pub fn syntax(&self) -> CsSyntaxNode {
        CsSyntaxNode::new_root(self.green.clone())
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn into_parts(self) -> (GreenNode, Vec<ParseError>) {
        (self.green, self.errors)
    }
}

/// Parse C# source into a lossless CST
///
/// # Example
///
/// ```rust
/// use mdk_core::cst::{PreprocessorSymbols, parse_csharp};
///
/// let source = "class Program { void Main() { } }\n";
/// let parse = parse_csharp(source, &PreprocessorSymbols::new());
/// assert!(parse.errors().is_empty());
/// assert_eq!(parse.syntax().text().to_string(), source);
/// ```
pub fn parse_csharp(source: &str, symbols: &PreprocessorSymbols) -> Parse {
    let (tokens, lexer_errors) = lex_with_trivia(source, symbols);
    let mut parser = Parser::new(&tokens);
    parser.parse_compilation_unit();
    let (green, parse_errors) = parser.finish();

    let mut errors: Vec<ParseError> = lexer_errors.into_iter().map(ParseError::from).collect();
    errors.extend(parse_errors);
    errors.sort_by_key(|error| error.span.start);

    Parse { green, errors }
}

/// Token stream parser
struct Parser<'a> {
    tokens: &'a [CstToken],
    pos: usize,
    builder: CstBuilder,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [CstToken]) -> Self {
        Self {
            tokens,
            pos: 0,
            builder: CstBuilder::new(),
            errors: Vec::new(),
        }
    }

    fn finish(self) -> (GreenNode, Vec<ParseError>) {
        (self.builder.finish(), self.errors)
    }

    fn parse_compilation_unit(&mut self) {
        self.builder.start_node(CsSyntaxKind::CompilationUnit);
        self.parse_namespace_body(false);
        self.bump_trivia();
        while self.pos < self.tokens.len() {
            self.error_and_bump("unexpected token");
            self.bump_trivia();
        }
        self.builder.finish_node();
    }

    /// Usings, namespaces and types, up to EOF or a closing brace
    fn parse_namespace_body(&mut self, braced: bool) {
        loop {
            self.bump_trivia();
            match self.peek() {
                None => break,
                Some(CsSyntaxKind::RBrace) if braced => break,
                Some(CsSyntaxKind::RBrace) => self.error_and_bump("unexpected '}'"),
                Some(CsSyntaxKind::ExternKw) if self.nth_is_contextual(1, "alias") => {
                    self.parse_simple_directive(CsSyntaxKind::ExternAlias)
                }
                Some(CsSyntaxKind::UsingKw) => {
                    self.parse_simple_directive(CsSyntaxKind::UsingDirective)
                }
                Some(CsSyntaxKind::NamespaceKw) => self.parse_namespace(),
                Some(CsSyntaxKind::LBracket) if self.at_global_attribute() => {
                    self.parse_attribute_list();
                    self.bump_trailing_trivia();
                }
                Some(_) => {
                    let before = self.pos;
                    self.parse_member(None);
                    if self.pos == before {
                        self.error_and_bump("expected namespace member");
                    }
                }
            }
        }
    }

    /// `using ...;` and `extern alias ...;`
    fn parse_simple_directive(&mut self, kind: CsSyntaxKind) {
        self.builder.start_node(kind);
        self.bump();
        while let Some(next) = self.peek() {
            match next {
                CsSyntaxKind::Semicolon => break,
                CsSyntaxKind::LBrace | CsSyntaxKind::RBrace => break,
                _ => self.bump(),
            }
        }
        self.expect(CsSyntaxKind::Semicolon);
        self.bump_trailing_trivia();
        self.builder.finish_node();
    }

    fn parse_namespace(&mut self) {
        self.builder.start_node(CsSyntaxKind::NamespaceDeclaration);
        self.bump();
        self.expect(CsSyntaxKind::Identifier);
        while self.at(CsSyntaxKind::Dot) {
            self.bump();
            self.expect(CsSyntaxKind::Identifier);
        }

        if self.at(CsSyntaxKind::Semicolon) {
            // File-scoped namespace: the rest of the file belongs to it
            self.bump();
            self.bump_trailing_trivia();
            self.parse_namespace_body(false);
        } else {
            self.expect(CsSyntaxKind::LBrace);
            self.bump_trailing_trivia();
            self.parse_namespace_body(true);
            self.expect(CsSyntaxKind::RBrace);
            if self.at(CsSyntaxKind::Semicolon) {
                self.bump();
            }
            self.bump_trailing_trivia();
        }
        self.builder.finish_node();
    }

    /// Parse one type or member declaration. Consumes nothing when the next
    /// token cannot start a declaration.
    fn parse_member(&mut self, container: Option<&str>) {
        self.bump_trivia();
        let checkpoint = self.builder.checkpoint();
        let start = self.pos;

        self.parse_attributes();
        self.parse_modifiers();

        match self.peek() {
            Some(CsSyntaxKind::ClassKw) => {
                self.parse_type_declaration(checkpoint, CsSyntaxKind::ClassDeclaration)
            }
            Some(CsSyntaxKind::StructKw) => {
                self.parse_type_declaration(checkpoint, CsSyntaxKind::StructDeclaration)
            }
            Some(CsSyntaxKind::InterfaceKw) => {
                self.parse_type_declaration(checkpoint, CsSyntaxKind::InterfaceDeclaration)
            }
            Some(CsSyntaxKind::Identifier)
                if self.nth_is_contextual(0, "record")
                    && matches!(
                        self.nth(1),
                        Some(CsSyntaxKind::Identifier | CsSyntaxKind::ClassKw)
                    ) =>
            {
                self.parse_type_declaration(checkpoint, CsSyntaxKind::ClassDeclaration)
            }
            Some(CsSyntaxKind::EnumKw) => self.parse_enum(checkpoint),
            Some(CsSyntaxKind::DelegateKw) => self.parse_delegate(checkpoint),
            Some(CsSyntaxKind::EventKw) => self.parse_event(checkpoint),
            Some(CsSyntaxKind::Tilde) => self.parse_destructor(checkpoint),
            Some(CsSyntaxKind::ImplicitKw | CsSyntaxKind::ExplicitKw) => {
                self.parse_conversion_operator(checkpoint)
            }
            Some(CsSyntaxKind::Identifier)
                if container.is_some_and(|name| name == self.nth_text(0))
                    && self.nth(1) == Some(CsSyntaxKind::LParen) =>
            {
                self.parse_constructor(checkpoint)
            }
            Some(kind) if can_start_type(kind) => self.parse_typed_member(checkpoint),
            _ => {
                if self.pos != start {
                    self.builder.start_node_at(checkpoint, CsSyntaxKind::Error);
                    self.error("expected member declaration");
                    self.builder.finish_node();
                }
            }
        }
    }

    fn parse_type_declaration(&mut self, checkpoint: Checkpoint, kind: CsSyntaxKind) {
        self.builder.start_node_at(checkpoint, kind);
        self.bump();
        if matches!(
            self.peek(),
            Some(CsSyntaxKind::ClassKw | CsSyntaxKind::StructKw)
        ) {
            // `record class` / `record struct`
            self.bump();
        }

        let name = self.nth_text(0).to_string();
        self.expect(CsSyntaxKind::Identifier);
        if self.at(CsSyntaxKind::Lt) {
            self.parse_type_parameter_list();
        }
        if self.at(CsSyntaxKind::LParen) {
            self.parse_parameter_list(CsSyntaxKind::LParen, CsSyntaxKind::RParen);
        }
        if self.at(CsSyntaxKind::Colon) {
            self.parse_base_list();
        }
        self.parse_constraint_clauses();

        if self.at(CsSyntaxKind::Semicolon) {
            self.bump();
        } else {
            self.expect(CsSyntaxKind::LBrace);
            self.bump_trailing_trivia();
            loop {
                self.bump_trivia();
                match self.peek() {
                    None | Some(CsSyntaxKind::RBrace) => break,
                    Some(_) => {
                        let before = self.pos;
                        self.parse_member(Some(&name));
                        if self.pos == before {
                            self.error_and_bump("expected member declaration");
                        }
                    }
                }
            }
            self.expect(CsSyntaxKind::RBrace);
            if self.at(CsSyntaxKind::Semicolon) {
                self.bump();
            }
        }
        self.bump_trailing_trivia();
        self.builder.finish_node();
    }

    fn parse_enum(&mut self, checkpoint: Checkpoint) {
        self.builder
            .start_node_at(checkpoint, CsSyntaxKind::EnumDeclaration);
        self.bump();
        self.expect(CsSyntaxKind::Identifier);
        if self.at(CsSyntaxKind::Colon) {
            self.parse_base_list();
        }
        self.expect(CsSyntaxKind::LBrace);
        self.bump_trailing_trivia();

        loop {
            self.bump_trivia();
            match self.peek() {
                None | Some(CsSyntaxKind::RBrace) => break,
                Some(CsSyntaxKind::Identifier | CsSyntaxKind::LBracket) => {
                    self.builder.start_node(CsSyntaxKind::EnumMember);
                    self.parse_attributes();
                    self.expect(CsSyntaxKind::Identifier);
                    if self.at(CsSyntaxKind::Eq) {
                        self.parse_equals_value(&[CsSyntaxKind::Comma, CsSyntaxKind::RBrace]);
                    }
                    self.builder.finish_node();
                    if self.at(CsSyntaxKind::Comma) {
                        self.bump();
                    }
                    self.bump_trailing_trivia();
                }
                Some(_) => self.error_and_bump("expected enum member"),
            }
        }

        self.expect(CsSyntaxKind::RBrace);
        if self.at(CsSyntaxKind::Semicolon) {
            self.bump();
        }
        self.bump_trailing_trivia();
        self.builder.finish_node();
    }

    fn parse_delegate(&mut self, checkpoint: Checkpoint) {
        self.builder
            .start_node_at(checkpoint, CsSyntaxKind::DelegateDeclaration);
        self.bump();
        self.parse_type();
        self.expect(CsSyntaxKind::Identifier);
        if self.at(CsSyntaxKind::Lt) {
            self.parse_type_parameter_list();
        }
        self.parse_parameter_list(CsSyntaxKind::LParen, CsSyntaxKind::RParen);
        self.parse_constraint_clauses();
        self.expect(CsSyntaxKind::Semicolon);
        self.bump_trailing_trivia();
        self.builder.finish_node();
    }

    fn parse_event(&mut self, checkpoint: Checkpoint) {
        self.builder
            .start_node_at(checkpoint, CsSyntaxKind::EventDeclaration);
        self.bump();
        self.parse_type();
        self.bump_trivia();
        let name_checkpoint = self.builder.checkpoint();
        self.parse_member_name();

        if self.at(CsSyntaxKind::LBrace) {
            self.parse_accessor_list();
        } else {
            self.parse_variable_declarators(name_checkpoint);
            self.expect(CsSyntaxKind::Semicolon);
        }
        self.bump_trailing_trivia();
        self.builder.finish_node();
    }

    fn parse_destructor(&mut self, checkpoint: Checkpoint) {
        self.builder
            .start_node_at(checkpoint, CsSyntaxKind::DestructorDeclaration);
        self.bump();
        self.expect(CsSyntaxKind::Identifier);
        self.parse_parameter_list(CsSyntaxKind::LParen, CsSyntaxKind::RParen);
        self.parse_body();
        self.bump_trailing_trivia();
        self.builder.finish_node();
    }

    fn parse_conversion_operator(&mut self, checkpoint: Checkpoint) {
        self.builder
            .start_node_at(checkpoint, CsSyntaxKind::OperatorDeclaration);
        self.bump();
        self.expect(CsSyntaxKind::OperatorKw);
        self.parse_type();
        self.parse_parameter_list(CsSyntaxKind::LParen, CsSyntaxKind::RParen);
        self.parse_body();
        self.bump_trailing_trivia();
        self.builder.finish_node();
    }

    fn parse_constructor(&mut self, checkpoint: Checkpoint) {
        self.builder
            .start_node_at(checkpoint, CsSyntaxKind::ConstructorDeclaration);
        self.bump();
        self.parse_parameter_list(CsSyntaxKind::LParen, CsSyntaxKind::RParen);
        if self.at(CsSyntaxKind::Colon) {
            // `: base(...)` / `: this(...)`
            self.bump();
            if matches!(
                self.peek(),
                Some(CsSyntaxKind::BaseKw | CsSyntaxKind::ThisKw)
            ) {
                self.bump();
            }
            if self.at(CsSyntaxKind::LParen) {
                self.bump_balanced(CsSyntaxKind::LParen, CsSyntaxKind::RParen);
            }
        }
        self.parse_body();
        self.bump_trailing_trivia();
        self.builder.finish_node();
    }

    /// Members that start with a type: fields, properties, methods,
    /// indexers and operators.
    fn parse_typed_member(&mut self, checkpoint: Checkpoint) {
        self.parse_type();

        match self.peek() {
            Some(CsSyntaxKind::OperatorKw) => {
                self.builder
                    .start_node_at(checkpoint, CsSyntaxKind::OperatorDeclaration);
                self.bump();
                while let Some(kind) = self.peek() {
                    if kind == CsSyntaxKind::LParen {
                        break;
                    }
                    self.bump();
                }
                self.parse_parameter_list(CsSyntaxKind::LParen, CsSyntaxKind::RParen);
                self.parse_body();
            }
            Some(CsSyntaxKind::ThisKw) => {
                self.builder
                    .start_node_at(checkpoint, CsSyntaxKind::IndexerDeclaration);
                self.bump();
                self.parse_indexer_tail();
            }
            Some(CsSyntaxKind::Identifier) => {
                self.bump_trivia();
                let name_checkpoint = self.builder.checkpoint();
                if self.parse_member_name() {
                    self.builder
                        .start_node_at(checkpoint, CsSyntaxKind::IndexerDeclaration);
                    self.parse_indexer_tail();
                } else {
                    match self.peek() {
                        Some(CsSyntaxKind::LParen | CsSyntaxKind::Lt) => {
                            self.builder
                                .start_node_at(checkpoint, CsSyntaxKind::MethodDeclaration);
                            if self.at(CsSyntaxKind::Lt) {
                                self.parse_type_parameter_list();
                            }
                            self.parse_parameter_list(
                                CsSyntaxKind::LParen,
                                CsSyntaxKind::RParen,
                            );
                            self.parse_constraint_clauses();
                            self.parse_body();
                        }
                        Some(CsSyntaxKind::LBrace) => {
                            self.builder
                                .start_node_at(checkpoint, CsSyntaxKind::PropertyDeclaration);
                            self.parse_accessor_list();
                            if self.at(CsSyntaxKind::Eq) {
                                self.parse_equals_value(&[CsSyntaxKind::Semicolon]);
                                self.expect(CsSyntaxKind::Semicolon);
                            }
                        }
                        Some(CsSyntaxKind::FatArrow) => {
                            self.builder
                                .start_node_at(checkpoint, CsSyntaxKind::PropertyDeclaration);
                            self.parse_arrow_expression();
                            self.expect(CsSyntaxKind::Semicolon);
                        }
                        _ => {
                            self.builder
                                .start_node_at(checkpoint, CsSyntaxKind::FieldDeclaration);
                            self.parse_variable_declarators(name_checkpoint);
                            self.expect(CsSyntaxKind::Semicolon);
                        }
                    }
                }
            }
            _ => {
                self.builder.start_node_at(checkpoint, CsSyntaxKind::Error);
                self.error("expected member name");
            }
        }

        self.bump_trailing_trivia();
        self.builder.finish_node();
    }

    fn parse_indexer_tail(&mut self) {
        self.parse_parameter_list(CsSyntaxKind::LBracket, CsSyntaxKind::RBracket);
        if self.at(CsSyntaxKind::FatArrow) {
            self.parse_arrow_expression();
            self.expect(CsSyntaxKind::Semicolon);
        } else {
            self.parse_accessor_list();
        }
    }

    /// Member name, possibly qualified by an explicit interface
    /// (`IFoo.Bar`, `IFoo<T>.Bar`). Returns `true` for `IFoo.this`.
    fn parse_member_name(&mut self) -> bool {
        self.expect(CsSyntaxKind::Identifier);
        loop {
            match self.peek() {
                Some(CsSyntaxKind::Dot) => {
                    self.bump();
                    if self.at(CsSyntaxKind::ThisKw) {
                        self.bump();
                        return true;
                    }
                    self.expect(CsSyntaxKind::Identifier);
                }
                Some(CsSyntaxKind::Lt) => {
                    let Some(close) = self.matching_angle() else {
                        break;
                    };
                    if self.kind_after(close) != Some(CsSyntaxKind::Dot) {
                        break;
                    }
                    self.bump_through(close);
                }
                _ => break,
            }
        }
        false
    }

    /// Declarators of a field or event field. The first declarator's name has
    /// already been emitted after `name_checkpoint`.
    fn parse_variable_declarators(&mut self, name_checkpoint: Checkpoint) {
        self.builder
            .start_node_at(name_checkpoint, CsSyntaxKind::VariableDeclarator);
        self.parse_declarator_tail();
        self.builder.finish_node();

        while self.at(CsSyntaxKind::Comma) {
            self.bump();
            self.bump_trivia();
            self.builder.start_node(CsSyntaxKind::VariableDeclarator);
            self.expect(CsSyntaxKind::Identifier);
            self.parse_declarator_tail();
            self.builder.finish_node();
        }
    }

    fn parse_declarator_tail(&mut self) {
        if self.at(CsSyntaxKind::LBracket) {
            // fixed-size buffer
            self.bump_balanced(CsSyntaxKind::LBracket, CsSyntaxKind::RBracket);
        }
        if self.at(CsSyntaxKind::Eq) {
            self.parse_equals_value(&[CsSyntaxKind::Comma, CsSyntaxKind::Semicolon]);
        }
    }

    fn parse_equals_value(&mut self, terminators: &[CsSyntaxKind]) {
        self.bump_trivia();
        self.builder.start_node(CsSyntaxKind::EqualsValue);
        self.bump();
        self.parse_expression_until(terminators);
        self.builder.finish_node();
    }

    fn parse_arrow_expression(&mut self) {
        self.bump_trivia();
        self.builder.start_node(CsSyntaxKind::ArrowExpression);
        self.bump();
        self.parse_expression_until(&[CsSyntaxKind::Semicolon]);
        self.builder.finish_node();
    }

    fn parse_body(&mut self) {
        match self.peek() {
            Some(CsSyntaxKind::LBrace) => {
                self.bump_trivia();
                self.parse_block();
            }
            Some(CsSyntaxKind::FatArrow) => {
                self.parse_arrow_expression();
                self.expect(CsSyntaxKind::Semicolon);
            }
            Some(CsSyntaxKind::Semicolon) => self.bump(),
            _ => self.error("expected body or ';'"),
        }
    }

    /// A brace-delimited run of tokens with nested blocks
    fn parse_block(&mut self) {
        self.builder.start_node(CsSyntaxKind::Block);
        self.bump();
        loop {
            match self.peek() {
                None => break,
                Some(CsSyntaxKind::RBrace) => break,
                Some(CsSyntaxKind::LBrace) => {
                    self.bump_trivia();
                    self.parse_block();
                }
                Some(_) => self.bump(),
            }
        }
        self.expect(CsSyntaxKind::RBrace);
        self.builder.finish_node();
    }

    fn parse_accessor_list(&mut self) {
        self.bump_trivia();
        self.builder.start_node(CsSyntaxKind::AccessorList);
        self.expect(CsSyntaxKind::LBrace);
        loop {
            self.bump_trivia();
            match self.peek() {
                None | Some(CsSyntaxKind::RBrace) => break,
                Some(kind)
                    if kind == CsSyntaxKind::Identifier
                        || kind == CsSyntaxKind::LBracket
                        || kind.is_modifier() =>
                {
                    self.builder.start_node(CsSyntaxKind::Accessor);
                    self.parse_attributes();
                    self.parse_modifiers();
                    self.expect(CsSyntaxKind::Identifier);
                    self.parse_body();
                    self.bump_trailing_trivia();
                    self.builder.finish_node();
                }
                Some(_) => self.error_and_bump("expected accessor"),
            }
        }
        self.expect(CsSyntaxKind::RBrace);
        self.builder.finish_node();
    }

    fn parse_parameter_list(&mut self, open: CsSyntaxKind, close: CsSyntaxKind) {
        self.bump_trivia();
        self.builder.start_node(CsSyntaxKind::ParameterList);
        self.expect(open);
        loop {
            match self.peek() {
                None => break,
                Some(kind) if kind == close => break,
                Some(_) => {
                    let before = self.pos;
                    self.parse_parameter(close);
                    if self.at(CsSyntaxKind::Comma) {
                        self.bump();
                    } else if self.pos == before || self.peek() != Some(close) {
                        self.error_and_bump("expected parameter");
                    }
                }
            }
        }
        self.expect(close);
        self.builder.finish_node();
    }

    fn parse_parameter(&mut self, close: CsSyntaxKind) {
        self.bump_trivia();
        self.builder.start_node(CsSyntaxKind::Parameter);
        self.parse_attributes();
        while matches!(
            self.peek(),
            Some(
                CsSyntaxKind::RefKw
                    | CsSyntaxKind::OutKw
                    | CsSyntaxKind::InKw
                    | CsSyntaxKind::ParamsKw
                    | CsSyntaxKind::ThisKw
                    | CsSyntaxKind::ReadonlyKw
            )
        ) || (self.nth_is_contextual(0, "scoped") && self.nth(1) != Some(CsSyntaxKind::Comma))
        {
            self.bump();
        }
        if self.peek().is_some_and(can_start_type) {
            self.parse_type();
        }
        if self.at(CsSyntaxKind::Identifier) {
            self.bump();
        }
        if self.at(CsSyntaxKind::Eq) {
            self.parse_equals_value(&[CsSyntaxKind::Comma, close]);
        }
        self.builder.finish_node();
    }

    fn parse_type_parameter_list(&mut self) {
        self.bump_trivia();
        self.builder.start_node(CsSyntaxKind::TypeParameterList);
        self.bump_balanced(CsSyntaxKind::Lt, CsSyntaxKind::Gt);
        self.builder.finish_node();
    }

    fn parse_base_list(&mut self) {
        self.bump_trivia();
        self.builder.start_node(CsSyntaxKind::BaseList);
        self.bump();
        loop {
            if self.peek().is_some_and(can_start_type) {
                self.parse_type();
            } else {
                self.error("expected base type");
                break;
            }
            if self.at(CsSyntaxKind::LParen) {
                // record primary constructor arguments
                self.bump_balanced(CsSyntaxKind::LParen, CsSyntaxKind::RParen);
            }
            if self.at(CsSyntaxKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.builder.finish_node();
    }

    fn parse_constraint_clauses(&mut self) {
        while self.nth_is_contextual(0, "where") {
            self.bump_trivia();
            self.builder.start_node(CsSyntaxKind::ConstraintClause);
            self.bump();
            let mut depth = 0usize;
            while let Some(kind) = self.peek() {
                if depth == 0
                    && (matches!(
                        kind,
                        CsSyntaxKind::LBrace | CsSyntaxKind::Semicolon | CsSyntaxKind::FatArrow
                    ) || self.nth_is_contextual(0, "where"))
                {
                    break;
                }
                match kind {
                    CsSyntaxKind::LParen => depth += 1,
                    CsSyntaxKind::RParen => depth = depth.saturating_sub(1),
                    _ => {}
                }
                self.bump();
            }
            self.builder.finish_node();
        }
    }

    fn parse_attributes(&mut self) {
        while self.at(CsSyntaxKind::LBracket) {
            self.bump_trivia();
            self.parse_attribute_list();
        }
    }

    fn parse_attribute_list(&mut self) {
        self.builder.start_node(CsSyntaxKind::AttributeList);
        self.bump_balanced(CsSyntaxKind::LBracket, CsSyntaxKind::RBracket);
        self.builder.finish_node();
    }

    fn parse_modifiers(&mut self) {
        loop {
            match self.peek() {
                Some(kind) if kind.is_modifier() => self.bump(),
                Some(CsSyntaxKind::Identifier)
                    if matches!(self.nth_text(0), "partial" | "async" | "required" | "file")
                        && self
                            .nth(1)
                            .is_some_and(|next| next.is_keyword() || next == CsSyntaxKind::Identifier) =>
                {
                    self.bump()
                }
                _ => break,
            }
        }
    }

    /// TypeRef node: named, generic, qualified, tuple, nullable, pointer and
    /// array types.
    fn parse_type(&mut self) {
        self.bump_trivia();
        self.builder.start_node(CsSyntaxKind::TypeRef);
        match self.peek() {
            Some(CsSyntaxKind::LParen) => {
                self.bump_balanced(CsSyntaxKind::LParen, CsSyntaxKind::RParen)
            }
            Some(kind) if kind.is_predefined_type() => self.bump(),
            Some(CsSyntaxKind::Identifier) => {
                self.bump();
                if self.at(CsSyntaxKind::ColonColon) {
                    self.bump();
                    self.expect(CsSyntaxKind::Identifier);
                }
                loop {
                    if self.at(CsSyntaxKind::Lt) {
                        self.bump_balanced(CsSyntaxKind::Lt, CsSyntaxKind::Gt);
                    } else if self.at(CsSyntaxKind::Dot)
                        && self.nth(1) == Some(CsSyntaxKind::Identifier)
                    {
                        self.bump();
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
            _ => self.error("expected type"),
        }

        loop {
            match self.peek() {
                Some(CsSyntaxKind::Question | CsSyntaxKind::Star) => self.bump(),
                Some(CsSyntaxKind::LBracket)
                    if matches!(
                        self.nth(1),
                        Some(CsSyntaxKind::RBracket | CsSyntaxKind::Comma)
                    ) =>
                {
                    self.bump_balanced(CsSyntaxKind::LBracket, CsSyntaxKind::RBracket)
                }
                _ => break,
            }
        }
        self.builder.finish_node();
    }

    /// Bump an expression up to a terminator at nesting depth zero. Braces
    /// become nested blocks; generic argument lists are skipped whole so
    /// their commas do not terminate the expression.
    fn parse_expression_until(&mut self, terminators: &[CsSyntaxKind]) {
        let mut depth = 0usize;
        let mut previous: Option<CsSyntaxKind> = None;
        while let Some(kind) = self.peek() {
            if depth == 0 && terminators.contains(&kind) {
                break;
            }
            match kind {
                CsSyntaxKind::LBrace => {
                    self.bump_trivia();
                    self.parse_block();
                    previous = Some(CsSyntaxKind::RBrace);
                    continue;
                }
                CsSyntaxKind::RBrace => break,
                CsSyntaxKind::Semicolon if depth == 0 => break,
                CsSyntaxKind::LParen | CsSyntaxKind::LBracket => depth += 1,
                CsSyntaxKind::RParen | CsSyntaxKind::RBracket => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                CsSyntaxKind::Lt if previous == Some(CsSyntaxKind::Identifier) => {
                    if let Some(close) = self.type_argument_end() {
                        self.bump_through(close);
                        previous = Some(CsSyntaxKind::Gt);
                        continue;
                    }
                }
                _ => {}
            }
            self.bump();
            previous = Some(kind);
        }
    }

    // Helper methods

    fn significant_index(&self, n: usize) -> Option<usize> {
        self.tokens[self.pos..]
            .iter()
            .enumerate()
            .filter(|(_, token)| !token.kind.is_trivia())
            .nth(n)
            .map(|(offset, _)| self.pos + offset)
    }

    fn nth(&self, n: usize) -> Option<CsSyntaxKind> {
        self.significant_index(n).map(|index| self.tokens[index].kind)
    }

    fn nth_text(&self, n: usize) -> &str {
        self.significant_index(n)
            .map_or("", |index| self.tokens[index].text.as_str())
    }

    fn nth_is_contextual(&self, n: usize, word: &str) -> bool {
        self.nth(n) == Some(CsSyntaxKind::Identifier) && self.nth_text(n) == word
    }

    fn peek(&self) -> Option<CsSyntaxKind> {
        self.nth(0)
    }

    fn at(&self, kind: CsSyntaxKind) -> bool {
        self.peek() == Some(kind)
    }

    fn at_global_attribute(&self) -> bool {
        matches!(self.nth_text(1), "assembly" | "module") && self.nth(2) == Some(CsSyntaxKind::Colon)
    }

    /// Kind of the first significant token after token index `index`
    fn kind_after(&self, index: usize) -> Option<CsSyntaxKind> {
        self.tokens[index + 1..]
            .iter()
            .find(|token| !token.kind.is_trivia())
            .map(|token| token.kind)
    }

    /// Token index of the `>` matching the `<` at the current position
    fn matching_angle(&self) -> Option<usize> {
        let start = self.significant_index(0)?;
        let mut depth = 0usize;
        for (index, token) in self.tokens.iter().enumerate().skip(start) {
            match token.kind {
                CsSyntaxKind::Lt => depth += 1,
                CsSyntaxKind::Gt => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(index);
                    }
                }
                CsSyntaxKind::LBrace
                | CsSyntaxKind::RBrace
                | CsSyntaxKind::Semicolon
                | CsSyntaxKind::LParen => return None,
                _ => {}
            }
        }
        None
    }

    /// Token index of the `>` closing a generic argument list starting at the
    /// current `<`, if the tokens read as type arguments followed by a token
    /// that may follow them in an expression.
    fn type_argument_end(&self) -> Option<usize> {
        let start = self.significant_index(0)?;
        let mut depth = 0usize;
        for (index, token) in self.tokens.iter().enumerate().skip(start) {
            let kind = token.kind;
            if kind.is_trivia() {
                continue;
            }
            match kind {
                CsSyntaxKind::Lt => depth += 1,
                CsSyntaxKind::Gt => {
                    depth -= 1;
                    if depth == 0 {
                        let follows = self.kind_after(index);
                        return match follows {
                            None => Some(index),
                            Some(next) if follows_type_arguments(next) => Some(index),
                            Some(_) => None,
                        };
                    }
                }
                CsSyntaxKind::Identifier
                | CsSyntaxKind::Comma
                | CsSyntaxKind::Dot
                | CsSyntaxKind::ColonColon
                | CsSyntaxKind::Question
                | CsSyntaxKind::LBracket
                | CsSyntaxKind::RBracket
                | CsSyntaxKind::Star => {}
                other if other.is_predefined_type() => {}
                _ => return None,
            }
        }
        None
    }

    fn bump_trivia(&mut self) {
        while let Some(token) = self.tokens.get(self.pos) {
            if !token.kind.is_trivia() {
                break;
            }
            self.builder.add_token(token);
            self.pos += 1;
        }
    }

    /// Whitespace and comments up to and including the next line break
    fn bump_trailing_trivia(&mut self) {
        while let Some(token) = self.tokens.get(self.pos) {
            match token.kind {
                CsSyntaxKind::Whitespace
                | CsSyntaxKind::SingleLineComment
                | CsSyntaxKind::MultiLineComment => {
                    self.builder.add_token(token);
                    self.pos += 1;
                }
                CsSyntaxKind::Newline => {
                    self.builder.add_token(token);
                    self.pos += 1;
                    break;
                }
                _ => break,
            }
        }
    }

    /// Emit leading trivia and the next significant token
    fn bump(&mut self) {
        self.bump_trivia();
        if let Some(token) = self.tokens.get(self.pos) {
            self.builder.add_token(token);
            self.pos += 1;
        }
    }

    /// Emit every token up to and including token index `end`
    fn bump_through(&mut self, end: usize) {
        while self.pos <= end && self.pos < self.tokens.len() {
            self.builder.add_token(&self.tokens[self.pos]);
            self.pos += 1;
        }
    }

    /// Emit a balanced `open ... close` run starting at the current token
    fn bump_balanced(&mut self, open: CsSyntaxKind, close: CsSyntaxKind) {
        let mut depth = 0usize;
        while let Some(kind) = self.peek() {
            if kind == open {
                depth += 1;
            } else if kind == close {
                depth = depth.saturating_sub(1);
            } else if depth == 0 {
                break;
            }
            self.bump();
            if depth == 0 {
                break;
            }
        }
    }

    fn expect(&mut self, kind: CsSyntaxKind) {
        if self.at(kind) {
            self.bump();
        } else {
            let expected = kind.fixed_text().map_or_else(
                || format!("{kind:?}"),
                |text| format!("'{text}'"),
            );
            self.error(&format!("expected {expected}"));
        }
    }

    fn error(&mut self, message: &str) {
        let span = self
            .significant_index(0)
            .map(|index| self.tokens[index].span.clone())
            .unwrap_or_else(|| {
                let end = self.tokens.last().map_or(0, |token| token.span.end);
                end..end
            });
        self.errors.push(ParseError {
            kind: ParseErrorKind::Syntax,
            message: message.to_string(),
            span,
        });
    }

    fn error_and_bump(&mut self, message: &str) {
        self.bump_trivia();
        self.error(message);
        self.builder.start_node(CsSyntaxKind::Error);
        self.bump();
        self.builder.finish_node();
    }
}

fn can_start_type(kind: CsSyntaxKind) -> bool {
    kind == CsSyntaxKind::Identifier || kind == CsSyntaxKind::LParen || kind.is_predefined_type()
}

fn follows_type_arguments(kind: CsSyntaxKind) -> bool {
    matches!(
        kind,
        CsSyntaxKind::LParen
            | CsSyntaxKind::RParen
            | CsSyntaxKind::RBracket
            | CsSyntaxKind::RBrace
            | CsSyntaxKind::LBrace
            | CsSyntaxKind::Colon
            | CsSyntaxKind::Semicolon
            | CsSyntaxKind::Comma
            | CsSyntaxKind::Dot
            | CsSyntaxKind::Question
            | CsSyntaxKind::EqEq
            | CsSyntaxKind::BangEq
            | CsSyntaxKind::Pipe
            | CsSyntaxKind::Caret
            | CsSyntaxKind::AmpAmp
            | CsSyntaxKind::PipePipe
            | CsSyntaxKind::Amp
            | CsSyntaxKind::LBracket
            | CsSyntaxKind::Gt
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::CsSyntaxNodeExt;

    fn parse(source: &str) -> Parse {
        parse_csharp(source, &PreprocessorSymbols::new())
    }

    fn kinds_under(node: &CsSyntaxNode) -> Vec<CsSyntaxKind> {
        node.children().map(|child| child.kind()).collect()
    }

    #[test]
    fn test_round_trip_preserves_source() {
        let source = r#"using System;
using System.Linq;

namespace IngameScript
{
    /// <summary>Entry point</summary>
    partial class Program : MyGridProgram
    {
        #region fields
        readonly List<IMyTerminalBlock> _blocks = new List<IMyTerminalBlock>(), _other;
        int Count { get; set; } = 3;
        #endregion

        public Program()
        {
            Runtime.UpdateFrequency = UpdateFrequency.Update10;
        }

        public void Main(string argument, UpdateType updateSource)
        {
            var text = $"Count: {Count,5} {(Count > 1 ? "many" : "one")}";
            Echo(text);
        }

        T Get<T>(int index) where T : class => _blocks[index] as T;
        public static Vector operator +(Vector a, Vector b) { return a; }
        string this[int i] => i.ToString();
        event Action Changed;
        ~Program() { }
    }

    enum Mode : byte { Idle = 0, Busy, }
    delegate void Handler(object sender);
    interface IThing { void Do(); }
    struct Point { public int X, Y; }
}
"#;
        let parse = parse(source);
        assert!(parse.errors().is_empty(), "{:?}", parse.errors());
        assert_eq!(parse.syntax().text().to_string(), source);
    }

    #[test]
    fn test_compilation_unit_structure() {
        let parse = parse("using System;\nnamespace A { class B { } }\n");
        let root = parse.syntax();
        assert_eq!(root.kind(), CsSyntaxKind::CompilationUnit);
        assert_eq!(
            kinds_under(&root),
            vec![
                CsSyntaxKind::UsingDirective,
                CsSyntaxKind::NamespaceDeclaration
            ]
        );
        let namespace = root
            .child_of_kind(CsSyntaxKind::NamespaceDeclaration)
            .unwrap();
        assert!(namespace.child_of_kind(CsSyntaxKind::ClassDeclaration).is_some());
    }

    #[test]
    fn test_using_owns_trailing_newline() {
        let parse = parse("using System; // core\n\nclass A { }");
        let using = parse
            .syntax()
            .child_of_kind(CsSyntaxKind::UsingDirective)
            .unwrap();
        assert_eq!(using.text().to_string(), "using System; // core\n");
    }

    #[test]
    fn test_member_kinds() {
        let parse = parse(
            "class P { int a; int B { get; } void C() { } P() { } ~P() { } int this[int i] { get { return i; } } event System.Action E; }",
        );
        assert!(parse.errors().is_empty(), "{:?}", parse.errors());
        let class = parse
            .syntax()
            .child_of_kind(CsSyntaxKind::ClassDeclaration)
            .unwrap();
        assert_eq!(
            kinds_under(&class),
            vec![
                CsSyntaxKind::FieldDeclaration,
                CsSyntaxKind::PropertyDeclaration,
                CsSyntaxKind::MethodDeclaration,
                CsSyntaxKind::ConstructorDeclaration,
                CsSyntaxKind::DestructorDeclaration,
                CsSyntaxKind::IndexerDeclaration,
                CsSyntaxKind::EventDeclaration,
            ]
        );
    }

    #[test]
    fn test_region_directives_are_member_siblings() {
        let parse = parse("class P\n{\n    #region mdk preserve\n    int a;\n    #endregion\n}\n");
        let class = parse
            .syntax()
            .child_of_kind(CsSyntaxKind::ClassDeclaration)
            .unwrap();
        let directives: Vec<String> = class
            .children_with_tokens()
            .filter_map(|element| element.into_token())
            .filter(|token| token.kind() == CsSyntaxKind::PreprocessorDirective)
            .map(|token| token.text().to_string())
            .collect();
        assert_eq!(directives, vec!["#region mdk preserve", "#endregion"]);
    }

    #[test]
    fn test_generic_initializer_commas() {
        let parse = parse("class P { Dictionary<int, string> d = new Dictionary<int, string>(), e; }");
        assert!(parse.errors().is_empty(), "{:?}", parse.errors());
        let field = parse
            .syntax()
            .descendants()
            .find(|node| node.kind() == CsSyntaxKind::FieldDeclaration)
            .unwrap();
        assert_eq!(
            field.children_of_kind(CsSyntaxKind::VariableDeclarator).len(),
            2
        );
    }

    #[test]
    fn test_explicit_interface_member() {
        let parse = parse("class P : IEnumerable { IEnumerator IEnumerable.GetEnumerator() => null; }");
        assert!(parse.errors().is_empty(), "{:?}", parse.errors());
        let method = parse
            .syntax()
            .descendants()
            .find(|node| node.kind() == CsSyntaxKind::MethodDeclaration)
            .unwrap();
        assert!(method.text().to_string().contains("IEnumerable.GetEnumerator"));
    }

    #[test]
    fn test_nested_blocks() {
        let parse = parse("class P { void M() { if (x) { y(); } } }");
        let blocks = parse
            .syntax()
            .descendants()
            .filter(|node| node.kind() == CsSyntaxKind::Block)
            .count();
        assert_eq!(blocks, 2);
    }

    #[test]
    fn test_errors_are_reported_and_round_trip_holds() {
        let source = "class P { int ; }\n)";
        let parse = parse(source);
        assert!(!parse.errors().is_empty());
        assert_eq!(parse.syntax().text().to_string(), source);
    }

    #[test]
    fn test_file_scoped_namespace() {
        let parse = parse("namespace A;\nclass B { }\n");
        assert!(parse.errors().is_empty(), "{:?}", parse.errors());
        let namespace = parse
            .syntax()
            .child_of_kind(CsSyntaxKind::NamespaceDeclaration)
            .unwrap();
        assert!(namespace.child_of_kind(CsSyntaxKind::ClassDeclaration).is_some());
    }
}
