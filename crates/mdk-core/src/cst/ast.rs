//! Typed AST layer over CST
//!
//! This module provides ergonomic, type-safe wrappers over the raw CST nodes.
//! Each wrapper implements a `cast()` method to safely convert from CST nodes.
//!
//! # Example
//!
//! ```rust
//! use mdk_core::cst::{PreprocessorSymbols, parse_csharp};
//! use mdk_core::cst::ast::{AstNode, CompilationUnit};
//!
//! let parse = parse_csharp("using System;\nclass Program { }", &PreprocessorSymbols::new());
//! let unit = CompilationUnit::cast(parse.syntax()).unwrap();
//!
//! assert_eq!(unit.usings().next().unwrap().key(), "using System;");
//! assert_eq!(unit.types().next().unwrap().name().unwrap(), "Program");
//! ```

use super::{CsSyntaxKind, CsSyntaxNode, CsSyntaxNodeExt, CsSyntaxToken};

/// Helper trait for casting CST nodes to typed wrappers
pub trait AstNode: Sized {
    fn can_cast(kind: CsSyntaxKind) -> bool;
    fn cast(node: CsSyntaxNode) -> Option<Self>;
    fn syntax(&self) -> &CsSyntaxNode;
}

macro_rules! ast_node {
    ($(#[$meta:meta])* $name:ident, $($kind:ident)|+) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name {
            syntax: CsSyntaxNode,
        }

        impl AstNode for $name {
            fn can_cast(kind: CsSyntaxKind) -> bool {
                matches!(kind, $(CsSyntaxKind::$kind)|+)
            }

            fn cast(node: CsSyntaxNode) -> Option<Self> {
                if Self::can_cast(node.kind()) {
                    Some(Self { syntax: node })
                } else {
                    None
                }
            }

            fn syntax(&self) -> &CsSyntaxNode {
                &self.syntax
            }
        }
    };
}

ast_node!(
    /// Root of a source file
    CompilationUnit,
    CompilationUnit
);
ast_node!(
    /// `using ...;` or `extern alias ...;`
    UsingDirective,
    UsingDirective | ExternAlias
);
ast_node!(NamespaceDeclaration, NamespaceDeclaration);
ast_node!(
    /// Class, struct, interface, enum or delegate
    TypeDeclaration,
    ClassDeclaration | StructDeclaration | InterfaceDeclaration | EnumDeclaration | DelegateDeclaration
);
ast_node!(
    /// Field, property, indexer, method, constructor, destructor, operator,
    /// event or enum member
    MemberDeclaration,
    FieldDeclaration
        | PropertyDeclaration
        | IndexerDeclaration
        | MethodDeclaration
        | ConstructorDeclaration
        | DestructorDeclaration
        | OperatorDeclaration
        | EventDeclaration
        | EnumMember
);
ast_node!(AnnotatedRegion, AnnotatedRegion);

impl CompilationUnit {
    pub fn usings(&self) -> impl Iterator<Item = UsingDirective> + use<> {
        self.syntax.children().filter_map(UsingDirective::cast)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = NamespaceDeclaration> + use<> {
        declarations(&self.syntax)
            .into_iter()
            .filter_map(NamespaceDeclaration::cast)
    }

    /// Top-level type declarations (not those inside namespaces)
    pub fn types(&self) -> impl Iterator<Item = TypeDeclaration> + use<> {
        declarations(&self.syntax)
            .into_iter()
            .filter_map(TypeDeclaration::cast)
    }
}

impl UsingDirective {
    /// Normalized directive text used for deduplication: significant tokens
    /// joined without trivia, with a separating space after keywords.
    pub fn key(&self) -> String {
        let mut key = String::new();
        let mut previous_is_word = false;
        for token in self.syntax.significant_tokens() {
            let is_word = token.kind() == CsSyntaxKind::Identifier || token.kind().is_keyword();
            if previous_is_word && is_word {
                key.push(' ');
            }
            key.push_str(token.text());
            previous_is_word = is_word;
        }
        key
    }

    pub fn is_static(&self) -> bool {
        self.syntax.token_of_kind(CsSyntaxKind::StaticKw).is_some()
    }

    /// Alias name for `using Alias = Some.Type;`
    pub fn alias(&self) -> Option<String> {
        let tokens = self.syntax.significant_child_tokens();
        match tokens.as_slice() {
            [using, alias, eq, ..]
                if using.kind() == CsSyntaxKind::UsingKw
                    && alias.kind() == CsSyntaxKind::Identifier
                    && eq.kind() == CsSyntaxKind::Eq =>
            {
                Some(alias.text().to_string())
            }
            _ => None,
        }
    }
}

impl NamespaceDeclaration {
    /// Dotted namespace name
    pub fn name(&self) -> String {
        let mut name = String::new();
        for token in self.syntax.significant_child_tokens().into_iter().skip(1) {
            match token.kind() {
                CsSyntaxKind::Identifier | CsSyntaxKind::Dot => name.push_str(token.text()),
                _ => break,
            }
        }
        name
    }

    pub fn is_file_scoped(&self) -> bool {
        self.syntax.token_of_kind(CsSyntaxKind::LBrace).is_none()
    }

    pub fn usings(&self) -> impl Iterator<Item = UsingDirective> + use<> {
        self.syntax.children().filter_map(UsingDirective::cast)
    }

    pub fn types(&self) -> impl Iterator<Item = TypeDeclaration> + use<> {
        declarations(&self.syntax)
            .into_iter()
            .filter_map(TypeDeclaration::cast)
    }
}

impl TypeDeclaration {
    pub fn kind(&self) -> CsSyntaxKind {
        self.syntax.kind()
    }

    pub fn name(&self) -> Option<String> {
        self.name_token().map(|token| token.text().to_string())
    }

    pub fn name_token(&self) -> Option<CsSyntaxToken> {
        declared_name_tokens(&self.syntax).into_iter().next()
    }

    pub fn modifiers(&self) -> Vec<CsSyntaxToken> {
        modifier_tokens(&self.syntax)
    }

    pub fn has_modifier(&self, kind: CsSyntaxKind) -> bool {
        has_modifier(&self.syntax, kind)
    }

    pub fn base_list(&self) -> Option<CsSyntaxNode> {
        self.syntax.child_of_kind(CsSyntaxKind::BaseList)
    }

    /// Type parameter names (`T`, `TKey`, ...)
    pub fn type_parameters(&self) -> Vec<CsSyntaxToken> {
        type_parameter_tokens(&self.syntax)
    }

    /// Member declarations, looking through annotated regions
    pub fn members(&self) -> impl Iterator<Item = MemberDeclaration> + use<> {
        declarations(&self.syntax)
            .into_iter()
            .filter_map(MemberDeclaration::cast)
    }

    /// Nested type declarations, looking through annotated regions
    pub fn nested_types(&self) -> impl Iterator<Item = TypeDeclaration> + use<> {
        declarations(&self.syntax)
            .into_iter()
            .filter_map(TypeDeclaration::cast)
    }

    /// Names of enclosing types and namespaces followed by this type's name
    pub fn qualified_path(&self) -> Vec<String> {
        let mut path: Vec<String> = self
            .syntax
            .ancestors()
            .skip(1)
            .filter_map(|ancestor| {
                if let Some(namespace) = NamespaceDeclaration::cast(ancestor.clone()) {
                    Some(namespace.name().split('.').map(str::to_string).collect::<Vec<_>>())
                } else {
                    TypeDeclaration::cast(ancestor)
                        .and_then(|ty| ty.name())
                        .map(|name| vec![name])
                }
            })
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .flatten()
            .collect();
        if let Some(name) = self.name() {
            path.push(name);
        }
        path
    }
}

impl MemberDeclaration {
    pub fn kind(&self) -> CsSyntaxKind {
        self.syntax.kind()
    }

    /// Declared names; fields and event fields may declare several
    pub fn names(&self) -> Vec<String> {
        self.name_tokens()
            .iter()
            .map(|token| token.text().to_string())
            .collect()
    }

    pub fn name_tokens(&self) -> Vec<CsSyntaxToken> {
        declared_name_tokens(&self.syntax)
    }

    pub fn modifiers(&self) -> Vec<CsSyntaxToken> {
        modifier_tokens(&self.syntax)
    }

    pub fn has_modifier(&self, kind: CsSyntaxKind) -> bool {
        has_modifier(&self.syntax, kind)
    }

    /// `void IFoo.Bar()` style implementations
    pub fn is_explicit_interface(&self) -> bool {
        for element in self.syntax.children_with_tokens() {
            match element {
                rowan::NodeOrToken::Token(token) if token.kind() == CsSyntaxKind::Dot => {
                    return true;
                }
                rowan::NodeOrToken::Node(node) if is_header_end(node.kind()) => return false,
                rowan::NodeOrToken::Token(token) if is_header_end_token(token.kind()) => {
                    return false;
                }
                _ => {}
            }
        }
        false
    }

    pub fn type_parameters(&self) -> Vec<CsSyntaxToken> {
        type_parameter_tokens(&self.syntax)
    }

    /// Parameter name tokens
    pub fn parameters(&self) -> Vec<CsSyntaxToken> {
        self.syntax
            .child_of_kind(CsSyntaxKind::ParameterList)
            .map(|list| {
                list.children_of_kind(CsSyntaxKind::Parameter)
                    .iter()
                    .filter_map(|parameter| parameter.token_of_kind(CsSyntaxKind::Identifier))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl AnnotatedRegion {
    /// Tags carried by this region, enclosing regions' tags first
    pub fn tags(&self) -> Vec<String> {
        self.syntax
            .token_of_kind(CsSyntaxKind::Annotation)
            .map(|token| token.text().split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// Type, member and namespace declarations directly inside `node`, looking
/// through annotated regions.
pub fn declarations(node: &CsSyntaxNode) -> Vec<CsSyntaxNode> {
    let mut found = Vec::new();
    for child in node.children() {
        let kind = child.kind();
        if kind == CsSyntaxKind::AnnotatedRegion {
            found.extend(declarations(&child));
        } else if kind.is_type_declaration()
            || kind.is_member_declaration()
            || kind == CsSyntaxKind::EnumMember
            || kind == CsSyntaxKind::NamespaceDeclaration
        {
            found.push(child);
        }
    }
    found
}

/// Name tokens introduced by a declaration node
pub fn declared_name_tokens(node: &CsSyntaxNode) -> Vec<CsSyntaxToken> {
    let declarators = node.children_of_kind(CsSyntaxKind::VariableDeclarator);
    if !declarators.is_empty() {
        return declarators
            .iter()
            .filter_map(|declarator| declarator.token_of_kind(CsSyntaxKind::Identifier))
            .collect();
    }

    match node.kind() {
        CsSyntaxKind::IndexerDeclaration | CsSyntaxKind::OperatorDeclaration => {
            return Vec::new();
        }
        CsSyntaxKind::EnumMember => {
            return node
                .token_of_kind(CsSyntaxKind::Identifier)
                .into_iter()
                .collect();
        }
        _ => {}
    }

    let mut last = None;
    for element in node.children_with_tokens() {
        match element {
            rowan::NodeOrToken::Node(child) if is_header_end(child.kind()) => break,
            rowan::NodeOrToken::Token(token) if is_header_end_token(token.kind()) => break,
            rowan::NodeOrToken::Token(token) if token.kind() == CsSyntaxKind::Identifier => {
                last = Some(token);
            }
            _ => {}
        }
    }
    last.into_iter().collect()
}

fn is_header_end(kind: CsSyntaxKind) -> bool {
    matches!(
        kind,
        CsSyntaxKind::TypeParameterList
            | CsSyntaxKind::ParameterList
            | CsSyntaxKind::BaseList
            | CsSyntaxKind::ConstraintClause
            | CsSyntaxKind::AccessorList
            | CsSyntaxKind::ArrowExpression
            | CsSyntaxKind::Block
            | CsSyntaxKind::EqualsValue
    )
}

fn is_header_end_token(kind: CsSyntaxKind) -> bool {
    matches!(
        kind,
        CsSyntaxKind::LBrace | CsSyntaxKind::Semicolon | CsSyntaxKind::FatArrow | CsSyntaxKind::Eq
    )
}

/// Modifier keywords (and contextual modifiers such as `partial`)
pub fn modifier_tokens(node: &CsSyntaxNode) -> Vec<CsSyntaxToken> {
    let mut modifiers = Vec::new();
    for element in node.children_with_tokens() {
        match element {
            rowan::NodeOrToken::Node(child) if child.kind() == CsSyntaxKind::AttributeList => {}
            rowan::NodeOrToken::Node(_) => break,
            rowan::NodeOrToken::Token(token) => {
                let kind = token.kind();
                if kind.is_trivia() {
                    continue;
                }
                let contextual = kind == CsSyntaxKind::Identifier
                    && matches!(token.text(), "partial" | "async" | "required" | "file")
                    && !is_last_identifier(&token);
                if kind.is_modifier() || contextual {
                    modifiers.push(token);
                } else {
                    break;
                }
            }
        }
    }
    modifiers
}

fn is_last_identifier(token: &CsSyntaxToken) -> bool {
    let mut current = token.next_sibling_or_token();
    while let Some(element) = current {
        match &element {
            rowan::NodeOrToken::Token(next) if next.kind().is_trivia() => {}
            rowan::NodeOrToken::Token(next) => {
                return !(next.kind() == CsSyntaxKind::Identifier || next.kind().is_keyword());
            }
            rowan::NodeOrToken::Node(_) => return false,
        }
        current = element.next_sibling_or_token();
    }
    true
}

fn has_modifier(node: &CsSyntaxNode, kind: CsSyntaxKind) -> bool {
    modifier_tokens(node).iter().any(|token| token.kind() == kind)
}

fn type_parameter_tokens(node: &CsSyntaxNode) -> Vec<CsSyntaxToken> {
    node.child_of_kind(CsSyntaxKind::TypeParameterList)
        .map(|list| {
            list.significant_child_tokens()
                .into_iter()
                .filter(|token| token.kind() == CsSyntaxKind::Identifier)
                .collect()
        })
        .unwrap_or_default()
}

/// Annotation tags in effect for `node`: the tags of the nearest enclosing
/// annotated region (which already include its ancestors' tags).
pub fn annotation_tags(node: &CsSyntaxNode) -> Vec<String> {
    node.ancestors()
        .find_map(AnnotatedRegion::cast)
        .map(|region| region.tags())
        .unwrap_or_default()
}

/// True when `node` sits inside a region tagged `tag`
pub fn has_annotation(node: &CsSyntaxNode, tag: &str) -> bool {
    annotation_tags(node).iter().any(|candidate| candidate == tag)
}

/// Same as [`has_annotation`] for a token
pub fn token_has_annotation(token: &CsSyntaxToken, tag: &str) -> bool {
    token
        .parent()
        .is_some_and(|parent| has_annotation(&parent, tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::{PreprocessorSymbols, parse_csharp};

    fn unit(source: &str) -> CompilationUnit {
        CompilationUnit::cast(parse_csharp(source, &PreprocessorSymbols::new()).syntax()).unwrap()
    }

    #[test]
    fn test_using_keys() {
        let unit = unit("using  System . Linq ;\nusing static System.Math;\nusing V = Some.Vector;\n");
        let keys: Vec<String> = unit.usings().map(|using| using.key()).collect();
        assert_eq!(
            keys,
            vec![
                "using System.Linq;",
                "using static System.Math;",
                "using V=Some.Vector;"
            ]
        );
        let usings: Vec<UsingDirective> = unit.usings().collect();
        assert!(usings[1].is_static());
        assert_eq!(usings[2].alias().as_deref(), Some("V"));
    }

    #[test]
    fn test_type_names_and_members() {
        let unit = unit(
            "public partial class Program : MyGridProgram { int a, b; public void Main() { } Program() { } class Nested { } }",
        );
        let program = unit.types().next().unwrap();
        assert_eq!(program.name().as_deref(), Some("Program"));
        assert!(program.base_list().is_some());
        assert!(program.has_modifier(CsSyntaxKind::PublicKw));
        let modifier_texts: Vec<String> =
            program.modifiers().iter().map(|token| token.text().to_string()).collect();
        assert_eq!(modifier_texts, vec!["public", "partial"]);

        let members: Vec<MemberDeclaration> = program.members().collect();
        assert_eq!(members[0].names(), vec!["a", "b"]);
        assert_eq!(members[1].names(), vec!["Main"]);
        assert!(members[1].has_modifier(CsSyntaxKind::PublicKw));
        assert_eq!(members[2].kind(), CsSyntaxKind::ConstructorDeclaration);
        assert_eq!(program.nested_types().next().unwrap().name().as_deref(), Some("Nested"));
    }

    #[test]
    fn test_qualified_path() {
        let unit = unit("namespace A.B { class Outer { class Inner { } } }");
        let namespace = unit.namespaces().next().unwrap();
        assert_eq!(namespace.name(), "A.B");
        let outer = namespace.types().next().unwrap();
        let inner = outer.nested_types().next().unwrap();
        assert_eq!(inner.qualified_path(), vec!["A", "B", "Outer", "Inner"]);
    }

    #[test]
    fn test_explicit_interface_and_parameters() {
        let unit = unit("class C { void IFoo.Bar(int x, ref string y) { } T Get<T>() => default; }");
        let members: Vec<MemberDeclaration> = unit.types().next().unwrap().members().collect();
        assert!(members[0].is_explicit_interface());
        assert_eq!(members[0].names(), vec!["Bar"]);
        let parameters: Vec<String> = members[0]
            .parameters()
            .iter()
            .map(|token| token.text().to_string())
            .collect();
        assert_eq!(parameters, vec!["x", "y"]);
        assert!(!members[1].is_explicit_interface());
        assert_eq!(members[1].type_parameters()[0].text(), "T");
    }
}
