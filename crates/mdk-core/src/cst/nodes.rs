//! Type aliases and utilities for C# CST nodes
//!
//! These types are built on top of rowan's generic tree types, parameterized
//! with [`CsLanguage`].

use rowan::{GreenNode, GreenToken, NodeOrToken};

use super::{CsLanguage, CsSyntaxKind};

/// A node in the C# concrete syntax tree
pub type CsSyntaxNode = rowan::SyntaxNode<CsLanguage>;

/// A token in the C# concrete syntax tree
pub type CsSyntaxToken = rowan::SyntaxToken<CsLanguage>;

/// Either a node or a token
pub type CsSyntaxElement = rowan::SyntaxElement<CsLanguage>;

/// Owned green element, used when assembling new trees
pub type GreenElement = NodeOrToken<GreenNode, GreenToken>;

/// Extension trait for C# syntax nodes
pub trait CsSyntaxNodeExt {
    /// Check if this node is of a specific kind
    fn is_kind(&self, kind: CsSyntaxKind) -> bool;

    /// Find the first child node of a specific kind
    fn child_of_kind(&self, kind: CsSyntaxKind) -> Option<CsSyntaxNode>;

    /// Find all child nodes of a specific kind
    fn children_of_kind(&self, kind: CsSyntaxKind) -> Vec<CsSyntaxNode>;

    /// Find the first direct child token of a specific kind
    fn token_of_kind(&self, kind: CsSyntaxKind) -> Option<CsSyntaxToken>;

    /// Direct child tokens that carry meaning (no trivia, no annotations)
    fn significant_child_tokens(&self) -> Vec<CsSyntaxToken>;

    /// All descendant tokens that carry meaning, in document order
    fn significant_tokens(&self) -> Vec<CsSyntaxToken>;

    /// Render the node as source text, skipping annotation tokens
    fn render(&self) -> String;
}

impl CsSyntaxNodeExt for CsSyntaxNode {
    fn is_kind(&self, kind: CsSyntaxKind) -> bool {
        self.kind() == kind
    }

    fn child_of_kind(&self, kind: CsSyntaxKind) -> Option<CsSyntaxNode> {
        self.children().find(|child| child.kind() == kind)
    }

    fn children_of_kind(&self, kind: CsSyntaxKind) -> Vec<CsSyntaxNode> {
        self.children()
            .filter(|child| child.kind() == kind)
            .collect()
    }

    fn token_of_kind(&self, kind: CsSyntaxKind) -> Option<CsSyntaxToken> {
        self.children_with_tokens()
            .filter_map(|element| element.into_token())
            .find(|token| token.kind() == kind)
    }

    fn significant_child_tokens(&self) -> Vec<CsSyntaxToken> {
        self.children_with_tokens()
            .filter_map(|element| element.into_token())
            .filter(|token| token.kind().is_significant())
            .collect()
    }

    fn significant_tokens(&self) -> Vec<CsSyntaxToken> {
        self.descendants_with_tokens()
            .filter_map(|element| element.into_token())
            .filter(|token| token.kind().is_significant())
            .collect()
    }

    fn render(&self) -> String {
        let mut out = String::with_capacity(usize::from(self.text_range().len()));
        for token in self
            .descendants_with_tokens()
            .filter_map(|element| element.into_token())
        {
            if token.kind() != CsSyntaxKind::Annotation {
                out.push_str(token.text());
            }
        }
        out
    }
}

/// Extension trait for C# syntax tokens
pub trait CsSyntaxTokenExt {
    /// Check if this token is of a specific kind
    fn is_kind(&self, kind: CsSyntaxKind) -> bool;

    /// Check if this token is trivia
    fn is_trivia(&self) -> bool;

    /// Check if this token is an identifier with the given text
    fn is_ident(&self, text: &str) -> bool;

    /// Previous token that carries meaning
    fn prev_significant(&self) -> Option<CsSyntaxToken>;

    /// Next token that carries meaning
    fn next_significant(&self) -> Option<CsSyntaxToken>;
}

impl CsSyntaxTokenExt for CsSyntaxToken {
    fn is_kind(&self, kind: CsSyntaxKind) -> bool {
        self.kind() == kind
    }

    fn is_trivia(&self) -> bool {
        self.kind().is_trivia()
    }

    fn is_ident(&self, text: &str) -> bool {
        self.kind() == CsSyntaxKind::Identifier && self.text() == text
    }

    fn prev_significant(&self) -> Option<CsSyntaxToken> {
        let mut current = self.prev_token();
        while let Some(token) = current {
            if token.kind().is_significant() {
                return Some(token);
            }
            current = token.prev_token();
        }
        None
    }

    fn next_significant(&self) -> Option<CsSyntaxToken> {
        let mut current = self.next_token();
        while let Some(token) = current {
            if token.kind().is_significant() {
                return Some(token);
            }
            current = token.next_token();
        }
        None
    }
}

/// Render a green node, skipping annotation tokens
pub fn render_green(node: &rowan::GreenNodeData) -> String {
    let mut out = String::new();
    render_green_into(node, &mut out);
    out
}

fn render_green_into(node: &rowan::GreenNodeData, out: &mut String) {
    for child in node.children() {
        match child {
            NodeOrToken::Node(node) => render_green_into(node, out),
            NodeOrToken::Token(token) => {
                if token.kind() != rowan::SyntaxKind::from(CsSyntaxKind::Annotation) {
                    out.push_str(token.text());
                }
            }
        }
    }
}

/// Build a new green token
pub fn green_token(kind: CsSyntaxKind, text: &str) -> GreenElement {
    NodeOrToken::Token(GreenToken::new(kind.into(), text))
}

/// Build a new green node from owned children
pub fn green_node(kind: CsSyntaxKind, children: Vec<GreenElement>) -> GreenNode {
    GreenNode::new(kind.into(), children)
}

/// Copy a borrowed green child into an owned element
pub fn to_owned_element(
    element: NodeOrToken<&rowan::GreenNodeData, &rowan::GreenTokenData>,
) -> GreenElement {
    match element {
        NodeOrToken::Node(node) => NodeOrToken::Node(node.to_owned()),
        NodeOrToken::Token(token) => NodeOrToken::Token(token.to_owned()),
    }
}

/// Owned green element for a red element
pub fn element_green(element: &CsSyntaxElement) -> GreenElement {
    match element {
        NodeOrToken::Node(node) => NodeOrToken::Node(node.green().into_owned()),
        NodeOrToken::Token(token) => NodeOrToken::Token(token.green().to_owned()),
    }
}
