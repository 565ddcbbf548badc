//! Batched tree edits with structural sharing
//!
//! Edits are recorded against the red tree of one document and applied in a
//! single rebuild. Subtrees without edits are reused as-is, so the new tree
//! shares every untouched green node with the original.

use std::collections::{BTreeSet, HashMap};

use rowan::{GreenNode, NodeOrToken, TextRange, TextSize};

use super::nodes::{GreenElement, green_node, green_token};
use super::trivia::attached_trivia;
use super::{CsSyntaxKind, CsSyntaxNode, CsSyntaxToken};

#[derive(Debug, Clone)]
enum Edit {
    Remove,
    Replace(Vec<GreenElement>),
}

/// A set of pending token and node edits
#[derive(Debug, Clone, Default)]
pub struct TreeEdit {
    tokens: HashMap<TextSize, Edit>,
    nodes: HashMap<(TextRange, CsSyntaxKind), Edit>,
    starts: BTreeSet<TextSize>,
}

impl TreeEdit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty() && self.nodes.is_empty()
    }

    /// Number of recorded edits
    pub fn len(&self) -> usize {
        self.tokens.len() + self.nodes.len()
    }

    pub fn remove_token(&mut self, token: &CsSyntaxToken) {
        self.record_token(token, Edit::Remove);
    }

    /// Replace the token's text, keeping its kind
    pub fn replace_token_text(&mut self, token: &CsSyntaxToken, text: &str) {
        if text.is_empty() {
            self.remove_token(token);
        } else {
            self.record_token(token, Edit::Replace(vec![green_token(token.kind(), text)]));
        }
    }

    /// Replace the token with arbitrary elements
    pub fn replace_token(&mut self, token: &CsSyntaxToken, elements: Vec<GreenElement>) {
        self.record_token(token, Edit::Replace(elements));
    }

    pub fn remove_node(&mut self, node: &CsSyntaxNode) {
        self.record_node(node, Edit::Remove);
    }

    /// Replace the node with arbitrary elements (splicing them into the parent)
    pub fn replace_node(&mut self, node: &CsSyntaxNode, elements: Vec<GreenElement>) {
        self.record_node(node, Edit::Replace(elements));
    }

    /// Remove a declaration together with its indentation and the comment
    /// lines directly above it
    pub fn remove_declaration(&mut self, node: &CsSyntaxNode) {
        for token in attached_trivia(node) {
            self.remove_token(&token);
        }
        self.remove_node(node);
    }

    fn record_token(&mut self, token: &CsSyntaxToken, edit: Edit) {
        let start = token.text_range().start();
        self.starts.insert(start);
        self.tokens.insert(start, edit);
    }

    fn record_node(&mut self, node: &CsSyntaxNode, edit: Edit) {
        let range = node.text_range();
        self.starts.insert(range.start());
        self.nodes.insert((range, node.kind()), edit);
    }

    /// Apply the edits to `root` (which must be the tree they were recorded
    /// against) and return the new green root.
    pub fn apply(&self, root: &CsSyntaxNode) -> GreenNode {
        if self.is_empty() {
            return root.green().into_owned();
        }
        self.rebuild(root)
    }

    fn affects(&self, range: TextRange) -> bool {
        self.starts.range(range.start()..=range.end()).next().is_some()
    }

    fn rebuild(&self, node: &CsSyntaxNode) -> GreenNode {
        if !self.affects(node.text_range()) {
            return node.green().into_owned();
        }

        let mut children: Vec<GreenElement> = Vec::new();
        for child in node.children_with_tokens() {
            match child {
                NodeOrToken::Node(child) => {
                    match self.nodes.get(&(child.text_range(), child.kind())) {
                        Some(Edit::Remove) => {}
                        Some(Edit::Replace(elements)) => children.extend(elements.iter().cloned()),
                        None => children.push(NodeOrToken::Node(self.rebuild(&child))),
                    }
                }
                NodeOrToken::Token(token) => match self.tokens.get(&token.text_range().start()) {
                    Some(Edit::Remove) => {}
                    Some(Edit::Replace(elements)) => children.extend(elements.iter().cloned()),
                    None => children.push(NodeOrToken::Token(token.green().to_owned())),
                },
            }
        }
        green_node(node.kind(), children)
    }
}
