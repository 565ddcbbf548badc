//! Name-keyed reference graph

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, VisitMap};
use rowan::{NodeOrToken, WalkEvent};

use super::patterns::is_identifier;
use crate::cst::{CsSyntaxKind, CsSyntaxNode, CsSyntaxToken, interpolation_holes, lex_fragment};

/// Declarations (types or members) connected by the names they mention
#[derive(Debug, Default)]
pub(crate) struct SymbolGraph {
    graph: DiGraph<CsSyntaxNode, ()>,
    by_name: HashMap<String, Vec<NodeIndex>>,
}

impl SymbolGraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_symbol(&mut self, node: CsSyntaxNode) -> NodeIndex {
        self.graph.add_node(node)
    }

    /// Make `name` resolve to `symbol`
    pub(crate) fn register_name(&mut self, name: impl Into<String>, symbol: NodeIndex) {
        let entries = self.by_name.entry(name.into()).or_default();
        if !entries.contains(&symbol) {
            entries.push(symbol);
        }
    }

    /// `from` mentions `name`: link it to every symbol of that name
    pub(crate) fn add_reference(&mut self, from: NodeIndex, name: &str) {
        let Some(targets) = self.by_name.get(name) else {
            return;
        };
        for target in targets.clone() {
            if target != from {
                self.graph.update_edge(from, target, ());
            }
        }
    }

    pub(crate) fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) {
        if from != to {
            self.graph.update_edge(from, to, ());
        }
    }

    pub(crate) fn lookup(&self, name: &str) -> &[NodeIndex] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Breadth-first closure of `seeds`
    pub(crate) fn reachable_from(&self, seeds: &[NodeIndex]) -> HashSet<NodeIndex> {
        let mut reached = HashSet::new();
        let Some((first, rest)) = seeds.split_first() else {
            return reached;
        };
        let mut bfs = Bfs::new(&self.graph, *first);
        for seed in rest {
            if bfs.discovered.visit(*seed) {
                bfs.stack.push_back(*seed);
            }
        }
        while let Some(node) = bfs.next(&self.graph) {
            reached.insert(node);
        }
        reached
    }
}

/// Names mentioned inside `node`: identifiers, identifiers in interpolation
/// holes and string literals that look like identifiers. Subtrees for which
/// `skip` returns true are not visited (`node` itself always is).
pub(crate) fn referenced_names(
    node: &CsSyntaxNode,
    skip: impl Fn(&CsSyntaxNode) -> bool,
) -> Vec<String> {
    let mut names = Vec::new();
    let mut walk = node.preorder_with_tokens();
    while let Some(event) = walk.next() {
        match event {
            WalkEvent::Enter(NodeOrToken::Node(child)) => {
                if &child != node && skip(&child) {
                    walk.skip_subtree();
                }
            }
            WalkEvent::Enter(NodeOrToken::Token(token)) => names.extend(token_names(&token)),
            WalkEvent::Leave(_) => {}
        }
    }
    names
}

/// Names a single token mentions
pub(crate) fn token_names(token: &CsSyntaxToken) -> Vec<String> {
    match token.kind() {
        CsSyntaxKind::Identifier => vec![identifier_name(token.text()).to_string()],
        CsSyntaxKind::InterpolatedStringLiteral => hole_names(token.text()),
        CsSyntaxKind::StringLiteral | CsSyntaxKind::VerbatimStringLiteral => {
            string_content(token.text())
                .filter(|content| is_identifier(content))
                .map(|content| vec![content.to_string()])
                .unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

/// Identifiers inside the interpolation holes of a literal
fn hole_names(literal: &str) -> Vec<String> {
    let mut names = Vec::new();
    for hole in interpolation_holes(literal) {
        let (tokens, _) = lex_fragment(&literal[hole]);
        for token in tokens {
            match token.kind {
                CsSyntaxKind::Identifier => names.push(identifier_name(&token.text).to_string()),
                CsSyntaxKind::InterpolatedStringLiteral => names.extend(hole_names(&token.text)),
                _ => {}
            }
        }
    }
    names
}

/// `@class` names `class`
pub(crate) fn identifier_name(text: &str) -> &str {
    text.strip_prefix('@').unwrap_or(text)
}

/// Content of a regular or verbatim string literal without its quotes
pub(crate) fn string_content(text: &str) -> Option<&str> {
    let text = text.strip_prefix('@').unwrap_or(text);
    text.strip_prefix('"')?.strip_suffix('"')
}
