//! Namespace flattening

use std::collections::HashSet;

use rowan::NodeOrToken;
use tracing::debug;

use crate::cst::ast::{AstNode, UsingDirective};
use crate::cst::{CsSyntaxElement, CsSyntaxKind, CsSyntaxNode, GreenElement, green_node, green_token};
use crate::pipeline::{DocumentProcessor, PackContext, Processor};
use crate::project::Document;
use crate::result::Result;

/// Unwraps every namespace declaration so that its members become top-level
/// declarations of the script. Usings declared inside namespaces move up to
/// the top-level using block.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamespaceFlattener;

impl Processor for NamespaceFlattener {
    fn name(&self) -> &str {
        "namespace-flattener"
    }
}

impl DocumentProcessor for NamespaceFlattener {
    fn process(&self, document: Document, context: &PackContext) -> Result<Document> {
        if !context.options().flatten_namespaces {
            return Ok(document);
        }
        let root = document.syntax();
        let has_namespaces = root
            .descendants()
            .any(|node| node.kind() == CsSyntaxKind::NamespaceDeclaration);
        if !has_namespaces {
            return Ok(document);
        }

        let mut hoisted: Vec<CsSyntaxNode> = Vec::new();
        let mut children: Vec<GreenElement> = Vec::new();
        let mut after_last_using = 0;
        let mut seen: HashSet<String> = HashSet::new();

        for child in root.children_with_tokens() {
            match &child {
                NodeOrToken::Node(node) if UsingDirective::can_cast(node.kind()) => {
                    if let Some(using) = UsingDirective::cast(node.clone()) {
                        seen.insert(using.key());
                    }
                    children.push(NodeOrToken::Node(node.green().into_owned()));
                    after_last_using = children.len();
                }
                _ => children.extend(flatten(std::iter::once(child), &mut hoisted)),
            }
        }

        let mut usings: Vec<GreenElement> = Vec::new();
        for node in hoisted {
            let Some(using) = UsingDirective::cast(node.clone()) else {
                continue;
            };
            if !seen.insert(using.key()) {
                continue;
            }
            usings.push(NodeOrToken::Node(node.green().into_owned()));
            if node.last_token().is_none_or(|token| token.kind() != CsSyntaxKind::Newline) {
                usings.push(green_token(CsSyntaxKind::Newline, "\n"));
            }
        }
        debug!("Flattened namespaces, hoisted {} using(s)", usings.len());
        children.splice(after_last_using..after_last_using, usings);

        Ok(document.with_root(green_node(CsSyntaxKind::CompilationUnit, children)))
    }
}

/// Flatten namespaces among `elements`, collecting usings found inside
/// namespaces into `hoisted`
fn flatten(
    elements: impl Iterator<Item = CsSyntaxElement>,
    hoisted: &mut Vec<CsSyntaxNode>,
) -> Vec<GreenElement> {
    let mut out: Vec<GreenElement> = Vec::new();
    let mut pending: Vec<CsSyntaxElement> = Vec::new();

    for element in elements {
        let node = match element {
            NodeOrToken::Token(_) => {
                pending.push(element);
                continue;
            }
            NodeOrToken::Node(node) => node,
        };
        match node.kind() {
            CsSyntaxKind::NamespaceDeclaration => {
                // the namespace's own indentation goes with its header
                while pending
                    .last()
                    .is_some_and(|last| last.kind() == CsSyntaxKind::Whitespace)
                {
                    pending.pop();
                }
                out.extend(pending.drain(..).map(|element| to_green(&element)));
                let body = namespace_body(&node);
                out.extend(flatten_inside(body.into_iter(), hoisted));
            }
            CsSyntaxKind::AnnotatedRegion => {
                out.extend(pending.drain(..).map(|element| to_green(&element)));
                let inner = flatten(node.children_with_tokens(), hoisted);
                out.push(NodeOrToken::Node(green_node(CsSyntaxKind::AnnotatedRegion, inner)));
            }
            _ => {
                out.extend(pending.drain(..).map(|element| to_green(&element)));
                out.push(NodeOrToken::Node(node.green().into_owned()));
            }
        }
    }
    out.extend(pending.iter().map(to_green));
    out
}

/// Flatten the body of a namespace, where usings are hoisted
fn flatten_inside(
    elements: impl Iterator<Item = CsSyntaxElement>,
    hoisted: &mut Vec<CsSyntaxNode>,
) -> Vec<GreenElement> {
    let mut kept: Vec<CsSyntaxElement> = Vec::new();
    for element in elements {
        match &element {
            NodeOrToken::Node(node) if UsingDirective::can_cast(node.kind()) => {
                // drop the using's indentation
                while kept
                    .last()
                    .is_some_and(|last| last.kind() == CsSyntaxKind::Whitespace)
                {
                    kept.pop();
                }
                hoisted.push(node.clone());
            }
            _ => kept.push(element),
        }
    }
    flatten(kept.into_iter(), hoisted)
}

/// Children between the namespace header and its closing brace
fn namespace_body(node: &CsSyntaxNode) -> Vec<CsSyntaxElement> {
    let children: Vec<CsSyntaxElement> = node.children_with_tokens().collect();
    let is_token = |element: &CsSyntaxElement, kind: CsSyntaxKind| {
        matches!(element, NodeOrToken::Token(token) if token.kind() == kind)
    };

    let header_end = children
        .iter()
        .position(|element| is_token(element, CsSyntaxKind::LBrace))
        .or_else(|| {
            children
                .iter()
                .position(|element| is_token(element, CsSyntaxKind::Semicolon))
        });
    let Some(header_end) = header_end else {
        return Vec::new();
    };
    let braced = is_token(&children[header_end], CsSyntaxKind::LBrace);

    // trailing whitespace and line break of the header line
    let mut start = header_end + 1;
    while start < children.len() && is_token(&children[start], CsSyntaxKind::Whitespace) {
        start += 1;
    }
    if start < children.len() && is_token(&children[start], CsSyntaxKind::Newline) {
        start += 1;
    }

    let mut end = if braced {
        children
            .iter()
            .rposition(|element| is_token(element, CsSyntaxKind::RBrace))
            .unwrap_or(children.len())
    } else {
        children.len()
    };
    end = end.max(start);
    while braced && end > start && is_token(&children[end - 1], CsSyntaxKind::Whitespace) {
        end -= 1;
    }
    children[start..end].to_vec()
}

fn to_green(element: &CsSyntaxElement) -> GreenElement {
    crate::cst::element_green(element)
}
