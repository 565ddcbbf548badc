//! Reachability-based removal of unused types and members
//!
//! Types (and, with `trim_members`, members) that cannot be reached from an
//! entry rule or a `preserve` annotation are deleted from the merged
//! document. References are name based: any identifier, interpolation hole
//! or identifier-like string literal mentioning a declared name keeps every
//! declaration of that name alive.

mod graph;
mod patterns;

pub use patterns::{PatternError, SymbolPattern};

pub(crate) use graph::{identifier_name, string_content, token_names};
pub(crate) use patterns::is_identifier;

use std::collections::HashSet;

use petgraph::graph::NodeIndex;
use tracing::{debug, info, warn};

use graph::{SymbolGraph, referenced_names};

use crate::cst::ast::{AstNode, MemberDeclaration, TypeDeclaration, has_annotation};
use crate::cst::{CsSyntaxKind, CsSyntaxNode, TreeEdit};
use crate::pipeline::{DocumentProcessor, PackContext, Processor};
use crate::project::Document;
use crate::result::Result;

/// Annotation tag that protects declarations from trimming and renaming
pub const PRESERVE_TAG: &str = "preserve";

/// Removes unreachable types and, optionally, unreachable members
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeTrimmer;

impl Processor for TypeTrimmer {
    fn name(&self) -> &str {
        "type-trimmer"
    }
}

impl DocumentProcessor for TypeTrimmer {
    fn process(&self, document: Document, context: &PackContext) -> Result<Document> {
        let options = context.options();
        if !options.trim && !options.trim_members {
            return Ok(document);
        }
        let root = document.syntax();
        let rules = &options.entry_points;

        let types: Vec<TypeDeclaration> = root.descendants().filter_map(TypeDeclaration::cast).collect();
        let (graph, indices) = type_graph(&types);

        let mut seeds = Vec::new();
        for (ty, index) in types.iter().zip(&indices) {
            if is_type_seed(ty, rules) {
                seeds.push(*index);
            }
        }
        if seeds.is_empty() {
            warn!("No entry point or preserved declaration found; nothing is trimmed");
            return Ok(document);
        }

        let reachable = graph.reachable_from(&seeds);
        let mut edit = TreeEdit::new();
        let mut removed_types = 0usize;
        for (ty, index) in types.iter().zip(&indices) {
            if reachable.contains(index) {
                continue;
            }
            // removing the outermost unreachable type takes its nested types
            let inside_removed = ty
                .syntax()
                .ancestors()
                .skip(1)
                .filter_map(TypeDeclaration::cast)
                .any(|outer| {
                    types
                        .iter()
                        .position(|candidate| candidate == &outer)
                        .is_some_and(|position| !reachable.contains(&indices[position]))
                });
            if !inside_removed {
                debug!("Removing unreachable type {}", ty.qualified_path().join("."));
                edit.remove_declaration(ty.syntax());
                removed_types += 1;
            }
        }

        let mut removed_members = 0usize;
        if options.trim_members {
            let kept: Vec<&TypeDeclaration> = types
                .iter()
                .zip(&indices)
                .filter(|(_, index)| reachable.contains(*index))
                .map(|(ty, _)| ty)
                .collect();
            for member in unreachable_members(&kept, rules) {
                debug!("Removing unreachable member {}", member.names().join(", "));
                edit.remove_declaration(member.syntax());
                removed_members += 1;
            }
        }

        info!(
            "Trimmed {} type(s) and {} member(s) from {}",
            removed_types,
            removed_members,
            document.name()
        );
        if edit.is_empty() {
            return Ok(document);
        }
        Ok(document.with_root(edit.apply(&root)))
    }
}

/// Types linked by the names their bodies mention; nested types point at
/// their container
fn type_graph(types: &[TypeDeclaration]) -> (SymbolGraph, Vec<NodeIndex>) {
    let mut graph = SymbolGraph::new();
    let indices: Vec<NodeIndex> = types
        .iter()
        .map(|ty| graph.add_symbol(ty.syntax().clone()))
        .collect();

    for (ty, index) in types.iter().zip(&indices) {
        if let Some(name) = ty.name() {
            graph.register_name(name, *index);
        }
        // extension methods are called by member name only
        if ty.has_modifier(CsSyntaxKind::StaticKw) {
            for member in ty.members() {
                for name in member.names() {
                    graph.register_name(name, *index);
                }
            }
        }
    }

    for (ty, index) in types.iter().zip(&indices) {
        for name in referenced_names(ty.syntax(), |node| node.kind().is_type_declaration()) {
            graph.add_reference(*index, &name);
        }
        if let Some(container) = ty.syntax().ancestors().skip(1).find_map(TypeDeclaration::cast)
            && let Some(position) = types.iter().position(|candidate| candidate == &container)
        {
            graph.add_edge(*index, indices[position]);
        }
    }
    (graph, indices)
}

fn is_type_seed(ty: &TypeDeclaration, rules: &[SymbolPattern]) -> bool {
    if has_annotation(ty.syntax(), PRESERVE_TAG) {
        return true;
    }
    let path = ty.qualified_path();
    if rules.iter().any(|rule| rule.matches_type(&path)) {
        return true;
    }
    ty.members().any(|member| {
        has_annotation(member.syntax(), PRESERVE_TAG)
            || member
                .names()
                .iter()
                .any(|name| rules.iter().any(|rule| rule.matches_member(&path, name)))
    })
}

/// Members of the kept types that no seed member reaches
fn unreachable_members(types: &[&TypeDeclaration], rules: &[SymbolPattern]) -> Vec<MemberDeclaration> {
    let mut graph = SymbolGraph::new();
    let mut members: Vec<(MemberDeclaration, NodeIndex)> = Vec::new();
    let mut seeds: Vec<NodeIndex> = Vec::new();
    let mut header_names: HashSet<String> = HashSet::new();

    for ty in types {
        let path = ty.qualified_path();
        let is_interface = ty.kind() == CsSyntaxKind::InterfaceDeclaration;
        let has_base = ty.base_list().is_some();

        header_names.extend(referenced_names(ty.syntax(), |node| {
            node.kind().is_type_declaration() || MemberDeclaration::can_cast(node.kind())
        }));

        if ty.kind() == CsSyntaxKind::EnumDeclaration {
            continue;
        }
        for member in ty.members() {
            let index = graph.add_symbol(member.syntax().clone());
            for name in member.names() {
                graph.register_name(name, index);
            }
            if is_interface || is_member_seed(&member, &path, has_base, rules) {
                seeds.push(index);
            }
            members.push((member, index));
        }
    }

    for (member, index) in &members {
        for name in referenced_names(member.syntax(), |_| false) {
            graph.add_reference(*index, &name);
        }
    }
    for name in &header_names {
        seeds.extend_from_slice(graph.lookup(name));
    }

    let reachable = graph.reachable_from(&seeds);
    members
        .into_iter()
        .filter(|(_, index)| !reachable.contains(index))
        .map(|(member, _)| member)
        .collect()
}

fn is_member_seed(
    member: &MemberDeclaration,
    type_path: &[String],
    type_has_base: bool,
    rules: &[SymbolPattern],
) -> bool {
    let always_kept = matches!(
        member.kind(),
        CsSyntaxKind::ConstructorDeclaration
            | CsSyntaxKind::DestructorDeclaration
            | CsSyntaxKind::OperatorDeclaration
            | CsSyntaxKind::IndexerDeclaration
    );
    always_kept
        || member.has_modifier(CsSyntaxKind::OverrideKw)
        || member.has_modifier(CsSyntaxKind::ExternKw)
        || member.is_explicit_interface()
        || (type_has_base && is_visible(member.syntax()))
        || has_annotation(member.syntax(), PRESERVE_TAG)
        || member
            .names()
            .iter()
            .any(|name| rules.iter().any(|rule| rule.matches_member(type_path, name)))
}

/// Public or protected
pub(crate) fn is_visible(node: &CsSyntaxNode) -> bool {
    crate::cst::ast::modifier_tokens(node)
        .iter()
        .any(|token| matches!(token.kind(), CsSyntaxKind::PublicKw | CsSyntaxKind::ProtectedKw))
}
