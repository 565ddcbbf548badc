//! `#region mdk <tags>` annotation

use std::collections::{HashMap, HashSet};

use rowan::{NodeOrToken, TextSize};
use tracing::{debug, warn};

use crate::cst::trivia::own_line;
use crate::cst::{
    CsSyntaxKind, CsSyntaxNode, CsSyntaxToken, Directive, DirectiveKind, GreenElement,
    green_node, green_token,
};
use crate::pipeline::{DocumentProcessor, PackContext, Processor};
use crate::project::Document;
use crate::result::Result;

/// Marker word that turns a region into an annotation
pub const MDK_REGION_MARKER: &str = "mdk";

/// Wraps the content of `#region mdk <tags>` ... `#endregion` pairs in
/// `AnnotatedRegion` nodes and removes the marker directives.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegionAnnotator;

impl Processor for RegionAnnotator {
    fn name(&self) -> &str {
        "region-annotator"
    }

    fn run_after(&self) -> &[&str] {
        &["conditionals"]
    }
}

#[derive(Debug)]
struct RegionPair {
    start: CsSyntaxToken,
    end: CsSyntaxToken,
    own_tags: Vec<String>,
    /// Enclosing mdk regions, outermost first
    enclosing: Vec<usize>,
}

/// Rebuild plan for one document
#[derive(Debug, Default)]
struct Plan {
    /// Token offsets to drop (marker directives with their line)
    strip: HashSet<TextSize>,
    /// Region start directive offset to the annotation text
    opens: HashMap<TextSize, String>,
    closes: HashSet<TextSize>,
}

impl Plan {
    fn touches(&self, node: &CsSyntaxNode) -> bool {
        let range = node.text_range();
        self.strip
            .iter()
            .any(|offset| range.start() <= *offset && *offset < range.end())
    }
}

impl DocumentProcessor for RegionAnnotator {
    fn process(&self, document: Document, _context: &PackContext) -> Result<Document> {
        let root = document.syntax();
        let pairs = pair_mdk_regions(&root, document.name());
        if pairs.is_empty() {
            return Ok(document);
        }

        let mut plan = Plan::default();
        let mut valid = vec![false; pairs.len()];
        for (index, pair) in pairs.iter().enumerate() {
            for directive in [&pair.start, &pair.end] {
                let line = own_line(directive).unwrap_or_else(|| vec![directive.clone()]);
                plan.strip
                    .extend(line.iter().map(|token| token.text_range().start()));
            }

            if pair.start.parent() != pair.end.parent() {
                warn!(
                    "{}: region '{}' spans different scopes; markers removed without annotation",
                    document.name(),
                    pair.start.text()
                );
                continue;
            }

            let tags: Vec<&str> = pair
                .enclosing
                .iter()
                .filter(|enclosing| valid[**enclosing])
                .flat_map(|enclosing| pairs[*enclosing].own_tags.iter())
                .chain(pair.own_tags.iter())
                .map(String::as_str)
                .collect();
            if pair.own_tags.is_empty() {
                continue;
            }
            valid[index] = true;
            plan.opens
                .insert(pair.start.text_range().start(), tags.join(" "));
            plan.closes.insert(pair.end.text_range().start());
        }

        debug!(
            "Annotated {} region(s) in {}",
            valid.iter().filter(|valid| **valid).count(),
            document.name()
        );
        Ok(document.with_root(rebuild(&root, &plan)))
    }
}

/// Pair region directives in document order and keep the mdk ones
fn pair_mdk_regions(root: &CsSyntaxNode, document: &str) -> Vec<RegionPair> {
    struct Open {
        token: CsSyntaxToken,
        tags: Option<Vec<String>>,
        pair_slot: Option<usize>,
    }

    let mut stack: Vec<Open> = Vec::new();
    let mut pairs: Vec<RegionPair> = Vec::new();
    // indices into `pairs` of the mdk regions currently open
    let mut open_mdk: Vec<usize> = Vec::new();

    let directives = root
        .descendants_with_tokens()
        .filter_map(|element| element.into_token())
        .filter(|token| token.kind() == CsSyntaxKind::PreprocessorDirective);

    for token in directives {
        let Some(directive) = Directive::parse(token.text()) else {
            continue;
        };
        match directive.kind {
            DirectiveKind::Region => {
                let tags = mdk_tags(directive.argument);
                let pair_slot = tags.as_ref().map(|tags| {
                    pairs.push(RegionPair {
                        start: token.clone(),
                        end: token.clone(),
                        own_tags: tags.clone(),
                        enclosing: open_mdk.clone(),
                    });
                    pairs.len() - 1
                });
                if let Some(slot) = pair_slot {
                    open_mdk.push(slot);
                }
                stack.push(Open {
                    token,
                    tags,
                    pair_slot,
                });
            }
            DirectiveKind::EndRegion => match stack.pop() {
                Some(open) => {
                    if let Some(slot) = open.pair_slot {
                        pairs[slot].end = token;
                        open_mdk.pop();
                    }
                }
                None => warn!("{document}: #endregion without matching #region"),
            },
            _ => {}
        }
    }

    // Unclosed mdk regions are left untouched
    let unclosed: HashSet<usize> = stack.iter().filter_map(|open| open.pair_slot).collect();
    for open in &stack {
        if open.tags.is_some() {
            warn!("{document}: '{}' is never closed", open.token.text());
        }
    }
    if unclosed.is_empty() {
        return pairs;
    }

    let remap: Vec<Option<usize>> = {
        let mut next = 0;
        (0..pairs.len())
            .map(|index| {
                if unclosed.contains(&index) {
                    None
                } else {
                    next += 1;
                    Some(next - 1)
                }
            })
            .collect()
    };
    pairs
        .into_iter()
        .enumerate()
        .filter(|(index, _)| !unclosed.contains(index))
        .map(|(_, mut pair)| {
            pair.enclosing = pair
                .enclosing
                .iter()
                .filter_map(|enclosing| remap[*enclosing])
                .collect();
            pair
        })
        .collect()
}

/// Tags of a `#region mdk ...` argument, `None` for ordinary regions
fn mdk_tags(argument: &str) -> Option<Vec<String>> {
    let mut words = argument.split_whitespace();
    if words.next() != Some(MDK_REGION_MARKER) {
        return None;
    }
    Some(words.map(str::to_string).collect())
}

fn rebuild(node: &CsSyntaxNode, plan: &Plan) -> rowan::GreenNode {
    if !plan.touches(node) {
        return node.green().into_owned();
    }

    // frames[0] collects the node's own children; each open region pushes one
    let mut frames: Vec<(Option<String>, Vec<GreenElement>)> = vec![(None, Vec::new())];
    for child in node.children_with_tokens() {
        match child {
            NodeOrToken::Node(child) => {
                let green = rebuild(&child, plan);
                push_element(&mut frames, NodeOrToken::Node(green));
            }
            NodeOrToken::Token(token) => {
                let offset = token.text_range().start();
                if let Some(tags) = plan.opens.get(&offset) {
                    frames.push((Some(tags.clone()), Vec::new()));
                } else if plan.closes.contains(&offset) && frames.len() > 1 {
                    close_frame(&mut frames);
                }
                if !plan.strip.contains(&offset) {
                    push_element(&mut frames, NodeOrToken::Token(token.green().to_owned()));
                }
            }
        }
    }
    while frames.len() > 1 {
        close_frame(&mut frames);
    }

    let (_, children) = frames.pop().unwrap_or_default();
    green_node(node.kind(), children)
}

fn push_element(frames: &mut [(Option<String>, Vec<GreenElement>)], element: GreenElement) {
    if let Some((_, children)) = frames.last_mut() {
        children.push(element);
    }
}

fn close_frame(frames: &mut Vec<(Option<String>, Vec<GreenElement>)>) {
    if let Some((tags, children)) = frames.pop() {
        let mut region = vec![green_token(
            CsSyntaxKind::Annotation,
            tags.as_deref().unwrap_or_default(),
        )];
        region.extend(children);
        push_element(
            frames,
            NodeOrToken::Node(green_node(CsSyntaxKind::AnnotatedRegion, region)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PackOptions;
    use crate::cst::ast::{AnnotatedRegion, AstNode, has_annotation};
    use crate::cst::{CsSyntaxNodeExt, PreprocessorSymbols};

    fn run(source: &str) -> Document {
        let document = Document::parse("A.cs", None, source, &PreprocessorSymbols::new());
        let context = PackContext::new("Demo", "/tmp/demo", PackOptions::default());
        RegionAnnotator.process(document, &context).unwrap()
    }

    #[test]
    fn test_members_are_wrapped_and_markers_removed() {
        let document = run(
            "class P\n{\n    #region mdk preserve\n    int a;\n    #endregion\n    int b;\n}\n",
        );
        assert_eq!(document.render(), "class P\n{\n    int a;\n    int b;\n}\n");

        let root = document.syntax();
        let region = root.descendants().find_map(AnnotatedRegion::cast).unwrap();
        assert_eq!(region.tags(), vec!["preserve"]);
        let fields: Vec<CsSyntaxNode> = root
            .descendants()
            .filter(|node| node.kind() == CsSyntaxKind::FieldDeclaration)
            .collect();
        assert!(has_annotation(&fields[0], "preserve"));
        assert!(!has_annotation(&fields[1], "preserve"));
    }

    #[test]
    fn test_nested_regions_inherit_tags() {
        let document = run(
            "class P\n{\n#region mdk preserve\n#region mdk nomacros\n    string s = \"$X$\";\n#endregion\n#endregion\n}\n",
        );
        let root = document.syntax();
        let field = root
            .descendants()
            .find(|node| node.kind() == CsSyntaxKind::FieldDeclaration)
            .unwrap();
        assert!(has_annotation(&field, "preserve"));
        assert!(has_annotation(&field, "nomacros"));
        let innermost = field.ancestors().find_map(AnnotatedRegion::cast).unwrap();
        assert_eq!(innermost.tags(), vec!["preserve", "nomacros"]);
    }

    #[test]
    fn test_plain_regions_are_untouched() {
        let source = "class P\n{\n    #region fields\n    int a;\n    #endregion\n}\n";
        let document = run(source);
        assert_eq!(document.render(), source);
        assert!(document.syntax().descendants().all(|node| node.kind() != CsSyntaxKind::AnnotatedRegion));
    }

    #[test]
    fn test_region_across_scopes_is_stripped() {
        let document = run(
            "class P\n{\n    #region mdk preserve\n    int a;\n}\n#endregion\nclass Q { }\n",
        );
        assert_eq!(document.render(), "class P\n{\n    int a;\n}\nclass Q { }\n");
        assert!(document.syntax().descendants().all(|node| node.kind() != CsSyntaxKind::AnnotatedRegion));
    }

    #[test]
    fn test_region_inside_method_body() {
        let document = run(
            "class P\n{\n    void M()\n    {\n        #region mdk nomacros\n        Echo(\"$A$\");\n        #endregion\n    }\n}\n",
        );
        assert_eq!(
            document.render(),
            "class P\n{\n    void M()\n    {\n        Echo(\"$A$\");\n    }\n}\n"
        );
        let literal = document
            .syntax()
            .significant_tokens()
            .into_iter()
            .find(|token| token.kind() == CsSyntaxKind::StringLiteral)
            .unwrap();
        assert!(crate::cst::ast::token_has_annotation(&literal, "nomacros"));
    }
}
