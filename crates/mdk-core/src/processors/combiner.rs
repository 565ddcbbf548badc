//! Merging of all documents into a single compilation unit

use std::collections::HashSet;

use rowan::NodeOrToken;
use tracing::{debug, info};

use crate::cst::ast::{AstNode, UsingDirective};
use crate::cst::{CsSyntaxKind, CsSyntaxNode, GreenElement, element_green, green_node, green_token};
use crate::pipeline::{DocumentCombiner, PackContext};
use crate::project::Document;
use crate::result::Result;

/// Name of the merged document
pub const COMBINED_DOCUMENT_NAME: &str = "Script.cs";

/// Hoists every `using` directive to the top (deduplicated, first seen
/// first) and appends the remaining top-level content of each document in
/// document order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceCombiner;

impl DocumentCombiner for SourceCombiner {
    fn combine(&self, documents: Vec<Document>, _context: &PackContext) -> Result<Document> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut usings: Vec<GreenElement> = Vec::new();
        let mut body: Vec<GreenElement> = Vec::new();

        for document in &documents {
            let root = document.syntax();
            let mut pending: Vec<GreenElement> = Vec::new();
            let mut pending_has_directive = false;

            for child in root.children_with_tokens() {
                match child {
                    NodeOrToken::Token(token) => {
                        pending_has_directive |= token.kind() == CsSyntaxKind::PreprocessorDirective
                            || token.kind() == CsSyntaxKind::DisabledText;
                        pending.push(NodeOrToken::Token(token.green().to_owned()));
                    }
                    NodeOrToken::Node(node) => match UsingDirective::cast(node.clone()) {
                        Some(using) => {
                            if !pending_has_directive {
                                pending.clear();
                            }
                            if seen.insert(using.key()) {
                                push_line(&mut usings, &node);
                            } else {
                                debug!("Dropping duplicate '{}' from {}", using.key(), document.name());
                            }
                        }
                        None => {
                            body.extend(without_leading_blank_lines(std::mem::take(&mut pending)));
                            pending_has_directive = false;
                            body.push(NodeOrToken::Node(node.green().into_owned()));
                        }
                    },
                }
            }

            if pending.iter().any(is_content) {
                body.extend(without_leading_blank_lines(pending));
            }
            if !ends_with_newline(&body) && !body.is_empty() {
                body.push(green_token(CsSyntaxKind::Newline, "\n"));
            }
        }

        info!(
            "Combined {} document(s): {} unique using directive(s)",
            documents.len(),
            seen.len()
        );

        let mut children = usings;
        children.extend(body);
        Ok(Document::from_green(
            COMBINED_DOCUMENT_NAME,
            None,
            green_node(CsSyntaxKind::CompilationUnit, children),
        ))
    }
}

/// Push a using directive, making sure it ends its line
fn push_line(target: &mut Vec<GreenElement>, node: &CsSyntaxNode) {
    target.push(element_green(&NodeOrToken::Node(node.clone())));
    let ends_line = node
        .last_token()
        .is_some_and(|token| token.kind() == CsSyntaxKind::Newline);
    if !ends_line {
        target.push(green_token(CsSyntaxKind::Newline, "\n"));
    }
}

fn is_content(element: &GreenElement) -> bool {
    match element {
        NodeOrToken::Token(token) => !matches!(
            CsSyntaxKind::from_raw(token.kind().0),
            Some(CsSyntaxKind::Whitespace | CsSyntaxKind::Newline)
        ),
        NodeOrToken::Node(_) => true,
    }
}

/// Drop blank lines before the first content token (or the end), keeping
/// the indentation of that line
fn without_leading_blank_lines(trivia: Vec<GreenElement>) -> Vec<GreenElement> {
    let end = trivia.iter().position(is_content).unwrap_or(trivia.len());
    let start = trivia[..end]
        .iter()
        .rposition(is_newline)
        .map_or(0, |index| index + 1);
    trivia.into_iter().skip(start).collect()
}

fn is_newline(element: &GreenElement) -> bool {
    matches!(
        element,
        NodeOrToken::Token(token)
            if CsSyntaxKind::from_raw(token.kind().0) == Some(CsSyntaxKind::Newline)
    )
}

fn ends_with_newline(elements: &[GreenElement]) -> bool {
    let Some(last) = elements.last() else {
        return false;
    };
    let text = match last {
        NodeOrToken::Token(token) => token.text().to_string(),
        NodeOrToken::Node(node) => crate::cst::render_green(node),
    };
    text.ends_with('\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PackOptions;
    use crate::cst::PreprocessorSymbols;
    use crate::cst::ast::CompilationUnit;

    fn combine(sources: &[(&str, &str)]) -> Document {
        let documents = sources
            .iter()
            .map(|(name, source)| Document::parse(*name, None, source, &PreprocessorSymbols::new()))
            .collect();
        let context = PackContext::new("Demo", "/tmp/demo", PackOptions::default());
        SourceCombiner.combine(documents, &context).unwrap()
    }

    #[test]
    fn test_usings_are_hoisted_in_first_seen_order() {
        let merged = combine(&[
            ("A.cs", "using System.Text;\nusing System;\n\nclass A { }\n"),
            ("B.cs", "using System;\nusing System.Linq;\n\nclass B { }\n"),
            ("C.cs", "using System.Collections.Generic;\nusing System.Text;\nclass C { }\n"),
            ("D.cs", "using V = VRageMath.Vector3D;\nclass D { }\n"),
            ("E.cs", "using  System.Linq ;\nclass E { }\n"),
        ]);
        assert_eq!(
            merged.render(),
            "using System.Text;\nusing System;\nusing System.Linq;\nusing System.Collections.Generic;\n\
             using V = VRageMath.Vector3D;\nclass A { }\nclass B { }\nclass C { }\nclass D { }\nclass E { }\n"
        );
    }

    #[test]
    fn test_five_documents_keep_first_seen_using_order() {
        let merged = combine(&[
            ("A.cs", "using System;\nclass A { }\n"),
            ("B.cs", "using System;\nusing System.Collections.Generic;\nclass B { }\n"),
            ("C.cs", "using System.Linq;\nclass C { }\n"),
            ("D.cs", "using System.Text;\nusing System.Collections.Generic;\nclass D { }\n"),
            ("E.cs", "using System.Threading.Tasks;\nclass E { }\n"),
        ]);
        let usings: Vec<String> = CompilationUnit::cast(merged.syntax())
            .unwrap()
            .usings()
            .map(|using| using.key())
            .collect();
        assert_eq!(
            usings,
            vec![
                "using System;",
                "using System.Collections.Generic;",
                "using System.Linq;",
                "using System.Text;",
                "using System.Threading.Tasks;",
            ]
        );
        assert_eq!(
            merged.render(),
            "using System;\nusing System.Collections.Generic;\nusing System.Linq;\nusing System.Text;\n\
             using System.Threading.Tasks;\nclass A { }\nclass B { }\nclass C { }\nclass D { }\nclass E { }\n"
        );
    }

    #[test]
    fn test_comments_follow_their_declarations() {
        let merged = combine(&[
            ("A.cs", "using System;\n\n\n/// <summary>Alpha</summary>\nclass A { }\n// end of A\n"),
            ("B.cs", "class B { }"),
        ]);
        assert_eq!(
            merged.render(),
            "using System;\n/// <summary>Alpha</summary>\nclass A { }\n// end of A\nclass B { }\n"
        );
    }

    #[test]
    fn test_header_comment_before_usings_is_dropped() {
        let merged = combine(&[("A.cs", "// file header\nusing System;\nclass A { }\n")]);
        assert_eq!(merged.render(), "using System;\nclass A { }\n");
    }

    #[test]
    fn test_merge_is_deterministic() {
        let sources = [
            ("A.cs", "using B;\nusing A;\nclass X { }\n"),
            ("B.cs", "using C;\nusing A;\nclass Y { }\n"),
        ];
        let first = combine(&sources).render();
        for _ in 0..5 {
            assert_eq!(combine(&sources).render(), first);
        }
    }
}
