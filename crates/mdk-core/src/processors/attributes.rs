//! Removal of configured attributes

use rowan::NodeOrToken;
use tracing::{debug, warn};

use crate::cst::{
    CsSyntaxKind, CsSyntaxNode, CsSyntaxNodeExt, CsSyntaxToken, TreeEdit, green_node,
    green_token, lex_fragment,
};
use crate::pipeline::{DocumentProcessor, PackContext, Processor};
use crate::project::Document;
use crate::result::Result;

/// Strips attributes named in `strip_attributes` (such as the `Debugger*`
/// family) from declarations. An attribute list that becomes empty is removed
/// together with the line break that followed it.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeStripper;

impl Processor for AttributeStripper {
    fn name(&self) -> &str {
        "attribute-stripper"
    }
}

/// One attribute of a list: its name and the byte range of its text within
/// the list
#[derive(Debug)]
struct Attribute {
    name: String,
    start: usize,
    end: usize,
}

impl DocumentProcessor for AttributeStripper {
    fn process(&self, document: Document, context: &PackContext) -> Result<Document> {
        let stripped = &context.options().strip_attributes;
        if stripped.is_empty() {
            return Ok(document);
        }
        let root = document.syntax();
        let mut edit = TreeEdit::new();

        for list in root
            .descendants()
            .filter(|node| node.kind() == CsSyntaxKind::AttributeList)
        {
            let (target, attributes) = split_attribute_list(&list);
            let kept: Vec<&Attribute> = attributes
                .iter()
                .filter(|attribute| !stripped.iter().any(|name| matches_name(&attribute.name, name)))
                .collect();
            if kept.len() == attributes.len() {
                continue;
            }

            if kept.is_empty() {
                edit.remove_node(&list);
                for token in following_blank(&list) {
                    edit.remove_token(&token);
                }
                continue;
            }

            let text = list.text().to_string();
            let mut rebuilt = String::from("[");
            if let Some(target) = &target {
                rebuilt.push_str(target);
                rebuilt.push_str(": ");
            }
            let parts: Vec<&str> = kept.iter().map(|attribute| &text[attribute.start..attribute.end]).collect();
            rebuilt.push_str(&parts.join(", "));
            rebuilt.push(']');

            let (tokens, errors) = lex_fragment(&rebuilt);
            if !errors.is_empty() {
                warn!("{}: could not rebuild attribute list '{}'", document.name(), text);
                continue;
            }
            let children = tokens
                .iter()
                .map(|token| green_token(token.kind, &token.text))
                .collect();
            edit.replace_node(
                &list,
                vec![NodeOrToken::Node(green_node(CsSyntaxKind::AttributeList, children))],
            );
        }

        if edit.is_empty() {
            return Ok(document);
        }
        debug!("Stripped attributes in {} place(s) of {}", edit.len(), document.name());
        Ok(document.with_root(edit.apply(&root)))
    }
}

/// Split `[target: A, B(1, 2)]` into its target and attributes
fn split_attribute_list(list: &CsSyntaxNode) -> (Option<String>, Vec<Attribute>) {
    let base = usize::from(list.text_range().start());
    let offset = |token: &CsSyntaxToken| usize::from(token.text_range().start()) - base;
    let end_of = |token: &CsSyntaxToken| usize::from(token.text_range().end()) - base;

    let tokens = list.significant_tokens();
    // drop the brackets
    let inner = match tokens.as_slice() {
        [open, inner @ .., close]
            if open.kind() == CsSyntaxKind::LBracket && close.kind() == CsSyntaxKind::RBracket =>
        {
            inner
        }
        _ => return (None, Vec::new()),
    };

    let (target, inner) = match inner {
        [target, colon, rest @ ..] if colon.kind() == CsSyntaxKind::Colon => {
            (Some(target.text().to_string()), rest)
        }
        _ => (None, inner),
    };

    let mut attributes = Vec::new();
    let mut depth = 0usize;
    let mut current: Vec<&CsSyntaxToken> = Vec::new();
    for token in inner.iter().chain(std::iter::once(&tokens[tokens.len() - 1])) {
        let at_end = token.kind() == CsSyntaxKind::RBracket && depth == 0;
        match token.kind() {
            CsSyntaxKind::LParen | CsSyntaxKind::LBracket | CsSyntaxKind::LBrace => depth += 1,
            CsSyntaxKind::RParen | CsSyntaxKind::RBrace => depth = depth.saturating_sub(1),
            CsSyntaxKind::RBracket if depth > 0 => depth -= 1,
            _ => {}
        }
        if (token.kind() == CsSyntaxKind::Comma && depth == 0) || at_end {
            if let (Some(first), Some(last)) = (current.first(), current.last()) {
                attributes.push(Attribute {
                    name: attribute_name(&current),
                    start: offset(first),
                    end: end_of(last),
                });
            }
            current.clear();
        } else {
            current.push(token);
        }
    }
    (target, attributes)
}

/// Last identifier of the leading qualified name
fn attribute_name(tokens: &[&CsSyntaxToken]) -> String {
    tokens
        .iter()
        .take_while(|token| {
            matches!(
                token.kind(),
                CsSyntaxKind::Identifier | CsSyntaxKind::Dot | CsSyntaxKind::ColonColon
            )
        })
        .filter(|token| token.kind() == CsSyntaxKind::Identifier)
        .last()
        .map(|token| token.text().to_string())
        .unwrap_or_default()
}

/// Attribute `name` matches the configured `pattern`, with or without the
/// `Attribute` suffix and ignoring any namespace qualification
fn matches_name(name: &str, pattern: &str) -> bool {
    let pattern = pattern.rsplit('.').next().unwrap_or(pattern);
    let strip = |value: &str| value.strip_suffix("Attribute").unwrap_or(value).to_string();
    !name.is_empty() && strip(name) == strip(pattern)
}

/// Whitespace and line break tokens directly after `list` up to the next
/// line's content
fn following_blank(list: &CsSyntaxNode) -> Vec<CsSyntaxToken> {
    let mut blank = Vec::new();
    let mut current = list.next_sibling_or_token();
    while let Some(NodeOrToken::Token(token)) = current {
        if !matches!(token.kind(), CsSyntaxKind::Whitespace | CsSyntaxKind::Newline) {
            break;
        }
        current = token.next_sibling_or_token();
        blank.push(token);
    }
    blank
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PackOptions;
    use crate::cst::PreprocessorSymbols;

    fn run(source: &str) -> String {
        let document = Document::parse("Script.cs", None, source, &PreprocessorSymbols::new());
        assert!(!document.has_errors(), "{:?}", document.diagnostics());
        let context = PackContext::new("Demo", "/tmp/demo", PackOptions::default());
        AttributeStripper.process(document, &context).unwrap().render()
    }

    #[test]
    fn test_whole_list_is_removed() {
        assert_eq!(
            run("class P\n{\n    [DebuggerHidden]\n    void M() { }\n}\n"),
            "class P\n{\n    void M() { }\n}\n"
        );
    }

    #[test]
    fn test_qualified_and_suffixed_names() {
        assert_eq!(
            run("class P\n{\n    [System.Diagnostics.DebuggerStepThroughAttribute] void M() { }\n}\n"),
            "class P\n{\n    void M() { }\n}\n"
        );
    }

    #[test]
    fn test_other_attributes_are_kept() {
        assert_eq!(
            run("class P\n{\n    [Obsolete(\"x, y\"), DebuggerHidden]\n    void M() { }\n}\n"),
            "class P\n{\n    [Obsolete(\"x, y\")]\n    void M() { }\n}\n"
        );
    }

    #[test]
    fn test_target_is_kept() {
        assert_eq!(
            run("class P\n{\n    [return: DebuggerHidden, NotNull] string M() => \"\";\n}\n"),
            "class P\n{\n    [return: NotNull] string M() => \"\";\n}\n"
        );
    }

    #[test]
    fn test_unrelated_attributes_are_untouched() {
        let source = "[Flags]\nenum E { A }\n";
        assert_eq!(run(source), source);
    }
}
