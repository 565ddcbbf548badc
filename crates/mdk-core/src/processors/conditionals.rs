//! Removal of resolved conditional compilation

use tracing::debug;

use crate::cst::{
    CsSyntaxKind, CsSyntaxToken, Directive, DirectiveKind, PreprocessorSymbols, TreeEdit,
    evaluate_condition,
};
use crate::pipeline::{DocumentProcessor, PackContext, Processor};
use crate::project::Document;
use crate::result::Result;

/// Drops `#if` family directives, `#define`/`#undef` and the lines of
/// inactive branches, leaving the active branches unwrapped.
///
/// Branches were already selected when the document was lexed; this pass
/// replays the same decisions line by line so that blank lines and
/// non-conditional directives inside inactive branches go too.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreprocessorConditionals;

#[derive(Debug, Clone, Copy)]
struct Branch {
    parent_active: bool,
    taken: bool,
    active: bool,
}

impl Processor for PreprocessorConditionals {
    fn name(&self) -> &str {
        "conditionals"
    }
}

impl DocumentProcessor for PreprocessorConditionals {
    fn process(&self, document: Document, context: &PackContext) -> Result<Document> {
        let root = document.syntax();
        let tokens: Vec<CsSyntaxToken> = root
            .descendants_with_tokens()
            .filter_map(|element| element.into_token())
            .filter(|token| token.kind() != CsSyntaxKind::Annotation)
            .collect();

        let mut symbols = context.symbols().clone();
        let mut branches: Vec<Branch> = Vec::new();
        let mut edit = TreeEdit::new();

        for line in tokens.split_inclusive(|token| token.kind() == CsSyntaxKind::Newline) {
            let active = branches.last().is_none_or(|branch| branch.active);
            let directive = single_directive(line);

            let remove = match directive.and_then(|token| Directive::parse(token.text())) {
                Some(directive) if directive.kind.is_conditional() => {
                    apply_directive(&directive, active, &mut branches, &mut symbols);
                    true
                }
                _ => !active,
            };

            if remove {
                for token in line {
                    edit.remove_token(token);
                }
            }
        }

        if edit.is_empty() {
            return Ok(document);
        }
        debug!("Removed {} conditional token(s) from {}", edit.len(), document.name());
        Ok(document.with_root(edit.apply(&root)))
    }
}

/// The directive token of a line holding nothing but a directive
fn single_directive(line: &[CsSyntaxToken]) -> Option<&CsSyntaxToken> {
    let mut content = line
        .iter()
        .filter(|token| !matches!(token.kind(), CsSyntaxKind::Whitespace | CsSyntaxKind::Newline));
    let first = content.next()?;
    (first.kind() == CsSyntaxKind::PreprocessorDirective && content.next().is_none())
        .then_some(first)
}

fn apply_directive(
    directive: &Directive<'_>,
    active: bool,
    branches: &mut Vec<Branch>,
    symbols: &mut PreprocessorSymbols,
) {
    match directive.kind {
        DirectiveKind::If => {
            let value = active && evaluate_condition(directive.argument, symbols).unwrap_or(false);
            branches.push(Branch {
                parent_active: active,
                taken: value,
                active: value,
            });
        }
        DirectiveKind::Elif => {
            if let Some(top) = branches.last_mut() {
                let value = top.parent_active
                    && !top.taken
                    && evaluate_condition(directive.argument, symbols).unwrap_or(false);
                top.active = value;
                top.taken |= value;
            }
        }
        DirectiveKind::Else => {
            if let Some(top) = branches.last_mut() {
                top.active = top.parent_active && !top.taken;
                top.taken = true;
            }
        }
        DirectiveKind::Endif => {
            branches.pop();
        }
        DirectiveKind::Define if active => symbols.define(directive.argument),
        DirectiveKind::Undef if active => symbols.undefine(directive.argument),
        _ => {}
    }
}
