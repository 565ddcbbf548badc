//! Comment and region stripping

use tracing::debug;

use crate::cst::ast::token_has_annotation;
use crate::cst::trivia::{next_rendered, own_line, prev_rendered};
use crate::cst::{
    CsSyntaxKind, CsSyntaxToken, CsSyntaxTokenExt, Directive, DirectiveKind, TreeEdit,
    green_token,
};
use crate::pipeline::{DocumentProcessor, PackContext, Processor};
use crate::project::Document;
use crate::result::Result;
use crate::trimmer::PRESERVE_TAG;

use super::requires_separator;

/// Removes comments and plain `#region`/`#endregion` lines
///
/// A comment alone on its line goes with its indentation and line break; a
/// trailing comment goes with the whitespace before it. A comment squeezed
/// between two tokens becomes a single space when those tokens would
/// otherwise fuse.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommentStripper;

impl Processor for CommentStripper {
    fn name(&self) -> &str {
        "comment-stripper"
    }
}

impl DocumentProcessor for CommentStripper {
    fn process(&self, document: Document, _context: &PackContext) -> Result<Document> {
        let root = document.syntax();
        let mut edit = TreeEdit::new();
        let mut stripped = 0usize;

        for token in root
            .descendants_with_tokens()
            .filter_map(|element| element.into_token())
            .filter(is_strippable)
        {
            if token_has_annotation(&token, PRESERVE_TAG) {
                continue;
            }
            stripped += 1;

            if let Some(line) = own_line(&token) {
                for part in &line {
                    edit.remove_token(part);
                }
                continue;
            }

            let next = next_rendered(&token);
            let ends_line = next
                .as_ref()
                .is_none_or(|next| next.kind() == CsSyntaxKind::Newline);
            if ends_line {
                let mut previous = prev_rendered(&token);
                while let Some(whitespace) = previous.filter(|prev| prev.kind() == CsSyntaxKind::Whitespace) {
                    previous = prev_rendered(&whitespace);
                    edit.remove_token(&whitespace);
                }
                edit.remove_token(&token);
                continue;
            }

            if needs_space(&token) {
                edit.replace_token(&token, vec![green_token(CsSyntaxKind::Whitespace, " ")]);
            } else {
                edit.remove_token(&token);
            }
        }

        if edit.is_empty() {
            return Ok(document);
        }
        debug!("Stripped {} comment(s) and region(s) from {}", stripped, document.name());
        Ok(document.with_root(edit.apply(&root)))
    }
}

fn is_strippable(token: &CsSyntaxToken) -> bool {
    match token.kind() {
        kind if kind.is_comment() => true,
        CsSyntaxKind::PreprocessorDirective => Directive::parse(token.text()).is_some_and(|directive| {
            matches!(directive.kind, DirectiveKind::Region | DirectiveKind::EndRegion)
        }),
        _ => false,
    }
}

/// An inline comment with no whitespace on either side that separates two
/// tokens which would fuse without it
fn needs_space(comment: &CsSyntaxToken) -> bool {
    let touches_whitespace = |neighbour: Option<CsSyntaxToken>| {
        neighbour.is_some_and(|token| token.kind().is_trivia() && !token.kind().is_comment())
    };
    if touches_whitespace(prev_rendered(comment)) || touches_whitespace(next_rendered(comment)) {
        return false;
    }
    match (comment.prev_significant(), comment.next_significant()) {
        (Some(left), Some(right)) => requires_separator(left.text(), right.text()),
        _ => false,
    }
}
