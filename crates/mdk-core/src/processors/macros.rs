//! `$NAME$` macro expansion in string literals and comments

use std::borrow::Cow;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::{Captures, Regex};
use tracing::debug;

use crate::cst::ast::token_has_annotation;
use crate::cst::{CsSyntaxKind, TreeEdit};
use crate::pipeline::{DocumentProcessor, PackContext, Processor};
use crate::project::Document;
use crate::result::Result;

/// Annotation tag that disables macro expansion
pub const NO_MACROS_TAG: &str = "nomacros";

static MACRO_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)\$").unwrap());

/// Replaces `$NAME$` inside string literals and comments with the value from
/// the context's macro table. Unknown macros are left verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacroExpander;

impl Processor for MacroExpander {
    fn name(&self) -> &str {
        "macro-expander"
    }

    fn run_after(&self) -> &[&str] {
        &["region-annotator"]
    }
}

impl DocumentProcessor for MacroExpander {
    fn process(&self, document: Document, context: &PackContext) -> Result<Document> {
        let root = document.syntax();
        let mut edit = TreeEdit::new();

        for token in root
            .descendants_with_tokens()
            .filter_map(|element| element.into_token())
        {
            let kind = token.kind();
            if !(kind.is_string_literal() || kind.is_comment()) {
                continue;
            }
            if !token.text().contains('$') || token_has_annotation(&token, NO_MACROS_TAG) {
                continue;
            }
            if let Cow::Owned(expanded) = expand(token.text(), kind, context.macros()) {
                edit.replace_token_text(&token, &expanded);
            }
        }

        if edit.is_empty() {
            return Ok(document);
        }
        debug!("Expanded macros in {} token(s) of {}", edit.len(), document.name());
        Ok(document.with_root(edit.apply(&root)))
    }
}

/// Expand the macros of one token's text
pub fn expand<'a>(
    text: &'a str,
    kind: CsSyntaxKind,
    macros: &IndexMap<String, String>,
) -> Cow<'a, str> {
    let mut changed = false;
    let expanded = MACRO_PATTERN.replace_all(text, |captures: &Captures<'_>| {
        let name = &captures[1];
        match macros.get(name) {
            Some(value) => {
                changed = true;
                escape(value, kind, text)
            }
            None => {
                debug!("Unknown macro ${name}$ left as is");
                captures[0].to_string()
            }
        }
    });
    if changed {
        Cow::Owned(expanded.into_owned())
    } else {
        Cow::Borrowed(text)
    }
}

/// Escape a macro value for the literal or comment it is spliced into
fn escape(value: &str, kind: CsSyntaxKind, token_text: &str) -> String {
    match kind {
        CsSyntaxKind::StringLiteral => escape_regular(value),
        CsSyntaxKind::VerbatimStringLiteral => value.replace('"', "\"\""),
        CsSyntaxKind::InterpolatedStringLiteral => {
            let verbatim = token_text.starts_with("$@") || token_text.starts_with("@$");
            let escaped = if verbatim {
                value.replace('"', "\"\"")
            } else {
                escape_regular(value)
            };
            escaped.replace('{', "{{").replace('}', "}}")
        }
        CsSyntaxKind::SingleLineComment | CsSyntaxKind::DocComment => {
            value.replace(['\r', '\n'], " ")
        }
        CsSyntaxKind::MultiLineComment => value.replace("*/", "* /"),
        _ => value.to_string(),
    }
}

fn escape_regular(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '\0' => escaped.push_str("\\0"),
            c => escaped.push(c),
        }
    }
    escaped
}
