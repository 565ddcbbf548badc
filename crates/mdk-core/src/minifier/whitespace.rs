//! Whitespace collapsing and line joining

use rowan::NodeOrToken;
use tracing::debug;

use crate::cst::ast::token_has_annotation;
use crate::cst::{CsSyntaxKind, CsSyntaxToken, GreenElement, TreeEdit, green_token};
use crate::pipeline::{DocumentProcessor, PackContext, Processor};
use crate::project::Document;
use crate::result::Result;
use crate::trimmer::PRESERVE_TAG;

use super::{MinifierLevel, requires_separator};

/// Rewrites the trivia between significant tokens to the minimum that keeps
/// the token stream intact.
///
/// Below [`MinifierLevel::Full`] a line break between two tokens survives as
/// a single `\n`; at `Full` lines are joined and a break is only written
/// where a directive or a single-line comment needs one. Directives always
/// keep a line of their own. Running the trimmer twice gives the same text
/// as running it once. Trivia inside a `preserve` region is left alone, but
/// the region markers are consumed by the first pack, so packing an already
/// packed script minifies that content too.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTrimmer;

impl Processor for WhitespaceTrimmer {
    fn name(&self) -> &str {
        "whitespace-trimmer"
    }

    fn run_after(&self) -> &[&str] {
        &["comment-stripper"]
    }
}

impl DocumentProcessor for WhitespaceTrimmer {
    fn process(&self, document: Document, context: &PackContext) -> Result<Document> {
        let keep_lines = context.minifier_level() < MinifierLevel::Full;
        let root = document.syntax();
        let tokens: Vec<CsSyntaxToken> = root
            .descendants_with_tokens()
            .filter_map(|element| element.into_token())
            .filter(|token| token.kind() != CsSyntaxKind::Annotation)
            .collect();

        let mut edit = TreeEdit::new();
        let mut left: Option<&CsSyntaxToken> = None;
        let mut index = 0;
        loop {
            let start = index;
            while index < tokens.len() && tokens[index].kind().is_trivia() {
                index += 1;
            }
            let run = &tokens[start..index];
            let right = tokens.get(index);

            if run.iter().any(|token| token_has_annotation(token, PRESERVE_TAG)) {
                collapse_around_preserved(&mut edit, left, run, right, keep_lines);
            } else {
                let collapsed = collapse(left, run, right, keep_lines);
                record(&mut edit, run, right, collapsed);
            }

            match right {
                Some(token) => {
                    left = Some(token);
                    index += 1;
                }
                None => break,
            }
        }

        if edit.is_empty() {
            return Ok(document);
        }
        debug!("Rewrote {} trivia token(s) in {}", edit.len(), document.name());
        Ok(document.with_root(edit.apply(&root)))
    }
}

/// Collapse the unpreserved stretches of a run that is partly inside a
/// `preserve` region, leaving the preserved trivia as written
fn collapse_around_preserved(
    edit: &mut TreeEdit,
    left: Option<&CsSyntaxToken>,
    run: &[CsSyntaxToken],
    right: Option<&CsSyntaxToken>,
    keep_lines: bool,
) {
    let mut start = 0;
    while start < run.len() {
        let preserved = token_has_annotation(&run[start], PRESERVE_TAG);
        let mut end = start + 1;
        while end < run.len() && token_has_annotation(&run[end], PRESERVE_TAG) == preserved {
            end += 1;
        }
        if !preserved {
            let before = start.checked_sub(1).map(|i| &run[i]).or(left);
            let segment = &run[start..end];
            // a preserved line break already separates the segment
            let after = match run.get(end) {
                None => right,
                Some(next) if next.kind() == CsSyntaxKind::Newline => None,
                next => next,
            };
            let collapsed = collapse(before, segment, after, keep_lines);
            record(edit, segment, after, collapsed);
        }
        start = end;
    }
}

/// Minimal trivia for the run between `left` and `right`
fn collapse(
    left: Option<&CsSyntaxToken>,
    run: &[CsSyntaxToken],
    right: Option<&CsSyntaxToken>,
    keep_lines: bool,
) -> Vec<(CsSyntaxKind, String)> {
    let mut out: Vec<(CsSyntaxKind, String)> = Vec::new();
    let newline = || (CsSyntaxKind::Newline, "\n".to_string());
    let space = || (CsSyntaxKind::Whitespace, " ".to_string());

    // text written just before the next piece of output
    let mut previous: Option<String> = left.map(|token| token.text().to_string());
    let mut at_line_start = left.is_none_or(|token| token.kind() == CsSyntaxKind::Newline);
    let mut pending_break = false;

    for token in run {
        let kind = token.kind();
        match kind {
            CsSyntaxKind::Whitespace => continue,
            CsSyntaxKind::Newline => {
                pending_break = true;
                continue;
            }
            _ => {}
        }

        let own_line = matches!(
            kind,
            CsSyntaxKind::PreprocessorDirective | CsSyntaxKind::DisabledText
        );
        if !at_line_start {
            if own_line || (keep_lines && pending_break) {
                out.push(newline());
                at_line_start = true;
            } else if previous
                .as_deref()
                .is_some_and(|text| separator_needed(text, token.text()))
            {
                out.push(space());
            }
        }
        out.push((kind, token.text().to_string()));
        pending_break = false;

        let ends_line = own_line
            || matches!(kind, CsSyntaxKind::SingleLineComment | CsSyntaxKind::DocComment);
        if ends_line {
            out.push(newline());
        }
        at_line_start = ends_line;
        previous = Some(token.text().to_string());
    }

    let Some(right) = right else {
        return out;
    };
    if at_line_start {
        return out;
    }
    if keep_lines && pending_break {
        out.push(newline());
    } else if previous
        .as_deref()
        .is_some_and(|text| separator_needed(text, right.text()))
    {
        out.push(space());
    }
    out
}

/// Would `previous` and `next` run into each other?
fn separator_needed(previous: &str, next: &str) -> bool {
    if previous.trim().is_empty() || next.trim().is_empty() {
        return false;
    }
    if next.starts_with("//") || next.starts_with("/*") {
        return previous.ends_with('/');
    }
    if previous.starts_with("/*") {
        return false;
    }
    requires_separator(previous, next)
}

/// Record the edit turning `run` into `collapsed`
fn record(
    edit: &mut TreeEdit,
    run: &[CsSyntaxToken],
    right: Option<&CsSyntaxToken>,
    collapsed: Vec<(CsSyntaxKind, String)>,
) {
    let unchanged = run.len() == collapsed.len()
        && run
            .iter()
            .zip(&collapsed)
            .all(|(token, (kind, text))| token.kind() == *kind && token.text() == text);
    if unchanged {
        return;
    }

    let elements: Vec<GreenElement> = collapsed
        .iter()
        .map(|(kind, text)| green_token(*kind, text))
        .collect();
    match run.split_first() {
        Some((first, rest)) => {
            edit.replace_token(first, elements);
            for token in rest {
                edit.remove_token(token);
            }
        }
        None => {
            if let Some(right) = right {
                let mut elements = elements;
                elements.push(NodeOrToken::Token(right.green().to_owned()));
                edit.replace_token(right, elements);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PackOptions;
    use crate::cst::PreprocessorSymbols;
    use crate::processors::RegionAnnotator;
    use insta::assert_snapshot;

    fn trim(source: &str, level: MinifierLevel) -> String {
        let options = PackOptions {
            minify: level,
            ..PackOptions::default()
        };
        let context = PackContext::new("Demo", "/tmp/demo", options);
        let document = Document::parse("Script.cs", None, source, &PreprocessorSymbols::new());
        let document = RegionAnnotator.process(document, &context).unwrap();
        WhitespaceTrimmer.process(document, &context).unwrap().render()
    }

    const SOURCE: &str = "class P\n{\n    int a = 1;\n\n    int b;   \n}\n";

    #[test]
    fn test_lite_keeps_line_structure() {
        assert_eq!(trim(SOURCE, MinifierLevel::Lite), "class P\n{\nint a=1;\nint b;\n}");
    }

    #[test]
    fn test_full_joins_lines() {
        assert_snapshot!(trim(SOURCE, MinifierLevel::Full), @"class P{int a=1;int b;}");
    }

    #[test]
    fn test_operator_boundaries() {
        assert_snapshot!(
            trim("int x = 2 - - 1;\nint y = 2 -- 1;\n", MinifierLevel::Full),
            @"int x=2- -1;int y=2--1;"
        );
    }

    #[test]
    fn test_directives_keep_their_line() {
        let source = "class P\n{\n    #pragma warning disable\n    int a;\n}\n";
        assert_eq!(
            trim(source, MinifierLevel::Full),
            "class P{\n#pragma warning disable\nint a;}"
        );
    }

    #[test]
    fn test_single_line_comment_ends_line() {
        assert_eq!(
            trim("int a; // note\nint b;\n", MinifierLevel::Full),
            "int a;// note\nint b;"
        );
    }

    #[test]
    fn test_preserved_region_is_untouched() {
        let source = "class P\n{\n#region mdk preserve\n    int   a;\n#endregion\n    int   b;\n}\n";
        let output = trim(source, MinifierLevel::Full);
        assert!(output.contains("int   a;"), "{output}");
        assert!(output.contains("int b;"), "{output}");
    }

    #[test]
    fn test_indentation_after_preserved_region_is_trimmed() {
        let source = "class P\n{\n#region mdk preserve\n    int   keep;\n    #endregion\n        int    after;\n}\n";
        let output = trim(source, MinifierLevel::Lite);
        assert!(output.contains("int   keep;"), "{output}");
        assert!(output.ends_with("\nint after;\n}"), "{output}");
    }

    #[test]
    fn test_idempotent() {
        for level in [MinifierLevel::Lite, MinifierLevel::Full] {
            let source = "#pragma warning disable\nclass P\n{\n    int a = 1; // x\n    void M() { a -= - 1; }\n}\n";
            let once = trim(source, level);
            assert_eq!(trim(&once, level), once, "{level}");
        }
    }
}
