//! Leading and trailing trivia of tokens
//!
//! Trivia are stored as ordinary tokens in the tree. A token's *trailing*
//! trivia are the trivia that follow it up to and including the first line
//! break; its *leading* trivia are whatever precedes it after the previous
//! significant token's trailing trivia.
//!
//! # Example
//!
//! ```rust
//! use mdk_core::cst::{PreprocessorSymbols, parse_csharp, CsSyntaxNodeExt};
//! use mdk_core::cst::trivia::{leading_trivia, trailing_trivia};
//!
//! let parse = parse_csharp("int a; // one\n// two\nint b;", &PreprocessorSymbols::new());
//! let tokens = parse.syntax().significant_tokens();
//! let semicolon = &tokens[2];
//! assert_eq!(trailing_trivia(semicolon).len(), 3);
//! let second_int = &tokens[3];
//! assert_eq!(leading_trivia(second_int)[0].text(), "// two");
//! ```

use super::{CsSyntaxKind, CsSyntaxNode, CsSyntaxToken};

/// Trivia following `token` up to and including the first line break
pub fn trailing_trivia(token: &CsSyntaxToken) -> Vec<CsSyntaxToken> {
    let mut trivia = Vec::new();
    let mut current = token.next_token();
    while let Some(next) = current {
        if next.kind() == CsSyntaxKind::Annotation {
            current = next.next_token();
            continue;
        }
        if !next.kind().is_trivia() {
            break;
        }
        let is_newline = next.kind() == CsSyntaxKind::Newline;
        current = next.next_token();
        trivia.push(next);
        if is_newline {
            break;
        }
    }
    trivia
}

/// Trivia preceding `token`, after the previous significant token's trailing
/// trivia
pub fn leading_trivia(token: &CsSyntaxToken) -> Vec<CsSyntaxToken> {
    let mut before = Vec::new();
    let mut current = token.prev_token();
    while let Some(prev) = current.clone() {
        if prev.kind() == CsSyntaxKind::Annotation {
            current = prev.prev_token();
            continue;
        }
        if !prev.kind().is_trivia() {
            break;
        }
        current = prev.prev_token();
        before.push(prev);
    }
    before.reverse();

    if current.is_some() {
        // Drop what belongs to the previous token's trailing trivia
        let owned_by_previous = before
            .iter()
            .position(|trivia| trivia.kind() == CsSyntaxKind::Newline)
            .map_or(before.len(), |index| index + 1);
        before.drain(..owned_by_previous);
    }
    before
}

/// True when a line break occurs in the trivia between two tokens
pub fn has_line_break_between(first: &CsSyntaxToken, second: &CsSyntaxToken) -> bool {
    let mut current = first.next_token();
    while let Some(token) = current {
        if &token == second {
            return false;
        }
        match token.kind() {
            CsSyntaxKind::Newline => return true,
            CsSyntaxKind::MultiLineComment | CsSyntaxKind::DisabledText
                if token.text().contains('\n') =>
            {
                return true;
            }
            _ => {}
        }
        current = token.next_token();
    }
    false
}

/// Whitespace, comments and line breaks directly above `node` that belong to
/// it: its indentation plus any comment lines up to the nearest blank line or
/// directive.
pub fn attached_trivia(node: &CsSyntaxNode) -> Vec<CsSyntaxToken> {
    let Some(first) = node.first_token() else {
        return Vec::new();
    };
    let trivia = leading_trivia(&first);
    let mut start = trivia.len();
    while start > 0 {
        match trivia[start - 1].kind() {
            CsSyntaxKind::Whitespace
            | CsSyntaxKind::SingleLineComment
            | CsSyntaxKind::MultiLineComment
            | CsSyntaxKind::DocComment => start -= 1,
            CsSyntaxKind::Newline => {
                let mut line_start = start - 1;
                while line_start > 0 && trivia[line_start - 1].kind() == CsSyntaxKind::Whitespace {
                    line_start -= 1;
                }
                // a newline ending an empty line separates us from what is above
                if line_start == 0 || trivia[line_start - 1].kind() == CsSyntaxKind::Newline {
                    break;
                }
                start -= 1;
            }
            _ => break,
        }
    }
    trivia[start..].to_vec()
}

/// For a trivia token that sits alone on its line, the token together with
/// its indentation and the line break ending the line.
pub fn own_line(token: &CsSyntaxToken) -> Option<Vec<CsSyntaxToken>> {
    let mut line = Vec::new();
    let previous = prev_rendered(token);
    match &previous {
        None => {}
        Some(prev) if prev.kind() == CsSyntaxKind::Newline => {}
        Some(prev) if prev.kind() == CsSyntaxKind::Whitespace => {
            if prev_rendered(prev).is_some_and(|before| before.kind() != CsSyntaxKind::Newline) {
                return None;
            }
            line.push(prev.clone());
        }
        Some(_) => return None,
    }

    line.push(token.clone());
    match next_rendered(token) {
        None => {}
        Some(next) if next.kind() == CsSyntaxKind::Newline => line.push(next),
        Some(_) => return None,
    }
    Some(line)
}

/// Previous token, skipping annotation markers
pub fn prev_rendered(token: &CsSyntaxToken) -> Option<CsSyntaxToken> {
    let mut current = token.prev_token();
    while let Some(prev) = current {
        if prev.kind() != CsSyntaxKind::Annotation {
            return Some(prev);
        }
        current = prev.prev_token();
    }
    None
}

/// Next token, skipping annotation markers
pub fn next_rendered(token: &CsSyntaxToken) -> Option<CsSyntaxToken> {
    let mut current = token.next_token();
    while let Some(next) = current {
        if next.kind() != CsSyntaxKind::Annotation {
            return Some(next);
        }
        current = next.next_token();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::{CsSyntaxNodeExt, PreprocessorSymbols, parse_csharp};

    fn tokens(source: &str) -> Vec<CsSyntaxToken> {
        parse_csharp(source, &PreprocessorSymbols::new())
            .syntax()
            .significant_tokens()
    }

    fn texts(trivia: &[CsSyntaxToken]) -> Vec<String> {
        trivia.iter().map(|token| token.text().to_string()).collect()
    }

    #[test]
    fn test_trailing_stops_after_newline() {
        let tokens = tokens("int a; // note\n\n  int b;");
        let semicolon = &tokens[2];
        assert_eq!(texts(&trailing_trivia(semicolon)), vec![" ", "// note", "\n"]);
    }

    #[test]
    fn test_leading_excludes_previous_trailing() {
        let tokens = tokens("int a; // note\n\n  int b;");
        let second = &tokens[3];
        assert_eq!(texts(&leading_trivia(second)), vec!["\n", "  "]);
    }

    #[test]
    fn test_leading_of_first_token_is_everything() {
        let tokens = tokens("// header\nint a;");
        assert_eq!(texts(&leading_trivia(&tokens[0])), vec!["// header", "\n"]);
    }

    #[test]
    fn test_attached_trivia_stops_at_blank_line() {
        let parse = parse_csharp(
            "class A\n{\n    // header\n\n    // about b\n    int b;\n}\n",
            &PreprocessorSymbols::new(),
        );
        let field = parse
            .syntax()
            .descendants()
            .find(|node| node.kind() == CsSyntaxKind::FieldDeclaration)
            .unwrap();
        assert_eq!(
            texts(&attached_trivia(&field)),
            vec!["    ", "// about b", "\n", "    "]
        );
    }

    #[test]
    fn test_own_line() {
        let parse = parse_csharp("int a;\n    #region x\nint b; // note\n", &PreprocessorSymbols::new());
        let root = parse.syntax();
        let trivia: Vec<CsSyntaxToken> = root
            .descendants_with_tokens()
            .filter_map(|element| element.into_token())
            .filter(|token| token.kind().is_comment() || token.kind() == CsSyntaxKind::PreprocessorDirective)
            .collect();
        assert_eq!(
            texts(&own_line(&trivia[0]).unwrap()),
            vec!["    ", "#region x", "\n"]
        );
        assert!(own_line(&trivia[1]).is_none());
    }

    #[test]
    fn test_line_break_detection() {
        let tokens = tokens("int a\n= 1;");
        assert!(has_line_break_between(&tokens[1], &tokens[2]));
        assert!(!has_line_break_between(&tokens[0], &tokens[1]));
    }
}
