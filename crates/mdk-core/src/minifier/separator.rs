//! Token boundary checks

use crate::cst::{CsSyntaxKind, lex_fragment};

/// True when `left` and `right` would not lex back to the same two tokens if
/// written without anything between them.
///
/// ```rust
/// use mdk_core::minifier::requires_separator;
///
/// assert!(requires_separator("-", "-"));
/// assert!(requires_separator("int", "x"));
/// assert!(!requires_separator("x", "="));
/// ```
pub fn requires_separator(left: &str, right: &str) -> bool {
    if left.is_empty() || right.is_empty() {
        return false;
    }
    let joined = format!("{left}{right}");
    let (tokens, errors) = lex_fragment(&joined);
    if !errors.is_empty() {
        return true;
    }
    let significant: Vec<_> = tokens
        .iter()
        .filter(|token| !token.kind.is_trivia())
        .collect();
    match significant.as_slice() {
        [first, second] => {
            first.text != left
                || second.text != right
                || first.kind == CsSyntaxKind::ErrorToken
                || second.kind == CsSyntaxKind::ErrorToken
        }
        _ => true,
    }
}
