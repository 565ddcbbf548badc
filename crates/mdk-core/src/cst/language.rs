//! Rowan language implementation for C#
//!
//! Connects [`CsSyntaxKind`] to rowan's generic CST infrastructure.

use rowan::Language;

use super::CsSyntaxKind;

/// Language marker for C# trees
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CsLanguage;

impl Language for CsLanguage {
    type Kind = CsSyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        // Every tree is built from CsSyntaxKind values, so an unknown raw
        // value can only come from a foreign tree.
        CsSyntaxKind::from_raw(raw.0).unwrap_or(CsSyntaxKind::Error)
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}
