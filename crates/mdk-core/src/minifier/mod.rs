//! Minification postprocessors
//!
//! Levels are cumulative: each one does everything the previous level does.
//!
//! | Level            | Processors                                      |
//! |------------------|-------------------------------------------------|
//! | `none`           | (passthrough)                                   |
//! | `stripcomments`  | [`CommentStripper`]                             |
//! | `lite`           | + [`WhitespaceTrimmer`] keeping line breaks     |
//! | `full`           | + line joining, [`SymbolRenamer`], line wrapper |
//!
//! Nothing inside a `preserve` annotated region is ever touched.

mod comments;
mod renamer;
mod separator;
mod whitespace;

pub use comments::CommentStripper;
pub use renamer::{RUNTIME_NAMES, SymbolRenamer};
pub use separator::requires_separator;
pub use whitespace::WhitespaceTrimmer;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How aggressively the script is minified
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MinifierLevel {
    /// Byte-identical output
    #[default]
    None,
    /// Remove comments and plain regions
    StripComments,
    /// Also collapse whitespace, keeping line structure
    Lite,
    /// Also join lines and shorten identifiers
    Full,
}

impl MinifierLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            MinifierLevel::None => "none",
            MinifierLevel::StripComments => "stripcomments",
            MinifierLevel::Lite => "lite",
            MinifierLevel::Full => "full",
        }
    }
}

impl fmt::Display for MinifierLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown minifier level '{0}' (expected none, stripcomments, lite or full)")]
pub struct ParseLevelError(pub String);

impl FromStr for MinifierLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(MinifierLevel::None),
            "stripcomments" | "strip-comments" => Ok(MinifierLevel::StripComments),
            "lite" => Ok(MinifierLevel::Lite),
            "full" => Ok(MinifierLevel::Full),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        assert!(MinifierLevel::None < MinifierLevel::StripComments);
        assert!(MinifierLevel::StripComments < MinifierLevel::Lite);
        assert!(MinifierLevel::Lite < MinifierLevel::Full);
    }

    #[test]
    fn test_parse_and_display() {
        for level in [
            MinifierLevel::None,
            MinifierLevel::StripComments,
            MinifierLevel::Lite,
            MinifierLevel::Full,
        ] {
            assert_eq!(level.to_string().parse::<MinifierLevel>(), Ok(level));
        }
        assert_eq!("Strip-Comments".parse(), Ok(MinifierLevel::StripComments));
        assert!("extreme".parse::<MinifierLevel>().is_err());
    }
}
