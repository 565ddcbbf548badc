//! Entry rules: dotted symbol patterns

use std::fmt;

use thiserror::Error;

/// Why an entry rule could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("empty entry rule")]
    Empty,

    #[error("empty segment in '{0}'")]
    EmptySegment(String),

    #[error("'*' may only be the last segment of '{0}'")]
    MisplacedWildcard(String),

    #[error("'{0}' needs at least one segment before '*'")]
    BareWildcard(String),

    #[error("'{segment}' in '{rule}' is not an identifier")]
    InvalidSegment { rule: String, segment: String },
}

/// A parsed entry rule
///
/// `A.B.C` keeps the type whose qualified path ends with `A.B.C` and the
/// member `C` of a type whose path ends with `A.B`. `A.B.*` keeps every
/// member and nested type of a type whose path ends with `A.B`, but not the
/// type itself. Matching is segment aligned and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolPattern {
    Exact(Vec<String>),
    Members(Vec<String>),
}

impl SymbolPattern {
    pub fn parse(rule: &str) -> Result<Self, PatternError> {
        let rule = rule.trim();
        if rule.is_empty() {
            return Err(PatternError::Empty);
        }
        let segments: Vec<&str> = rule.split('.').collect();
        let last = segments.len() - 1;
        for (index, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                return Err(PatternError::EmptySegment(rule.to_string()));
            }
            if *segment == "*" {
                if index != last {
                    return Err(PatternError::MisplacedWildcard(rule.to_string()));
                }
                continue;
            }
            if !is_identifier(segment) {
                return Err(PatternError::InvalidSegment {
                    rule: rule.to_string(),
                    segment: segment.to_string(),
                });
            }
        }

        let owned = |segments: &[&str]| segments.iter().map(|s| s.to_string()).collect();
        if segments[last] == "*" {
            if last == 0 {
                return Err(PatternError::BareWildcard(rule.to_string()));
            }
            Ok(Self::Members(owned(&segments[..last])))
        } else {
            Ok(Self::Exact(owned(&segments)))
        }
    }

    /// Does the rule keep the type with this qualified path?
    pub fn matches_type(&self, path: &[String]) -> bool {
        match self {
            Self::Exact(segments) => ends_with(path, segments),
            Self::Members(segments) => match path.split_last() {
                Some((_, container)) => ends_with(container, segments),
                None => false,
            },
        }
    }

    /// Does the rule keep member `name` of the type at `type_path`?
    pub fn matches_member(&self, type_path: &[String], name: &str) -> bool {
        match self {
            Self::Exact(segments) => match segments.split_last() {
                Some((last, container)) => {
                    last == name && !container.is_empty() && ends_with(type_path, container)
                }
                None => false,
            },
            Self::Members(segments) => ends_with(type_path, segments),
        }
    }
}

impl fmt::Display for SymbolPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(segments) => write!(f, "{}", segments.join(".")),
            Self::Members(segments) => write!(f, "{}.*", segments.join(".")),
        }
    }
}

fn ends_with(path: &[String], suffix: &[String]) -> bool {
    !suffix.is_empty() && path.ends_with(suffix)
}

pub(crate) fn is_identifier(text: &str) -> bool {
    let text = text.strip_prefix('@').unwrap_or(text);
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|first| first == '_' || first.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
}
