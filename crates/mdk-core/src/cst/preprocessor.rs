//! Preprocessor symbols, directive classification and `#if` expression
//! evaluation.
//!
//! Conditional directives are resolved while lexing, so the parser only ever
//! sees the active branch. Inactive lines survive as `DisabledText` trivia.

use std::collections::BTreeSet;
use std::fmt;

/// The set of defined conditional compilation symbols
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreprocessorSymbols {
    symbols: BTreeSet<String>,
}

impl PreprocessorSymbols {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, symbol: impl Into<String>) {
        self.symbols.insert(symbol.into());
    }

    pub fn undefine(&mut self, symbol: &str) {
        self.symbols.remove(symbol);
    }

    pub fn is_defined(&self, symbol: &str) -> bool {
        self.symbols.contains(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for PreprocessorSymbols {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            symbols: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Directive keyword following `#`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    If,
    Elif,
    Else,
    Endif,
    Define,
    Undef,
    Region,
    EndRegion,
    Pragma,
    Nullable,
    Warning,
    Error,
    Line,
    Other,
}

impl DirectiveKind {
    /// Conditional-compilation directives (`#if` family, `#define`, `#undef`)
    pub fn is_conditional(self) -> bool {
        matches!(
            self,
            DirectiveKind::If
                | DirectiveKind::Elif
                | DirectiveKind::Else
                | DirectiveKind::Endif
                | DirectiveKind::Define
                | DirectiveKind::Undef
        )
    }
}

/// A classified directive line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directive<'a> {
    pub kind: DirectiveKind,
    /// Text after the directive keyword, trimmed and without trailing comment
    pub argument: &'a str,
}

impl<'a> Directive<'a> {
    /// Classify a directive token text such as `#if DEBUG // note`.
    ///
    /// Returns `None` when the text does not start with `#`.
    pub fn parse(text: &'a str) -> Option<Self> {
        let rest = text.trim_start().strip_prefix('#')?.trim_start();
        let keyword_end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let (keyword, tail) = rest.split_at(keyword_end);

        let kind = match keyword {
            "if" => DirectiveKind::If,
            "elif" => DirectiveKind::Elif,
            "else" => DirectiveKind::Else,
            "endif" => DirectiveKind::Endif,
            "define" => DirectiveKind::Define,
            "undef" => DirectiveKind::Undef,
            "region" => DirectiveKind::Region,
            "endregion" => DirectiveKind::EndRegion,
            "pragma" => DirectiveKind::Pragma,
            "nullable" => DirectiveKind::Nullable,
            "warning" => DirectiveKind::Warning,
            "error" => DirectiveKind::Error,
            "line" => DirectiveKind::Line,
            _ => DirectiveKind::Other,
        };

        // Region names and messages are free text; everything else may carry a
        // trailing single-line comment.
        let argument = match kind {
            DirectiveKind::Region
            | DirectiveKind::EndRegion
            | DirectiveKind::Warning
            | DirectiveKind::Error => tail.trim(),
            _ => match tail.find("//") {
                Some(index) => tail[..index].trim(),
                None => tail.trim(),
            },
        };

        Some(Self { kind, argument })
    }
}

/// Error raised by a malformed `#if`/`#elif` expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionError(pub String);

impl fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ExprToken<'a> {
    Symbol(&'a str),
    True,
    False,
    Not,
    And,
    Or,
    Eq,
    NotEq,
    LParen,
    RParen,
}

fn tokenize_expression(expr: &str) -> Result<Vec<ExprToken<'_>>, ExpressionError> {
    let mut tokens = Vec::new();
    let bytes = expr.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b' ' | b'\t' => i += 1,
            b'(' => {
                tokens.push(ExprToken::LParen);
                i += 1;
            }
            b')' => {
                tokens.push(ExprToken::RParen);
                i += 1;
            }
            b'!' if bytes.get(i + 1) == Some(&b'=') => {
                tokens.push(ExprToken::NotEq);
                i += 2;
            }
            b'!' => {
                tokens.push(ExprToken::Not);
                i += 1;
            }
            b'=' if bytes.get(i + 1) == Some(&b'=') => {
                tokens.push(ExprToken::Eq);
                i += 2;
            }
            b'&' if bytes.get(i + 1) == Some(&b'&') => {
                tokens.push(ExprToken::And);
                i += 2;
            }
            b'|' if bytes.get(i + 1) == Some(&b'|') => {
                tokens.push(ExprToken::Or);
                i += 2;
            }
            c if c == b'_' || c.is_ascii_alphanumeric() => {
                let start = i;
                while i < bytes.len() && (bytes[i] == b'_' || bytes[i].is_ascii_alphanumeric()) {
                    i += 1;
                }
                tokens.push(match &expr[start..i] {
                    "true" => ExprToken::True,
                    "false" => ExprToken::False,
                    symbol => ExprToken::Symbol(symbol),
                });
            }
            _ => {
                return Err(ExpressionError(format!(
                    "unexpected character '{}' in preprocessor expression",
                    &expr[i..].chars().next().unwrap_or('?')
                )));
            }
        }
    }

    Ok(tokens)
}

struct ExprParser<'t, 'a> {
    tokens: &'t [ExprToken<'a>],
    pos: usize,
    symbols: &'t PreprocessorSymbols,
}

impl ExprParser<'_, '_> {
    fn peek(&self) -> Option<&ExprToken<'_>> {
        self.tokens.get(self.pos)
    }

    fn or(&mut self) -> Result<bool, ExpressionError> {
        let mut value = self.and()?;
        while self.peek() == Some(&ExprToken::Or) {
            self.pos += 1;
            let rhs = self.and()?;
            value = value || rhs;
        }
        Ok(value)
    }

    fn and(&mut self) -> Result<bool, ExpressionError> {
        let mut value = self.equality()?;
        while self.peek() == Some(&ExprToken::And) {
            self.pos += 1;
            let rhs = self.equality()?;
            value = value && rhs;
        }
        Ok(value)
    }

    fn equality(&mut self) -> Result<bool, ExpressionError> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(ExprToken::Eq) => {
                    self.pos += 1;
                    value = value == self.unary()?;
                }
                Some(ExprToken::NotEq) => {
                    self.pos += 1;
                    value = value != self.unary()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> Result<bool, ExpressionError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| ExpressionError("unexpected end of preprocessor expression".into()))?;
        self.pos += 1;
        match token {
            ExprToken::Not => Ok(!self.unary()?),
            ExprToken::True => Ok(true),
            ExprToken::False => Ok(false),
            ExprToken::Symbol(symbol) => Ok(self.symbols.is_defined(symbol)),
            ExprToken::LParen => {
                let value = self.or()?;
                if self.peek() != Some(&ExprToken::RParen) {
                    return Err(ExpressionError("expected ')' in preprocessor expression".into()));
                }
                self.pos += 1;
                Ok(value)
            }
            other => Err(ExpressionError(format!(
                "unexpected {other:?} in preprocessor expression"
            ))),
        }
    }
}

/// Evaluate a `#if`/`#elif` expression against the defined symbols
pub fn evaluate(expr: &str, symbols: &PreprocessorSymbols) -> Result<bool, ExpressionError> {
    let tokens = tokenize_expression(expr)?;
    if tokens.is_empty() {
        return Err(ExpressionError("empty preprocessor expression".into()));
    }

    let mut parser = ExprParser {
        tokens: &tokens,
        pos: 0,
        symbols,
    };
    let value = parser.or()?;
    if parser.pos != tokens.len() {
        return Err(ExpressionError(
            "trailing tokens in preprocessor expression".into(),
        ));
    }
    Ok(value)
}
