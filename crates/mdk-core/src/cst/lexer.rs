//! CST-aware C# lexer that preserves all trivia
//!
//! Every byte of the input ends up in exactly one token, so concatenating the
//! token texts reproduces the source. Preprocessor conditionals are evaluated
//! on the fly: lines inside inactive `#if` branches become `DisabledText`
//! trivia and never reach the parser.

use std::ops::Range;

use super::CsSyntaxKind;
use super::preprocessor::{Directive, DirectiveKind, PreprocessorSymbols, evaluate};

/// Simple span representing a range in the source
pub type CstSpan = Range<usize>;

/// A lexer error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerError {
    pub message: String,
    pub span: CstSpan,
}

impl LexerError {
    pub fn new(message: impl Into<String>, span: CstSpan) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// A token with its syntax kind and span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CstToken {
    pub kind: CsSyntaxKind,
    pub text: String,
    pub span: CstSpan,
}

impl CstToken {
    pub fn new(kind: CsSyntaxKind, text: impl Into<String>, span: CstSpan) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}

/// Result returned by the CST lexer
pub type CstLexResult = (Vec<CstToken>, Vec<LexerError>);

/// Lex a whole source file, resolving preprocessor conditionals against
/// `symbols`. `#define`/`#undef` directives only affect this file.
pub fn lex_with_trivia(input: &str, symbols: &PreprocessorSymbols) -> CstLexResult {
    Lexer::new(input, Some(symbols.clone())).run()
}

/// Lex a code fragment without directive handling.
///
/// Used for token-boundary checks and interpolation holes, where a `#` can
/// never start a directive.
pub fn lex_fragment(input: &str) -> CstLexResult {
    Lexer::new(input, None).run()
}

#[derive(Debug, Clone, Copy)]
struct Condition {
    parent_active: bool,
    taken: bool,
    active: bool,
    seen_else: bool,
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<CstToken>,
    errors: Vec<LexerError>,
    /// `None` disables directive processing
    symbols: Option<PreprocessorSymbols>,
    conditions: Vec<Condition>,
    at_line_start: bool,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str, symbols: Option<PreprocessorSymbols>) -> Self {
        Self {
            input,
            pos: 0,
            tokens: Vec::new(),
            errors: Vec::new(),
            symbols,
            conditions: Vec::new(),
            at_line_start: true,
        }
    }

    fn run(mut self) -> CstLexResult {
        while self.pos < self.input.len() {
            self.next_token();
        }

        if self.symbols.is_some() && !self.conditions.is_empty() {
            self.errors.push(LexerError::new(
                "#endif directive expected",
                span(self.input.len(), self.input.len()),
            ));
        }

        (self.tokens, self.errors)
    }

    fn is_active(&self) -> bool {
        self.conditions.last().is_none_or(|condition| condition.active)
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn push(&mut self, kind: CsSyntaxKind, start: usize) {
        let text = &self.input[start..self.pos];
        self.tokens.push(CstToken::new(kind, text, span(start, self.pos)));
    }

    fn rest_of_line_end(&self, from: usize) -> usize {
        self.input[from..]
            .find(['\n', '\r'])
            .map_or(self.input.len(), |offset| from + offset)
    }

    fn next_token(&mut self) {
        let start = self.pos;
        let Some(current) = self.peek() else {
            return;
        };

        if current == '\n' || current == '\r' {
            self.pos += 1;
            if current == '\r' && self.peek() == Some('\n') {
                self.pos += 1;
            }
            self.push(CsSyntaxKind::Newline, start);
            self.at_line_start = true;
            return;
        }

        if is_whitespace(current) {
            while self.peek().is_some_and(is_whitespace) {
                self.pos += self.peek().map_or(1, char::len_utf8);
            }
            self.push(CsSyntaxKind::Whitespace, start);
            return;
        }

        if self.at_line_start && self.symbols.is_some() {
            self.at_line_start = false;
            if current == '#' {
                self.pos = self.rest_of_line_end(start);
                self.push(CsSyntaxKind::PreprocessorDirective, start);
                self.handle_directive(start);
                return;
            }
            if !self.is_active() {
                self.pos = self.rest_of_line_end(start);
                self.push(CsSyntaxKind::DisabledText, start);
                return;
            }
        }
        self.at_line_start = false;

        match current {
            '/' if self.peek_at(1) == Some('/') => self.lex_line_comment(start),
            '/' if self.peek_at(1) == Some('*') => self.lex_block_comment(start),
            '"' => self.lex_string(start),
            '\'' => self.lex_char(start),
            '@' if self.peek_at(1) == Some('"') => {
                self.pos += 1;
                self.lex_verbatim_string(start);
            }
            '@' if self.peek_at(1) == Some('$') && self.peek_at(2) == Some('"') => {
                self.pos += 2;
                self.lex_interpolated(start, true);
            }
            '$' if self.peek_at(1) == Some('"') => {
                self.pos += 1;
                self.lex_interpolated(start, false);
            }
            '$' if self.peek_at(1) == Some('@') && self.peek_at(2) == Some('"') => {
                self.pos += 2;
                self.lex_interpolated(start, true);
            }
            '@' if self.peek_at(1).is_some_and(is_ident_start) => {
                self.pos += 1;
                self.consume_ident_rest();
                self.push(CsSyntaxKind::Identifier, start);
            }
            c if is_ident_start(c) => {
                self.consume_ident_rest();
                let kind = CsSyntaxKind::from_keyword(&self.input[start..self.pos])
                    .unwrap_or(CsSyntaxKind::Identifier);
                self.push(kind, start);
            }
            c if c.is_ascii_digit() => self.lex_number(start),
            '.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.lex_number(start),
            _ => self.lex_punctuation(start, current),
        }
    }

    fn handle_directive(&mut self, start: usize) {
        let input = self.input;
        let Some(directive) = Directive::parse(&input[start..self.pos]) else {
            return;
        };
        let directive_span = span(start, self.pos);

        match directive.kind {
            DirectiveKind::If => {
                let parent_active = self.is_active();
                let value = parent_active && self.evaluate(directive.argument, &directive_span);
                self.conditions.push(Condition {
                    parent_active,
                    taken: value,
                    active: value,
                    seen_else: false,
                });
            }
            DirectiveKind::Elif => {
                let Some(condition) = self.conditions.last().copied() else {
                    self.errors.push(LexerError::new(
                        "unexpected #elif without matching #if",
                        directive_span,
                    ));
                    return;
                };
                if condition.seen_else {
                    self.errors.push(LexerError::new(
                        "#elif cannot follow #else",
                        directive_span.clone(),
                    ));
                }
                let value = condition.parent_active
                    && !condition.taken
                    && self.evaluate(directive.argument, &directive_span);
                if let Some(top) = self.conditions.last_mut() {
                    top.active = value;
                    top.taken |= value;
                }
            }
            DirectiveKind::Else => match self.conditions.last_mut() {
                Some(top) => {
                    top.active = top.parent_active && !top.taken;
                    top.taken = true;
                    top.seen_else = true;
                }
                None => self.errors.push(LexerError::new(
                    "unexpected #else without matching #if",
                    directive_span,
                )),
            },
            DirectiveKind::Endif => {
                if self.conditions.pop().is_none() {
                    self.errors.push(LexerError::new(
                        "unexpected #endif without matching #if",
                        directive_span,
                    ));
                }
            }
            DirectiveKind::Define if self.is_active() => {
                let symbol = directive.argument.to_string();
                if let Some(symbols) = self.symbols.as_mut() {
                    symbols.define(symbol);
                }
            }
            DirectiveKind::Undef if self.is_active() => {
                let symbol = directive.argument.to_string();
                if let Some(symbols) = self.symbols.as_mut() {
                    symbols.undefine(&symbol);
                }
            }
            _ => {}
        }
    }

    fn evaluate(&mut self, expr: &str, directive_span: &CstSpan) -> bool {
        let Some(symbols) = self.symbols.as_ref() else {
            return false;
        };
        match evaluate(expr, symbols) {
            Ok(value) => value,
            Err(error) => {
                self.errors
                    .push(LexerError::new(error.to_string(), directive_span.clone()));
                false
            }
        }
    }

    fn lex_line_comment(&mut self, start: usize) {
        let rest = &self.input[start..];
        let is_doc = rest.starts_with("///") && !rest.starts_with("////");
        self.pos = self.rest_of_line_end(start);
        let kind = if is_doc {
            CsSyntaxKind::DocComment
        } else {
            CsSyntaxKind::SingleLineComment
        };
        self.push(kind, start);
    }

    fn lex_block_comment(&mut self, start: usize) {
        match self.input[start + 2..].find("*/") {
            Some(offset) => self.pos = start + 2 + offset + 2,
            None => {
                self.pos = self.input.len();
                self.errors.push(LexerError::new(
                    "unterminated block comment",
                    span(start, self.pos),
                ));
            }
        }
        self.push(CsSyntaxKind::MultiLineComment, start);
    }

    fn lex_string(&mut self, start: usize) {
        self.pos = start + 1;
        if !self.skip_regular_body('"') {
            self.errors.push(LexerError::new(
                "unterminated string literal",
                span(start, self.pos),
            ));
        }
        self.push(CsSyntaxKind::StringLiteral, start);
    }

    fn lex_char(&mut self, start: usize) {
        self.pos = start + 1;
        if !self.skip_regular_body('\'') {
            self.errors.push(LexerError::new(
                "unterminated character literal",
                span(start, self.pos),
            ));
        }
        self.push(CsSyntaxKind::CharLiteral, start);
    }

    /// Skip an escaped body up to and including `quote`. Stops before a line
    /// break and returns `false` when the literal is unterminated.
    fn skip_regular_body(&mut self, quote: char) -> bool {
        while let Some(c) = self.peek() {
            match c {
                '\\' => {
                    self.pos += 1;
                    if let Some(escaped) = self.peek()
                        && escaped != '\n'
                        && escaped != '\r'
                    {
                        self.pos += escaped.len_utf8();
                    }
                }
                '\n' | '\r' => return false,
                c if c == quote => {
                    self.pos += 1;
                    return true;
                }
                c => self.pos += c.len_utf8(),
            }
        }
        false
    }

    /// `self.pos` is on the opening quote.
    fn lex_verbatim_string(&mut self, start: usize) {
        self.pos += 1;
        if !self.skip_verbatim_body() {
            self.errors.push(LexerError::new(
                "unterminated verbatim string literal",
                span(start, self.pos),
            ));
        }
        self.push(CsSyntaxKind::VerbatimStringLiteral, start);
    }

    fn skip_verbatim_body(&mut self) -> bool {
        while let Some(c) = self.peek() {
            self.pos += c.len_utf8();
            if c == '"' {
                if self.peek() == Some('"') {
                    self.pos += 1;
                } else {
                    return true;
                }
            }
        }
        false
    }

    /// `self.pos` is on the opening quote.
    fn lex_interpolated(&mut self, start: usize, verbatim: bool) {
        self.pos += 1;
        if !self.skip_interpolated_body(verbatim) {
            self.errors.push(LexerError::new(
                "unterminated interpolated string literal",
                span(start, self.pos),
            ));
        }
        self.push(CsSyntaxKind::InterpolatedStringLiteral, start);
    }

    fn skip_interpolated_body(&mut self, verbatim: bool) -> bool {
        while let Some(c) = self.peek() {
            match c {
                '"' if verbatim && self.peek_at(1) == Some('"') => self.pos += 2,
                '"' => {
                    self.pos += 1;
                    return true;
                }
                '\\' if !verbatim => {
                    self.pos += 1;
                    if let Some(escaped) = self.peek()
                        && escaped != '\n'
                    {
                        self.pos += escaped.len_utf8();
                    }
                }
                '\n' | '\r' if !verbatim => return false,
                '{' if self.peek_at(1) == Some('{') => self.pos += 2,
                '}' if self.peek_at(1) == Some('}') => self.pos += 2,
                '{' => {
                    self.pos += 1;
                    if !self.skip_hole() {
                        return false;
                    }
                }
                c => self.pos += c.len_utf8(),
            }
        }
        false
    }

    /// Skip an interpolation hole up to and including its closing brace.
    fn skip_hole(&mut self) -> bool {
        let mut depth = 1usize;
        while let Some(c) = self.peek() {
            match c {
                '{' => {
                    depth += 1;
                    self.pos += 1;
                }
                '}' => {
                    self.pos += 1;
                    depth -= 1;
                    if depth == 0 {
                        return true;
                    }
                }
                '"' => {
                    self.pos += 1;
                    if !self.skip_regular_body('"') {
                        return false;
                    }
                }
                '\'' => {
                    self.pos += 1;
                    if !self.skip_regular_body('\'') {
                        return false;
                    }
                }
                '@' if self.peek_at(1) == Some('"') => {
                    self.pos += 2;
                    if !self.skip_verbatim_body() {
                        return false;
                    }
                }
                '$' if self.peek_at(1) == Some('"') => {
                    self.pos += 2;
                    if !self.skip_interpolated_body(false) {
                        return false;
                    }
                }
                c => self.pos += c.len_utf8(),
            }
        }
        false
    }

    fn consume_ident_rest(&mut self) {
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn lex_number(&mut self, start: usize) {
        let bytes = self.input.as_bytes();
        let mut i = start;
        let radix_prefix = bytes.get(i) == Some(&b'0')
            && matches!(bytes.get(i + 1), Some(b'x' | b'X' | b'b' | b'B'));

        if radix_prefix {
            i += 2;
            while i < bytes.len() && (bytes[i].is_ascii_hexdigit() || bytes[i] == b'_') {
                i += 1;
            }
        } else {
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
                i += 1;
            }
            if bytes.get(i) == Some(&b'.') && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
                i += 1;
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
                    i += 1;
                }
            }
            if matches!(bytes.get(i), Some(b'e' | b'E')) {
                let mut j = i + 1;
                if matches!(bytes.get(j), Some(b'+' | b'-')) {
                    j += 1;
                }
                if bytes.get(j).is_some_and(u8::is_ascii_digit) {
                    i = j;
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
        }

        while i < bytes.len()
            && matches!(
                bytes[i],
                b'u' | b'U' | b'l' | b'L' | b'f' | b'F' | b'd' | b'D' | b'm' | b'M'
            )
        {
            i += 1;
        }

        self.pos = i;
        self.push(CsSyntaxKind::NumericLiteral, start);
    }

    fn lex_punctuation(&mut self, start: usize, current: char) {
        let rest = &self.input[start..];
        for len in [3, 2, 1] {
            let Some(candidate) = rest.get(..len) else {
                continue;
            };
            let Some(kind) = CsSyntaxKind::from_punctuation(candidate) else {
                continue;
            };
            // `a?.5:b` is a conditional, not a null-conditional access
            if kind == CsSyntaxKind::QuestionDot
                && rest.as_bytes().get(2).is_some_and(u8::is_ascii_digit)
            {
                continue;
            }
            self.pos = start + len;
            self.push(kind, start);
            return;
        }

        self.pos = start + current.len_utf8();
        self.push(CsSyntaxKind::ErrorToken, start);
        self.errors.push(LexerError::new(
            format!("unexpected character '{current}'"),
            span(start, self.pos),
        ));
    }
}

fn is_whitespace(c: char) -> bool {
    c != '\n' && c != '\r' && (c.is_whitespace() || c == '\u{feff}')
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

fn span(start: usize, end: usize) -> CstSpan {
    start..end
}

/// Byte ranges of the expression part of each interpolation hole in an
/// interpolated string literal's text. Format specifiers (`:F2`) and
/// alignment clauses (`,10`) are excluded.
pub fn interpolation_holes(literal: &str) -> Vec<CstSpan> {
    let bytes = literal.as_bytes();
    let verbatim = literal.starts_with("$@") || literal.starts_with("@$");
    let mut holes = Vec::new();
    let Some(open_quote) = literal.find('"') else {
        return holes;
    };
    let mut i = open_quote + 1;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' if !verbatim => i += 2,
            b'{' | b'}' if bytes.get(i + 1) == Some(&bytes[i]) => i += 2,
            b'{' => {
                let expr_start = i + 1;
                let mut j = expr_start;
                let mut depth = 0usize;
                let mut expr_end = None;
                while j < bytes.len() {
                    match bytes[j] {
                        b'(' | b'[' | b'{' => depth += 1,
                        b')' | b']' => depth = depth.saturating_sub(1),
                        b'}' if depth > 0 => depth -= 1,
                        b'}' => {
                            expr_end.get_or_insert(j);
                            break;
                        }
                        b':' | b',' if depth == 0 => {
                            expr_end.get_or_insert(j);
                        }
                        b'"' | b'\'' => {
                            let quote = bytes[j];
                            j += 1;
                            while j < bytes.len() && bytes[j] != quote {
                                if bytes[j] == b'\\' {
                                    j += 1;
                                }
                                j += 1;
                            }
                        }
                        _ => {}
                    }
                    j += 1;
                }
                let end = expr_end.unwrap_or(j.min(bytes.len()));
                holes.push(expr_start..end);
                i = j + 1;
            }
            _ => i += 1,
        }
    }

    holes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<CsSyntaxKind> {
        lex_fragment(input).0.into_iter().map(|t| t.kind).collect()
    }

    fn texts(input: &str) -> Vec<String> {
        lex_fragment(input)
            .0
            .into_iter()
            .filter(|t| !t.kind.is_trivia())
            .map(|t| t.text)
            .collect()
    }

    fn reconstruct(tokens: &[CstToken]) -> String {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_lossless_reconstruction() {
        let input = "using System;\r\n\n// hi\nclass A { /* x */ int b = 0x1F; string s = @\"a\"\"b\"; }\n";
        let (tokens, errors) = lex_with_trivia(input, &PreprocessorSymbols::new());
        assert!(errors.is_empty());
        assert_eq!(reconstruct(&tokens), input);
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("class var @class"),
            vec![
                CsSyntaxKind::ClassKw,
                CsSyntaxKind::Whitespace,
                CsSyntaxKind::Identifier,
                CsSyntaxKind::Whitespace,
                CsSyntaxKind::Identifier,
            ]
        );
    }

    #[test]
    fn test_operators_maximal_munch() {
        assert_eq!(texts("a+=b++"), vec!["a", "+=", "b", "++"]);
        assert_eq!(texts("x??=y"), vec!["x", "??=", "y"]);
        assert_eq!(texts("2--1"), vec!["2", "--", "1"]);
        assert_eq!(texts("a=>b"), vec!["a", "=>", "b"]);
    }

    #[test]
    fn test_greater_than_never_fused() {
        assert_eq!(texts("List<List<int>>"), vec!["List", "<", "List", "<", "int", ">", ">"]);
        assert_eq!(texts("a>>=1"), vec!["a", ">", ">=", "1"]);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(texts("1.5f"), vec!["1.5f"]);
        assert_eq!(texts("1..2"), vec!["1", "..", "2"]);
        assert_eq!(texts(".5"), vec![".5"]);
        assert_eq!(texts("1e-3"), vec!["1e-3"]);
        assert_eq!(texts("a.b"), vec!["a", ".", "b"]);
        assert_eq!(texts("a?.5:b"), vec!["a", "?", ".5", ":", "b"]);
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(
            kinds("\"a\\\"b\""),
            vec![CsSyntaxKind::StringLiteral]
        );
        assert_eq!(
            kinds("$\"x {y + \"}\"} z\""),
            vec![CsSyntaxKind::InterpolatedStringLiteral]
        );
        assert_eq!(
            kinds("$@\"a\"\"{b}\""),
            vec![CsSyntaxKind::InterpolatedStringLiteral]
        );
        assert_eq!(kinds("'\\''"), vec![CsSyntaxKind::CharLiteral]);
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            kinds("/// doc\n// line\n/* block */"),
            vec![
                CsSyntaxKind::DocComment,
                CsSyntaxKind::Newline,
                CsSyntaxKind::SingleLineComment,
                CsSyntaxKind::Newline,
                CsSyntaxKind::MultiLineComment,
            ]
        );
        assert_eq!(texts("a//b"), vec!["a"]);
    }

    #[test]
    fn test_inactive_branch_becomes_disabled_text() {
        let input = "#if DEBUG\n    Echo(\"debug\");\n#else\nEcho(\"release\");\n#endif\n";
        let (tokens, errors) = lex_with_trivia(input, &PreprocessorSymbols::new());
        assert!(errors.is_empty());
        assert_eq!(reconstruct(&tokens), input);

        let significant: Vec<&str> = tokens
            .iter()
            .filter(|t| !t.kind.is_trivia())
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(significant, vec!["Echo", "(", "\"release\"", ")", ";"]);
        assert!(tokens.iter().any(|t| t.kind == CsSyntaxKind::DisabledText
            && t.text == "Echo(\"debug\");"));
    }

    #[test]
    fn test_active_branch_with_symbol() {
        let symbols: PreprocessorSymbols = ["DEBUG"].into_iter().collect();
        let input = "#if DEBUG\nA();\n#elif TRACE\nB();\n#endif\n";
        let (tokens, _) = lex_with_trivia(input, &symbols);
        let significant: Vec<&str> = tokens
            .iter()
            .filter(|t| !t.kind.is_trivia())
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(significant, vec!["A", "(", ")", ";"]);
    }

    #[test]
    fn test_define_in_file() {
        let input = "#define FOO\n#if FOO\nA();\n#endif\n";
        let (tokens, _) = lex_with_trivia(input, &PreprocessorSymbols::new());
        assert!(tokens.iter().any(|t| t.text == "A"));
    }

    #[test]
    fn test_unbalanced_directives_report_errors() {
        let (_, errors) = lex_with_trivia("#if DEBUG\nA();\n", &PreprocessorSymbols::new());
        assert_eq!(errors.len(), 1);
        let (_, errors) = lex_with_trivia("#endif\n", &PreprocessorSymbols::new());
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_hash_mid_line_is_not_a_directive() {
        let (tokens, errors) = lex_with_trivia("a #if", &PreprocessorSymbols::new());
        assert!(!errors.is_empty());
        assert!(tokens.iter().all(|t| t.kind != CsSyntaxKind::PreprocessorDirective));
    }

    #[test]
    fn test_interpolation_holes() {
        let literal = "$\"a {b} {c:F2} {{x}} {d,5} {f(g, h)}\"";
        let holes: Vec<&str> = interpolation_holes(literal)
            .into_iter()
            .map(|range| &literal[range])
            .collect();
        assert_eq!(holes, vec!["b", "c", "d", "f(g, h)"]);
    }
}
