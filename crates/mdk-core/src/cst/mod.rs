//! Concrete Syntax Tree (CST) for C#
//!
//! This module implements a lossless syntax tree using the Rowan library.
//! The CST preserves all source information including whitespace, comments,
//! and preprocessor directives, enabling:
//! - Byte-identical rendering of unmodified documents
//! - Tree rewrites that keep the formatting of everything they do not touch
//! - Token-accurate minification
//!
//! ## Architecture
//!
//! The CST uses Rowan's green/red tree pattern:
//!
//! - **Green Tree**: Immutable, position-independent storage
//!   - Stores actual source text with trivia (whitespace, comments)
//!   - Deduplicates identical subtrees for memory efficiency
//!   - Cheap to clone (uses Arc internally) and `Send + Sync`
//!
//! - **Red Tree**: Dynamically constructed view with parent pointers
//!   - Created on-demand for traversal
//!   - Provides typed AST-like API
//!   - Enables efficient parent/sibling navigation
//!
//! Documents keep green roots; processors build a red view when they run.
//!
//! ## Trivia Handling
//!
//! Trivia are stored as tokens between the significant tokens:
//! - **Leading trivia**: Everything before a token (whitespace, comments)
//! - **Trailing trivia**: Everything until the next line break
//!
//! Annotated regions are `AnnotatedRegion` nodes whose first token is a
//! non-rendered `Annotation` token holding the tag list. Use
//! [`CsSyntaxNodeExt::render`] (not `text()`) to get the source text.
//!
//! This enables lossless representation: `parse(source).text() == source`
//!
//! ## Example
//!
//! ```rust
//! use mdk_core::cst::{CsSyntaxKind, PreprocessorSymbols, parse_csharp};
//!
//! let source = "class Program // entry\n{\n}\n";
//! let parse = parse_csharp(source, &PreprocessorSymbols::new());
//!
//! assert_eq!(parse.syntax().text().to_string(), source);
//!
//! let comments = parse
//!     .syntax()
//!     .descendants_with_tokens()
//!     .filter_map(|element| element.into_token())
//!     .filter(|token| token.kind() == CsSyntaxKind::SingleLineComment)
//!     .count();
//! assert_eq!(comments, 1);
//! ```

mod builder;
mod language;
mod lexer;
mod nodes;
mod parser;
mod preprocessor;
mod syntax_kind;

pub mod ast;
pub mod rewrite;
pub mod trivia;

pub use builder::CstBuilder;
pub use language::CsLanguage;
pub use lexer::{
    CstLexResult, CstSpan, CstToken, LexerError, interpolation_holes, lex_fragment,
    lex_with_trivia,
};
pub use nodes::*;
pub use parser::{Parse, ParseError, ParseErrorKind, parse_csharp};
pub use preprocessor::{
    Directive, DirectiveKind, ExpressionError, PreprocessorSymbols, evaluate as evaluate_condition,
};
pub use rewrite::TreeEdit;
pub use syntax_kind::CsSyntaxKind;
