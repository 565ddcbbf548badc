//! Identifier shortening
//!
//! Renaming is keyed by name over the whole merged unit: a name is either
//! renamed everywhere or nowhere. That keeps overloads, partial types and
//! shadowed locals consistent without any binding analysis, at the price of
//! leaving a name alone as soon as one of its uses might refer to code we do
//! not own.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::cst::ast::{AstNode, TypeDeclaration, has_annotation, token_has_annotation};
use crate::cst::{
    CsSyntaxKind, CsSyntaxNode, CsSyntaxNodeExt, CsSyntaxToken, TreeEdit, interpolation_holes,
    lex_fragment,
};
use crate::pipeline::{DocumentProcessor, PackContext, Processor};
use crate::project::Document;
use crate::result::Result;
use crate::trimmer::{
    PRESERVE_TAG, SymbolPattern, identifier_name, is_identifier, is_visible, string_content,
    token_names,
};

/// Names the game runtime binds to by name
pub const RUNTIME_NAMES: &[&str] = &[
    "Main",
    "Save",
    "Program",
    "Runtime",
    "Storage",
    "Me",
    "GridTerminalSystem",
    "IGC",
    "Echo",
];

const CONTEXTUAL_KEYWORDS: &[&str] = &[
    "add", "alias", "and", "args", "ascending", "async", "await", "by", "descending", "dynamic",
    "equals", "file", "from", "get", "global", "group", "init", "into", "join", "let", "managed",
    "nameof", "nint", "not", "notnull", "nuint", "on", "or", "orderby", "partial", "record",
    "remove", "required", "scoped", "select", "set", "unmanaged", "value", "var", "when", "where",
    "with", "yield",
];

/// Contextual keywords that introduce a range variable
const QUERY_INTRODUCERS: &[&str] = &["from", "let", "join", "into"];

/// Contextual keywords that may follow an expression operand
const OPERAND_FOLLOWERS: &[&str] = &[
    "and", "ascending", "by", "descending", "equals", "into", "on", "or", "when", "with",
];

/// Shortens the names of declarations that are private to the script
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolRenamer;

impl Processor for SymbolRenamer {
    fn name(&self) -> &str {
        "symbol-renamer"
    }

    fn run_before(&self) -> &[&str] {
        &["whitespace-trimmer"]
    }
}

impl DocumentProcessor for SymbolRenamer {
    fn process(&self, document: Document, context: &PackContext) -> Result<Document> {
        let options = context.options();
        let root = document.syntax();
        let tokens = root.significant_tokens();

        let mut declared = Declarations::default();
        let mut type_parameters = HashSet::new();
        let our_types = declare_types_and_members(
            &root,
            &options.entry_points,
            &mut declared,
            &mut type_parameters,
        );
        declare_parameters(&root, &mut declared);
        declare_locals(&tokens, &mut declared);

        let unsafe_names = unsafe_names(&tokens, &our_types, &type_parameters);
        let usage = usage(&root);
        let reserved: HashSet<&str> = CONTEXTUAL_KEYWORDS
            .iter()
            .chain(RUNTIME_NAMES)
            .copied()
            .chain(options.preserve_names.iter().map(String::as_str))
            .collect();

        let mut candidates: Vec<(&str, usize, usize)> = declared
            .0
            .iter()
            .filter(|(name, renamable)| {
                **renamable
                    && !reserved.contains(name.as_str())
                    && !unsafe_names.contains(*name)
                    && !is_keyword(name)
            })
            .filter_map(|(name, _)| {
                let (first_seen, _, count) = usage.get_full(name)?;
                Some((name.as_str(), *count, first_seen))
            })
            .collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        let renames = assign_names(&candidates, &usage);
        if renames.is_empty() {
            return Ok(document);
        }
        for (old, new) in &renames {
            debug!("Renaming {} -> {}", old, new);
        }

        let mut edit = TreeEdit::new();
        for token in root
            .descendants_with_tokens()
            .filter_map(|element| element.into_token())
        {
            match token.kind() {
                CsSyntaxKind::Identifier => {
                    if let Some(new) = renames.get(identifier_name(token.text())) {
                        edit.replace_token_text(&token, new);
                    }
                }
                CsSyntaxKind::InterpolatedStringLiteral => {
                    if let Some(text) = rename_in_holes(token.text(), &renames) {
                        edit.replace_token_text(&token, &text);
                    }
                }
                _ => {}
            }
        }

        info!("Renamed {} symbol(s) in {}", renames.len(), document.name());
        Ok(document.with_root(edit.apply(&root)))
    }
}

/// Declared names and whether every one of their declarations may be
/// renamed
#[derive(Debug, Default)]
struct Declarations(IndexMap<String, bool>);

impl Declarations {
    fn declare(&mut self, name: &str, renamable: bool) {
        let entry = self
            .0
            .entry(identifier_name(name).to_string())
            .or_insert(true);
        *entry &= renamable;
    }
}

/// Declare type, type parameter and member names; returns every type name
fn declare_types_and_members(
    root: &CsSyntaxNode,
    rules: &[SymbolPattern],
    declared: &mut Declarations,
    type_parameters: &mut HashSet<String>,
) -> HashSet<String> {
    let mut type_names = HashSet::new();
    for ty in root.descendants().filter_map(TypeDeclaration::cast) {
        let path = ty.qualified_path();
        let preserved = has_annotation(ty.syntax(), PRESERVE_TAG);

        if let Some(name) = ty.name() {
            let renamable = !preserved
                && !is_visible(ty.syntax())
                && !name.ends_with("Attribute")
                && !rules.iter().any(|rule| rule.matches_type(&path));
            declared.declare(&name, renamable);
            type_names.insert(name);
        }
        for parameter in ty.type_parameters() {
            declared.declare(parameter.text(), !preserved);
            type_parameters.insert(identifier_name(parameter.text()).to_string());
        }

        let locked = matches!(
            ty.kind(),
            CsSyntaxKind::InterfaceDeclaration | CsSyntaxKind::EnumDeclaration
        );
        for member in ty.members() {
            if matches!(
                member.kind(),
                CsSyntaxKind::ConstructorDeclaration | CsSyntaxKind::DestructorDeclaration
            ) {
                continue;
            }
            let member_preserved = has_annotation(member.syntax(), PRESERVE_TAG);
            let names = member.names();
            let renamable = !locked
                && !member_preserved
                && member.kind() != CsSyntaxKind::EnumMember
                && !is_visible(member.syntax())
                && !member.has_modifier(CsSyntaxKind::OverrideKw)
                && !member.has_modifier(CsSyntaxKind::ExternKw)
                && !member.is_explicit_interface()
                && !names
                    .iter()
                    .any(|name| rules.iter().any(|rule| rule.matches_member(&path, name)));
            for name in &names {
                declared.declare(name, renamable);
            }
            for parameter in member.type_parameters() {
                declared.declare(parameter.text(), !member_preserved);
                type_parameters.insert(identifier_name(parameter.text()).to_string());
            }
        }
    }
    type_names
}

fn declare_parameters(root: &CsSyntaxNode, declared: &mut Declarations) {
    for parameter in root
        .descendants()
        .filter(|node| node.kind() == CsSyntaxKind::Parameter)
    {
        if let Some(name) = parameter.token_of_kind(CsSyntaxKind::Identifier) {
            declared.declare(name.text(), !has_annotation(&parameter, PRESERVE_TAG));
        }
    }
}

/// Locals and lambda parameters, recognised by the shape of the code around
/// them inside bodies and initializers
fn declare_locals(tokens: &[CsSyntaxToken], declared: &mut Declarations) {
    for (index, token) in tokens.iter().enumerate() {
        if !in_body(token) {
            continue;
        }
        match token.kind() {
            CsSyntaxKind::Identifier if declares_local(tokens, index) => {
                declared.declare(token.text(), !token_has_annotation(token, PRESERVE_TAG));
            }
            CsSyntaxKind::FatArrow if !starts_arrow_body(token) => {
                for parameter in lambda_parameters(tokens, index) {
                    declared.declare(
                        parameter.text(),
                        !token_has_annotation(parameter, PRESERVE_TAG),
                    );
                }
            }
            _ => {}
        }
    }
}

fn in_body(token: &CsSyntaxToken) -> bool {
    token.parent().is_some_and(|parent| {
        matches!(
            parent.kind(),
            CsSyntaxKind::Block | CsSyntaxKind::ArrowExpression | CsSyntaxKind::EqualsValue
        )
    })
}

/// The `=>` of an expression-bodied member, as opposed to a lambda arrow
fn starts_arrow_body(token: &CsSyntaxToken) -> bool {
    token.parent().is_some_and(|parent| {
        parent.kind() == CsSyntaxKind::ArrowExpression
            && parent.significant_child_tokens().first() == Some(token)
    })
}

/// `Type name =`, `Type name;`, `Type name,`, `Type name in`, `Type name)`
fn declares_local(tokens: &[CsSyntaxToken], index: usize) -> bool {
    let Some(next) = tokens.get(index + 1) else {
        return false;
    };
    if !matches!(
        next.kind(),
        CsSyntaxKind::Eq
            | CsSyntaxKind::Semicolon
            | CsSyntaxKind::Comma
            | CsSyntaxKind::InKw
            | CsSyntaxKind::RParen
    ) {
        return false;
    }
    let Some(previous) = index.checked_sub(1).map(|i| &tokens[i]) else {
        return false;
    };
    let before = index.checked_sub(2).map(|i| tokens[i].kind());
    match previous.kind() {
        CsSyntaxKind::Identifier => {
            let text = previous.text();
            QUERY_INTRODUCERS.contains(&text)
                || matches!(text, "var" | "dynamic")
                || !CONTEXTUAL_KEYWORDS.contains(&text)
        }
        kind if kind.is_predefined_type() => true,
        CsSyntaxKind::RBracket => {
            matches!(before, Some(CsSyntaxKind::LBracket | CsSyntaxKind::Comma))
        }
        CsSyntaxKind::Question => before.is_some_and(|kind| {
            kind == CsSyntaxKind::Identifier || kind == CsSyntaxKind::Gt || kind.is_predefined_type()
        }),
        CsSyntaxKind::Gt => {
            next.kind() != CsSyntaxKind::RParen
                && next.kind() != CsSyntaxKind::Comma
                && closes_generic_type(tokens, index - 1)
        }
        _ => false,
    }
}

/// Does the `>` at `gt` close a type argument list such as `List<int>`?
fn closes_generic_type(tokens: &[CsSyntaxToken], gt: usize) -> bool {
    let mut depth = 0usize;
    let mut index = gt;
    loop {
        match tokens[index].kind() {
            CsSyntaxKind::Gt => depth += 1,
            CsSyntaxKind::Lt => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return index > 0 && tokens[index - 1].kind() == CsSyntaxKind::Identifier;
                }
            }
            CsSyntaxKind::Identifier
            | CsSyntaxKind::Comma
            | CsSyntaxKind::Dot
            | CsSyntaxKind::LBracket
            | CsSyntaxKind::RBracket
            | CsSyntaxKind::Question
            | CsSyntaxKind::ColonColon => {}
            kind if kind.is_predefined_type() => {}
            _ => return false,
        }
        if index == 0 {
            return false;
        }
        index -= 1;
    }
}

/// Parameters of the lambda whose arrow is at `arrow`
fn lambda_parameters(tokens: &[CsSyntaxToken], arrow: usize) -> Vec<&CsSyntaxToken> {
    let Some(previous) = arrow.checked_sub(1).map(|i| &tokens[i]) else {
        return Vec::new();
    };
    match previous.kind() {
        CsSyntaxKind::Identifier => vec![previous],
        CsSyntaxKind::RParen => {
            let mut depth = 0usize;
            let mut open = None;
            for index in (0..arrow).rev() {
                match tokens[index].kind() {
                    CsSyntaxKind::RParen => depth += 1,
                    CsSyntaxKind::LParen => {
                        depth -= 1;
                        if depth == 0 {
                            open = Some(index);
                            break;
                        }
                    }
                    _ => {}
                }
            }
            let Some(open) = open else {
                return Vec::new();
            };
            // the last identifier of each comma separated entry
            (open + 1..arrow)
                .filter(|index| {
                    tokens[*index].kind() == CsSyntaxKind::Identifier
                        && matches!(
                            tokens[index + 1].kind(),
                            CsSyntaxKind::Comma | CsSyntaxKind::RParen
                        )
                })
                .map(|index| &tokens[index])
                .collect()
        }
        _ => Vec::new(),
    }
}

/// Names with a use that may refer to something outside the script
fn unsafe_names(
    tokens: &[CsSyntaxToken],
    our_types: &HashSet<String>,
    type_parameters: &HashSet<String>,
) -> HashSet<String> {
    let mut names = HashSet::new();
    let mut initializers: Vec<bool> = Vec::new();

    for (index, token) in tokens.iter().enumerate() {
        match token.kind() {
            CsSyntaxKind::LBrace => initializers.push(opens_initializer(tokens, index)),
            CsSyntaxKind::RBrace => {
                initializers.pop();
            }
            CsSyntaxKind::StringLiteral | CsSyntaxKind::VerbatimStringLiteral => {
                if let Some(content) = string_content(token.text())
                    && is_identifier(content)
                {
                    names.insert(identifier_name(content).to_string());
                }
            }
            CsSyntaxKind::InterpolatedStringLiteral => {
                let preserved = token_has_annotation(token, PRESERVE_TAG);
                unsafe_in_holes(token.text(), preserved, our_types, &mut names);
            }
            CsSyntaxKind::Identifier => {
                let name = identifier_name(token.text()).to_string();
                let previous = index.checked_sub(1).map(|i| tokens[i].kind());
                let next = tokens.get(index + 1).map(|next| next.kind());
                let in_initializer = initializers.last().copied().unwrap_or(false);

                let is_unsafe = token_has_annotation(token, PRESERVE_TAG)
                    // a framework type sharing the name of one of our symbols
                    || (!our_types.contains(&name)
                        && !type_parameters.contains(&name)
                        && in_type_position(tokens, index))
                    || is_external_access(
                        previous,
                        index.checked_sub(2).map(|i| &tokens[i]),
                        our_types,
                    )
                    // named argument
                    || (next == Some(CsSyntaxKind::Colon)
                        && matches!(
                            previous,
                            Some(CsSyntaxKind::LParen | CsSyntaxKind::Comma | CsSyntaxKind::LBracket)
                        ))
                    // attribute property
                    || (next == Some(CsSyntaxKind::Eq)
                        && token
                            .parent_ancestors()
                            .any(|node| node.kind() == CsSyntaxKind::AttributeList))
                    // object initializer label
                    || (next == Some(CsSyntaxKind::Eq)
                        && in_initializer
                        && matches!(previous, Some(CsSyntaxKind::LBrace | CsSyntaxKind::Comma)));
                if next == Some(CsSyntaxKind::Lt)
                    && let Some(end) = type_argument_list_end(tokens, index + 1)
                {
                    for argument in &tokens[index + 2..end] {
                        let argument = identifier_name(argument.text());
                        if is_identifier(argument)
                            && !our_types.contains(argument)
                            && !type_parameters.contains(argument)
                        {
                            names.insert(argument.to_string());
                        }
                    }
                }
                if is_unsafe {
                    names.insert(name);
                }
            }
            _ => {}
        }
    }
    names
}

/// `new T`, `is T`, `as T`, `typeof(T)`, `T name`, `T<...>`, `T[] name`,
/// `T? name`
fn in_type_position(tokens: &[CsSyntaxToken], index: usize) -> bool {
    let kind_at = |i: usize| tokens.get(i).map(|token| token.kind());
    let previous = index.checked_sub(1).and_then(kind_at);
    let before = index.checked_sub(2).and_then(kind_at);

    if matches!(
        previous,
        Some(CsSyntaxKind::NewKw | CsSyntaxKind::IsKw | CsSyntaxKind::AsKw)
    ) {
        return true;
    }
    if previous == Some(CsSyntaxKind::LParen)
        && matches!(
            before,
            Some(CsSyntaxKind::TypeofKw | CsSyntaxKind::DefaultKw | CsSyntaxKind::SizeofKw)
        )
    {
        return true;
    }

    let Some(next) = tokens.get(index + 1) else {
        return false;
    };
    match next.kind() {
        CsSyntaxKind::Identifier => !OPERAND_FOLLOWERS.contains(&next.text()),
        CsSyntaxKind::Lt => type_argument_list_end(tokens, index + 1)
            .is_some_and(|end| kind_at(end + 1) != Some(CsSyntaxKind::LParen)),
        CsSyntaxKind::LBracket => matches!(
            kind_at(index + 2),
            Some(CsSyntaxKind::RBracket | CsSyntaxKind::Comma)
        ),
        CsSyntaxKind::Question => {
            kind_at(index + 2) == Some(CsSyntaxKind::Identifier)
                && matches!(
                    kind_at(index + 3),
                    Some(
                        CsSyntaxKind::Eq
                            | CsSyntaxKind::Semicolon
                            | CsSyntaxKind::Comma
                            | CsSyntaxKind::RParen
                    )
                )
        }
        _ => false,
    }
}

/// Index of the `>` closing the type argument list opened by the `<` at `lt`
fn type_argument_list_end(tokens: &[CsSyntaxToken], lt: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate().skip(lt) {
        match token.kind() {
            CsSyntaxKind::Lt => depth += 1,
            CsSyntaxKind::Gt => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            CsSyntaxKind::Identifier
            | CsSyntaxKind::Comma
            | CsSyntaxKind::Dot
            | CsSyntaxKind::LBracket
            | CsSyntaxKind::RBracket
            | CsSyntaxKind::Question
            | CsSyntaxKind::ColonColon => {}
            kind if kind.is_predefined_type() => {}
            _ => return None,
        }
    }
    None
}

/// `receiver.name` where the receiver is not `this`, `base` or one of our
/// types
fn is_external_access(
    previous: Option<CsSyntaxKind>,
    receiver: Option<&CsSyntaxToken>,
    our_types: &HashSet<String>,
) -> bool {
    if !matches!(
        previous,
        Some(CsSyntaxKind::Dot | CsSyntaxKind::QuestionDot | CsSyntaxKind::ColonColon)
    ) {
        return false;
    }
    match receiver {
        Some(receiver) => match receiver.kind() {
            CsSyntaxKind::ThisKw | CsSyntaxKind::BaseKw => false,
            CsSyntaxKind::Identifier => !our_types.contains(identifier_name(receiver.text())),
            _ => true,
        },
        None => true,
    }
}

/// Member accesses inside interpolation holes, or every identifier of a
/// preserved literal
fn unsafe_in_holes(
    literal: &str,
    preserved: bool,
    our_types: &HashSet<String>,
    names: &mut HashSet<String>,
) {
    for hole in interpolation_holes(literal) {
        let (tokens, _) = lex_fragment(&literal[hole]);
        let significant: Vec<_> = tokens
            .into_iter()
            .filter(|token| !token.kind.is_trivia())
            .collect();
        for (index, token) in significant.iter().enumerate() {
            match token.kind {
                CsSyntaxKind::Identifier => {
                    let previous = index.checked_sub(1).map(|i| significant[i].kind);
                    let receiver = index.checked_sub(2).map(|i| &significant[i]);
                    let external = matches!(
                        previous,
                        Some(CsSyntaxKind::Dot | CsSyntaxKind::QuestionDot | CsSyntaxKind::ColonColon)
                    ) && receiver.is_none_or(|receiver| match receiver.kind {
                        CsSyntaxKind::ThisKw | CsSyntaxKind::BaseKw => false,
                        CsSyntaxKind::Identifier => {
                            !our_types.contains(identifier_name(&receiver.text))
                        }
                        _ => true,
                    });
                    if preserved || external {
                        names.insert(identifier_name(&token.text).to_string());
                    }
                }
                CsSyntaxKind::InterpolatedStringLiteral => {
                    unsafe_in_holes(&token.text, preserved, our_types, names)
                }
                _ => {}
            }
        }
    }
}

/// Does the `{` at `index` open an object, anonymous type or `with`
/// initializer?
fn opens_initializer(tokens: &[CsSyntaxToken], index: usize) -> bool {
    let Some(mut cursor) = index.checked_sub(1) else {
        return false;
    };
    match tokens[cursor].kind() {
        CsSyntaxKind::NewKw => return true,
        CsSyntaxKind::Identifier if tokens[cursor].text() == "with" => return true,
        CsSyntaxKind::RParen => {
            // skip constructor arguments
            let mut depth = 0usize;
            loop {
                match tokens[cursor].kind() {
                    CsSyntaxKind::RParen => depth += 1,
                    CsSyntaxKind::LParen => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
                let Some(previous) = cursor.checked_sub(1) else {
                    return false;
                };
                cursor = previous;
            }
            let Some(previous) = cursor.checked_sub(1) else {
                return false;
            };
            cursor = previous;
        }
        _ => {}
    }

    // walk back over the type name to find `new`
    loop {
        let kind = tokens[cursor].kind();
        match kind {
            CsSyntaxKind::NewKw => return true,
            CsSyntaxKind::Identifier
            | CsSyntaxKind::Dot
            | CsSyntaxKind::Lt
            | CsSyntaxKind::Gt
            | CsSyntaxKind::Comma
            | CsSyntaxKind::LBracket
            | CsSyntaxKind::RBracket
            | CsSyntaxKind::Question
            | CsSyntaxKind::ColonColon => {}
            kind if kind.is_predefined_type() => {}
            _ => return false,
        }
        let Some(previous) = cursor.checked_sub(1) else {
            return false;
        };
        cursor = previous;
    }
}

/// Every name mentioned in the unit with its number of uses, in order of
/// first appearance
fn usage(root: &CsSyntaxNode) -> IndexMap<String, usize> {
    let mut usage: IndexMap<String, usize> = IndexMap::new();
    for token in root
        .descendants_with_tokens()
        .filter_map(|element| element.into_token())
    {
        let names = match token.kind() {
            CsSyntaxKind::Identifier | CsSyntaxKind::InterpolatedStringLiteral => {
                token_names(&token)
            }
            _ => continue,
        };
        for name in names {
            *usage.entry(name).or_insert(0) += 1;
        }
    }
    usage
}

/// Give the most used names the shortest free identifiers
fn assign_names(
    candidates: &[(&str, usize, usize)],
    taken: &IndexMap<String, usize>,
) -> HashMap<String, String> {
    let mut renames = HashMap::new();
    let mut next = 0usize;
    for (old, _, _) in candidates {
        let mut name = short_name(next);
        while taken.contains_key(&name) || is_keyword(&name) || CONTEXTUAL_KEYWORDS.contains(&name.as_str()) {
            next += 1;
            name = short_name(next);
        }
        if name.len() >= old.len() {
            continue;
        }
        next += 1;
        renames.insert(old.to_string(), name);
    }
    renames
}

/// The `index`th identifier in length-then-alphabet order
fn short_name(index: usize) -> String {
    const FIRST: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
    const REST: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    let mut remaining = index;
    let mut count = FIRST.len();
    let mut length = 1;
    while remaining >= count {
        remaining -= count;
        count *= REST.len();
        length += 1;
    }

    let mut tail = Vec::with_capacity(length - 1);
    for _ in 1..length {
        tail.push(REST[remaining % REST.len()] as char);
        remaining /= REST.len();
    }
    let mut name = String::with_capacity(length);
    name.push(FIRST[remaining] as char);
    name.extend(tail.into_iter().rev());
    name
}

fn is_keyword(name: &str) -> bool {
    CsSyntaxKind::from_keyword(name).is_some()
}

/// Rewrite renamed identifiers inside the holes of an interpolated literal
fn rename_in_holes(literal: &str, renames: &HashMap<String, String>) -> Option<String> {
    let mut out = String::with_capacity(literal.len());
    let mut cursor = 0;
    let mut changed = false;
    for hole in interpolation_holes(literal) {
        out.push_str(&literal[cursor..hole.start]);
        let (tokens, _) = lex_fragment(&literal[hole.clone()]);
        for token in tokens {
            let replacement = match token.kind {
                CsSyntaxKind::Identifier => renames.get(identifier_name(&token.text)).cloned(),
                CsSyntaxKind::InterpolatedStringLiteral => rename_in_holes(&token.text, renames),
                _ => None,
            };
            match replacement {
                Some(text) => {
                    out.push_str(&text);
                    changed = true;
                }
                None => out.push_str(&token.text),
            }
        }
        cursor = hole.end;
    }
    out.push_str(&literal[cursor..]);
    changed.then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PackOptions;
    use crate::cst::PreprocessorSymbols;
    use crate::processors::RegionAnnotator;

    fn rename_with(source: &str, configure: impl FnOnce(&mut PackOptions)) -> String {
        let mut options = PackOptions::default();
        configure(&mut options);
        let context = PackContext::new("Demo", "/tmp/demo", options);
        let document = Document::parse("Script.cs", None, source, &PreprocessorSymbols::new());
        assert!(!document.has_errors(), "{:?}", document.diagnostics());
        let document = RegionAnnotator.process(document, &context).unwrap();
        SymbolRenamer.process(document, &context).unwrap().render()
    }

    fn rename(source: &str) -> String {
        rename_with(source, |_| {})
    }

    #[test]
    fn test_most_used_names_get_shortest_names() {
        let source = "class Program\n{\n    int counter;\n    void Main() { counter = Increment(counter); }\n    int Increment(int value2) { return value2 + 1; }\n}\n";
        assert_eq!(
            rename(source),
            "class Program\n{\n    int a;\n    void Main() { a = b(a); }\n    int b(int c) { return c + 1; }\n}\n"
        );
    }

    #[test]
    fn test_external_member_access_is_not_renamed() {
        let source = "class Program\n{\n    string Name;\n    void Main() { var block = GridTerminalSystem.GetBlockWithName(\"x\"); block.Name = Name; }\n}\n";
        let output = rename(source);
        assert!(output.contains("string Name;"), "{output}");
        assert!(output.contains("var a = GridTerminalSystem.GetBlockWithName(\"x\"); a.Name = Name;"), "{output}");
    }

    #[test]
    fn test_nameof_and_typeof_follow_the_rename() {
        let source = "class Program\n{\n    void Main() { Echo(nameof(Helper)); var t = typeof(Helper); }\n}\nclass Helper { }\n";
        let output = rename(source);
        assert!(output.contains("Echo(nameof(a))"), "{output}");
        assert!(output.contains("typeof(a)"), "{output}");
        assert!(output.contains("class a { }"), "{output}");
    }

    #[test]
    fn test_visible_and_special_members_are_kept() {
        let source = "class Program\n{\n    public int Visible;\n    protected void Shown() { }\n    public override string ToString() => hidden;\n    string hidden = \"\";\n}\ninterface IThing { void Act(); }\nenum Mode { Idle }\n";
        let output = rename(source);
        for kept in ["public int Visible", "protected void Shown", "override string ToString", "void Act();", "Idle"] {
            assert!(output.contains(kept), "{kept} missing:\n{output}");
        }
        assert!(!output.contains("hidden"), "{output}");
    }

    #[test]
    fn test_labels_and_named_arguments_are_unsafe() {
        let source = "class Program\n{\n    int size;\n    int depth;\n    void Main() { Make(size: 1); var o = new Options { depth = 2 }; }\n}\n";
        let output = rename(source);
        assert!(output.contains("int size;"), "{output}");
        assert!(output.contains("int depth;"), "{output}");
    }

    #[test]
    fn test_string_lookups_and_preserved_names() {
        let source = "class Program\n{\n    int target;\n    int counter;\n    int other;\n    void Main() { Find(\"target\"); target = counter + other; }\n#region mdk preserve\n    int kept;\n#endregion\n}\n";
        let output = rename_with(source, |options| options.preserve_names = vec!["counter".into()]);
        assert!(output.contains("int target;"), "{output}");
        assert!(output.contains("int counter;"), "{output}");
        assert!(output.contains("int kept;"), "{output}");
        assert!(!output.contains("other"), "{output}");
    }

    #[test]
    fn test_interpolation_holes_and_lambdas() {
        let source = "class Program\n{\n    int count;\n    void Main() { Echo($\"Count: {count}\"); Run(item => item + 1); }\n}\n";
        let output = rename(source);
        assert!(output.contains("Echo($\"Count: {a}\")"), "{output}");
        assert!(output.contains("Run(b => b + 1)"), "{output}");
    }

    #[test]
    fn test_generic_locals() {
        let source = "class Program\n{\n    void Main() { List<int> values = new List<int>(); values.Add(1); }\n}\n";
        let output = rename(source);
        assert!(output.contains("List<int> a = new List<int>(); a.Add(1);"), "{output}");
    }

    #[test]
    fn test_framework_type_sharing_a_local_name_is_kept() {
        let source = "class Program\n{\n    void Main() { var List = 1; var items = new List<int>(); items.Add(List); }\n}\n";
        let output = rename(source);
        assert!(
            output.contains("var List = 1; var a = new List<int>(); a.Add(List);"),
            "{output}"
        );
    }

    #[test]
    fn test_type_positions_are_unsafe_for_foreign_types() {
        let source = "class Program\n{\n    int Color;\n    int Vector3D;\n    int Panel;\n    int Item;\n    void Main() { var t = typeof(Vector3D); var c = t is Color; Panel[] all = null; Dictionary<string, Item> map = null; Color = Vector3D + Panel + Item; }\n}\n";
        let output = rename(source);
        for kept in ["int Color;", "int Vector3D;", "int Panel;", "int Item;"] {
            assert!(output.contains(kept), "{kept} missing:\n{output}");
        }
    }

    #[test]
    fn test_type_parameters_are_still_renamed() {
        let source = "class Program\n{\n    void Main() { }\n}\nclass Box<TValue>\n{\n    TValue item;\n    List<TValue> values;\n}\n";
        let output = rename(source);
        assert!(!output.contains("TValue"), "{output}");
    }

    #[test]
    fn test_short_names() {
        assert_eq!(short_name(0), "a");
        assert_eq!(short_name(25), "z");
        assert_eq!(short_name(26), "A");
        assert_eq!(short_name(51), "Z");
        assert_eq!(short_name(52), "aa");
        assert_eq!(short_name(52 + 61), "a9");
        assert_eq!(short_name(52 + 62), "ba");
    }
}
