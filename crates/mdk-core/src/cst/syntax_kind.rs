//! Syntax kind enumeration for the C# CST
//!
//! This module defines all possible node and token types in the C# syntax tree.
//! Kinds are numbered by declaration order, which is also the raw value handed
//! to rowan.

/// Declares [`CsSyntaxKind`] together with its classification helpers.
///
/// Keywords and punctuation carry their fixed source text so that the lexer can
/// map words and operators to kinds without a second table.
macro_rules! syntax_kinds {
    (
        trivia: [$($trivia:ident),* $(,)?],
        keywords: [$($kw:ident => $kw_text:literal),* $(,)?],
        punctuation: [$($punct:ident => $punct_text:literal),* $(,)?],
        tokens: [$($token:ident),* $(,)?],
        nodes: [$($node:ident),* $(,)?] $(,)?
    ) => {
        /// Syntax kind for C# language elements
        ///
        /// This enum represents all node and token types in the C# CST:
        /// - Trivia (whitespace, comments, directives, disabled text)
        /// - Reserved keywords
        /// - Punctuation and operators
        /// - Identifiers, literals and the non-rendered annotation token
        /// - Structural nodes (declarations, bodies, regions)
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(u16)]
        pub enum CsSyntaxKind {
            $($trivia,)*
            $($kw,)*
            $($punct,)*
            $($token,)*
            $($node,)*
        }

        impl CsSyntaxKind {
            const ALL: &'static [CsSyntaxKind] = &[
                $(CsSyntaxKind::$trivia,)*
                $(CsSyntaxKind::$kw,)*
                $(CsSyntaxKind::$punct,)*
                $(CsSyntaxKind::$token,)*
                $(CsSyntaxKind::$node,)*
            ];

            /// Convert a raw rowan kind back into a syntax kind
            pub fn from_raw(raw: u16) -> Option<Self> {
                Self::ALL.get(raw as usize).copied()
            }

            /// Check if this kind is trivia (not semantically significant)
            pub fn is_trivia(self) -> bool {
                matches!(self, $(CsSyntaxKind::$trivia)|*)
            }

            /// Check if this kind is a reserved keyword
            pub fn is_keyword(self) -> bool {
                matches!(self, $(CsSyntaxKind::$kw)|*)
            }

            /// Check if this kind is punctuation or an operator
            pub fn is_punctuation(self) -> bool {
                matches!(self, $(CsSyntaxKind::$punct)|*)
            }

            /// Check if this kind is a structural node
            pub fn is_node(self) -> bool {
                matches!(self, $(CsSyntaxKind::$node)|*)
            }

            /// Look up a reserved keyword by its text
            pub fn from_keyword(text: &str) -> Option<Self> {
                match text {
                    $($kw_text => Some(CsSyntaxKind::$kw),)*
                    _ => None,
                }
            }

            /// Look up a punctuation token by its text
            pub fn from_punctuation(text: &str) -> Option<Self> {
                match text {
                    $($punct_text => Some(CsSyntaxKind::$punct),)*
                    _ => None,
                }
            }

            /// The fixed source text of keywords and punctuation
            pub fn fixed_text(self) -> Option<&'static str> {
                match self {
                    $(CsSyntaxKind::$kw => Some($kw_text),)*
                    $(CsSyntaxKind::$punct => Some($punct_text),)*
                    _ => None,
                }
            }
        }
    };
}

syntax_kinds! {
    trivia: [
        Whitespace,
        Newline,
        SingleLineComment,
        MultiLineComment,
        DocComment,
        PreprocessorDirective,
        DisabledText,
    ],
    keywords: [
        AbstractKw => "abstract",
        AsKw => "as",
        BaseKw => "base",
        BoolKw => "bool",
        BreakKw => "break",
        ByteKw => "byte",
        CaseKw => "case",
        CatchKw => "catch",
        CharKw => "char",
        CheckedKw => "checked",
        ClassKw => "class",
        ConstKw => "const",
        ContinueKw => "continue",
        DecimalKw => "decimal",
        DefaultKw => "default",
        DelegateKw => "delegate",
        DoKw => "do",
        DoubleKw => "double",
        ElseKw => "else",
        EnumKw => "enum",
        EventKw => "event",
        ExplicitKw => "explicit",
        ExternKw => "extern",
        FalseKw => "false",
        FinallyKw => "finally",
        FixedKw => "fixed",
        FloatKw => "float",
        ForKw => "for",
        ForeachKw => "foreach",
        GotoKw => "goto",
        IfKw => "if",
        ImplicitKw => "implicit",
        InKw => "in",
        IntKw => "int",
        InterfaceKw => "interface",
        InternalKw => "internal",
        IsKw => "is",
        LockKw => "lock",
        LongKw => "long",
        NamespaceKw => "namespace",
        NewKw => "new",
        NullKw => "null",
        ObjectKw => "object",
        OperatorKw => "operator",
        OutKw => "out",
        OverrideKw => "override",
        ParamsKw => "params",
        PrivateKw => "private",
        ProtectedKw => "protected",
        PublicKw => "public",
        ReadonlyKw => "readonly",
        RefKw => "ref",
        ReturnKw => "return",
        SbyteKw => "sbyte",
        SealedKw => "sealed",
        ShortKw => "short",
        SizeofKw => "sizeof",
        StackallocKw => "stackalloc",
        StaticKw => "static",
        StringKw => "string",
        StructKw => "struct",
        SwitchKw => "switch",
        ThisKw => "this",
        ThrowKw => "throw",
        TrueKw => "true",
        TryKw => "try",
        TypeofKw => "typeof",
        UintKw => "uint",
        UlongKw => "ulong",
        UncheckedKw => "unchecked",
        UnsafeKw => "unsafe",
        UshortKw => "ushort",
        UsingKw => "using",
        VirtualKw => "virtual",
        VoidKw => "void",
        VolatileKw => "volatile",
        WhileKw => "while",
    ],
    punctuation: [
        LBrace => "{",
        RBrace => "}",
        LParen => "(",
        RParen => ")",
        LBracket => "[",
        RBracket => "]",
        Semicolon => ";",
        Comma => ",",
        Dot => ".",
        DotDot => "..",
        Colon => ":",
        ColonColon => "::",
        Question => "?",
        QuestionQuestion => "??",
        QuestionQuestionEq => "??=",
        QuestionDot => "?.",
        Eq => "=",
        EqEq => "==",
        FatArrow => "=>",
        Bang => "!",
        BangEq => "!=",
        Lt => "<",
        LtEq => "<=",
        LtLt => "<<",
        LtLtEq => "<<=",
        Gt => ">",
        GtEq => ">=",
        Plus => "+",
        PlusPlus => "++",
        PlusEq => "+=",
        Minus => "-",
        MinusMinus => "--",
        MinusEq => "-=",
        Arrow => "->",
        Star => "*",
        StarEq => "*=",
        Slash => "/",
        SlashEq => "/=",
        Percent => "%",
        PercentEq => "%=",
        Amp => "&",
        AmpAmp => "&&",
        AmpEq => "&=",
        Pipe => "|",
        PipePipe => "||",
        PipeEq => "|=",
        Caret => "^",
        CaretEq => "^=",
        Tilde => "~",
    ],
    tokens: [
        Identifier,
        NumericLiteral,
        CharLiteral,
        StringLiteral,
        VerbatimStringLiteral,
        InterpolatedStringLiteral,
        Annotation,
        ErrorToken,
    ],
    nodes: [
        CompilationUnit,
        ExternAlias,
        UsingDirective,
        NamespaceDeclaration,
        ClassDeclaration,
        StructDeclaration,
        InterfaceDeclaration,
        EnumDeclaration,
        DelegateDeclaration,
        AttributeList,
        BaseList,
        TypeParameterList,
        ConstraintClause,
        TypeRef,
        FieldDeclaration,
        PropertyDeclaration,
        IndexerDeclaration,
        MethodDeclaration,
        ConstructorDeclaration,
        DestructorDeclaration,
        OperatorDeclaration,
        EventDeclaration,
        EnumMember,
        ParameterList,
        Parameter,
        AccessorList,
        Accessor,
        VariableDeclarator,
        EqualsValue,
        ArrowExpression,
        Block,
        AnnotatedRegion,
        Error,
    ],
}

impl CsSyntaxKind {
    /// Check if this kind is a comment of any flavour
    pub fn is_comment(self) -> bool {
        matches!(
            self,
            CsSyntaxKind::SingleLineComment
                | CsSyntaxKind::MultiLineComment
                | CsSyntaxKind::DocComment
        )
    }

    /// Tokens that are rendered and carry meaning: everything except trivia
    /// and annotation markers.
    pub fn is_significant(self) -> bool {
        !self.is_trivia() && !self.is_node() && self != CsSyntaxKind::Annotation
    }

    /// Check if this kind is a literal
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            CsSyntaxKind::NumericLiteral
                | CsSyntaxKind::CharLiteral
                | CsSyntaxKind::StringLiteral
                | CsSyntaxKind::VerbatimStringLiteral
                | CsSyntaxKind::InterpolatedStringLiteral
                | CsSyntaxKind::TrueKw
                | CsSyntaxKind::FalseKw
                | CsSyntaxKind::NullKw
        )
    }

    /// Check if this kind is a string literal of any flavour
    pub fn is_string_literal(self) -> bool {
        matches!(
            self,
            CsSyntaxKind::StringLiteral
                | CsSyntaxKind::VerbatimStringLiteral
                | CsSyntaxKind::InterpolatedStringLiteral
        )
    }

    /// Built-in type keywords (`int`, `string`, ...)
    pub fn is_predefined_type(self) -> bool {
        matches!(
            self,
            CsSyntaxKind::BoolKw
                | CsSyntaxKind::ByteKw
                | CsSyntaxKind::CharKw
                | CsSyntaxKind::DecimalKw
                | CsSyntaxKind::DoubleKw
                | CsSyntaxKind::FloatKw
                | CsSyntaxKind::IntKw
                | CsSyntaxKind::LongKw
                | CsSyntaxKind::ObjectKw
                | CsSyntaxKind::SbyteKw
                | CsSyntaxKind::ShortKw
                | CsSyntaxKind::StringKw
                | CsSyntaxKind::UintKw
                | CsSyntaxKind::UlongKw
                | CsSyntaxKind::UshortKw
                | CsSyntaxKind::VoidKw
        )
    }

    /// Declaration modifiers
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            CsSyntaxKind::PublicKw
                | CsSyntaxKind::PrivateKw
                | CsSyntaxKind::ProtectedKw
                | CsSyntaxKind::InternalKw
                | CsSyntaxKind::StaticKw
                | CsSyntaxKind::ReadonlyKw
                | CsSyntaxKind::ConstKw
                | CsSyntaxKind::AbstractKw
                | CsSyntaxKind::SealedKw
                | CsSyntaxKind::VirtualKw
                | CsSyntaxKind::OverrideKw
                | CsSyntaxKind::ExternKw
                | CsSyntaxKind::UnsafeKw
                | CsSyntaxKind::VolatileKw
                | CsSyntaxKind::NewKw
                | CsSyntaxKind::FixedKw
        )
    }

    /// Type declaration nodes
    pub fn is_type_declaration(self) -> bool {
        matches!(
            self,
            CsSyntaxKind::ClassDeclaration
                | CsSyntaxKind::StructDeclaration
                | CsSyntaxKind::InterfaceDeclaration
                | CsSyntaxKind::EnumDeclaration
                | CsSyntaxKind::DelegateDeclaration
        )
    }

    /// Member declaration nodes (excluding nested types)
    pub fn is_member_declaration(self) -> bool {
        matches!(
            self,
            CsSyntaxKind::FieldDeclaration
                | CsSyntaxKind::PropertyDeclaration
                | CsSyntaxKind::IndexerDeclaration
                | CsSyntaxKind::MethodDeclaration
                | CsSyntaxKind::ConstructorDeclaration
                | CsSyntaxKind::DestructorDeclaration
                | CsSyntaxKind::OperatorDeclaration
                | CsSyntaxKind::EventDeclaration
        )
    }
}

impl From<CsSyntaxKind> for rowan::SyntaxKind {
    fn from(kind: CsSyntaxKind) -> Self {
        rowan::SyntaxKind(kind as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_round_trip() {
        for kind in CsSyntaxKind::ALL {
            assert_eq!(CsSyntaxKind::from_raw(*kind as u16), Some(*kind));
        }
        assert_eq!(CsSyntaxKind::from_raw(u16::MAX), None);
    }

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(
            CsSyntaxKind::from_keyword("class"),
            Some(CsSyntaxKind::ClassKw)
        );
        assert_eq!(CsSyntaxKind::from_keyword("var"), None);
        assert_eq!(CsSyntaxKind::ClassKw.fixed_text(), Some("class"));
    }

    #[test]
    fn test_classification() {
        assert!(CsSyntaxKind::Whitespace.is_trivia());
        assert!(CsSyntaxKind::PreprocessorDirective.is_trivia());
        assert!(!CsSyntaxKind::Annotation.is_trivia());
        assert!(!CsSyntaxKind::Annotation.is_significant());
        assert!(CsSyntaxKind::Identifier.is_significant());
        assert!(CsSyntaxKind::Block.is_node());
        assert!(CsSyntaxKind::GtEq.is_punctuation());
        assert_eq!(
            CsSyntaxKind::from_punctuation("??="),
            Some(CsSyntaxKind::QuestionQuestionEq)
        );
    }
}
