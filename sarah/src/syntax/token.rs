use chumsky::span::SimpleSpan;
use strum::{EnumIs, EnumIter};

/// Byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn join(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn range(self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

impl From<SimpleSpan> for Span {
    fn from(span: SimpleSpan) -> Self {
        Span::new(span.start, span.end)
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs, EnumIter)]
pub enum TokenKind {
    // Delimiters & punctuation
    LParen,
    RParen,
    Dot,
    Colon,
    Semicolon,
    Assign, // =

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    EqEq,
    NotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    Arrow,     // ->
    LeftRight, // <->

    // Keywords
    And,
    Or,
    Not,
    True,
    False,
    Forall,
    Exists,
    Let,
    BoolType,
    IntType,

    // Literals & names
    IntLiteral,
    Identifier,
}

impl TokenKind {
    /// Fixed spelling of punctuation, operators and keywords.
    pub fn spelling(self) -> Option<&'static str> {
        use TokenKind::*;
        Some(match self {
            LParen => "(",
            RParen => ")",
            Dot => ".",
            Colon => ":",
            Semicolon => ";",
            Assign => "=",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            EqEq => "==",
            NotEq => "!=",
            Less => "<",
            Greater => ">",
            LessEq => "<=",
            GreaterEq => ">=",
            Arrow => "->",
            LeftRight => "<->",
            And => "and",
            Or => "or",
            Not => "not",
            True => "true",
            False => "false",
            Forall => "forall",
            Exists => "exists",
            Let => "let",
            BoolType => "bool",
            IntType => "int",
            IntLiteral | Identifier => return None,
        })
    }

    /// The keyword spelled `word`, if any.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        use TokenKind::*;
        Some(match word {
            "and" => And,
            "or" => Or,
            "not" => Not,
            "true" => True,
            "false" => False,
            "forall" => Forall,
            "exists" => Exists,
            "let" => Let,
            "bool" => BoolType,
            "int" => IntType,
            _ => return None,
        })
    }

    /// Human readable name used in parser expectations.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::IntLiteral => "integer literal",
            TokenKind::Identifier => "identifier",
            other => other.spelling().unwrap_or("token"),
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.describe())
    }
}

/// A lexed token: its kind, the source slice it was read from and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub spell: &'a str,
    pub span: Span,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, spell: &'a str, span: Span) -> Self {
        Token { kind, spell, span }
    }

    /// A token that was not read from any source, e.g. for trees built by hand.
    ///
    /// Punctuation, operators and keywords get their fixed spelling; literals and identifiers
    /// must go through [`Token::new`].
    ///
    /// # Panics
    /// If `kind` has no fixed spelling.
    pub fn synthetic(kind: TokenKind) -> Token<'static> {
        let spell = kind
            .spelling()
            .unwrap_or_else(|| panic!("{kind:?} has no fixed spelling"));
        Token::new(kind, spell, Span::default())
    }
}

impl std::fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.spell)
    }
}
