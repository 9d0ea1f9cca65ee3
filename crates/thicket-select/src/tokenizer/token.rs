//! Selector token types.
//!
//! A reduced form of the [CSS Syntax § 4](https://www.w3.org/TR/css-syntax-3/#tokenization)
//! token set, plus the attribute match operators from
//! [Selectors § 6.4](https://www.w3.org/TR/selectors-4/#attribute-representation)
//! which the selector grammar treats as single tokens.

use core::fmt;

/// The kind of a [`Token`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// "`<ident-token>`", escapes already resolved.
    Ident(String),

    /// "`<function-token>`": an identifier immediately followed by `(`.
    /// The `(` is part of the token.
    Function(String),

    /// "`<hash-token>`": `#` followed by a name.
    Hash {
        /// The name after `#`.
        value: String,
        /// "type flag set to 'id'" when the name would start an identifier.
        is_identifier: bool,
    },

    /// "`<string-token>`", quotes stripped and escapes resolved.
    String(String),

    /// A run of ASCII digits. Only meaningful inside `An+B` arguments.
    Number(String),

    /// "`<delim-token>`": any other single code point (`.`, `*`, `>`, `+`, `~`, `|`, `=`...).
    Delim(char),

    /// `~=`
    IncludeMatch,
    /// `|=`
    DashMatch,
    /// `^=`
    PrefixMatch,
    /// `$=`
    SuffixMatch,
    /// `*=`
    SubstringMatch,

    /// "`<whitespace-token>`": one or more whitespace code points.
    Whitespace,
    /// "`<colon-token>`"
    Colon,
    /// "`<comma-token>`"
    Comma,
    /// "`<[-token>`"
    LeftBracket,
    /// "`<]-token>`"
    RightBracket,
    /// "`<(-token>`"
    LeftParen,
    /// "`<)-token>`"
    RightParen,
    /// End of input. Always the last token of a stream.
    Eof,
}

/// A token and the byte range of the selector text it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// What was lexed.
    pub kind: TokenKind,
    /// Byte offset of the first code point.
    pub start: usize,
    /// Byte offset just past the last code point.
    pub end: usize,
}

impl Token {
    /// Returns true if this is the end-of-input token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Returns true if this is a whitespace token.
    #[must_use]
    pub const fn is_whitespace(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace)
    }

    /// Returns true if this is the given delimiter.
    #[must_use]
    pub fn is_delim(&self, c: char) -> bool {
        self.kind == TokenKind::Delim(c)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(v) => write!(f, "identifier '{v}'"),
            Self::Function(v) => write!(f, "function '{v}('"),
            Self::Hash { value, .. } => write!(f, "'#{value}'"),
            Self::String(v) => write!(f, "string \"{v}\""),
            Self::Number(v) => write!(f, "number '{v}'"),
            Self::Delim(c) => write!(f, "'{c}'"),
            Self::IncludeMatch => write!(f, "'~='"),
            Self::DashMatch => write!(f, "'|='"),
            Self::PrefixMatch => write!(f, "'^='"),
            Self::SuffixMatch => write!(f, "'$='"),
            Self::SubstringMatch => write!(f, "'*='"),
            Self::Whitespace => write!(f, "whitespace"),
            Self::Colon => write!(f, "':'"),
            Self::Comma => write!(f, "','"),
            Self::LeftBracket => write!(f, "'['"),
            Self::RightBracket => write!(f, "']'"),
            Self::LeftParen => write!(f, "'('"),
            Self::RightParen => write!(f, "')'"),
            Self::Eof => write!(f, "end of input"),
        }
    }
}
