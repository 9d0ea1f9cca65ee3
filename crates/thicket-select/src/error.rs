//! Selector errors.
//!
//! Only two kinds exist: the text violates the grammar ([`SelectorError::Syntax`]),
//! or it uses a construct this engine does not implement
//! ([`SelectorError::Unsupported`]). Matching itself never fails.

use thiserror::Error;

/// Error returned when a selector cannot be compiled.
///
/// Positions are byte offsets into the selector text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// The selector text is not valid selector syntax.
    #[error("syntax error at position {position}: {kind}")]
    Syntax {
        /// Byte offset of the offending token.
        position: usize,
        /// What went wrong.
        kind: SyntaxErrorKind,
    },

    /// The selector is well formed but uses a feature that is not implemented.
    #[error("unsupported selector at position {position}: {feature}")]
    Unsupported {
        /// Byte offset of the unsupported construct.
        position: usize,
        /// Human-readable name of the construct, e.g. `::before`.
        feature: String,
    },
}

impl SelectorError {
    pub(crate) const fn syntax(position: usize, kind: SyntaxErrorKind) -> Self {
        Self::Syntax { position, kind }
    }

    pub(crate) fn unsupported(position: usize, feature: impl Into<String>) -> Self {
        Self::Unsupported {
            position,
            feature: feature.into(),
        }
    }

    /// Byte offset the error refers to.
    #[must_use]
    pub const fn position(&self) -> usize {
        match self {
            Self::Syntax { position, .. } | Self::Unsupported { position, .. } => *position,
        }
    }

    /// Whether this is a "missing feature" rather than "bad input" error.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// The specific grammar violation behind a [`SelectorError::Syntax`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    /// The input is empty or only whitespace and comments.
    #[error("empty selector")]
    EmptySelector,

    /// A token appeared where the grammar does not allow it.
    #[error("unexpected {found}")]
    UnexpectedToken {
        /// Description of the token that was found.
        found: String,
    },

    /// The input ended in the middle of a construct.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A combinator with nothing on its right-hand side.
    #[error("expected a selector after combinator '{0}'")]
    DanglingCombinator(char),

    /// A selector list entry with no simple selectors, e.g. `a,,b`.
    #[error("empty compound selector")]
    EmptyCompound,

    /// A type or universal selector after other simple selectors, e.g. `.a*`.
    #[error("type selector must come first in a compound selector")]
    MisplacedTypeSelector,

    /// An id selector whose name is not an identifier, e.g. `#1a`.
    #[error("invalid id selector '#{0}'")]
    InvalidId(String),

    /// A quoted string without its closing quote.
    #[error("unterminated string")]
    UnterminatedString,

    /// A `/*` comment without its closing `*/`.
    #[error("unterminated comment")]
    UnterminatedComment,

    /// An attribute selector without its closing `]`.
    #[error("unterminated attribute selector")]
    UnterminatedAttribute,

    /// A functional pseudo-class without its closing `)`.
    #[error("unbalanced parentheses")]
    UnbalancedParens,

    /// An `An+B` argument that does not follow the micro-syntax.
    #[error("malformed An+B expression '{0}'")]
    InvalidNth(String),

    /// A backslash at the very end of the input.
    #[error("invalid escape")]
    InvalidEscape,

    /// Functional pseudo-classes nested beyond the configured limit.
    #[error("selectors nested deeper than {0} levels")]
    NestingTooDeep(usize),
}
