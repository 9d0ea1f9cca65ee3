//! Parsed selector structures.
//!
//! These types describe selectors exactly as written, per
//! [Selectors Level 4](https://www.w3.org/TR/selectors-4/). They carry no
//! evaluation strategy; the compiler turns them into a
//! [`CompiledQuery`](crate::CompiledQuery).

mod nth;

pub use nth::NthFormula;

use serde::Serialize;
use strum_macros::{Display, EnumString};

/// [§ 4.1 Selector lists](https://www.w3.org/TR/selectors-4/#grouping)
///
/// "A selector list is a comma-separated list of selectors... it represents
/// the union of all elements selected by each of the individual selectors in
/// the list."
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorList {
    /// Never empty.
    pub selectors: Vec<ComplexSelector>,
}

/// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
///
/// "A complex selector is a chain of one or more compound selectors separated
/// by combinators."
///
/// Example: `div.container > ul.nav li a.active`
/// This is stored as:
/// ```text
/// subject: [a.active]
/// combinators: [(Descendant, li), (Descendant, ul.nav), (Child, div.container)]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplexSelector {
    /// The rightmost compound selector.
    ///
    /// "The elements represented by a complex selector are the elements matched
    /// by the last compound selector in the complex selector."
    pub subject: CompoundSelector,

    /// Chain of (combinator, compound) pairs going left from the subject.
    /// Empty if this is a single compound selector.
    ///
    /// The order is right-to-left because matching is done from the subject outward.
    pub combinators: Vec<(Combinator, CompoundSelector)>,
}

/// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
///
/// "A compound selector is a sequence of simple selectors that are not
/// separated by a combinator, and represents a set of simultaneous
/// conditions on a single element."
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompoundSelector {
    /// Never empty. A type or universal selector, if present, is first.
    pub simple_selectors: Vec<SimpleSelector>,
}

/// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
///
/// "A combinator is punctuation that represents a particular kind of
/// relationship between the selectors on either side."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
pub enum Combinator {
    /// [§ 16.1 Descendant combinator](https://www.w3.org/TR/selectors-4/#descendant-combinators)
    /// "A selector of the form 'A B' represents an element B that is an arbitrary
    /// descendant of some ancestor element A."
    #[strum(to_string = " ")]
    Descendant,

    /// [§ 16.2 Child combinator](https://www.w3.org/TR/selectors-4/#child-combinators)
    /// "A selector of the form 'A > B' represents an element B that is
    /// a direct child of element A."
    #[strum(to_string = ">")]
    Child,

    /// [§ 16.3 Next-sibling combinator](https://www.w3.org/TR/selectors-4/#adjacent-sibling-combinators)
    /// "A selector of the form 'A + B' represents an element B that
    /// immediately follows element A, where A and B share the same parent."
    #[strum(to_string = "+")]
    NextSibling,

    /// [§ 16.4 Subsequent-sibling combinator](https://www.w3.org/TR/selectors-4/#general-sibling-combinators)
    /// "A selector of the form 'A ~ B' represents an element B that
    /// follows element A (not necessarily immediately), where A and B share the
    /// same parent."
    #[strum(to_string = "~")]
    SubsequentSibling,
}

/// [§ 5 Elemental selectors](https://www.w3.org/TR/selectors-4/#elemental-selectors)
/// [§ 6 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
///
/// A simple selector is a single condition on an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SimpleSelector {
    /// [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors)
    ///
    /// Examples: `div`, `p`, `span`, `body`, `h1`
    Type(String),

    /// [§ 5.2 Universal selector](https://www.w3.org/TR/selectors-4/#universal-selector)
    ///
    /// Example: `*`
    Universal,

    /// [§ 6.6 Class selector](https://www.w3.org/TR/selectors-4/#class-html)
    ///
    /// Examples: `.highlight`, `.btn`, `.nav-item`
    Class(String),

    /// [§ 6.7 ID selector](https://www.w3.org/TR/selectors-4/#id-selectors)
    ///
    /// Examples: `#main`, `#header`, `#nav-bar`
    Id(String),

    /// [§ 6.1 Attribute presence and value selectors](https://www.w3.org/TR/selectors-4/#attribute-representation)
    ///
    /// Examples: `[href]`, `[type=text]`, `[lang|=en]`, `[src$=".png" i]`
    Attribute(AttributeSelector),

    /// [§ 3.5 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
    ///
    /// Examples: `:first-child`, `:nth-child(2n+1)`, `:not(.hidden)`
    PseudoClass(PseudoClass),

    /// A user-action or history pseudo-class that can never hold in a static
    /// tree: `:hover`, `:focus`, `:visited`, ...
    NeverMatch,
}

/// [§ 6 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeSelector {
    /// The attribute's name as written.
    pub name: String,
    /// The presence or value test.
    pub operation: AttributeOperation,
    /// [§ 6.3 Case-sensitivity](https://www.w3.org/TR/selectors-4/#attribute-case)
    pub case: CaseSensitivity,
}

/// The test an [`AttributeSelector`] applies to the attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AttributeOperation {
    /// `[attr]` — "Represents an element with the att attribute"
    Exists,

    /// `[attr=value]` — "whose value is exactly 'val'."
    Equals(String),

    /// `[attr~=value]` — "whose value is a whitespace-separated list of words,
    /// one of which is exactly 'val'."
    Includes(String),

    /// `[attr|=value]` — "its value either being exactly 'val' or beginning
    /// with 'val' immediately followed by '-'."
    DashMatch(String),

    /// `[attr^=value]` — "whose value begins with the prefix 'val'."
    PrefixMatch(String),

    /// `[attr$=value]` — "whose value ends with the suffix 'val'."
    SuffixMatch(String),

    /// `[attr*=value]` — "whose value contains at least one instance of the
    /// substring 'val'."
    SubstringMatch(String),
}

impl AttributeOperation {
    /// Apply the operation to an attribute value that is present.
    ///
    /// "If 'val' is the empty string", `~=`, `^=`, `$=` and `*=`
    /// "represent nothing".
    #[must_use]
    pub fn matches(&self, actual: &str, case: CaseSensitivity) -> bool {
        match self {
            Self::Exists => true,
            Self::Equals(expected) => case.eq(actual, expected),
            Self::Includes(expected) => {
                !expected.is_empty()
                    && !expected.contains(is_html_whitespace)
                    && actual
                        .split(is_html_whitespace)
                        .any(|word| case.eq(word, expected))
            }
            Self::DashMatch(expected) => {
                case.eq(actual, expected)
                    || (actual.len() > expected.len()
                        && actual.as_bytes()[expected.len()] == b'-'
                        && case.starts_with(actual, expected))
            }
            Self::PrefixMatch(expected) => {
                !expected.is_empty() && case.starts_with(actual, expected)
            }
            Self::SuffixMatch(expected) => {
                !expected.is_empty() && case.ends_with(actual, expected)
            }
            Self::SubstringMatch(expected) => {
                !expected.is_empty() && case.contains(actual, expected)
            }
        }
    }
}

/// [§ 6.3 Case-sensitivity](https://www.w3.org/TR/selectors-4/#attribute-case)
///
/// Attribute values compare byte-for-byte unless the selector carries the
/// `i` flag, which folds ASCII case only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum CaseSensitivity {
    /// Exact comparison (default, or the `s` flag).
    #[default]
    CaseSensitive,
    /// The `i` flag.
    AsciiCaseInsensitive,
}

impl CaseSensitivity {
    fn eq(self, a: &str, b: &str) -> bool {
        match self {
            Self::CaseSensitive => a == b,
            Self::AsciiCaseInsensitive => a.eq_ignore_ascii_case(b),
        }
    }

    fn starts_with(self, haystack: &str, prefix: &str) -> bool {
        haystack
            .as_bytes()
            .get(..prefix.len())
            .is_some_and(|head| self.eq_bytes(head, prefix.as_bytes()))
    }

    fn ends_with(self, haystack: &str, suffix: &str) -> bool {
        haystack
            .len()
            .checked_sub(suffix.len())
            .is_some_and(|start| self.eq_bytes(&haystack.as_bytes()[start..], suffix.as_bytes()))
    }

    fn contains(self, haystack: &str, needle: &str) -> bool {
        match self {
            Self::CaseSensitive => haystack.contains(needle),
            Self::AsciiCaseInsensitive => haystack
                .as_bytes()
                .windows(needle.len())
                .any(|window| window.eq_ignore_ascii_case(needle.as_bytes())),
        }
    }

    fn eq_bytes(self, a: &[u8], b: &[u8]) -> bool {
        match self {
            Self::CaseSensitive => a == b,
            Self::AsciiCaseInsensitive => a.eq_ignore_ascii_case(b),
        }
    }
}

/// [§ 3.5 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PseudoClass {
    /// A pseudo-class written without arguments, e.g. `:first-child`.
    Keyword(PseudoClassKeyword),

    /// [§ 14.4.1 :nth-child()](https://www.w3.org/TR/selectors-4/#the-nth-child-pseudo)
    /// "The :nth-child(An+B [of S]?) pseudo-class notation represents elements
    /// that are among An+Bth elements from the list composed of their inclusive
    /// siblings that match the selector list S."
    NthChild {
        /// Position formula.
        formula: NthFormula,
        /// Optional `of S` filter; absent means every element sibling counts.
        of: Option<Box<SelectorList>>,
    },

    /// [§ 14.4.2 :nth-last-child()](https://www.w3.org/TR/selectors-4/#the-nth-last-child-pseudo)
    /// Like `:nth-child()`, counting from the last sibling.
    NthLastChild {
        /// Position formula.
        formula: NthFormula,
        /// Optional `of S` filter.
        of: Option<Box<SelectorList>>,
    },

    /// [§ 14.5.1 :nth-of-type()](https://www.w3.org/TR/selectors-4/#the-nth-of-type-pseudo)
    NthOfType(NthFormula),

    /// [§ 14.5.2 :nth-last-of-type()](https://www.w3.org/TR/selectors-4/#the-nth-last-of-type-pseudo)
    NthLastOfType(NthFormula),

    /// [§ 4.3 :not()](https://www.w3.org/TR/selectors-4/#negation)
    /// "an element that is not represented by its argument."
    Not(Box<SelectorList>),

    /// [§ 4.2 :is()](https://www.w3.org/TR/selectors-4/#matches), also spelled
    /// `:where()` and the legacy `:matches()` / `:any()`.
    Is(Box<SelectorList>),
}

/// Pseudo-classes written without arguments.
///
/// Names are matched ASCII case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumString, Display)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum PseudoClassKeyword {
    /// [§ 14.1 :root](https://www.w3.org/TR/selectors-4/#the-root-pseudo)
    /// "The :root pseudo-class represents an element that is the root of the document."
    Root,
    /// [§ 14.2 :empty](https://www.w3.org/TR/selectors-4/#the-empty-pseudo)
    /// "represents an element that has no children except, optionally,
    /// document white space characters."
    Empty,
    /// [§ 14.4.3 :first-child](https://www.w3.org/TR/selectors-4/#the-first-child-pseudo)
    /// "Same as :nth-child(1)."
    FirstChild,
    /// [§ 14.4.4 :last-child](https://www.w3.org/TR/selectors-4/#the-last-child-pseudo)
    /// "Same as :nth-last-child(1)."
    LastChild,
    /// [§ 14.4.5 :only-child](https://www.w3.org/TR/selectors-4/#the-only-child-pseudo)
    /// "Same as :first-child:last-child."
    OnlyChild,
    /// [§ 14.5.3 :first-of-type](https://www.w3.org/TR/selectors-4/#the-first-of-type-pseudo)
    FirstOfType,
    /// [§ 14.5.4 :last-of-type](https://www.w3.org/TR/selectors-4/#the-last-of-type-pseudo)
    LastOfType,
    /// [§ 14.5.5 :only-of-type](https://www.w3.org/TR/selectors-4/#the-only-of-type-pseudo)
    OnlyOfType,
    /// [§ 8.2 :link](https://www.w3.org/TR/selectors-4/#link)
    /// A static tree has no history, so every hyperlink is unvisited.
    #[strum(to_string = "link", serialize = "any-link")]
    Link,
    /// [§ 13.3.1 :checked](https://www.w3.org/TR/selectors-4/#checked)
    Checked,
    /// [§ 13.1.2 :disabled](https://www.w3.org/TR/selectors-4/#disabled-pseudo)
    Disabled,
    /// [§ 13.1.1 :enabled](https://www.w3.org/TR/selectors-4/#enabled-pseudo)
    Enabled,
    /// [§ 13.5.1 :required](https://www.w3.org/TR/selectors-4/#opt-pseudos)
    Required,
    /// [§ 13.5.1 :optional](https://www.w3.org/TR/selectors-4/#opt-pseudos)
    Optional,
}

impl PseudoClassKeyword {
    /// Whether the keyword depends on the element's position among its siblings.
    #[must_use]
    pub const fn is_structural(self) -> bool {
        matches!(
            self,
            Self::FirstChild
                | Self::LastChild
                | Self::OnlyChild
                | Self::FirstOfType
                | Self::LastOfType
                | Self::OnlyOfType
        )
    }
}

/// Recognised pseudo-classes that depend on user interaction or history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub(crate) enum DynamicPseudoClass {
    Hover,
    Active,
    Focus,
    FocusVisible,
    FocusWithin,
    Visited,
    Target,
    TargetWithin,
}

/// Functional pseudo-classes, keyed by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub(crate) enum FunctionalPseudoClass {
    NthChild,
    NthLastChild,
    NthOfType,
    NthLastOfType,
    Not,
    #[strum(serialize = "is", serialize = "where", serialize = "matches", serialize = "any")]
    Is,
    Has,
}

/// "ASCII whitespace" as used for whitespace-separated attribute values.
pub(crate) const fn is_html_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0C')
}

#[cfg(test)]
mod tests {
    use super::*;

    const CS: CaseSensitivity = CaseSensitivity::CaseSensitive;
    const CI: CaseSensitivity = CaseSensitivity::AsciiCaseInsensitive;

    #[test]
    fn test_substring_operators_agree_on_exact_value() {
        let prefix = AttributeOperation::PrefixMatch("x".into());
        let suffix = AttributeOperation::SuffixMatch("x".into());
        let substring = AttributeOperation::SubstringMatch("x".into());

        for op in [&prefix, &suffix, &substring] {
            assert!(op.matches("x", CS));
        }

        assert!(!prefix.matches("yx", CS));
        assert!(suffix.matches("yx", CS));
        assert!(substring.matches("yx", CS));

        assert!(prefix.matches("xy", CS));
        assert!(!suffix.matches("xy", CS));
        assert!(substring.matches("xy", CS));
    }

    #[test]
    fn test_empty_value_represents_nothing() {
        for op in [
            AttributeOperation::Includes(String::new()),
            AttributeOperation::PrefixMatch(String::new()),
            AttributeOperation::SuffixMatch(String::new()),
            AttributeOperation::SubstringMatch(String::new()),
        ] {
            assert!(!op.matches("anything", CS));
        }
        assert!(AttributeOperation::Equals(String::new()).matches("", CS));
    }

    #[test]
    fn test_includes_splits_on_whitespace() {
        let op = AttributeOperation::Includes("b".into());
        assert!(op.matches("a\tb  c", CS));
        assert!(!op.matches("abc", CS));
        assert!(!AttributeOperation::Includes("a b".into()).matches("a b", CS));
    }

    #[test]
    fn test_dash_match() {
        let op = AttributeOperation::DashMatch("en".into());
        assert!(op.matches("en", CS));
        assert!(op.matches("en-US", CS));
        assert!(!op.matches("english", CS));
        assert!(!op.matches("EN-us", CS));
        assert!(op.matches("EN-us", CI));
    }

    #[test]
    fn test_case_insensitive_flag_folds_ascii_only() {
        assert!(AttributeOperation::Equals("TEXT".into()).matches("text", CI));
        assert!(!AttributeOperation::Equals("TEXT".into()).matches("text", CS));
        assert!(AttributeOperation::SubstringMatch("Ab".into()).matches("xaBy", CI));
        assert!(AttributeOperation::SuffixMatch("PNG".into()).matches("a.png", CI));
        assert!(!AttributeOperation::Equals("É".into()).matches("é", CI));
    }

    #[test]
    fn test_keyword_names() {
        assert_eq!(
            "first-child".parse::<PseudoClassKeyword>(),
            Ok(PseudoClassKeyword::FirstChild)
        );
        assert_eq!(
            "Any-Link".parse::<PseudoClassKeyword>(),
            Ok(PseudoClassKeyword::Link)
        );
        assert_eq!(PseudoClassKeyword::OnlyOfType.to_string(), "only-of-type");
        assert!("nth-child".parse::<PseudoClassKeyword>().is_err());
        assert_eq!(
            "where".parse::<FunctionalPseudoClass>(),
            Ok(FunctionalPseudoClass::Is)
        );
    }
}
