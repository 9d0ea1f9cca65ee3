//! [§ 18 Grammar](https://www.w3.org/TR/selectors-4/#grammar)
//!
//! Recursive-descent parser from a token stream to a [`SelectorList`].
//!
//! ```text
//! <selector-list>     = <complex-selector>#
//! <complex-selector>  = <compound-selector> [ <combinator>? <compound-selector> ]*
//! <compound-selector> = [ <type-selector>? <subclass-selector>* ]!
//! <combinator>        = '>' | '+' | '~' | [ <whitespace> ]
//! ```
//!
//! The grammar is LL(1) over tokens once whitespace is resolved: whitespace
//! between two compounds is the descendant combinator unless the next
//! non-whitespace token is `>`, `+` or `~`.

use crate::error::{SelectorError, SyntaxErrorKind};
use crate::options::CompileOptions;
use crate::selector::{
    AttributeOperation, AttributeSelector, CaseSensitivity, Combinator, ComplexSelector,
    CompoundSelector, DynamicPseudoClass, FunctionalPseudoClass, NthFormula, PseudoClass,
    PseudoClassKeyword, SelectorList, SimpleSelector,
};
use crate::tokenizer::{SelectorTokenizer, Token, TokenKind};

/// Parse selector text with default options.
///
/// # Errors
///
/// Returns [`SelectorError::Syntax`] if the text is not a selector list, and
/// [`SelectorError::Unsupported`] for valid constructs this engine does not
/// implement (pseudo-elements, namespaces, `:has()`, unknown pseudo-classes).
pub fn parse_selector_list(text: &str) -> Result<SelectorList, SelectorError> {
    parse_selector_list_with(text, &CompileOptions::default())
}

/// Parse selector text, honouring the nesting limit in `options`.
///
/// # Errors
///
/// See [`parse_selector_list`].
pub fn parse_selector_list_with(
    text: &str,
    options: &CompileOptions,
) -> Result<SelectorList, SelectorError> {
    let tokens = SelectorTokenizer::new(text).run()?;
    SelectorParser::new(text, tokens, options.max_nesting_depth).parse()
}

/// Legacy single-colon pseudo-elements from CSS 2.
const LEGACY_PSEUDO_ELEMENTS: [&str; 4] = ["before", "after", "first-line", "first-letter"];

/// Parser state over a token stream.
///
/// The stream always ends with [`TokenKind::Eof`], so lookahead never runs
/// off the end.
pub struct SelectorParser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    position: usize,
    max_depth: usize,
    depth: usize,
}

impl<'a> SelectorParser<'a> {
    /// Create a parser over tokens produced from `source`.
    #[must_use]
    pub const fn new(source: &'a str, tokens: Vec<Token>, max_depth: usize) -> Self {
        Self {
            source,
            tokens,
            position: 0,
            max_depth,
            depth: 0,
        }
    }

    /// Parse the whole stream as one selector list.
    ///
    /// # Errors
    ///
    /// See [`parse_selector_list`].
    pub fn parse(mut self) -> Result<SelectorList, SelectorError> {
        let _ = self.skip_whitespace();
        if self.peek().is_eof() {
            return Err(SelectorError::syntax(0, SyntaxErrorKind::EmptySelector));
        }

        let list = self.parse_selector_list()?;
        let token = self.peek();
        if token.is_eof() {
            Ok(list)
        } else {
            Err(unexpected(token))
        }
    }

    /// `<selector-list>`. Stops before `)` or end of input.
    fn parse_selector_list(&mut self) -> Result<SelectorList, SelectorError> {
        let mut selectors = Vec::new();
        loop {
            let _ = self.skip_whitespace();
            selectors.push(self.parse_complex_selector()?);
            let _ = self.skip_whitespace();

            if self.peek().kind == TokenKind::Comma {
                self.advance();
            } else {
                return Ok(SelectorList { selectors });
            }
        }
    }

    /// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
    fn parse_complex_selector(&mut self) -> Result<ComplexSelector, SelectorError> {
        let mut compounds = vec![self.parse_compound_selector()?];
        let mut combinators: Vec<Combinator> = Vec::new();

        loop {
            let had_whitespace = self.skip_whitespace();
            let token = self.peek();

            let combinator = match &token.kind {
                TokenKind::Delim('>') => Combinator::Child,
                TokenKind::Delim('+') => Combinator::NextSibling,
                TokenKind::Delim('~') => Combinator::SubsequentSibling,
                TokenKind::Comma | TokenKind::RightParen | TokenKind::Eof => break,
                _ if had_whitespace => Combinator::Descendant,
                _ => return Err(unexpected(token)),
            };

            if combinator != Combinator::Descendant {
                let (symbol, at) = (combinator_char(combinator), token.start);
                self.advance();
                let _ = self.skip_whitespace();
                if matches!(
                    self.peek().kind,
                    TokenKind::Comma | TokenKind::RightParen | TokenKind::Eof
                ) {
                    return Err(SelectorError::syntax(
                        at,
                        SyntaxErrorKind::DanglingCombinator(symbol),
                    ));
                }
            }

            combinators.push(combinator);
            compounds.push(self.parse_compound_selector()?);
        }

        // Stored right-to-left: the subject first, then each step outward.
        let subject = compounds.pop().ok_or_else(|| {
            SelectorError::syntax(self.peek().start, SyntaxErrorKind::EmptyCompound)
        })?;
        let combinators = combinators.into_iter().zip(compounds).rev().collect();

        Ok(ComplexSelector {
            subject,
            combinators,
        })
    }

    /// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
    fn parse_compound_selector(&mut self) -> Result<CompoundSelector, SelectorError> {
        let mut simple_selectors = Vec::new();

        loop {
            let token = self.peek().clone();
            let simple = match &token.kind {
                TokenKind::Ident(name) => {
                    self.reject_namespace(&token)?;
                    if !simple_selectors.is_empty() {
                        return Err(SelectorError::syntax(
                            token.start,
                            SyntaxErrorKind::MisplacedTypeSelector,
                        ));
                    }
                    self.advance();
                    SimpleSelector::Type(name.clone())
                }
                TokenKind::Delim('*') => {
                    self.reject_namespace(&token)?;
                    if !simple_selectors.is_empty() {
                        return Err(SelectorError::syntax(
                            token.start,
                            SyntaxErrorKind::MisplacedTypeSelector,
                        ));
                    }
                    self.advance();
                    SimpleSelector::Universal
                }
                TokenKind::Delim('|') => {
                    return Err(SelectorError::unsupported(token.start, "namespace prefix"));
                }
                TokenKind::Hash {
                    value,
                    is_identifier,
                } => {
                    if !is_identifier {
                        return Err(SelectorError::syntax(
                            token.start,
                            SyntaxErrorKind::InvalidId(value.clone()),
                        ));
                    }
                    self.advance();
                    SimpleSelector::Id(value.clone())
                }
                TokenKind::Delim('.') => {
                    self.advance();
                    let next = self.peek();
                    let TokenKind::Ident(class) = &next.kind else {
                        return Err(unexpected(next));
                    };
                    let class = class.clone();
                    self.advance();
                    SimpleSelector::Class(class)
                }
                TokenKind::LeftBracket => {
                    SimpleSelector::Attribute(self.parse_attribute_selector()?)
                }
                TokenKind::Colon => self.parse_pseudo_class()?,
                _ => break,
            };
            simple_selectors.push(simple);
        }

        if simple_selectors.is_empty() {
            let token = self.peek();
            return Err(match token.kind {
                TokenKind::Comma | TokenKind::RightParen => {
                    SelectorError::syntax(token.start, SyntaxErrorKind::EmptyCompound)
                }
                _ => unexpected(token),
            });
        }

        Ok(CompoundSelector { simple_selectors })
    }

    /// `ns|name` and `*|name` are recognised only to be refused.
    fn reject_namespace(&self, token: &Token) -> Result<(), SelectorError> {
        if self.peek_at(1).is_delim('|') {
            return Err(SelectorError::unsupported(token.start, "namespace prefix"));
        }
        Ok(())
    }

    /// [§ 6.1 Attribute presence and value selectors](https://www.w3.org/TR/selectors-4/#attribute-representation)
    ///
    /// ```text
    /// '[' <ident> ']'
    /// '[' <ident> <attr-matcher> [ <string> | <ident> ] <attr-modifier>? ']'
    /// ```
    fn parse_attribute_selector(&mut self) -> Result<AttributeSelector, SelectorError> {
        let open = self.peek().start;
        let unterminated = || SelectorError::syntax(open, SyntaxErrorKind::UnterminatedAttribute);
        self.advance();
        let _ = self.skip_whitespace();

        let token = self.peek().clone();
        let name = match &token.kind {
            TokenKind::Ident(name) => {
                self.reject_namespace(&token)?;
                name.clone()
            }
            TokenKind::Delim('*' | '|') => {
                return Err(SelectorError::unsupported(token.start, "namespace prefix"));
            }
            TokenKind::Eof => return Err(unterminated()),
            _ => return Err(unexpected(&token)),
        };
        self.advance();
        let _ = self.skip_whitespace();

        let token = self.peek();
        let make_operation: fn(String) -> AttributeOperation = match token.kind {
            TokenKind::RightBracket => {
                self.advance();
                return Ok(AttributeSelector {
                    name,
                    operation: AttributeOperation::Exists,
                    case: CaseSensitivity::CaseSensitive,
                });
            }
            TokenKind::Delim('=') => AttributeOperation::Equals,
            TokenKind::IncludeMatch => AttributeOperation::Includes,
            TokenKind::DashMatch => AttributeOperation::DashMatch,
            TokenKind::PrefixMatch => AttributeOperation::PrefixMatch,
            TokenKind::SuffixMatch => AttributeOperation::SuffixMatch,
            TokenKind::SubstringMatch => AttributeOperation::SubstringMatch,
            TokenKind::Eof => return Err(unterminated()),
            _ => return Err(unexpected(token)),
        };
        self.advance();
        let _ = self.skip_whitespace();

        let token = self.peek();
        let value = match &token.kind {
            TokenKind::Ident(value) | TokenKind::String(value) => value.clone(),
            TokenKind::Eof => return Err(unterminated()),
            _ => return Err(unexpected(token)),
        };
        self.advance();
        let _ = self.skip_whitespace();

        // [§ 6.3](https://www.w3.org/TR/selectors-4/#attribute-case)
        let mut case = CaseSensitivity::CaseSensitive;
        let token = self.peek();
        if let TokenKind::Ident(flag) = &token.kind {
            case = if flag.eq_ignore_ascii_case("i") {
                CaseSensitivity::AsciiCaseInsensitive
            } else if flag.eq_ignore_ascii_case("s") {
                CaseSensitivity::CaseSensitive
            } else {
                return Err(unexpected(token));
            };
            self.advance();
            let _ = self.skip_whitespace();
        }

        let token = self.peek();
        match token.kind {
            TokenKind::RightBracket => self.advance(),
            TokenKind::Eof => return Err(unterminated()),
            _ => return Err(unexpected(token)),
        }

        Ok(AttributeSelector {
            name,
            operation: make_operation(value),
            case,
        })
    }

    /// [§ 3.5 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
    ///
    /// Called with the `:` as the current token.
    fn parse_pseudo_class(&mut self) -> Result<SimpleSelector, SelectorError> {
        let colon = self.peek().start;
        self.advance();

        let token = self.peek().clone();
        match &token.kind {
            // [§ 3.6 Pseudo-elements](https://www.w3.org/TR/selectors-4/#pseudo-elements)
            TokenKind::Colon => {
                let name = match &self.peek_at(1).kind {
                    TokenKind::Ident(name) | TokenKind::Function(name) => name.as_str(),
                    _ => "",
                };
                Err(SelectorError::unsupported(
                    colon,
                    format!("pseudo-element '::{name}'"),
                ))
            }

            TokenKind::Ident(name) => {
                if LEGACY_PSEUDO_ELEMENTS
                    .iter()
                    .any(|legacy| name.eq_ignore_ascii_case(legacy))
                {
                    return Err(SelectorError::unsupported(
                        colon,
                        format!("pseudo-element ':{name}'"),
                    ));
                }
                if let Ok(keyword) = name.parse::<PseudoClassKeyword>() {
                    self.advance();
                    return Ok(SimpleSelector::PseudoClass(PseudoClass::Keyword(keyword)));
                }
                if name.parse::<DynamicPseudoClass>().is_ok() {
                    self.advance();
                    return Ok(SimpleSelector::NeverMatch);
                }
                Err(SelectorError::unsupported(
                    colon,
                    format!("pseudo-class ':{name}'"),
                ))
            }

            TokenKind::Function(name) => {
                let Ok(function) = name.parse::<FunctionalPseudoClass>() else {
                    return Err(SelectorError::unsupported(
                        colon,
                        format!("pseudo-class ':{name}()'"),
                    ));
                };
                self.advance();
                self.parse_functional_pseudo_class(function, colon)
                    .map(SimpleSelector::PseudoClass)
            }

            TokenKind::Eof => Err(SelectorError::syntax(
                token.start,
                SyntaxErrorKind::UnexpectedEof,
            )),
            _ => Err(unexpected(&token)),
        }
    }

    /// Arguments of a functional pseudo-class, up to and including `)`.
    fn parse_functional_pseudo_class(
        &mut self,
        function: FunctionalPseudoClass,
        colon: usize,
    ) -> Result<PseudoClass, SelectorError> {
        let pseudo = match function {
            FunctionalPseudoClass::NthChild | FunctionalPseudoClass::NthLastChild => {
                let (formula, has_of) = self.parse_nth_argument(colon, true)?;
                let of = if has_of {
                    Some(Box::new(self.parse_nested_list(colon)?))
                } else {
                    None
                };
                if function == FunctionalPseudoClass::NthChild {
                    PseudoClass::NthChild { formula, of }
                } else {
                    PseudoClass::NthLastChild { formula, of }
                }
            }
            FunctionalPseudoClass::NthOfType => {
                PseudoClass::NthOfType(self.parse_nth_argument(colon, false)?.0)
            }
            FunctionalPseudoClass::NthLastOfType => {
                PseudoClass::NthLastOfType(self.parse_nth_argument(colon, false)?.0)
            }
            FunctionalPseudoClass::Not => {
                PseudoClass::Not(Box::new(self.parse_nested_list(colon)?))
            }
            FunctionalPseudoClass::Is => PseudoClass::Is(Box::new(self.parse_nested_list(colon)?)),
            // [§ 4.5 :has()](https://www.w3.org/TR/selectors-4/#relational)
            FunctionalPseudoClass::Has => {
                return Err(SelectorError::unsupported(colon, "pseudo-class ':has()'"));
            }
        };

        let token = self.peek();
        match token.kind {
            TokenKind::RightParen => {
                self.advance();
                Ok(pseudo)
            }
            TokenKind::Eof => Err(SelectorError::syntax(
                colon,
                SyntaxErrorKind::UnbalancedParens,
            )),
            _ => Err(unexpected(token)),
        }
    }

    /// [CSS Syntax § 6.2](https://www.w3.org/TR/css-syntax-3/#anb-production)
    ///
    /// The `An+B` text is rebuilt from the tokens between the `(` and either
    /// the `)` or, when `allow_of` is set, an `of` keyword, so comments and
    /// escapes are already resolved. Returns the formula and whether `of`
    /// followed; the `)` is left for the caller.
    fn parse_nth_argument(
        &mut self,
        colon: usize,
        allow_of: bool,
    ) -> Result<(NthFormula, bool), SelectorError> {
        let start = self.peek().start;
        let mut text = String::new();
        let mut well_formed = true;

        let has_of = loop {
            let token = self.peek();
            match &token.kind {
                TokenKind::RightParen => break false,
                TokenKind::Ident(word) if allow_of && word.eq_ignore_ascii_case("of") => {
                    break true;
                }
                TokenKind::Eof => {
                    return Err(SelectorError::syntax(
                        colon,
                        SyntaxErrorKind::UnbalancedParens,
                    ));
                }
                TokenKind::Ident(word) | TokenKind::Number(word) => text.push_str(word),
                TokenKind::Delim(c) => text.push(*c),
                TokenKind::Whitespace => text.push(' '),
                _ => {
                    well_formed = false;
                    text.push_str(&self.source[token.start..token.end]);
                }
            }
            self.advance();
        };

        let formula = NthFormula::parse(&text)
            .filter(|_| well_formed)
            .ok_or_else(|| {
                SelectorError::syntax(start, SyntaxErrorKind::InvalidNth(text.trim().to_string()))
            })?;

        if has_of {
            self.advance();
        }
        Ok((formula, has_of))
    }

    /// A selector list argument, e.g. of `:not()`. Leaves the `)` in place.
    fn parse_nested_list(&mut self, colon: usize) -> Result<SelectorList, SelectorError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(SelectorError::syntax(
                colon,
                SyntaxErrorKind::NestingTooDeep(self.max_depth),
            ));
        }

        let _ = self.skip_whitespace();
        if self.peek().is_eof() {
            return Err(SelectorError::syntax(
                colon,
                SyntaxErrorKind::UnbalancedParens,
            ));
        }
        let list = self.parse_selector_list()?;

        self.depth -= 1;
        Ok(list)
    }

    /// Skip whitespace tokens, returning whether any were skipped.
    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while self.peek().is_whitespace() {
            self.advance();
            skipped = true;
        }
        skipped
    }

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let index = (self.position + offset).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn advance(&mut self) {
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
    }
}

fn unexpected(token: &Token) -> SelectorError {
    if token.is_eof() {
        return SelectorError::syntax(token.start, SyntaxErrorKind::UnexpectedEof);
    }
    SelectorError::syntax(
        token.start,
        SyntaxErrorKind::UnexpectedToken {
            found: token.kind.to_string(),
        },
    )
}

const fn combinator_char(combinator: Combinator) -> char {
    match combinator {
        Combinator::Descendant => ' ',
        Combinator::Child => '>',
        Combinator::NextSibling => '+',
        Combinator::SubsequentSibling => '~',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syntax_kind(text: &str) -> SyntaxErrorKind {
        match parse_selector_list(text) {
            Err(SelectorError::Syntax { kind, .. }) => kind,
            other => panic!("expected a syntax error for {text:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_whitespace_around_combinators() {
        let tight = parse_selector_list("a>b").unwrap();
        let loose = parse_selector_list("a  >\tb").unwrap();
        assert_eq!(tight, loose);
        assert_eq!(tight.selectors[0].combinators[0].0, Combinator::Child);
    }

    #[test]
    fn test_right_to_left_storage() {
        let list = parse_selector_list("a b > c").unwrap();
        let complex = &list.selectors[0];
        assert_eq!(
            complex.subject.simple_selectors,
            vec![SimpleSelector::Type("c".into())]
        );
        assert_eq!(complex.combinators[0].0, Combinator::Child);
        assert_eq!(
            complex.combinators[0].1.simple_selectors,
            vec![SimpleSelector::Type("b".into())]
        );
        assert_eq!(complex.combinators[1].0, Combinator::Descendant);
    }

    #[test]
    fn test_nth_of_selector() {
        let list = parse_selector_list(":nth-child(2n+1 of .a, .b)").unwrap();
        let SimpleSelector::PseudoClass(PseudoClass::NthChild { formula, of }) =
            &list.selectors[0].subject.simple_selectors[0]
        else {
            panic!("expected :nth-child");
        };
        assert_eq!(*formula, NthFormula::ODD);
        assert_eq!(of.as_ref().map(|l| l.selectors.len()), Some(2));
    }

    #[test]
    fn test_nth_argument_ignores_comments_and_escapes() {
        let plain = parse_selector_list(":nth-child(2n+1)").unwrap();
        assert_eq!(parse_selector_list(":nth-child(2n/**/+1)").unwrap(), plain);
        assert_eq!(parse_selector_list(":nth-child(2\\6e +1)").unwrap(), plain);
        assert_eq!(
            syntax_kind(":nth-child(2n/**/+)"),
            SyntaxErrorKind::InvalidNth("2n+".into())
        );
    }

    #[test]
    fn test_dangling_combinator() {
        assert_eq!(syntax_kind("a >"), SyntaxErrorKind::DanglingCombinator('>'));
        assert_eq!(syntax_kind("a ~ ,b"), SyntaxErrorKind::DanglingCombinator('~'));
    }

    #[test]
    fn test_nesting_limit() {
        let options = CompileOptions {
            max_nesting_depth: 2,
            ..CompileOptions::default()
        };
        assert!(parse_selector_list_with(":not(:not(a))", &options).is_ok());
        assert_eq!(
            parse_selector_list_with(":not(:not(:not(a)))", &options),
            Err(SelectorError::syntax(10, SyntaxErrorKind::NestingTooDeep(2)))
        );
    }
}
