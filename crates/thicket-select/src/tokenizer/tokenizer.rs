use super::token::{Token, TokenKind};
use crate::error::{SelectorError, SyntaxErrorKind};

/// [§ 4.3 Tokenizer Algorithms](https://www.w3.org/TR/css-syntax-3/#tokenizer-algorithms)
///
/// Single left-to-right scan of a selector string. Unlike a stylesheet
/// tokenizer there is no error recovery: bad strings, unterminated comments
/// and trailing escapes are reported immediately.
pub struct SelectorTokenizer<'a> {
    /// The selector text, kept for its length.
    source: &'a str,
    /// Code points paired with their byte offsets.
    input: Vec<(usize, char)>,
    /// Index into `input` of the next code point.
    position: usize,
    /// Collected tokens
    tokens: Vec<Token>,
}

impl<'a> SelectorTokenizer<'a> {
    /// Create a new tokenizer over `source`.
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            input: source.char_indices().collect(),
            position: 0,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the whole input. The returned stream always ends with
    /// [`TokenKind::Eof`].
    ///
    /// # Errors
    ///
    /// Returns a syntax error for unterminated strings and comments, and for
    /// a backslash at the end of the input.
    pub fn run(mut self) -> Result<Vec<Token>, SelectorError> {
        loop {
            let token = self.consume_token()?;
            let is_eof = token.is_eof();
            self.tokens.push(token);
            if is_eof {
                return Ok(self.tokens);
            }
        }
    }

    /// [§ 4.3.1 Consume a token](https://www.w3.org/TR/css-syntax-3/#consume-token)
    fn consume_token(&mut self) -> Result<Token, SelectorError> {
        self.consume_comments()?;

        let start = self.offset();
        let Some(c) = self.consume() else {
            return Ok(self.finish(TokenKind::Eof, start));
        };

        let kind = match c {
            c if is_whitespace(c) => {
                self.consume_whitespace()?;
                TokenKind::Whitespace
            }

            '"' | '\'' => self.consume_string_token(c, start)?,

            // "If the next input code point is an ident code point or the next
            // two input code points are a valid escape..."
            '#' if self.peek().is_some_and(is_ident_code_point)
                || is_valid_escape(self.peek(), self.peek_at(1)) =>
            {
                let is_identifier = self.would_start_ident_sequence();
                let value = self.consume_ident_sequence()?;
                TokenKind::Hash {
                    value,
                    is_identifier,
                }
            }

            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,

            '~' | '|' | '^' | '$' | '*' if self.peek() == Some('=') => {
                let _ = self.consume();
                match c {
                    '~' => TokenKind::IncludeMatch,
                    '|' => TokenKind::DashMatch,
                    '^' => TokenKind::PrefixMatch,
                    '$' => TokenKind::SuffixMatch,
                    _ => TokenKind::SubstringMatch,
                }
            }

            c if c.is_ascii_digit() => {
                let mut digits = c.to_string();
                while let Some(d) = self.peek().filter(char::is_ascii_digit) {
                    let _ = self.consume();
                    digits.push(d);
                }
                TokenKind::Number(digits)
            }

            '-' | '\\' if self.would_start_ident_sequence_with(Some(c), 0) => {
                self.reconsume();
                self.consume_ident_like_token()?
            }
            '\\' => {
                return Err(SelectorError::syntax(start, SyntaxErrorKind::InvalidEscape));
            }

            c if is_ident_start_code_point(c) => {
                self.reconsume();
                self.consume_ident_like_token()?
            }

            c => TokenKind::Delim(c),
        };

        Ok(self.finish(kind, start))
    }

    fn finish(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            start,
            end: self.offset(),
        }
    }

    /// [§ 4.3.2 Consume comments](https://www.w3.org/TR/css-syntax-3/#consume-comment)
    fn consume_comments(&mut self) -> Result<(), SelectorError> {
        while self.peek() == Some('/') && self.peek_at(1) == Some('*') {
            let start = self.offset();
            let _ = self.consume(); // /
            let _ = self.consume(); // *

            loop {
                match self.consume() {
                    Some('*') if self.peek() == Some('/') => {
                        let _ = self.consume();
                        break;
                    }
                    Some(_) => {}
                    None => {
                        return Err(SelectorError::syntax(
                            start,
                            SyntaxErrorKind::UnterminatedComment,
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Consume whitespace, folding comments between whitespace runs into
    /// the same token.
    fn consume_whitespace(&mut self) -> Result<(), SelectorError> {
        loop {
            while self.peek().is_some_and(is_whitespace) {
                let _ = self.consume();
            }
            if self.peek() == Some('/') && self.peek_at(1) == Some('*') {
                self.consume_comments()?;
            } else {
                return Ok(());
            }
        }
    }

    /// [§ 4.3.5 Consume a string token](https://www.w3.org/TR/css-syntax-3/#consume-string-token)
    fn consume_string_token(
        &mut self,
        ending_code_point: char,
        start: usize,
    ) -> Result<TokenKind, SelectorError> {
        let mut value = String::new();
        loop {
            match self.consume() {
                Some(c) if c == ending_code_point => return Ok(TokenKind::String(value)),
                // "newline: This is a parse error." A selector has no recovery
                // point after a bad string, so report both cases the same way.
                None | Some('\n' | '\r' | '\x0C') => {
                    return Err(SelectorError::syntax(
                        start,
                        SyntaxErrorKind::UnterminatedString,
                    ));
                }
                Some('\\') => match self.peek() {
                    None => {}
                    Some('\n') => {
                        let _ = self.consume();
                    }
                    Some(_) => value.push(self.consume_escaped_code_point()),
                },
                Some(c) => value.push(c),
            }
        }
    }

    /// [§ 4.3.4 Consume an ident-like token](https://www.w3.org/TR/css-syntax-3/#consume-ident-like-token)
    fn consume_ident_like_token(&mut self) -> Result<TokenKind, SelectorError> {
        let name = self.consume_ident_sequence()?;
        if self.peek() == Some('(') {
            let _ = self.consume();
            Ok(TokenKind::Function(name))
        } else {
            Ok(TokenKind::Ident(name))
        }
    }

    /// [§ 4.3.11 Consume an ident sequence](https://www.w3.org/TR/css-syntax-3/#consume-name)
    fn consume_ident_sequence(&mut self) -> Result<String, SelectorError> {
        let mut result = String::new();
        loop {
            match self.peek() {
                Some(c) if is_ident_code_point(c) => {
                    let _ = self.consume();
                    result.push(c);
                }
                Some('\\') if is_valid_escape(Some('\\'), self.peek_at(1)) => {
                    let _ = self.consume();
                    if self.peek().is_none() {
                        return Err(SelectorError::syntax(
                            self.offset(),
                            SyntaxErrorKind::InvalidEscape,
                        ));
                    }
                    result.push(self.consume_escaped_code_point());
                }
                _ => return Ok(result),
            }
        }
    }

    /// [§ 4.3.7 Consume an escaped code point](https://www.w3.org/TR/css-syntax-3/#consume-escaped-code-point)
    ///
    /// Called with the backslash already consumed and at least one code point left.
    fn consume_escaped_code_point(&mut self) -> char {
        match self.consume() {
            Some(c) if c.is_ascii_hexdigit() => {
                let mut hex = c.to_string();
                // "Consume as many hex digits as possible, but no more than 5."
                for _ in 0..5 {
                    match self.peek().filter(char::is_ascii_hexdigit) {
                        Some(d) => {
                            let _ = self.consume();
                            hex.push(d);
                        }
                        None => break,
                    }
                }
                // "If the next input code point is whitespace, consume it."
                if self.peek().is_some_and(is_whitespace) {
                    let _ = self.consume();
                }
                // "If this number is zero, or is for a surrogate, or is greater than the
                // maximum allowed code point, return U+FFFD REPLACEMENT CHARACTER."
                u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|&cp| cp != 0)
                    .and_then(char::from_u32)
                    .unwrap_or('\u{FFFD}')
            }
            Some(c) => c,
            None => '\u{FFFD}',
        }
    }

    /// [§ 4.3.9 Check if three code points would start an ident sequence](https://www.w3.org/TR/css-syntax-3/#would-start-an-identifier)
    fn would_start_ident_sequence(&self) -> bool {
        self.would_start_ident_sequence_with(self.peek(), 1)
    }

    /// `first` is the code point under consideration; `next` is the
    /// lookahead offset of the code point after it.
    fn would_start_ident_sequence_with(&self, first: Option<char>, next: usize) -> bool {
        match first {
            Some('-') => {
                let second = self.peek_at(next);
                second.is_some_and(|c| is_ident_start_code_point(c) || c == '-')
                    || is_valid_escape(second, self.peek_at(next + 1))
            }
            Some('\\') => is_valid_escape(Some('\\'), self.peek_at(next)),
            Some(c) => is_ident_start_code_point(c),
            None => false,
        }
    }

    /// Byte offset of the next code point.
    fn offset(&self) -> usize {
        self.input
            .get(self.position)
            .map_or(self.source.len(), |&(offset, _)| offset)
    }

    /// Consume and return the next character.
    fn consume(&mut self) -> Option<char> {
        let (_, c) = *self.input.get(self.position)?;
        self.position += 1;
        Some(c)
    }

    /// Put back the last consumed character.
    fn reconsume(&mut self) {
        self.position = self.position.saturating_sub(1);
    }

    /// Peek at the next character without consuming it.
    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    /// Peek at a character at an offset from current position.
    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).map(|&(_, c)| c)
    }
}

/// [§ 4.3.8 Check if two code points are a valid escape](https://www.w3.org/TR/css-syntax-3/#starts-with-a-valid-escape)
fn is_valid_escape(first: Option<char>, second: Option<char>) -> bool {
    first == Some('\\') && second != Some('\n')
}

/// [§ 4.2 Definitions - whitespace](https://www.w3.org/TR/css-syntax-3/#whitespace)
const fn is_whitespace(c: char) -> bool {
    matches!(c, '\n' | '\t' | ' ' | '\r' | '\x0C')
}

/// [§ 4.2 Definitions - ident-start code point](https://www.w3.org/TR/css-syntax-3/#ident-start-code-point)
///
/// "A letter, a non-ASCII code point, or U+005F LOW LINE (_)."
const fn is_ident_start_code_point(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

/// [§ 4.2 Definitions - ident code point](https://www.w3.org/TR/css-syntax-3/#ident-code-point)
///
/// "An ident-start code point, a digit, or U+002D HYPHEN-MINUS (-)."
const fn is_ident_code_point(c: char) -> bool {
    is_ident_start_code_point(c) || c.is_ascii_digit() || c == '-'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        SelectorTokenizer::new(input)
            .run()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_compound_with_combinator() {
        assert_eq!(
            kinds("div.a > #b"),
            vec![
                TokenKind::Ident("div".into()),
                TokenKind::Delim('.'),
                TokenKind::Ident("a".into()),
                TokenKind::Whitespace,
                TokenKind::Delim('>'),
                TokenKind::Whitespace,
                TokenKind::Hash {
                    value: "b".into(),
                    is_identifier: true
                },
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_match_operators() {
        assert_eq!(
            kinds("~=|=^=$=*="),
            vec![
                TokenKind::IncludeMatch,
                TokenKind::DashMatch,
                TokenKind::PrefixMatch,
                TokenKind::SuffixMatch,
                TokenKind::SubstringMatch,
                TokenKind::Eof,
            ]
        );
        // A lone '~' stays a combinator delimiter.
        assert_eq!(kinds("~")[0], TokenKind::Delim('~'));
    }

    #[test]
    fn test_nth_argument_tokens_keep_spans() {
        let source = "nth-child(-2n+1)";
        let tokens = SelectorTokenizer::new(source).run().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Function("nth-child".into()));
        assert_eq!(tokens[1].kind, TokenKind::Delim('-'));
        assert_eq!(tokens[2].kind, TokenKind::Number("2".into()));
        assert_eq!(tokens[3].kind, TokenKind::Ident("n".into()));
        let closing = tokens.iter().find(|t| t.kind == TokenKind::RightParen).unwrap();
        assert_eq!(&source[tokens[1].start..closing.start], "-2n+1");
    }

    #[test]
    fn test_escapes_in_identifiers() {
        assert_eq!(kinds(r".a\:b")[1], TokenKind::Ident("a:b".into()));
        assert_eq!(kinds(r"#\31 23")[0], TokenKind::Hash {
            value: "123".into(),
            is_identifier: true,
        });
        assert_eq!(kinds("#123")[0], TokenKind::Hash {
            value: "123".into(),
            is_identifier: false,
        });
    }

    #[test]
    fn test_strings() {
        assert_eq!(kinds(r#""a\"b""#)[0], TokenKind::String("a\"b".into()));
        assert_eq!(kinds("'x y'")[0], TokenKind::String("x y".into()));
    }

    #[test]
    fn test_unterminated_string_reports_start() {
        let err = SelectorTokenizer::new("[a='open").run().unwrap_err();
        assert_eq!(
            err,
            SelectorError::syntax(3, SyntaxErrorKind::UnterminatedString)
        );
    }

    #[test]
    fn test_comments_fold_into_whitespace() {
        assert_eq!(
            kinds("a /* x */ b"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Whitespace,
                TokenKind::Ident("b".into()),
                TokenKind::Eof,
            ]
        );
        assert!(SelectorTokenizer::new("a /* x").run().is_err());
    }

    #[test]
    fn test_trailing_backslash() {
        let err = SelectorTokenizer::new("a\\").run().unwrap_err();
        assert!(matches!(
            err,
            SelectorError::Syntax {
                kind: SyntaxErrorKind::InvalidEscape,
                ..
            }
        ));
    }

    #[test]
    fn test_positions_are_byte_offsets() {
        let tokens = SelectorTokenizer::new("é > b").run().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Ident("é".into()));
        assert_eq!(tokens[0].end, 2);
        assert_eq!(tokens[2].start, 3);
    }
}
