//! [CSS Syntax § 6 The An+B microsyntax](https://www.w3.org/TR/css-syntax-3/#anb-microsyntax)

use serde::Serialize;

/// A parsed `An+B` formula.
///
/// "The An+B notation defines an integer step (A) and offset (B), and
/// represents the An+Bth elements in a list, for every positive integer or
/// zero value of n, with the first element in the list having index 1."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NthFormula {
    /// The step.
    pub a: i32,
    /// The offset.
    pub b: i32,
}

impl NthFormula {
    /// `odd`, equivalent to `2n+1`.
    pub const ODD: Self = Self::new(2, 1);
    /// `even`, equivalent to `2n`.
    pub const EVEN: Self = Self::new(2, 0);

    /// Create a formula from its step and offset.
    #[must_use]
    pub const fn new(a: i32, b: i32) -> Self {
        Self { a, b }
    }

    /// Parse the argument of an `:nth-*()` pseudo-class.
    ///
    /// Accepts `odd`, `even`, a signed integer, and `An`, `An+B`, `An-B` forms
    /// where `A` may be omitted or be a bare sign. Whitespace is allowed around
    /// the whole expression and around the sign of `B`, nowhere else.
    ///
    /// Returns `None` if the text is not a valid formula.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let expr = raw.trim_matches(is_css_whitespace).to_ascii_lowercase();

        match expr.as_str() {
            "" => return None,
            "odd" => return Some(Self::ODD),
            "even" => return Some(Self::EVEN),
            _ => {}
        }

        let Some(n_pos) = expr.find('n') else {
            return parse_signed(&expr).map(|b| Self::new(0, b));
        };

        let (a_part, rest) = expr.split_at(n_pos);
        let a = match a_part {
            "" | "+" => 1,
            "-" => -1,
            _ => parse_signed(a_part)?,
        };

        let rest = rest[1..].trim_start_matches(is_css_whitespace);
        if rest.is_empty() {
            return Some(Self::new(a, 0));
        }

        let (sign, digits) = if let Some(digits) = rest.strip_prefix('+') {
            (1, digits)
        } else if let Some(digits) = rest.strip_prefix('-') {
            (-1, digits)
        } else {
            return None;
        };
        let digits = digits.trim_start_matches(is_css_whitespace);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let b = digits.parse::<i32>().ok()?;
        Some(Self::new(a, sign * b))
    }

    /// Whether the 1-based `position` is selected by this formula.
    #[must_use]
    pub fn matches(&self, position: usize) -> bool {
        let Ok(position) = i64::try_from(position) else {
            return false;
        };
        let a = i64::from(self.a);
        let diff = position - i64::from(self.b);
        if a == 0 {
            return diff == 0;
        }
        // "for every positive integer or zero value of n"
        diff % a == 0 && diff / a >= 0
    }
}

/// An optionally signed run of ASCII digits with no embedded whitespace.
fn parse_signed(text: &str) -> Option<i32> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<i32>().ok()
}

const fn is_css_whitespace(c: char) -> bool {
    matches!(c, '\n' | '\t' | ' ' | '\r' | '\x0C')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        assert_eq!(NthFormula::parse("odd"), Some(NthFormula::ODD));
        assert_eq!(NthFormula::parse(" EVEN "), Some(NthFormula::EVEN));
    }

    #[test]
    fn test_forms() {
        assert_eq!(NthFormula::parse("3"), Some(NthFormula::new(0, 3)));
        assert_eq!(NthFormula::parse("+3"), Some(NthFormula::new(0, 3)));
        assert_eq!(NthFormula::parse("-1"), Some(NthFormula::new(0, -1)));
        assert_eq!(NthFormula::parse("n"), Some(NthFormula::new(1, 0)));
        assert_eq!(NthFormula::parse("+n"), Some(NthFormula::new(1, 0)));
        assert_eq!(NthFormula::parse("-n+3"), Some(NthFormula::new(-1, 3)));
        assert_eq!(NthFormula::parse("2n+1"), Some(NthFormula::new(2, 1)));
        assert_eq!(NthFormula::parse("2n - 1"), Some(NthFormula::new(2, -1)));
        assert_eq!(NthFormula::parse("10N"), Some(NthFormula::new(10, 0)));
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in ["", "n+", "2 n", "- n", "2n+-1", "2n 1", "nn", "1.5n", "3 4", "+ 3", "n+1a"] {
            assert_eq!(NthFormula::parse(bad), None, "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_matches() {
        let odd = NthFormula::ODD;
        assert!(odd.matches(1));
        assert!(!odd.matches(2));
        assert!(odd.matches(3));

        // -n+3: the first three positions
        let first_three = NthFormula::new(-1, 3);
        assert!(first_three.matches(1));
        assert!(first_three.matches(3));
        assert!(!first_three.matches(4));

        let exact = NthFormula::new(0, 2);
        assert!(exact.matches(2));
        assert!(!exact.matches(4));

        // 3n-1: 2, 5, 8...
        let step = NthFormula::new(3, -1);
        assert!(step.matches(2));
        assert!(step.matches(5));
        assert!(!step.matches(1));

        assert!(!NthFormula::new(0, -1).matches(1));
    }
}
