//! Pattern matches and the brute-force cost model they are compared against.

use std::fmt;

/// Classification used for synthetic brute-force matches.
pub const BRUTE_FORCE_CLASSIFICATION: &str = "Random Characters";

/// Character class used to infer the brute-force alphabet of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    Lower,
    Upper,
    Digit,
    Symbol,
    Other,
}

impl CharClass {
    pub fn of(c: char) -> Self {
        if c.is_ascii_lowercase() {
            CharClass::Lower
        } else if c.is_ascii_uppercase() {
            CharClass::Upper
        } else if c.is_ascii_digit() {
            CharClass::Digit
        } else if c.is_ascii_punctuation() || c == ' ' {
            CharClass::Symbol
        } else {
            CharClass::Other
        }
    }

    /// Number of candidates an attacker tries for one character of this class.
    pub fn alphabet_size(self) -> u32 {
        match self {
            CharClass::Lower | CharClass::Upper => 26,
            CharClass::Digit => 10,
            // printable ASCII punctuation plus space
            CharClass::Symbol => 33,
            CharClass::Other => 100,
        }
    }

    pub fn bits(self) -> f64 {
        f64::from(self.alphabet_size()).log2()
    }

    pub fn name(self) -> &'static str {
        match self {
            CharClass::Lower => "lowercase",
            CharClass::Upper => "uppercase",
            CharClass::Digit => "digit",
            CharClass::Symbol => "symbol",
            CharClass::Other => "other",
        }
    }
}

/// Brute-force bits for a single character.
pub fn char_bits(c: char) -> f64 {
    CharClass::of(c).bits()
}

/// Brute-force bits for a run of characters, each costed by its own class.
pub fn brute_force_bits(chars: &[char]) -> f64 {
    chars.iter().map(|&c| char_bits(c)).sum()
}

/// A substring of the password explained by one guessing theory.
///
/// Positions are character indices into the password, `[start, end)`.
/// `cost` is log2 of the guesses needed to reach this substring.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordPattern {
    pub start: usize,
    pub end: usize,
    pub classification: String,
    pub description: String,
    pub matched: String,
    pub cost: f64,
}

impl PasswordPattern {
    pub fn new(
        start: usize,
        end: usize,
        matched: impl Into<String>,
        cost: f64,
        classification: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            start,
            end,
            classification: classification.into(),
            description: description.into(),
            matched: matched.into(),
            cost: cost.max(0.0),
        }
    }

    /// Synthetic single-character match for a position no pattern explains.
    pub fn brute_force(position: usize, c: char) -> Self {
        let class = CharClass::of(c);
        Self::new(
            position,
            position + 1,
            c.to_string(),
            class.bits(),
            BRUTE_FORCE_CLASSIFICATION,
            format!("Random {} character", class.name()),
        )
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    pub fn is_brute_force(&self) -> bool {
        self.classification == BRUTE_FORCE_CLASSIFICATION
    }

    /// Key used to order otherwise tied matches deterministically.
    pub(crate) fn tie_key(&self) -> (&str, &str, &str) {
        (&self.classification, &self.description, &self.matched)
    }
}

impl fmt::Display for PasswordPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' matches the rule '{}' in '{}' ({:.2} bits)",
            self.matched, self.description, self.classification, self.cost
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_classes() {
        assert_eq!(CharClass::of('a'), CharClass::Lower);
        assert_eq!(CharClass::of('Z'), CharClass::Upper);
        assert_eq!(CharClass::of('7'), CharClass::Digit);
        assert_eq!(CharClass::of('!'), CharClass::Symbol);
        assert_eq!(CharClass::of(' '), CharClass::Symbol);
        assert_eq!(CharClass::of('é'), CharClass::Other);
    }

    #[test]
    fn test_brute_force_bits_sum_per_class() {
        let chars: Vec<char> = "aB3".chars().collect();
        let expected = 26f64.log2() * 2.0 + 10f64.log2();
        assert!((brute_force_bits(&chars) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_brute_force_pattern() {
        let p = PasswordPattern::brute_force(4, '%');
        assert_eq!((p.start, p.end), (4, 5));
        assert!(p.is_brute_force());
        assert!((p.cost - 33f64.log2()).abs() < 1e-9);
    }

    #[test]
    fn test_negative_cost_is_clamped() {
        let p = PasswordPattern::new(0, 1, "a", -3.0, "x", "y");
        assert_eq!(p.cost, 0.0);
    }
}
